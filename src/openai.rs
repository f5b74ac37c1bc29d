//! Provider boundaries and the OpenAI-compatible client behind them.
//!
//! `Generator` turns a prompt into text, `MediaGenerator` produces image,
//! video and narration assets as URLs (data URIs for inline payloads).
//! Calls are instrumented and log model names, latencies and response sizes,
//! never contents.
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::GenerationParams;
use crate::error::ProviderError;

/// Upper bound on narration input accepted by the speech endpoint.
const MAX_SPEECH_CHARS: usize = 4000;
const CLIENT_UA: &str = "lumen-backend/0.1";

#[async_trait]
pub trait Generator: Send + Sync {
  /// Long-form generation (explanations, feedback).
  async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

  /// Short or structured answers (scores, JSON payloads). Defaults to `generate`.
  async fn generate_brief(&self, prompt: &str) -> Result<String, ProviderError> {
    self.generate(prompt).await
  }
}

#[async_trait]
pub trait MediaGenerator: Send + Sync {
  async fn generate_image(&self, topic: &str) -> Result<String, ProviderError>;
  async fn generate_video(&self, topic: &str) -> Result<String, ProviderError>;
  async fn synthesize_speech(&self, text: &str) -> Result<String, ProviderError>;
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub image_model: String,
  pub speech_model: String,
  pub voice: String,
  pub max_tokens: u32,
  pub temperature: f32,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(timeout: Duration, params: &GenerationParams) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());

    let client = match reqwest::Client::builder().timeout(timeout).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "lumen_backend", error = %e, "Failed to build HTTP client; provider disabled");
        return None;
      }
    };

    Some(Self {
      client,
      api_key,
      base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
      fast_model: var("OPENAI_FAST_MODEL", "gpt-4o-mini"),
      strong_model: var("OPENAI_STRONG_MODEL", "gpt-4o"),
      image_model: var("OPENAI_IMAGE_MODEL", "dall-e-3"),
      speech_model: var("OPENAI_SPEECH_MODEL", "tts-1"),
      voice: var("OPENAI_VOICE", "alloy"),
      max_tokens: params.max_tokens,
      temperature: params.temperature,
    })
  }

  fn post(&self, path: &str) -> reqwest::RequestBuilder {
    self
      .client
      .post(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
  }

  /// Plain-text chat completion with a single user turn.
  #[instrument(level = "info", skip(self, user), fields(model = %model, prompt_len = user.len()))]
  async fn chat_plain(&self, model: &str, user: &str, temperature: f32) -> Result<String, ProviderError> {
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![ChatMessageReq { role: "user".into(), content: user.into() }],
      temperature,
      max_tokens: Some(self.max_tokens),
    };

    let start = Instant::now();
    let res = check_status(self.post("chat/completions").json(&req).send().await?).await?;
    let body: ChatCompletionResponse = res.json().await.map_err(|e| ProviderError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }

    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    if text.is_empty() {
      return Err(ProviderError::Empty);
    }
    Ok(text)
  }
}

#[async_trait]
impl Generator for OpenAI {
  async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
    self.chat_plain(&self.strong_model, prompt, self.temperature).await
  }

  async fn generate_brief(&self, prompt: &str) -> Result<String, ProviderError> {
    self.chat_plain(&self.fast_model, prompt, 0.2).await
  }
}

#[async_trait]
impl MediaGenerator for OpenAI {
  #[instrument(level = "info", skip(self), fields(model = %self.image_model))]
  async fn generate_image(&self, topic: &str) -> Result<String, ProviderError> {
    let req = ImageRequest {
      model: self.image_model.clone(),
      prompt: format!("Educational diagram about {topic}. Clear, simple illustration showing key concepts."),
      n: 1,
      size: "1024x1024".into(),
      response_format: "b64_json".into(),
    };
    let res = check_status(self.post("images/generations").json(&req).send().await?).await?;
    let body: ImageResponse = res.json().await.map_err(|e| ProviderError::Decode(e.to_string()))?;
    let image = body.data.into_iter().next().ok_or(ProviderError::Empty)?;

    match (image.b64_json, image.url) {
      (Some(b64), _) if !b64.is_empty() => Ok(format!("data:image/png;base64,{b64}")),
      (_, Some(url)) if !url.is_empty() => Ok(url),
      _ => Err(ProviderError::Empty),
    }
  }

  async fn generate_video(&self, _topic: &str) -> Result<String, ProviderError> {
    Err(ProviderError::Unsupported("video generation"))
  }

  #[instrument(level = "info", skip(self, text), fields(model = %self.speech_model, text_len = text.len()))]
  async fn synthesize_speech(&self, text: &str) -> Result<String, ProviderError> {
    let req = SpeechRequest {
      model: self.speech_model.clone(),
      voice: self.voice.clone(),
      input: text.chars().take(MAX_SPEECH_CHARS).collect(),
    };
    let res = check_status(self.post("audio/speech").json(&req).send().await?).await?;
    let audio = res.bytes().await?;
    if audio.is_empty() {
      return Err(ProviderError::Empty);
    }
    info!(audio_bytes = audio.len(), "Narration synthesized");
    Ok(format!("data:audio/mpeg;base64,{}", BASE64.encode(&audio)))
  }
}

/// Map non-2xx responses to `ProviderError::Http` with the provider's message.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_openai_error(&body).unwrap_or(body);
  error!(target: "lumen_backend", status, "OpenAI request failed");
  Err(ProviderError::Http { status, message })
}

// --- DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ImageRequest {
  model: String,
  prompt: String,
  n: u8,
  size: String,
  response_format: String,
}
#[derive(Deserialize)]
struct ImageResponse { data: Vec<ImageData> }
#[derive(Deserialize)]
struct ImageData {
  #[serde(default)] b64_json: Option<String>,
  #[serde(default)] url: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest { model: String, voice: String, input: String }

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
