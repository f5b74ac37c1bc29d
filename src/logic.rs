//! Response orchestration for explanation requests.
//!
//! A request walks `Built → Generated → Cleaned → Formatted → MediaAttached →
//! Delivered`. A provider failure, a missing provider or a reply that is too
//! short moves it to `Failed`, which still ends in `Delivered` with a
//! topic-derived fallback. Provider errors never reach the caller.

use tracing::{debug, info, instrument, warn};

use crate::domain::{Explanation, Format, GenerationRequest};
use crate::error::{AppError, ProviderError};
use crate::markup::format_markup;
use crate::prompt::build_prompt;
use crate::sanitize::sanitize;
use crate::seeds::fallback_explanation;
use crate::state::AppState;
use crate::util::escape_html;

/// Replies shorter than this (after trimming) count as failures.
pub const MIN_RESPONSE_CHARS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Built,
  Generated,
  Cleaned,
  Formatted,
  MediaAttached,
  Delivered,
  Failed,
}

/// Outcome of one generation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Generation {
  Success(String),
  Failure(String),
}

impl Generation {
  /// Classify a provider result; empty or too-short text is a failure.
  pub fn from_result(result: Result<String, ProviderError>) -> Self {
    match result {
      Ok(text) if text.trim().chars().count() >= MIN_RESPONSE_CHARS => Generation::Success(text),
      Ok(text) => Generation::Failure(format!("response too short ({} chars)", text.trim().chars().count())),
      Err(e) => Generation::Failure(e.to_string()),
    }
  }
}

/// Text chosen for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
  Provider(String),
  Fallback(String),
}

/// Pick the text to deliver: the provider's reply on success, the topic-derived
/// fallback otherwise. The failure reason is logged, never returned.
pub fn select_text(outcome: Generation, req: &GenerationRequest) -> Selection {
  match outcome {
    Generation::Success(text) => Selection::Provider(text),
    Generation::Failure(reason) => {
      warn!(target: "learn", %reason, subject = %req.subject(), "Generation failed; serving fallback");
      Selection::Fallback(fallback_explanation(req.subject(), req.level()))
    }
  }
}

const VIDEO_STAMPS: [&str; 3] = ["[00:00]", "[00:30]", "[01:00]"];

/// Frame explanation text for its format, as markdown for the formatter.
/// Chat ends on a follow-up question, visual on a sketching tip, ebook gets a
/// chapter header and a quick-reference list, and video becomes a short
/// timestamped script of the first three sentences.
pub fn decorate(format: Format, text: &str) -> String {
  let text = text.trim();
  match format {
    Format::Chat => format!("{text}\n\nReady to dive deeper? What specific aspect interests you most?"),
    Format::Visual => format!("{text}\n\n*Visual tip: try sketching the key components as you read!*"),
    Format::Ebook => format!(
      "## Chapter Overview\n\n{text}\n\n**Quick Reference:**\n- Core concept explained\n- Real-world applications\n- Next steps for learning"
    ),
    Format::Video => {
      let sentences: Vec<&str> = text.split(". ").map(str::trim).filter(|s| !s.is_empty()).collect();
      if sentences.len() < VIDEO_STAMPS.len() {
        return format!("{} {text}", VIDEO_STAMPS[0]);
      }
      VIDEO_STAMPS
        .iter()
        .zip(&sentences)
        .map(|(stamp, sentence)| format!("{stamp} {}.", sentence.trim_end_matches('.')))
        .collect::<Vec<_>>()
        .join("\n\n")
    }
  }
}

struct Trace {
  stages: Vec<Stage>,
}

impl Trace {
  fn new() -> Self {
    Self { stages: vec![Stage::Built] }
  }

  fn to(&mut self, next: Stage) {
    debug!(target: "learn", from = ?self.stages.last(), to = ?next, "Stage transition");
    self.stages.push(next);
  }
}

/// Produce an explanation for `req`. Only configuration errors propagate.
pub async fn explain(state: &AppState, req: &GenerationRequest) -> Result<Explanation, AppError> {
  explain_traced(state, req).await.map(|(explanation, _)| explanation)
}

#[instrument(level = "info", skip(state, req), fields(level = %req.level(), format = %req.format(), has_context = req.context().is_some()))]
pub(crate) async fn explain_traced(state: &AppState, req: &GenerationRequest) -> Result<(Explanation, Vec<Stage>), AppError> {
  let mut trace = Trace::new();
  let prompt = build_prompt(&state.prompts, req)?;

  let outcome = match &state.generator {
    Some(generator) => Generation::from_result(generator.generate(&prompt).await),
    None => Generation::Failure("no generation provider configured".into()),
  };

  // `plain` stays undecorated: it is the narration for video audio.
  let (plain, body) = match select_text(outcome, req) {
    Selection::Provider(raw) => {
      trace.to(Stage::Generated);
      let cleaned = sanitize(&raw, state.generation.min_fragment_chars);
      trace.to(Stage::Cleaned);
      let formatted = format_markup(&decorate(req.format(), &cleaned));
      trace.to(Stage::Formatted);
      (cleaned, ammonia::clean(&formatted))
    }
    Selection::Fallback(fallback) => {
      trace.to(Stage::Failed);
      let body = ammonia::clean(&format_markup(&decorate(req.format(), &fallback)));
      (fallback, body)
    }
  };

  let content = match req.format() {
    Format::Visual => {
      let media = image_block(state, req.subject()).await;
      trace.to(Stage::MediaAttached);
      format!("{body}\n{media}")
    }
    Format::Video => {
      let media = video_block(state, req.subject(), &plain).await;
      trace.to(Stage::MediaAttached);
      format!("{body}\n{media}")
    }
    Format::Chat | Format::Ebook => body,
  };
  trace.to(Stage::Delivered);

  info!(target: "learn", content_len = content.len(), stages = trace.stages.len(), "Explanation delivered");
  Ok((
    Explanation { content, format: req.format().to_string(), level: req.level().to_string() },
    trace.stages,
  ))
}

async fn image_block(state: &AppState, subject: &str) -> String {
  let alt = escape_html(subject);
  let result = match &state.media {
    Some(media) => media.generate_image(subject).await,
    None => Err(ProviderError::Unsupported("image generation")),
  };
  match result {
    Ok(url) => format!(
      "<div class=\"lesson-image\"><img src=\"{}\" alt=\"{alt} visual\"><p class=\"image-description\">Illustration: {alt}</p></div>",
      escape_html(&url)
    ),
    Err(e) => {
      warn!(target: "learn", error = %e, "Image generation failed; using placeholder");
      "<div class=\"lesson-image-placeholder\"><p>Visual temporarily unavailable</p></div>".to_string()
    }
  }
}

/// Video, else a search link; then narration audio, else a notice.
async fn video_block(state: &AppState, subject: &str, narration: &str) -> String {
  let title = escape_html(subject);

  let video = match &state.media {
    Some(media) => media.generate_video(subject).await,
    None => Err(ProviderError::Unsupported("video generation")),
  };
  let video_html = match video {
    Ok(url) => format!("<video controls src=\"{}\"></video>", escape_html(&url)),
    Err(e) => {
      debug!(target: "learn", error = %e, "Video unavailable; linking a search instead");
      match video_search_url(subject) {
        Some(url) => format!(
          "<p><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Watch videos about {title}</a></p>",
          escape_html(&url)
        ),
        None => "<p><small>Video temporarily unavailable</small></p>".to_string(),
      }
    }
  };

  let audio = match &state.media {
    Some(media) => media.synthesize_speech(narration).await,
    None => Err(ProviderError::Unsupported("speech synthesis")),
  };
  let audio_html = match audio {
    Ok(url) => format!("<audio controls src=\"{}\"></audio>", escape_html(&url)),
    Err(e) => {
      debug!(target: "learn", error = %e, "Narration unavailable");
      "<p><small>Audio generation temporarily unavailable</small></p>".to_string()
    }
  };

  format!("<div class=\"lesson-video\"><h4>Video: {title}</h4>{video_html}{audio_html}</div>")
}

pub fn video_search_url(subject: &str) -> Option<String> {
  reqwest::Url::parse_with_params("https://www.youtube.com/results", &[("search_query", subject)])
    .ok()
    .map(|u| u.to_string())
}
