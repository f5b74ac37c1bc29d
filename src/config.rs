//! Loading agent configuration (prompt tables, generation parameters and an
//! optional challenge bank) from TOML, plus process settings from the
//! environment.
//!
//! See `AgentConfig` and `Prompts` for the expected schema. Every section is
//! optional; missing keys fall back to the built-in defaults.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{error, info};

use crate::sanitize::MIN_FRAGMENT_CHARS;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationParams,
  #[serde(default)]
  pub challenges: Vec<ChallengeCfg>,
}

/// Challenge entry accepted in TOML configuration (`[[challenges]]`).
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  pub question: String,
  pub correct_answer: String,
  pub options: Vec<String>,
  pub category: String,
  /// Any level name or alias (`beginner`, `secondary`, ...).
  pub difficulty: String,
  #[serde(default)] pub points: Option<u32>,
  #[serde(default)] pub time_limit: Option<u32>,
}

/// Knobs passed to the generation provider and the sanitizer.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
  pub max_tokens: u32,
  pub temperature: f32,
  pub min_fragment_chars: usize,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self { max_tokens: 1000, temperature: 0.7, min_fragment_chars: MIN_FRAGMENT_CHARS }
  }
}

/// Instruction tables and templates. Tables are keyed by canonical level
/// (`primary`, `secondary`, `foundation`, `degree`) and format (`chat`,
/// `visual`, `ebook`, `video`) names. Templates use `{name}` placeholders.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub levels: BTreeMap<String, String>,
  pub formats: BTreeMap<String, String>,
  // Explanations
  pub topic_template: String,
  pub context_template: String,
  pub summary_template: String,
  // Game
  pub challenge_template: String,
  // Community
  pub clarity_template: String,
  // Study tools
  pub flashcards_template: String,
  pub blurting_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    let levels = [
      ("primary", "Explain in very simple terms using fun analogies, everyday examples, and basic vocabulary suitable for Primary school students (Year 1-6)"),
      ("secondary", "Explain with clear examples and moderate detail using vocabulary and concepts appropriate for Secondary school students (Form 1-5)"),
      ("foundation", "Provide detailed explanations with scientific terms and real-world applications suitable for Foundation/Pre-University students"),
      ("degree", "Give comprehensive technical explanations with advanced concepts, research findings, and professional terminology for Degree-level understanding"),
    ];
    let formats = [
      ("chat", "Answer in conversational style with engaging questions"),
      ("visual", "Answer as a brief image description in 1-2 sentences"),
      ("ebook", "Answer in structured format with headings and key points"),
      ("video", "Answer as an educational video script with clear segments"),
    ];

    Self {
      levels: levels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
      formats: formats.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
      topic_template: "You are an expert educator. {level_instruction} about '{topic}'.\n{format_instruction}.\n\nProvide specific facts and real examples about {topic}.".into(),
      context_template: "You are an expert educator. {level_instruction} based on this uploaded document content.\n{format_instruction}.\n\nDocument content: {context}\n\nExplain the main concepts from this document. Be specific and reference the actual content.".into(),
      summary_template: "You are an expert document summarizer. Create a comprehensive summary of this document at {level} level.\n{format_instruction}.\n\nDocument content: {context}\n\nSummarize the key points, main ideas, and important details from this document. Be thorough and well-organized.".into(),
      challenge_template: "Generate a {difficulty} level challenge question for the {category} subject.\n\nFormat as JSON with this exact structure:\n{\"question\": \"Question text here?\", \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"], \"correct_answer\": \"Option A\"}\n\nEnsure one option is clearly correct and the others are plausible but wrong. Return ONLY the JSON object, no other text.".into(),
      clarity_template: "You are an expert educator grading student explanations.\n\nTopic: {topic}\nEducation Level: {level}\nStudent Explanation: {transcript}\n\nGrade this explanation on a scale of 1-10 based on accuracy (40%), clarity and organization (30%), appropriate complexity for the level (20%) and use of examples (10%).\n\nRespond with ONLY a single number from 1-10. No other text.".into(),
      flashcards_template: "Generate 5 flashcards for the topic '{topic}' at {level} education level.\n\nFormat as a JSON array: [{\"question\": \"Question text here?\", \"answer\": \"Answer text here\"}]\n\nKeep questions clear and answers concise but complete. Focus on key concepts, definitions and important facts about {topic}. Return ONLY the JSON array, no other text.".into(),
      blurting_template: "You are an expert educator analyzing a student's blurting session (active recall practice).\n\nTopic: {topic}\nEducation Level: {level}\nTime Spent: {time_spent} seconds\nStudent's Blurting Text: {text}\n\nDescribe what they got right, what they missed, their knowledge gaps and suggestions for improvement. Use clear headings and be encouraging but honest about gaps.".into(),
    }
  }
}

/// Parse an agent config from TOML text.
pub fn parse_agent_config(text: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(text)
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "lumen_backend", %path, challenges = cfg.challenges.len(), "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lumen_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lumen_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Process-level settings read from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  /// Directory store root; the in-memory store is used when unset.
  pub store_dir: Option<PathBuf>,
  pub openai_timeout: Duration,
}

impl Settings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    let store_dir = std::env::var("STORE_DIR").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);
    let secs = std::env::var("OPENAI_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(30);
    Self { port, store_dir, openai_timeout: Duration::from_secs(secs) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_cover_every_level_and_format() {
    let p = Prompts::default();
    for level in crate::domain::Level::ALL {
      assert!(p.levels.contains_key(level.as_str()));
    }
    for format in crate::domain::Format::ALL {
      assert!(p.formats.contains_key(format.as_str()));
    }
  }

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg = parse_agent_config(
      r#"
[generation]
temperature = 0.2

[prompts.levels]
primary = "Talk like a friendly teacher"

[[challenges]]
question = "What is 2 + 2?"
correct_answer = "4"
options = ["3", "4", "5"]
category = "Math"
difficulty = "beginner"
"#,
    )
    .unwrap();

    assert_eq!(cfg.generation.temperature, 0.2);
    assert_eq!(cfg.generation.max_tokens, 1000);
    assert_eq!(cfg.generation.min_fragment_chars, MIN_FRAGMENT_CHARS);
    assert_eq!(cfg.prompts.levels.get("primary").map(String::as_str), Some("Talk like a friendly teacher"));
    // A table given in TOML replaces the default table wholesale.
    assert!(!cfg.prompts.levels.contains_key("degree"));
    assert!(cfg.prompts.topic_template.contains("{topic}"));
    assert_eq!(cfg.challenges.len(), 1);
    assert_eq!(cfg.challenges[0].points, None);
  }

  #[test]
  fn empty_document_is_all_defaults() {
    let cfg = parse_agent_config("").unwrap();
    assert_eq!(cfg.prompts.formats.len(), 4);
    assert!(cfg.challenges.is_empty());
  }
}
