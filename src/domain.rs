//! Domain models: education levels, presentation formats, generation requests,
//! quiz challenges and attempts, player progress, and community records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound on document text embedded into a prompt.
pub const MAX_CONTEXT_CHARS: usize = 5000;

/// Canonical audience tier. External aliases (beginner/intermediate/advanced)
/// are folded into this vocabulary on parse, and the same vocabulary is used
/// for challenge difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Primary,
  Secondary,
  Foundation,
  Degree,
}

impl Level {
  pub const ALL: [Level; 4] = [Level::Primary, Level::Secondary, Level::Foundation, Level::Degree];

  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Primary => "primary",
      Level::Secondary => "secondary",
      Level::Foundation => "foundation",
      Level::Degree => "degree",
    }
  }
}

impl FromStr for Level {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "primary" | "beginner" => Ok(Level::Primary),
      "secondary" | "intermediate" => Ok(Level::Secondary),
      "foundation" | "advanced" => Ok(Level::Foundation),
      "degree" => Ok(Level::Degree),
      other => Err(AppError::Configuration(format!("Unknown level: {other}"))),
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Presentation mode of generated content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
  Chat,
  /// Image-annotated. `sketch` is accepted as an alias.
  Visual,
  Ebook,
  /// Video-annotated.
  Video,
}

impl Format {
  pub const ALL: [Format; 4] = [Format::Chat, Format::Visual, Format::Ebook, Format::Video];

  pub fn as_str(&self) -> &'static str {
    match self {
      Format::Chat => "chat",
      Format::Visual => "visual",
      Format::Ebook => "ebook",
      Format::Video => "video",
    }
  }
}

impl FromStr for Format {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "chat" => Ok(Format::Chat),
      "visual" | "sketch" => Ok(Format::Visual),
      "ebook" => Ok(Format::Ebook),
      "video" => Ok(Format::Video),
      other => Err(AppError::Configuration(format!("Unknown format: {other}"))),
    }
  }
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A validated explanation request. Fields are private so the request cannot
/// change after `new` has checked it.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  topic: String,
  level: Level,
  format: Format,
  context: String,
}

impl GenerationRequest {
  /// Parses level and format, trims the topic and bounds the context.
  /// A topic is required unless document context is supplied.
  pub fn new(topic: &str, level: &str, format: &str, context: Option<&str>) -> Result<Self, AppError> {
    let level = level.parse::<Level>()?;
    let format = format.parse::<Format>()?;
    let context: String = context
      .map(str::trim)
      .unwrap_or_default()
      .chars()
      .take(MAX_CONTEXT_CHARS)
      .collect();
    let topic = topic.trim().to_string();
    if topic.is_empty() && context.is_empty() {
      return Err(AppError::Validation("Topic is required".into()));
    }
    Ok(Self { topic, level, format, context })
  }

  pub fn topic(&self) -> &str { &self.topic }
  pub fn level(&self) -> Level { self.level }
  pub fn format(&self) -> Format { self.format }

  /// Extracted document text, `None` when the request is topic-grounded.
  pub fn context(&self) -> Option<&str> {
    if self.context.is_empty() { None } else { Some(&self.context) }
  }

  /// Label used for fallbacks and media captions.
  pub fn subject(&self) -> &str {
    if self.topic.is_empty() { "this document" } else { &self.topic }
  }
}

/// Caller-facing result of an explanation request.
#[derive(Clone, Debug, Serialize)]
pub struct Explanation {
  pub content: String,
  pub format: String,
  pub level: String,
}

/// Where did a challenge come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSource {
  LocalBank,   // from the TOML challenge bank
  Seed,        // built-in sample set
  Generated,   // generated by the provider and stored
  Placeholder, // synthesized when nothing else was available
}

/// Quiz item. Read-only once stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  pub question: String,
  pub correct_answer: String,
  pub options: Vec<String>,
  pub category: String,
  pub difficulty: Level,
  pub points: u32,
  /// Seconds.
  pub time_limit: u32,
  pub source: ChallengeSource,
}

/// One graded submission. Never mutated after it is stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attempt {
  pub id: String,
  pub user_id: String,
  pub challenge_id: String,
  pub answer: String,
  pub is_correct: bool,
  pub points_earned: u32,
  pub time_taken: u32,
  pub completed_at: DateTime<Utc>,
}

/// Per-user game state; `level` always equals `total_points / 100 + 1`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProgress {
  pub user_id: String,
  pub total_points: u32,
  pub challenges_completed: u32,
  pub current_streak: u32,
  pub best_streak: u32,
  pub level: u32,
}

impl PlayerProgress {
  pub fn new(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      total_points: 0,
      challenges_completed: 0,
      current_streak: 0,
      best_streak: 0,
      level: 1,
    }
  }
}

/// A learner's own explanation of a topic, shared with peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerExplanation {
  pub id: String,
  pub user_id: String,
  pub topic: String,
  pub level: Level,
  pub transcript: String,
  pub clarity_score: u8,
  pub knowledge_points: u32,
  pub upvotes: u32,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Upvote {
  pub user_id: String,
  pub explanation_id: String,
  pub created_at: DateTime<Utc>,
}

/// Knowledge points earned through the community exchange.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarterStats {
  pub user_id: String,
  pub total_points: u32,
  pub explanations_count: u32,
  pub upvotes_given: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForumThread {
  pub id: String,
  pub user_id: String,
  pub title: String,
  pub body: String,
  pub reply_count: u32,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForumReply {
  pub id: String,
  pub thread_id: String,
  pub user_id: String,
  pub body: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
  pub question: String,
  pub answer: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_aliases_fold_into_canonical_vocabulary() {
    assert_eq!("beginner".parse::<Level>().unwrap(), Level::Primary);
    assert_eq!("Intermediate".parse::<Level>().unwrap(), Level::Secondary);
    assert_eq!("advanced".parse::<Level>().unwrap(), Level::Foundation);
    assert_eq!("degree".parse::<Level>().unwrap(), Level::Degree);
    assert!(matches!("expert".parse::<Level>(), Err(AppError::Configuration(_))));
  }

  #[test]
  fn sketch_is_visual() {
    assert_eq!("sketch".parse::<Format>().unwrap(), Format::Visual);
    assert!(matches!("podcast".parse::<Format>(), Err(AppError::Configuration(_))));
  }

  #[test]
  fn request_requires_topic_or_context() {
    let err = GenerationRequest::new("  ", "primary", "chat", None).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let req = GenerationRequest::new("", "primary", "chat", Some("Cells divide by mitosis.")).unwrap();
    assert_eq!(req.subject(), "this document");
    assert_eq!(req.context(), Some("Cells divide by mitosis."));
  }

  #[test]
  fn context_is_bounded() {
    let long = "a".repeat(MAX_CONTEXT_CHARS + 100);
    let req = GenerationRequest::new("Cells", "primary", "ebook", Some(&long)).unwrap();
    assert_eq!(req.context().map(|c| c.chars().count()), Some(MAX_CONTEXT_CHARS));
  }

  #[test]
  fn configuration_errors_win_over_validation() {
    let err = GenerationRequest::new("", "wizard", "chat", None).unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
  }
}
