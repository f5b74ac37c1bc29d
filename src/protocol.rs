//! Public protocol structs for the HTTP endpoints (serde ready).
//! Request bodies carry `validator` rules; handlers call `validate()` first.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::community::PublicExplanation;
use crate::domain::{Challenge, ChallengeSource, Flashcard, ForumThread, Level};
use crate::scoring::LeaderboardEntry;

fn default_level() -> String {
    "beginner".into()
}

fn default_format() -> String {
    "chat".into()
}

#[derive(Debug, Deserialize, Validate)]
pub struct LearnIn {
    #[serde(default)]
    #[validate(length(max = 500, message = "Topic must be at most 500 chars"))]
    pub topic: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
    /// Extracted document text; truncated, not rejected, when long.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FlashcardsIn {
    #[validate(length(min = 1, max = 500, message = "Topic length must be between 1 and 500 chars"))]
    pub topic: String,
    #[serde(default = "default_level")]
    pub level: String,
}
#[derive(Serialize)]
pub struct FlashcardsOut {
    pub success: bool,
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BlurtingIn {
    #[validate(length(min = 1, max = 500, message = "Topic length must be between 1 and 500 chars"))]
    pub topic: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[validate(length(min = 1, max = 20000, message = "Text length must be between 1 and 20000 chars"))]
    pub text: String,
    #[serde(rename = "timeSpent", default)]
    pub time_spent: u32,
}
#[derive(Serialize)]
pub struct BlurtingOut {
    pub success: bool,
    pub analysis: String,
    pub word_count: usize,
}

//
// Game
//

#[derive(Debug, Deserialize, Validate)]
pub struct ChallengeQuery {
    pub difficulty: Option<String>,
    #[validate(length(max = 100, message = "Category must be at most 100 chars"))]
    pub category: Option<String>,
}

/// Challenge as served to players: the answer stays on the server.
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
    pub id: String,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub category: String,
    pub difficulty: Level,
    pub points: u32,
    pub time_limit: u32,
    pub source: ChallengeSource,
}

pub fn to_out(c: &Challenge) -> ChallengeOut {
    ChallengeOut {
        id: c.id.clone(),
        title: c.title.clone(),
        question: c.question.clone(),
        options: c.options.clone(),
        category: c.category.clone(),
        difficulty: c.difficulty,
        points: c.points,
        time_limit: c.time_limit,
        source: c.source.clone(),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerIn {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, max = 128, message = "userId length must be between 1 and 128 chars"))]
    pub user_id: String,
    #[serde(rename = "challengeId")]
    #[validate(length(min = 1, max = 128, message = "challengeId length must be between 1 and 128 chars"))]
    pub challenge_id: String,
    #[validate(length(max = 1000, message = "Answer must be at most 1000 chars"))]
    pub answer: String,
    /// Seconds.
    #[serde(rename = "timeTaken", default)]
    pub time_taken: u32,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub success: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct CategoriesOut {
    pub success: bool,
    pub categories: Vec<String>,
}

//
// Community
//

#[derive(Debug, Deserialize, Validate)]
pub struct ExplanationIn {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, max = 128, message = "userId length must be between 1 and 128 chars"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 200, message = "Topic length must be between 1 and 200 chars"))]
    pub topic: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[validate(length(min = 1, max = 5000, message = "Transcript length must be between 1 and 5000 chars"))]
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplanationsQuery {
    pub topic: Option<String>,
    pub limit: Option<usize>,
}
#[derive(Serialize)]
pub struct ExplanationsOut {
    pub success: bool,
    pub explanations: Vec<PublicExplanation>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpvoteIn {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, max = 128, message = "userId length must be between 1 and 128 chars"))]
    pub user_id: String,
}

//
// Forum
//

#[derive(Debug, Deserialize, Validate)]
pub struct ThreadIn {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, max = 128, message = "userId length must be between 1 and 128 chars"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 chars"))]
    pub title: String,
    #[validate(length(min = 1, max = 10000, message = "Body length must be between 1 and 10000 chars"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyIn {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, max = 128, message = "userId length must be between 1 and 128 chars"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 5000, message = "Reply length must be between 1 and 5000 chars"))]
    pub body: String,
}

#[derive(Serialize)]
pub struct ThreadsOut {
    pub success: bool,
    pub threads: Vec<ForumThread>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub provider: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_payload_uses_camel_case_ids() {
        let body: AnswerIn =
            serde_json::from_str(r#"{"userId": "alice", "challengeId": "seed-prog-1", "answer": "def", "timeTaken": 12}"#).unwrap();
        assert_eq!((body.user_id.as_str(), body.time_taken), ("alice", 12));
        assert!(body.validate().is_ok());

        let empty: AnswerIn = serde_json::from_str(r#"{"userId": "", "challengeId": "x", "answer": "a"}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn challenge_category_is_bounded() {
        let q = ChallengeQuery { difficulty: None, category: Some("x".repeat(101)) };
        assert!(q.validate().is_err());
        let q = ChallengeQuery { difficulty: None, category: Some("Physics".into()) };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn learn_defaults() {
        let body: LearnIn = serde_json::from_str(r#"{"topic": "Cells"}"#).unwrap();
        assert_eq!((body.level.as_str(), body.format.as_str()), ("beginner", "chat"));
        assert!(body.context.is_none());
    }

    #[test]
    fn challenge_out_hides_the_answer() {
        let c = crate::seeds::seed_challenges().remove(0);
        let v = serde_json::to_value(to_out(&c)).unwrap();
        assert!(v.get("correct_answer").is_none());
        assert_eq!(v["difficulty"], "primary");
    }
}
