//! Community exchange: learners explain topics to each other, the provider
//! grades clarity, and knowledge points accumulate per user.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{BarterStats, Level, PeerExplanation, Upvote};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{get_json, insert_new_json, list_json, put_json, update_json};
use crate::util::{anonymize_user_id, check_key_segment, fill_template};

/// Clarity used when the provider is missing or its reply has no score.
pub const DEFAULT_CLARITY: u8 = 5;
pub const DEFAULT_LIST_LIMIT: usize = 5;
pub const MENTORSHIP_POINTS: u32 = 50;
pub const BONUS_AI_POINTS: u32 = 20;

fn explanation_key(id: &str) -> String {
  format!("community/explanations/{id}")
}

fn upvote_key(explanation_id: &str, user_id: &str) -> String {
  format!("community/upvotes/{explanation_id}/{user_id}")
}

fn stats_key(user_id: &str) -> String {
  format!("community/stats/{user_id}")
}

#[derive(Clone, Debug, Serialize)]
pub struct Submitted {
  pub success: bool,
  pub explanation_id: String,
  pub clarity_score: u8,
  pub points_earned: u32,
  pub message: String,
}

/// Listing view; the author id is anonymized.
#[derive(Clone, Debug, Serialize)]
pub struct PublicExplanation {
  pub id: String,
  pub user_id: String,
  pub topic: String,
  pub level: Level,
  pub transcript: String,
  pub clarity_score: u8,
  pub upvotes: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UpvoteOutcome {
  pub success: bool,
  pub message: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CommunityStats {
  pub total_points: u32,
  pub explanations_count: u32,
  pub upvotes_given: u32,
  pub can_redeem_mentorship: bool,
  pub can_redeem_bonus_ai: bool,
}

impl From<&BarterStats> for CommunityStats {
  fn from(s: &BarterStats) -> Self {
    Self {
      total_points: s.total_points,
      explanations_count: s.explanations_count,
      upvotes_given: s.upvotes_given,
      can_redeem_mentorship: s.total_points >= MENTORSHIP_POINTS,
      can_redeem_bonus_ai: s.total_points >= BONUS_AI_POINTS,
    }
  }
}

/// First integer in 1..=10 found in a grading reply.
pub fn parse_clarity(reply: &str) -> Option<u8> {
  static RE: OnceLock<Regex> = OnceLock::new();
  let re = RE.get_or_init(|| Regex::new(r"\b(10|[1-9])\b").expect("static regex"));
  re.captures(reply).and_then(|c| c[1].parse().ok())
}

async fn score_clarity(state: &AppState, topic: &str, level: Level, transcript: &str) -> u8 {
  let Some(generator) = &state.generator else {
    return DEFAULT_CLARITY;
  };
  let prompt = fill_template(
    &state.prompts.clarity_template,
    &[("topic", topic), ("level", level.as_str()), ("transcript", transcript)],
  );
  match generator.generate_brief(&prompt).await {
    Ok(reply) => parse_clarity(&reply).unwrap_or_else(|| {
      debug!(target: "community", reply_len = reply.len(), "No score in grading reply");
      DEFAULT_CLARITY
    }),
    Err(e) => {
      warn!(target: "community", error = %e, "Clarity grading failed; using default");
      DEFAULT_CLARITY
    }
  }
}

#[instrument(level = "info", skip(state, transcript), fields(transcript_len = transcript.len()))]
pub async fn submit_explanation(
  state: &AppState,
  user_id: &str,
  topic: &str,
  level: Level,
  transcript: &str,
) -> Result<Submitted, AppError> {
  check_key_segment("user_id", user_id)?;
  let topic = topic.trim();
  let transcript = transcript.trim();
  if topic.is_empty() {
    return Err(AppError::Validation("Topic is required".into()));
  }
  if transcript.is_empty() {
    return Err(AppError::Validation("Transcript is required".into()));
  }

  let clarity_score = score_clarity(state, topic, level, transcript).await;
  let knowledge_points = u32::from(clarity_score).max(1);

  let explanation = PeerExplanation {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    topic: topic.to_string(),
    level,
    transcript: ammonia::clean(transcript),
    clarity_score,
    knowledge_points,
    upvotes: 0,
    created_at: Utc::now(),
  };
  put_json(state.store.as_ref(), &explanation_key(&explanation.id), &explanation).await?;

  let owner = user_id.to_string();
  update_json(state.store.as_ref(), &stats_key(user_id), move |current: Option<BarterStats>| {
    let mut stats = current.unwrap_or_else(|| BarterStats { user_id: owner, ..Default::default() });
    stats.total_points = stats.total_points.saturating_add(knowledge_points);
    stats.explanations_count += 1;
    Ok(stats)
  })
  .await?;

  info!(target: "community", id = %explanation.id, clarity_score, knowledge_points, "Explanation shared");
  Ok(Submitted {
    success: true,
    explanation_id: explanation.id,
    clarity_score,
    points_earned: knowledge_points,
    message: format!("Great explanation! You earned {knowledge_points} knowledge points."),
  })
}

/// Explanations for `topic` (`all` for every topic), most upvoted first.
pub async fn list_explanations(state: &AppState, topic: &str, limit: usize) -> Result<Vec<PublicExplanation>, AppError> {
  let needle = topic.trim().to_lowercase();
  let mut all: Vec<PeerExplanation> = list_json(state.store.as_ref(), "community/explanations/").await?;
  if needle != "all" {
    all.retain(|e| e.topic.to_lowercase().contains(&needle));
  }
  all.sort_by(|a, b| b.upvotes.cmp(&a.upvotes).then_with(|| b.clarity_score.cmp(&a.clarity_score)));

  Ok(all
    .into_iter()
    .take(limit)
    .map(|e| PublicExplanation {
      user_id: anonymize_user_id(&e.user_id),
      id: e.id,
      topic: e.topic,
      level: e.level,
      transcript: e.transcript,
      clarity_score: e.clarity_score,
      upvotes: e.upvotes,
    })
    .collect())
}

/// One upvote per user and explanation. A repeat is reported, not an error.
#[instrument(level = "info", skip(state))]
pub async fn upvote(state: &AppState, user_id: &str, explanation_id: &str) -> Result<UpvoteOutcome, AppError> {
  check_key_segment("user_id", user_id)?;
  let not_found = || AppError::NotFound("Explanation not found".into());
  check_key_segment("explanation_id", explanation_id).map_err(|_| not_found())?;

  let key = explanation_key(explanation_id);
  if get_json::<PeerExplanation>(state.store.as_ref(), &key).await?.is_none() {
    return Err(not_found());
  }

  let vote = Upvote { user_id: user_id.to_string(), explanation_id: explanation_id.to_string(), created_at: Utc::now() };
  if !insert_new_json(state.store.as_ref(), &upvote_key(explanation_id, user_id), &vote).await? {
    debug!(target: "community", %explanation_id, "Duplicate upvote ignored");
    return Ok(UpvoteOutcome { success: false, message: "You already upvoted this explanation!".into() });
  }

  update_json(state.store.as_ref(), &key, |current: Option<PeerExplanation>| {
    let mut explanation = current.ok_or_else(|| AppError::NotFound("Explanation not found".into()))?;
    explanation.upvotes += 1;
    Ok(explanation)
  })
  .await?;

  let voter = user_id.to_string();
  update_json(state.store.as_ref(), &stats_key(user_id), move |current: Option<BarterStats>| {
    let mut stats = current.unwrap_or_else(|| BarterStats { user_id: voter, ..Default::default() });
    stats.upvotes_given += 1;
    Ok(stats)
  })
  .await?;

  info!(target: "community", %explanation_id, "Upvote recorded");
  Ok(UpvoteOutcome { success: true, message: "Upvoted successfully!".into() })
}

pub async fn stats(state: &AppState, user_id: &str) -> Result<CommunityStats, AppError> {
  check_key_segment("user_id", user_id)?;
  let stats = get_json::<BarterStats>(state.store.as_ref(), &stats_key(user_id)).await?.unwrap_or_default();
  Ok(CommunityStats::from(&stats))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::AgentConfig;
  use crate::openai::Generator;
  use crate::store::MemoryStore;
  use crate::testing::MockGenerator;

  async fn state(generator: Option<Arc<MockGenerator>>) -> AppState {
    let generator = generator.map(|g| g as Arc<dyn Generator>);
    AppState::from_parts(Arc::new(MemoryStore::new()), generator, None, AgentConfig::default())
      .await
      .unwrap()
  }

  #[test]
  fn clarity_is_first_score_in_range() {
    assert_eq!(parse_clarity("8"), Some(8));
    assert_eq!(parse_clarity("Score: 10/10"), Some(10));
    assert_eq!(parse_clarity("I'd give it a 7 out of 10."), Some(7));
    assert_eq!(parse_clarity("0 or 42 or 11"), None);
    assert_eq!(parse_clarity("no idea"), None);
  }

  #[tokio::test]
  async fn submission_awards_clarity_points() {
    let generator = MockGenerator::ok("Score: 8");
    let st = state(Some(generator.clone())).await;
    let out = submit_explanation(&st, "alice", "Photosynthesis", Level::Primary, "Plants use light to make sugar.").await.unwrap();
    assert_eq!((out.clarity_score, out.points_earned), (8, 8));
    assert_eq!(out.message, "Great explanation! You earned 8 knowledge points.");
    assert!(generator.last_prompt().unwrap().contains("Plants use light to make sugar."));

    submit_explanation(&st, "alice", "Gravity", Level::Secondary, "Mass attracts mass.").await.unwrap();
    let s = stats(&st, "alice").await.unwrap();
    assert_eq!((s.total_points, s.explanations_count), (16, 2));
    assert!(!s.can_redeem_bonus_ai);
  }

  #[tokio::test]
  async fn missing_provider_scores_five() {
    let st = state(None).await;
    let out = submit_explanation(&st, "bob", "Cells", Level::Primary, "Cells are small.").await.unwrap();
    assert_eq!(out.clarity_score, DEFAULT_CLARITY);

    let st = state(Some(MockGenerator::failing())).await;
    let out = submit_explanation(&st, "bob", "Cells", Level::Primary, "Cells are small.").await.unwrap();
    assert_eq!(out.points_earned, 5);
  }

  #[tokio::test]
  async fn upvotes_are_once_per_user() {
    let st = state(None).await;
    let id = submit_explanation(&st, "alice", "Atoms", Level::Primary, "Atoms are tiny.").await.unwrap().explanation_id;

    let first = upvote(&st, "bob", &id).await.unwrap();
    assert!(first.success);
    let again = upvote(&st, "bob", &id).await.unwrap();
    assert_eq!(again, UpvoteOutcome { success: false, message: "You already upvoted this explanation!".into() });
    assert!(upvote(&st, "carol", &id).await.unwrap().success);

    let listed = list_explanations(&st, "atoms", DEFAULT_LIST_LIMIT).await.unwrap();
    assert_eq!(listed[0].upvotes, 2);
    assert_eq!(stats(&st, "bob").await.unwrap().upvotes_given, 1);

    assert!(matches!(upvote(&st, "bob", "missing").await, Err(AppError::NotFound(_))));
  }

  #[tokio::test]
  async fn listing_orders_and_anonymizes() {
    let st = state(None).await;
    let low = submit_explanation(&st, "user-aaaaaaaa", "Volcano basics", Level::Primary, "Lava is hot rock.").await.unwrap();
    let high = submit_explanation(&st, "user-bbbbbbbb", "Volcanoes", Level::Primary, "Magma rises up.").await.unwrap();
    submit_explanation(&st, "user-cccccccc", "Rivers", Level::Primary, "Water flows downhill.").await.unwrap();
    upvote(&st, "voter", &high.explanation_id).await.unwrap();

    let listed = list_explanations(&st, "VOLCANO", DEFAULT_LIST_LIMIT).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![high.explanation_id.as_str(), low.explanation_id.as_str()]);
    assert_eq!(listed[0].user_id, "user-bbb***");

    assert_eq!(list_explanations(&st, "all", DEFAULT_LIST_LIMIT).await.unwrap().len(), 3);
    assert_eq!(list_explanations(&st, "all", 1).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn redeem_thresholds() {
    let s = CommunityStats::from(&BarterStats { user_id: "x".into(), total_points: 50, explanations_count: 5, upvotes_given: 0 });
    assert!(s.can_redeem_mentorship && s.can_redeem_bonus_ai);
    let st = state(None).await;
    assert_eq!(stats(&st, "nobody").await.unwrap().total_points, 0);
  }
}
