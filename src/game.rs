//! Challenge engine: picks challenges, grades submissions and persists
//! progress. The arithmetic lives in `scoring`; this module owns the records.
//!
//! Selection order: stored challenges matching the difficulty (and category),
//! then a provider-generated one, then a placeholder. Generated and
//! placeholder challenges are stored so that they can be answered.

use std::collections::BTreeSet;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Attempt, Challenge, ChallengeSource, Level, PlayerProgress};
use crate::error::{AppError, ProviderError};
use crate::openai::Generator;
use crate::scoring::{apply_attempt, grade, points_earned, rank_leaderboard, LeaderboardEntry, PlayerStats};
use crate::seeds::{placeholder_challenge, DEFAULT_CATEGORY, DEFAULT_CHALLENGE_POINTS, DEFAULT_TIME_LIMIT};
use crate::state::{challenge_key, AppState};
use crate::store::{get_json, insert_new_json, list_json, put_json, update_json};
use crate::util::{check_key_segment, extract_json_object, fill_template, trunc_for_log};

pub fn player_key(user_id: &str) -> String {
  format!("players/{user_id}")
}

fn attempt_key(user_id: &str, attempt_id: &str) -> String {
  format!("attempts/{user_id}/{attempt_id}")
}

/// Caller-facing result of a submission.
#[derive(Clone, Debug, Serialize)]
pub struct SubmitOutcome {
  pub success: bool,
  pub is_correct: bool,
  pub points_earned: u32,
  pub correct_answer: String,
  pub message: String,
}

/// Random challenge for `difficulty`, optionally restricted to `category`.
#[instrument(level = "info", skip(state))]
pub async fn choose_challenge(state: &AppState, difficulty: Level, category: Option<&str>) -> Result<Challenge, AppError> {
  let category = category.map(str::trim).filter(|c| !c.is_empty());

  let all: Vec<Challenge> = list_json(state.store.as_ref(), "challenges/").await?;
  let candidates: Vec<Challenge> = all
    .into_iter()
    .filter(|c| c.difficulty == difficulty)
    .filter(|c| category.map_or(true, |cat| c.category.eq_ignore_ascii_case(cat)))
    .collect();

  // thread_rng is not Send; keep it out of any await.
  let picked = candidates.choose(&mut rand::thread_rng()).cloned();
  if let Some(ch) = picked {
    info!(target: "game", id = %ch.id, pool = candidates.len(), "Challenge selected");
    return Ok(ch);
  }

  let challenge = match &state.generator {
    Some(generator) => match generate_challenge(state, generator.as_ref(), difficulty, category).await {
      Ok(ch) => ch,
      Err(e) => {
        warn!(target: "game", error = %e, "Challenge generation failed; using placeholder");
        placeholder_challenge(difficulty, category)
      }
    },
    None => placeholder_challenge(difficulty, category),
  };

  let key = challenge_key(&challenge.id);
  match challenge.source {
    // Placeholder ids are deterministic; an existing record is left alone.
    ChallengeSource::Placeholder => {
      if !insert_new_json(state.store.as_ref(), &key, &challenge).await? {
        debug!(target: "game", id = %challenge.id, "Placeholder already stored");
        return Ok(challenge);
      }
    }
    _ => put_json(state.store.as_ref(), &key, &challenge).await?,
  }
  info!(target: "game", id = %challenge.id, source = ?challenge.source, "Challenge created on demand");
  Ok(challenge)
}

#[derive(Deserialize)]
struct GeneratedChallenge {
  question: String,
  options: Vec<String>,
  correct_answer: String,
}

async fn generate_challenge(
  state: &AppState,
  generator: &dyn Generator,
  difficulty: Level,
  category: Option<&str>,
) -> Result<Challenge, ProviderError> {
  let category = category.unwrap_or(DEFAULT_CATEGORY);
  let prompt = fill_template(
    &state.prompts.challenge_template,
    &[("difficulty", difficulty.as_str()), ("category", category)],
  );
  let reply = generator.generate_brief(&prompt).await?;
  parse_generated_challenge(&reply, difficulty, category)
}

/// Parse the first JSON object of a reply into a challenge.
pub fn parse_generated_challenge(reply: &str, difficulty: Level, category: &str) -> Result<Challenge, ProviderError> {
  let json = extract_json_object(reply).ok_or_else(|| ProviderError::Decode(format!("no JSON object in {}", trunc_for_log(reply, 80))))?;
  let g: GeneratedChallenge = serde_json::from_str(json).map_err(|e| ProviderError::Decode(e.to_string()))?;

  let options: Vec<String> = g.options.iter().map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect();
  let correct_answer = g.correct_answer.trim().to_string();
  if g.question.trim().is_empty() || options.len() < 2 || !options.contains(&correct_answer) {
    return Err(ProviderError::Decode("generated challenge failed validation".into()));
  }

  Ok(Challenge {
    id: Uuid::new_v4().to_string(),
    title: format!("{category} Challenge"),
    question: g.question.trim().to_string(),
    correct_answer,
    options,
    category: category.to_string(),
    difficulty,
    points: DEFAULT_CHALLENGE_POINTS,
    time_limit: DEFAULT_TIME_LIMIT,
    source: ChallengeSource::Generated,
  })
}

/// Grade `answer`, store the attempt and fold it into the player's progress.
#[instrument(level = "info", skip(state, answer), fields(answer_len = answer.len()))]
pub async fn submit_answer(
  state: &AppState,
  user_id: &str,
  challenge_id: &str,
  answer: &str,
  time_taken: u32,
) -> Result<SubmitOutcome, AppError> {
  check_key_segment("user_id", user_id)?;
  let not_found = || AppError::NotFound("Challenge not found".into());
  if check_key_segment("challenge_id", challenge_id).is_err() {
    return Err(not_found());
  }
  let challenge: Challenge = get_json(state.store.as_ref(), &challenge_key(challenge_id))
    .await?
    .ok_or_else(not_found)?;

  let is_correct = grade(answer, &challenge.correct_answer);
  let points = if is_correct { points_earned(challenge.points, time_taken) } else { 0 };

  let attempt = Attempt {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    challenge_id: challenge.id.clone(),
    answer: answer.to_string(),
    is_correct,
    points_earned: points,
    time_taken,
    completed_at: Utc::now(),
  };
  put_json(state.store.as_ref(), &attempt_key(user_id, &attempt.id), &attempt).await?;

  let owner = user_id.to_string();
  let progress: PlayerProgress = update_json(state.store.as_ref(), &player_key(user_id), move |current: Option<PlayerProgress>| {
    let mut progress = current.unwrap_or_else(|| PlayerProgress::new(&owner));
    apply_attempt(&mut progress, is_correct, points);
    Ok(progress)
  })
  .await?;

  info!(
    target: "game",
    challenge = %challenge.id, is_correct, points, total = progress.total_points, streak = progress.current_streak,
    "Answer graded"
  );

  let message = if is_correct {
    "Correct! Great job!".to_string()
  } else {
    format!("Incorrect. The answer was: {}", challenge.correct_answer)
  };
  Ok(SubmitOutcome { success: true, is_correct, points_earned: points, correct_answer: challenge.correct_answer, message })
}

/// Stats of a player; unknown players get fresh level-1 stats.
pub async fn player_stats(state: &AppState, user_id: &str) -> Result<PlayerStats, AppError> {
  check_key_segment("user_id", user_id)?;
  let progress = get_json::<PlayerProgress>(state.store.as_ref(), &player_key(user_id))
    .await?
    .unwrap_or_else(|| PlayerProgress::new(user_id));
  Ok(PlayerStats::from(&progress))
}

pub async fn leaderboard(state: &AppState, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
  let players: Vec<PlayerProgress> = list_json(state.store.as_ref(), "players/").await?;
  Ok(rank_leaderboard(players, limit))
}

/// Sorted distinct categories of curated (bank and seed) challenges.
/// Categories only ever named by a request are left out.
pub async fn categories(state: &AppState) -> Result<Vec<String>, AppError> {
  let all: Vec<Challenge> = list_json(state.store.as_ref(), "challenges/").await?;
  Ok(all
    .into_iter()
    .filter(|c| matches!(c.source, ChallengeSource::LocalBank | ChallengeSource::Seed))
    .map(|c| c.category)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::AgentConfig;
  use crate::store::{KvStore, MemoryStore};
  use crate::testing::MockGenerator;

  async fn state(generator: Option<Arc<MockGenerator>>) -> AppState {
    let generator = generator.map(|g| g as Arc<dyn Generator>);
    AppState::from_parts(Arc::new(MemoryStore::new()), generator, None, AgentConfig::default())
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn picks_matching_stored_challenge() {
    let st = state(None).await;
    for _ in 0..10 {
      let ch = choose_challenge(&st, Level::Primary, Some("programming")).await.unwrap();
      assert_eq!(ch.id, "seed-prog-1");
    }
    let ch = choose_challenge(&st, Level::Secondary, None).await.unwrap();
    assert_eq!(ch.difficulty, Level::Secondary);
    assert_eq!(ch.source, ChallengeSource::Seed);
  }

  #[tokio::test]
  async fn generates_and_stores_when_nothing_matches() {
    let generator = MockGenerator::ok(
      "Sure! {\"question\": \"What is a prime number?\", \"options\": [\"Divisible only by 1 and itself\", \"Even\"], \"correct_answer\": \"Divisible only by 1 and itself\"}",
    );
    let st = state(Some(generator.clone())).await;
    let ch = choose_challenge(&st, Level::Degree, Some("Number Theory")).await.unwrap();

    assert_eq!(ch.source, ChallengeSource::Generated);
    assert_eq!((ch.points, ch.time_limit), (10, 30));
    assert_eq!(ch.category, "Number Theory");
    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("degree level") && prompt.contains("Number Theory"));

    let stored: Option<Challenge> = get_json(st.store.as_ref(), &challenge_key(&ch.id)).await.unwrap();
    assert!(stored.is_some());
  }

  #[tokio::test]
  async fn invalid_generation_falls_back_to_placeholder() {
    let generator = MockGenerator::ok("{\"question\": \"Q?\", \"options\": [\"a\", \"b\"], \"correct_answer\": \"c\"}");
    let st = state(Some(generator)).await;
    let ch = choose_challenge(&st, Level::Foundation, Some("Science")).await.unwrap();
    assert_eq!(ch.source, ChallengeSource::Placeholder);

    let st = state(None).await;
    let ch = choose_challenge(&st, Level::Primary, Some("Science")).await.unwrap();
    assert_eq!(ch.correct_answer, "Sunlight and water");
    let outcome = submit_answer(&st, "alice", &ch.id, "sunlight and water", 0).await.unwrap();
    assert!(outcome.is_correct);
  }

  #[tokio::test]
  async fn unseen_categories_reuse_one_placeholder() {
    let st = state(None).await;
    for _ in 0..5 {
      choose_challenge(&st, Level::Degree, Some("Junk Category")).await.unwrap();
    }
    let ch = choose_challenge(&st, Level::Degree, Some("junk category")).await.unwrap();
    assert_eq!(ch.id, "placeholder-degree-junk-category");

    let stored = st.store.list("challenges/placeholder-").await.unwrap();
    assert_eq!(stored.len(), 1);
    let cats = categories(&st).await.unwrap();
    assert_eq!(cats, vec!["Chemistry", "Mathematics", "Physics", "Programming"]);
  }

  #[test]
  fn generated_json_is_validated() {
    assert!(parse_generated_challenge("no json here", Level::Primary, "Math").is_err());
    assert!(parse_generated_challenge("{\"question\": \"Q?\", \"options\": [\"a\"], \"correct_answer\": \"a\"}", Level::Primary, "Math").is_err());
    let ch = parse_generated_challenge("{\"question\": \" Q? \", \"options\": [\" a \", \"b\"], \"correct_answer\": \"a\"}", Level::Primary, "Math").unwrap();
    assert_eq!(ch.question, "Q?");
    assert_eq!(ch.options, vec!["a".to_string(), "b".to_string()]);
  }

  #[tokio::test]
  async fn submissions_update_progress() {
    let st = state(None).await;

    let ok = submit_answer(&st, "alice", "seed-math-1", " 2X ", 10).await.unwrap();
    assert!(ok.is_correct);
    assert_eq!(ok.points_earned, 13);
    assert_eq!(ok.message, "Correct! Great job!");

    let bad = submit_answer(&st, "alice", "seed-prog-1", "function", 3).await.unwrap();
    assert!(!bad.is_correct);
    assert_eq!(bad.points_earned, 0);
    assert_eq!(bad.message, "Incorrect. The answer was: def");

    let stats = player_stats(&st, "alice").await.unwrap();
    assert_eq!(stats.total_points, 13);
    assert_eq!(stats.challenges_completed, 1);
    assert_eq!((stats.current_streak, stats.best_streak), (0, 1));

    let attempts = st.store.list("attempts/alice/").await.unwrap();
    assert_eq!(attempts.len(), 2);
  }

  #[tokio::test]
  async fn unknown_challenge_is_not_found() {
    let st = state(None).await;
    let err = submit_answer(&st, "alice", "nope", "x", 1).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == "Challenge not found"));
    assert!(matches!(submit_answer(&st, "a/b", "seed-prog-1", "def", 1).await, Err(AppError::Validation(_))));
  }

  #[tokio::test]
  async fn fresh_players_start_at_level_one() {
    let st = state(None).await;
    let stats = player_stats(&st, "newcomer").await.unwrap();
    assert_eq!((stats.level, stats.total_points, stats.next_level_points), (1, 0, 100));
  }

  #[tokio::test]
  async fn leaderboard_and_categories() {
    let st = state(None).await;
    submit_answer(&st, "alice-long-id", "seed-math-1", "2x", 0).await.unwrap();
    submit_answer(&st, "bob", "seed-prog-1", "def", 0).await.unwrap();

    let board = leaderboard(&st, 10).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, "alice-lo***");
    assert_eq!(board[0].total_points, 15);

    let cats = categories(&st).await.unwrap();
    assert_eq!(cats, vec!["Chemistry", "Mathematics", "Physics", "Programming"]);
  }
}
