//! HTTP endpoint handlers. These are thin wrappers that validate the payload
//! and forward to core logic. Each handler is instrumented and logs sizes and
//! outcomes, never payload contents.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::{Explanation, Format, GenerationRequest, Level};
use crate::error::AppError;
use crate::protocol::*;
use crate::routes::extract::{ApiJson, ApiQuery};
use crate::scoring::{PlayerStats, DEFAULT_LEADERBOARD_LIMIT};
use crate::state::AppState;
use crate::{community, forum, game, logic, study};

const MAX_LIMIT: usize = 100;

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
  limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, provider: state.generator.is_some() })
}

#[instrument(level = "info")]
pub async fn http_formats() -> impl IntoResponse {
  Json(Format::ALL.iter().map(Format::as_str).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len(), level = %body.level, format = %body.format))]
pub async fn http_post_learn(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<LearnIn>,
) -> Result<Json<Explanation>, AppError> {
  body.validate()?;
  let req = GenerationRequest::new(&body.topic, &body.level, &body.format, body.context.as_deref())?;
  let explanation = logic::explain(&state, &req).await?;
  info!(target: "learn", content_len = explanation.content.len(), "HTTP learn served");
  Ok(Json(explanation))
}

#[instrument(level = "info", skip(state, body), fields(level = %body.level))]
pub async fn http_post_flashcards(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<FlashcardsIn>,
) -> Result<Json<FlashcardsOut>, AppError> {
  body.validate()?;
  let level = body.level.parse::<Level>()?;
  let flashcards = study::flashcards(&state, &body.topic, level).await?;
  Ok(Json(FlashcardsOut { success: true, flashcards }))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len(), time_spent = body.time_spent))]
pub async fn http_post_blurting(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<BlurtingIn>,
) -> Result<Json<BlurtingOut>, AppError> {
  body.validate()?;
  let level = body.level.parse::<Level>()?;
  let out = study::analyze_blurting(&state, &body.topic, level, &body.text, body.time_spent).await?;
  Ok(Json(BlurtingOut { success: true, analysis: out.analysis, word_count: out.word_count }))
}

//
// Game
//

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<ChallengeQuery>,
) -> Result<Json<ChallengeOut>, AppError> {
  q.validate()?;
  let difficulty = q.difficulty.as_deref().unwrap_or("beginner").parse::<Level>()?;
  let ch = game::choose_challenge(&state, difficulty, q.category.as_deref()).await?;
  info!(target: "game", %difficulty, id = %ch.id, source = ?ch.source, "HTTP challenge served");
  Ok(Json(to_out(&ch)))
}

#[instrument(level = "info", skip(state, body), fields(%body.challenge_id, answer_len = body.answer.len(), time_taken = body.time_taken))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<AnswerIn>,
) -> Result<Json<game::SubmitOutcome>, AppError> {
  body.validate()?;
  let outcome = game::submit_answer(&state, body.user_id.trim(), body.challenge_id.trim(), &body.answer, body.time_taken).await?;
  Ok(Json(outcome))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_stats(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<UserQuery>,
) -> Result<Json<PlayerStats>, AppError> {
  Ok(Json(game::player_stats(&state, q.user_id.trim()).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<LimitQuery>,
) -> Result<Json<LeaderboardOut>, AppError> {
  let leaderboard = game::leaderboard(&state, clamp_limit(q.limit, DEFAULT_LEADERBOARD_LIMIT)).await?;
  Ok(Json(LeaderboardOut { success: true, leaderboard }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> Result<Json<CategoriesOut>, AppError> {
  let categories = game::categories(&state).await?;
  Ok(Json(CategoriesOut { success: true, categories }))
}

//
// Community
//

#[instrument(level = "info", skip(state, body), fields(transcript_len = body.transcript.len(), level = %body.level))]
pub async fn http_post_explanation(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ExplanationIn>,
) -> Result<Json<community::Submitted>, AppError> {
  body.validate()?;
  let level = body.level.parse::<Level>()?;
  let out = community::submit_explanation(&state, body.user_id.trim(), &body.topic, level, &body.transcript).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_explanations(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<ExplanationsQuery>,
) -> Result<Json<ExplanationsOut>, AppError> {
  let topic = q.topic.as_deref().unwrap_or("all");
  let explanations = community::list_explanations(&state, topic, clamp_limit(q.limit, community::DEFAULT_LIST_LIMIT)).await?;
  Ok(Json(ExplanationsOut { success: true, explanations }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_upvote(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<UpvoteIn>,
) -> Result<Json<community::UpvoteOutcome>, AppError> {
  body.validate()?;
  Ok(Json(community::upvote(&state, body.user_id.trim(), &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_community_stats(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<UserQuery>,
) -> Result<Json<community::CommunityStats>, AppError> {
  Ok(Json(community::stats(&state, q.user_id.trim()).await?))
}

//
// Forum
//

#[instrument(level = "info", skip(state, body), fields(title_len = body.title.len(), body_len = body.body.len()))]
pub async fn http_post_thread(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ThreadIn>,
) -> Result<Json<crate::domain::ForumThread>, AppError> {
  body.validate()?;
  Ok(Json(forum::create_thread(&state, body.user_id.trim(), &body.title, &body.body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_threads(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<LimitQuery>,
) -> Result<Json<ThreadsOut>, AppError> {
  let threads = forum::list_threads(&state, clamp_limit(q.limit, forum::DEFAULT_THREAD_LIMIT)).await?;
  Ok(Json(ThreadsOut { success: true, threads }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_thread(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<forum::ThreadWithReplies>, AppError> {
  Ok(Json(forum::get_thread(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.body.len()))]
pub async fn http_post_reply(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<ReplyIn>,
) -> Result<Json<crate::domain::ForumReply>, AppError> {
  body.validate()?;
  Ok(Json(forum::reply(&state, &id, body.user_id.trim(), &body.body).await?))
}
