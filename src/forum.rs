//! Discussion forum: threads and replies. Bodies pass through the HTML
//! cleaner before they are stored.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{ForumReply, ForumThread};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{get_json, list_json, put_json, update_json};
use crate::util::check_key_segment;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 10_000;
pub const MAX_REPLY_CHARS: usize = 5_000;
pub const DEFAULT_THREAD_LIMIT: usize = 20;
pub const MAX_THREAD_LIMIT: usize = 100;

fn thread_key(id: &str) -> String {
  format!("forum/threads/{id}")
}

fn reply_prefix(thread_id: &str) -> String {
  format!("forum/replies/{thread_id}/")
}

#[derive(Clone, Debug, Serialize)]
pub struct ThreadWithReplies {
  pub thread: ForumThread,
  pub replies: Vec<ForumReply>,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
  let n = value.trim().chars().count();
  if n == 0 || n > max {
    return Err(AppError::Validation(format!("{field} must be between 1 and {max} characters")));
  }
  Ok(())
}

fn not_found() -> AppError {
  AppError::NotFound("Thread not found".into())
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn create_thread(state: &AppState, user_id: &str, title: &str, body: &str) -> Result<ForumThread, AppError> {
  check_key_segment("user_id", user_id)?;
  check_len("title", title, MAX_TITLE_CHARS)?;
  check_len("body", body, MAX_BODY_CHARS)?;

  let thread = ForumThread {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    title: ammonia::clean(title.trim()),
    body: ammonia::clean(body.trim()),
    reply_count: 0,
    created_at: Utc::now(),
  };
  put_json(state.store.as_ref(), &thread_key(&thread.id), &thread).await?;
  info!(target: "forum", id = %thread.id, "Thread created");
  Ok(thread)
}

/// Newest first; `limit` is clamped to 1..=100.
pub async fn list_threads(state: &AppState, limit: usize) -> Result<Vec<ForumThread>, AppError> {
  let mut threads: Vec<ForumThread> = list_json(state.store.as_ref(), "forum/threads/").await?;
  threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  threads.truncate(limit.clamp(1, MAX_THREAD_LIMIT));
  Ok(threads)
}

/// Thread plus its replies, oldest reply first.
pub async fn get_thread(state: &AppState, thread_id: &str) -> Result<ThreadWithReplies, AppError> {
  check_key_segment("thread_id", thread_id).map_err(|_| not_found())?;
  let thread: ForumThread = get_json(state.store.as_ref(), &thread_key(thread_id)).await?.ok_or_else(not_found)?;
  let mut replies: Vec<ForumReply> = list_json(state.store.as_ref(), &reply_prefix(thread_id)).await?;
  replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
  Ok(ThreadWithReplies { thread, replies })
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn reply(state: &AppState, thread_id: &str, user_id: &str, body: &str) -> Result<ForumReply, AppError> {
  check_key_segment("thread_id", thread_id).map_err(|_| not_found())?;
  check_key_segment("user_id", user_id)?;
  check_len("body", body, MAX_REPLY_CHARS)?;

  // Count first: this fails with NotFound before anything is written.
  update_json(state.store.as_ref(), &thread_key(thread_id), |current: Option<ForumThread>| {
    let mut thread = current.ok_or_else(not_found)?;
    thread.reply_count += 1;
    Ok(thread)
  })
  .await?;

  let reply = ForumReply {
    id: Uuid::new_v4().to_string(),
    thread_id: thread_id.to_string(),
    user_id: user_id.to_string(),
    body: ammonia::clean(body.trim()),
    created_at: Utc::now(),
  };
  put_json(state.store.as_ref(), &format!("{}{}", reply_prefix(thread_id), reply.id), &reply).await?;
  info!(target: "forum", thread = %thread_id, id = %reply.id, "Reply posted");
  Ok(reply)
}
