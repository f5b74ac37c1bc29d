//! Pure game arithmetic: grading, time-decayed points, progress updates and
//! leaderboard ranking. Persistence lives in `game`.

use serde::Serialize;

use crate::domain::PlayerProgress;
use crate::util::{anonymize_user_id, normalize_answer};

/// Points needed per player level.
pub const POINTS_PER_LEVEL: u32 = 100;
/// Seconds per point of decay.
pub const DECAY_SECONDS: u32 = 5;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

pub fn grade(answer: &str, correct_answer: &str) -> bool {
  normalize_answer(answer) == normalize_answer(correct_answer)
}

/// One point is lost per full 5 s taken, never below half of `max_points`.
pub fn points_earned(max_points: u32, time_taken: u32) -> u32 {
  let decayed = max_points.saturating_sub(time_taken / DECAY_SECONDS);
  decayed.max(max_points / 2).min(max_points)
}

pub fn level_for_points(total_points: u32) -> u32 {
  total_points / POINTS_PER_LEVEL + 1
}

/// Fold one graded attempt into `progress`.
pub fn apply_attempt(progress: &mut PlayerProgress, is_correct: bool, points: u32) {
  if is_correct {
    progress.total_points = progress.total_points.saturating_add(points);
    progress.challenges_completed += 1;
    progress.current_streak += 1;
    progress.best_streak = progress.best_streak.max(progress.current_streak);
    progress.level = level_for_points(progress.total_points);
  } else {
    progress.current_streak = 0;
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
  pub rank: usize,
  pub user_id: String,
  pub total_points: u32,
  pub challenges_completed: u32,
  pub best_streak: u32,
  pub level: u32,
}

/// Rank by points, then best streak; ids are anonymized.
pub fn rank_leaderboard(mut players: Vec<PlayerProgress>, limit: usize) -> Vec<LeaderboardEntry> {
  players.sort_by(|a, b| {
    b.total_points
      .cmp(&a.total_points)
      .then_with(|| b.best_streak.cmp(&a.best_streak))
  });
  players
    .into_iter()
    .take(limit)
    .enumerate()
    .map(|(i, p)| LeaderboardEntry {
      rank: i + 1,
      user_id: anonymize_user_id(&p.user_id),
      total_points: p.total_points,
      challenges_completed: p.challenges_completed,
      best_streak: p.best_streak,
      level: p.level,
    })
    .collect()
}

/// Stats view of a player, with the distance to the next level.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PlayerStats {
  pub total_points: u32,
  pub challenges_completed: u32,
  pub current_streak: u32,
  pub best_streak: u32,
  pub level: u32,
  pub next_level_points: u32,
  pub progress_to_next_level: u32,
}

impl From<&PlayerProgress> for PlayerStats {
  fn from(p: &PlayerProgress) -> Self {
    Self {
      total_points: p.total_points,
      challenges_completed: p.challenges_completed,
      current_streak: p.current_streak,
      best_streak: p.best_streak,
      level: p.level,
      next_level_points: p.level * POINTS_PER_LEVEL,
      progress_to_next_level: (p.total_points % POINTS_PER_LEVEL).min(100),
    }
  }
}
