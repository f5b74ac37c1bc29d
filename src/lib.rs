//! Lumen · learning backend
//!
//! Explains topics and documents at a chosen education level through an
//! OpenAI-compatible provider, and runs the community side of the app: a quiz
//! game with a leaderboard, peer explanations, a forum and study tools.

pub mod community;
pub mod config;
pub mod domain;
pub mod error;
pub mod forum;
pub mod game;
pub mod knowledge;
pub mod logic;
pub mod markup;
pub mod openai;
pub mod prompt;
pub mod protocol;
pub mod routes;
pub mod sanitize;
pub mod scoring;
pub mod seeds;
pub mod state;
pub mod store;
pub mod study;
pub mod telemetry;
pub mod util;

#[cfg(test)]
mod testing;

pub use routes::build_router;
pub use state::AppState;
