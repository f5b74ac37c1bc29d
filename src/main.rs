//! Lumen · learning backend
//!
//! - Axum HTTP API under /api/v1
//! - Optional OpenAI integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   STORE_DIR           : directory for JSON records (memory only when unset)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini"
//!   OPENAI_STRONG_MODEL : default "gpt-4o"
//!   OPENAI_TIMEOUT_SECS : provider timeout (default 30)
//!   AGENT_CONFIG_PATH   : path to TOML config (prompts + generation + challenge bank)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use lumen_backend::config::Settings;
use lumen_backend::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // A missing .env is fine; real env vars win either way.
  dotenvy::dotenv().ok();
  telemetry::init_tracing();

  let settings = Settings::from_env();

  // Shared application state (store, provider clients, prompts, seeded challenges).
  let state = Arc::new(AppState::from_env(&settings).await?);

  // HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "lumen_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
