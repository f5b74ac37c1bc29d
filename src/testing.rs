//! Test doubles for the provider boundary.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::openai::Generator;

/// Replies with a fixed text (or a fixed failure) and records every prompt.
pub struct MockGenerator {
  reply: Result<String, String>,
  pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
  pub fn ok(text: &str) -> Arc<Self> {
    Arc::new(Self { reply: Ok(text.into()), prompts: Mutex::new(vec![]) })
  }

  pub fn failing() -> Arc<Self> {
    Arc::new(Self { reply: Err("boom".into()), prompts: Mutex::new(vec![]) })
  }

  pub fn last_prompt(&self) -> Option<String> {
    self.prompts.lock().expect("lock poisoned").last().cloned()
  }
}

#[async_trait]
impl Generator for MockGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
    self.prompts.lock().expect("lock poisoned").push(prompt.to_string());
    self.reply.clone().map_err(ProviderError::Transport)
  }
}
