#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lumen_backend::config::AgentConfig;
use lumen_backend::error::ProviderError;
use lumen_backend::openai::Generator;
use lumen_backend::store::MemoryStore;
use lumen_backend::AppState;

/// Answers every prompt with the same text.
pub struct CannedGenerator {
    pub reply: String,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        *self.calls.lock().expect("lock poisoned") += 1;
        Ok(self.reply.clone())
    }
}

pub fn canned(reply: &str) -> Arc<dyn Generator> {
    Arc::new(CannedGenerator { reply: reply.into(), calls: Mutex::new(0) })
}

pub async fn test_state(generator: Option<Arc<dyn Generator>>) -> Arc<AppState> {
    let state = AppState::from_parts(Arc::new(MemoryStore::new()), generator, None, AgentConfig::default())
        .await
        .expect("state should build");
    Arc::new(state)
}
