//! Application state: the record store, prompts, generation parameters and
//! the optional provider clients.
//!
//! This module owns:
//!   - the key-value store (directory-backed when STORE_DIR is set)
//!   - the prompts struct (from TOML or defaults)
//!   - optional generation and media providers
//!   - startup seeding of the challenge bank (TOML bank first, then built-in seeds)

use std::{collections::HashMap, sync::Arc};

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_agent_config_from_env, AgentConfig, ChallengeCfg, GenerationParams, Prompts, Settings};
use crate::domain::{Challenge, ChallengeSource, Level};
use crate::error::AppError;
use crate::openai::{Generator, MediaGenerator, OpenAI};
use crate::seeds::{seed_challenges, DEFAULT_CHALLENGE_POINTS, DEFAULT_TIME_LIMIT};
use crate::store::{insert_new_json, list_json, DirStore, KvStore, MemoryStore};

/// Store key of a challenge.
pub fn challenge_key(id: &str) -> String {
    format!("challenges/{id}")
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub generator: Option<Arc<dyn Generator>>,
    pub media: Option<Arc<dyn MediaGenerator>>,
    pub prompts: Prompts,
    pub generation: GenerationParams,
}

impl AppState {
    /// Build state from env: load config, pick the store, init OpenAI, seed challenges.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env(settings: &Settings) -> Result<Self, AppError> {
        // Load TOML config if provided (prompts + generation knobs + optional local bank).
        let cfg = load_agent_config_from_env().unwrap_or_default();

        let store: Arc<dyn KvStore> = match &settings.store_dir {
            Some(dir) => {
                info!(target: "lumen_backend", dir = %dir.display(), "Using directory store");
                Arc::new(DirStore::new(dir.clone()))
            }
            None => {
                warn!(target: "lumen_backend", "STORE_DIR not set; records live in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        // Build optional OpenAI client (if API key present).
        let openai = OpenAI::from_env(settings.openai_timeout, &cfg.generation).map(Arc::new);
        if let Some(oa) = &openai {
            info!(target: "lumen_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, image_model = %oa.image_model, "OpenAI enabled.");
        } else {
            info!(target: "lumen_backend", "OpenAI disabled (no OPENAI_API_KEY). Using local fallbacks.");
        }
        let generator = openai.clone().map(|oa| oa as Arc<dyn Generator>);
        let media = openai.map(|oa| oa as Arc<dyn MediaGenerator>);

        Self::from_parts(store, generator, media, cfg).await
    }

    /// Assemble state from explicit parts and seed the challenge bank.
    pub async fn from_parts(
        store: Arc<dyn KvStore>,
        generator: Option<Arc<dyn Generator>>,
        media: Option<Arc<dyn MediaGenerator>>,
        cfg: AgentConfig,
    ) -> Result<Self, AppError> {
        let state = Self { store, generator, media, prompts: cfg.prompts, generation: cfg.generation };
        state.seed_challenges(&cfg.challenges).await?;
        Ok(state)
    }

    /// Insert config-bank challenges, then built-in seeds. Existing ids are
    /// never overwritten, so restarts over a directory store are idempotent.
    #[instrument(level = "info", skip_all, fields(bank = bank.len()))]
    async fn seed_challenges(&self, bank: &[ChallengeCfg]) -> Result<(), AppError> {
        for cc in bank {
            match challenge_from_cfg(cc) {
                Ok(ch) => {
                    insert_new_json(self.store.as_ref(), &challenge_key(&ch.id), &ch).await?;
                }
                Err(e) => {
                    error!(target: "game", question = %cc.question, error = %e, "Skipping bank item");
                }
            }
        }

        for ch in seed_challenges() {
            insert_new_json(self.store.as_ref(), &challenge_key(&ch.id), &ch).await?;
        }

        // Inventory summary by difficulty/source.
        let all: Vec<Challenge> = list_json(self.store.as_ref(), "challenges/").await?;
        let mut count_by_diff: HashMap<Level, (usize, usize, usize, usize)> = HashMap::new();
        for ch in &all {
            let entry = count_by_diff.entry(ch.difficulty).or_insert((0, 0, 0, 0));
            match ch.source {
                ChallengeSource::LocalBank => entry.0 += 1,
                ChallengeSource::Seed => entry.1 += 1,
                ChallengeSource::Generated => entry.2 += 1,
                ChallengeSource::Placeholder => entry.3 += 1,
            }
        }
        for (diff, (bank, seed, gen, placeholder)) in count_by_diff {
            info!(target: "game", %diff, local_bank = bank, seed, generated = gen, placeholder, "Startup challenge inventory");
        }
        Ok(())
    }
}

/// Validate a `[[challenges]]` entry and turn it into a stored challenge.
pub fn challenge_from_cfg(cc: &ChallengeCfg) -> Result<Challenge, AppError> {
    let difficulty = cc.difficulty.parse::<Level>()?;
    if cc.question.trim().is_empty() {
        return Err(AppError::Validation("question is empty".into()));
    }
    if cc.options.len() < 2 {
        return Err(AppError::Validation("at least two options are required".into()));
    }
    if !cc.options.contains(&cc.correct_answer) {
        return Err(AppError::Validation("correct_answer must be one of the options".into()));
    }
    let points = cc.points.unwrap_or(DEFAULT_CHALLENGE_POINTS);
    let time_limit = cc.time_limit.unwrap_or(DEFAULT_TIME_LIMIT);
    if points == 0 || time_limit == 0 {
        return Err(AppError::Validation("points and time_limit must be positive".into()));
    }
    let category = cc.category.trim().to_string();

    Ok(Challenge {
        id: cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: cc.title.clone().unwrap_or_else(|| format!("{category} Challenge")),
        question: cc.question.clone(),
        correct_answer: cc.correct_answer.clone(),
        options: cc.options.clone(),
        category,
        difficulty,
        points,
        time_limit,
        source: ChallengeSource::LocalBank,
    })
}
