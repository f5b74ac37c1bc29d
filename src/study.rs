//! Study tools: flashcard decks and blurting (active recall) feedback.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::{Flashcard, Level};
use crate::error::{AppError, ProviderError};
use crate::markup::format_markup;
use crate::state::AppState;
use crate::util::{escape_html, extract_json_array, fill_template, trunc_for_log};

pub const DECK_SIZE: usize = 5;

fn template_deck(topic: &str) -> Vec<Flashcard> {
  let card = |q: String, a: String| Flashcard { question: q, answer: a };
  vec![
    card(format!("What is {topic}?"), format!("{topic} is an important concept in its field of study.")),
    card(format!("Why is {topic} important?"), format!("{topic} has practical applications and real-world significance.")),
    card(format!("How does {topic} work?"), format!("{topic} involves specific processes and mechanisms.")),
    card(format!("Where is {topic} used?"), format!("{topic} is applied in various contexts and situations.")),
    card(format!("What are key features of {topic}?"), format!("{topic} has distinctive characteristics and properties.")),
  ]
}

/// Parse the first JSON array of a reply into a non-empty deck.
pub fn parse_deck(reply: &str) -> Result<Vec<Flashcard>, ProviderError> {
  let json = extract_json_array(reply).ok_or_else(|| ProviderError::Decode(format!("no JSON array in {}", trunc_for_log(reply, 80))))?;
  let cards: Vec<Flashcard> = serde_json::from_str(json).map_err(|e| ProviderError::Decode(e.to_string()))?;
  if cards.is_empty() || cards.iter().any(|c| c.question.trim().is_empty() || c.answer.trim().is_empty()) {
    return Err(ProviderError::Decode("flashcards failed validation".into()));
  }
  Ok(cards)
}

#[instrument(level = "info", skip(state))]
pub async fn flashcards(state: &AppState, topic: &str, level: Level) -> Result<Vec<Flashcard>, AppError> {
  let topic = topic.trim();
  if topic.is_empty() {
    return Err(AppError::Validation("Topic is required".into()));
  }

  let generated = match &state.generator {
    Some(generator) => {
      let prompt = fill_template(&state.prompts.flashcards_template, &[("topic", topic), ("level", level.as_str())]);
      generator.generate_brief(&prompt).await.and_then(|reply| parse_deck(&reply))
    }
    None => Err(ProviderError::Unsupported("flashcard generation")),
  };

  match generated {
    Ok(cards) => {
      info!(target: "learn", cards = cards.len(), "Flashcards generated");
      Ok(cards)
    }
    Err(e) => {
      warn!(target: "learn", error = %e, "Flashcard generation failed; using template deck");
      Ok(template_deck(topic))
    }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct BlurtingAnalysis {
  pub analysis: String,
  pub word_count: usize,
}

fn fallback_analysis(topic: &str, level: Level, word_count: usize) -> String {
  let topic = escape_html(topic);
  format!(
    "<h5>What You Did Well:</h5>\n<p>You wrote {word_count} words about {topic}, showing you have some knowledge of the topic.</p>\n\
     <h5>Areas to Explore Further:</h5>\n<p>Consider researching more specific details and examples related to {topic} at the {level} level.</p>\n\
     <h5>Study Suggestions:</h5>\n<ul>\n<li>Review key definitions and concepts</li>\n<li>Look for real-world applications</li>\n\
     <li>Practice explaining {topic} to someone else</li>\n<li>Try this blurting exercise again in a few days</li>\n</ul>\n\
     <h5>Next Steps:</h5>\n<p>Great job using active recall! This technique helps identify knowledge gaps effectively.</p>"
  )
}

/// Feedback on a free-recall dump of everything the learner remembers.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn analyze_blurting(
  state: &AppState,
  topic: &str,
  level: Level,
  text: &str,
  time_spent: u32,
) -> Result<BlurtingAnalysis, AppError> {
  let topic = topic.trim();
  if topic.is_empty() {
    return Err(AppError::Validation("Topic is required".into()));
  }
  if text.trim().is_empty() {
    return Err(AppError::Validation("Text is required".into()));
  }
  let word_count = text.split_whitespace().count();

  let reply = match &state.generator {
    Some(generator) => {
      let time_spent = time_spent.to_string();
      let prompt = fill_template(
        &state.prompts.blurting_template,
        &[("topic", topic), ("level", level.as_str()), ("time_spent", time_spent.as_str()), ("text", text.trim())],
      );
      generator.generate(&prompt).await
    }
    None => Err(ProviderError::Unsupported("blurting analysis")),
  };

  let analysis = match reply {
    Ok(feedback) => ammonia::clean(&format_markup(&feedback)),
    Err(e) => {
      warn!(target: "learn", error = %e, "Blurting analysis failed; using fallback");
      fallback_analysis(topic, level, word_count)
    }
  };
  info!(target: "learn", word_count, analysis_len = analysis.len(), "Blurting analyzed");
  Ok(BlurtingAnalysis { analysis, word_count })
}
