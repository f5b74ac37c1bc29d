//! Seed data and small utilities related to default content.
//!
//! Everything here is what the app serves when neither the store, the TOML
//! bank nor the provider can supply something better.

use crate::domain::{Challenge, ChallengeSource, Level};
use crate::knowledge;
use crate::util::{capitalize_first, slugify};

/// Points and time limit for generated and placeholder challenges.
pub const DEFAULT_CHALLENGE_POINTS: u32 = 10;
pub const DEFAULT_TIME_LIMIT: u32 = 30;
pub const DEFAULT_CATEGORY: &str = "General";

#[allow(clippy::too_many_arguments)]
fn seed(id: &str, title: &str, question: &str, answer: &str, options: [&str; 4], category: &str, difficulty: Level, points: u32, time_limit: u32) -> Challenge {
  Challenge {
    id: id.into(),
    title: title.into(),
    question: question.into(),
    correct_answer: answer.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    category: category.into(),
    difficulty,
    points,
    time_limit,
    source: ChallengeSource::Seed,
  }
}

/// Minimal set of built-in challenges that guarantee the game
/// is playable without external config or a provider.
pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    seed("seed-chem-1", "Balance the Equation", "Balance this chemical equation: H₂ + O₂ → ?", "H₂O", ["H₂O", "H₂O₂", "HO₂", "H₃O"], "Chemistry", Level::Primary, 10, 30),
    seed("seed-prog-1", "Python Syntax", "What keyword is used to define a function in Python?", "def", ["def", "function", "func", "define"], "Programming", Level::Primary, 10, 20),
    seed("seed-math-1", "Math Challenge", "What is the derivative of x²?", "2x", ["2x", "x²", "2", "x"], "Mathematics", Level::Secondary, 15, 25),
    seed("seed-prog-2", "React Components", "Which hook is used for state management in React?", "useState", ["useState", "useEffect", "useContext", "useReducer"], "Programming", Level::Secondary, 15, 30),
    seed("seed-phys-1", "Physics Laws", "What is Newton's second law of motion?", "F = ma", ["F = ma", "E = mc²", "v = u + at", "P = mv"], "Physics", Level::Primary, 10, 35),
  ]
}

/// Stable id of the placeholder for a difficulty/category pair, so repeated
/// requests reuse one record.
pub fn placeholder_id(difficulty: Level, category: &str) -> String {
  format!("placeholder-{}-{}", difficulty.as_str(), slugify(category))
}

/// Last resort when nothing matches and generation is unavailable. A few
/// category/level pairs have a real question; the rest get a generic one.
pub fn placeholder_challenge(difficulty: Level, category: Option<&str>) -> Challenge {
  let category = category.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CATEGORY);
  let is = |name: &str| category.eq_ignore_ascii_case(name);

  let (question, options, answer): (String, [&str; 4], &str) = match difficulty {
    Level::Primary if is("Mathematics") => ("What is 7 + 5?".into(), ["10", "11", "12", "13"], "12"),
    Level::Secondary if is("Mathematics") => ("What is the square root of 64?".into(), ["6", "7", "8", "9"], "8"),
    Level::Primary if is("Science") => (
      "What do plants need to make food?".into(),
      ["Water only", "Sunlight only", "Sunlight and water", "Soil only"],
      "Sunlight and water",
    ),
    Level::Secondary if is("Science") => ("What is the chemical symbol for water?".into(), ["H2O", "CO2", "O2", "NaCl"], "H2O"),
    _ => (
      format!("What is an important concept in {category}?"),
      ["Option A", "Option B", "Option C", "Option D"],
      "Option A",
    ),
  };

  Challenge {
    id: placeholder_id(difficulty, category),
    title: format!("{category} Challenge"),
    question,
    correct_answer: answer.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    category: category.into(),
    difficulty,
    points: DEFAULT_CHALLENGE_POINTS,
    time_limit: DEFAULT_TIME_LIMIT,
    source: ChallengeSource::Placeholder,
  }
}

const TECH_KEYWORDS: &[&str] = &["ai", "artificial intelligence", "neural", "algorithm", "data", "computer", "software", "programming"];
const SCIENCE_KEYWORDS: &[&str] = &["physics", "chemistry", "biology", "mathematics", "theory", "scientific"];
const BUSINESS_KEYWORDS: &[&str] = &["marketing", "finance", "economics", "business", "management", "strategy"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
  Tech,
  Science,
  Business,
  Generic,
}

// Short keywords must be a whole word ("ai" is not in "rain"), longer ones a
// word prefix (plurals), phrases a substring.
fn mentions(topic_lower: &str, words: &[&str], keywords: &[&str]) -> bool {
  keywords.iter().any(|k| {
    if k.contains(' ') {
      topic_lower.contains(k)
    } else if k.len() <= 3 {
      words.iter().any(|w| w == k)
    } else {
      words.iter().any(|w| w.starts_with(k))
    }
  })
}

fn family_of(topic: &str) -> Family {
  let lower = topic.to_lowercase();
  let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
  if mentions(&lower, &words, TECH_KEYWORDS) {
    Family::Tech
  } else if mentions(&lower, &words, SCIENCE_KEYWORDS) {
    Family::Science
  } else if mentions(&lower, &words, BUSINESS_KEYWORDS) {
    Family::Business
  } else {
    Family::Generic
  }
}

/// Explanation served when generation fails. Curated topics get their own
/// text; anything else is keyed on the topic's keyword family and the
/// audience level, opening with the capitalized topic.
pub fn fallback_explanation(topic: &str, level: Level) -> String {
  if let Some(curated) = knowledge::lookup(topic, level) {
    return curated.to_string();
  }
  // Three tiers: primary reads simplest, foundation and degree share the deepest.
  let tier = match level {
    Level::Primary => 0,
    Level::Secondary => 1,
    Level::Foundation | Level::Degree => 2,
  };
  let tail = match (family_of(topic), tier) {
    (Family::Tech, 0) => "is a technology concept that helps solve problems using computers and data. It involves step-by-step processes and logical thinking to create solutions.",
    (Family::Tech, 1) => "combines technical principles with practical applications, using structured approaches to process information and solve real-world problems.",
    (Family::Tech, _) => "involves complex computational algorithms, data structures, and systematic methodologies requiring deep technical understanding and implementation expertise.",
    (Family::Science, 0) => "is a scientific concept that explains how things work in nature. It helps us understand patterns and make predictions about the world around us.",
    (Family::Science, 1) => "involves scientific principles and experimental methods to understand natural phenomena and their underlying mechanisms.",
    (Family::Science, _) => "encompasses rigorous scientific methodologies, mathematical modeling, and empirical research requiring analytical reasoning and theoretical frameworks.",
    (Family::Business, 0) => "is about how organizations work and make decisions. It involves understanding people, money, and strategies to achieve goals.",
    (Family::Business, 1) => "involves business principles, market analysis, and organizational strategies to create value and achieve objectives.",
    (Family::Business, _) => "requires strategic analysis, market dynamics understanding, and complex decision-making frameworks within competitive business environments.",
    (Family::Generic, 0) => "is an important concept with practical applications. It involves understanding key principles and how they work together in real situations.",
    (Family::Generic, 1) => "involves multiple principles and concepts that work together, with practical applications and real-world implications.",
    (Family::Generic, _) => "requires comprehensive analysis, theoretical understanding, and synthesis of complex interconnected concepts and methodologies.",
  };
  format!("{} {}", capitalize_first(topic.trim()), tail)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seeds_are_well_formed() {
    for c in seed_challenges() {
      assert!(c.options.len() >= 2, "{}", c.id);
      assert!(c.options.contains(&c.correct_answer), "{}", c.id);
      assert!(c.points > 0 && c.time_limit > 0);
    }
  }

  #[test]
  fn placeholder_uses_known_question_sets() {
    let c = placeholder_challenge(Level::Secondary, Some("Mathematics"));
    assert_eq!(c.correct_answer, "8");
    assert_eq!(c.source, ChallengeSource::Placeholder);

    let lower = placeholder_challenge(Level::Secondary, Some("mathematics"));
    assert_eq!(lower.correct_answer, "8");
    assert_eq!(lower.id, c.id);
    assert_eq!(c.id, "placeholder-secondary-mathematics");

    let c = placeholder_challenge(Level::Degree, None);
    assert_eq!(c.category, "General");
    assert_eq!(c.question, "What is an important concept in General?");
    assert_eq!((c.points, c.time_limit), (10, 30));
    assert!(c.options.contains(&c.correct_answer));
  }

  #[test]
  fn fallback_families() {
    assert_eq!(family_of("Neural networks"), Family::Tech);
    assert_eq!(family_of("Data science"), Family::Tech);
    assert_eq!(family_of("Quantum physics"), Family::Science);
    assert_eq!(family_of("Rainforests"), Family::Generic);
    assert_eq!(family_of("Small business finance"), Family::Business);
  }

  #[test]
  fn curated_topics_win_over_keyword_families() {
    // "python" would otherwise land in the generic family.
    let s = fallback_explanation("Python", Level::Primary);
    assert!(s.starts_with("Python is a programming language that's easy to read"));
    let s = fallback_explanation("blockchain basics", Level::Degree);
    assert!(s.starts_with("Blockchain implements cryptographic hash functions"));
    // A curated miss still reaches the families.
    let s = fallback_explanation("neural networks", Level::Primary);
    assert!(s.starts_with("Neural networks is a technology concept"));
  }

  #[test]
  fn fallback_starts_with_capitalized_topic() {
    let s = fallback_explanation("photosynthesis", Level::Primary);
    assert!(s.starts_with("Photosynthesis is an important concept"));
    let s = fallback_explanation("marketing", Level::Degree);
    assert!(s.starts_with("Marketing requires strategic analysis"));
  }
}
