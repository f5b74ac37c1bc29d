//! Small utility helpers used across modules.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::AppError;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Answer comparison form: trimmed and case-folded.
pub fn normalize_answer(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Public form of a user id: first 8 characters followed by a mask.
pub fn anonymize_user_id(user_id: &str) -> String {
  let prefix: String = user_id.chars().take(8).collect();
  format!("{prefix}***")
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize_first(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Lower-case ASCII slug for key segments: runs of anything else become one
/// `-`, capped at 64 chars. Never empty.
pub fn slugify(s: &str) -> String {
  let mut slug = String::with_capacity(s.len().min(64));
  for c in s.chars() {
    if c.is_ascii_alphanumeric() {
      slug.push(c.to_ascii_lowercase());
    } else if !slug.is_empty() && !slug.ends_with('-') {
      slug.push('-');
    }
    if slug.len() >= 64 {
      break;
    }
  }
  let slug = slug.trim_end_matches('-');
  if slug.is_empty() { "general".to_string() } else { slug.to_string() }
}

/// Ids end up inside store keys, so they must not contain path separators.
pub fn check_key_segment(field: &str, value: &str) -> Result<(), AppError> {
  let v = value.trim();
  if v.is_empty() {
    return Err(AppError::Validation(format!("{field} is required")));
  }
  if v.len() > 128 || v.contains('/') || v.contains('\\') || v.starts_with('.') {
    return Err(AppError::Validation(format!("{field} contains invalid characters")));
  }
  Ok(())
}

/// First `{...}` block of a model reply (models like to wrap JSON in prose).
pub fn extract_json_object(text: &str) -> Option<&str> {
  static RE: OnceLock<Regex> = OnceLock::new();
  let re = RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
  re.find(text).map(|m| m.as_str())
}

/// First `[...]` block of a model reply.
pub fn extract_json_array(text: &str) -> Option<&str> {
  static RE: OnceLock<Regex> = OnceLock::new();
  let re = RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"));
  re.find(text).map(|m| m.as_str())
}

/// Escape text for use inside HTML element bodies and quoted attributes.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", s.chars().take(max).collect::<String>(), s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugs_are_key_safe() {
    assert_eq!(slugify("Number Theory"), "number-theory");
    assert_eq!(slugify("  C++ / Rust!! "), "c-rust");
    assert_eq!(slugify("???"), "general");
    assert!(slugify(&"ab ".repeat(100)).len() <= 64);
  }

  #[test]
  fn anonymize_keeps_eight_chars() {
    assert_eq!(anonymize_user_id("user-1234567890"), "user-123***");
    assert_eq!(anonymize_user_id("bob"), "bob***");
    assert_eq!(anonymize_user_id("ñandú-ñandú"), "ñandú-ña***");
  }

  #[test]
  fn normalize_trims_and_folds_case() {
    assert_eq!(normalize_answer("  UseState "), "usestate");
  }

  #[test]
  fn key_segments_reject_separators() {
    assert!(check_key_segment("userId", "alice").is_ok());
    assert!(check_key_segment("userId", "../etc").is_err());
    assert!(check_key_segment("userId", "a/b").is_err());
    assert!(check_key_segment("userId", "   ").is_err());
  }

  #[test]
  fn json_blocks_are_found_inside_prose() {
    let reply = "Sure! Here it is:\n{\"question\": \"2+2?\"}\nHope that helps.";
    assert_eq!(extract_json_object(reply), Some("{\"question\": \"2+2?\"}"));
    assert_eq!(extract_json_array("cards: [1, 2] done"), Some("[1, 2]"));
    assert_eq!(extract_json_array("no array here"), None);
  }

  #[test]
  fn escape_covers_markup_and_quotes() {
    assert_eq!(escape_html(r#"<a href="x">Tom & Jerry's</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;");
  }

  #[test]
  fn template_fill() {
    assert_eq!(fill_template("Explain {topic} at {level}", &[("topic", "DNA"), ("level", "primary")]), "Explain DNA at primary");
  }
}
