//! Sentence-boundary repair for raw model output.
//!
//! Providers cut answers mid-sentence and like to append "In summary," style
//! wrap-ups. We drop everything from the first boilerplate marker, split on
//! `.`, keep only fragments long enough to be sentences, and keep the trailing
//! fragment only when it looks finished. The heuristic is deliberately the
//! plain `.` split (abbreviations and decimals break it); keep it that way,
//! clients depend on the exact output.

/// Case-sensitive wrap-up phrases; text from the first hit onward is dropped.
pub const BOILERPLATE_MARKERS: [&str; 6] = [
  "In summary,",
  "To summarize,",
  "In conclusion,",
  "Overall,",
  "Key takeaways:",
  "Actionable Information:",
];

/// Fragment threshold used by the explanation pipeline.
pub const MIN_FRAGMENT_CHARS: usize = 10;
/// A trailing fragment longer than this is taken as a finished sentence.
const COMPLETE_TAIL_CHARS: usize = 30;

/// Text before the earliest boilerplate marker (all of it when none occurs).
pub fn strip_boilerplate(text: &str) -> &str {
  match BOILERPLATE_MARKERS.iter().filter_map(|m| text.find(m)).min() {
    Some(cut) => &text[..cut],
    None => text,
  }
}

/// Reduce `raw` to whole sentences. Fragments must be longer than
/// `min_chars` (counted in chars) to survive.
///
/// Fails open: when nothing survives, the boilerplate-stripped text is
/// returned as is, or `raw` itself if stripping left only whitespace.
pub fn sanitize(raw: &str, min_chars: usize) -> String {
  let body = strip_boilerplate(raw);
  let segments: Vec<&str> = body.split('.').collect();
  let last = segments.len() - 1;

  let mut kept: Vec<&str> = Vec::with_capacity(segments.len());
  for (i, segment) in segments.iter().enumerate() {
    let sentence = segment.trim();
    let len = sentence.chars().count();
    if len <= min_chars {
      continue;
    }
    if i < last || looks_complete(sentence, len) {
      kept.push(sentence);
    }
  }

  let mut out = kept.join(". ");
  if out.is_empty() {
    return if body.trim().is_empty() { raw.to_string() } else { body.to_string() };
  }
  if !out.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
    out.push('.');
  }
  out
}

fn looks_complete(sentence: &str, len: usize) -> bool {
  sentence.ends_with(|c: char| matches!(c, '!' | '?' | ')' | ']' | '}')) || len > COMPLETE_TAIL_CHARS
}
