//! Markdown-subset to HTML rewrite for cleaned model output.
//!
//! Passes run in a fixed order: bold, emphasis, headings, stray `#`, stray
//! `*`, then bullet lists. Inline passes never cross a line break.

use std::sync::OnceLock;

use regex::Regex;

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
  cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

fn bold_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  re(&RE, r"\*\*([^*\n]+?)\*\*")
}

// The opening star must touch a word, so a `* ` bullet is never eaten.
fn em_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  re(&RE, r"\*([^\s*][^*\n]*?)\*")
}

fn heading_res() -> &'static [(Regex, &'static str); 4] {
  static RES: OnceLock<[(Regex, &'static str); 4]> = OnceLock::new();
  RES.get_or_init(|| {
    [
      (Regex::new(r"(?m)^#### (.*?)$").expect("static regex"), "<h4>$1</h4>"),
      (Regex::new(r"(?m)^### (.*?)$").expect("static regex"), "<h3>$1</h3>"),
      (Regex::new(r"(?m)^## (.*?)$").expect("static regex"), "<h2>$1</h2>"),
      (Regex::new(r"(?m)^# (.*?)$").expect("static regex"), "<h1>$1</h1>"),
    ]
  })
}

fn stray_hash_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  re(&RE, r"(?m)^#{1,6}[ \t]*")
}

fn stray_star_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  re(&RE, r"\*{1,2}")
}

/// Rewrite `text` into HTML. Any `<ul>` opened here is closed before return.
pub fn format_markup(text: &str) -> String {
  let text = bold_re().replace_all(text, "<strong>$1</strong>");
  let text = em_re().replace_all(&text, "<em>$1</em>");

  let mut text = text.into_owned();
  for (pattern, rep) in heading_res() {
    text = pattern.replace_all(&text, *rep).into_owned();
  }
  let text = stray_hash_re().replace_all(&text, "");

  let stripped: Vec<String> = text.split('\n').map(strip_stray_stars).collect();
  wrap_lists(&stripped)
}

fn strip_stray_stars(line: &str) -> String {
  match line.strip_prefix("* ") {
    Some(rest) => format!("* {}", stray_star_re().replace_all(rest, "")),
    None => stray_star_re().replace_all(line, "").into_owned(),
  }
}

fn bullet_body(line: &str) -> Option<&str> {
  ["• ", "- ", "* "].iter().find_map(|marker| line.strip_prefix(marker))
}

fn wrap_lists(lines: &[String]) -> String {
  let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);
  let mut in_list = false;

  for line in lines {
    match bullet_body(line) {
      Some(body) => {
        if !in_list {
          out.push("<ul>".into());
          in_list = true;
        }
        out.push(format!("<li>{body}</li>"));
      }
      None => {
        if in_list {
          out.push("</ul>".into());
          in_list = false;
        }
        out.push(line.clone());
      }
    }
  }
  if in_list {
    out.push("</ul>".into());
  }
  out.join("\n")
}
