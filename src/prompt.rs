//! Instruction assembly for explanation requests. Pure: no I/O, no provider
//! specifics.

use crate::config::Prompts;
use crate::domain::GenerationRequest;
use crate::error::AppError;
use crate::util::fill_template;

/// Topic that switches a document-grounded request to the summary template.
pub const DOCUMENT_SUMMARY_TOPIC: &str = "Document Summary";

/// Appended to every instruction.
pub const NATURAL_ENDING: &str = "Write complete sentences and end naturally.";

/// Build the provider instruction for `req`.
///
/// With document context the instruction embeds the context and never the
/// topic; without it the instruction is about the topic.
pub fn build_prompt(prompts: &Prompts, req: &GenerationRequest) -> Result<String, AppError> {
  let level = req.level();
  let format = req.format();
  let level_instruction = prompts
    .levels
    .get(level.as_str())
    .map(String::as_str)
    .ok_or_else(|| AppError::Configuration(format!("No instruction configured for level {level}")))?;
  let format_instruction = prompts
    .formats
    .get(format.as_str())
    .map(String::as_str)
    .ok_or_else(|| AppError::Configuration(format!("No instruction configured for format {format}")))?;

  let body = match req.context() {
    Some(context) => {
      let template = if req.topic() == DOCUMENT_SUMMARY_TOPIC {
        &prompts.summary_template
      } else {
        &prompts.context_template
      };
      fill_template(
        template,
        &[
          ("level_instruction", level_instruction),
          ("format_instruction", format_instruction),
          ("level", level.as_str()),
          ("context", context),
        ],
      )
    }
    None => fill_template(
      &prompts.topic_template,
      &[
        ("level_instruction", level_instruction),
        ("format_instruction", format_instruction),
        ("level", level.as_str()),
        ("topic", req.topic()),
      ],
    ),
  };

  Ok(format!("{}\n{}", body.trim_end(), NATURAL_ENDING))
}
