mod annotation;
mod prompt;

pub use annotation::{parse_annotations_json, read_annotations_json};
pub use prompt::{Prompt, PromptSet, decode_annotations, write_prompts_json};
