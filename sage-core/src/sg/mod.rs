mod pipeline;
mod port;
mod slots;

pub use pipeline::{PromptedOutput, segment_everything, segment_from_prompts};
pub use port::{ReleaseGuard, SegmentationPort};
pub use slots::{AutomaticSlots, PromptedSlots};
