pub mod composite;
pub mod cutout;
pub mod transform;

pub use composite::{overlay_automatic, overlay_prompted, random_color, segment_alpha};
pub use cutout::{cutout, opaque_bounds};
