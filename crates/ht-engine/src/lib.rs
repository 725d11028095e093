/// Dot-matrix and ordered-dither engine for halftone.
///
/// Turns RGBA frames into white draw commands (dots or dither cells) and
/// schedules passes from source readiness signals.
pub mod dither;
pub mod dots;
pub mod pipeline;
pub mod sampler;
pub mod style;

pub use pipeline::{FramePipeline, PassStats, PipelineState, TickOutcome};
pub use style::CellStyle;
