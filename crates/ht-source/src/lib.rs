/// Visual source modules for halftone (static image, looping video).
///
/// Every source decodes off the render thread and reports through a
/// non-blocking channel of `SourceEvent`s.
pub mod image;
pub mod media;
pub mod resize;
pub mod video;

pub use media::{classify, open_source};
pub use resize::{CoverFit, Resizer};
