/// Configuration, types, and shared structures for halftone.
///
/// This crate contains the shared types, traits, tone math and configuration
/// logic used across the halftone workspace.
pub mod config;
pub mod draw;
pub mod error;
pub mod frame;
pub mod tone;
pub mod traits;

pub use config::{HalftoneMode, RenderConfig};
pub use draw::{DrawCommand, RecordingSurface, Surface};
pub use error::CoreError;
pub use frame::{Cell, FrameBuffer};
pub use traits::{MediaKind, Source, SourceEvent};
