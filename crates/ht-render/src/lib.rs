/// Output surfaces and terminal UI for halftone.
///
/// Provides the RGBA raster surface, the half-block terminal preview, frame
/// pacing and the status sidebar.
pub mod preview;
pub mod raster;
pub mod ticker;
pub mod ui;

pub use raster::RasterSurface;
