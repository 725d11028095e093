use ht_core::config::{HalftoneMode, RenderConfig};
use ht_core::draw::DrawCommand;
use ht_core::frame::Cell;

use crate::{dither, dots};

/// Style de cellule avec son paramètre propre.
///
/// # Example
/// ```
/// use ht_core::config::RenderConfig;
/// use ht_engine::style::CellStyle;
/// let style = CellStyle::from_config(&RenderConfig::default());
/// assert_eq!(style, CellStyle::Dots { max_radius: 2.8 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellStyle {
    /// Variable-radius dot at the cell center.
    Dots {
        /// Radius of a dot at full luminance.
        max_radius: f32,
    },
    /// Full-cell fill against a 4x4 Bayer threshold.
    Dither {
        /// Scale applied to the Bayer levels.
        threshold: f32,
    },
}

impl CellStyle {
    /// Style actif d'une configuration.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        match config.mode {
            HalftoneMode::Dots => Self::Dots {
                max_radius: config.max_dot_radius,
            },
            HalftoneMode::Dithered => Self::Dither {
                threshold: config.dither_threshold,
            },
        }
    }

    /// Commande de dessin pour une cellule, ou `None` si la cellule reste noire.
    #[inline]
    #[must_use]
    pub fn command(&self, cell: &Cell) -> Option<DrawCommand> {
        match *self {
            Self::Dots { max_radius } => dots::dot_command(cell, max_radius),
            Self::Dither { threshold } => dither::dither_command(cell, threshold),
        }
    }
}
