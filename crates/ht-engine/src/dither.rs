//! Tramage ordonné (Bayer 4x4) au niveau de la cellule.

use ht_core::draw::DrawCommand;
use ht_core::frame::Cell;

/// Matrice de Bayer 4x4. Normalisée sur 16 niveaux (0-15).
pub const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Seuil de la cellule : `matrice[row % 4][col % 4] / 16 × threshold`.
///
/// # Example
/// ```
/// use ht_engine::dither::bayer_threshold;
/// assert_eq!(bayer_threshold(0, 0, 1.0), 0.0);
/// assert_eq!(bayer_threshold(0, 3, 1.0), 15.0 / 16.0);
/// ```
#[inline(always)]
#[must_use]
pub fn bayer_threshold(col: u32, row: u32, threshold: f32) -> f32 {
    let level = BAYER_4X4[(row % 4) as usize][(col % 4) as usize];
    f32::from(level) / 16.0 * threshold
}

/// Remplit toute la cellule si sa luminance dépasse strictement son seuil.
///
/// # Example
/// ```
/// use ht_core::draw::DrawCommand;
/// use ht_core::frame::Cell;
/// use ht_engine::dither::dither_command;
/// let cell = Cell { x: 4.0, y: 0.0, lum: 0.6, size: 4.0 };
/// // colonne 1, ligne 0 → niveau 8 → seuil 0.5
/// assert_eq!(dither_command(&cell, 1.0), Some(DrawCommand::Rect { x: 4.0, y: 0.0, size: 4.0 }));
/// ```
#[inline(always)]
#[must_use]
pub fn dither_command(cell: &Cell, threshold: f32) -> Option<DrawCommand> {
    let (col, row) = cell.grid_index();
    (cell.lum > bayer_threshold(col, row, threshold)).then_some(DrawCommand::Rect {
        x: cell.x,
        y: cell.y,
        size: cell.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nombre de cellules remplies sur une tuile 4x4 à luminance uniforme.
    fn filled_in_tile(lum: f32, threshold: f32) -> usize {
        let mut n = 0;
        for row in 0..4u32 {
            for col in 0..4u32 {
                let cell = Cell {
                    x: col as f32 * 3.0,
                    y: row as f32 * 3.0,
                    lum,
                    size: 3.0,
                };
                if dither_command(&cell, threshold).is_some() {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn matrix_holds_each_level_once() {
        let mut seen = [false; 16];
        for row in BAYER_4X4 {
            for level in row {
                seen[level as usize] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn black_never_fills() {
        // Le niveau 0 donne un seuil nul, et la comparaison est stricte.
        assert_eq!(filled_in_tile(0.0, 0.1), 0);
        assert_eq!(filled_in_tile(0.0, 1.5), 0);
    }

    #[test]
    fn high_threshold_keeps_some_white_cells_empty() {
        // Niveaux 0..=10 passent sous 1.0 avec threshold = 1.5.
        assert_eq!(filled_in_tile(1.0, 1.5), 11);
    }

    #[test]
    fn low_threshold_fills_dim_cells() {
        assert_eq!(filled_in_tile(0.1, 0.1), 16);
    }

    #[test]
    fn level_zero_cell_fills_for_any_light() {
        let cell = Cell { x: 8.0, y: 4.0, lum: 0.001, size: 2.0 };
        // (4, 2) mod 4 = (0, 2) → niveau 3 ; (0, 0) → niveau 0.
        assert!(dither_command(&Cell { x: 0.0, y: 0.0, ..cell }, 0.1).is_some());
        assert!(dither_command(&cell, 0.1).is_none());
    }

    #[test]
    fn mid_gray_fills_half_the_tile() {
        // Seuils k/16 pour k = 0..15 : lum = 0.5 dépasse k = 0..=7.
        assert_eq!(filled_in_tile(0.5, 1.0), 8);
    }

    #[test]
    fn pattern_repeats_every_four_cells() {
        let a = Cell { x: 2.0, y: 1.0, lum: 0.9, size: 1.0 };
        let b = Cell { x: 6.0, y: 5.0, lum: 0.9, size: 1.0 };
        assert_eq!(dither_command(&a, 1.0).is_some(), dither_command(&b, 1.0).is_some());
    }
}
