//! Trame à points variables : rayon proportionnel à la luminance.

use ht_core::draw::DrawCommand;
use ht_core::frame::Cell;

/// Rayon en dessous duquel aucun point n'est dessiné (comparaison stricte).
pub const MIN_VISIBLE_RADIUS: f32 = 0.2;

/// Cercle centré dans la cellule, de rayon `lum × max_radius`.
///
/// Clair = gros point. Rien n'est émis tant que le rayon n'excède pas
/// strictement [`MIN_VISIBLE_RADIUS`].
///
/// # Example
/// ```
/// use ht_core::draw::DrawCommand;
/// use ht_core::frame::Cell;
/// use ht_engine::dots::dot_command;
/// let cell = Cell { x: 0.0, y: 0.0, lum: 0.5, size: 10.0 };
/// assert_eq!(
///     dot_command(&cell, 3.0),
///     Some(DrawCommand::Circle { cx: 5.0, cy: 5.0, radius: 1.5 })
/// );
/// ```
#[inline(always)]
#[must_use]
pub fn dot_command(cell: &Cell, max_radius: f32) -> Option<DrawCommand> {
    let radius = cell.lum * max_radius;
    if radius > MIN_VISIBLE_RADIUS {
        let (cx, cy) = cell.center();
        Some(DrawCommand::Circle { cx, cy, radius })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(lum: f32) -> Cell {
        Cell {
            x: 8.0,
            y: 4.0,
            lum,
            size: 4.0,
        }
    }

    #[test]
    fn radius_at_threshold_is_not_drawn() {
        assert_eq!(dot_command(&cell(0.2), 1.0), None);
        assert_eq!(dot_command(&cell(0.1), 2.0), None);
    }

    #[test]
    fn radius_just_above_threshold_is_drawn() {
        let cmd = dot_command(&cell(0.21), 1.0);
        assert!(matches!(cmd, Some(DrawCommand::Circle { radius, .. }) if radius > 0.2));
    }

    #[test]
    fn black_never_draws() {
        assert_eq!(dot_command(&cell(0.0), 10.0), None);
    }

    #[test]
    fn white_draws_max_radius_at_center() {
        assert_eq!(
            dot_command(&cell(1.0), 2.8),
            Some(DrawCommand::Circle {
                cx: 10.0,
                cy: 6.0,
                radius: 2.8
            })
        );
    }
}
