//! Luminance et ajustement tonal partagés par tous les styles.

/// Pivot du contraste (gris moyen).
pub const CONTRAST_PIVOT: f32 = 0.5;

/// Luminance perceptuelle Rec.601, normalisée [0.0, 1.0].
///
/// # Example
/// ```
/// use ht_core::tone::luminance;
/// assert_eq!(luminance(0, 0, 0), 0.0);
/// assert!((luminance(255, 255, 255) - 1.0).abs() < 1e-6);
/// ```
#[inline(always)]
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    ((0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0).min(1.0)
}

/// Contraste autour de 0.5, puis décalage de luminosité, puis clamp [0, 1].
///
/// # Example
/// ```
/// use ht_core::tone::adjust;
/// assert_eq!(adjust(0.3, 1.0, 0.0), 0.3);
/// assert_eq!(adjust(0.9, 3.0, 0.5), 1.0);
/// assert_eq!(adjust(0.1, 3.0, -0.5), 0.0);
/// ```
#[inline(always)]
#[must_use]
pub fn adjust(lum: f32, contrast: f32, brightness: f32) -> f32 {
    // Forme développée de (lum - pivot) * contrast + pivot : exacte à contrast = 1.
    (lum * contrast + CONTRAST_PIVOT * (1.0 - contrast) + brightness).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_stays_in_unit_range() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let lum = luminance(r, g, b);
                    assert!((0.0..=1.0).contains(&lum), "lum({r},{g},{b}) = {lum}");
                }
            }
        }
        assert!(luminance(255, 255, 255) <= 1.0);
    }

    #[test]
    fn neutral_adjustment_is_identity() {
        for i in 0..=100 {
            let lum = i as f32 / 100.0;
            assert_eq!(adjust(lum, 1.0, 0.0), lum);
        }
    }

    #[test]
    fn adjustment_always_clamps() {
        let contrasts = [0.1, 0.5, 1.0, 2.0, 3.0];
        let brightnesses = [-0.5, -0.25, 0.0, 0.25, 0.5];
        for i in 0..=20 {
            let lum = i as f32 / 20.0;
            for &c in &contrasts {
                for &b in &brightnesses {
                    let out = adjust(lum, c, b);
                    assert!((0.0..=1.0).contains(&out), "adjust({lum},{c},{b}) = {out}");
                }
            }
        }
    }

    #[test]
    fn contrast_pivots_on_mid_gray() {
        assert!((adjust(0.5, 3.0, 0.0) - 0.5).abs() < 1e-6);
        assert!((adjust(0.5, 0.1, 0.0) - 0.5).abs() < 1e-6);
        assert!((adjust(0.5, 1.0, 0.2) - 0.7).abs() < 1e-6);
    }
}
