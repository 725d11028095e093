//! Échantillonnage de la grille de cellules sur le working buffer.

use ht_core::config::RenderConfig;
use ht_core::frame::{Cell, FrameBuffer};
use ht_core::tone;

/// Parcourt la grille ligne par ligne et appelle `visit` pour chaque cellule.
///
/// Les coins avancent de `scaled_cell_size` depuis 0 tant qu'ils restent
/// strictement sous `extent`. La luminance est celle du pixel
/// `(floor(x), floor(y))`, ajustée par contraste puis luminosité.
/// Retourne le nombre de cellules visitées.
///
/// # Example
/// ```
/// use ht_core::config::RenderConfig;
/// use ht_core::frame::FrameBuffer;
/// use ht_engine::sampler::for_each_cell;
/// let frame = FrameBuffer::filled(10, 10, [255, 255, 255, 255]);
/// let config = RenderConfig { cell_size: 4.0, ..Default::default() };
/// let mut lums = Vec::new();
/// let n = for_each_cell(&frame, 10, &config, |cell| lums.push(cell.lum));
/// assert_eq!(n, 9);
/// assert!(lums.iter().all(|l| (*l - 1.0).abs() < 1e-6));
/// ```
pub fn for_each_cell<F>(frame: &FrameBuffer, extent: u32, config: &RenderConfig, mut visit: F) -> usize
where
    F: FnMut(Cell),
{
    let step = config.scaled_cell_size();
    let limit = extent as f32;
    let mut visited = 0;

    let mut row = 0u32;
    loop {
        let y = row as f32 * step;
        if y >= limit {
            break;
        }
        let mut col = 0u32;
        loop {
            let x = col as f32 * step;
            if x >= limit {
                break;
            }
            let raw = frame.luminance(x.floor() as u32, y.floor() as u32);
            visit(Cell {
                x,
                y,
                lum: tone::adjust(raw, config.contrast, config.brightness),
                size: step,
            });
            visited += 1;
            col += 1;
        }
        row += 1;
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_partial_last_cell() {
        let frame = FrameBuffer::new(10, 10);
        let config = RenderConfig {
            cell_size: 3.0,
            ..Default::default()
        };
        let mut corners = Vec::new();
        for_each_cell(&frame, 10, &config, |c| corners.push((c.x, c.y)));
        // 0, 3, 6, 9 sur chaque axe.
        assert_eq!(corners.len(), 16);
        assert_eq!(corners.last(), Some(&(9.0, 9.0)));
    }

    #[test]
    fn samples_top_left_pixel_of_each_cell() {
        let mut frame = FrameBuffer::filled(4, 4, [0, 0, 0, 255]);
        // Seul le pixel (2, 0) est blanc : coin de la 2e cellule.
        frame.data[8..12].copy_from_slice(&[255, 255, 255, 255]);
        let config = RenderConfig {
            cell_size: 2.0,
            ..Default::default()
        };
        let mut lums = Vec::new();
        for_each_cell(&frame, 4, &config, |c| lums.push(c.lum));
        assert_eq!(lums.len(), 4);
        assert!((lums[1] - 1.0).abs() < 1e-6);
        assert!(lums[0].abs() < 1e-6 && lums[2].abs() < 1e-6 && lums[3].abs() < 1e-6);
    }

    #[test]
    fn tone_adjustment_is_applied() {
        let frame = FrameBuffer::filled(4, 4, [128, 128, 128, 255]);
        let config = RenderConfig {
            cell_size: 4.0,
            brightness: 0.5,
            ..Default::default()
        };
        let mut lum = 0.0;
        for_each_cell(&frame, 4, &config, |c| lum = c.lum);
        assert_eq!(lum, 1.0);
    }

    #[test]
    fn device_pixel_ratio_scales_the_step() {
        let frame = FrameBuffer::new(20, 20);
        let config = RenderConfig {
            cell_size: 5.0,
            device_pixel_ratio: 2.0,
            ..Default::default()
        };
        let mut sizes = Vec::new();
        let n = for_each_cell(&frame, 20, &config, |c| sizes.push(c.size));
        assert_eq!(n, 4);
        assert!(sizes.iter().all(|s| (*s - 10.0).abs() < f32::EPSILON));
    }
}
