use ht_core::draw::Surface;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use rayon::prelude::*;

use crate::raster::RasterSurface;

/// Demi-bloc supérieur : fg = pixel du haut, bg = pixel du bas.
const UPPER_HALF: char = '▀';

/// Aperçu terminal d'une `RasterSurface` en demi-blocs.
///
/// Chaque cellule terminal porte deux pixels d'aperçu ; chaque pixel
/// d'aperçu moyenne l'alpha de la zone raster qu'il recouvre. Le buffer
/// d'intensités est réutilisé d'une frame à l'autre.
///
/// # Example
/// ```
/// use ht_render::preview::Preview;
/// use ratatui::layout::Rect;
/// let p = Preview::new();
/// assert_eq!(Preview::fit(Rect::new(0, 0, 80, 24)), Rect::new(16, 0, 48, 24));
/// ```
#[derive(Default)]
pub struct Preview {
    intensity: Vec<u8>,
}

impl Preview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plus grand carré (en pixels d'aperçu) centré dans `area`.
    ///
    /// Une cellule = 1 pixel de large, 2 pixels de haut.
    #[must_use]
    pub fn fit(area: Rect) -> Rect {
        let side_px = area.width.min(area.height.saturating_mul(2));
        let rows = side_px.div_ceil(2);
        Rect::new(
            area.x + (area.width - side_px) / 2,
            area.y + (area.height - rows) / 2,
            side_px,
            rows,
        )
    }

    /// Dessine `raster` dans `area` (letterbox carré).
    pub fn render(&mut self, raster: &RasterSurface, buf: &mut Buffer, area: Rect) {
        let target = Self::fit(area);
        let side_px = u32::from(target.width);
        if side_px == 0 || raster.size() == 0 {
            return;
        }
        let rows_px = u32::from(target.height) * 2;

        self.intensity.clear();
        self.intensity.resize(side_px as usize * rows_px as usize, 0);
        let scale = raster.size() as f32 / side_px as f32;

        self.intensity
            .par_chunks_exact_mut(side_px as usize)
            .enumerate()
            .for_each(|(py, row)| {
                let (y0, y1) = source_span(py as u32, scale, raster.size());
                for (px, out) in row.iter_mut().enumerate() {
                    let (x0, x1) = source_span(px as u32, scale, raster.size());
                    *out = box_alpha(raster, x0, x1, y0, y1);
                }
            });

        for row in 0..target.height {
            for col in 0..target.width {
                let top = self.intensity[(row as usize * 2) * side_px as usize + col as usize];
                let bottom = self.intensity[(row as usize * 2 + 1) * side_px as usize + col as usize];
                if let Some(cell) = buf.cell_mut((target.x + col, target.y + row)) {
                    cell.set_char(UPPER_HALF)
                        .set_fg(Color::Rgb(top, top, top))
                        .set_bg(Color::Rgb(bottom, bottom, bottom));
                }
            }
        }
    }
}

/// Plage raster `[start, end)` couverte par le pixel d'aperçu `p`.
#[inline]
fn source_span(p: u32, scale: f32, limit: u32) -> (u32, u32) {
    let start = ((p as f32 * scale) as u32).min(limit.saturating_sub(1));
    let end = (((p + 1) as f32 * scale).ceil() as u32).clamp(start + 1, limit);
    (start, end)
}

/// Moyenne d'alpha sur un rectangle raster (blanc sur noir → niveau de gris).
#[inline]
fn box_alpha(raster: &RasterSurface, x0: u32, x1: u32, y0: u32, y1: u32) -> u8 {
    let mut sum = 0u32;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += u32::from(raster.alpha(x, y));
        }
    }
    let count = (x1 - x0) * (y1 - y0);
    (sum / count.max(1)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ht_core::draw::DrawCommand;

    #[test]
    fn fit_letterboxes_a_tall_area() {
        let fit = Preview::fit(Rect::new(0, 0, 10, 40));
        assert_eq!(fit, Rect::new(0, 17, 10, 5));
    }

    #[test]
    fn white_raster_renders_white_blocks() {
        let mut raster = RasterSurface::new(20);
        raster.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 20.0 });
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        Preview::new().render(&raster, &mut buf, area);
        let cell = &buf[(4, 2)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(cell.bg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn top_half_only_lights_fg() {
        let mut raster = RasterSurface::new(4);
        // Lignes 0-1 blanches, 2-3 transparentes ; aperçu 4x4 → 2 rangées.
        raster.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 2.0 });
        raster.draw(&DrawCommand::Rect { x: 2.0, y: 0.0, size: 2.0 });
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        Preview::new().render(&raster, &mut buf, area);
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(255, 255, 255));
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(255, 255, 255));
        assert_eq!(buf[(0, 1)].fg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn empty_area_is_a_no_op() {
        let raster = RasterSurface::new(4);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
        Preview::new().render(&raster, &mut buf, area);
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }
}
