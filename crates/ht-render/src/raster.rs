use ht_core::draw::{DrawCommand, Surface};

/// Surface raster RGBA carrée. Fond transparent, marques blanches.
///
/// Les bords des cercles sont antialiasés sur un pixel ; les rectangles
/// fractionnaires reçoivent une couverture partielle sur leurs bords.
///
/// # Example
/// ```
/// use ht_core::draw::{DrawCommand, Surface};
/// use ht_render::raster::RasterSurface;
/// let mut s = RasterSurface::new(8);
/// s.clear();
/// s.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 4.0 });
/// assert_eq!(s.alpha(1, 1), 255);
/// assert_eq!(s.alpha(6, 6), 0);
/// ```
pub struct RasterSurface {
    size: u32,
    /// RGBA row-major, 4 bytes par pixel.
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Surface transparente `size × size`.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![0u8; size as usize * size as usize * 4],
        }
    }

    /// Pixels RGBA bruts.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Alpha du pixel (x, y), 0 hors limites.
    #[inline(always)]
    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        if x >= self.size || y >= self.size {
            return 0;
        }
        self.pixels[(y as usize * self.size as usize + x as usize) * 4 + 3]
    }

    /// Composite « source-over » d'un blanc de couverture `coverage` ∈ [0, 1].
    #[inline(always)]
    fn blend_white(&mut self, x: u32, y: u32, coverage: f32) {
        if coverage <= 0.0 {
            return;
        }
        let idx = (y as usize * self.size as usize + x as usize) * 4;
        let Some(px) = self.pixels.get_mut(idx..idx + 4) else {
            return;
        };
        let src = coverage.min(1.0);
        let dst = f32::from(px[3]) / 255.0;
        let out = src + dst * (1.0 - src);
        px[0] = 255;
        px[1] = 255;
        px[2] = 255;
        px[3] = (out * 255.0).round() as u8;
    }

    /// Plage de pixels touchée par l'intervalle [lo, hi), bornée à la surface.
    fn span(&self, lo: f32, hi: f32) -> Option<(u32, u32)> {
        let first = lo.floor().max(0.0);
        let last = hi.ceil().min(self.size as f32);
        (first < last).then_some((first as u32, last as u32))
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        if radius <= 0.0 {
            return;
        }
        let Some((x0, x1)) = self.span(cx - radius - 1.0, cx + radius + 1.0) else {
            return;
        };
        let Some((y0, y1)) = self.span(cy - radius - 1.0, cy + radius + 1.0) else {
            return;
        };
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let edge = (dx * dx + dy * dy).sqrt() - radius;
                self.blend_white(x, y, (0.5 - edge).clamp(0.0, 1.0));
            }
        }
    }

    fn fill_rect(&mut self, left: f32, top: f32, side: f32) {
        if side <= 0.0 {
            return;
        }
        let (right, bottom) = (left + side, top + side);
        let Some((x0, x1)) = self.span(left, right) else {
            return;
        };
        let Some((y0, y1)) = self.span(top, bottom) else {
            return;
        };
        for y in y0..y1 {
            let py = y as f32;
            let cover_y = ((py + 1.0).min(bottom) - py.max(top)).clamp(0.0, 1.0);
            for x in x0..x1 {
                let px = x as f32;
                let cover_x = ((px + 1.0).min(right) - px.max(left)).clamp(0.0, 1.0);
                self.blend_white(x, y, cover_x * cover_y);
            }
        }
    }
}

impl Surface for RasterSurface {
    fn resize(&mut self, size: u32) {
        if size != self.size {
            log::debug!("RasterSurface: {size}x{size}");
            self.size = size;
            self.pixels = vec![0u8; size as usize * size as usize * 4];
        }
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn draw(&mut self, command: &DrawCommand) {
        match *command {
            DrawCommand::Circle { cx, cy, radius } => self.fill_circle(cx, cy, radius),
            DrawCommand::Rect { x, y, size } => self.fill_rect(x, y, size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_makes_everything_transparent() {
        let mut s = RasterSurface::new(4);
        s.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 4.0 });
        s.clear();
        assert!(s.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn circle_is_opaque_inside_and_empty_outside() {
        let mut s = RasterSurface::new(20);
        s.draw(&DrawCommand::Circle { cx: 10.0, cy: 10.0, radius: 4.0 });
        assert_eq!(s.alpha(10, 10), 255);
        assert_eq!(s.alpha(0, 0), 0);
        assert_eq!(s.alpha(19, 10), 0);
        let edge = s.alpha(13, 9);
        assert!(edge > 0, "edge pixel should be partially covered");
    }

    #[test]
    fn marks_are_white() {
        let mut s = RasterSurface::new(6);
        s.draw(&DrawCommand::Circle { cx: 3.0, cy: 3.0, radius: 2.0 });
        let idx = (3 * 6 + 3) * 4;
        assert_eq!(&s.pixels()[idx..idx + 3], &[255, 255, 255]);
    }

    #[test]
    fn rect_is_clipped_to_bounds() {
        let mut s = RasterSurface::new(4);
        s.draw(&DrawCommand::Rect { x: 2.0, y: 2.0, size: 10.0 });
        s.draw(&DrawCommand::Rect { x: -5.0, y: -5.0, size: 2.0 });
        assert_eq!(s.alpha(3, 3), 255);
        assert_eq!(s.alpha(1, 1), 0);
    }

    #[test]
    fn fractional_rect_edge_is_partial() {
        let mut s = RasterSurface::new(4);
        s.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 1.5 });
        assert_eq!(s.alpha(0, 0), 255);
        assert_eq!(s.alpha(1, 0), 128);
        assert_eq!(s.alpha(1, 1), 64);
    }

    #[test]
    fn resize_reallocates_transparent() {
        let mut s = RasterSurface::new(2);
        s.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 2.0 });
        s.resize(3);
        assert_eq!(s.size(), 3);
        assert_eq!(s.pixels().len(), 36);
        assert_eq!(s.alpha(0, 0), 0);
    }
}
