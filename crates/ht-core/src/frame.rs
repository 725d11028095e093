use crate::tone;

/// Buffer de pixels réutilisable. Pré-alloué, jamais redimensionné en hot path.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use ht_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué (transparent) aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use ht_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Crée un buffer rempli d'une couleur unie.
    ///
    /// # Example
    /// ```
    /// use ht_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, [128, 128, 128, 255]);
    /// assert_eq!(fb.pixel(1, 1), (128, 128, 128, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        fb
    }

    /// `true` si une dimension est nulle (ratio d'aspect indéfini).
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// Hors limites → pixel transparent.
    ///
    /// # Example
    /// ```
    /// use ht_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// assert_eq!(fb.pixel(0, 0), (0, 0, 0, 0));
    /// assert_eq!(fb.pixel(50, 50), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0, 0);
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match self.data.get(idx..idx + 4) {
            Some(px) => (px[0], px[1], px[2], px[3]),
            None => (0, 0, 0, 0),
        }
    }

    /// Luminance Rec.601 normalisée [0.0, 1.0] du pixel (x, y).
    ///
    /// # Example
    /// ```
    /// use ht_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, [255, 255, 255, 255]);
    /// assert!((fb.luminance(0, 0) - 1.0).abs() < 1e-6);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> f32 {
        let (r, g, b, _) = self.pixel(x, y);
        tone::luminance(r, g, b)
    }
}

/// Région carrée `size × size` du working buffer, éphémère (une passe).
///
/// `x`/`y` désignent le coin haut-gauche, en pixels device. `lum` est la
/// luminance ajustée [0.0, 1.0] du pixel échantillonné en (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// Left edge in device pixels.
    pub x: f32,
    /// Top edge in device pixels.
    pub y: f32,
    /// Tone-adjusted luminance.
    pub lum: f32,
    /// Side length (`scaled_cell_size`).
    pub size: f32,
}

impl Cell {
    /// Centre de la cellule.
    ///
    /// # Example
    /// ```
    /// use ht_core::frame::Cell;
    /// let c = Cell { x: 10.0, y: 20.0, lum: 0.5, size: 10.0 };
    /// assert_eq!(c.center(), (15.0, 25.0));
    /// ```
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    /// Index de colonne/ligne dans la grille (`floor(x / size)`).
    #[inline]
    #[must_use]
    pub fn grid_index(&self) -> (u32, u32) {
        const ROUNDING_SLACK: f32 = 1e-3;
        let size = self.size.max(f32::EPSILON);
        (
            (self.x / size + ROUNDING_SLACK).floor() as u32,
            (self.y / size + ROUNDING_SLACK).floor() as u32,
        )
    }
}
