use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use ht_core::error::CoreError;
use ht_core::frame::FrameBuffer;

/// Géométrie "cover" d'une source dans un carré `render_size²`.
///
/// Même sémantique que CSS `background-size: cover` : la source remplit le
/// carré sans distorsion, l'excédent est rogné de façon centrée.
///
/// # Example
/// ```
/// use ht_source::resize::CoverFit;
/// let fit = CoverFit::compute(800, 400, 300).unwrap();
/// assert_eq!((fit.draw_width, fit.draw_height), (600.0, 300.0));
/// assert_eq!((fit.offset_x, fit.offset_y), (-150.0, 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Largeur de la source une fois dessinée.
    pub draw_width: f64,
    /// Hauteur de la source une fois dessinée.
    pub draw_height: f64,
    /// Décalage horizontal (≤ 0).
    pub offset_x: f64,
    /// Décalage vertical (≤ 0).
    pub offset_y: f64,
}

impl CoverFit {
    /// Calcule la géométrie. `None` si la source est dégénérée (ratio indéfini).
    #[must_use]
    pub fn compute(src_width: u32, src_height: u32, render_size: u32) -> Option<Self> {
        if src_width == 0 || src_height == 0 {
            return None;
        }
        let size = f64::from(render_size);
        let aspect = f64::from(src_width) / f64::from(src_height);
        Some(if aspect > 1.0 {
            let draw_width = size * aspect;
            Self {
                draw_width,
                draw_height: size,
                offset_x: -(draw_width - size) / 2.0,
                offset_y: 0.0,
            }
        } else {
            let draw_height = size / aspect;
            Self {
                draw_width: size,
                draw_height,
                offset_x: 0.0,
                offset_y: -(draw_height - size) / 2.0,
            }
        })
    }

    /// Région visible exprimée en pixels source : `(left, top, width, height)`.
    ///
    /// Carré de côté `min(w, h)` centré sur l'axe long. Calculé en pixels
    /// source, la boîte reste toujours dans l'image.
    ///
    /// # Example
    /// ```
    /// use ht_source::resize::CoverFit;
    /// assert_eq!(CoverFit::source_crop(800, 400), (200.0, 0.0, 400.0, 400.0));
    /// ```
    #[must_use]
    pub fn source_crop(src_width: u32, src_height: u32) -> (f64, f64, f64, f64) {
        let (w, h) = (f64::from(src_width), f64::from(src_height));
        let side = w.min(h);
        ((w - side) / 2.0, (h - side) / 2.0, side, side)
    }
}

/// Resizer réutilisable wrappant fast_image_resize, en mode cover.
///
/// # Example
/// ```
/// use ht_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    algorithm: ResizeAlg,
    /// Scratch owned copy of the source (fast_image_resize wants `&mut` on it).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new resizer (bilinear, comme le `drawImage` d'un canvas).
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            algorithm: ResizeAlg::Convolution(FilterType::Bilinear),
            src_buf: Vec::new(),
        }
    }

    /// Dessine `src` en mode cover dans `dst`, qui doit être carré.
    ///
    /// # Errors
    /// Returns an error if `src` is degenerate, `dst` is not square, or the
    /// resize itself fails.
    ///
    /// # Example
    /// ```
    /// use ht_source::resize::Resizer;
    /// use ht_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::filled(160, 90, [255, 255, 255, 255]);
    /// let mut dst = FrameBuffer::new(50, 50);
    /// let fit = r.cover_into(&src, &mut dst).unwrap();
    /// assert_eq!(fit.draw_height, 50.0);
    /// assert!(dst.pixel(0, 0).0 >= 250);
    /// ```
    pub fn cover_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<CoverFit> {
        if dst.width != dst.height {
            return Err(CoreError::InvalidDimensions {
                width: dst.width,
                height: dst.height,
            }
            .into());
        }
        let fit = CoverFit::compute(src.width, src.height, dst.width).ok_or(
            CoreError::InvalidDimensions {
                width: src.width,
                height: src.height,
            },
        )?;

        let expected = src.width as usize * src.height as usize * 4;
        if src.data.len() != expected {
            return Err(CoreError::Decode {
                reference: format!("frame {}x{}", src.width, src.height),
                reason: format!("{} octets au lieu de {expected}", src.data.len()),
            }
            .into());
        }

        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(fit);
        }

        let (left, top, width, height) = CoverFit::source_crop(src.width, src.height);
        let options = ResizeOptions::new()
            .resize_alg(self.algorithm)
            .crop(left, top, width, height);

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Invalid source dimensions")?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&options))
            .context("Resize failed")?;

        Ok(fit)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}
