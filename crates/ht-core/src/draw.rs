/// Marque à dessiner sur la surface de sortie. Toujours blanche : la
/// luminance contrôle la taille ou la présence de la marque, jamais sa couleur.
///
/// # Example
/// ```
/// use ht_core::draw::DrawCommand;
/// let cmd = DrawCommand::Circle { cx: 5.0, cy: 5.0, radius: 1.5 };
/// assert!(matches!(cmd, DrawCommand::Circle { .. }));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    /// Filled circle centered at (`cx`, `cy`).
    Circle {
        /// Center x in device pixels.
        cx: f32,
        /// Center y in device pixels.
        cy: f32,
        /// Radius in device pixels.
        radius: f32,
    },
    /// Filled square with top-left corner (`x`, `y`).
    Rect {
        /// Left edge in device pixels.
        x: f32,
        /// Top edge in device pixels.
        y: f32,
        /// Side length in device pixels.
        size: f32,
    },
}

/// Surface de sortie visible. Le pipeline en possède l'accès en écriture.
///
/// # Example
/// ```
/// use ht_core::draw::{DrawCommand, RecordingSurface, Surface};
/// let mut s = RecordingSurface::default();
/// s.resize(100);
/// s.clear();
/// s.draw(&DrawCommand::Rect { x: 0.0, y: 0.0, size: 4.0 });
/// assert_eq!(s.commands.len(), 1);
/// ```
pub trait Surface {
    /// Fixe la résolution interne à `size × size` pixels device.
    fn resize(&mut self, size: u32);

    /// Résolution interne courante (côté du carré).
    fn size(&self) -> u32;

    /// Efface toute la surface (transparent).
    fn clear(&mut self);

    /// Dessine une marque blanche.
    fn draw(&mut self, command: &DrawCommand);
}

/// Surface qui enregistre les commandes au lieu de rasteriser.
///
/// Sert aux tests et au diagnostic : `commands` ne contient que la dernière
/// passe, `clears` compte les passes.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// Backing resolution.
    pub size: u32,
    /// Number of `clear()` calls so far.
    pub clears: usize,
    /// Draw calls recorded since the last clear.
    pub commands: Vec<DrawCommand>,
    /// Draw calls made while the surface had not been cleared yet.
    pub draws_before_clear: usize,
}

impl Surface for RecordingSurface {
    fn resize(&mut self, size: u32) {
        self.size = size;
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.commands.clear();
    }

    fn draw(&mut self, command: &DrawCommand) {
        if self.clears == 0 {
            self.draws_before_clear += 1;
        }
        self.commands.push(*command);
    }
}
