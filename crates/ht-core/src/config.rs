use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Plancher de la taille de cellule : garde-fou contre un pas de boucle nul.
pub const MIN_CELL_SIZE: f32 = 0.5;

/// Source par défaut (relative au répertoire courant).
pub const DEFAULT_SOURCE: &str = "earth.png";

/// Style de rendu des cellules.
///
/// # Example
/// ```
/// use ht_core::config::HalftoneMode;
/// let mode = HalftoneMode::default();
/// assert!(matches!(mode, HalftoneMode::Dots));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum HalftoneMode {
    /// Variable-radius dot matrix.
    #[default]
    Dots,
    /// Ordered 4×4 Bayer dithering.
    #[serde(alias = "Dither")]
    Dithered,
}

impl HalftoneMode {
    /// Mode suivant (cycle Dots ↔ Dithered).
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Dots => Self::Dithered,
            Self::Dithered => Self::Dots,
        }
    }

    /// Nom lisible pour l'UI.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dots => "Variable Dots",
            Self::Dithered => "Dithered Pixels",
        }
    }
}

/// Configuration complète du rendu, hot-rechargeable.
///
/// Snapshot immuable par passe : toute modification déclenche une nouvelle
/// passe. Sérialisable en TOML, chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use ht_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.output_size, 300);
/// assert_eq!(config.render_size(), 300);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RenderConfig {
    /// Chemin local relatif ou URL absolue.
    pub source: String,
    /// Côté du canvas en pixels logiques [100, 800].
    pub output_size: u32,
    /// Taille de cellule en pixels logiques [1, 20].
    pub cell_size: f32,
    /// Contraste autour de 0.5 [0.1, 3.0]. 1.0 = neutre.
    pub contrast: f32,
    /// Décalage de luminosité [-0.5, 0.5]. 0.0 = neutre.
    pub brightness: f32,
    /// Style actif.
    pub mode: HalftoneMode,
    /// Rayon maximal des points (mode Dots) [0.5, 10].
    pub max_dot_radius: f32,
    /// Échelle de la matrice de Bayer (mode Dithered) [0.1, 1.5].
    pub dither_threshold: f32,
    /// Ratio pixels physiques / pixels logiques [1, 4].
    pub device_pixel_ratio: f32,
    /// Cadence de rafraîchissement de l'hôte (ticks par seconde).
    pub target_fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output_size: 300,
            cell_size: 4.0,
            contrast: 1.0,
            brightness: 0.0,
            mode: HalftoneMode::Dots,
            max_dot_radius: 2.8,
            dither_threshold: 0.5,
            device_pixel_ratio: 1.0,
            target_fps: 60,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and after every live nudge.
    pub fn clamp_all(&mut self) {
        self.output_size = self.output_size.clamp(100, 800);
        self.cell_size = self.cell_size.clamp(1.0, 20.0);
        self.contrast = self.contrast.clamp(0.1, 3.0);
        self.brightness = self.brightness.clamp(-0.5, 0.5);
        self.max_dot_radius = self.max_dot_radius.clamp(0.5, 10.0);
        self.dither_threshold = self.dither_threshold.clamp(0.1, 1.5);
        self.device_pixel_ratio = self.device_pixel_ratio.clamp(1.0, 4.0);
        self.target_fps = self.target_fps.clamp(1, 240);
    }

    /// Résolution interne : `round(output_size × device_pixel_ratio)`.
    ///
    /// # Example
    /// ```
    /// use ht_core::config::RenderConfig;
    /// let config = RenderConfig { output_size: 300, device_pixel_ratio: 1.5, ..Default::default() };
    /// assert_eq!(config.render_size(), 450);
    /// ```
    #[must_use]
    pub fn render_size(&self) -> u32 {
        ((self.output_size as f32 * self.device_pixel_ratio.max(1.0)).round() as u32).max(1)
    }

    /// Taille affichée (CSS) du canvas, en pixels logiques.
    #[must_use]
    pub fn display_size(&self) -> u32 {
        self.output_size
    }

    /// Pas de la grille en pixels device, jamais inférieur au plancher.
    ///
    /// # Example
    /// ```
    /// use ht_core::config::RenderConfig;
    /// let config = RenderConfig { cell_size: 0.0, ..Default::default() };
    /// assert!(config.scaled_cell_size() > 0.0);
    /// ```
    #[must_use]
    pub fn scaled_cell_size(&self) -> f32 {
        self.cell_size.max(MIN_CELL_SIZE) * self.device_pixel_ratio.max(1.0)
    }

    /// Paramètre du mode actif (rayon max ou seuil de dither).
    #[must_use]
    pub fn mode_param(&self) -> f32 {
        match self.mode {
            HalftoneMode::Dots => self.max_dot_radius,
            HalftoneMode::Dithered => self.dither_threshold,
        }
    }

    /// Pas d'un cran du paramètre du mode actif.
    #[must_use]
    pub fn mode_param_step(&self) -> f32 {
        match self.mode {
            HalftoneMode::Dots => 0.1,
            HalftoneMode::Dithered => 0.05,
        }
    }

    /// Revient aux valeurs par défaut du rendu et de la source.
    ///
    /// Le style actif et les réglages de l'hôte (DPR, FPS) sont conservés.
    ///
    /// # Example
    /// ```
    /// use ht_core::config::{HalftoneMode, RenderConfig};
    /// let mut config = RenderConfig { cell_size: 12.0, mode: HalftoneMode::Dithered, ..Default::default() };
    /// config.reset_to_defaults();
    /// assert_eq!(config.cell_size, 4.0);
    /// assert_eq!(config.mode, HalftoneMode::Dithered);
    /// ```
    pub fn reset_to_defaults(&mut self) {
        *self = Self {
            mode: self.mode,
            device_pixel_ratio: self.device_pixel_ratio,
            target_fps: self.target_fps,
            ..Self::default()
        };
    }

    /// Ajoute `delta` au paramètre du mode actif, puis clamp.
    pub fn nudge_mode_param(&mut self, delta: f32) {
        match self.mode {
            HalftoneMode::Dots => self.max_dot_radius += delta,
            HalftoneMode::Dithered => self.dither_threshold += delta,
        }
        self.clamp_all();
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    source: Option<SourceSection>,
    render: Option<RenderSection>,
}

/// Source section of the TOML config.
#[derive(Deserialize)]
struct SourceSection {
    path: Option<String>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    output_size: Option<u32>,
    cell_size: Option<f32>,
    contrast: Option<f32>,
    brightness: Option<f32>,
    mode: Option<HalftoneMode>,
    max_dot_radius: Option<f32>,
    dither_threshold: Option<f32>,
    device_pixel_ratio: Option<f32>,
    target_fps: Option<u32>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML, or names an empty source.
///
/// # Example
/// ```
/// use ht_core::config::{parse_config, HalftoneMode};
/// let config = parse_config("[render]\nmode = \"Dithered\"\ncell_size = 6.0\n").unwrap();
/// assert_eq!(config.mode, HalftoneMode::Dithered);
/// assert_eq!(config.cell_size, 6.0);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = RenderConfig::default();

    if let Some(s) = file.source
        && let Some(path) = s.path
    {
        if path.trim().is_empty() {
            return Err(CoreError::Config("source.path est vide".into()).into());
        }
        config.source = path;
    }

    if let Some(r) = file.render {
        if let Some(v) = r.output_size {
            config.output_size = v;
        }
        if let Some(v) = r.cell_size {
            config.cell_size = v;
        }
        if let Some(v) = r.contrast {
            config.contrast = v;
        }
        if let Some(v) = r.brightness {
            config.brightness = v;
        }
        if let Some(v) = r.mode {
            config.mode = v;
        }
        if let Some(v) = r.max_dot_radius {
            config.max_dot_radius = v;
        }
        if let Some(v) = r.dither_threshold {
            config.dither_threshold = v;
        }
        if let Some(v) = r.device_pixel_ratio {
            config.device_pixel_ratio = v;
        }
        if let Some(v) = r.target_fps {
            config.target_fps = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ht_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config("[render]\ncontrast = 1.5\n").unwrap();
        assert_eq!(config.contrast, 1.5);
        assert_eq!(config.output_size, 300);
        assert_eq!(config.source, DEFAULT_SOURCE);
        assert_eq!(config.mode, HalftoneMode::Dots);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            "[render]\noutput_size = 5000\ncell_size = 0.0\ncontrast = 9.0\nbrightness = -3.0\n\
             max_dot_radius = 0.0\ndither_threshold = 4.0\ndevice_pixel_ratio = 0.25\n",
        )
        .unwrap();
        assert_eq!(config.output_size, 800);
        assert_eq!(config.cell_size, 1.0);
        assert_eq!(config.contrast, 3.0);
        assert_eq!(config.brightness, -0.5);
        assert_eq!(config.max_dot_radius, 0.5);
        assert_eq!(config.dither_threshold, 1.5);
        assert_eq!(config.device_pixel_ratio, 1.0);
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(parse_config("[source]\npath = \"  \"\n").is_err());
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[source]\npath = \"https://example.com/loop.mp4\"\n[render]\nmode = \"Dither\"\n"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.mode, HalftoneMode::Dithered);
        assert_eq!(config.source, "https://example.com/loop.mp4");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/halftone.toml")).is_err());
    }

    #[test]
    fn render_size_follows_device_pixel_ratio() {
        let config = RenderConfig {
            output_size: 333,
            device_pixel_ratio: 2.0,
            cell_size: 3.0,
            ..Default::default()
        };
        assert_eq!(config.render_size(), 666);
        assert_eq!(config.scaled_cell_size(), 6.0);
    }

    #[test]
    fn reset_restores_source_and_keeps_host_settings() {
        let mut config = RenderConfig {
            source: "clip.webm".into(),
            output_size: 640,
            contrast: 2.0,
            device_pixel_ratio: 2.0,
            target_fps: 30,
            ..Default::default()
        };
        config.reset_to_defaults();
        assert_eq!(config.source, DEFAULT_SOURCE);
        assert_eq!(config.output_size, 300);
        assert_eq!(config.contrast, 1.0);
        assert_eq!(config.device_pixel_ratio, 2.0);
        assert_eq!(config.target_fps, 30);
    }

    #[test]
    fn nudge_targets_active_mode() {
        let mut config = RenderConfig::default();
        config.nudge_mode_param(0.5);
        assert!((config.max_dot_radius - 3.3).abs() < 1e-5);
        config.mode = config.mode.toggled();
        config.nudge_mode_param(10.0);
        assert_eq!(config.dither_threshold, 1.5);
        assert!((config.mode_param() - 1.5).abs() < f32::EPSILON);
    }
}
