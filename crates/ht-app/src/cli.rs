use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ht_core::config::{HalftoneMode, RenderConfig};

/// halftone: terminal halftone renderer (dot matrix / ordered dither).
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin local ou URL (image, ou vidéo .mp4/.webm/.ogg).
    #[arg(long)]
    pub source: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Charger un preset nommé de config/presets/ (ignore --config).
    #[arg(long)]
    pub preset: Option<String>,

    /// Style initial.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Côté du canvas en pixels logiques (100-800).
    #[arg(long)]
    pub size: Option<u32>,

    /// Taille de cellule en pixels logiques (1-20).
    #[arg(long)]
    pub cell_size: Option<f32>,

    /// Device pixel ratio (1-4).
    #[arg(long)]
    pub dpr: Option<f32>,

    /// FPS cible de la boucle de rendu.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Écrire les logs dans ce fichier plutôt que sur stderr (recommandé avec la TUI).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Valeurs acceptées par `--mode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Dots,
    Dithered,
}

impl From<ModeArg> for HalftoneMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dots => Self::Dots,
            ModeArg::Dithered => Self::Dithered,
        }
    }
}

impl Cli {
    /// Applique les overrides CLI sur une config chargée, puis clamp.
    pub fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(ref source) = self.source {
            config.source.clone_from(source);
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(size) = self.size {
            config.output_size = size;
        }
        if let Some(cell) = self.cell_size {
            config.cell_size = cell;
        }
        if let Some(dpr) = self.dpr {
            config.device_pixel_ratio = dpr;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        config.clamp_all();
    }
}
