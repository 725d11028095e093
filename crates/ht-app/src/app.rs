use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use arc_swap::ArcSwap;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ht_core::config::RenderConfig;
use ht_core::traits::MediaKind;
use ht_engine::pipeline::{FramePipeline, TickOutcome};
use ht_render::preview::Preview;
use ht_render::raster::RasterSurface;
use ht_render::ticker::{FpsCounter, FrameTicker};
use ht_render::ui::{self, StatusView};
use ratatui::DefaultTerminal;

/// Répertoire des presets parcourus par la touche `p`.
pub const PRESET_DIR: &str = "config/presets";

/// État de l'application : pipeline, surface, et contrôles clavier.
pub struct App {
    /// Config courante (lecture via arc-swap, écrite par les touches et le hot-reload).
    pub config: Arc<ArcSwap<RenderConfig>>,
    pipeline: FramePipeline,
    raster: RasterSurface,
    preview: Preview,
    ticker: FrameTicker,
    fps: FpsCounter,
    /// Référence de la source actuellement attachée.
    attached_source: Option<String>,
    /// Erreur d'ouverture de la dernière source (avant tout décodage).
    open_error: Option<String>,
    paused: bool,
    show_help: bool,
    presets: Vec<PathBuf>,
    preset_idx: Option<usize>,
    /// Levé par Ctrl-C (signal) ou `q`.
    quit: Arc<AtomicBool>,
}

impl App {
    /// Crée l'application. Aucune source n'est ouverte avant le premier tick.
    #[must_use]
    pub fn new(config: Arc<ArcSwap<RenderConfig>>, quit: Arc<AtomicBool>) -> Self {
        let fps = config.load().target_fps;
        Self {
            config,
            pipeline: FramePipeline::new(),
            raster: RasterSurface::new(0),
            preview: Preview::new(),
            ticker: FrameTicker::new(fps),
            fps: FpsCounter::new(),
            attached_source: None,
            open_error: None,
            paused: false,
            show_help: false,
            presets: list_presets(PRESET_DIR),
            preset_idx: None,
            quit,
        }
    }

    /// Boucle principale : un tick du pipeline par échéance du ticker,
    /// événements terminal entre les ticks.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit() {
            let config = self.config.load_full();
            self.ticker.set_fps(config.target_fps);

            let now = Instant::now();
            if !self.ticker.poll(now) {
                // Dormir jusqu'au prochain tick, mais rester réactif aux événements
                let remaining = self.ticker.remaining(now);
                if event::poll(remaining)? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }

            while event::poll(Duration::ZERO)? {
                self.handle_event(&event::read()?);
            }

            // Les touches ont pu modifier la config.
            let config = self.config.load_full();
            self.tick(&config);

            let status = StatusView {
                state: self.pipeline.state(),
                media: self.pipeline.media_kind(),
                paused: self.paused,
                stats: self.pipeline.last_stats(),
                error: self.open_error.as_deref().or(self.pipeline.last_error()),
                preset: preset_label(&self.presets, self.preset_idx),
                fps: &self.fps,
                show_help: self.show_help,
            };
            let (preview, raster) = (&mut self.preview, &self.raster);
            terminal.draw(|frame| ui::draw(frame, preview, raster, &config, &status))?;
        }
        log::info!("Arrêt de la boucle de rendu.");
        Ok(())
    }

    /// Un tick de rendu : suit la source de la config, puis fait avancer le pipeline.
    pub fn tick(&mut self, config: &RenderConfig) {
        self.sync_source(config);
        match self.pipeline.tick(config, &mut self.raster) {
            Ok(TickOutcome::Rendered(stats)) => {
                self.fps.record(Instant::now());
                log::trace!("Passe: {} cellules, {} marques", stats.cells, stats.marks);
            }
            Ok(TickOutcome::Skipped) => {}
            Err(e) => log::warn!("Passe de rendu échouée : {e:#}"),
        }
    }

    /// Attache une nouvelle source si la référence de la config a changé.
    /// L'ancienne est annulée par le pipeline avant toute autre chose.
    fn sync_source(&mut self, config: &RenderConfig) {
        if self.attached_source.as_deref() == Some(config.source.as_str()) {
            return;
        }
        self.attached_source = Some(config.source.clone());
        self.paused = false;
        match ht_source::open_source(&config.source, config.render_size()) {
            Ok(source) => {
                self.open_error = None;
                self.pipeline.attach(source);
            }
            Err(e) => {
                log::warn!("Source indisponible « {} » : {e:#}", config.source);
                self.pipeline.detach();
                self.open_error = Some(format!("{e:#}"));
            }
        }
    }

    /// Dispatch an input event.
    pub fn handle_event(&mut self, event: &Event) {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
        {
            self.handle_key(key);
        }
    }

    /// Raccourcis clavier.
    pub fn handle_key(&mut self, key: &KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.request_quit();
            }
            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.update_config(|c| c.mode = c.mode.toggled()),
            KeyCode::Char('[') => self.update_config(|c| c.cell_size -= 1.0),
            KeyCode::Char(']') => self.update_config(|c| c.cell_size += 1.0),
            KeyCode::Char('-') => {
                self.update_config(|c| c.nudge_mode_param(-c.mode_param_step()));
            }
            KeyCode::Char('=' | '+') => {
                self.update_config(|c| c.nudge_mode_param(c.mode_param_step()));
            }
            KeyCode::Char('s') => {
                self.update_config(|c| c.output_size = c.output_size.saturating_sub(10));
            }
            KeyCode::Char('S') => self.update_config(|c| c.output_size += 10),
            KeyCode::Char('c') => self.update_config(|c| c.contrast -= 0.1),
            KeyCode::Char('C') => self.update_config(|c| c.contrast += 0.1),
            KeyCode::Char('b') => self.update_config(|c| c.brightness -= 0.05),
            KeyCode::Char('B') => self.update_config(|c| c.brightness += 0.05),
            KeyCode::Char('r') => {
                self.preset_idx = None;
                self.update_config(RenderConfig::reset_to_defaults);
            }
            KeyCode::Char('p') => self.cycle_preset(),
            KeyCode::Char(' ') => self.toggle_pause(),
            _ => {}
        }
    }

    fn request_quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }

    /// `true` une fois l'arrêt demandé.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    /// Modifie une copie de la config, clamp, puis publie.
    fn update_config(&mut self, mutate: impl FnOnce(&mut RenderConfig)) {
        let config = self.config.load();
        let mut new = (**config).clone();
        mutate(&mut new);
        new.clamp_all();
        self.config.store(Arc::new(new));
    }

    fn toggle_pause(&mut self) {
        if self.pipeline.media_kind() != Some(MediaKind::LoopingVideo) {
            return;
        }
        self.paused = !self.paused;
        self.pipeline.set_paused(self.paused);
        log::debug!("Vidéo {}", if self.paused { "en pause" } else { "relancée" });
    }

    fn cycle_preset(&mut self) {
        if self.presets.is_empty() {
            log::warn!("Aucun preset trouvé dans {PRESET_DIR}/");
            return;
        }
        let idx = self.preset_idx.map_or(0, |i| (i + 1) % self.presets.len());
        self.preset_idx = Some(idx);

        let path = &self.presets[idx];
        match ht_core::config::load_config(path) {
            Ok(mut new_cfg) => {
                // Les presets sont visuels : source et réglages de l'hôte restent.
                let old_cfg = self.config.load();
                new_cfg.source.clone_from(&old_cfg.source);
                new_cfg.device_pixel_ratio = old_cfg.device_pixel_ratio;
                new_cfg.target_fps = old_cfg.target_fps;
                self.config.store(Arc::new(new_cfg));
                log::info!("Preset chargé : {}", path.display());
            }
            Err(e) => log::warn!("Preset invalide {} : {e:#}", path.display()),
        }
    }
}

/// Nom (sans extension) du preset actif.
fn preset_label(presets: &[PathBuf], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| presets.get(i))
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
}

/// Liste triée des `.toml` d'un répertoire (vide s'il n'existe pas).
#[must_use]
pub fn list_presets(dir: &str) -> Vec<PathBuf> {
    let mut presets = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "toml") {
                presets.push(path);
            }
        }
    }
    presets.sort();
    presets
}
