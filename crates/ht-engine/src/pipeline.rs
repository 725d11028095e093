use std::sync::Arc;

use anyhow::{Context, Result};
use ht_core::config::RenderConfig;
use ht_core::draw::Surface;
use ht_core::frame::FrameBuffer;
use ht_core::traits::{MediaKind, Source, SourceEvent};
use ht_source::resize::Resizer;

use crate::sampler;
use crate::style::CellStyle;

/// État d'ordonnancement du pipeline.
///
/// `Idle → Loading → Ready → (Playing | Static)`, `Failed` depuis `Loading`
/// ou après une erreur de décodage en cours de lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Aucune source attachée.
    Idle,
    /// Source attachée, première frame pas encore décodée.
    Loading,
    /// Première frame reçue, pas encore rendue.
    Ready,
    /// Vidéo : une passe par tick.
    Playing,
    /// Image : une passe à la disponibilité puis à chaque changement de config.
    Static,
    /// Échec du chargement : plus aucune passe, la surface garde sa dernière image.
    Failed,
}

impl PipelineState {
    /// Libellé court pour la barre d'état.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Static => "static",
            Self::Failed => "failed",
        }
    }
}

/// Bilan d'une passe de rendu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Cells sampled.
    pub cells: usize,
    /// Draw commands emitted.
    pub marks: usize,
    /// Side of the square surface in device pixels.
    pub render_size: u32,
    /// Native size of the frame that was sampled.
    pub source_size: (u32, u32),
}

/// Résultat d'un tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to paint this tick.
    Skipped,
    /// A full pass ran.
    Rendered(PassStats),
}

/// Passe en échec, mémorisée pour ne pas la rejouer à l'identique.
struct FailedPass {
    config: RenderConfig,
    source_size: (u32, u32),
}

/// Pipeline de rendu : possède la source courante, le working buffer et le
/// resizer. Une seule passe à la fois, sur le thread appelant.
///
/// # Example
/// ```
/// use ht_core::config::RenderConfig;
/// use ht_core::draw::RecordingSurface;
/// use ht_core::frame::FrameBuffer;
/// use ht_engine::pipeline::FramePipeline;
///
/// let mut pipeline = FramePipeline::new();
/// let mut surface = RecordingSurface::default();
/// let frame = FrameBuffer::filled(64, 64, [255, 255, 255, 255]);
/// let stats = pipeline.render(&RenderConfig::default(), &frame, &mut surface).unwrap();
/// assert_eq!(stats.render_size, 300);
/// assert_eq!(surface.clears, 1);
/// ```
pub struct FramePipeline {
    state: PipelineState,
    source: Option<Box<dyn Source>>,
    kind: Option<MediaKind>,
    /// Dernière frame décodée de la source courante.
    frame: Option<Arc<FrameBuffer>>,
    /// Une frame neuve attend sa passe.
    frame_dirty: bool,
    /// Snapshot de la config de la dernière passe.
    last_config: Option<RenderConfig>,
    /// Taille de décodage déjà demandée à la source.
    retarget_size: u32,
    last_error: Option<String>,
    last_stats: Option<PassStats>,
    /// Dernière passe échouée ; rejouée seulement si la config ou la frame change.
    failed_pass: Option<FailedPass>,
    working: FrameBuffer,
    resizer: Resizer,
}

impl FramePipeline {
    /// Pipeline vide (`Idle`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            source: None,
            kind: None,
            frame: None,
            frame_dirty: false,
            last_config: None,
            retarget_size: 0,
            last_error: None,
            last_stats: None,
            failed_pass: None,
            working: FrameBuffer::new(0, 0),
            resizer: Resizer::new(),
        }
    }

    /// Attache une nouvelle source. La précédente est droppée (annulée) avant
    /// tout : aucun de ses événements ne sera plus lu.
    pub fn attach(&mut self, source: Box<dyn Source>) {
        self.detach();
        log::debug!("Pipeline: source attachée ({:?})", source.kind());
        self.kind = Some(source.kind());
        self.source = Some(source);
        self.state = PipelineState::Loading;
    }

    /// Détache et annule la source courante. Retour à `Idle`.
    pub fn detach(&mut self) {
        if self.source.take().is_some() {
            log::debug!("Pipeline: source détachée");
        }
        self.kind = None;
        self.frame = None;
        self.frame_dirty = false;
        self.last_config = None;
        self.retarget_size = 0;
        self.last_error = None;
        self.failed_pass = None;
        self.state = PipelineState::Idle;
    }

    /// État courant.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Type de média de la source courante.
    #[must_use]
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.kind
    }

    /// Message du dernier échec (chargement ou passe).
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bilan de la dernière passe.
    #[must_use]
    pub fn last_stats(&self) -> Option<PassStats> {
        self.last_stats
    }

    /// Met en pause ou relance la source (sans effet sur une image).
    pub fn set_paused(&mut self, paused: bool) {
        if let Some(source) = self.source.as_mut() {
            source.set_paused(paused);
        }
    }

    /// Un tick de l'hôte : lit les signaux de la source puis lance une passe
    /// si l'état l'exige.
    ///
    /// Une passe en échec est signalée une fois puis sautée tant que la
    /// config et la taille de la frame restent les mêmes.
    ///
    /// # Errors
    /// Returns an error if the pass itself fails (resize of a valid frame).
    pub fn tick(
        &mut self,
        config: &RenderConfig,
        surface: &mut dyn Surface,
    ) -> Result<TickOutcome> {
        self.drain_events();

        let render_size = config.render_size();
        if render_size != self.retarget_size
            && let Some(source) = self.source.as_mut()
        {
            source.retarget(render_size);
            self.retarget_size = render_size;
        }

        if self.state == PipelineState::Ready {
            self.state = match self.kind {
                Some(MediaKind::LoopingVideo) => PipelineState::Playing,
                _ => PipelineState::Static,
            };
        }

        let due = match self.state {
            PipelineState::Playing => true,
            PipelineState::Static => {
                self.frame_dirty || self.last_config.as_ref() != Some(config)
            }
            PipelineState::Idle
            | PipelineState::Loading
            | PipelineState::Ready
            | PipelineState::Failed => false,
        };
        if !due {
            return Ok(TickOutcome::Skipped);
        }
        let Some(frame) = self.frame.clone() else {
            return Ok(TickOutcome::Skipped);
        };

        let source_size = (frame.width, frame.height);
        if let Some(failed) = &self.failed_pass
            && failed.source_size == source_size
            && failed.config == *config
        {
            self.frame_dirty = false;
            return Ok(TickOutcome::Skipped);
        }

        self.frame_dirty = false;
        self.last_config = Some(config.clone());
        match self.render(config, &frame, surface) {
            Ok(stats) => {
                if self.failed_pass.take().is_some() {
                    self.last_error = None;
                }
                Ok(TickOutcome::Rendered(stats))
            }
            Err(e) => {
                self.last_error = Some(format!("{e:#}"));
                self.failed_pass = Some(FailedPass {
                    config: config.clone(),
                    source_size,
                });
                Err(e)
            }
        }
    }

    /// Une passe complète : dimensionnement, cover-fit, échantillonnage,
    /// effacement puis dessin.
    ///
    /// La surface n'est effacée qu'une fois le working buffer prêt : en cas
    /// d'erreur elle garde sa dernière image.
    ///
    /// # Errors
    /// Returns an error if `frame` is degenerate or cannot be resampled.
    pub fn render(
        &mut self,
        config: &RenderConfig,
        frame: &FrameBuffer,
        surface: &mut dyn Surface,
    ) -> Result<PassStats> {
        let render_size = config.render_size();
        if surface.size() != render_size {
            surface.resize(render_size);
        }
        if self.working.width != render_size || self.working.height != render_size {
            log::debug!("Pipeline: working buffer {render_size}x{render_size}");
            self.working = FrameBuffer::new(render_size, render_size);
        }

        self.resizer
            .cover_into(frame, &mut self.working)
            .with_context(|| {
                format!("Cover-fit {}x{} → {render_size}", frame.width, frame.height)
            })?;

        let style = CellStyle::from_config(config);
        surface.clear();
        let mut marks = 0;
        let cells = sampler::for_each_cell(&self.working, render_size, config, |cell| {
            if let Some(command) = style.command(&cell) {
                surface.draw(&command);
                marks += 1;
            }
        });

        let stats = PassStats {
            cells,
            marks,
            render_size,
            source_size: (frame.width, frame.height),
        };
        self.last_stats = Some(stats);
        Ok(stats)
    }

    fn drain_events(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        while let Some(event) = source.poll_event() {
            match event {
                SourceEvent::Ready(frame) | SourceEvent::Frame(frame) => {
                    if frame.is_degenerate() {
                        log::debug!("Pipeline: frame dégénérée ignorée");
                        continue;
                    }
                    self.frame = Some(frame);
                    self.frame_dirty = true;
                    if self.state == PipelineState::Loading {
                        self.state = PipelineState::Ready;
                    }
                }
                SourceEvent::Failed(reason) => {
                    log::warn!("Échec du chargement de la source : {reason}");
                    self.frame = None;
                    self.frame_dirty = false;
                    self.last_error = Some(reason);
                    self.state = PipelineState::Failed;
                }
            }
        }
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}
