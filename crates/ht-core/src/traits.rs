use std::sync::Arc;

use crate::frame::FrameBuffer;

/// Catégorie de média, déterminée par la référence source.
///
/// # Example
/// ```
/// use ht_core::traits::MediaKind;
/// assert_ne!(MediaKind::StaticImage, MediaKind::LoopingVideo);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Single decoded picture.
    StaticImage,
    /// Video played in a loop, muted.
    LoopingVideo,
}

/// Signal émis par le décodeur d'une source.
#[derive(Clone, Debug)]
pub enum SourceEvent {
    /// Décodage initial terminé : première image exploitable.
    Ready(Arc<FrameBuffer>),
    /// Nouvelle frame vidéo décodée.
    Frame(Arc<FrameBuffer>),
    /// Échec de chargement (URL cassée, format non supporté, ...).
    Failed(String),
}

/// Fournit des frames au pipeline.
///
/// Implémenté par : `ImageSource`, `VideoSource`. Le drop d'une source
/// arrête son décodeur : aucune source ne continue à tourner après un swap.
///
/// # Example
/// ```
/// use ht_core::traits::{MediaKind, Source, SourceEvent};
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn kind(&self) -> MediaKind { MediaKind::StaticImage }
///     fn poll_event(&mut self) -> Option<SourceEvent> { None }
/// }
/// ```
pub trait Source: Send {
    /// Nature du média.
    fn kind(&self) -> MediaKind;

    /// Retourne le prochain signal du décodeur, s'il y en a un.
    ///
    /// Ne bloque JAMAIS.
    fn poll_event(&mut self) -> Option<SourceEvent>;

    /// Indique au décodeur la taille de rendu courante (vidéo : taille du pipe).
    fn retarget(&mut self, _render_size: u32) {}

    /// Pause/reprise de la lecture (sans effet sur une image).
    fn set_paused(&mut self, _paused: bool) {}
}
