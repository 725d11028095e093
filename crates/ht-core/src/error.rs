use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Source reference that no loader can handle.
    #[error("Source non supportée : {reference}")]
    UnsupportedSource {
        /// The offending source reference.
        reference: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// The media decoder rejected the source.
    #[error("Échec du décodage de {reference} : {reason}")]
    Decode {
        /// Source reference being decoded.
        reference: String,
        /// Decoder message.
        reason: String,
    },
}
