use std::path::{Path, PathBuf};

use anyhow::Result;
use ht_core::error::CoreError;
use ht_core::traits::{MediaKind, Source};

use crate::image::ImageSource;
use crate::video::VideoSource;

/// Extensions qui sélectionnent le chemin vidéo (comparaison insensible à la casse).
pub const VIDEO_EXTS: &[&str] = &[".mp4", ".webm", ".ogg"];

/// Classe une référence source selon son suffixe.
///
/// Seule la fin de la chaîne compte : une URL avec query string
/// (`clip.mp4?x=1`) reste une image.
///
/// # Example
/// ```
/// use ht_source::media::classify;
/// use ht_core::traits::MediaKind;
/// assert_eq!(classify("loop.MP4"), MediaKind::LoopingVideo);
/// assert_eq!(classify("https://cdn.test/earth.png"), MediaKind::StaticImage);
/// ```
#[must_use]
pub fn classify(reference: &str) -> MediaKind {
    let lower = reference.trim().to_ascii_lowercase();
    if VIDEO_EXTS.iter().any(|ext| lower.ends_with(ext)) {
        MediaKind::LoopingVideo
    } else {
        MediaKind::StaticImage
    }
}

/// `true` pour une URL absolue (décodée par ffmpeg plutôt que lue sur disque).
#[must_use]
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Résout une référence locale.
///
/// Une référence de la forme `/earth.png` qui n'existe pas à la racine du
/// système de fichiers est cherchée relativement au répertoire courant.
///
/// # Errors
/// Returns `CoreError::FileNotFound` if neither candidate exists.
pub fn resolve_local(reference: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(reference);
    if direct.exists() {
        return Ok(direct);
    }
    if let Some(stripped) = reference.strip_prefix('/') {
        let relative = Path::new(stripped);
        if relative.exists() {
            return Ok(relative.to_path_buf());
        }
    }
    Err(CoreError::FileNotFound {
        path: reference.to_string(),
    }
    .into())
}

/// Ouvre une source pour `reference` et lance son décodeur.
///
/// Le décodage est asynchrone : la source signale `Ready`/`Failed` plus tard.
///
/// # Errors
/// Returns an error if the reference is empty, a local file is missing, or
/// the decoder thread cannot be spawned.
pub fn open_source(reference: &str, render_size: u32) -> Result<Box<dyn Source>> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(CoreError::UnsupportedSource {
            reference: String::new(),
        }
        .into());
    }

    let input = if is_remote(reference) {
        reference.to_string()
    } else {
        resolve_local(reference)?.to_string_lossy().into_owned()
    };

    match classify(reference) {
        MediaKind::StaticImage => {
            log::info!("Ouverture image : {input}");
            Ok(Box::new(ImageSource::spawn(&input)?))
        }
        MediaKind::LoopingVideo => {
            log::info!("Ouverture vidéo : {input}");
            Ok(Box::new(VideoSource::spawn(&input, render_size)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        for (reference, kind) in [
            ("clip.mp4", MediaKind::LoopingVideo),
            ("https://cdn.test/a.OGG", MediaKind::LoopingVideo),
            ("movie.WebM", MediaKind::LoopingVideo),
            ("/earth.png", MediaKind::StaticImage),
            ("mp4.png", MediaKind::StaticImage),
            ("clip.mp4?raw=1", MediaKind::StaticImage),
            ("noextension", MediaKind::StaticImage),
        ] {
            assert_eq!(classify(reference), kind, "{reference}");
        }
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("HTTP://example.com/a.mp4"));
        assert!(!is_remote("/earth.png"));
        assert!(!is_remote("assets/https.png"));
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert!(open_source("   ", 300).is_err());
    }

    #[test]
    fn missing_local_file_is_rejected() {
        let err = open_source("/definitely/not/here.png", 300).err();
        assert!(err.is_some());
    }

    #[test]
    fn resolves_existing_paths_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("earth.png");
        std::fs::write(&file, b"x").unwrap();
        let absolute = file.to_string_lossy().into_owned();
        assert_eq!(resolve_local(&absolute).unwrap(), file);
        assert!(resolve_local("/no-such-dir-halftone/earth.png").is_err());
    }
}
