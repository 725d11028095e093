use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use flume::Receiver;
use ht_core::error::CoreError;
use ht_core::frame::FrameBuffer;
use ht_core::traits::{MediaKind, Source, SourceEvent};

use crate::media::is_remote;
use crate::video::decode_single_frame;

/// Source d'image statique, décodée une seule fois sur un thread dédié.
///
/// Le thread envoie exactement un `SourceEvent` (`Ready` ou `Failed`) puis
/// se termine. Dropper la source détache simplement le thread : le résultat
/// est ignoré si personne ne l'écoute plus.
///
/// # Example
/// ```no_run
/// use ht_source::image::ImageSource;
/// let source = ImageSource::spawn("earth.png").unwrap();
/// ```
pub struct ImageSource {
    rx: Receiver<SourceEvent>,
}

impl ImageSource {
    /// Lance le décodage de `input` (chemin local ou URL).
    ///
    /// # Errors
    /// Returns an error if the loader thread cannot be spawned.
    pub fn spawn(input: &str) -> Result<Self> {
        let (tx, rx) = flume::bounded(1);
        let input = input.to_string();
        thread::Builder::new()
            .name("ht-image".to_string())
            .spawn(move || {
                let event = match decode(&input) {
                    Ok(frame) if !frame.is_degenerate() => {
                        log::info!("Image prête : {input} ({}x{})", frame.width, frame.height);
                        SourceEvent::Ready(Arc::new(frame))
                    }
                    Ok(frame) => SourceEvent::Failed(
                        CoreError::InvalidDimensions {
                            width: frame.width,
                            height: frame.height,
                        }
                        .to_string(),
                    ),
                    Err(e) => SourceEvent::Failed(format!("{e:#}")),
                };
                let _ = tx.send(event);
            })
            .context("Impossible de spawner le thread image")?;
        Ok(Self { rx })
    }
}

impl Source for ImageSource {
    fn kind(&self) -> MediaKind {
        MediaKind::StaticImage
    }

    fn poll_event(&mut self) -> Option<SourceEvent> {
        self.rx.try_recv().ok()
    }
}

fn decode(input: &str) -> Result<FrameBuffer> {
    if is_remote(input) {
        decode_single_frame(input)
    } else {
        load_image(Path::new(input))
    }
}

/// Décode une image locale en RGBA.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
///
/// # Example
/// ```no_run
/// use ht_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("earth.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path).map_err(|e| CoreError::Decode {
        reference: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameBuffer {
        data: rgba.into_raw(),
        width,
        height,
    })
}
