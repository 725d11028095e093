use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use ht_core::config::RenderConfig;
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Surveille le fichier config et publie chaque version valide dans l'ArcSwap.
///
/// `overrides` est réappliqué à chaque rechargement (overrides CLI).
/// Un fichier invalide est ignoré : l'ancienne config reste active.
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use arc_swap::ArcSwap;
/// use ht_core::config::RenderConfig;
/// use ht_app::hotreload::spawn_config_watcher;
/// use std::path::Path;
///
/// let config = Arc::new(ArcSwap::from_pointee(RenderConfig::default()));
/// let _watcher = spawn_config_watcher(Path::new("config/default.toml"), &config, |_| {});
/// ```
pub fn spawn_config_watcher<F>(
    config_path: &Path,
    config: &Arc<ArcSwap<RenderConfig>>,
    overrides: F,
) -> Result<impl Watcher + use<F>>
where
    F: Fn(&mut RenderConfig) + Send + 'static,
{
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        {
            reload(&path, &config, &overrides);
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    log::info!("Hot-reload actif sur {}", config_path.display());
    Ok(watcher)
}

/// Recharge `path` dans `config`. Retourne `true` si une nouvelle config a été publiée.
pub fn reload(
    path: &Path,
    config: &ArcSwap<RenderConfig>,
    overrides: &dyn Fn(&mut RenderConfig),
) -> bool {
    match ht_core::config::load_config(path) {
        Ok(mut new_config) => {
            overrides(&mut new_config);
            if **config.load() == new_config {
                return false;
            }
            if config.load().source != new_config.source {
                log::info!("Source changée : {}", new_config.source);
            }
            config.store(Arc::new(new_config));
            log::info!("Config rechargée depuis {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("Erreur de rechargement config : {e:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reload_publishes_valid_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\ncell_size = 8.0\n").unwrap();
        let config = ArcSwap::from_pointee(RenderConfig::default());
        assert!(reload(file.path(), &config, &|_: &mut RenderConfig| {}));
        assert_eq!(config.load().cell_size, 8.0);
        // Même contenu : rien à publier.
        assert!(!reload(file.path(), &config, &|_: &mut RenderConfig| {}));
    }

    #[test]
    fn invalid_file_keeps_previous_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render\ncell_size = ").unwrap();
        let config = ArcSwap::from_pointee(RenderConfig::default());
        assert!(!reload(file.path(), &config, &|_: &mut RenderConfig| {}));
        assert_eq!(**config.load(), RenderConfig::default());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\npath = \"a.png\"\n").unwrap();
        let config = ArcSwap::from_pointee(RenderConfig::default());
        reload(file.path(), &config, &|c: &mut RenderConfig| c.source = "b.mp4".into());
        assert_eq!(config.load().source, "b.mp4");
    }
}
