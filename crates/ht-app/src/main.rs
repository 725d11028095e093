use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use ht_core::config::RenderConfig;

pub mod app;
pub mod cli;
pub mod hotreload;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging (fichier si demandé : stderr est occupé par la TUI)
    init_logging(&cli)?;

    // 3. Charger la config, puis les overrides CLI
    let (mut config, config_path) = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    log::info!(
        "Démarrage : source={} mode={:?} taille={} cellule={}",
        config.source,
        config.mode,
        config.output_size,
        config.cell_size
    );
    let config = Arc::new(ArcSwap::from_pointee(config));

    // 4. Hot-reload (les overrides CLI restent prioritaires)
    let overrides = cli.clone();
    let _watcher = match config_path {
        Some(ref path) => Some(hotreload::spawn_config_watcher(
            path,
            &config,
            move |c: &mut RenderConfig| overrides.apply_overrides(c),
        )?),
        None => None,
    };

    // 5. Arrêt propre sur SIGINT
    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || quit.store(true, Ordering::Relaxed))
            .context("Impossible d'installer le handler Ctrl-C")?;
    }

    // 6. Terminal + boucle principale
    let terminal = ratatui::init();
    let mut app_instance = app::App::new(config, quit);
    let result = app_instance.run(terminal);

    // 7. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

fn init_logging(cli: &cli::Cli) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn));
    if let Some(ref path) = cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer le fichier de log {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Resolve config: preset takes priority over --config.
///
/// Retourne aussi le fichier à surveiller pour le hot-reload.
fn resolve_config(cli: &cli::Cli) -> Result<(RenderConfig, Option<PathBuf>)> {
    if let Some(ref name) = cli.preset {
        let path = PathBuf::from(format!("{}/{name}.toml", app::PRESET_DIR));
        if !path.exists() {
            anyhow::bail!(
                "Preset inconnu : {name}. Voir {}/ (ex: fine_dots, coarse_dither)",
                app::PRESET_DIR
            );
        }
        let config = ht_core::config::load_config(&path)?;
        Ok((config, Some(path)))
    } else if cli.config.exists() {
        let config = ht_core::config::load_config(&cli.config)?;
        Ok((config, Some(cli.config.clone())))
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok((RenderConfig::default(), None))
    }
}
