//! Modulation Scope - oscilloscope-style AM/FM/PM and ASK/FSK/PSK visualizer
//!
//! Entry point for the application.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use eframe::egui;

use modulation_scope::app::ScopeApp;
use modulation_scope::config::{self, BackendMode, ScopeConfig};
use modulation_scope::display::SurfaceRegistry;
use modulation_scope::engine::ScopeEngine;
use modulation_scope::{backend, logging, ScopeError, ScopeResult};

#[derive(Parser, Debug)]
#[command(name = "modulation-scope", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Modulation backend: local or http
    #[arg(short, long)]
    backend: Option<BackendMode>,

    /// Log filter directive, e.g. `debug` or `modulation_scope=trace`
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "modulation scope exited with an error");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ScopeResult<()> {
    let mut config = match &cli.config {
        Some(path) => config::load_from_file(path)?,
        None => ScopeConfig::default(),
    };
    if let Some(mode) = cli.backend {
        config.backend.mode = mode;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    logging::init(&config.logging)?;
    tracing::info!(backend = ?config.backend.mode, "starting modulation scope");

    let registry = Arc::new(SurfaceRegistry::new());
    let backend = backend::from_config(&config.backend)?;
    let engine = ScopeEngine::spawn(config.clone(), Arc::clone(&registry), backend)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("Modulation Scope"),
        ..Default::default()
    };

    eframe::run_native(
        "Modulation Scope",
        options,
        Box::new(move |_cc| Ok(Box::new(ScopeApp::new(engine, registry, config)))),
    )
    .map_err(|e| ScopeError::Ui(e.to_string()))
}
