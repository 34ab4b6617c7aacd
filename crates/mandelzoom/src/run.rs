use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;
use viewer::{ViewerSession, ViewerSettings};

use crate::cli::{parse_surface_size, Cli};
use crate::config::AppConfig;

const FRAGMENT_SHADER_FILE: &str = "mandel.frag";
const DEFAULT_SURFACE_SIZE: (u32, u32) = (800, 600);
const WINDOW_TITLE: &str = "Mandelbrot";

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let config = AppConfig::load(&args.config)?;
    tracing::debug!(path = %args.config.display(), "loaded configuration");

    let max_iterations = args.max_iterations.unwrap_or(config.constants.max_iterations);
    let surface_size = args
        .size
        .as_deref()
        .map(parse_surface_size)
        .transpose()?
        .unwrap_or(DEFAULT_SURFACE_SIZE);

    let fragment_shader = config.resources.shader_dir.join(FRAGMENT_SHADER_FILE);
    if !fragment_shader.is_file() {
        anyhow::bail!(
            "fragment shader not found at {}; check resources.shader_dir",
            fragment_shader.display()
        );
    }
    if !config.resources.assets_dir.is_dir() {
        tracing::warn!(
            path = %config.resources.assets_dir.display(),
            "assets directory missing; overlay resources will be unavailable"
        );
    }

    let settings = ViewerSettings {
        max_iterations,
        precision_bits: config.camera.precision_bits,
        drag_sensitivity: config.camera.drag_sensitivity,
        zoom_sensitivity: config.camera.zoom_sensitivity,
    };
    let session = ViewerSession::new(settings);

    let renderer_config = RendererConfig {
        surface_size,
        fragment_shader,
        title: WINDOW_TITLE.to_string(),
    };
    tracing::info!(
        max_iterations,
        width = surface_size.0,
        height = surface_size.1,
        "starting viewer"
    );

    Renderer::new(renderer_config, session)
        .run()
        .context("viewer terminated with an error")
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
