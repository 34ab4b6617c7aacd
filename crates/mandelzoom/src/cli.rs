use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "mandelzoom",
    author,
    version,
    about = "Interactive deep-zoom Mandelbrot viewer"
)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH", default_value = "conf.toml")]
    pub config: PathBuf,

    /// Override the window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Override the iteration limit from the configuration file.
    #[arg(long, value_name = "COUNT")]
    pub max_iterations: Option<u32>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses a `WIDTHxHEIGHT` window-size override.
pub fn parse_surface_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like 800x600, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        anyhow::bail!("window dimensions must be non-zero, got '{value}'");
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_sizes() {
        assert_eq!(parse_surface_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_surface_size("1920X1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size(" 640 x 480 ").unwrap(), (640, 480));
    }

    #[test]
    fn rejects_malformed_sizes() {
        assert!(parse_surface_size("800").is_err());
        assert!(parse_surface_size("800x").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("eight-hundred x600").is_err());
    }
}
