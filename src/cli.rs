use crate::config::load_config;
use crate::registry::EdgeStyleRegistry;
use crate::render::{RenderOptions, render_svg, write_output_svg};
use crate::scene::{RoutedScene, Scene, route_scene};
use crate::theme::Theme;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "erouter", version, about = "Route diagram connectors from a JSON scene")]
pub struct Args {
    /// Input scene (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON and SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Routing config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Overrides the scene's view scale
    #[arg(long = "scale")]
    pub scale: Option<f64>,

    /// Overrides the scene's grid size
    #[arg(long = "grid-size")]
    pub grid_size: Option<f64>,

    /// Merge near-duplicate points and drop redundant bends
    #[arg(long = "simplify")]
    pub simplify: bool,

    /// Mark bends in SVG/PNG output
    #[arg(long = "waypoints")]
    pub waypoints: bool,

    /// Preview theme
    #[arg(long = "theme", value_enum, default_value = "classic")]
    pub theme: ThemeName,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ThemeName {
    Classic,
    Modern,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let mut scene = Scene::from_json(&input)?;
    apply_overrides(&mut scene, &args);

    let registry = EdgeStyleRegistry::with_defaults();
    let routed = route_scene(&scene, &registry, &config)?;
    tracing::debug!(edges = routed.edges.len(), "scene routed");

    let theme = match args.theme {
        ThemeName::Classic => Theme::classic(),
        ThemeName::Modern => Theme::modern(),
    };
    let options = RenderOptions {
        show_waypoints: args.waypoints,
        ..RenderOptions::default()
    };

    match args.output_format {
        OutputFormat::Json => write_output_json(&routed, args.output.as_deref())?,
        OutputFormat::Svg => {
            let svg = render_svg(&routed, &theme, &options);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&routed, &theme, &options);
            write_png(&svg, &output, &theme)?;
        }
    }
    Ok(())
}

fn apply_overrides(scene: &mut Scene, args: &Args) {
    if let Some(scale) = args.scale {
        scene.view.scale = scale;
    }
    if let Some(grid_size) = args.grid_size {
        scene.view.grid_size = grid_size;
    }
    if args.simplify {
        scene.view.simplify = true;
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    crate::render::write_output_png(svg, output, theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn write_output_json(routed: &RoutedScene, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => crate::scene::write_routed_scene(path, routed)?,
        None => println!("{}", routed.to_json()?),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
