// navtool - headless navmesh generator for viewer scene files
//
// generate: load a scene, build the tiled navmesh, export GeoJSON per tile
// inspect:  list the meshes that would feed the builder

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use navview_navmesh::collector::{collect_meshes, triangle_count};
use navview_navmesh::config::TILE_SIZE_RANGE;
use navview_navmesh::{
    BuildConfig, DirectorySink, GenerateOutcome, NavMeshGenerator, Scene, ViewerContext, Viewport,
};
use navview_shared::config::Config;
use navview_shared::log::{initialize_logging, map_log_level};
use navview_shared::{DEFAULT_CONFIG_FILE, DEFAULT_ENV_PREFIX};

#[derive(Parser, Debug)]
#[command(name = "navtool")]
#[command(about = "Navigation mesh generator for viewer scenes")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Console log level override (0=Error, 1=Warn, 2=Info, 3=Debug, 4=Trace)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the navmesh for a scene and export it
    Generate(GenerateArgs),
    /// List the meshes collected from a scene
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Tile edge length in cells
    #[arg(long = "tile-size", value_parser = clap::value_parser!(u32).range(
        *TILE_SIZE_RANGE.start() as i64..=*TILE_SIZE_RANGE.end() as i64
    ))]
    tile_size: Option<u32>,

    /// Directory receiving the exported GeoJSON files
    #[arg(short = 'o', long = "out", default_value = "navmesh")]
    out: PathBuf,

    /// Build only, skip the export
    #[arg(long = "no-export")]
    no_export: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Scene description (JSON)
    scene: PathBuf,
}

fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    let text = fs::read_to_string(path).with_context(|| format!("reading scene {}", path.display()))?;
    let scene = Scene::from_json(&text).with_context(|| format!("parsing scene {}", path.display()))?;
    tracing::info!("Loaded scene {} ({} nodes)", path.display(), scene.len());
    Ok(scene)
}

async fn run_generate(config: &Config, args: GenerateArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.scene)?;
    let viewport = Viewport::new(
        config.get_uint_default("Viewport.Width", 1280),
        config.get_uint_default("Viewport.Height", 720),
    );
    let mut ctx = ViewerContext::new(scene, viewport);
    let mut generator = NavMeshGenerator::new(BuildConfig::from_config(config));

    match generator.generate(&mut ctx, args.tile_size).await? {
        GenerateOutcome::Built { tiles, polygons } => {
            tracing::info!("Navmesh ready: {} tile(s), {} polygon(s)", tiles, polygons);
        }
        GenerateOutcome::AlreadyGenerated => {}
    }

    if args.no_export {
        return Ok(());
    }

    let mut sink = DirectorySink::new(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;
    let saved = generator.export(&mut sink)?;
    tracing::info!("Wrote {} file(s) to {}", saved, args.out.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.scene)?;
    let meshes = collect_meshes(scene.root());
    for mesh in &meshes {
        tracing::info!(
            "  #{:<4} {:<24} {:>8} triangle(s)",
            mesh.node,
            mesh.name,
            mesh.mesh.triangle_count()
        );
    }
    tracing::info!("{} mesh(es), {} triangle(s)", meshes.len(), triangle_count(&meshes));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::new();
    let config_found = config.set_source(&cli.config, DEFAULT_ENV_PREFIX);

    let log_dir = config.get_string_default("LogsDir", "");
    let log_dir = if log_dir.is_empty() { None } else { Some(log_dir) };
    let level = cli.log_level.unwrap_or_else(|| config.get_int_default("LogLevel", 2));
    let _guard = initialize_logging(log_dir.as_deref(), map_log_level(level), None);

    if config_found {
        tracing::info!("Using configuration file: {}", cli.config);
    } else {
        tracing::warn!("Could not find configuration file {}, using defaults.", cli.config);
    }

    match cli.command {
        Command::Generate(args) => run_generate(&config, args).await,
        Command::Inspect(args) => run_inspect(args),
    }
}
