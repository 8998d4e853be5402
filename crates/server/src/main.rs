use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use classic_engine::world::VoxelGrid;
use classic_engine::world::position::{BlockPos, Position};
use classic_server::format::FormatRegistry;
use classic_server::metrics::Metrics;
use classic_server::net::ServerInfo;
use classic_server::{block, persistence};
use rayon::prelude::*;

#[derive(Parser)]
#[command(
    name = "classic-server",
    version,
    about = "Classic protocol server and legacy map converter"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve a map to classic clients
    Serve {
        /// Map file to serve; generated as a flat map if it does not exist
        #[arg(short, long, default_value = "main.lvl")]
        map: PathBuf,
        #[arg(short, long, default_value = "0.0.0.0:25565")]
        bind: String,
        #[arg(long, default_value = "Classic Server")]
        name: String,
        #[arg(long, default_value = "Welcome!")]
        motd: String,
        /// Size of a generated map
        #[arg(long, default_value_t = 128)]
        width: u16,
        #[arg(long, default_value_t = 128)]
        length: u16,
        #[arg(long, default_value_t = 64)]
        height: u16,
    },
    /// Print the format and header of map files
    Info {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Convert a map to the format its output extension names
    Convert { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let registry = FormatRegistry::standard();

    match cli.command {
        Command::Serve {
            map,
            bind,
            name,
            motd,
            width,
            length,
            height,
        } => {
            let level = open_or_generate(&registry, &map, width, length, height)?;
            serve(Arc::new(level), ServerInfo { name, motd }, &bind).await
        }
        Command::Info { paths } => {
            info(&registry, &paths);
            Ok(())
        }
        Command::Convert { input, output } => convert(&registry, &input, &output),
    }
}

async fn serve(level: Arc<VoxelGrid>, info: ServerInfo, bind: &str) -> Result<()> {
    let metrics = Arc::new(Metrics::new());
    tracing::info!("Starting classic server \"{}\" on {}", info.name, bind);

    tokio::select! {
        result = classic_server::net::listener::run(
            level, Arc::new(info), Arc::clone(&metrics), bind,
        ) => {
            if let Err(e) = result {
                tracing::error!("Server error: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    tracing::info!("Final metrics: {}", serde_json::to_string(&metrics.snapshot())?);
    Ok(())
}

/// Load `path`, or generate a flat map there if it does not exist yet.
fn open_or_generate(
    registry: &FormatRegistry,
    path: &Path,
    width: u16,
    length: u16,
    height: u16,
) -> Result<VoxelGrid> {
    if path.exists() {
        return persistence::load_map(registry, path)
            .with_context(|| format!("loading {}", path.display()));
    }

    tracing::info!("{} not found, generating a flat map...", path.display());
    let level = generate_flat_level(width, length, height)?;
    let converter = registry
        .for_path(path)
        .with_context(|| format!("no map format uses the extension of {}", path.display()))?;
    persistence::save_map(converter, &level, path)
        .with_context(|| format!("saving {}", path.display()))?;
    Ok(level)
}

/// Print every file's format and header. Files are probed in parallel.
fn info(registry: &FormatRegistry, paths: &[PathBuf]) {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| (path, persistence::load_header(registry, path)))
        .collect();

    for (path, result) in results {
        match result {
            Ok((format, header)) => println!(
                "{}: {} {}x{}x{} spawn ({}, {}, {})",
                path.display(),
                format,
                header.width,
                header.length,
                header.height,
                header.spawn.block_x(),
                header.spawn.block_y(),
                header.spawn.block_z(),
            ),
            Err(e) => println!("{}: {}", path.display(), e),
        }
    }
}

fn convert(registry: &FormatRegistry, input: &Path, output: &Path) -> Result<()> {
    let level = persistence::load_map(registry, input)
        .with_context(|| format!("loading {}", input.display()))?;
    let Some(converter) = registry.for_path(output) else {
        bail!("no map format uses the extension of {}", output.display());
    };
    persistence::save_map(converter, &level, output)
        .with_context(|| format!("saving {}", output.display()))?;
    Ok(())
}

/// Bedrock floor, stone up to a quarter of the height, dirt, and a grass
/// surface at half height. Spawn stands on the surface at the centre.
fn generate_flat_level(width: u16, length: u16, height: u16) -> Result<VoxelGrid> {
    let mut level = VoxelGrid::new(width, length, height)?;
    let surface = height as usize / 2;
    let stone_top = height as usize / 4;

    for y in 0..surface.min(height as usize) {
        let id = match y {
            0 => block::BEDROCK,
            y if y < stone_top => block::STONE,
            y if y + 1 < surface => block::DIRT,
            _ => block::GRASS,
        };
        for z in 0..length as usize {
            for x in 0..width as usize {
                level.set(BlockPos::new(x, y, z), id);
            }
        }
    }

    level.set_spawn(Position::from_block(
        i32::from(width) / 2,
        surface as i32 + 2,
        i32::from(length) / 2,
        0,
        0,
    ));
    Ok(level)
}
