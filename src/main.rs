use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wargrid::{
    config::{ConfigLoader, PipelineConfig},
    pipeline::{GridReport, PipelineBuilder},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hex wargame map data pipeline")]
struct Cli {
    /// Pipeline config YAML (built-in battle area when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory that data paths are resolved against
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify terrain over a hex tiling and write it as GeoJSON
    GenerateHex {
        /// Hex side length in meters (config value when omitted)
        #[arg(long)]
        hex_size: Option<f64>,
    },
    /// Download the scanned-map IIIF manifest
    FetchManifest,
    /// Render XYZ tiles from a georeferenced raster
    BuildTiles {
        #[arg(long)]
        input: PathBuf,
    },
    /// Fetch the manifest, then generate the grid
    All {
        #[arg(long)]
        hex_size: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new(".").load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &cli.data_dir {
        config.paths = config.paths.rooted_at(root);
    }
    let default_size = config.hex_size_m;
    let pipeline = PipelineBuilder::new(config).build()?;

    match cli.command {
        Commands::GenerateHex { hex_size } => {
            let report = pipeline.generate_hex(hex_size.unwrap_or(default_size))?;
            print_report(&report);
        }
        Commands::FetchManifest => {
            pipeline.fetch_manifest();
        }
        Commands::BuildTiles { input } => {
            pipeline.build_tiles(&input);
        }
        Commands::All { hex_size } => {
            let report = pipeline.run_all(hex_size.unwrap_or(default_size))?;
            print_report(&report);
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "wargrid=debug" } else { "wargrid=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_report(report: &GridReport) {
    println!(
        "Hex written: {} ({} cells)",
        report.path.display(),
        report.summary.cell_count
    );
}
