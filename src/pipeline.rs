use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    config::{validate_hex_size, PipelineConfig},
    external::{
        build_tiles, fetch_manifest, CommandRunner, Fetcher, HttpFetcher, ProcessRunner,
        TileBuildOutcome, TileJob,
    },
    grid::{GridSummary, HexGrid},
    layers::PlanarLayers,
    output::write_grid,
    terrain::Classifier,
};

#[derive(Debug, Clone)]
pub struct GridReport {
    pub path: PathBuf,
    pub summary: GridSummary,
}

pub struct PipelineBuilder {
    config: PipelineConfig,
    fetcher: Option<Box<dyn Fetcher>>,
    runner: Option<Box<dyn CommandRunner>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            fetcher: None,
            runner: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Falls back to the process runner when none was given. Without a
    /// fetcher, an HTTP client is created on the first manifest fetch.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        let runner = self.runner.unwrap_or_else(|| Box::new(ProcessRunner));
        Ok(Pipeline {
            classifier: Classifier::standard(&self.config.thresholds),
            config: self.config,
            fetcher: self.fetcher,
            runner,
        })
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    classifier: Classifier,
    fetcher: Option<Box<dyn Fetcher>>,
    runner: Box<dyn CommandRunner>,
}

impl Pipeline {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads the vector layers, tiles the battle area and writes the grid.
    pub fn generate_hex(&self, hex_size: f64) -> Result<GridReport> {
        validate_hex_size(hex_size)?;
        let layers = PlanarLayers::load(&self.config.paths.vector_dir, &self.config.layers)
            .context("failed to ingest vector layers")?;
        if layers.is_empty() {
            debug!("no vector layers found; every cell will be steppe");
        }

        let grid = HexGrid::generate(&self.config.bbox, hex_size, &layers, &self.classifier)?;
        let path = self.config.hex_output_path(hex_size);
        write_grid(&grid, &path)
            .with_context(|| format!("failed to write hex grid {}", path.display()))?;

        let summary = grid.summary();
        info!(
            path = %path.display(),
            cells = summary.cell_count,
            "hex grid written"
        );
        for (terrain, count) in &summary.by_terrain {
            debug!(%terrain, count, "terrain cells");
        }
        Ok(GridReport { path, summary })
    }

    pub fn fetch_manifest(&self) -> bool {
        let manifest = &self.config.manifest;
        let target = self.config.manifest_path();
        match &self.fetcher {
            Some(fetcher) => fetch_manifest(fetcher.as_ref(), &manifest.url, &target),
            None => match HttpFetcher::new(Duration::from_secs(manifest.timeout_secs)) {
                Ok(http) => fetch_manifest(&http, &manifest.url, &target),
                Err(err) => {
                    warn!("manifest fetch skipped: {err:#}");
                    false
                }
            },
        }
    }

    pub fn build_tiles(&self, input: &Path) -> TileBuildOutcome {
        let tiles = &self.config.tiles;
        let job = TileJob {
            program: &tiles.program,
            zoom: &tiles.zoom,
            processes: tiles.processes,
            input,
            out_dir: &self.config.paths.tiles_dir,
        };
        build_tiles(self.runner.as_ref(), &job)
    }

    /// Manifest first (best effort), then the grid.
    pub fn run_all(&self, hex_size: f64) -> Result<GridReport> {
        self.fetch_manifest();
        self.generate_hex(hex_size)
    }
}
