//! Network and subprocess collaborators. Both are one-shot and never fatal:
//! failures are logged and reported back as a status.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} from {url}", response.status()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Stores the document at `url` verbatim under `target`. Returns whether it did.
pub fn fetch_manifest(fetcher: &dyn Fetcher, url: &str, target: &Path) -> bool {
    match try_fetch_manifest(fetcher, url, target) {
        Ok(()) => {
            info!(path = %target.display(), "fetched IIIF manifest");
            true
        }
        Err(err) => {
            warn!("manifest fetch skipped: {err:#}");
            false
        }
    }
}

fn try_fetch_manifest(fetcher: &dyn Fetcher, url: &str, target: &Path) -> Result<()> {
    let bytes = fetcher.fetch(url)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes).with_context(|| format!("writing {}", target.display()))?;
    Ok(())
}

pub trait CommandRunner {
    /// Runs `program` to completion. `Ok(None)` means it was killed by a signal.
    fn run(&self, program: &str, args: &[String]) -> io::Result<Option<i32>>;
}

pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Option<i32>> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileBuildOutcome {
    Built(PathBuf),
    ToolMissing,
    Failed(String),
}

impl TileBuildOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, TileBuildOutcome::Built(_))
    }
}

#[derive(Debug, Clone)]
pub struct TileJob<'a> {
    pub program: &'a str,
    pub zoom: &'a str,
    pub processes: u32,
    pub input: &'a Path,
    pub out_dir: &'a Path,
}

impl TileJob<'_> {
    pub fn args(&self) -> Vec<String> {
        vec![
            "--xyz".to_string(),
            format!("--processes={}", self.processes),
            "-z".to_string(),
            self.zoom.to_string(),
            self.input.display().to_string(),
            self.out_dir.display().to_string(),
        ]
    }
}

/// Renders an XYZ tile pyramid with the external tiler.
pub fn build_tiles(runner: &dyn CommandRunner, job: &TileJob<'_>) -> TileBuildOutcome {
    if let Err(err) = fs::create_dir_all(job.out_dir) {
        warn!("cannot create tile directory {}: {err}", job.out_dir.display());
        return TileBuildOutcome::Failed(err.to_string());
    }
    match runner.run(job.program, &job.args()) {
        Ok(Some(0)) => {
            info!(out_dir = %job.out_dir.display(), "XYZ tiles generated");
            TileBuildOutcome::Built(job.out_dir.to_path_buf())
        }
        Ok(code) => {
            let reason = match code {
                Some(code) => format!("{} exited with status {code}", job.program),
                None => format!("{} terminated by signal", job.program),
            };
            warn!("tile build failed: {reason}");
            TileBuildOutcome::Failed(reason)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(
                "{} not found; install GDAL or use a hosted tile server",
                job.program
            );
            TileBuildOutcome::ToolMissing
        }
        Err(err) => {
            warn!("tile build failed: {err}");
            TileBuildOutcome::Failed(err.to_string())
        }
    }
}
