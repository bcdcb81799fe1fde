//! Pipeline configuration loaded from YAML.

use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_name() -> String {
    "stalingrad".to_string()
}

fn default_hex_size() -> f64 {
    500.0
}

fn default_vector_dir() -> PathBuf {
    PathBuf::from("data/vector")
}

fn default_hex_dir() -> PathBuf {
    PathBuf::from("data/hex")
}

fn default_raster_dir() -> PathBuf {
    PathBuf::from("data/rasters")
}

fn default_tiles_dir() -> PathBuf {
    PathBuf::from("data/tiles/stalingrad_south_xyz")
}

fn default_manifest_url() -> String {
    "https://www.loc.gov/resource/g7064v.ct000790/manifest.json".to_string()
}

fn default_manifest_file() -> String {
    "loc_stalingrad_south_manifest.json".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tiler() -> String {
    "gdal2tiles.py".to_string()
}

fn default_zoom() -> String {
    "8-16".to_string()
}

fn default_processes() -> u32 {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub bbox: BoundingBox,
    #[serde(default = "default_hex_size")]
    pub hex_size_m: f64,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub layers: LayerFiles,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub tiles: TilesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            bbox: BoundingBox::default(),
            hex_size_m: default_hex_size(),
            paths: PathsConfig::default(),
            layers: LayerFiles::default(),
            thresholds: Thresholds::default(),
            manifest: ManifestConfig::default(),
            tiles: TilesConfig::default(),
        }
    }
}

/// Battle area in degrees. Fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Default for BoundingBox {
    /// Central Stalingrad.
    fn default() -> Self {
        Self {
            min_lon: 44.43,
            min_lat: 48.66,
            max_lon: 44.62,
            max_lat: 48.78,
        }
    }
}

impl BoundingBox {
    /// Inclusive on all four bounds.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.min_lon <= lon && lon <= self.max_lon && self.min_lat <= lat && lat <= self.max_lat
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_lon.partial_cmp(&self.max_lon) != Some(Ordering::Less) {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat.partial_cmp(&self.max_lat) != Some(Ordering::Less) {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lat <= -90.0 || self.max_lat >= 90.0 {
            return Err(ConfigError::InvalidBoundingBox(
                "latitudes must stay strictly inside (-90, 90)".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_vector_dir")]
    pub vector_dir: PathBuf,
    #[serde(default = "default_hex_dir")]
    pub hex_dir: PathBuf,
    #[serde(default = "default_raster_dir")]
    pub raster_dir: PathBuf,
    #[serde(default = "default_tiles_dir")]
    pub tiles_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vector_dir: default_vector_dir(),
            hex_dir: default_hex_dir(),
            raster_dir: default_raster_dir(),
            tiles_dir: default_tiles_dir(),
        }
    }
}

impl PathsConfig {
    /// Re-roots every relative path under `root`.
    pub fn rooted_at(&self, root: &Path) -> Self {
        Self {
            vector_dir: root.join(&self.vector_dir),
            hex_dir: root.join(&self.hex_dir),
            raster_dir: root.join(&self.raster_dir),
            tiles_dir: root.join(&self.tiles_dir),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerFiles {
    pub roads: String,
    pub railways: String,
    pub river: String,
    pub industrial: String,
    pub elevation: String,
    pub elevation_property: String,
}

impl Default for LayerFiles {
    fn default() -> Self {
        Self {
            roads: "roads.geojson".into(),
            railways: "railways.geojson".into(),
            river: "river.geojson".into(),
            industrial: "industrial_zones.geojson".into(),
            elevation: "elevation_points.geojson".into(),
            elevation_property: "elevation_m".into(),
        }
    }
}

/// Distances in meters, elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub river_m: f64,
    pub rail_m: f64,
    pub road_m: f64,
    pub hill_radius_m: f64,
    pub hill_min_elevation_m: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            river_m: 120.0,
            rail_m: 90.0,
            road_m: 70.0,
            hill_radius_m: 260.0,
            hill_min_elevation_m: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default = "default_manifest_url")]
    pub url: String,
    #[serde(default = "default_manifest_file")]
    pub file_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url: default_manifest_url(),
            file_name: default_manifest_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesConfig {
    #[serde(default = "default_tiler")]
    pub program: String,
    #[serde(default = "default_zoom")]
    pub zoom: String,
    #[serde(default = "default_processes")]
    pub processes: u32,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            program: default_tiler(),
            zoom: default_zoom(),
            processes: default_processes(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bbox.validate()?;
        validate_hex_size(self.hex_size_m)
    }

    /// File the grid for `hex_size` is written to, e.g. `stalingrad_hex_500m.geojson`.
    pub fn hex_output_path(&self, hex_size: f64) -> PathBuf {
        self.paths
            .hex_dir
            .join(format!("{}_hex_{}m.geojson", self.name, hex_size as u64))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.paths.raster_dir.join(&self.manifest.file_name)
    }
}

pub fn validate_hex_size(hex_size: f64) -> Result<(), ConfigError> {
    if hex_size.is_finite() && hex_size > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidHexSize(hex_size))
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<PipelineConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<PipelineConfig> {
        let config: PipelineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}
