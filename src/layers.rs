//! GeoJSON vector layer ingestion and reprojection into planar space.

use std::{fs, io::ErrorKind, path::Path};

use geojson::{Feature, GeoJson, Geometry, Value};
use tracing::debug;

use crate::{
    config::LayerFiles,
    error::LayerError,
    geometry::{Polyline, Ring},
    projection::{to_planar, PlanarPoint},
};

fn lon_lat(position: &[f64]) -> Option<(f64, f64)> {
    match position {
        [lon, lat, ..] => Some((*lon, *lat)),
        _ => None,
    }
}

fn ring_coords(ring: &[Vec<f64>]) -> Vec<(f64, f64)> {
    ring.iter().filter_map(|p| lon_lat(p)).collect()
}

/// All positions as `(lon, lat)`, with polygon rings concatenated.
/// Geometry types other than Point, LineString and Polygon carry none.
pub fn all_coords(geometry: &Geometry) -> Vec<(f64, f64)> {
    match &geometry.value {
        Value::Point(position) => lon_lat(position).into_iter().collect(),
        Value::LineString(line) => ring_coords(line),
        Value::Polygon(rings) => rings.iter().flat_map(|ring| ring_coords(ring)).collect(),
        _ => Vec::new(),
    }
}

/// Polygon rings in file order; empty for every other geometry type.
pub fn rings(geometry: &Geometry) -> Vec<Vec<(f64, f64)>> {
    match &geometry.value {
        Value::Polygon(rings) => rings.iter().map(|ring| ring_coords(ring)).collect(),
        _ => Vec::new(),
    }
}

pub fn point(geometry: &Geometry) -> Option<(f64, f64)> {
    match &geometry.value {
        Value::Point(position) => lon_lat(position),
        _ => None,
    }
}

/// Numeric property, or 0 when absent or not a number.
pub fn number_property(feature: &Feature, key: &str) -> f64 {
    feature
        .property(key)
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0)
}

/// Reads a feature collection; a missing file is an empty layer.
pub fn load_features(path: &Path) -> Result<Vec<Feature>, LayerError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "layer file absent, using empty layer");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(LayerError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_features(&text).map_err(|source| LayerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Features of a FeatureCollection. A bare Feature or Geometry document has
/// no feature list and contributes nothing.
pub fn parse_features(text: &str) -> Result<Vec<Feature>, geojson::Error> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => {
            debug!("layer is not a FeatureCollection, no features taken");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub point: PlanarPoint,
    pub elevation_m: f64,
}

/// Ingested layers in planar meters. Built once per run, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PlanarLayers {
    pub roads: Vec<Polyline>,
    pub rail: Vec<Polyline>,
    pub river: Vec<Polyline>,
    pub industrial: Vec<Ring>,
    pub elevations: Vec<ElevationSample>,
}

fn project_all(coords: &[(f64, f64)]) -> Vec<PlanarPoint> {
    coords.iter().map(|&(lon, lat)| to_planar(lon, lat)).collect()
}

/// One polyline per feature, from every coordinate the feature carries.
pub fn planar_lines(features: &[Feature]) -> Vec<Polyline> {
    features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(|g| project_all(&all_coords(g)))
        .collect()
}

/// One ring per polygon ring, features in file order.
pub fn planar_rings(features: &[Feature]) -> Vec<Ring> {
    features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .flat_map(rings)
        .map(|ring| project_all(&ring))
        .collect()
}

pub fn planar_elevations(features: &[Feature], property: &str) -> Vec<ElevationSample> {
    features
        .iter()
        .filter_map(|f| {
            let (lon, lat) = point(f.geometry.as_ref()?)?;
            Some(ElevationSample {
                point: to_planar(lon, lat),
                elevation_m: number_property(f, property),
            })
        })
        .collect()
}

impl PlanarLayers {
    pub fn load(vector_dir: &Path, files: &LayerFiles) -> Result<Self, LayerError> {
        let roads = load_features(&vector_dir.join(&files.roads))?;
        let rail = load_features(&vector_dir.join(&files.railways))?;
        let river = load_features(&vector_dir.join(&files.river))?;
        let industrial = load_features(&vector_dir.join(&files.industrial))?;
        let elevations = load_features(&vector_dir.join(&files.elevation))?;

        let layers = Self {
            roads: planar_lines(&roads),
            rail: planar_lines(&rail),
            river: planar_lines(&river),
            industrial: planar_rings(&industrial),
            elevations: planar_elevations(&elevations, &files.elevation_property),
        };
        debug!(
            roads = layers.roads.len(),
            rail = layers.rail.len(),
            river = layers.river.len(),
            industrial = layers.industrial.len(),
            elevations = layers.elevations.len(),
            "vector layers ingested"
        );
        Ok(layers)
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
            && self.rail.is_empty()
            && self.river.is_empty()
            && self.industrial.is_empty()
            && self.elevations.is_empty()
    }
}
