//! Pointy-top hex tiling of the bounding box in planar space.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::{
    config::{validate_hex_size, BoundingBox},
    error::ConfigError,
    layers::PlanarLayers,
    projection::{to_geographic, to_planar, PlanarPoint},
    terrain::{Classifier, TerrainClass, TerrainProfile},
};

/// Column-major axial offset coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexCoord {
    pub q: u32,
    pub r: u32,
}

impl HexCoord {
    pub fn id(&self) -> String {
        format!("H_{}_{}", self.q, self.r)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    pub coord: HexCoord,
    pub center: PlanarPoint,
    pub hex_size_m: f64,
    /// Closed ring of `(lon, lat)`: six corners then the first one again.
    pub corners: Vec<(f64, f64)>,
    pub profile: TerrainProfile,
}

impl HexCell {
    pub fn id(&self) -> String {
        self.coord.id()
    }
}

/// Corner ring for a pointy-top hex, corners at `60° * i - 30°`.
pub fn hex_corners(center: PlanarPoint, hex_size: f64) -> Vec<(f64, f64)> {
    let mut corners: Vec<(f64, f64)> = (0..6)
        .map(|i| {
            let angle = (60.0 * i as f64 - 30.0).to_radians();
            to_geographic(PlanarPoint::new(
                center.x + hex_size * angle.cos(),
                center.y + hex_size * angle.sin(),
            ))
        })
        .collect();
    corners.push(corners[0]);
    corners
}

/// Column and row spacing `(dx, dy)` for a hex side length.
pub fn spacing(hex_size: f64) -> (f64, f64) {
    (3f64.sqrt() * hex_size, 1.5 * hex_size)
}

/// Centers inside the box, in generation order. The walk extends one step
/// past the far edges so boundary cells are not clipped.
pub fn candidate_centers(
    bbox: &BoundingBox,
    hex_size: f64,
) -> Result<Vec<(HexCoord, PlanarPoint)>, ConfigError> {
    validate_hex_size(hex_size)?;
    let min = to_planar(bbox.min_lon, bbox.min_lat);
    let max = to_planar(bbox.max_lon, bbox.max_lat);
    let (dx, dy) = spacing(hex_size);

    let mut centers = Vec::new();
    let mut q = 0_u32;
    let mut x = min.x;
    while x <= max.x + dx {
        let col_offset = if q % 2 == 1 { 0.75 * hex_size } else { 0.0 };
        let mut r = 0_u32;
        let mut y = min.y - col_offset;
        while y <= max.y + dy {
            let center = PlanarPoint::new(x, y);
            let (lon, lat) = to_geographic(center);
            if bbox.contains(lon, lat) {
                centers.push((HexCoord { q, r }, center));
            }
            y += dy;
            r += 1;
        }
        x += dx;
        q += 1;
    }
    Ok(centers)
}

#[derive(Debug, Clone, Default)]
pub struct HexGrid {
    pub hex_size_m: f64,
    pub cells: Vec<HexCell>,
}

impl HexGrid {
    pub fn generate(
        bbox: &BoundingBox,
        hex_size: f64,
        layers: &PlanarLayers,
        classifier: &Classifier,
    ) -> Result<Self, ConfigError> {
        let cells = candidate_centers(bbox, hex_size)?
            .into_par_iter()
            .map(|(coord, center)| HexCell {
                coord,
                center,
                hex_size_m: hex_size,
                corners: hex_corners(center, hex_size),
                profile: classifier.classify(center, layers),
            })
            .collect();
        Ok(Self {
            hex_size_m: hex_size,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn summary(&self) -> GridSummary {
        let mut by_terrain = BTreeMap::new();
        for cell in &self.cells {
            *by_terrain.entry(cell.profile.terrain).or_insert(0) += 1;
        }
        GridSummary {
            cell_count: self.cells.len(),
            by_terrain,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSummary {
    pub cell_count: usize,
    pub by_terrain: BTreeMap<TerrainClass, usize>,
}

impl GridSummary {
    pub fn count(&self, terrain: TerrainClass) -> usize {
        self.by_terrain.get(&terrain).copied().unwrap_or(0)
    }
}
