//! Terrain classification as an ordered chain of override rules.
//!
//! Each rule inspects the cell center against the planar layers and mutates
//! the accumulated profile. Later rules win on terrain, move cost and line of
//! sight. The corridor rules (river, rail, road) are mutually exclusive: only
//! the first one that fires applies.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{
    config::Thresholds,
    geometry::{distance_to_polylines, point_in_polygon},
    layers::PlanarLayers,
    projection::PlanarPoint,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TerrainClass {
    Steppe,
    River,
    Rail,
    Road,
    Industry,
    Hill,
}

impl TerrainClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TerrainClass::Steppe => "STEPPE",
            TerrainClass::River => "RIVER",
            TerrainClass::Rail => "RAIL",
            TerrainClass::Road => "ROAD",
            TerrainClass::Industry => "INDUSTRY",
            TerrainClass::Hill => "HILL",
        }
    }
}

impl fmt::Display for TerrainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerrainProfile {
    pub terrain: TerrainClass,
    pub move_cost: u32,
    pub cover: u32,
    #[serde(serialize_with = "flag_as_int")]
    pub los_block: bool,
    pub supply: bool,
}

// consumers read los_block as 0/1
fn flag_as_int<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

impl Default for TerrainProfile {
    /// Open steppe, the baseline every cell starts from.
    fn default() -> Self {
        Self {
            terrain: TerrainClass::Steppe,
            move_cost: 1,
            cover: 0,
            los_block: false,
            supply: true,
        }
    }
}

/// Profile under construction plus whether a corridor rule already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub profile: TerrainProfile,
    pub corridor_matched: bool,
}

pub struct CellContext<'a> {
    pub center: PlanarPoint,
    pub layers: &'a PlanarLayers,
}

pub trait TerrainRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, cell: &CellContext<'_>, acc: &mut Classification);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corridor {
    River,
    Rail,
    Road,
}

/// Proximity to a linear layer.
pub struct CorridorRule {
    corridor: Corridor,
    threshold_m: f64,
}

impl CorridorRule {
    pub fn new(corridor: Corridor, threshold_m: f64) -> Self {
        Self {
            corridor,
            threshold_m,
        }
    }
}

impl TerrainRule for CorridorRule {
    fn name(&self) -> &str {
        match self.corridor {
            Corridor::River => "hydrology",
            Corridor::Rail => "rail",
            Corridor::Road => "road",
        }
    }

    fn apply(&self, cell: &CellContext<'_>, acc: &mut Classification) {
        if acc.corridor_matched {
            return;
        }
        let lines = match self.corridor {
            Corridor::River => &cell.layers.river,
            Corridor::Rail => &cell.layers.rail,
            Corridor::Road => &cell.layers.roads,
        };
        if distance_to_polylines(cell.center, lines) >= self.threshold_m {
            return;
        }
        acc.corridor_matched = true;
        let profile = &mut acc.profile;
        match self.corridor {
            Corridor::River => {
                *profile = TerrainProfile {
                    terrain: TerrainClass::River,
                    move_cost: 99,
                    cover: 0,
                    los_block: false,
                    supply: false,
                };
            }
            Corridor::Rail => {
                profile.terrain = TerrainClass::Rail;
                profile.move_cost = 1;
                profile.cover = 1;
            }
            Corridor::Road => {
                profile.terrain = TerrainClass::Road;
                profile.move_cost = 1;
            }
        }
    }
}

/// First containing industrial ring wins; overrides any corridor.
pub struct IndustryRule;

impl TerrainRule for IndustryRule {
    fn name(&self) -> &str {
        "industry"
    }

    fn apply(&self, cell: &CellContext<'_>, acc: &mut Classification) {
        if cell
            .layers
            .industrial
            .iter()
            .any(|ring| point_in_polygon(cell.center, ring))
        {
            let profile = &mut acc.profile;
            profile.terrain = TerrainClass::Industry;
            profile.move_cost = 2;
            profile.cover = 3;
            profile.los_block = true;
        }
    }
}

/// Every nearby high sample applies; cover keeps the maximum seen.
pub struct HillRule {
    radius_m: f64,
    min_elevation_m: f64,
}

impl HillRule {
    pub fn new(radius_m: f64, min_elevation_m: f64) -> Self {
        Self {
            radius_m,
            min_elevation_m,
        }
    }
}

impl TerrainRule for HillRule {
    fn name(&self) -> &str {
        "hill"
    }

    fn apply(&self, cell: &CellContext<'_>, acc: &mut Classification) {
        let profile = &mut acc.profile;
        for sample in &cell.layers.elevations {
            if cell.center.distance(sample.point) < self.radius_m
                && sample.elevation_m >= self.min_elevation_m
            {
                profile.terrain = TerrainClass::Hill;
                profile.move_cost = 2;
                profile.cover = profile.cover.max(2);
                profile.los_block = true;
            }
        }
    }
}

pub struct Classifier {
    rules: Vec<Box<dyn TerrainRule>>,
}

impl Classifier {
    /// The standard river, rail, road, industry, hill chain.
    pub fn standard(thresholds: &Thresholds) -> Self {
        ClassifierBuilder::new()
            .with_rule(CorridorRule::new(Corridor::River, thresholds.river_m))
            .with_rule(CorridorRule::new(Corridor::Rail, thresholds.rail_m))
            .with_rule(CorridorRule::new(Corridor::Road, thresholds.road_m))
            .with_rule(IndustryRule)
            .with_rule(HillRule::new(
                thresholds.hill_radius_m,
                thresholds.hill_min_elevation_m,
            ))
            .build()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn classify(&self, center: PlanarPoint, layers: &PlanarLayers) -> TerrainProfile {
        let cell = CellContext { center, layers };
        let mut acc = Classification::default();
        for rule in &self.rules {
            rule.apply(&cell, &mut acc);
        }
        acc.profile
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard(&Thresholds::default())
    }
}

#[derive(Default)]
pub struct ClassifierBuilder {
    rules: Vec<Box<dyn TerrainRule>>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl TerrainRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn build(self) -> Classifier {
        Classifier { rules: self.rules }
    }
}
