//! GeoJSON writer for generated hex grids.

use std::{fs, path::Path};

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::{
    error::OutputError,
    grid::{HexCell, HexGrid},
};

/// Cell identity followed by its terrain profile.
fn hex_properties(cell: &HexCell) -> Result<JsonObject, serde_json::Error> {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), cell.id().into());
    properties.insert("q".to_string(), cell.coord.q.into());
    properties.insert("r".to_string(), cell.coord.r.into());
    properties.insert("hex_size_m".to_string(), cell.hex_size_m.into());
    if let JsonValue::Object(profile) = serde_json::to_value(cell.profile)? {
        properties.extend(profile);
    }
    Ok(properties)
}

fn hex_feature(cell: &HexCell) -> Result<Feature, serde_json::Error> {
    let ring = cell
        .corners
        .iter()
        .map(|&(lon, lat)| vec![lon, lat])
        .collect();
    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(hex_properties(cell)?),
        foreign_members: None,
    })
}

pub fn grid_collection(grid: &HexGrid) -> Result<FeatureCollection, serde_json::Error> {
    Ok(FeatureCollection {
        bbox: None,
        features: grid
            .cells
            .iter()
            .map(hex_feature)
            .collect::<Result<_, _>>()?,
        foreign_members: None,
    })
}

pub fn to_geojson(grid: &HexGrid) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(&grid_collection(grid)?)?)
}

/// Writes the grid, creating parent directories as needed.
pub fn write_grid(grid: &HexGrid, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_geojson(grid)?)?;
    Ok(())
}
