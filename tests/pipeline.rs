use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tempfile::tempdir;
use wargrid::{
    config::{ConfigLoader, PipelineConfig},
    external::{CommandRunner, Fetcher, TileBuildOutcome},
    pipeline::{Pipeline, PipelineBuilder},
    TerrainClass,
};

struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(anyhow!("no network for {url}"))
    }
}

struct ManifestFetcher;

impl Fetcher for ManifestFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(br#"{"@context": "http://iiif.io/api/presentation/3/context.json"}"#.to_vec())
    }
}

#[derive(Clone, Default)]
struct FakeTiler {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl CommandRunner for FakeTiler {
    fn run(&self, _program: &str, args: &[String]) -> io::Result<Option<i32>> {
        self.calls.borrow_mut().push(args.to_vec());
        Ok(Some(0))
    }
}

struct NoTiler;

impl CommandRunner for NoTiler {
    fn run(&self, _program: &str, _args: &[String]) -> io::Result<Option<i32>> {
        Err(io::Error::from(io::ErrorKind::NotFound))
    }
}

fn collection(features: Vec<Value>) -> String {
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

fn line(coords: &[[f64; 2]]) -> Value {
    json!({"type": "Feature", "properties": {},
           "geometry": {"type": "LineString", "coordinates": coords}})
}

fn write_layer(dir: &Path, name: &str, features: Vec<Value>) {
    fs::write(dir.join(name), collection(features)).unwrap();
}

/// River along lon 44.5, a road along lat 48.68, a factory district straddling
/// the river and a high point in the east.
fn seed_layers(root: &Path) {
    let vector = root.join("data/vector");
    fs::create_dir_all(&vector).unwrap();
    write_layer(&vector, "river.geojson", vec![line(&[[44.5, 48.6], [44.5, 48.8]])]);
    write_layer(&vector, "roads.geojson", vec![line(&[[44.43, 48.68], [44.62, 48.68]])]);
    write_layer(
        &vector,
        "industrial_zones.geojson",
        vec![json!({"type": "Feature", "properties": {"name": "Factory district"},
            "geometry": {"type": "Polygon", "coordinates": [[
                [44.49, 48.70], [44.51, 48.70], [44.51, 48.72], [44.49, 48.72], [44.49, 48.70]
            ]]}})],
    );
    write_layer(
        &vector,
        "elevation_points.geojson",
        vec![
            json!({"type": "Feature", "properties": {"elevation_m": 150.0},
                   "geometry": {"type": "Point", "coordinates": [44.58, 48.72]}}),
            json!({"type": "Feature", "properties": {"elevation_m": 200.0},
                   "geometry": {"type": "Point", "coordinates": [44.58, 48.721]}}),
            json!({"type": "Feature", "properties": {},
                   "geometry": {"type": "Point", "coordinates": [44.45, 48.70]}}),
        ],
    );
}

fn config_for(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.paths = config.paths.rooted_at(root);
    config
}

fn pipeline(root: &Path) -> Pipeline {
    PipelineBuilder::new(config_for(root))
        .with_fetcher(OfflineFetcher)
        .with_runner(NoTiler)
        .build()
        .expect("pipeline builds")
}

fn read_features(path: &Path) -> Vec<Value> {
    let json: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    json["features"].as_array().unwrap().clone()
}

#[test]
fn generates_classified_grid_from_layers() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let report = pipeline(temp.path()).generate_hex(500.0).unwrap();

    assert_eq!(
        report.path,
        temp.path().join("data/hex/stalingrad_hex_500m.geojson")
    );
    let features = read_features(&report.path);
    assert_eq!(features.len(), report.summary.cell_count);
    assert!((600..750).contains(&features.len()));

    let summary = &report.summary;
    assert!(summary.count(TerrainClass::River) > 0);
    assert!(summary.count(TerrainClass::Road) > 0);
    assert!(summary.count(TerrainClass::Industry) > 0);
    assert_eq!(summary.count(TerrainClass::Hill), 1);
    assert_eq!(summary.count(TerrainClass::Rail), 0);
}

#[test]
fn factory_district_overrides_the_river() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let report = pipeline(temp.path()).generate_hex(500.0).unwrap();
    let features = read_features(&report.path);

    let industrial_on_river: Vec<&Value> = features
        .iter()
        .map(|f| &f["properties"])
        .filter(|p| p["terrain"] == "INDUSTRY" && p["supply"] == false)
        .collect();
    assert!(!industrial_on_river.is_empty());
    for props in industrial_on_river {
        assert_eq!(props["move_cost"], 2);
        assert_eq!(props["cover"], 3);
        assert_eq!(props["los_block"], 1);
    }
}

#[test]
fn hill_cell_carries_hill_profile() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let report = pipeline(temp.path()).generate_hex(500.0).unwrap();
    let features = read_features(&report.path);
    let hill = features
        .iter()
        .map(|f| &f["properties"])
        .find(|p| p["terrain"] == "HILL")
        .expect("one hill cell");
    assert_eq!(hill["cover"], 2);
    assert_eq!(hill["move_cost"], 2);
    assert_eq!(hill["los_block"], 1);
    assert_eq!(hill["supply"], true);
}

#[test]
fn every_feature_is_unique_and_well_formed() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let report = pipeline(temp.path()).generate_hex(1_000.0).unwrap();
    let features = read_features(&report.path);

    let mut ids = std::collections::HashSet::new();
    for feature in &features {
        let props = &feature["properties"];
        let id = props["id"].as_str().unwrap().to_string();
        assert_eq!(id, format!("H_{}_{}", props["q"], props["r"]));
        assert_eq!(props["hex_size_m"], 1_000.0);
        assert!(ids.insert(id));
        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 7);
        assert_eq!(ring[0], ring[6]);
    }
}

#[test]
fn generation_needs_no_network_client() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let pipeline = PipelineBuilder::new(config_for(temp.path()))
        .with_runner(NoTiler)
        .build()
        .unwrap();
    let report = pipeline.generate_hex(1_000.0).unwrap();
    assert!(report.path.is_file());
    assert!(!pipeline.config().manifest_path().exists());
}

#[test]
fn missing_layers_produce_an_all_steppe_grid() {
    let temp = tempdir().unwrap();
    let report = pipeline(temp.path()).generate_hex(1_000.0).unwrap();
    assert!(report.summary.cell_count > 0);
    assert_eq!(
        report.summary.count(TerrainClass::Steppe),
        report.summary.cell_count
    );
}

#[test]
fn corrupt_layer_fails_generation() {
    let temp = tempdir().unwrap();
    let vector = temp.path().join("data/vector");
    fs::create_dir_all(&vector).unwrap();
    fs::write(vector.join("roads.geojson"), "{ not geojson").unwrap();
    assert!(pipeline(temp.path()).generate_hex(500.0).is_err());
}

#[test]
fn invalid_hex_size_is_rejected() {
    let temp = tempdir().unwrap();
    assert!(pipeline(temp.path()).generate_hex(0.0).is_err());
    assert!(pipeline(temp.path()).generate_hex(-5.0).is_err());
}

#[test]
fn run_all_survives_offline_manifest() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let pipeline = pipeline(temp.path());
    let report = pipeline.run_all(1_000.0).unwrap();
    assert!(report.path.exists());
    assert!(!pipeline.config().manifest_path().exists());
}

#[test]
fn fetch_manifest_writes_into_raster_dir() {
    let temp = tempdir().unwrap();
    let pipeline = PipelineBuilder::new(config_for(temp.path()))
        .with_fetcher(ManifestFetcher)
        .with_runner(NoTiler)
        .build()
        .unwrap();
    assert!(pipeline.fetch_manifest());
    let stored = fs::read_to_string(
        temp.path()
            .join("data/rasters/loc_stalingrad_south_manifest.json"),
    )
    .unwrap();
    assert!(stored.contains("iiif.io"));
}

#[test]
fn build_tiles_reports_missing_tool() {
    let temp = tempdir().unwrap();
    let outcome = pipeline(temp.path()).build_tiles(Path::new("south.tif"));
    assert_eq!(outcome, TileBuildOutcome::ToolMissing);
}

#[test]
fn build_tiles_passes_configured_zoom() {
    let temp = tempdir().unwrap();
    let tiler = FakeTiler::default();
    let mut config =
        ConfigLoader::parse("tiles:\n  zoom: \"10-14\"\n  processes: 2\n").unwrap();
    config.paths = config.paths.rooted_at(temp.path());
    let pipeline = PipelineBuilder::new(config)
        .with_fetcher(OfflineFetcher)
        .with_runner(tiler.clone())
        .build()
        .unwrap();

    let outcome = pipeline.build_tiles(Path::new("south.tif"));
    let out_dir: PathBuf = temp.path().join("data/tiles/stalingrad_south_xyz");
    assert_eq!(outcome, TileBuildOutcome::Built(out_dir.clone()));
    let calls = tiler.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&"--processes=2".to_string()));
    assert!(calls[0].contains(&"10-14".to_string()));
}

#[test]
fn configured_thresholds_change_classification() {
    let temp = tempdir().unwrap();
    seed_layers(temp.path());
    let config_path = temp.path().join("grid.yaml");
    fs::write(&config_path, "thresholds:\n  river_m: 1\n  road_m: 1\n").unwrap();
    let mut config = ConfigLoader::new(temp.path()).load("grid.yaml").unwrap();
    config.paths = config.paths.rooted_at(temp.path());
    let report = PipelineBuilder::new(config)
        .with_fetcher(OfflineFetcher)
        .with_runner(NoTiler)
        .build()
        .unwrap()
        .generate_hex(500.0)
        .unwrap();
    assert_eq!(report.summary.count(TerrainClass::Road), 0);
    assert_eq!(report.summary.count(TerrainClass::River), 0);
}
