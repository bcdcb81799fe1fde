pub mod config;
pub mod error;
pub mod external;
pub mod geometry;
pub mod grid;
pub mod layers;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod terrain;

pub use config::{BoundingBox, PipelineConfig};
pub use grid::{HexCell, HexGrid};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use terrain::{Classifier, TerrainClass, TerrainProfile};
