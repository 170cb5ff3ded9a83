//! Reference layer geometries: loading, indexing, and spatial predicates.

mod geojson;
mod index;
mod relation;

pub use geojson::{read_layer, LayerLoadError};
pub use index::LayerIndex;
pub use relation::{LayerGeometry, SpatialRelation};
