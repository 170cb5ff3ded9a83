//! Spatial relation evaluator.
//!
//! Builds the query polygon from caller coordinates, then tests it against
//! every layer in a fresh catalog scan. A layer that fails to load is
//! reported as not-found; only query polygon failures abort the request.

use std::path::{Path, PathBuf};
use std::time::Instant;

use geo::Polygon;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{LayerCatalog, LayerEntry, DEFAULT_EXTENSION, DEFAULT_LAYERS_DIR};
use crate::geometry::{read_layer, LayerIndex, LayerLoadError};
use crate::models::{build_ring, Coordinate, RingError, Verdict, VerdictMap};

/// Errors fatal to a whole evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("Need at least 3 coordinates to form a polygon, got {count}")]
    InsufficientVertices { count: usize },

    #[error("Invalid coordinates for polygon: {0}")]
    InvalidPolygon(#[from] RingError),
}

/// A layer that could not be evaluated
#[derive(Debug, Clone, Serialize)]
pub struct LayerFailure {
    pub layer: String,
    pub message: String,
}

/// Result of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    #[serde(rename = "textualData")]
    pub verdicts: VerdictMap,
    pub coordinates: Vec<Coordinate>,
    #[serde(rename = "layerErrors", skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<LayerFailure>,
}

/// Stateless evaluator over a layer storage root
#[derive(Debug, Clone)]
pub struct Evaluator {
    layers_dir: PathBuf,
    extension: String,
    parallel: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_LAYERS_DIR)
    }
}

impl Evaluator {
    pub fn new<P: Into<PathBuf>>(layers_dir: P) -> Self {
        Self {
            layers_dir: layers_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            parallel: true,
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn layers_dir(&self) -> &Path {
        &self.layers_dir
    }

    /// Fresh catalog of the storage root
    pub fn catalog(&self) -> LayerCatalog {
        LayerCatalog::scan(&self.layers_dir, &self.extension)
    }

    /// Names of the currently available layers, in catalog order
    pub fn list_layers(&self) -> Vec<String> {
        self.catalog().names()
    }

    /// Test the polygon described by `coordinates` against every layer
    pub fn evaluate(&self, coordinates: &[Coordinate]) -> Result<Evaluation, EvaluateError> {
        let query = query_polygon(coordinates)?;
        let catalog = self.catalog();
        let start = Instant::now();

        let outcomes: Vec<(Verdict, Option<LayerFailure>)> = if self.parallel {
            catalog
                .entries()
                .par_iter()
                .map(|entry| evaluate_entry(entry, &query))
                .collect()
        } else {
            catalog
                .entries()
                .iter()
                .map(|entry| evaluate_entry(entry, &query))
                .collect()
        };

        let mut verdicts = VerdictMap::new();
        let mut failures = Vec::new();
        for (entry, (verdict, failure)) in catalog.entries().iter().zip(outcomes) {
            verdicts.push(entry.name.clone(), verdict);
            failures.extend(failure);
        }

        info!(
            "Evaluated {} layers ({} found, {} failed) in {:?}",
            verdicts.len(),
            verdicts.iter().filter(|(_, v)| v.is_found()).count(),
            failures.len(),
            start.elapsed()
        );

        Ok(Evaluation {
            verdicts,
            coordinates: coordinates.to_vec(),
            failures,
        })
    }
}

/// Build the query polygon, enforcing the vertex count first
pub fn query_polygon(coordinates: &[Coordinate]) -> Result<Polygon<f64>, EvaluateError> {
    if coordinates.len() < 3 {
        return Err(EvaluateError::InsufficientVertices {
            count: coordinates.len(),
        });
    }
    Ok(build_ring(coordinates)?)
}

/// Evaluate one layer against the query polygon
pub fn evaluate_layer(path: &Path, query: &Polygon<f64>) -> Result<Verdict, LayerLoadError> {
    let geometries = read_layer(path)?;
    let index = LayerIndex::build(geometries);
    Ok(Verdict::from_found(index.any_relates(query)))
}

fn evaluate_entry(entry: &LayerEntry, query: &Polygon<f64>) -> (Verdict, Option<LayerFailure>) {
    match evaluate_layer(&entry.path, query) {
        Ok(verdict) => {
            debug!("Layer {}: {}", entry.name, verdict);
            (verdict, None)
        }
        Err(e) => {
            warn!("Error processing layer {}: {}", entry.name, e);
            (
                Verdict::NotFound,
                Some(LayerFailure {
                    layer: entry.name.clone(),
                    message: e.to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn square_coords(min: f64, max: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(min, min),
            Coordinate::new(min, max),
            Coordinate::new(max, max),
            Coordinate::new(max, min),
        ]
    }

    fn ring_json(coords: &[(f64, f64)]) -> String {
        let mut pts: Vec<String> = coords.iter().map(|(x, y)| format!("[{x},{y}]")).collect();
        pts.push(pts[0].clone());
        format!("[[{}]]", pts.join(","))
    }

    fn square_json(min: f64, max: f64) -> String {
        ring_json(&[(min, min), (min, max), (max, max), (max, min)])
    }

    fn circle_json(cx: f64, cy: f64, r: f64) -> String {
        let pts: Vec<(f64, f64)> = (0..32)
            .map(|i| {
                let a = i as f64 / 32.0 * std::f64::consts::TAU;
                (cx + r * a.cos(), cy + r * a.sin())
            })
            .collect();
        ring_json(&pts)
    }

    fn write_layer(dir: &Path, file_name: &str, polygon_rings: &[String]) {
        let features: Vec<String> = polygon_rings
            .iter()
            .map(|rings| {
                format!(
                    r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":{rings}}}}}"#
                )
            })
            .collect();
        let doc = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        );
        fs::write(dir.join(file_name), doc).unwrap();
    }

    #[test]
    fn test_insufficient_vertices() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = Evaluator::new(dir.path());
        for n in 0..3 {
            let coords = &square_coords(0.0, 10.0)[..n];
            let err = evaluator.evaluate(coords).unwrap_err();
            assert!(matches!(err, EvaluateError::InsufficientVertices { count } if count == n));
        }
    }

    #[test]
    fn test_invalid_polygon_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "a.geojson", &[square_json(0.0, 1.0)]);
        let coords = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, f64::INFINITY),
        ];
        let err = Evaluator::new(dir.path()).evaluate(&coords).unwrap_err();
        assert!(matches!(err, EvaluateError::InvalidPolygon(_)));
    }

    #[test]
    fn test_empty_catalog_is_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let evaluation = Evaluator::new(dir.path())
            .evaluate(&square_coords(0.0, 10.0))
            .unwrap();
        assert!(evaluation.verdicts.is_empty());
        assert!(evaluation.failures.is_empty());
        assert_eq!(evaluation.coordinates, square_coords(0.0, 10.0));
    }

    #[test]
    fn test_contained_disjoint_and_equal() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "buffer.geojson", &[circle_json(5.0, 5.0, 1.0)]);
        write_layer(dir.path(), "far away.geojson", &[square_json(100.0, 110.0)]);
        write_layer(dir.path(), "same.geojson", &[square_json(0.0, 10.0)]);
        write_layer(
            dir.path(),
            "mixed.geojson",
            &[square_json(100.0, 110.0), square_json(-5.0, 20.0)],
        );

        let evaluation = Evaluator::new(dir.path())
            .evaluate(&square_coords(0.0, 10.0))
            .unwrap();
        let v = &evaluation.verdicts;
        assert_eq!(v.get("buffer"), Some(Verdict::Found));
        assert_eq!(v.get("far_away"), Some(Verdict::NotFound));
        assert_eq!(v.get("same"), Some(Verdict::Found));
        assert_eq!(v.get("mixed"), Some(Verdict::Found));
        assert_eq!(
            v.names().collect::<Vec<_>>(),
            vec!["buffer", "far_away", "mixed", "same"]
        );
    }

    #[test]
    fn test_corrupt_layer_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "a.geojson", &[square_json(2.0, 3.0)]);
        fs::write(dir.path().join("b.geojson"), "{\"type\": \"FeatureColl").unwrap();
        write_layer(dir.path(), "c.geojson", &[square_json(50.0, 60.0)]);

        let evaluation = Evaluator::new(dir.path())
            .evaluate(&square_coords(0.0, 10.0))
            .unwrap();
        assert_eq!(evaluation.verdicts.len(), 3);
        assert_eq!(evaluation.verdicts.get("a"), Some(Verdict::Found));
        assert_eq!(evaluation.verdicts.get("b"), Some(Verdict::NotFound));
        assert_eq!(evaluation.verdicts.get("c"), Some(Verdict::NotFound));
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].layer, "b");
    }

    #[test]
    fn test_idempotent_and_sequential_matches_parallel() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            let offset = i as f64 * 6.0;
            write_layer(
                dir.path(),
                &format!("layer {i}.geojson"),
                &[square_json(offset, offset + 1.0)],
            );
        }
        let coords = square_coords(0.0, 20.0);
        let parallel = Evaluator::new(dir.path());
        let first = parallel.evaluate(&coords).unwrap();
        let second = parallel.evaluate(&coords).unwrap();
        let sequential = Evaluator::new(dir.path())
            .with_parallel(false)
            .evaluate(&coords)
            .unwrap();

        assert_eq!(first.verdicts, second.verdicts);
        assert_eq!(first.verdicts, sequential.verdicts);
        assert_eq!(first.verdicts.iter().filter(|(_, v)| v.is_found()).count(), 4);
    }

    #[test]
    fn test_serialized_shape() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "zone.geojson", &[square_json(1.0, 2.0)]);
        let evaluation = Evaluator::new(dir.path())
            .evaluate(&square_coords(0.0, 10.0))
            .unwrap();
        let json = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(json["textualData"]["zone"], "OUI");
        assert_eq!(json["coordinates"][1]["y"], 10.0);
        assert!(json.get("layerErrors").is_none());
    }

    #[test]
    fn test_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "zone.json", &[square_json(1.0, 2.0)]);
        write_layer(dir.path(), "other.geojson", &[square_json(1.0, 2.0)]);
        let evaluator = Evaluator::new(dir.path()).with_extension(".json");
        assert_eq!(evaluator.list_layers(), vec!["zone"]);
    }
}
