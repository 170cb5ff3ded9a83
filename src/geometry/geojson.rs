//! GeoJSON layer file reader.
//!
//! Only areal geometries are kept. Points and lines are skipped since the
//! relation test is defined over polygons.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::LayerGeometry;

/// Failure to read one layer file
#[derive(Debug, thiserror::Error)]
pub enum LayerLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid geometry in {path}: {reason}")]
    InvalidGeometry { path: PathBuf, reason: String },
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<GeometryObject>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryObject {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeometryObject>,
    },
    #[serde(other)]
    Other,
}

/// Read every areal geometry from a GeoJSON file
pub fn read_layer(path: &Path) -> Result<Vec<LayerGeometry>, LayerLoadError> {
    let file = File::open(path).map_err(|source| LayerLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LayerLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    parse_layer(value).map_err(|e| e.at(path))
}

/// Errors before a path is attached
#[derive(Debug)]
enum ParseFailure {
    Json(serde_json::Error),
    Geometry(String),
}

impl ParseFailure {
    fn at(self, path: &Path) -> LayerLoadError {
        match self {
            ParseFailure::Json(source) => LayerLoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Geometry(reason) => LayerLoadError::InvalidGeometry {
                path: path.to_path_buf(),
                reason,
            },
        }
    }
}

fn parse_layer(value: Value) -> Result<Vec<LayerGeometry>, ParseFailure> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ParseFailure::Geometry("missing GeoJSON \"type\" member".to_string()))?;

    let objects: Vec<GeometryObject> = match kind.as_str() {
        "FeatureCollection" => {
            let fc: FeatureCollection = serde_json::from_value(value).map_err(ParseFailure::Json)?;
            fc.features.into_iter().filter_map(|f| f.geometry).collect()
        }
        "Feature" => {
            let f: Feature = serde_json::from_value(value).map_err(ParseFailure::Json)?;
            f.geometry.into_iter().collect()
        }
        _ => vec![serde_json::from_value(value).map_err(ParseFailure::Json)?],
    };

    let mut geometries = Vec::new();
    for object in objects {
        collect_geometry(object, &mut geometries)?;
    }
    Ok(geometries)
}

fn collect_geometry(
    object: GeometryObject,
    out: &mut Vec<LayerGeometry>,
) -> Result<(), ParseFailure> {
    match object {
        GeometryObject::Polygon { coordinates } => {
            if let Some(polygon) = to_polygon(coordinates)? {
                out.push(LayerGeometry::Polygon(polygon));
            }
        }
        GeometryObject::MultiPolygon { coordinates } => {
            let mut polygons = Vec::with_capacity(coordinates.len());
            for rings in coordinates {
                if let Some(polygon) = to_polygon(rings)? {
                    polygons.push(polygon);
                }
            }
            if !polygons.is_empty() {
                out.push(LayerGeometry::MultiPolygon(MultiPolygon::new(polygons)));
            }
        }
        GeometryObject::GeometryCollection { geometries } => {
            for g in geometries {
                collect_geometry(g, out)?;
            }
        }
        GeometryObject::Other => {
            debug!("Skipping non-areal geometry");
        }
    }
    Ok(())
}

fn to_polygon(rings: Vec<Vec<Position>>) -> Result<Option<Polygon<f64>>, ParseFailure> {
    let mut rings = rings.into_iter();
    let exterior = match rings.next() {
        Some(r) => to_ring(r)?,
        // Empty polygon
        None => return Ok(None),
    };
    let interiors = rings.map(to_ring).collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Polygon::new(exterior, interiors)))
}

fn to_ring(positions: Vec<Position>) -> Result<LineString<f64>, ParseFailure> {
    if positions.len() < 4 {
        return Err(ParseFailure::Geometry(format!(
            "linear ring has {} positions, at least 4 are required",
            positions.len()
        )));
    }

    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            [_, _, ..] => Err(ParseFailure::Geometry("non-finite ordinate".to_string())),
            _ => Err(ParseFailure::Geometry(format!(
                "position has {} ordinates, at least 2 are required",
                p.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SQUARE: &str = "[[[0,0],[0,1],[1,1],[1,0],[0,0]]]";

    fn parse(s: &str) -> Result<Vec<LayerGeometry>, ParseFailure> {
        parse_layer(serde_json::from_str(s).unwrap())
    }

    #[test]
    fn test_feature_collection() {
        let doc = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"nom":"a"}},"geometry":{{"type":"Polygon","coordinates":{SQUARE}}}}},
                {{"type":"Feature","properties":null,"geometry":{{"type":"MultiPolygon","coordinates":[{SQUARE},{SQUARE}]}}}},
                {{"type":"Feature","properties":{{}},"geometry":null}},
                {{"type":"Feature","properties":{{}},"geometry":{{"type":"Point","coordinates":[3,4]}}}}
            ]}}"#
        );
        let geoms = parse(&doc).unwrap();
        assert_eq!(geoms.len(), 2);
        assert!(matches!(geoms[0], LayerGeometry::Polygon(_)));
        match &geoms[1] {
            LayerGeometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_geometry_and_collection() {
        let doc = format!(r#"{{"type":"Polygon","coordinates":{SQUARE}}}"#);
        assert_eq!(parse(&doc).unwrap().len(), 1);

        let doc = format!(
            r#"{{"type":"GeometryCollection","geometries":[
                {{"type":"Polygon","coordinates":{SQUARE}}},
                {{"type":"LineString","coordinates":[[0,0],[1,1]]}}
            ]}}"#
        );
        assert_eq!(parse(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_z_ordinate_ignored_and_holes_kept() {
        let doc = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[
            [[0,0,5],[0,10,5],[10,10,5],[10,0,5],[0,0,5]],
            [[2,2],[2,3],[3,3],[3,2],[2,2]]
        ]}}"#;
        let geoms = parse(doc).unwrap();
        match &geoms[0] {
            LayerGeometry::Polygon(p) => assert_eq!(p.interiors().len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_ring_rejected() {
        let doc = r#"{"type":"Polygon","coordinates":[[[0,0],[1,1],[0,0]]]}"#;
        assert!(matches!(parse(doc), Err(ParseFailure::Geometry(_))));
    }

    #[test]
    fn test_missing_type_rejected() {
        assert!(matches!(
            parse(r#"{"features":[]}"#),
            Err(ParseFailure::Geometry(_))
        ));
    }

    #[test]
    fn test_read_layer_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.geojson");
        fs::write(&path, "{ not json").unwrap();

        let err = read_layer(&path).unwrap_err();
        assert!(matches!(err, LayerLoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.geojson"));

        let missing = dir.path().join("missing.geojson");
        assert!(matches!(
            read_layer(&missing),
            Err(LayerLoadError::Io { .. })
        ));
    }
}
