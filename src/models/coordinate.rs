//! Planar input coordinates and query polygon construction.

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// A vertex in projected map units (not lat/lon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.x, y: c.y }
    }
}

/// Why a coordinate sequence could not become a ring
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RingError {
    #[error("vertex {index} has a non-finite ordinate ({x}, {y})")]
    NonFinite { index: usize, x: f64, y: f64 },

    #[error("ring has only {distinct} distinct vertices, at least 3 are required")]
    TooFewDistinct { distinct: usize },
}

/// Build a closed polygon ring from vertices in the given order.
///
/// The ring is closed implicitly; a caller-supplied closing vertex is kept
/// as-is. Self-intersection is not checked.
pub fn build_ring(coordinates: &[Coordinate]) -> Result<Polygon<f64>, RingError> {
    if let Some((index, c)) = coordinates.iter().enumerate().find(|(_, c)| !c.is_finite()) {
        return Err(RingError::NonFinite {
            index,
            x: c.x,
            y: c.y,
        });
    }

    let mut distinct: Vec<Coordinate> = Vec::with_capacity(coordinates.len());
    for c in coordinates {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(RingError::TooFewDistinct {
            distinct: distinct.len(),
        });
    }

    let ring: Vec<Coord<f64>> = coordinates.iter().map(|&c| c.into()).collect();
    // LineString closing is done by Polygon::new
    Ok(Polygon::new(LineString::new(ring), vec![]))
}
