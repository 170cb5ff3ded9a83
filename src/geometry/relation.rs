//! Reference geometries and the spatial relation capability.

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Polygon, Rect, Relate};

/// Spatial predicates evaluated against a query polygon.
pub trait SpatialRelation {
    /// Any shared point, boundary touch included.
    fn intersects(&self, query: &Polygon<f64>) -> bool;

    /// `self` contains the query.
    fn contains(&self, query: &Polygon<f64>) -> bool;

    /// The query contains `self`.
    fn contained_by(&self, query: &Polygon<f64>) -> bool;

    /// Overlap, touch, or containment in either direction.
    fn relates_to(&self, query: &Polygon<f64>) -> bool {
        self.intersects(query) || self.contains(query) || self.contained_by(query)
    }
}

/// A single geometry loaded from a layer file
#[derive(Debug, Clone, PartialEq)]
pub enum LayerGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl LayerGeometry {
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            LayerGeometry::Polygon(p) => p.bounding_rect(),
            LayerGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }
}

impl From<Polygon<f64>> for LayerGeometry {
    fn from(p: Polygon<f64>) -> Self {
        LayerGeometry::Polygon(p)
    }
}

impl From<MultiPolygon<f64>> for LayerGeometry {
    fn from(mp: MultiPolygon<f64>) -> Self {
        LayerGeometry::MultiPolygon(mp)
    }
}

impl SpatialRelation for LayerGeometry {
    fn intersects(&self, query: &Polygon<f64>) -> bool {
        match self {
            LayerGeometry::Polygon(p) => p.intersects(query),
            LayerGeometry::MultiPolygon(mp) => mp.iter().any(|p| p.intersects(query)),
        }
    }

    fn contains(&self, query: &Polygon<f64>) -> bool {
        match self {
            LayerGeometry::Polygon(p) => Contains::contains(p, query),
            // The query may span several members that share edges
            LayerGeometry::MultiPolygon(mp) => mp.relate(query).is_contains(),
        }
    }

    fn contained_by(&self, query: &Polygon<f64>) -> bool {
        match self {
            LayerGeometry::Polygon(p) => Contains::contains(query, p),
            LayerGeometry::MultiPolygon(mp) => query.relate(mp).is_contains(),
        }
    }
}
