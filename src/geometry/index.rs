//! Envelope index over the geometries of one layer.

use geo::{BoundingRect, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use super::{LayerGeometry, SpatialRelation};

/// Wrapper for R-tree indexing of layer geometries
#[derive(Debug, Clone)]
pub struct IndexedGeometry {
    pub geometry: LayerGeometry,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedGeometry {
    pub fn new(geometry: LayerGeometry) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
            geometry,
        })
    }
}

/// Spatial index for the geometries of a single layer
pub struct LayerIndex {
    tree: RTree<IndexedGeometry>,
}

impl LayerIndex {
    pub fn build(geometries: Vec<LayerGeometry>) -> Self {
        let indexed: Vec<IndexedGeometry> = geometries
            .into_iter()
            .filter_map(IndexedGeometry::new)
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    /// Whether any geometry relates to the query.
    ///
    /// Candidates come from envelope intersection; each predicate branch
    /// implies overlapping envelopes, so nothing is lost by the prefilter.
    pub fn any_relates(&self, query: &Polygon<f64>) -> bool {
        let rect = match query.bounding_rect() {
            Some(r) => r,
            None => return false,
        };
        let query_envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .any(|ig| ig.geometry.relates_to(query))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
