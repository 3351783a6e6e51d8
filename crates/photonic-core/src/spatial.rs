use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Edge, Polygon};

/// An edge in the R-tree, tagged with the polygon it came from.
#[derive(Debug, Clone)]
pub struct EdgeEntry {
    /// Index into the polygon slice the index was built from.
    pub polygon_index: usize,
    pub edge: Edge,
}

impl RTreeObject for EdgeEntry {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let bbox = self.edge.bbox();
        AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
    }
}

/// Edge index for interaction queries between polygons and query segments.
pub struct EdgeIndex {
    tree: RTree<EdgeEntry>,
}

impl EdgeIndex {
    /// Index every hull and hole edge of the given polygons.
    pub fn build(polygons: &[Polygon]) -> Self {
        let entries = polygons
            .iter()
            .enumerate()
            .flat_map(|(i, p)| {
                p.edges().into_iter().map(move |edge| EdgeEntry {
                    polygon_index: i,
                    edge,
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Edges whose bounding box intersects `bbox`.
    fn query_bbox(&self, bbox: &BBox) -> Vec<&EdgeEntry> {
        let envelope = AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Edges that share at least one point with `segment`.
    pub fn touching(&self, segment: &Edge) -> Vec<&EdgeEntry> {
        self.query_bbox(&segment.bbox())
            .into_iter()
            .filter(|e| e.edge.touches(segment))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_edge_index_queries() {
        let polygons = vec![Polygon::rect(0, 0, 10, 10), Polygon::rect(20, 20, 30, 30)];
        let index = EdgeIndex::build(&polygons);
        assert_eq!(index.tree.size(), 8);

        let viewport = BBox::new(Point::new(-5, -5), Point::new(15, 15));
        let hits = index.query_bbox(&viewport);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|e| e.polygon_index == 0));

        let far = BBox::new(Point::new(25, 31), Point::new(40, 40));
        assert!(index.query_bbox(&far).is_empty());
    }

    #[test]
    fn test_touching_edges() {
        let polygons = vec![Polygon::rect(0, 0, 10, 10)];
        let index = EdgeIndex::build(&polygons);
        let segment = Edge::new(Point::new(10, 5), Point::new(20, 5));
        let hits = index.touching(&segment);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].edge, Edge::new(Point::new(10, 0), Point::new(10, 10)));

        let miss = Edge::new(Point::new(11, 5), Point::new(20, 5));
        assert!(index.touching(&miss).is_empty());
    }
}
