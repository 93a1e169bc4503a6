//! Nearest-node lookup backed by an R\*-tree.

use geo::Coord;
use rstar::RTree;
use rstar::primitives::GeomWithData;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Spatial index mapping coordinates to node positions.
///
/// Distances are planar in degree space, so results agree with the
/// coordinate-space heuristics used by the searches. Equidistant candidates
/// resolve to the lowest node position, keeping lookups deterministic.
#[derive(Debug, Clone, Default)]
pub struct NodeLocator {
    tree: RTree<IndexedPoint>,
}

impl NodeLocator {
    /// Bulk-load the index from `(position, coordinate)` pairs.
    pub fn new<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (usize, Coord<f64>)>,
    {
        let entries = points
            .into_iter()
            .map(|(idx, c)| GeomWithData::new([c.x, c.y], idx))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Position of the node closest to `coord`, or `None` for an empty index
    /// or a non-finite coordinate.
    #[must_use]
    pub fn nearest(&self, coord: Coord<f64>) -> Option<usize> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return None;
        }
        let query = [coord.x, coord.y];
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = candidates.next()?;
        let tied = candidates
            .take_while(|(_, d2)| *d2 <= best_d2)
            .map(|(p, _)| p.data);
        Some(tied.fold(first.data, usize::min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn grid() -> NodeLocator {
        NodeLocator::new([
            (0, Coord { x: 0.0, y: 0.0 }),
            (1, Coord { x: 1.0, y: 0.0 }),
            (2, Coord { x: 0.0, y: 1.0 }),
            (3, Coord { x: 1.0, y: 1.0 }),
        ])
    }

    #[rstest]
    #[case(Coord { x: 0.1, y: 0.1 }, 0)]
    #[case(Coord { x: 0.9, y: 0.2 }, 1)]
    #[case(Coord { x: 5.0, y: 5.0 }, 3)]
    #[case(Coord { x: -100.0, y: 40.0 }, 2)]
    fn resolves_closest_node(#[case] query: Coord<f64>, #[case] expected: usize) {
        assert_eq!(grid().nearest(query), Some(expected));
    }

    #[rstest]
    fn ties_resolve_to_lowest_position() {
        assert_eq!(grid().nearest(Coord { x: 0.5, y: 0.5 }), Some(0));
    }

    #[rstest]
    fn empty_and_non_finite_queries_return_none() {
        assert_eq!(NodeLocator::default().nearest(Coord { x: 0.0, y: 0.0 }), None);
        assert_eq!(grid().nearest(Coord { x: f64::NAN, y: 0.0 }), None);
    }
}
