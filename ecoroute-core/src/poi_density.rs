//! Annotate road segments with the number of nearby points of interest.

use geo::Coord;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::geodesy::{METRES_PER_DEGREE, planar_segment_distance};
use crate::network::RoadNetwork;
use crate::poi::PointOfInterest;

type IndexedPoi = GeomWithData<[f64; 2], u64>;

/// Count, for every edge, the points of interest within `buffer_m` of its
/// straight segment.
///
/// The result is aligned with [`RoadNetwork::edges`]. Distances are taken in
/// degree space and converted at [`METRES_PER_DEGREE`].
#[must_use]
pub fn count_pois_per_edge(network: &RoadNetwork, pois: &[PointOfInterest], buffer_m: f64) -> Vec<u32> {
    let tree: RTree<IndexedPoi> = RTree::bulk_load(
        pois.iter()
            .filter(|p| p.location.x.is_finite() && p.location.y.is_finite())
            .map(|p| GeomWithData::new([p.location.x, p.location.y], p.id))
            .collect(),
    );
    let buffer_m = buffer_m.max(0.0);
    let margin = buffer_m / METRES_PER_DEGREE;

    network
        .edges()
        .iter()
        .map(|edge| {
            let (Some(from), Some(to)) = (network.node(edge.source), network.node(edge.target))
            else {
                return 0;
            };
            let (a, b) = (from.location, to.location);
            let envelope = AABB::from_corners(
                [a.x.min(b.x) - margin, a.y.min(b.y) - margin],
                [a.x.max(b.x) + margin, a.y.max(b.y) + margin],
            );
            let hits = tree
                .locate_in_envelope_intersecting(&envelope)
                .filter(|p| {
                    let at = Coord {
                        x: p.geom()[0],
                        y: p.geom()[1],
                    };
                    planar_segment_distance(at, a, b) * METRES_PER_DEGREE <= buffer_m
                })
                .count();
            u32::try_from(hits).unwrap_or(u32::MAX)
        })
        .collect()
}

/// Copy of `network` whose edges carry fresh POI counts.
///
/// Re-running with the same inputs produces the same network.
#[must_use]
pub fn annotate_poi_counts(
    network: &RoadNetwork,
    pois: &[PointOfInterest],
    buffer_m: f64,
) -> RoadNetwork {
    let counts = count_pois_per_edge(network, pois, buffer_m);
    let annotated = counts.iter().filter(|&&c| c > 0).count();
    log::info!(
        "annotated {annotated} of {} edges with nearby points of interest",
        counts.len()
    );
    network.with_poi_counts(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::three_node_path;
    use rstest::rstest;

    fn at(id: u64, lon: f64, lat: f64) -> PointOfInterest {
        PointOfInterest::with_empty_tags(id, Coord { x: lon, y: lat })
    }

    #[rstest]
    fn counts_points_near_each_segment() {
        let network = three_node_path();
        let pois = [at(1, 0.005, 0.001), at(2, 0.006, -0.002), at(3, 0.015, 0.0), at(4, 0.5, 0.5)];
        assert_eq!(count_pois_per_edge(&network, &pois, 300.0), vec![2, 1]);
    }

    #[rstest]
    fn annotation_is_repeatable() {
        let network = three_node_path();
        let pois = [at(1, 0.005, 0.0)];
        let once = annotate_poi_counts(&network, &pois, 100.0);
        let twice = annotate_poi_counts(&once, &pois, 100.0);
        assert_eq!(once.edges(), twice.edges());
        assert_eq!(once.edges()[0].poi_count, 1);
        assert_eq!(once.edges()[1].poi_count, 0);
    }
}
