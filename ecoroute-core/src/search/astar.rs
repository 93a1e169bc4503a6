use std::time::Instant;

use super::state::{CameFrom, Frontier, reconstruct};
use super::{Algorithm, RouteSearch, SearchContext, SearchError, SearchOutcome, SearchRequest};
use crate::geodesy::haversine_m;
use crate::network::RoadNetwork;
use crate::weights::{WeightChannel, WeightTable};

/// Heuristic-guided shortest path.
///
/// The heuristic is the great-circle distance to the goal multiplied by the
/// smallest cost per straight-line metre found on any edge. That bound never
/// overestimates, whatever channel is searched, so A* agrees with
/// [`Dijkstra`](super::Dijkstra) on the optimal total.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStar;

impl RouteSearch for AStar {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AStar
    }

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let (start, goal) = ctx.endpoints(request)?;
        let network = ctx.network();
        let weights = ctx.weights();
        let channel = request.channel;
        let mut deadline = ctx.deadline(Algorithm::AStar);

        let scale = cost_per_metre(network, weights, channel);
        log::debug!("a_star heuristic scale for {channel}: {scale}");
        let goal_at = network.node_at(goal).location;
        let heuristic = |node: usize| haversine_m(network.node_at(node).location, goal_at) * scale;

        let n = network.node_count();
        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<CameFrom> = vec![None; n];
        let mut open = Frontier::default();

        g_score[start] = 0.0;
        open.push(heuristic(start), start);

        while let Some((f_score, node)) = open.pop() {
            deadline.tick()?;
            if node == goal {
                let path = reconstruct(&came_from, start, goal);
                return Ok(ctx.outcome(Algorithm::AStar, Some(path), started));
            }
            if f_score > g_score[node] + heuristic(node) {
                continue;
            }
            for &edge in network.out_edges(node) {
                let next = network.edge_target(edge);
                let tentative = g_score[node] + weights.raw(edge, channel);
                if tentative < g_score[next] {
                    g_score[next] = tentative;
                    came_from[next] = Some((node, edge));
                    open.push(tentative + heuristic(next), next);
                }
            }
        }
        Ok(ctx.outcome(Algorithm::AStar, None, started))
    }
}

/// Smallest ratio of channel cost to straight-line edge length.
///
/// Edges whose endpoints coincide are ignored; a network without any
/// measurable edge yields `0`, which degrades A* to Dijkstra.
fn cost_per_metre(network: &RoadNetwork, weights: &WeightTable, channel: WeightChannel) -> f64 {
    let mut scale = f64::INFINITY;
    for node in 0..network.node_count() {
        let from = network.node_at(node).location;
        for &edge in network.out_edges(node) {
            let to = network.node_at(network.edge_target(edge)).location;
            let span = haversine_m(from, to);
            if span > 0.0 {
                scale = scale.min(weights.raw(edge, channel) / span);
            }
        }
    }
    if scale.is_finite() { scale } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeId;
    use crate::search::{Dijkstra, RouteMetrics, SearchLimits};
    use crate::test_support::{detour_grid, disconnected_pair, grid, three_node_path};
    use crate::vehicle::ConsumptionRate;
    use geo::Coord;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(WeightChannel::Fuel)]
    #[case(WeightChannel::Length)]
    #[case(WeightChannel::Duration)]
    #[case(WeightChannel::Poi)]
    fn agrees_with_dijkstra_on_grid(#[case] channel: WeightChannel) {
        let network = detour_grid();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let request = SearchRequest::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.02, y: 0.02 },
            channel,
        );
        let a = AStar.search(&ctx, &request).expect("a*");
        let d = Dijkstra.search(&ctx, &request).expect("dijkstra");
        let total_a = RouteMetrics::channel_total(&weights, &a.route, channel);
        let total_d = RouteMetrics::channel_total(&weights, &d.route, channel);
        assert!((total_a - total_d).abs() < 1e-9, "{total_a} vs {total_d}");
    }

    #[rstest]
    fn finds_three_node_path() {
        let network = three_node_path();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let request = SearchRequest::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.02, y: 0.0 },
            WeightChannel::Duration,
        );
        let outcome = AStar.search(&ctx, &request).expect("search");
        assert_eq!(outcome.route.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert!((outcome.metrics.duration_s - 85.0).abs() < 1e-9);
    }

    #[rstest]
    fn reports_no_path_across_components() {
        let network = disconnected_pair();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let request = SearchRequest::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            WeightChannel::Length,
        );
        let outcome = AStar.search(&ctx, &request).expect("search");
        assert!(!outcome.found());
    }

    #[rstest]
    fn scale_is_zero_without_measurable_edges() {
        let network = disconnected_pair();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let empty = RoadNetwork::new(network.nodes().to_vec(), Vec::new()).expect("network");
        let empty_weights = WeightTable::assign(&empty, ConsumptionRate::FALLBACK);
        assert_eq!(cost_per_metre(&empty, &empty_weights, WeightChannel::Length), 0.0);
        assert!(cost_per_metre(&network, &weights, WeightChannel::Length) > 0.0);
    }

    #[rstest]
    fn honours_zero_timeout_on_large_grids() {
        let network = grid(60, 60);
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights)
            .expect("context")
            .with_limits(SearchLimits::with_timeout(Duration::ZERO));
        let request = SearchRequest::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.59, y: 0.59 },
            WeightChannel::Poi,
        );
        assert!(matches!(
            AStar.search(&ctx, &request),
            Err(SearchError::Timeout { .. })
        ));
    }
}
