use std::time::Instant;

use super::state::{CameFrom, Deadline, Frontier, PathIndices, reconstruct};
use super::{Algorithm, RouteSearch, SearchContext, SearchError, SearchOutcome, SearchRequest};
use crate::network::RoadNetwork;

/// Single-source shortest path without a heuristic.
///
/// Parallel edges are all relaxed, so the cheapest one for the requested
/// channel ends up on the route.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ecoroute_core::{
///     ConsumptionRate, Dijkstra, RouteSearch, SearchContext, SearchRequest, WeightChannel,
///     WeightTable,
/// };
/// use ecoroute_core::test_support::three_node_path;
///
/// let network = three_node_path();
/// let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
/// let ctx = SearchContext::new(&network, &weights).expect("context");
/// let request = SearchRequest::new(
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 0.02, y: 0.0 },
///     WeightChannel::Length,
/// );
/// let outcome = Dijkstra.search(&ctx, &request).expect("search");
/// assert_eq!(outcome.metrics.distance_m, 1500.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Dijkstra;

impl RouteSearch for Dijkstra {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dijkstra
    }

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let (start, goal) = ctx.endpoints(request)?;
        let weights = ctx.weights();
        let mut deadline = ctx.deadline(Algorithm::Dijkstra);
        let path = shortest_path(
            ctx.network(),
            start,
            goal,
            |edge| weights.raw(edge, request.channel),
            &mut deadline,
        )?;
        Ok(ctx.outcome(Algorithm::Dijkstra, path, started))
    }
}

/// Dijkstra over node positions with an arbitrary edge cost.
///
/// Returns `Ok(None)` when `goal` is unreachable.
pub(crate) fn shortest_path<F>(
    network: &RoadNetwork,
    start: usize,
    goal: usize,
    cost: F,
    deadline: &mut Deadline,
) -> Result<Option<PathIndices>, SearchError>
where
    F: Fn(usize) -> f64,
{
    if start == goal {
        return Ok(Some(PathIndices::single(start)));
    }
    let n = network.node_count();
    let mut distances = vec![f64::INFINITY; n];
    let mut came_from: Vec<CameFrom> = vec![None; n];
    let mut visited = vec![false; n];
    let mut frontier = Frontier::default();

    distances[start] = 0.0;
    frontier.push(0.0, start);

    while let Some((dist, node)) = frontier.pop() {
        deadline.tick()?;
        if visited[node] {
            continue;
        }
        if node == goal {
            return Ok(Some(reconstruct(&came_from, start, goal)));
        }
        visited[node] = true;
        for &edge in network.out_edges(node) {
            let next = network.edge_target(edge);
            if visited[next] {
                continue;
            }
            let candidate = dist + cost(edge);
            if candidate < distances[next] {
                distances[next] = candidate;
                came_from[next] = Some((node, edge));
                frontier.push(candidate, next);
            }
        }
    }
    Ok(None)
}
