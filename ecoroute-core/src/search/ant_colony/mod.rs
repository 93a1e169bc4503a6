//! Ant Colony Optimisation over a blended fuel, length and POI cost.
//!
//! Each request builds a fresh pheromone table seeded by one Dijkstra run on
//! the blended cost. Ants of an iteration walk in parallel against a frozen
//! pheromone snapshot; evaporation and deposits happen once all have
//! returned, so results depend only on the seed.

mod ant;
mod pheromone;

use std::time::Instant;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use ant::{Trail, walk};
use pheromone::{COMBINED_FLOOR, ColonyGraph, INITIAL_PHEROMONE, PheromoneTable};

use super::dijkstra::shortest_path;
use super::state::{Deadline, PathIndices};
use super::{Algorithm, RouteSearch, SearchContext, SearchError, SearchOutcome, SearchRequest};
use crate::weights::NormalizedWeights;

/// Coefficients of the blended edge cost.
///
/// `cost = fuel * fuel_n + length * length_n + poi * (1 - poi_n)` where the
/// `_n` terms come from [`NormalizedWeights`] and `poi_n` is desirability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub fuel: f64,
    pub length: f64,
    pub poi: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            fuel: 0.2,
            length: 0.2,
            poi: 5.0,
        }
    }
}

impl BlendWeights {
    /// Blended cost of edge `edge`, floored at a small positive value.
    #[must_use]
    pub fn combine(&self, normalized: &NormalizedWeights, edge: usize) -> f64 {
        let score = self.fuel * normalized.fuel(edge)
            + self.length * normalized.length(edge)
            + self.poi * (1.0 - normalized.poi(edge));
        if score.is_nan() || score < 0.0 {
            log::warn!("flooring invalid blended cost {score} of edge {edge}");
            COMBINED_FLOOR
        } else {
            score.max(COMBINED_FLOOR)
        }
    }
}

/// Tuning of the colony.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntColonyConfig {
    /// Ants dispatched per iteration.
    pub num_ants: usize,
    pub num_iterations: usize,
    /// Exponent applied to pheromone levels.
    pub alpha: f64,
    /// Exponent applied to the heuristic term.
    pub beta: f64,
    /// Fraction of pheromone lost after every iteration.
    pub evaporation: f64,
    pub blend: BlendWeights,
    /// Pheromone added along the initial Dijkstra path.
    pub initial_boost: f64,
    /// Steps after which an ant is declared stuck.
    pub max_steps: usize,
}

impl Default for AntColonyConfig {
    fn default() -> Self {
        Self {
            num_ants: 5,
            num_iterations: 5,
            alpha: 1.0,
            beta: 2.0,
            evaporation: 0.5,
            blend: BlendWeights::default(),
            initial_boost: 10.0,
            max_steps: 400,
        }
    }
}

/// Outcome of a colony run with its cost trace.
#[derive(Debug, Clone, PartialEq)]
pub struct AntColonyRun {
    pub outcome: SearchOutcome,
    /// Blended cost of the returned route, if any ant reached the goal.
    pub best_cost: Option<f64>,
    /// Best blended cost known after each iteration; `inf` until the first
    /// success.
    pub best_cost_history: Vec<f64>,
}

/// Stochastic multi-objective search.
///
/// Totals on the returned [`SearchOutcome`] use raw, not normalised,
/// weights.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ecoroute_core::{
///     AntColony, ConsumptionRate, RouteSearch, SearchContext, SearchRequest, WeightChannel,
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
///     WeightChannel::Poi,
/// )
/// .with_seed(42);
/// let outcome = AntColony::default().search(&ctx, &request).expect("search");
/// assert_eq!(outcome.route.nodes.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AntColony {
    config: AntColonyConfig,
}

impl AntColony {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: AntColonyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AntColonyConfig {
        &self.config
    }

    /// Run the colony drawing every ant's seed from `rng`.
    ///
    /// # Errors
    /// Returns [`SearchError`] for unusable input or an exhausted time
    /// budget.
    pub fn run<R: RngCore + ?Sized>(
        &self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
        rng: &mut R,
    ) -> Result<AntColonyRun, SearchError> {
        let started = Instant::now();
        let (start, goal) = ctx.endpoints(request)?;
        let network = ctx.network();
        let mut deadline = ctx.deadline(Algorithm::AntColony);

        if start == goal {
            return Ok(AntColonyRun {
                outcome: ctx.outcome(Algorithm::AntColony, Some(PathIndices::single(start)), started),
                best_cost: Some(0.0),
                best_cost_history: Vec::new(),
            });
        }

        let normalized = NormalizedWeights::from_table(ctx.weights());
        let edge_cost: Vec<f64> = (0..network.edge_count())
            .map(|e| self.config.blend.combine(&normalized, e))
            .collect();
        let graph = ColonyGraph::build(network, &edge_cost);
        let mut pheromones = seed_pheromones(
            ctx,
            &graph,
            &edge_cost,
            (start, goal),
            self.config.initial_boost,
            &mut deadline,
        )?;

        let goal_at = network.node_at(goal).location;
        let mut best: Option<Trail> = None;
        let mut history = Vec::with_capacity(self.config.num_iterations);

        for iteration in 0..self.config.num_iterations {
            deadline.check()?;
            let seeds: Vec<u64> = (0..self.config.num_ants).map(|_| rng.next_u64()).collect();
            let trails: Vec<Trail> = seeds
                .par_iter()
                .filter_map(|&seed| {
                    let mut ant_rng = ChaCha8Rng::seed_from_u64(seed);
                    walk(&graph, &pheromones, &self.config, start, goal, goal_at, &mut ant_rng)
                })
                .collect();

            for trail in &trails {
                if best.as_ref().is_none_or(|b| trail.cost < b.cost) {
                    best = Some(trail.clone());
                }
            }
            pheromones.evaporate(self.config.evaporation);
            for trail in &trails {
                pheromones.deposit(&trail.slots, trail.cost);
            }

            let best_cost = best.as_ref().map_or(f64::INFINITY, |b| b.cost);
            history.push(best_cost);
            log::debug!(
                "ant colony iteration {}/{}: {} of {} ants arrived, best cost {best_cost}",
                iteration + 1,
                self.config.num_iterations,
                trails.len(),
                self.config.num_ants
            );
        }

        let best_cost = best.as_ref().map(|b| b.cost);
        let path = best.map(|trail| {
            let mut nodes = Vec::with_capacity(trail.slots.len() + 1);
            nodes.push(start);
            nodes.extend(trail.slots.iter().map(|&s| graph.hop(s).target));
            let edges = trail.slots.iter().map(|&s| graph.hop(s).edge).collect();
            PathIndices { nodes, edges }
        });
        Ok(AntColonyRun {
            outcome: ctx.outcome(Algorithm::AntColony, path, started),
            best_cost,
            best_cost_history: history,
        })
    }
}

/// Uniform pheromones with `boost` added along the cheapest blended path.
fn seed_pheromones(
    ctx: &SearchContext<'_>,
    graph: &ColonyGraph,
    edge_cost: &[f64],
    (start, goal): (usize, usize),
    boost: f64,
    deadline: &mut Deadline,
) -> Result<PheromoneTable, SearchError> {
    let mut pheromones = PheromoneTable::uniform(graph.len(), INITIAL_PHEROMONE);
    match shortest_path(ctx.network(), start, goal, |e| edge_cost[e], deadline)? {
        Some(seed_path) => {
            let slots = trail_slots(graph, &seed_path.nodes);
            pheromones.reinforce(&slots, boost);
        }
        None => log::warn!("no initial path; starting from uniform pheromones"),
    }
    Ok(pheromones)
}

/// Pheromone slots along consecutive node positions.
fn trail_slots(graph: &ColonyGraph, nodes: &[usize]) -> Vec<usize> {
    nodes
        .windows(2)
        .filter_map(|pair| graph.slot_between(pair[0], pair[1]))
        .collect()
}

impl RouteSearch for AntColony {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AntColony
    }

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
        self.run(ctx, request, &mut rng).map(|run| run.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeId;
    use crate::test_support::{detour_grid, disconnected_pair, three_node_path};
    use crate::vehicle::ConsumptionRate;
    use crate::weights::{WeightChannel, WeightTable};
    use geo::Coord;
    use rstest::rstest;

    fn request(end: Coord<f64>, seed: u64) -> SearchRequest {
        SearchRequest::new(Coord { x: 0.0, y: 0.0 }, end, WeightChannel::Poi).with_seed(seed)
    }

    #[rstest]
    fn same_seed_gives_same_route() {
        let network = detour_grid();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let req = request(Coord { x: 0.02, y: 0.02 }, 9);
        let first = AntColony::default().search(&ctx, &req).expect("first");
        let second = AntColony::default().search(&ctx, &req).expect("second");
        assert_eq!(first, second);
        assert!(first.found());
    }

    #[rstest]
    fn best_cost_never_regresses() {
        let network = detour_grid();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let colony = AntColony::with_config(AntColonyConfig {
            num_iterations: 12,
            ..AntColonyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let run = colony
            .run(&ctx, &request(Coord { x: 0.02, y: 0.02 }, 0), &mut rng)
            .expect("run");
        assert_eq!(run.best_cost_history.len(), 12);
        assert!(run.best_cost_history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(run.best_cost, run.best_cost_history.last().copied());
    }

    #[rstest]
    fn seed_path_hops_carry_the_initial_boost() {
        let network = detour_grid();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let endpoints = ctx
            .endpoints(&request(Coord { x: 0.02, y: 0.02 }, 0))
            .expect("endpoints");
        let config = AntColonyConfig::default();
        let normalized = NormalizedWeights::from_table(&weights);
        let edge_cost: Vec<f64> = (0..network.edge_count())
            .map(|e| config.blend.combine(&normalized, e))
            .collect();
        let graph = ColonyGraph::build(&network, &edge_cost);

        let mut deadline = Deadline::new(Algorithm::AntColony, None);
        let table = seed_pheromones(
            &ctx,
            &graph,
            &edge_cost,
            endpoints,
            config.initial_boost,
            &mut deadline,
        )
        .expect("seed");
        let path = shortest_path(&network, endpoints.0, endpoints.1, |e| edge_cost[e], &mut deadline)
            .expect("dijkstra")
            .expect("path");

        let slots = trail_slots(&graph, &path.nodes);
        assert!(!slots.is_empty());
        assert_eq!(slots.len(), path.edges.len());
        for (&slot, &edge) in slots.iter().zip(&path.edges) {
            assert_eq!(graph.hop(slot).edge, edge);
        }
        for slot in 0..graph.len() {
            let expected = if slots.contains(&slot) {
                INITIAL_PHEROMONE + config.initial_boost
            } else {
                INITIAL_PHEROMONE
            };
            assert_eq!(table.get(slot), expected, "slot {slot}");
        }
    }

    #[rstest]
    fn full_evaporation_keeps_ants_moving() {
        let network = detour_grid();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let colony = AntColony::with_config(AntColonyConfig {
            evaporation: 1.0,
            num_iterations: 4,
            ..AntColonyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let run = colony
            .run(&ctx, &request(Coord { x: 0.02, y: 0.02 }, 0), &mut rng)
            .expect("run");
        assert!(run.outcome.found());
        assert_eq!(run.best_cost_history.len(), 4);
    }

    #[rstest]
    fn disconnected_goal_reports_no_path() {
        let network = disconnected_pair();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let run = AntColony::default()
            .run(&ctx, &request(Coord { x: 1.0, y: 1.0 }, 1), &mut rng)
            .expect("run");
        assert!(!run.outcome.found());
        assert_eq!(run.best_cost, None);
        assert!(run.best_cost_history.iter().all(|c| c.is_infinite()));
    }

    #[rstest]
    fn totals_use_raw_weights() {
        let network = three_node_path();
        let weights = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
        let ctx = SearchContext::new(&network, &weights).expect("context");
        let outcome = AntColony::default()
            .search(&ctx, &request(Coord { x: 0.02, y: 0.0 }, 2))
            .expect("search");
        assert_eq!(outcome.route.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(outcome.metrics.distance_m, 1500.0);
        assert!((outcome.metrics.fuel_l - 0.116).abs() < 1e-12);
    }

    #[rstest]
    fn blended_cost_prefers_poi_rich_edges() {
        let weights = [
            crate::weights::EdgeWeights {
                fuel: 1.0,
                length: 100.0,
                duration: 1.0,
                poi: 1.0,
            },
            crate::weights::EdgeWeights {
                fuel: 1.0,
                length: 100.0,
                duration: 1.0,
                poi: 0.1,
            },
        ];
        let normalized = NormalizedWeights::from_weights(&weights);
        let blend = BlendWeights::default();
        assert!(blend.combine(&normalized, 1) < blend.combine(&normalized, 0));
        assert_eq!(blend.combine(&normalized, 1), COMBINED_FLOOR);
    }
}
