use std::collections::HashMap;

use geo::Coord;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use super::AntColonyConfig;
use super::pheromone::{COMBINED_FLOOR, ColonyGraph, PheromoneTable};
use crate::geodesy::planar_distance;

/// Most times an ant may enter the same node.
const MAX_VISITS: u8 = 2;

/// A completed walk: pheromone slots in travel order and their summed cost.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Trail {
    pub slots: Vec<usize>,
    pub cost: f64,
}

/// Walk one ant from `start` towards `goal`.
///
/// Returns `None` when the ant gets stuck or runs out of steps.
pub(crate) fn walk<R: Rng + ?Sized>(
    graph: &ColonyGraph,
    pheromones: &PheromoneTable,
    config: &AntColonyConfig,
    start: usize,
    goal: usize,
    goal_at: Coord<f64>,
    rng: &mut R,
) -> Option<Trail> {
    let mut visits: HashMap<usize, u8> = HashMap::from([(start, 1)]);
    let mut slots = Vec::new();
    let mut cost = 0.0;
    let mut current = start;

    while current != goal && slots.len() < config.max_steps {
        let (candidates, weights): (Vec<usize>, Vec<f64>) = graph
            .slots(current)
            .filter(|&s| visits.get(&graph.hop(s).target).copied().unwrap_or(0) < MAX_VISITS)
            .map(|s| (s, attractiveness(graph, pheromones, config, s, goal_at)))
            .unzip();
        let Ok(choice) = WeightedIndex::new(&weights) else {
            log::debug!("ant stuck at node position {current} after {} steps", slots.len());
            return None;
        };
        let slot = candidates[choice.sample(rng)];
        let hop = graph.hop(slot);
        *visits.entry(hop.target).or_insert(0) += 1;
        cost += hop.cost;
        slots.push(slot);
        current = hop.target;
    }

    if current == goal {
        Some(Trail { slots, cost })
    } else {
        log::debug!("ant gave up after {} steps", config.max_steps);
        None
    }
}

fn attractiveness(
    graph: &ColonyGraph,
    pheromones: &PheromoneTable,
    config: &AntColonyConfig,
    slot: usize,
    goal_at: Coord<f64>,
) -> f64 {
    let hop = graph.hop(slot);
    let heuristic = 1.0 / (hop.cost + planar_distance(hop.target_at, goal_at) + COMBINED_FLOOR);
    let score = pheromones.get(slot).powf(config.alpha) * heuristic.powf(config.beta);
    if score.is_finite() && score > 0.0 { score } else { 0.0 }
}
