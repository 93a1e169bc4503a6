use geo::Coord;

use crate::network::RoadNetwork;

/// Smallest cost an edge may carry during colony search.
pub(crate) const COMBINED_FLOOR: f64 = 1e-6;

/// Level every hop starts from.
pub(crate) const INITIAL_PHEROMONE: f64 = 1.0;

/// Levels never evaporate below this, so every hop stays selectable.
pub(crate) const PHEROMONE_FLOOR: f64 = 1e-9;

/// One distinct successor of a node, through its cheapest parallel edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hop {
    pub target: usize,
    pub edge: usize,
    pub cost: f64,
    pub target_at: Coord<f64>,
}

/// Compressed adjacency of distinct `(u, v)` hops.
///
/// Hops of node `u` occupy `hops[offsets[u]..offsets[u + 1]]`; the position
/// of a hop doubles as its pheromone slot.
#[derive(Debug, Clone)]
pub(crate) struct ColonyGraph {
    offsets: Vec<usize>,
    hops: Vec<Hop>,
}

impl ColonyGraph {
    /// Collapse parallel edges, keeping the lowest `edge_cost` per target.
    pub(crate) fn build(network: &RoadNetwork, edge_cost: &[f64]) -> Self {
        let mut offsets = Vec::with_capacity(network.node_count() + 1);
        let mut hops: Vec<Hop> = Vec::with_capacity(edge_cost.len());
        for node in 0..network.node_count() {
            let first = hops.len();
            offsets.push(first);
            for &edge in network.out_edges(node) {
                let target = network.edge_target(edge);
                let cost = edge_cost[edge];
                match hops[first..].iter_mut().find(|h| h.target == target) {
                    Some(hop) if cost < hop.cost => {
                        hop.edge = edge;
                        hop.cost = cost;
                    }
                    Some(_) => {}
                    None => hops.push(Hop {
                        target,
                        edge,
                        cost,
                        target_at: network.node_at(target).location,
                    }),
                }
            }
        }
        offsets.push(hops.len());
        Self { offsets, hops }
    }

    pub(crate) fn len(&self) -> usize {
        self.hops.len()
    }

    pub(crate) fn hop(&self, slot: usize) -> &Hop {
        &self.hops[slot]
    }

    /// Pheromone slots of the hops leaving `node`.
    pub(crate) fn slots(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node]..self.offsets[node + 1]
    }

    /// Slot of the hop from `from` to `to`, if one exists.
    pub(crate) fn slot_between(&self, from: usize, to: usize) -> Option<usize> {
        self.slots(from).find(|&s| self.hops[s].target == to)
    }
}

/// Desirability of every hop for one search request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PheromoneTable {
    levels: Vec<f64>,
}

impl PheromoneTable {
    pub(crate) fn uniform(len: usize, level: f64) -> Self {
        Self {
            levels: vec![level; len],
        }
    }

    pub(crate) fn get(&self, slot: usize) -> f64 {
        self.levels[slot]
    }

    pub(crate) fn reinforce(&mut self, slots: &[usize], amount: f64) {
        for &slot in slots {
            self.levels[slot] += amount;
        }
    }

    /// Multiply every level by `1 - rate`, flooring at [`PHEROMONE_FLOOR`].
    pub(crate) fn evaporate(&mut self, rate: f64) {
        let keep = 1.0 - rate.clamp(0.0, 1.0);
        for level in &mut self.levels {
            *level = (*level * keep).max(PHEROMONE_FLOOR);
        }
    }

    /// Add `1 / cost` along a completed path; zero-cost paths are skipped.
    pub(crate) fn deposit(&mut self, slots: &[usize], cost: f64) {
        if cost > 0.0 && cost.is_finite() {
            self.reinforce(slots, 1.0 / cost);
        }
    }
}
