//! Route search strategies over a weighted [`RoadNetwork`].
//!
//! All strategies share one contract: [`RouteSearch::search`] anchors the
//! request's coordinates to their nearest nodes and returns a
//! [`SearchOutcome`]. An unreachable destination is a normal outcome with an
//! empty route and zero metrics; malformed input is a [`SearchError`].

mod ant_colony;
mod astar;
mod dijkstra;
mod state;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ant_colony::{AntColony, AntColonyConfig, AntColonyRun, BlendWeights};
pub use astar::AStar;
pub use dijkstra::Dijkstra;

use crate::network::{EdgeId, NodeId, RoadNetwork};
use crate::weights::{WeightChannel, WeightTable};

/// Identifies a search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    AStar,
    Dijkstra,
    AntColony,
}

impl Algorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AStar => "a_star",
            Self::Dijkstra => "dijkstra",
            Self::AntColony => "ant_colony",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm `{0}`")]
pub struct ParseAlgorithmError(pub String);

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a_star" | "astar" | "a*" => Ok(Self::AStar),
            "dijkstra" => Ok(Self::Dijkstra),
            "ant_colony" | "aco" => Ok(Self::AntColony),
            _ => Err(ParseAlgorithmError(s.to_owned())),
        }
    }
}

/// An ordered walk through the network.
///
/// `edges[i]` joins `nodes[i]` to `nodes[i + 1]`, so a non-empty route has
/// one fewer edge than nodes. The empty route means "no path".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl Route {
    /// The "no path" result.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Route geometry as a line string of node coordinates.
    #[must_use]
    pub fn geometry(&self, network: &RoadNetwork) -> LineString<f64> {
        self.nodes
            .iter()
            .filter_map(|id| network.node(*id).map(|n| n.location))
            .collect::<Vec<Coord<f64>>>()
            .into()
    }

    pub(crate) fn from_indices(network: &RoadNetwork, nodes: &[usize], edges: &[usize]) -> Self {
        Self {
            nodes: nodes.iter().map(|&i| network.node_at(i).id).collect(),
            edges: edges.iter().map(|&e| EdgeId(e)).collect(),
        }
    }
}

/// Totals of a route computed from raw edge weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_m: f64,
    pub fuel_l: f64,
    pub duration_s: f64,
}

impl RouteMetrics {
    /// Sum the raw weights of every edge on `route`.
    #[must_use]
    pub fn for_route(weights: &WeightTable, route: &Route) -> Self {
        route
            .edges
            .iter()
            .filter_map(|&id| weights.get(id))
            .fold(Self::default(), |acc, w| Self {
                distance_m: acc.distance_m + w.length,
                fuel_l: acc.fuel_l + w.fuel,
                duration_s: acc.duration_s + w.duration,
            })
    }

    /// Total of a single channel along `route`.
    #[must_use]
    pub fn channel_total(weights: &WeightTable, route: &Route, channel: WeightChannel) -> f64 {
        route
            .edges
            .iter()
            .filter_map(|&id| weights.weight(id, channel))
            .sum()
    }
}

/// Parameters of one search.
///
/// Coordinates use `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    /// Channel minimised by single-objective searches.
    pub channel: WeightChannel,
    /// Seed for stochastic strategies.
    pub seed: u64,
}

impl SearchRequest {
    /// Request minimising `channel` with seed `0`.
    #[must_use]
    pub fn new(start: Coord<f64>, end: Coord<f64>, channel: WeightChannel) -> Self {
        Self {
            start,
            end,
            channel,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Bounds on search effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchLimits {
    /// Wall-clock budget; `None` searches to completion.
    pub timeout: Option<Duration>,
}

impl SearchLimits {
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Read-only inputs shared by every strategy for one request.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    network: &'a RoadNetwork,
    weights: &'a WeightTable,
    limits: SearchLimits,
}

impl<'a> SearchContext<'a> {
    /// Pair a network with weights computed for it.
    ///
    /// # Errors
    /// Returns [`SearchError::WeightTableMismatch`] when the table was built
    /// for a different network.
    pub fn new(network: &'a RoadNetwork, weights: &'a WeightTable) -> Result<Self, SearchError> {
        if network.edge_count() != weights.len() {
            return Err(SearchError::WeightTableMismatch {
                edges: network.edge_count(),
                weights: weights.len(),
            });
        }
        Ok(Self {
            network,
            weights,
            limits: SearchLimits::default(),
        })
    }

    #[must_use]
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn network(&self) -> &'a RoadNetwork {
        self.network
    }

    #[must_use]
    pub fn weights(&self) -> &'a WeightTable {
        self.weights
    }

    #[must_use]
    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Resolve the request's endpoints to node positions.
    pub(crate) fn endpoints(&self, request: &SearchRequest) -> Result<(usize, usize), SearchError> {
        if self.network.is_empty() {
            return Err(SearchError::EmptyNetwork);
        }
        let resolve = |c: Coord<f64>| {
            self.network
                .nearest_index(c)
                .ok_or(SearchError::InvalidCoordinate { lon: c.x, lat: c.y })
        };
        Ok((resolve(request.start)?, resolve(request.end)?))
    }

    pub(crate) fn deadline(&self, algorithm: Algorithm) -> state::Deadline {
        state::Deadline::new(algorithm, self.limits.timeout)
    }

    pub(crate) fn outcome(
        &self,
        algorithm: Algorithm,
        path: Option<state::PathIndices>,
        started: Instant,
    ) -> SearchOutcome {
        let route = path.map_or_else(Route::empty, |p| {
            Route::from_indices(self.network, &p.nodes, &p.edges)
        });
        let metrics = RouteMetrics::for_route(self.weights, &route);
        if route.is_empty() {
            log::info!("{algorithm} found no path in {:?}", started.elapsed());
        } else {
            log::info!(
                "{algorithm} found a {}-node route in {:?}",
                route.nodes.len(),
                started.elapsed()
            );
        }
        SearchOutcome {
            algorithm,
            route,
            metrics,
        }
    }
}

/// Result of one strategy for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub algorithm: Algorithm,
    pub route: Route,
    pub metrics: RouteMetrics,
}

impl SearchOutcome {
    /// Whether a path was found.
    #[must_use]
    pub fn found(&self) -> bool {
        !self.route.is_empty()
    }
}

/// Errors returned by [`RouteSearch::search`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The network has no nodes to anchor the request to.
    #[error("road network is empty")]
    EmptyNetwork,
    /// A request coordinate was NaN or infinite.
    #[error("coordinate ({lon}, {lat}) is not finite")]
    InvalidCoordinate { lon: f64, lat: f64 },
    /// The weight table was computed for a different network.
    #[error("weight table covers {weights} edges but the network has {edges}")]
    WeightTableMismatch { edges: usize, weights: usize },
    /// The search exceeded its time budget.
    #[error("{algorithm} exceeded its {limit:?} time budget")]
    Timeout { algorithm: Algorithm, limit: Duration },
}

/// A strategy producing a route between two coordinates.
///
/// Implementations must be `Send + Sync` so a planner can share them across
/// threads.
pub trait RouteSearch: Send + Sync {
    /// Which strategy this is.
    fn algorithm(&self) -> Algorithm;

    /// Find a route for `request` over `ctx`.
    ///
    /// # Errors
    /// Returns [`SearchError`] for malformed input or an exhausted time
    /// budget. A missing path is reported as an empty route.
    fn search(
        &self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, SearchError>;
}
