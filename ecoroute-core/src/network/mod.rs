//! Directed multigraph of intersections and road segments.
//!
//! A [`RoadNetwork`] holds physical attributes only. Derived costs live in a
//! separate [`WeightTable`](crate::WeightTable) so a network can be shared
//! across requests with different vehicle profiles.

mod components;
mod road_class;

use std::collections::{HashMap, HashSet};

use geo::{Coord, Rect};
use thiserror::Error;

pub use components::{Edge, EdgeId, Node, NodeId};
pub use road_class::RoadClass;

use crate::resolver::NodeLocator;

/// Errors raised while assembling a [`RoadNetwork`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Two nodes share an identifier.
    #[error("duplicate node id {id}")]
    DuplicateNode { id: NodeId },
    /// A node coordinate is NaN or infinite.
    #[error("node {id} has a non-finite coordinate ({lon}, {lat})")]
    InvalidCoordinate { id: NodeId, lon: f64, lat: f64 },
    /// An edge references a node that is not part of the network.
    #[error("edge {source_node}->{target_node} references unknown node {missing}")]
    UnknownNode {
        source_node: NodeId,
        target_node: NodeId,
        missing: NodeId,
    },
    /// Two parallel edges share a key.
    #[error("duplicate edge key {key} between {source_node} and {target_node}")]
    DuplicateEdge {
        source_node: NodeId,
        target_node: NodeId,
        key: u32,
    },
}

/// Immutable road network for a fixed geographic area.
///
/// Construction drops self-loops and clamps unusable lengths, so every edge
/// held by the network is navigable.
///
/// # Examples
/// ```
/// use ecoroute_core::{Edge, Node, NodeId, RoadClass, RoadNetwork};
///
/// let network = RoadNetwork::new(
///     vec![Node::new(1, 0.0, 0.0), Node::new(2, 0.01, 0.0)],
///     vec![
///         Edge::new(1, 2, 1_100.0, RoadClass::Primary),
///         Edge::new(2, 2, 5.0, RoadClass::Service),
///     ],
/// )
/// .expect("valid network");
///
/// assert_eq!(network.edge_count(), 1);
/// assert_eq!(network.removed_self_loops(), 1);
/// assert_eq!(network.edges_between(NodeId(1), NodeId(2)).count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
    edge_ends: Vec<(usize, usize)>,
    outgoing: Vec<Vec<usize>>,
    locator: NodeLocator,
    removed_self_loops: usize,
}

impl RoadNetwork {
    /// Validate and index `nodes` and `edges`.
    ///
    /// # Errors
    /// Returns [`GraphError`] when node ids repeat, coordinates are not
    /// finite, edges reference missing nodes or parallel edge keys collide.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if !node.location.x.is_finite() || !node.location.y.is_finite() {
                return Err(GraphError::InvalidCoordinate {
                    id: node.id,
                    lon: node.location.x,
                    lat: node.location.y,
                });
            }
            if index.insert(node.id, idx).is_some() {
                return Err(GraphError::DuplicateNode { id: node.id });
            }
        }

        let mut kept = Vec::with_capacity(edges.len());
        let mut edge_ends = Vec::with_capacity(edges.len());
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut keys = HashSet::with_capacity(edges.len());
        let mut removed_self_loops = 0;

        for mut edge in edges {
            let lookup = |id: NodeId| {
                index.get(&id).copied().ok_or(GraphError::UnknownNode {
                    source_node: edge.source,
                    target_node: edge.target,
                    missing: id,
                })
            };
            let from = lookup(edge.source)?;
            let to = lookup(edge.target)?;
            if edge.is_self_loop() {
                removed_self_loops += 1;
                continue;
            }
            if !keys.insert((from, to, edge.key)) {
                return Err(GraphError::DuplicateEdge {
                    source_node: edge.source,
                    target_node: edge.target,
                    key: edge.key,
                });
            }
            if !edge.length_m.is_finite() || edge.length_m < 0.0 {
                log::warn!(
                    "clamping length {} of edge {}->{} to 0",
                    edge.length_m,
                    edge.source,
                    edge.target
                );
                edge.length_m = 0.0;
            }
            outgoing[from].push(kept.len());
            edge_ends.push((from, to));
            kept.push(edge);
        }

        if removed_self_loops > 0 {
            log::info!("removed {removed_self_loops} self-loop edges");
        }

        let locator = NodeLocator::new(nodes.iter().enumerate().map(|(i, n)| (i, n.location)));
        Ok(Self {
            nodes,
            edges: kept,
            index,
            edge_ends,
            outgoing,
            locator,
            removed_self_loops,
        })
    }

    /// All nodes in load order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges; [`EdgeId`] indexes this slice.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Iterate edges together with their ids.
    pub fn edges_with_ids(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the network has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    /// Outgoing edges of `id`; empty for unknown nodes.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.index
            .get(&id)
            .map(|&i| self.outgoing[i].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&e| (EdgeId(e), &self.edges[e]))
    }

    /// All parallel edges from `source` to `target`, in key order.
    pub fn edges_between(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> impl Iterator<Item = (EdgeId, &Edge)> {
        let mut found: Vec<_> = self
            .outgoing(source)
            .filter(|(_, e)| e.target == target)
            .collect();
        found.sort_by_key(|(_, e)| e.key);
        found.into_iter()
    }

    /// Node geographically closest to `location`.
    ///
    /// Defined for any finite coordinate, including points far outside the
    /// network. Returns `None` only for an empty network or a non-finite
    /// query.
    #[must_use]
    pub fn nearest_node(&self, location: Coord<f64>) -> Option<&Node> {
        self.locator.nearest(location).map(|i| &self.nodes[i])
    }

    /// Number of self-loops currently held. Always zero once constructed.
    #[must_use]
    pub fn self_loop_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_self_loop()).count()
    }

    /// Number of self-loops dropped during construction.
    #[must_use]
    pub fn removed_self_loops(&self) -> usize {
        self.removed_self_loops
    }

    /// Bounding rectangle of all nodes.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let first = self.nodes.first()?.location;
        let (min, max) = self.nodes.iter().fold((first, first), |(lo, hi), n| {
            let c = n.location;
            (
                Coord {
                    x: lo.x.min(c.x),
                    y: lo.y.min(c.y),
                },
                Coord {
                    x: hi.x.max(c.x),
                    y: hi.y.max(c.y),
                },
            )
        });
        Some(Rect::new(min, max))
    }

    /// Decompose into the validated nodes and edges.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    /// Copy of the network with `counts[i]` stored on edge `i`.
    ///
    /// Missing entries keep the existing count.
    #[must_use]
    pub fn with_poi_counts(&self, counts: &[u32]) -> Self {
        let mut next = self.clone();
        for (edge, &count) in next.edges.iter_mut().zip(counts) {
            edge.poi_count = count;
        }
        next
    }

    pub(crate) fn node_index(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub(crate) fn out_edges(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }

    pub(crate) fn edge_target(&self, edge: usize) -> usize {
        self.edge_ends[edge].1
    }

    pub(crate) fn nearest_index(&self, location: Coord<f64>) -> Option<usize> {
        self.locator.nearest(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn nodes() -> Vec<Node> {
        vec![
            Node::new(1, 0.0, 0.0),
            Node::new(2, 0.01, 0.0),
            Node::new(3, 0.02, 0.0),
        ]
    }

    #[rstest]
    fn drops_self_loops_and_keeps_parallel_edges() {
        let network = RoadNetwork::new(
            nodes(),
            vec![
                Edge::new(1, 2, 1000.0, RoadClass::Motorway),
                Edge::new(1, 2, 900.0, RoadClass::Residential).with_key(1),
                Edge::new(2, 2, 10.0, RoadClass::Service),
                Edge::new(2, 3, 500.0, RoadClass::Residential),
            ],
        )
        .expect("network");
        assert_eq!(network.self_loop_count(), 0);
        assert_eq!(network.removed_self_loops(), 1);
        let keys: Vec<u32> = network
            .edges_between(NodeId(1), NodeId(2))
            .map(|(_, e)| e.key)
            .collect();
        assert_eq!(keys, vec![0, 1]);
        assert_eq!(network.outgoing(NodeId(3)).count(), 0);
    }

    #[rstest]
    fn rejects_duplicate_parallel_keys() {
        let err = RoadNetwork::new(
            nodes(),
            vec![
                Edge::new(1, 2, 1.0, RoadClass::Primary),
                Edge::new(1, 2, 2.0, RoadClass::Primary),
            ],
        )
        .expect_err("duplicate key");
        assert!(matches!(err, GraphError::DuplicateEdge { key: 0, .. }));
    }

    #[rstest]
    fn rejects_unknown_endpoints() {
        let err = RoadNetwork::new(nodes(), vec![Edge::new(1, 9, 1.0, RoadClass::Primary)])
            .expect_err("unknown node");
        assert_eq!(
            err,
            GraphError::UnknownNode {
                source_node: NodeId(1),
                target_node: NodeId(9),
                missing: NodeId(9),
            }
        );
    }

    #[rstest]
    fn rejects_duplicate_and_non_finite_nodes() {
        let mut dup = nodes();
        dup.push(Node::new(1, 5.0, 5.0));
        assert!(matches!(
            RoadNetwork::new(dup, Vec::new()),
            Err(GraphError::DuplicateNode { id: NodeId(1) })
        ));
        let bad = vec![Node::new(4, f64::INFINITY, 0.0)];
        assert!(matches!(
            RoadNetwork::new(bad, Vec::new()),
            Err(GraphError::InvalidCoordinate { .. })
        ));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(-3.0)]
    fn clamps_unusable_lengths(#[case] length: f64) {
        let network = RoadNetwork::new(nodes(), vec![Edge::new(1, 2, length, RoadClass::Primary)])
            .expect("network");
        assert_eq!(network.edges()[0].length_m, 0.0);
    }

    #[rstest]
    fn nearest_node_handles_far_away_points() {
        let network = RoadNetwork::new(nodes(), Vec::new()).expect("network");
        let far = network
            .nearest_node(Coord { x: 120.0, y: -30.0 })
            .expect("nearest");
        assert_eq!(far.id, NodeId(3));
    }

    #[rstest]
    fn bounds_cover_all_nodes() {
        let network = RoadNetwork::new(nodes(), Vec::new()).expect("network");
        let rect = network.bounds().expect("bounds");
        assert_eq!(rect.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(rect.max(), Coord { x: 0.02, y: 0.0 });
    }
}
