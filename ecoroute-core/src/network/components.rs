use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

use super::RoadClass;

/// Identifier of a node as assigned by the upstream map data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Position of an edge within a [`RoadNetwork`](super::RoadNetwork).
///
/// Edge ids are dense indices and only meaningful for the network that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub usize);

impl EdgeId {
    /// Index into the network's edge slice.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// An intersection or terminal point.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub location: Coord<f64>,
}

impl Node {
    /// Build a node from longitude and latitude.
    ///
    /// # Examples
    /// ```
    /// use ecoroute_core::{Node, NodeId};
    ///
    /// let node = Node::new(7, 30.52, 50.45);
    /// assert_eq!(node.id, NodeId(7));
    /// assert_eq!(node.location.y, 50.45);
    /// ```
    #[must_use]
    pub fn new(id: u64, lon: f64, lat: f64) -> Self {
        Self {
            id: NodeId(id),
            location: Coord { x: lon, y: lat },
        }
    }
}

/// A directed road segment.
///
/// Several edges may join the same ordered pair of nodes; `key`
/// distinguishes them and must be unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub key: u32,
    pub length_m: f64,
    pub road_class: RoadClass,
    #[serde(default)]
    pub poi_count: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

impl Edge {
    /// Build an unnamed edge with key `0` and no nearby POIs.
    ///
    /// # Examples
    /// ```
    /// use ecoroute_core::{Edge, RoadClass};
    ///
    /// let edge = Edge::new(1, 2, 250.0, RoadClass::Primary).with_name("Khreshchatyk");
    /// assert_eq!(edge.key, 0);
    /// assert_eq!(edge.name.as_deref(), Some("Khreshchatyk"));
    /// ```
    #[must_use]
    pub fn new(source: u64, target: u64, length_m: f64, road_class: RoadClass) -> Self {
        Self {
            source: NodeId(source),
            target: NodeId(target),
            key: 0,
            length_m,
            road_class,
            poi_count: 0,
            name: None,
            reference: None,
        }
    }

    /// Set the parallel-edge key.
    #[must_use]
    pub fn with_key(mut self, key: u32) -> Self {
        self.key = key;
        self
    }

    /// Set the number of nearby points of interest.
    #[must_use]
    pub fn with_poi_count(mut self, poi_count: u32) -> Self {
        self.poi_count = poi_count;
        self
    }

    /// Set the street name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the road reference, e.g. `M06`.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Whether the edge starts and ends at the same node.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Human-readable label: the name, else the reference.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.reference.as_deref().filter(|r| !r.trim().is_empty()))
    }
}
