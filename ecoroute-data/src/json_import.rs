//! Import of road networks from node-link JSON exports.
//!
//! The accepted shape follows what OSM graph tools emit when a street
//! network is dumped as node-link data:
//!
//! ```json
//! {
//!   "nodes": [{"id": 1, "x": 30.52, "y": 50.45}],
//!   "links": [{"source": 1, "target": 2, "key": 0, "length": 120.5,
//!              "highway": "primary", "name": "Khreshchatyk"}]
//! }
//! ```
//!
//! `x`/`y` may be spelled `lon`/`lat`, `links` may be `edges`, and
//! `source`/`target` may be `u`/`v`. Tag-like fields (`highway`, `name`,
//! `ref`) may hold a single string or a list, in which case the first entry
//! is used. Edges without a `length` get the great-circle distance between
//! their end points.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use ecoroute_core::geodesy::haversine_m;
use ecoroute_core::{Edge, GraphError, Node, NodeId, RoadClass, RoadNetwork};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while importing a JSON network.
#[derive(Debug, Error)]
pub enum JsonImportError {
    /// The input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The input is not valid node-link JSON.
    #[error("failed to parse network JSON: {source}")]
    Parse {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The parsed data does not form a valid network.
    #[error("imported network is invalid: {source}")]
    Invalid {
        /// Validation failure.
        #[source]
        source: GraphError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(self) -> Option<String> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
        .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(f64),
    Text(String),
}

impl Count {
    fn value(&self) -> u32 {
        let raw = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        };
        if raw.is_finite() && raw > 0.0 {
            raw.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: u64,
    #[serde(alias = "lon")]
    x: f64,
    #[serde(alias = "lat")]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(alias = "u")]
    source: u64,
    #[serde(alias = "v")]
    target: u64,
    #[serde(default)]
    key: u32,
    length: Option<f64>,
    highway: Option<OneOrMany>,
    name: Option<OneOrMany>,
    #[serde(rename = "ref")]
    reference: Option<OneOrMany>,
    poi_count: Option<Count>,
}

#[derive(Debug, Deserialize)]
struct RawGraph {
    nodes: Vec<RawNode>,
    #[serde(alias = "edges", default)]
    links: Vec<RawEdge>,
}

fn into_network(raw: RawGraph) -> Result<RoadNetwork, GraphError> {
    let nodes: Vec<Node> = raw
        .nodes
        .into_iter()
        .map(|n| Node::new(n.id, n.x, n.y))
        .collect();
    let positions: HashMap<NodeId, _> = nodes.iter().map(|n| (n.id, n.location)).collect();

    let edges = raw
        .links
        .into_iter()
        .map(|e| {
            let length = e.length.unwrap_or_else(|| {
                positions
                    .get(&NodeId(e.source))
                    .zip(positions.get(&NodeId(e.target)))
                    .map_or(0.0, |(&a, &b)| haversine_m(a, b))
            });
            let class = e
                .highway
                .and_then(OneOrMany::first)
                .map_or(RoadClass::Unknown, |h| RoadClass::from_highway(&h));
            Edge {
                key: e.key,
                poi_count: e.poi_count.as_ref().map_or(0, Count::value),
                name: e.name.and_then(OneOrMany::first),
                reference: e.reference.and_then(OneOrMany::first),
                ..Edge::new(e.source, e.target, length, class)
            }
        })
        .collect();
    RoadNetwork::new(nodes, edges)
}

/// Parse a node-link JSON network from `reader`.
///
/// # Errors
/// Returns [`JsonImportError::Parse`] for malformed JSON and
/// [`JsonImportError::Invalid`] when the graph fails validation.
///
/// # Examples
/// ```
/// use ecoroute_core::RoadClass;
/// use ecoroute_data::parse_json_graph;
///
/// let json = r#"{
///     "nodes": [{"id": 1, "x": 30.52, "y": 50.45}, {"id": 2, "x": 30.53, "y": 50.45}],
///     "links": [{"u": 1, "v": 2, "length": 710.0, "highway": ["primary", "secondary"]}]
/// }"#;
/// let network = parse_json_graph(json.as_bytes()).expect("network");
/// assert_eq!(network.edges()[0].road_class, RoadClass::Primary);
/// ```
pub fn parse_json_graph<R: Read>(reader: R) -> Result<RoadNetwork, JsonImportError> {
    let raw: RawGraph =
        serde_json::from_reader(reader).map_err(|source| JsonImportError::Parse { source })?;
    log::debug!(
        "parsed {} nodes and {} edges from JSON",
        raw.nodes.len(),
        raw.links.len()
    );
    into_network(raw).map_err(|source| JsonImportError::Invalid { source })
}

/// Import the node-link JSON network stored at `path`.
///
/// # Errors
/// Returns [`JsonImportError`] when the file cannot be read or parsed.
pub fn import_json_file(path: &Utf8Path) -> Result<RoadNetwork, JsonImportError> {
    let file = File::open(path).map_err(|source| JsonImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let network = parse_json_graph(BufReader::new(file))?;
    log::info!(
        "imported {} nodes and {} edges from {path}",
        network.node_count(),
        network.edge_count()
    );
    Ok(network)
}
