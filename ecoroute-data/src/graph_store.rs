//! On-disk cache of road networks.
//!
//! Each area is stored in its own file: a four-byte magic, a little-endian
//! format version and a `bincode` payload holding the nodes and edges.
//! Loading revalidates the payload through [`RoadNetwork::new`], so a file
//! written by a buggy producer cannot smuggle an inconsistent graph into the
//! engine.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};

use bincode::{deserialize_from, serialize_into};
use camino::{Utf8Path, Utf8PathBuf};
use ecoroute_core::{Edge, GraphError, GraphLoadError, GraphProvider, Node, RoadNetwork};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File identifier for stored road networks.
pub const GRAPH_MAGIC: [u8; 4] = *b"ERGN";

/// Supported version of the stored network format.
pub const GRAPH_FORMAT_VERSION: u16 = 1;

/// File extension used by [`FileGraphStore`].
pub const GRAPH_EXTENSION: &str = "ergn";

#[derive(Serialize)]
struct StoredGraphRef<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
}

#[derive(Deserialize)]
struct StoredGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Errors raised while storing or loading a road network.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    /// The area name cannot be used as a file name.
    #[error("invalid area name `{area}`")]
    InvalidArea {
        /// Name as supplied.
        area: String,
    },
    /// A file system operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing the byte stream failed.
    #[error("failed to transfer graph data: {source}")]
    Stream {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The stream does not start with [`GRAPH_MAGIC`].
    #[error("invalid graph magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Sequence read from the stream.
        found: [u8; 4],
    },
    /// The stream was written in a different format version.
    #[error("unsupported graph format version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Version present in the header.
        found: u16,
        /// Version understood by this build.
        supported: u16,
    },
    /// The payload could not be decoded.
    #[error("failed to decode graph payload: {source}")]
    Decode {
        /// Decoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The network could not be encoded.
    #[error("failed to encode graph payload: {source}")]
    Encode {
        /// Encoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The decoded nodes and edges do not form a valid network.
    #[error("stored graph is invalid: {source}")]
    Invalid {
        /// Validation failure.
        #[source]
        source: GraphError,
    },
}

/// Write `network` to `writer` in the stored-graph format.
///
/// # Errors
/// Returns [`GraphStoreError::Stream`] or [`GraphStoreError::Encode`] when
/// the writer fails.
pub fn write_graph<W: Write>(mut writer: W, network: &RoadNetwork) -> Result<(), GraphStoreError> {
    writer
        .write_all(&GRAPH_MAGIC)
        .and_then(|()| writer.write_all(&GRAPH_FORMAT_VERSION.to_le_bytes()))
        .map_err(|source| GraphStoreError::Stream { source })?;
    let payload = StoredGraphRef {
        nodes: network.nodes(),
        edges: network.edges(),
    };
    serialize_into(&mut writer, &payload).map_err(|source| GraphStoreError::Encode { source })?;
    writer
        .flush()
        .map_err(|source| GraphStoreError::Stream { source })
}

/// Read a network previously written by [`write_graph`].
///
/// # Errors
/// Returns [`GraphStoreError`] when the header is wrong, the payload cannot
/// be decoded or the decoded graph is invalid.
///
/// # Examples
/// ```
/// use ecoroute_core::test_support::three_node_path;
/// use ecoroute_data::{read_graph, write_graph};
///
/// let mut bytes = Vec::new();
/// write_graph(&mut bytes, &three_node_path()).expect("write");
/// let network = read_graph(bytes.as_slice()).expect("read");
/// assert_eq!(network.edge_count(), 2);
/// ```
pub fn read_graph<R: Read>(mut reader: R) -> Result<RoadNetwork, GraphStoreError> {
    let mut magic = [0_u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|source| GraphStoreError::Stream { source })?;
    if magic != GRAPH_MAGIC {
        return Err(GraphStoreError::BadMagic {
            expected: GRAPH_MAGIC,
            found: magic,
        });
    }

    let mut version = [0_u8; 2];
    reader
        .read_exact(&mut version)
        .map_err(|source| GraphStoreError::Stream { source })?;
    let version = u16::from_le_bytes(version);
    if version != GRAPH_FORMAT_VERSION {
        return Err(GraphStoreError::UnsupportedVersion {
            found: version,
            supported: GRAPH_FORMAT_VERSION,
        });
    }

    let stored: StoredGraph =
        deserialize_from(&mut reader).map_err(|source| GraphStoreError::Decode { source })?;
    RoadNetwork::new(stored.nodes, stored.edges)
        .map_err(|source| GraphStoreError::Invalid { source })
}

fn is_valid_area(area: &str) -> bool {
    !area.trim().is_empty()
        && !area.starts_with('.')
        && !area.contains(['/', '\\', ':'])
        && !area.chars().any(char::is_control)
}

/// Directory of stored networks, one file per area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGraphStore {
    root: Utf8PathBuf,
}

impl FileGraphStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored networks.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// File used for `area`.
    ///
    /// # Errors
    /// Returns [`GraphStoreError::InvalidArea`] for names that are empty,
    /// hidden or contain path separators.
    pub fn path_for(&self, area: &str) -> Result<Utf8PathBuf, GraphStoreError> {
        if !is_valid_area(area) {
            return Err(GraphStoreError::InvalidArea {
                area: area.to_owned(),
            });
        }
        Ok(self.root.join(format!("{area}.{GRAPH_EXTENSION}")))
    }

    /// Store `network` under `area`, replacing any previous copy.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    ///
    /// # Errors
    /// Returns [`GraphStoreError`] when the directory or file cannot be
    /// written.
    pub fn save(&self, area: &str, network: &RoadNetwork) -> Result<Utf8PathBuf, GraphStoreError> {
        let path = self.path_for(area)?;
        let io_error = |path: &Utf8Path| {
            let path = path.to_path_buf();
            move |source| GraphStoreError::Io { path, source }
        };
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;
        let mut temp = NamedTempFile::new_in(&self.root).map_err(io_error(&self.root))?;
        write_graph(BufWriter::new(temp.as_file_mut()), network)?;
        temp.as_file().sync_all().map_err(io_error(&path))?;
        temp.persist(&path)
            .map_err(|err| GraphStoreError::Io {
                path: path.clone(),
                source: err.error,
            })?;
        log::info!(
            "stored {} nodes and {} edges for `{area}` at {path}",
            network.node_count(),
            network.edge_count()
        );
        Ok(path)
    }

    /// Load the network stored under `area`.
    ///
    /// # Errors
    /// Returns [`GraphStoreError`] when the file is missing, unreadable or
    /// corrupt.
    pub fn load_area(&self, area: &str) -> Result<RoadNetwork, GraphStoreError> {
        let path = self.path_for(area)?;
        let file = File::open(&path).map_err(|source| GraphStoreError::Io {
            path: path.clone(),
            source,
        })?;
        let network = read_graph(BufReader::new(file))?;
        log::debug!(
            "loaded {} nodes and {} edges for `{area}` from {path}",
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }
}

impl GraphProvider for FileGraphStore {
    fn load(&self, area: &str) -> Result<RoadNetwork, GraphLoadError> {
        self.load_area(area).map_err(|err| match err {
            GraphStoreError::Invalid { source } => GraphLoadError::Invalid {
                area: area.to_owned(),
                source,
            },
            GraphStoreError::InvalidArea { .. } | GraphStoreError::Io { .. } => {
                GraphLoadError::Unavailable {
                    area: area.to_owned(),
                    source: Box::new(err),
                }
            }
            GraphStoreError::Stream { .. }
            | GraphStoreError::BadMagic { .. }
            | GraphStoreError::UnsupportedVersion { .. }
            | GraphStoreError::Decode { .. }
            | GraphStoreError::Encode { .. } => GraphLoadError::Corrupt {
                area: area.to_owned(),
                source: Box::new(err),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoroute_core::test_support::{parallel_pair, three_node_path};
    use ecoroute_core::{NodeId, RoadClass};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn store() -> (TempDir, FileGraphStore) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("graphs")).expect("utf-8 path");
        (dir, FileGraphStore::new(root))
    }

    fn encoded(network: &RoadNetwork) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_graph(&mut bytes, network).expect("encode");
        bytes
    }

    #[rstest]
    fn header_leads_the_stream() {
        let bytes = encoded(&three_node_path());
        assert_eq!(&bytes[..4], b"ERGN");
        assert_eq!(&bytes[4..6], &1_u16.to_le_bytes());
    }

    #[rstest]
    fn parallel_edges_survive_storage() {
        let network = read_graph(encoded(&parallel_pair()).as_slice()).expect("decode");
        let classes: Vec<RoadClass> = network
            .edges_between(NodeId(1), NodeId(2))
            .map(|(_, e)| e.road_class)
            .collect();
        assert_eq!(classes, vec![RoadClass::Residential, RoadClass::Motorway]);
    }

    #[rstest]
    fn save_then_load_restores_the_network(store: (TempDir, FileGraphStore)) {
        let (_dir, store) = store;
        let original = three_node_path();
        let path = store.save("kyiv", &original).expect("save");
        assert_eq!(path, store.root().join("kyiv.ergn"));

        let loaded = store.load("kyiv").expect("load");
        assert_eq!(loaded.nodes(), original.nodes());
        assert_eq!(loaded.edges(), original.edges());
    }

    #[rstest]
    fn save_replaces_existing_files(store: (TempDir, FileGraphStore)) {
        let (_dir, store) = store;
        store.save("kyiv", &three_node_path()).expect("first save");
        store.save("kyiv", &parallel_pair()).expect("second save");
        assert_eq!(store.load_area("kyiv").expect("load").node_count(), 2);
    }

    #[rstest]
    fn missing_area_is_unavailable(store: (TempDir, FileGraphStore)) {
        let (_dir, store) = store;
        assert!(matches!(
            store.load("lviv"),
            Err(GraphLoadError::Unavailable { .. })
        ));
    }

    #[rstest]
    #[case(b"NOPE\x01\x00".to_vec())]
    #[case(b"ERGN\x09\x00".to_vec())]
    #[case(b"ERGN\x01\x00\xff".to_vec())]
    #[case(b"ER".to_vec())]
    fn damaged_files_are_corrupt(store: (TempDir, FileGraphStore), #[case] bytes: Vec<u8>) {
        let (_dir, store) = store;
        fs::create_dir_all(store.root()).expect("create root");
        let path = store.path_for("kyiv").expect("path");
        fs::write(&path, bytes).expect("write file");
        assert!(matches!(
            store.load("kyiv"),
            Err(GraphLoadError::Corrupt { .. })
        ));
    }

    #[rstest]
    fn inconsistent_payload_is_invalid(store: (TempDir, FileGraphStore)) {
        let (_dir, store) = store;
        fs::create_dir_all(store.root()).expect("create root");
        let nodes = [Node::new(1, 0.0, 0.0)];
        let edges = [Edge::new(1, 9, 10.0, RoadClass::Primary)];
        let mut bytes = Vec::from(GRAPH_MAGIC);
        bytes.extend_from_slice(&GRAPH_FORMAT_VERSION.to_le_bytes());
        serialize_into(
            &mut bytes,
            &StoredGraphRef {
                nodes: &nodes,
                edges: &edges,
            },
        )
        .expect("encode payload");
        fs::write(store.path_for("kyiv").expect("path"), bytes).expect("write file");

        assert!(matches!(
            store.load("kyiv"),
            Err(GraphLoadError::Invalid {
                source: GraphError::UnknownNode { .. },
                ..
            })
        ));
    }

    #[rstest]
    #[case("")]
    #[case("../etc/passwd")]
    #[case(".hidden")]
    #[case("a/b")]
    #[case("a\\b")]
    fn rejects_unsafe_area_names(store: (TempDir, FileGraphStore), #[case] area: &str) {
        let (_dir, store) = store;
        assert!(matches!(
            store.path_for(area),
            Err(GraphStoreError::InvalidArea { .. })
        ));
    }
}
