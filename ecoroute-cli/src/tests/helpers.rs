//! Shared helpers for CLI tests.

use camino::{Utf8Path, Utf8PathBuf};
use ecoroute_core::RoadNetwork;
use ecoroute_data::FileGraphStore;
use tempfile::TempDir;

/// Temporary directory with a UTF-8 path, removed when dropped.
pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

/// Store `network` under `area` inside `graph_dir`.
pub(super) fn store_area(graph_dir: &Utf8Path, area: &str, network: &RoadNetwork) {
    FileGraphStore::new(graph_dir.to_path_buf())
        .save(area, network)
        .expect("store network");
}

pub(super) const TWO_NODE_JSON: &str = r#"{
    "nodes": [{"id": 1, "x": 30.52, "y": 50.45}, {"id": 2, "x": 30.53, "y": 50.45}],
    "links": [
        {"source": 1, "target": 2, "length": 710.0, "highway": "primary"},
        {"source": 2, "target": 2, "length": 5.0, "highway": "service"}
    ]
}"#;
