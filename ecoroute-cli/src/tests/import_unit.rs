//! Focused unit tests covering the import command.

use super::helpers::{TWO_NODE_JSON, workspace, write_utf8};
use crate::import::{ImportArgs, ImportConfig, execute_import, run_import_with};
use crate::{ARG_INPUT, CliError, ENV_INPUT};
use camino::Utf8PathBuf;
use ecoroute_core::GraphProvider;
use ecoroute_data::{FileGraphStore, JsonImportError};
use rstest::rstest;

#[rstest]
fn converting_without_input_errors() {
    let err = ImportConfig::try_from(ImportArgs::default()).expect_err("missing input");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(env, ENV_INPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn import_config_applies_defaults() {
    let config = ImportConfig::try_from(ImportArgs {
        input: Some(Utf8PathBuf::from("kyiv.json")),
        ..ImportArgs::default()
    })
    .expect("config");
    assert_eq!(config.area, "kyiv");
    assert_eq!(config.graph_dir, Utf8PathBuf::from("data"));
}

#[rstest]
fn validate_sources_reports_missing_input() {
    let (_tmp, root) = workspace();
    let config = ImportConfig {
        input: root.join("missing.json"),
        area: "kyiv".into(),
        graph_dir: root.join("graphs"),
    };
    match config.validate_sources().expect_err("missing file") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_INPUT),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let (_tmp, root) = workspace();
    let config = ImportConfig {
        input: root.clone(),
        area: "kyiv".into(),
        graph_dir: root.join("graphs"),
    };
    match config.validate_sources().expect_err("directory input") {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(path, root);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn execute_import_stores_the_network() {
    let (_tmp, root) = workspace();
    let input = root.join("kyiv.json");
    write_utf8(&input, TWO_NODE_JSON.as_bytes());
    let config = ImportConfig {
        input,
        area: "podil".into(),
        graph_dir: root.join("graphs"),
    };

    let summary = execute_import(&config).expect("import");
    assert_eq!(summary.area, "podil");
    assert_eq!(summary.path, root.join("graphs").join("podil.ergn"));
    assert_eq!((summary.nodes, summary.edges), (2, 1));
    assert_eq!(summary.removed_self_loops, 1);

    let stored = FileGraphStore::new(root.join("graphs"))
        .load("podil")
        .expect("stored network");
    assert_eq!(stored.edge_count(), 1);
}

#[rstest]
fn execute_import_reports_bad_json() {
    let (_tmp, root) = workspace();
    let input = root.join("broken.json");
    write_utf8(&input, b"{ not json");
    let config = ImportConfig {
        input: input.clone(),
        area: "kyiv".into(),
        graph_dir: root.join("graphs"),
    };

    match execute_import(&config).expect_err("bad JSON") {
        CliError::Import {
            path,
            source: JsonImportError::Parse { .. },
        } => assert_eq!(path, input),
        other => panic!("expected Import, found {other:?}"),
    }
}

#[rstest]
fn execute_import_rejects_unsafe_area_names() {
    let (_tmp, root) = workspace();
    let input = root.join("kyiv.json");
    write_utf8(&input, TWO_NODE_JSON.as_bytes());
    let config = ImportConfig {
        input,
        area: "../kyiv".into(),
        graph_dir: root.join("graphs"),
    };
    assert!(matches!(
        execute_import(&config),
        Err(CliError::GraphStore { .. })
    ));
}

#[rstest]
fn run_import_with_prints_a_summary() {
    let (_tmp, root) = workspace();
    let input = root.join("kyiv.json");
    write_utf8(&input, TWO_NODE_JSON.as_bytes());
    let args = ImportArgs {
        input: Some(input),
        area: Some("kyiv".into()),
        graph_dir: Some(root.join("graphs")),
    };

    let mut output = Vec::new();
    run_import_with(args, &mut output).expect("import command");
    let summary: serde_json::Value = serde_json::from_slice(&output).expect("summary JSON");
    assert_eq!(summary["area"], "kyiv");
    assert_eq!(summary["nodes"], 2);
}
