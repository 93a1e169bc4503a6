//! Import command implementation for the ecoroute CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ecoroute_data::{FileGraphStore, import_json_file};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AREA, ARG_GRAPH_DIR, ARG_INPUT, CliError, DEFAULT_AREA, DEFAULT_GRAPH_DIR, ENV_INPUT,
    write_json,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Read a node-link JSON export of a street network and store \
                 it in the binary graph store under an area name, replacing \
                 any previous copy.",
    about = "Import a JSON road network into the graph store"
)]
#[ortho_config(prefix = "ECOROUTE")]
pub(crate) struct ImportArgs {
    /// Path to the node-link JSON file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Name to store the network under.
    #[arg(long = ARG_AREA, value_name = "name")]
    #[serde(default)]
    pub(crate) area: Option<String>,
    /// Directory of the graph store.
    #[arg(long = ARG_GRAPH_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) graph_dir: Option<Utf8PathBuf>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) area: String,
    pub(crate) graph_dir: Utf8PathBuf,
}

impl ImportConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)
    }
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        Ok(Self {
            input,
            area: args.area.unwrap_or_else(|| DEFAULT_AREA.to_owned()),
            graph_dir: args
                .graph_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_GRAPH_DIR)),
        })
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Summary printed after a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ImportSummary {
    pub(crate) area: String,
    pub(crate) path: Utf8PathBuf,
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    pub(crate) removed_self_loops: usize,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(crate) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_import(&config)?;
    write_json(writer, &summary)
}

pub(crate) fn execute_import(config: &ImportConfig) -> Result<ImportSummary, CliError> {
    config.validate_sources()?;
    let network = import_json_file(&config.input).map_err(|source| CliError::Import {
        path: config.input.clone(),
        source,
    })?;
    let store = FileGraphStore::new(config.graph_dir.clone());
    let path = store
        .save(&config.area, &network)
        .map_err(|source| CliError::GraphStore {
            area: config.area.clone(),
            source,
        })?;
    Ok(ImportSummary {
        area: config.area.clone(),
        path,
        nodes: network.node_count(),
        edges: network.edge_count(),
        removed_self_loops: network.removed_self_loops(),
    })
}
