//! Error types emitted by the ecoroute CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ecoroute_core::{ParseMetricError, PlanError, PoiQueryError, VehicleError};
use ecoroute_data::{GraphStoreError, JsonImportError, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the ecoroute CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An option value could not be interpreted.
    #[error("invalid {field}: {source}")]
    InvalidVehicleValue {
        field: &'static str,
        #[source]
        source: VehicleError,
    },
    /// The optimisation metric is not recognised.
    #[error(transparent)]
    InvalidMetric(#[from] ParseMetricError),
    /// An HTTP provider could not be constructed.
    #[error("failed to build {service} client: {source}")]
    BuildProvider {
        service: &'static str,
        #[source]
        source: ProviderBuildError,
    },
    /// Importing a JSON network failed.
    #[error("failed to import {path:?}: {source}")]
    Import {
        path: Utf8PathBuf,
        #[source]
        source: JsonImportError,
    },
    /// Reading or writing the graph store failed.
    #[error("graph store error for area `{area}`: {source}")]
    GraphStore {
        area: String,
        #[source]
        source: GraphStoreError,
    },
    /// The planner could not produce a route.
    #[error("routing failed: {0}")]
    Plan(#[from] PlanError),
    /// Points of interest could not be fetched.
    #[error("failed to fetch points of interest: {0}")]
    PoiQuery(#[from] PoiQueryError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
