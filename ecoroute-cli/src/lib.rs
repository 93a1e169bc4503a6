//! Command-line interface for the ecoroute engine.
//!
//! `route` plans a drive between two addresses, `import` converts a
//! node-link JSON export into the binary graph store and `annotate` counts
//! nearby points of interest on every edge of a stored network.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod annotate;
mod error;
mod import;
mod route;

pub use error::CliError;

use annotate::{AnnotateArgs, run_annotate};
use import::{ImportArgs, run_import};
use route::{RouteArgs, run_route};

const ARG_START: &str = "start";
const ARG_END: &str = "end";
const ARG_VEHICLE: &str = "vehicle";
const ARG_CONSUMPTION: &str = "consumption";
const ARG_METRIC: &str = "metric";
const ARG_AREA: &str = "area";
const ARG_GRAPH_DIR: &str = "graph-dir";
const ARG_ORS_API_KEY: &str = "ors-api-key";
const ARG_SEED: &str = "seed";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_INPUT: &str = "input";
const ARG_BUFFER_M: &str = "buffer-m";
const ARG_POI_KEY: &str = "poi-key";
const ARG_POI_VALUE: &str = "poi-value";

const ENV_START: &str = "ECOROUTE_CMDS_ROUTE_START";
const ENV_END: &str = "ECOROUTE_CMDS_ROUTE_END";
const ENV_INPUT: &str = "ECOROUTE_CMDS_IMPORT_INPUT";

const DEFAULT_AREA: &str = "kyiv";
const DEFAULT_GRAPH_DIR: &str = "data";
const DEFAULT_SEED: u64 = 42;

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments are invalid or the command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Route(args) => run_route(args),
        Command::Import(args) => run_import(args),
        Command::Annotate(args) => run_annotate(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ecoroute",
    about = "Fuel-aware drive planning over OpenStreetMap road networks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a route between two addresses.
    Route(RouteArgs),
    /// Convert a node-link JSON road network into the graph store.
    Import(ImportArgs),
    /// Count points of interest near every edge of a stored network.
    Annotate(AnnotateArgs),
}

/// Write `value` as pretty JSON followed by a newline.
fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
