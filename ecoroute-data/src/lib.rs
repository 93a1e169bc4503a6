//! Storage and HTTP adapters for the ecoroute engine.
//!
//! Responsibilities:
//! - Persist and load road networks ([`FileGraphStore`], [`import_json_file`]).
//! - Implement the collaborator traits of `ecoroute-core` over HTTP
//!   services: fuel economy figures, Overpass points of interest and
//!   openrouteservice geocoding.
//!
//! Boundaries:
//! - Do not encode routing rules (they live in `ecoroute-core`).
//! - Keep blocking I/O off async executors; the synchronous provider traits
//!   bridge onto an internal Tokio runtime.
//!
//! Invariants:
//! - Providers are `Send + Sync` and hold no global state.
//! - Network failures degrade to `None` or typed errors, never panics.

pub mod fuel_catalog;
pub mod geocoder;
pub mod graph_store;
pub mod http;
pub mod json_import;
pub mod overpass;

pub use fuel_catalog::{FUEL_ECONOMY_URL, FuelLookupError, HttpFuelCatalog, litres_per_100km};
pub use geocoder::{ORS_URL, OrsGeocoder};
pub use graph_store::{
    FileGraphStore, GRAPH_EXTENSION, GRAPH_FORMAT_VERSION, GRAPH_MAGIC, GraphStoreError,
    read_graph, write_graph,
};
pub use http::{DEFAULT_USER_AGENT, FetchError, HttpProviderConfig, ProviderBuildError};
pub use json_import::{JsonImportError, import_json_file, parse_json_graph};
pub use overpass::{OVERPASS_URL, OverpassPoiProvider, build_query};
