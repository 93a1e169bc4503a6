//! Facade crate for the ecoroute drive-planning engine.
//!
//! This crate re-exports the core routing types and, behind the
//! `http-providers` feature, the file and HTTP adapters that back the
//! collaborator traits.

#![forbid(unsafe_code)]

pub use ecoroute_core::{
    AStar, Algorithm, AntColony, AntColonyConfig, ConsumptionRate, CoordinateGeocoder, Dijkstra,
    Edge, EdgeId, FuelCatalog, Geocoder, GraphError, GraphLoadError, GraphProvider,
    InstructionGenerator, Node, NodeId, OptimizationMetric, PlanError, PlanRequest,
    PlannerConfig, PoiProvider, PoiQueryConfig, PoiQueryError, PointOfInterest, RateSource,
    RoadClass, RoadNetwork, Route, RouteCandidate, RouteMetrics, RoutePlanner, RouteReport,
    RouteSearch, SearchContext, SearchError, SearchLimits, SearchRequest, SelectError,
    SelectionMetric, VehicleError, VehicleProfile, VehicleSpec, WeightChannel, WeightTable,
    annotate_poi_counts, select_best,
};

#[cfg(feature = "http-providers")]
pub use ecoroute_data::{
    FileGraphStore, GraphStoreError, HttpFuelCatalog, HttpProviderConfig, OrsGeocoder,
    OverpassPoiProvider, ProviderBuildError, import_json_file,
};
