//! Core routing engine for fuel-aware drive planning.
//!
//! A [`RoadNetwork`] holds the immutable road graph. Each request derives a
//! [`WeightTable`] from the vehicle's [`ConsumptionRate`], runs one or more
//! [`RouteSearch`] strategies over a [`SearchContext`] and picks a winner with
//! [`select_best`]. [`RoutePlanner`] wires these steps to the external
//! collaborators declared in [`providers`].

pub mod geodesy;
mod instructions;
mod network;
mod planner;
mod poi;
mod poi_density;
pub mod providers;
mod resolver;
mod search;
mod selector;
mod vehicle;
mod weights;

#[doc(hidden)]
pub mod test_support;

pub use instructions::{InstructionGenerator, UNNAMED_ROAD};
pub use network::{Edge, EdgeId, GraphError, Node, NodeId, RoadClass, RoadNetwork};
pub use planner::{
    OptimizationMetric, ParseMetricError, PlanError, PlanRequest, PlannerConfig, PoiSummary,
    RoutePlanner, RouteReport,
};
pub use poi::{PointOfInterest, UNNAMED_POI};
pub use poi_density::{annotate_poi_counts, count_pois_per_edge};
pub use providers::{
    CoordinateGeocoder, FuelCatalog, Geocoder, GraphLoadError, GraphProvider, NoFuelCatalog,
    PoiProvider, PoiQueryConfig, PoiQueryError,
};
pub use resolver::NodeLocator;
pub use search::{
    AStar, Algorithm, AntColony, AntColonyConfig, AntColonyRun, BlendWeights, Dijkstra,
    ParseAlgorithmError, Route, RouteMetrics, RouteSearch, SearchContext, SearchError,
    SearchLimits, SearchOutcome, SearchRequest,
};
pub use selector::{RouteCandidate, SelectError, SelectionMetric, select_best};
pub use vehicle::{ConsumptionRate, RateSource, VehicleError, VehicleProfile, VehicleSpec};
pub use weights::{
    EdgeWeights, NORMALIZATION_EPSILON, NormalizedWeights, POI_LOG_FLOOR, ParseChannelError,
    WeightChannel, WeightTable, fuel_coefficient, speed_kmh,
};
