//! Request-level orchestration: addresses in, a formatted route report out.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instructions::InstructionGenerator;
use crate::network::RoadNetwork;
use crate::poi::PointOfInterest;
use crate::providers::{
    FuelCatalog, Geocoder, GraphLoadError, GraphProvider, PoiProvider, PoiQueryConfig,
};
use crate::search::{
    AStar, Algorithm, AntColony, AntColonyConfig, Dijkstra, RouteSearch, SearchContext,
    SearchError, SearchLimits, SearchOutcome, SearchRequest,
};
use crate::selector::{RouteCandidate, SelectError, SelectionMetric, select_best};
use crate::vehicle::{ConsumptionRate, RateSource, VehicleProfile, VehicleSpec};
use crate::weights::{WeightChannel, WeightTable};

/// What the caller wants to optimise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMetric {
    #[default]
    Fuel,
    Duration,
    Poi,
}

impl OptimizationMetric {
    /// Channel minimised by single-objective searches.
    #[must_use]
    pub const fn channel(self) -> WeightChannel {
        match self {
            Self::Fuel => WeightChannel::Fuel,
            Self::Duration => WeightChannel::Duration,
            Self::Poi => WeightChannel::Poi,
        }
    }

    /// Strategies run for this metric.
    #[must_use]
    pub const fn algorithms(self) -> &'static [Algorithm] {
        match self {
            Self::Poi => &[Algorithm::AntColony],
            Self::Fuel | Self::Duration => &[Algorithm::AStar, Algorithm::Dijkstra],
        }
    }

    /// Criterion used to pick among candidates.
    #[must_use]
    pub fn selection(self) -> SelectionMetric {
        match self {
            Self::Fuel => SelectionMetric::Fuel,
            Self::Duration => SelectionMetric::Duration,
            Self::Poi => SelectionMetric::Poi,
        }
    }
}

impl fmt::Display for OptimizationMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fuel => "fuel_weight",
            Self::Duration => "duration",
            Self::Poi => "poi_score",
        })
    }
}

/// Returned when a string names no optimisation metric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric `{0}`; expected fuel_weight, duration or poi_score")]
pub struct ParseMetricError(pub String);

impl FromStr for OptimizationMetric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fuel_weight" | "fuel" => Ok(Self::Fuel),
            "duration" | "duration_weight" => Ok(Self::Duration),
            "poi_score" | "poi" => Ok(Self::Poi),
            _ => Err(ParseMetricError(s.to_owned())),
        }
    }
}

/// One routing request as received from a user.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub start_address: String,
    pub end_address: String,
    pub vehicle: Option<VehicleSpec>,
    /// Overrides any catalogue figure.
    pub custom_rate: Option<ConsumptionRate>,
    pub metric: OptimizationMetric,
    /// Seed for the ant colony.
    pub seed: u64,
}

impl PlanRequest {
    /// Request optimising fuel with no vehicle information.
    #[must_use]
    pub fn new(start_address: impl Into<String>, end_address: impl Into<String>) -> Self {
        Self {
            start_address: start_address.into(),
            end_address: end_address.into(),
            vehicle: None,
            custom_rate: None,
            metric: OptimizationMetric::default(),
            seed: 0,
        }
    }
}

/// Tuning shared by every request a planner serves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerConfig {
    pub ant_colony: AntColonyConfig,
    pub limits: SearchLimits,
    pub poi_query: PoiQueryConfig,
}

/// A point of interest as shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiSummary {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<&PointOfInterest> for PoiSummary {
    fn from(poi: &PointOfInterest) -> Self {
        Self {
            name: poi.name().to_owned(),
            lat: poi.location.y,
            lon: poi.location.x,
        }
    }
}

/// The selected route, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    pub algorithm: Algorithm,
    pub metric: OptimizationMetric,
    /// `[lon, lat]` pairs from origin to destination.
    pub geometry: Vec<[f64; 2]>,
    /// Kilometres, two decimals.
    pub distance_km: f64,
    /// Whole hours.
    pub duration_hours: f64,
    /// Litres, two decimals.
    pub fuel_litres: f64,
    pub poi_count: usize,
    pub steps: Vec<String>,
    /// Only populated for ant colony routes.
    pub pois: Vec<PoiSummary>,
    pub consumption_l_per_100km: f64,
    pub consumption_source: RateSource,
}

/// Errors returned by [`RoutePlanner::plan`].
#[derive(Debug, Error)]
pub enum PlanError {
    /// The geocoder could not place an address.
    #[error("could not resolve address `{address}`")]
    UnresolvedAddress { address: String },
    /// The road network could not be loaded.
    #[error(transparent)]
    Graph(#[from] GraphLoadError),
    /// Every strategy failed with an error.
    #[error("route search failed")]
    Search(#[from] SearchError),
    /// Every strategy finished without reaching the destination.
    #[error("no route found")]
    NoRoute,
}

impl From<SelectError> for PlanError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::NoCandidates => Self::NoRoute,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Answers routing requests over one road network.
///
/// Generic over the collaborators it calls: a geocoder, a fuel catalogue and
/// a POI provider.
pub struct RoutePlanner<G, F, P>
where
    G: Geocoder,
    F: FuelCatalog,
    P: PoiProvider,
{
    network: RoadNetwork,
    geocoder: G,
    catalog: F,
    pois: P,
    config: PlannerConfig,
}

impl<G, F, P> RoutePlanner<G, F, P>
where
    G: Geocoder,
    F: FuelCatalog,
    P: PoiProvider,
{
    /// Construct a planner using default configuration.
    pub fn new(network: RoadNetwork, geocoder: G, catalog: F, pois: P) -> Self {
        Self::with_config(network, geocoder, catalog, pois, PlannerConfig::default())
    }

    /// Construct a planner with explicit configuration.
    pub const fn with_config(
        network: RoadNetwork,
        geocoder: G,
        catalog: F,
        pois: P,
        config: PlannerConfig,
    ) -> Self {
        Self {
            network,
            geocoder,
            catalog,
            pois,
            config,
        }
    }

    /// Load `area` from `provider` and construct a planner over it.
    ///
    /// # Errors
    /// Returns [`PlanError::Graph`] when the provider fails.
    pub fn load<GP>(
        provider: &GP,
        area: &str,
        geocoder: G,
        catalog: F,
        pois: P,
        config: PlannerConfig,
    ) -> Result<Self, PlanError>
    where
        GP: GraphProvider + ?Sized,
    {
        let network = provider.load(area)?;
        log::info!(
            "loaded `{area}`: {} nodes, {} edges",
            network.node_count(),
            network.edge_count()
        );
        Ok(Self::with_config(network, geocoder, catalog, pois, config))
    }

    #[must_use]
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Route `request` and format the best candidate.
    ///
    /// # Errors
    /// Returns [`PlanError`] for unresolved addresses, or when no strategy
    /// produced a route.
    pub fn plan(&self, request: &PlanRequest) -> Result<RouteReport, PlanError> {
        let started = Instant::now();
        let start = self.geocode(&request.start_address)?;
        let end = self.geocode(&request.end_address)?;

        let profile =
            VehicleProfile::resolve(request.vehicle.clone(), request.custom_rate, &self.catalog);
        log::info!(
            "planning {} route with {} ({:?})",
            request.metric,
            profile.consumption,
            profile.source
        );
        let weights = WeightTable::assign(&self.network, profile.consumption);
        let ctx = SearchContext::new(&self.network, &weights)?.with_limits(self.config.limits);
        let search_request =
            SearchRequest::new(start, end, request.metric.channel()).with_seed(request.seed);

        let mut candidates = Vec::new();
        let mut last_error = None;
        for &algorithm in request.metric.algorithms() {
            match self.run(algorithm, &ctx, &search_request) {
                Ok(outcome) if outcome.found() => candidates.push(self.annotate(outcome)),
                Ok(_) => {}
                Err(err) => {
                    log::warn!("{algorithm} failed: {err}");
                    last_error = Some(err);
                }
            }
        }
        if candidates.is_empty() {
            return Err(last_error.map_or(PlanError::NoRoute, PlanError::Search));
        }

        let best = select_best(&candidates, &request.metric.selection())?;
        log::info!("planned route in {:?}", started.elapsed());
        Ok(self.report(best, request.metric, &profile))
    }

    fn geocode(&self, address: &str) -> Result<geo::Coord<f64>, PlanError> {
        self.geocoder
            .geocode(address)
            .ok_or_else(|| PlanError::UnresolvedAddress {
                address: address.to_owned(),
            })
    }

    fn run(
        &self,
        algorithm: Algorithm,
        ctx: &SearchContext<'_>,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        match algorithm {
            Algorithm::AStar => AStar.search(ctx, request),
            Algorithm::Dijkstra => Dijkstra.search(ctx, request),
            Algorithm::AntColony => {
                AntColony::with_config(self.config.ant_colony).search(ctx, request)
            }
        }
    }

    fn annotate(&self, outcome: SearchOutcome) -> RouteCandidate {
        let geometry = outcome.route.geometry(&self.network);
        let pois = self
            .pois
            .pois_along(&geometry, &self.config.poi_query)
            .unwrap_or_else(|err| {
                log::warn!("POI lookup failed, continuing without POIs: {err}");
                Vec::new()
            });
        RouteCandidate {
            algorithm: outcome.algorithm,
            route: outcome.route,
            metrics: outcome.metrics,
            poi_count: pois.len(),
            pois,
        }
    }

    fn report(
        &self,
        best: &RouteCandidate,
        metric: OptimizationMetric,
        profile: &VehicleProfile,
    ) -> RouteReport {
        let geometry = best
            .route
            .geometry(&self.network)
            .0
            .iter()
            .map(|c| [c.x, c.y])
            .collect();
        let pois = if best.algorithm == Algorithm::AntColony {
            best.pois.iter().map(PoiSummary::from).collect()
        } else {
            Vec::new()
        };
        RouteReport {
            algorithm: best.algorithm,
            metric,
            geometry,
            distance_km: round_to(best.metrics.distance_m / 1000.0, 2),
            duration_hours: round_to(best.metrics.duration_s / 3600.0, 0),
            fuel_litres: round_to(best.metrics.fuel_l, 2),
            poi_count: best.poi_count,
            steps: InstructionGenerator::generate(&self.network, &best.route),
            pois,
            consumption_l_per_100km: profile.consumption.get(),
            consumption_source: profile.source,
        }
    }
}
