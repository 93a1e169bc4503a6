//! Route command implementation for the ecoroute CLI.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use ecoroute_core::{
    ConsumptionRate, CoordinateGeocoder, FuelCatalog, Geocoder, OptimizationMetric, PlanError,
    PlanRequest, PlannerConfig, PoiProvider, RoutePlanner, RouteReport, SearchLimits,
    VehicleSpec,
};
use ecoroute_data::{FileGraphStore, HttpFuelCatalog, OrsGeocoder, OverpassPoiProvider};
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AREA, ARG_CONSUMPTION, ARG_END, ARG_GRAPH_DIR, ARG_METRIC, ARG_ORS_API_KEY, ARG_SEED,
    ARG_START, ARG_TIMEOUT_SECS, ARG_VEHICLE, CliError, DEFAULT_AREA, DEFAULT_GRAPH_DIR,
    DEFAULT_SEED, ENV_END, ENV_START, write_json,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    long_about = "Plan a drive between two addresses over a stored road \
                 network. Addresses are geocoded through openrouteservice \
                 when an API key is configured; literal \"lat,lon\" pairs \
                 always work. The chosen route is printed as JSON.",
    about = "Plan a route between two addresses"
)]
#[ortho_config(prefix = "ECOROUTE")]
pub(crate) struct RouteArgs {
    /// Start address or "lat,lon".
    #[arg(value_name = "start")]
    #[serde(default)]
    pub(crate) start: Option<String>,
    /// Destination address or "lat,lon".
    #[arg(value_name = "end")]
    #[serde(default)]
    pub(crate) end: Option<String>,
    /// Vehicle as "brand model year", e.g. "Toyota Corolla 2018".
    #[arg(long = ARG_VEHICLE, value_name = "vehicle")]
    #[serde(default)]
    pub(crate) vehicle: Option<String>,
    /// Consumption in litres per 100 km; overrides the catalogue.
    #[arg(long = ARG_CONSUMPTION, value_name = "litres")]
    #[serde(default)]
    pub(crate) consumption: Option<f64>,
    /// Quantity to optimise: fuel_weight, duration or poi_score.
    #[arg(long = ARG_METRIC, value_name = "metric")]
    #[serde(default)]
    pub(crate) metric: Option<String>,
    /// Name of the stored road network.
    #[arg(long = ARG_AREA, value_name = "name")]
    #[serde(default)]
    pub(crate) area: Option<String>,
    /// Directory of the graph store.
    #[arg(long = ARG_GRAPH_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) graph_dir: Option<Utf8PathBuf>,
    /// openrouteservice API key used for geocoding.
    #[arg(long = ARG_ORS_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) ors_api_key: Option<String>,
    /// Seed for the ant colony search.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Wall-clock budget for each search, in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    pub(crate) start: String,
    pub(crate) end: String,
    pub(crate) vehicle: Option<VehicleSpec>,
    pub(crate) consumption: Option<ConsumptionRate>,
    pub(crate) metric: OptimizationMetric,
    pub(crate) area: String,
    pub(crate) graph_dir: Utf8PathBuf,
    pub(crate) ors_api_key: Option<String>,
    pub(crate) seed: u64,
    pub(crate) timeout: Option<Duration>,
}

impl RouteConfig {
    pub(crate) fn request(&self) -> PlanRequest {
        PlanRequest {
            start_address: self.start.clone(),
            end_address: self.end.clone(),
            vehicle: self.vehicle.clone(),
            custom_rate: self.consumption,
            metric: self.metric,
            seed: self.seed,
        }
    }

    pub(crate) fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            limits: SearchLimits {
                timeout: self.timeout,
            },
            ..PlannerConfig::default()
        }
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let start = args.start.ok_or(CliError::MissingArgument {
            field: ARG_START,
            env: ENV_START,
        })?;
        let end = args.end.ok_or(CliError::MissingArgument {
            field: ARG_END,
            env: ENV_END,
        })?;
        let vehicle = args
            .vehicle
            .as_deref()
            .map(str::parse::<VehicleSpec>)
            .transpose()
            .map_err(|source| CliError::InvalidVehicleValue {
                field: ARG_VEHICLE,
                source,
            })?;
        let consumption = args
            .consumption
            .map(ConsumptionRate::new)
            .transpose()
            .map_err(|source| CliError::InvalidVehicleValue {
                field: ARG_CONSUMPTION,
                source,
            })?;
        let metric = args
            .metric
            .as_deref()
            .map(str::parse::<OptimizationMetric>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            start,
            end,
            vehicle,
            consumption,
            metric,
            area: args.area.unwrap_or_else(|| DEFAULT_AREA.to_owned()),
            graph_dir: args
                .graph_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_GRAPH_DIR)),
            ors_api_key: args.ors_api_key.filter(|key| !key.trim().is_empty()),
            seed: args.seed.unwrap_or(DEFAULT_SEED),
            timeout: args.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Anything able to answer a [`PlanRequest`].
pub(crate) trait PlanRoute {
    fn plan(&self, request: &PlanRequest) -> Result<RouteReport, PlanError>;
}

impl<G, F, P> PlanRoute for RoutePlanner<G, F, P>
where
    G: Geocoder,
    F: FuelCatalog,
    P: PoiProvider,
{
    fn plan(&self, request: &PlanRequest) -> Result<RouteReport, PlanError> {
        RoutePlanner::plan(self, request)
    }
}

/// Builds a planner for the current route invocation.
pub(crate) trait RoutePlannerBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn PlanRoute>, CliError>;
}

/// Geocoder chosen by configuration.
enum CliGeocoder {
    Ors(OrsGeocoder),
    Coordinates(CoordinateGeocoder),
}

impl Geocoder for CliGeocoder {
    fn geocode(&self, address: &str) -> Option<Coord<f64>> {
        match self {
            Self::Ors(geocoder) => geocoder.geocode(address),
            Self::Coordinates(geocoder) => geocoder.geocode(address),
        }
    }
}

pub(crate) struct DefaultRoutePlannerBuilder;

impl RoutePlannerBuilder for DefaultRoutePlannerBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn PlanRoute>, CliError> {
        let geocoder = match &config.ors_api_key {
            Some(key) => CliGeocoder::Ors(OrsGeocoder::new(key.clone()).map_err(|source| {
                CliError::BuildProvider {
                    service: "geocoding",
                    source,
                }
            })?),
            None => {
                log::warn!("no openrouteservice key configured; only \"lat,lon\" addresses resolve");
                CliGeocoder::Coordinates(CoordinateGeocoder)
            }
        };
        let catalog = HttpFuelCatalog::new().map_err(|source| CliError::BuildProvider {
            service: "fuel catalogue",
            source,
        })?;
        let pois = OverpassPoiProvider::new().map_err(|source| CliError::BuildProvider {
            service: "Overpass",
            source,
        })?;
        let store = FileGraphStore::new(config.graph_dir.clone());
        let planner = RoutePlanner::load(
            &store,
            &config.area,
            geocoder,
            catalog,
            pois,
            config.planner_config(),
        )?;
        Ok(Box::new(planner))
    }
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &DefaultRoutePlannerBuilder, &mut stdout)
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    builder: &dyn RoutePlannerBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_route(&config, builder)?;
    write_json(writer, &report)
}

pub(crate) fn execute_route(
    config: &RouteConfig,
    builder: &dyn RoutePlannerBuilder,
) -> Result<RouteReport, CliError> {
    let planner = builder.build(config)?;
    Ok(planner.plan(&config.request())?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
