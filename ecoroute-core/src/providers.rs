//! Interfaces to the collaborators the routing core depends on.
//!
//! Implementations live outside the core (see the `ecoroute-data` crate);
//! the core only relies on these traits so tests can substitute in-memory
//! doubles.

use std::error::Error as StdError;

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geodesy::{METRES_PER_DEGREE, planar_line_distance};
use crate::network::{GraphError, RoadNetwork};
use crate::poi::PointOfInterest;
use crate::vehicle::{ConsumptionRate, VehicleSpec};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors raised by a [`GraphProvider`].
#[derive(Debug, Error)]
pub enum GraphLoadError {
    /// Neither a stored copy nor a fetch produced the area.
    #[error("road network for `{area}` is unavailable")]
    Unavailable {
        area: String,
        #[source]
        source: BoxError,
    },
    /// A stored copy exists but could not be decoded.
    #[error("stored road network for `{area}` is corrupt")]
    Corrupt {
        area: String,
        #[source]
        source: BoxError,
    },
    /// The decoded data does not form a valid network.
    #[error("road network for `{area}` is invalid")]
    Invalid {
        area: String,
        #[source]
        source: GraphError,
    },
}

/// Supplies the road network of a named area.
pub trait GraphProvider: Send + Sync {
    /// Load the network for `area`.
    ///
    /// # Errors
    /// Returns [`GraphLoadError`] when the area cannot be produced.
    fn load(&self, area: &str) -> Result<RoadNetwork, GraphLoadError>;
}

/// Resolves free-form addresses to coordinates.
pub trait Geocoder: Send + Sync {
    /// Coordinate (`x = longitude`, `y = latitude`) of `address`, or `None`
    /// when it cannot be resolved.
    fn geocode(&self, address: &str) -> Option<Coord<f64>>;
}

/// Looks up average consumption figures for vehicles.
pub trait FuelCatalog: Send + Sync {
    /// Consumption of `vehicle`, or `None` when unknown or unreachable.
    fn lookup(&self, vehicle: &VehicleSpec) -> Option<ConsumptionRate>;
}

/// A catalogue that knows no vehicles.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFuelCatalog;

impl FuelCatalog for NoFuelCatalog {
    fn lookup(&self, _vehicle: &VehicleSpec) -> Option<ConsumptionRate> {
        None
    }
}

/// Which points of interest to look for and how far from the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiQueryConfig {
    /// Tag key, e.g. `tourism`.
    pub key: String,
    /// Tag value, e.g. `museum`.
    pub value: String,
    /// Maximum distance from the route in metres.
    pub buffer_m: f64,
}

impl Default for PoiQueryConfig {
    fn default() -> Self {
        Self {
            key: "tourism".into(),
            value: "museum".into(),
            buffer_m: 500.0,
        }
    }
}

/// Errors raised by a [`PoiProvider`].
#[derive(Debug, Error)]
pub enum PoiQueryError {
    /// The service could not be reached or answered with an error.
    #[error("POI service unavailable")]
    Unavailable {
        #[source]
        source: BoxError,
    },
    /// The service answered with data that could not be understood.
    #[error("malformed POI response: {reason}")]
    Malformed { reason: String },
}

/// Queries points of interest from an external source.
pub trait PoiProvider: Send + Sync {
    /// Points of interest inside `bbox` tagged `query.key = query.value`.
    ///
    /// # Errors
    /// Returns [`PoiQueryError`] when the source fails.
    fn pois_in_bbox(
        &self,
        bbox: &Rect<f64>,
        query: &PoiQueryConfig,
    ) -> Result<Vec<PointOfInterest>, PoiQueryError>;

    /// Points of interest within `query.buffer_m` of `route`.
    ///
    /// Distances are measured in degrees and converted at
    /// [`METRES_PER_DEGREE`].
    ///
    /// # Errors
    /// Propagates failures of [`PoiProvider::pois_in_bbox`].
    fn pois_along(
        &self,
        route: &LineString<f64>,
        query: &PoiQueryConfig,
    ) -> Result<Vec<PointOfInterest>, PoiQueryError> {
        let margin = query.buffer_m.max(0.0) / METRES_PER_DEGREE;
        let Some(bbox) = line_bounds(route, margin) else {
            return Ok(Vec::new());
        };
        let pois = self.pois_in_bbox(&bbox, query)?;
        Ok(pois
            .into_iter()
            .filter(|poi| {
                planar_line_distance(poi.location, route)
                    .is_some_and(|d| d * METRES_PER_DEGREE <= query.buffer_m)
            })
            .collect())
    }
}

/// Bounding box of `line` grown by `margin` degrees on every side.
fn line_bounds(line: &LineString<f64>, margin: f64) -> Option<Rect<f64>> {
    let rect = line.bounding_rect()?;
    let grow = Coord { x: margin, y: margin };
    Some(Rect::new(rect.min() - grow, rect.max() + grow))
}

/// Geocoder accepting literal `"lat,lon"` coordinates.
///
/// # Examples
/// ```
/// use ecoroute_core::{CoordinateGeocoder, Geocoder};
///
/// let c = CoordinateGeocoder.geocode("50.45, 30.52").expect("coordinate");
/// assert_eq!((c.x, c.y), (30.52, 50.45));
/// assert!(CoordinateGeocoder.geocode("Maidan Nezalezhnosti").is_none());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateGeocoder;

impl CoordinateGeocoder {
    /// Parse `"lat,lon"`, rejecting out-of-range values.
    #[must_use]
    pub fn parse(input: &str) -> Option<Coord<f64>> {
        let (lat, lon) = input.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
            .then_some(Coord { x: lon, y: lat })
    }
}

impl Geocoder for CoordinateGeocoder {
    fn geocode(&self, address: &str) -> Option<Coord<f64>> {
        Self::parse(address)
    }
}
