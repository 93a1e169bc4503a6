//! Fuel catalogue backed by the fueleconomy.gov REST service.
//!
//! A lookup takes two requests: the vehicle menu for `year`, `make` and
//! `model` yields the first matching configuration id, and the vehicle
//! record for that id carries city and highway MPG figures.

use ecoroute_core::{ConsumptionRate, FuelCatalog, VehicleSpec};
use serde::Deserialize;
use thiserror::Error;

use crate::http::{FetchError, HttpBridge, HttpProviderConfig, ProviderBuildError};

/// Base URL of the public fueleconomy.gov REST service.
pub const FUEL_ECONOMY_URL: &str = "https://www.fueleconomy.gov/ws/rest";

/// Litres per 100 km equivalent to one US mile per gallon, inverted.
const MPG_TO_L_PER_100KM: f64 = 235.2;

/// Errors raised while looking up a vehicle.
#[derive(Debug, Error)]
pub enum FuelLookupError {
    /// A request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The catalogue lists no configuration for the vehicle.
    #[error("no catalogue entry for {vehicle}")]
    UnknownVehicle {
        /// The vehicle as requested.
        vehicle: String,
    },
    /// The vehicle record lacks usable MPG figures.
    #[error("vehicle record {id} has no usable MPG figures")]
    MissingFigures {
        /// Catalogue id of the record.
        id: String,
    },
}

/// Either a single item or a list; the menu endpoint collapses one-item
/// lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(items) => items.into_iter().next(),
        }
    }
}

/// A number the service may send either bare or quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Figure {
    Number(f64),
    Text(String),
}

impl Figure {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MenuOptions {
    #[serde(rename = "menuItem")]
    menu_item: Option<OneOrMany<MenuItem>>,
}

#[derive(Debug, Deserialize)]
struct MenuItem {
    value: Figure,
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    city08: Option<Figure>,
    highway08: Option<Figure>,
}

/// Average consumption for the given MPG figures.
///
/// Returns `None` unless both figures are positive.
///
/// # Examples
/// ```
/// use ecoroute_data::litres_per_100km;
///
/// let rate = litres_per_100km(30.0, 40.0).expect("rate");
/// assert_eq!(rate.get(), 6.7);
/// assert!(litres_per_100km(0.0, 40.0).is_none());
/// ```
#[must_use]
pub fn litres_per_100km(city_mpg: f64, highway_mpg: f64) -> Option<ConsumptionRate> {
    if !(city_mpg > 0.0 && highway_mpg > 0.0) {
        return None;
    }
    let average = (city_mpg + highway_mpg) / 2.0;
    let litres = (MPG_TO_L_PER_100KM / average * 10.0).round() / 10.0;
    ConsumptionRate::new(litres).ok()
}

fn first_vehicle_id(options: MenuOptions) -> Option<String> {
    options
        .menu_item
        .and_then(OneOrMany::into_first)
        .map(|item| item.value.label())
}

fn record_rate(id: &str, record: &VehicleRecord) -> Result<ConsumptionRate, FuelLookupError> {
    let city = record.city08.as_ref().and_then(Figure::value);
    let highway = record.highway08.as_ref().and_then(Figure::value);
    city.zip(highway)
        .and_then(|(c, h)| litres_per_100km(c, h))
        .ok_or_else(|| FuelLookupError::MissingFigures { id: id.to_owned() })
}

/// [`FuelCatalog`] querying fueleconomy.gov.
#[derive(Debug)]
pub struct HttpFuelCatalog {
    config: HttpProviderConfig,
    bridge: HttpBridge,
}

impl HttpFuelCatalog {
    /// Create a catalogue for the public service.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpProviderConfig::new(FUEL_ECONOMY_URL))
    }

    /// Create a catalogue with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn with_config(config: HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let bridge = HttpBridge::new(&config)?;
        Ok(Self { config, bridge })
    }

    fn options_url(&self) -> String {
        self.config.endpoint("vehicle/menu/options")
    }

    fn vehicle_url(&self, id: &str) -> String {
        self.config.endpoint(&format!("vehicle/{id}"))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        log::debug!("GET {url}");
        self.bridge
            .client()
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.bridge.classify(err, url))?
            .json()
            .await
            .map_err(|err| self.bridge.classify(err, url))
    }

    async fn fetch(&self, vehicle: &VehicleSpec) -> Result<ConsumptionRate, FuelLookupError> {
        let query = [
            ("year", vehicle.year.to_string()),
            ("make", vehicle.brand.clone()),
            ("model", vehicle.model.clone()),
        ];
        let options: MenuOptions = self.get_json(&self.options_url(), &query).await?;
        let id = first_vehicle_id(options).ok_or_else(|| FuelLookupError::UnknownVehicle {
            vehicle: vehicle.to_string(),
        })?;
        let record: VehicleRecord = self.get_json(&self.vehicle_url(&id), &[]).await?;
        record_rate(&id, &record)
    }

    /// Look up `vehicle`, reporting why it failed.
    ///
    /// # Errors
    /// Returns [`FuelLookupError`] when a request fails or the catalogue has
    /// no usable figures.
    pub fn try_lookup(&self, vehicle: &VehicleSpec) -> Result<ConsumptionRate, FuelLookupError> {
        self.bridge.block_on(self.fetch(vehicle))
    }
}

impl FuelCatalog for HttpFuelCatalog {
    fn lookup(&self, vehicle: &VehicleSpec) -> Option<ConsumptionRate> {
        match self.try_lookup(vehicle) {
            Ok(rate) => {
                log::info!("catalogue consumption for {vehicle}: {rate}");
                Some(rate)
            }
            Err(err) => {
                log::warn!("fuel lookup for {vehicle} failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"menuItem": {"text": "Auto 6-spd", "value": "40123"}}"#, Some("40123"))]
    #[case(
        r#"{"menuItem": [{"text": "a", "value": "1"}, {"text": "b", "value": "2"}]}"#,
        Some("1")
    )]
    #[case(r#"{"menuItem": [{"text": "a", "value": 77}]}"#, Some("77"))]
    #[case(r#"{"menuItem": []}"#, None)]
    #[case(r#"{}"#, None)]
    fn extracts_the_first_vehicle_id(#[case] json: &str, #[case] expected: Option<&str>) {
        let options: MenuOptions = serde_json::from_str(json).expect("menu json");
        assert_eq!(first_vehicle_id(options).as_deref(), expected);
    }

    #[rstest]
    fn converts_record_figures() {
        let record: VehicleRecord =
            serde_json::from_str(r#"{"city08": "25", "highway08": 35, "make": "Toyota"}"#)
                .expect("record json");
        let rate = record_rate("40123", &record).expect("rate");
        assert_eq!(rate.get(), 7.8);
    }

    #[rstest]
    #[case(r#"{"city08": "28"}"#)]
    #[case(r#"{"city08": "0", "highway08": "0"}"#)]
    #[case(r#"{"city08": "n/a", "highway08": "30"}"#)]
    fn rejects_records_without_figures(#[case] json: &str) {
        let record: VehicleRecord = serde_json::from_str(json).expect("record json");
        assert!(matches!(
            record_rate("1", &record),
            Err(FuelLookupError::MissingFigures { .. })
        ));
    }

    #[rstest]
    fn builds_endpoint_urls() {
        let catalog = HttpFuelCatalog::with_config(HttpProviderConfig::new(
            "https://fuel.example.com/ws/rest/",
        ))
        .expect("catalog");
        assert_eq!(
            catalog.options_url(),
            "https://fuel.example.com/ws/rest/vehicle/menu/options"
        );
        assert_eq!(
            catalog.vehicle_url("40123"),
            "https://fuel.example.com/ws/rest/vehicle/40123"
        );
    }

    #[rstest]
    fn unreachable_service_degrades_to_none() {
        let catalog = HttpFuelCatalog::with_config(
            HttpProviderConfig::new("http://127.0.0.1:9")
                .with_timeout(std::time::Duration::from_millis(200)),
        )
        .expect("catalog");
        let vehicle: VehicleSpec = "Toyota Corolla 2018".parse().expect("vehicle");
        assert!(catalog.lookup(&vehicle).is_none());
    }
}
