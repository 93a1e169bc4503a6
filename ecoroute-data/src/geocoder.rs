//! Address lookup through the openrouteservice geocoding API.

use ecoroute_core::{CoordinateGeocoder, Geocoder};
use geo::Coord;
use serde::Deserialize;

use crate::http::{FetchError, HttpBridge, HttpProviderConfig, ProviderBuildError};

/// Base URL of the public openrouteservice API.
pub const ORS_URL: &str = "https://api.openrouteservice.org";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lon, lat]`, possibly followed by an elevation.
    coordinates: Vec<f64>,
}

fn first_coordinate(collection: &FeatureCollection) -> Option<Coord<f64>> {
    let feature = collection.features.first()?;
    match feature.geometry.coordinates.as_slice() {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Coord { x: *lon, y: *lat }),
        _ => None,
    }
}

/// [`Geocoder`] backed by openrouteservice.
///
/// Inputs that already read as `"lat,lon"` are answered locally without a
/// request.
pub struct OrsGeocoder {
    api_key: String,
    url: String,
    bridge: HttpBridge,
}

impl std::fmt::Debug for OrsGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrsGeocoder")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl OrsGeocoder {
    /// Create a geocoder for the public service.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(api_key, HttpProviderConfig::new(ORS_URL))
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn with_config(
        api_key: impl Into<String>,
        config: HttpProviderConfig,
    ) -> Result<Self, ProviderBuildError> {
        let bridge = HttpBridge::new(&config)?;
        Ok(Self {
            api_key: api_key.into(),
            url: config.endpoint("geocode/search"),
            bridge,
        })
    }

    async fn search(&self, address: &str) -> Result<FeatureCollection, FetchError> {
        log::debug!("GET {}", self.url);
        self.bridge
            .client()
            .get(&self.url)
            .query(&[("api_key", self.api_key.as_str()), ("text", address)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.bridge.classify(err, &self.url))?
            .json()
            .await
            .map_err(|err| self.bridge.classify(err, &self.url))
    }
}

impl Geocoder for OrsGeocoder {
    fn geocode(&self, address: &str) -> Option<Coord<f64>> {
        if let Some(coord) = CoordinateGeocoder::parse(address) {
            return Some(coord);
        }
        match self.bridge.block_on(self.search(address)) {
            Ok(collection) => {
                let found = first_coordinate(&collection);
                if found.is_none() {
                    log::warn!("no geocoding match for `{address}`");
                }
                found
            }
            Err(err) => {
                log::warn!("geocoding `{address}` failed: {err}");
                None
            }
        }
    }
}
