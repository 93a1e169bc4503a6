//! Points of interest from an Overpass API endpoint.

use std::collections::HashMap;

use ecoroute_core::{PoiProvider, PoiQueryConfig, PoiQueryError, PointOfInterest};
use geo::{Coord, Rect};
use serde::Deserialize;

use crate::http::{FetchError, HttpBridge, HttpProviderConfig, ProviderBuildError};

/// Public Overpass interpreter.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Server-side timeout requested in each query, in seconds.
const QUERY_TIMEOUT_SECS: u32 = 25;

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass QL selecting nodes, ways and relations tagged
/// `query.key = query.value` inside `bbox`.
///
/// Ways and relations are returned with their centre point.
///
/// # Examples
/// ```
/// use ecoroute_core::PoiQueryConfig;
/// use ecoroute_data::build_query;
/// use geo::{Coord, Rect};
///
/// let bbox = Rect::new(Coord { x: 30.5, y: 50.4 }, Coord { x: 30.6, y: 50.5 });
/// let query = build_query(&bbox, &PoiQueryConfig::default());
/// assert!(query.contains(r#"node["tourism"="museum"](50.4,30.5,50.5,30.6);"#));
/// assert!(query.ends_with("out center tags;"));
/// ```
#[must_use]
pub fn build_query(bbox: &Rect<f64>, query: &PoiQueryConfig) -> String {
    let (min, max) = (bbox.min(), bbox.max());
    let filter = format!(
        r#"["{}"="{}"]({},{},{},{})"#,
        escape(&query.key),
        escape(&query.value),
        min.y,
        min.x,
        max.y,
        max.x
    );
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];(node{filter};way{filter};relation{filter};);out center tags;"
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Element {
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl Element {
    fn location(&self) -> Option<Coord<f64>> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some(Coord { x: lon, y: lat }),
            (_, _, Some(center)) => Some(Coord {
                x: center.lon,
                y: center.lat,
            }),
            _ => None,
        }
    }
}

fn into_pois(response: OverpassResponse) -> Vec<PointOfInterest> {
    response
        .elements
        .into_iter()
        .filter_map(|element| {
            let Some(location) = element.location() else {
                log::debug!("skipping Overpass element {} without position", element.id);
                return None;
            };
            Some(PointOfInterest::new(element.id, location, element.tags))
        })
        .collect()
}

/// [`PoiProvider`] posting Overpass QL to an interpreter endpoint.
#[derive(Debug)]
pub struct OverpassPoiProvider {
    url: String,
    bridge: HttpBridge,
}

impl OverpassPoiProvider {
    /// Create a provider for the public interpreter.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpProviderConfig::new(OVERPASS_URL))
    }

    /// Create a provider whose `base_url` is the full interpreter URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or runtime fails to build.
    pub fn with_config(config: HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let bridge = HttpBridge::new(&config)?;
        Ok(Self {
            url: config.base_url,
            bridge,
        })
    }

    async fn fetch(&self, query: String) -> Result<OverpassResponse, FetchError> {
        log::debug!("POST {}", self.url);
        self.bridge
            .client()
            .post(&self.url)
            .form(&[("data", query)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.bridge.classify(err, &self.url))?
            .json()
            .await
            .map_err(|err| self.bridge.classify(err, &self.url))
    }
}

impl PoiProvider for OverpassPoiProvider {
    fn pois_in_bbox(
        &self,
        bbox: &Rect<f64>,
        query: &PoiQueryConfig,
    ) -> Result<Vec<PointOfInterest>, PoiQueryError> {
        let ql = build_query(bbox, query);
        match self.bridge.block_on(self.fetch(ql)) {
            Ok(response) => {
                let pois = into_pois(response);
                log::debug!("Overpass returned {} points of interest", pois.len());
                Ok(pois)
            }
            Err(FetchError::Decode { url, source }) => Err(PoiQueryError::Malformed {
                reason: format!("{url}: {source}"),
            }),
            Err(err) => Err(PoiQueryError::Unavailable {
                source: Box::new(err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bbox() -> Rect<f64> {
        Rect::new(Coord { x: 30.5, y: 50.4 }, Coord { x: 30.6, y: 50.5 })
    }

    #[rstest]
    fn query_covers_every_element_kind() {
        let query = build_query(&bbox(), &PoiQueryConfig::default());
        assert!(query.starts_with("[out:json][timeout:25];"));
        for kind in ["node", "way", "relation"] {
            assert!(
                query.contains(&format!(r#"{kind}["tourism"="museum"](50.4,30.5,50.5,30.6);"#)),
                "missing {kind} clause in {query}"
            );
        }
    }

    #[rstest]
    fn query_escapes_tag_values() {
        let config = PoiQueryConfig {
            key: "name".into(),
            value: r#"Say "hi" \o/"#.into(),
            ..PoiQueryConfig::default()
        };
        let query = build_query(&bbox(), &config);
        assert!(query.contains(r#"["name"="Say \"hi\" \\o/"]"#));
    }

    #[rstest]
    fn parses_nodes_and_centred_ways() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 50.45, "lon": 30.52,
                 "tags": {"tourism": "museum", "name": "Museum of Water"}},
                {"type": "way", "id": 2, "center": {"lat": 50.44, "lon": 30.51},
                 "tags": {"tourism": "museum"}},
                {"type": "relation", "id": 3}
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(json).expect("overpass json");
        let pois = into_pois(response);
        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].name(), "Museum of Water");
        assert_eq!((pois[1].location.x, pois[1].location.y), (30.51, 50.44));
    }

    #[rstest]
    fn missing_elements_mean_no_pois() {
        let response: OverpassResponse = serde_json::from_str("{}").expect("json");
        assert!(into_pois(response).is_empty());
    }

    #[rstest]
    fn unreachable_service_is_unavailable() {
        let provider = OverpassPoiProvider::with_config(
            HttpProviderConfig::new("http://127.0.0.1:9/api/interpreter")
                .with_timeout(std::time::Duration::from_millis(200)),
        )
        .expect("provider");
        let err = provider
            .pois_in_bbox(&bbox(), &PoiQueryConfig::default())
            .expect_err("no service");
        assert!(matches!(err, PoiQueryError::Unavailable { .. }));
    }
}
