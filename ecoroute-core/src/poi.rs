use std::collections::HashMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Label used for points of interest without a `name` tag.
pub const UNNAMED_POI: &str = "Unnamed";

/// A location worth passing by.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
/// Tags mirror OpenStreetMap's free-form key/value structure.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use geo::Coord;
/// use ecoroute_core::PointOfInterest;
///
/// let poi = PointOfInterest::new(
///     1,
///     Coord { x: 30.52, y: 50.45 },
///     HashMap::from([("name".into(), "National Art Museum".into())]),
/// );
///
/// assert_eq!(poi.name(), "National Art Museum");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: u64,
    pub location: Coord<f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl PointOfInterest {
    /// Construct a `PointOfInterest` with the provided tags.
    pub fn new(id: u64, location: Coord<f64>, tags: HashMap<String, String>) -> Self {
        Self { id, location, tags }
    }

    /// Construct a `PointOfInterest` without tags.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use ecoroute_core::PointOfInterest;
    ///
    /// let poi = PointOfInterest::with_empty_tags(1, Coord { x: 0.0, y: 0.0 });
    /// assert_eq!(poi.name(), "Unnamed");
    /// ```
    pub fn with_empty_tags(id: u64, location: Coord<f64>) -> Self {
        Self::new(id, location, HashMap::new())
    }

    /// Display name, falling back to [`UNNAMED_POI`].
    #[must_use]
    pub fn name(&self) -> &str {
        self.tags
            .get("name")
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_POI)
    }

    /// Whether the tag `key` holds `value`.
    #[must_use]
    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tags.get(key).is_some_and(|v| v == value)
    }
}
