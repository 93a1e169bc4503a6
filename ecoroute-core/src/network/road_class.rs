use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Categorical road type taken from the OpenStreetMap `highway` tag.
///
/// Anything not listed deserialises to [`RoadClass::Unknown`].
///
/// # Examples
/// ```
/// use ecoroute_core::RoadClass;
///
/// assert_eq!("motorway".parse::<RoadClass>(), Ok(RoadClass::Motorway));
/// assert_eq!("bridleway".parse::<RoadClass>(), Ok(RoadClass::Unknown));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    LivingStreet,
    Service,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RoadClass {
    /// All classes, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Motorway,
        Self::Trunk,
        Self::Primary,
        Self::Secondary,
        Self::Tertiary,
        Self::Residential,
        Self::LivingStreet,
        Self::Service,
        Self::Unknown,
    ];

    /// The OpenStreetMap tag value for this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motorway => "motorway",
            Self::Trunk => "trunk",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Residential => "residential",
            Self::LivingStreet => "living_street",
            Self::Service => "service",
            Self::Unknown => "unknown",
        }
    }

    /// Interpret an OSM `highway` value.
    ///
    /// Only exact class names match; link roads such as `motorway_link` are
    /// [`RoadClass::Unknown`], as they are when deserialised.
    #[must_use]
    pub fn from_highway(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "motorway" => Self::Motorway,
            "trunk" => Self::Trunk,
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            "tertiary" => Self::Tertiary,
            "residential" => Self::Residential,
            "living_street" => Self::LivingStreet,
            "service" => Self::Service,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_highway(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("motorway", RoadClass::Motorway)]
    #[case("motorway_link", RoadClass::Unknown)]
    #[case("trunk_link", RoadClass::Unknown)]
    #[case("primary_link", RoadClass::Unknown)]
    #[case("Living_Street", RoadClass::LivingStreet)]
    #[case(" service ", RoadClass::Service)]
    #[case("footway", RoadClass::Unknown)]
    fn parses_highway_tags(#[case] raw: &str, #[case] expected: RoadClass) {
        assert_eq!(RoadClass::from_highway(raw), expected);
    }

    #[rstest]
    fn display_round_trips_through_parse() {
        for class in RoadClass::ALL {
            assert_eq!(RoadClass::from_highway(&class.to_string()), class);
        }
    }

    #[rstest]
    #[case("motorway_link")]
    #[case("living_street")]
    #[case("cycleway")]
    fn parsing_agrees_with_deserialising(#[case] raw: &str) {
        let class: RoadClass =
            serde_json::from_value(serde_json::Value::from(raw)).expect("deserialise");
        assert_eq!(RoadClass::from_highway(raw), class);
    }

    #[rstest]
    fn unknown_tag_deserialises_to_unknown() {
        let class: RoadClass = serde_json::from_str("\"cycleway\"").expect("deserialise");
        assert_eq!(class, RoadClass::Unknown);
    }
}
