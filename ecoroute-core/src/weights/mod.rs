//! Per-request edge costs derived from physical road attributes.

mod normalize;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use normalize::{NORMALIZATION_EPSILON, NormalizedWeights, POI_LOG_FLOOR};

use crate::network::{Edge, EdgeId, RoadClass, RoadNetwork};
use crate::vehicle::ConsumptionRate;

/// A named scalar cost attached to every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightChannel {
    /// Litres of fuel.
    #[serde(rename = "fuel_weight", alias = "fuel")]
    Fuel,
    /// Metres.
    #[serde(rename = "length_weight", alias = "length")]
    Length,
    /// Seconds.
    #[serde(rename = "duration_weight", alias = "duration")]
    Duration,
    /// POI desirability; lower means more points of interest nearby.
    #[serde(rename = "poi_score", alias = "poi")]
    Poi,
}

impl WeightChannel {
    pub const ALL: [Self; 4] = [Self::Fuel, Self::Length, Self::Duration, Self::Poi];

    /// Canonical attribute name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fuel => "fuel_weight",
            Self::Length => "length_weight",
            Self::Duration => "duration_weight",
            Self::Poi => "poi_score",
        }
    }
}

impl fmt::Display for WeightChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no weight channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown weight channel `{0}`")]
pub struct ParseChannelError(pub String);

impl FromStr for WeightChannel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fuel_weight" | "fuel" => Ok(Self::Fuel),
            "length_weight" | "length" => Ok(Self::Length),
            "duration_weight" | "duration" => Ok(Self::Duration),
            "poi_score" | "poi" => Ok(Self::Poi),
            _ => Err(ParseChannelError(s.to_owned())),
        }
    }
}

/// Derived costs of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeWeights {
    pub fuel: f64,
    pub length: f64,
    pub duration: f64,
    pub poi: f64,
}

impl EdgeWeights {
    /// Value of `channel`.
    #[must_use]
    pub const fn get(&self, channel: WeightChannel) -> f64 {
        match channel {
            WeightChannel::Fuel => self.fuel,
            WeightChannel::Length => self.length,
            WeightChannel::Duration => self.duration,
            WeightChannel::Poi => self.poi,
        }
    }
}

/// Fuel multiplier for a road class: efficient cruising on motorways and
/// trunks, stop-and-go in residential streets.
#[must_use]
pub const fn fuel_coefficient(class: RoadClass) -> f64 {
    match class {
        RoadClass::Motorway | RoadClass::Trunk => 0.8,
        RoadClass::Residential | RoadClass::LivingStreet | RoadClass::Service => 1.3,
        _ => 1.0,
    }
}

/// Assumed travel speed for a road class in km/h.
#[must_use]
pub const fn speed_kmh(class: RoadClass) -> f64 {
    match class {
        RoadClass::Motorway | RoadClass::Trunk => 90.0,
        RoadClass::Primary | RoadClass::Secondary => 60.0,
        RoadClass::Tertiary | RoadClass::Residential => 40.0,
        RoadClass::LivingStreet | RoadClass::Service => 20.0,
        RoadClass::Unknown => 30.0,
    }
}

fn fuel_weight(edge: &Edge, rate: ConsumptionRate) -> f64 {
    (edge.length_m / 100_000.0) * rate.get() * fuel_coefficient(edge.road_class)
}

fn duration_weight(edge: &Edge) -> f64 {
    let speed = speed_kmh(edge.road_class);
    if speed > 0.0 {
        (edge.length_m / 1000.0) / speed * 3600.0
    } else {
        edge.length_m / 5.0
    }
}

fn poi_score(edge: &Edge) -> f64 {
    1.0 / (1.0 + f64::from(edge.poi_count))
}

fn sanitise(value: f64, channel: WeightChannel, id: usize) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("clamping {channel} of edge {id} from {value} to 0");
        0.0
    }
}

fn edge_weights(id: usize, edge: &Edge, rate: ConsumptionRate) -> EdgeWeights {
    EdgeWeights {
        fuel: sanitise(fuel_weight(edge, rate), WeightChannel::Fuel, id),
        length: sanitise(edge.length_m, WeightChannel::Length, id),
        duration: sanitise(duration_weight(edge), WeightChannel::Duration, id),
        poi: poi_score(edge),
    }
}

/// Per-request overlay of derived costs, indexed by [`EdgeId`].
///
/// The table never mutates the [`RoadNetwork`] it was built from, so one
/// network can serve concurrent requests with different vehicles.
///
/// # Examples
/// ```
/// use ecoroute_core::{ConsumptionRate, Edge, EdgeId, Node, RoadClass, RoadNetwork, WeightTable};
///
/// let network = RoadNetwork::new(
///     vec![Node::new(1, 0.0, 0.0), Node::new(2, 0.01, 0.0)],
///     vec![Edge::new(1, 2, 1_000.0, RoadClass::Motorway)],
/// )
/// .expect("network");
/// let table = WeightTable::assign(&network, ConsumptionRate::FALLBACK);
/// let w = table.get(EdgeId(0)).expect("weights");
/// assert!((w.fuel - 0.064).abs() < 1e-12);
/// assert!((w.duration - 40.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: Vec<EdgeWeights>,
    consumption: ConsumptionRate,
}

impl WeightTable {
    /// Compute every channel for every edge of `network`.
    #[must_use]
    pub fn assign(network: &RoadNetwork, consumption: ConsumptionRate) -> Self {
        let weights = network
            .edges()
            .iter()
            .enumerate()
            .map(|(id, edge)| edge_weights(id, edge, consumption))
            .collect();
        Self {
            weights,
            consumption,
        }
    }

    /// Recompute the fuel channel for a new consumption rate.
    ///
    /// Length, duration and POI values are left untouched.
    pub fn update_consumption(&mut self, network: &RoadNetwork, consumption: ConsumptionRate) {
        for (id, (weights, edge)) in self.weights.iter_mut().zip(network.edges()).enumerate() {
            weights.fuel = sanitise(fuel_weight(edge, consumption), WeightChannel::Fuel, id);
        }
        self.consumption = consumption;
    }

    /// The rate the fuel channel was computed with.
    #[must_use]
    pub const fn consumption(&self) -> ConsumptionRate {
        self.consumption
    }

    /// Weights of edge `id`.
    #[must_use]
    pub fn get(&self, id: EdgeId) -> Option<&EdgeWeights> {
        self.weights.get(id.index())
    }

    /// One channel of edge `id`, or `None` for an unknown edge.
    #[must_use]
    pub fn weight(&self, id: EdgeId, channel: WeightChannel) -> Option<f64> {
        self.get(id).map(|w| w.get(channel))
    }

    /// All edge weights in edge order.
    #[must_use]
    pub fn as_slice(&self) -> &[EdgeWeights] {
        &self.weights
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub(crate) fn raw(&self, edge: usize, channel: WeightChannel) -> f64 {
        self.weights[edge].get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::three_node_path;
    use rstest::rstest;

    fn rate(v: f64) -> ConsumptionRate {
        ConsumptionRate::new(v).expect("rate")
    }

    #[rstest]
    fn three_node_path_matches_hand_computed_weights() {
        let network = three_node_path();
        let table = WeightTable::assign(&network, rate(8.0));
        let ab = table.get(EdgeId(0)).expect("A-B");
        let bc = table.get(EdgeId(1)).expect("B-C");
        assert!((ab.fuel - 0.064).abs() < 1e-12);
        assert!((ab.duration - 40.0).abs() < 1e-9);
        assert_eq!(ab.length, 1000.0);
        assert!((bc.fuel - 0.052).abs() < 1e-12);
        assert!((bc.duration - 45.0).abs() < 1e-9);
        assert_eq!(ab.poi, 1.0);
    }

    #[rstest]
    fn link_roads_use_default_speed_and_coefficient() {
        let class = RoadClass::from_highway("motorway_link");
        let weights = edge_weights(0, &Edge::new(1, 2, 1000.0, class), rate(8.0));
        assert!((weights.duration - 120.0).abs() < 1e-9);
        assert!((weights.fuel - 0.08).abs() < 1e-12);
    }

    #[rstest]
    fn update_consumption_only_touches_fuel() {
        let network = three_node_path();
        let mut table = WeightTable::assign(&network, rate(8.0));
        let before = table.clone();
        table.update_consumption(&network, rate(4.0));
        for (old, new) in before.as_slice().iter().zip(table.as_slice()) {
            assert!((new.fuel - old.fuel / 2.0).abs() < 1e-12);
            assert_eq!(new.length, old.length);
            assert_eq!(new.duration, old.duration);
            assert_eq!(new.poi, old.poi);
        }
        assert_eq!(table.consumption().get(), 4.0);
    }

    #[rstest]
    fn assignment_is_idempotent() {
        let network = three_node_path();
        let first = WeightTable::assign(&network, rate(8.0));
        let mut second = first.clone();
        second.update_consumption(&network, rate(8.0));
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 0.5)]
    #[case(3, 0.25)]
    fn poi_score_decreases_with_count(#[case] count: u32, #[case] expected: f64) {
        let edge = Edge::new(1, 2, 10.0, RoadClass::Primary).with_poi_count(count);
        assert_eq!(poi_score(&edge), expected);
    }

    #[rstest]
    #[case("fuel", WeightChannel::Fuel)]
    #[case("fuel_weight", WeightChannel::Fuel)]
    #[case("Duration", WeightChannel::Duration)]
    #[case("poi", WeightChannel::Poi)]
    #[case("length_weight", WeightChannel::Length)]
    fn parses_channel_aliases(#[case] raw: &str, #[case] expected: WeightChannel) {
        assert_eq!(raw.parse::<WeightChannel>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_channel() {
        assert!("scenic".parse::<WeightChannel>().is_err());
    }
}
