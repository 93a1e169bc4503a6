//! Choose one route among the candidates produced for a request.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::poi::PointOfInterest;
use crate::search::{Algorithm, Route, RouteMetrics};

/// Criterion used to rank candidates.
///
/// Parsing is lenient: unrecognised names become
/// [`SelectionMetric::Other`], which selects the first candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionMetric {
    /// Lowest total fuel.
    Fuel,
    /// Lowest total duration.
    Duration,
    /// Most points of interest.
    Poi,
    Other(String),
}

impl SelectionMetric {
    /// Interpret a metric name.
    ///
    /// # Examples
    /// ```
    /// use ecoroute_core::SelectionMetric;
    ///
    /// assert_eq!(SelectionMetric::parse("fuel_weight"), SelectionMetric::Fuel);
    /// assert_eq!(SelectionMetric::parse("poi"), SelectionMetric::Poi);
    /// assert_eq!(
    ///     SelectionMetric::parse("scenery"),
    ///     SelectionMetric::Other("scenery".into())
    /// );
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "fuel" | "fuel_weight" => Self::Fuel,
            "duration" | "duration_weight" => Self::Duration,
            "poi" | "poi_score" => Self::Poi,
            _ => Self::Other(name.to_owned()),
        }
    }
}

impl From<String> for SelectionMetric {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SelectionMetric> for String {
    fn from(metric: SelectionMetric) -> Self {
        metric.to_string()
    }
}

impl fmt::Display for SelectionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fuel => f.write_str("fuel"),
            Self::Duration => f.write_str("duration"),
            Self::Poi => f.write_str("poi"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One algorithm's proposal for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    pub algorithm: Algorithm,
    pub route: Route,
    pub metrics: RouteMetrics,
    /// Points of interest counted along the route.
    pub poi_count: usize,
    /// The points of interest themselves, when they were fetched.
    pub pois: Vec<PointOfInterest>,
}

/// Returned when there is nothing to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    /// No algorithm produced a route.
    #[error("no route candidates to select from")]
    NoCandidates,
}

/// Pick the best candidate for `metric`.
///
/// Ties keep the earliest candidate.
///
/// # Errors
/// Returns [`SelectError::NoCandidates`] for an empty slice.
pub fn select_best<'a>(
    candidates: &'a [RouteCandidate],
    metric: &SelectionMetric,
) -> Result<&'a RouteCandidate, SelectError> {
    let first = candidates.first().ok_or(SelectError::NoCandidates)?;
    let best = candidates.iter().skip(1).fold(first, |best, c| {
        let better = match metric {
            SelectionMetric::Fuel => c.metrics.fuel_l < best.metrics.fuel_l,
            SelectionMetric::Duration => c.metrics.duration_s < best.metrics.duration_s,
            SelectionMetric::Poi => c.poi_count > best.poi_count,
            SelectionMetric::Other(_) => false,
        };
        if better { c } else { best }
    });
    log::info!("selected {} route for metric {metric}", best.algorithm);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn candidate(algorithm: Algorithm, fuel: f64, hours: f64, pois: usize) -> RouteCandidate {
        RouteCandidate {
            algorithm,
            route: Route::empty(),
            metrics: RouteMetrics {
                distance_m: 0.0,
                fuel_l: fuel,
                duration_s: hours * 3600.0,
            },
            poi_count: pois,
            pois: Vec::new(),
        }
    }

    #[fixture]
    fn pair() -> Vec<RouteCandidate> {
        vec![
            candidate(Algorithm::AStar, 5.2, 1.1, 3),
            candidate(Algorithm::Dijkstra, 4.8, 1.3, 1),
        ]
    }

    #[rstest]
    #[case("fuel", Algorithm::Dijkstra)]
    #[case("duration", Algorithm::AStar)]
    #[case("poi", Algorithm::AStar)]
    #[case("unheard_of", Algorithm::AStar)]
    fn selects_by_metric(
        pair: Vec<RouteCandidate>,
        #[case] metric: &str,
        #[case] expected: Algorithm,
    ) {
        let best = select_best(&pair, &SelectionMetric::parse(metric)).expect("selection");
        assert_eq!(best.algorithm, expected);
    }

    #[rstest]
    fn ties_keep_the_first_candidate() {
        let tied = vec![
            candidate(Algorithm::Dijkstra, 1.0, 1.0, 2),
            candidate(Algorithm::AStar, 1.0, 1.0, 2),
        ];
        for metric in [SelectionMetric::Fuel, SelectionMetric::Duration, SelectionMetric::Poi] {
            let best = select_best(&tied, &metric).expect("selection");
            assert_eq!(best.algorithm, Algorithm::Dijkstra);
        }
    }

    #[rstest]
    fn empty_input_is_an_error() {
        assert_eq!(
            select_best(&[], &SelectionMetric::Fuel),
            Err(SelectError::NoCandidates)
        );
    }
}
