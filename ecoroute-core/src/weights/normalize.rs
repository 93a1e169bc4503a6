use super::{EdgeWeights, WeightTable};

/// Added to every min-max denominator so uniform channels stay finite.
pub const NORMALIZATION_EPSILON: f64 = 1e-6;

/// Lower bound applied to POI scores before taking the logarithm.
pub const POI_LOG_FLOOR: f64 = 1e-3;

/// Min-max rescaled copy of the fuel, length and POI channels.
///
/// Built from a raw [`WeightTable`] without modifying it, so normalising
/// twice yields the same values. `poi` is a desirability in `[0, 1]`: higher
/// means more points of interest nearby.
///
/// # Examples
/// ```
/// use ecoroute_core::{EdgeWeights, NormalizedWeights};
///
/// let raw = [
///     EdgeWeights { fuel: 1.0, length: 100.0, duration: 1.0, poi: 1.0 },
///     EdgeWeights { fuel: 3.0, length: 300.0, duration: 1.0, poi: 0.25 },
/// ];
/// let norm = NormalizedWeights::from_weights(&raw);
/// assert_eq!(norm.fuel(0), 0.0);
/// assert!(norm.fuel(1) > 0.999);
/// assert!(norm.poi(1) > norm.poi(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWeights {
    fuel: Vec<f64>,
    length: Vec<f64>,
    poi: Vec<f64>,
}

struct Range {
    min: f64,
    span: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min.is_finite() && max.is_finite() {
            Self {
                min,
                span: max - min + NORMALIZATION_EPSILON,
            }
        } else {
            Self {
                min: 0.0,
                span: 1.0,
            }
        }
    }

    fn scale(&self, value: f64) -> f64 {
        ((value - self.min) / self.span).clamp(0.0, 1.0)
    }
}

fn poi_log(score: f64) -> f64 {
    (score.max(POI_LOG_FLOOR) + 1.0).ln()
}

impl NormalizedWeights {
    /// Normalise the channels of `table`.
    #[must_use]
    pub fn from_table(table: &WeightTable) -> Self {
        Self::from_weights(table.as_slice())
    }

    /// Normalise a slice of raw edge weights.
    #[must_use]
    pub fn from_weights(weights: &[EdgeWeights]) -> Self {
        let fuel = Range::of(weights.iter().map(|w| w.fuel));
        let length = Range::of(weights.iter().map(|w| w.length));
        let logs: Vec<f64> = weights.iter().map(|w| poi_log(w.poi)).collect();
        let poi = Range::of(logs.iter().copied());
        Self {
            fuel: weights.iter().map(|w| fuel.scale(w.fuel)).collect(),
            length: weights.iter().map(|w| length.scale(w.length)).collect(),
            poi: logs.iter().map(|&l| 1.0 - poi.scale(l)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fuel.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fuel.is_empty()
    }

    /// Normalised fuel of edge `edge`.
    ///
    /// # Panics
    /// Panics if `edge` is out of range.
    #[must_use]
    pub fn fuel(&self, edge: usize) -> f64 {
        self.fuel[edge]
    }

    /// Normalised length of edge `edge`.
    ///
    /// # Panics
    /// Panics if `edge` is out of range.
    #[must_use]
    pub fn length(&self, edge: usize) -> f64 {
        self.length[edge]
    }

    /// POI desirability of edge `edge`.
    ///
    /// # Panics
    /// Panics if `edge` is out of range.
    #[must_use]
    pub fn poi(&self, edge: usize) -> f64 {
        self.poi[edge]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn w(fuel: f64, length: f64, poi: f64) -> EdgeWeights {
        EdgeWeights {
            fuel,
            length,
            duration: 0.0,
            poi,
        }
    }

    #[rstest]
    fn uniform_channels_do_not_divide_by_zero() {
        let norm = NormalizedWeights::from_weights(&[w(2.0, 5.0, 0.5), w(2.0, 5.0, 0.5)]);
        for i in 0..norm.len() {
            assert_eq!(norm.fuel(i), 0.0);
            assert_eq!(norm.length(i), 0.0);
            assert_eq!(norm.poi(i), 1.0);
        }
    }

    #[rstest]
    fn more_pois_means_higher_desirability() {
        let norm = NormalizedWeights::from_weights(&[w(1.0, 1.0, 1.0), w(1.0, 1.0, 1.0 / 11.0)]);
        assert!(norm.poi(0) < 1e-3);
        assert!(norm.poi(1) > 0.999);
    }

    #[rstest]
    fn normalising_is_repeatable() {
        let raw = [w(0.1, 10.0, 1.0), w(0.4, 80.0, 0.2), w(0.2, 40.0, 0.5)];
        assert_eq!(
            NormalizedWeights::from_weights(&raw),
            NormalizedWeights::from_weights(&raw)
        );
    }

    #[rstest]
    fn empty_input_yields_empty_table() {
        assert!(NormalizedWeights::from_weights(&[]).is_empty());
    }
}
