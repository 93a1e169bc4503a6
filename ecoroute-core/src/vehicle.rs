//! Vehicle description and fuel-consumption resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::FuelCatalog;

/// Errors raised while parsing vehicle input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VehicleError {
    /// The vehicle string lacked a brand, model or year.
    #[error("vehicle `{input}` must look like `<brand> <model> <year>`")]
    Malformed { input: String },
    /// The trailing token was not a valid model year.
    #[error("vehicle year `{year}` is not a number")]
    InvalidYear { year: String },
    /// A consumption rate was zero, negative or not a number.
    #[error("fuel consumption `{value}` must be a positive number of litres per 100 km")]
    InvalidRate { value: String },
}

/// Average fuel consumption in litres per 100 km.
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConsumptionRate(f64);

impl ConsumptionRate {
    /// Rate assumed when neither the caller nor the catalogue supplies one.
    pub const FALLBACK: Self = Self(8.0);

    /// Validate a litres-per-100-km figure.
    ///
    /// # Errors
    /// Returns [`VehicleError::InvalidRate`] for non-finite or non-positive
    /// values.
    ///
    /// # Examples
    /// ```
    /// use ecoroute_core::ConsumptionRate;
    ///
    /// assert_eq!(ConsumptionRate::new(6.5).map(|r| r.get()), Ok(6.5));
    /// assert!(ConsumptionRate::new(0.0).is_err());
    /// ```
    pub fn new(litres_per_100km: f64) -> Result<Self, VehicleError> {
        if litres_per_100km.is_finite() && litres_per_100km > 0.0 {
            Ok(Self(litres_per_100km))
        } else {
            Err(VehicleError::InvalidRate {
                value: litres_per_100km.to_string(),
            })
        }
    }

    /// The wrapped litres-per-100-km figure.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for ConsumptionRate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl TryFrom<f64> for ConsumptionRate {
    type Error = VehicleError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConsumptionRate> for f64 {
    fn from(rate: ConsumptionRate) -> Self {
        rate.0
    }
}

impl FromStr for ConsumptionRate {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| VehicleError::InvalidRate {
                value: trimmed.to_owned(),
            })?;
        Self::new(value)
    }
}

impl fmt::Display for ConsumptionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} L/100km", self.0)
    }
}

/// Brand, model and model year of a vehicle.
///
/// Parsed from strings such as `"Toyota Corolla 2018"`. Multi-word models
/// are kept whole: the first token is the brand and the last the year.
///
/// # Examples
/// ```
/// use ecoroute_core::VehicleSpec;
///
/// let spec: VehicleSpec = "Land Rover Defender 110 2021".parse().expect("vehicle");
/// assert_eq!(spec.brand, "Land");
/// assert_eq!(spec.model, "Rover Defender 110");
/// assert_eq!(spec.year, 2021);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub brand: String,
    pub model: String,
    pub year: u16,
}

impl FromStr for VehicleSpec {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let [brand, model @ .., year] = tokens.as_slice() else {
            return Err(VehicleError::Malformed { input: s.to_owned() });
        };
        if model.is_empty() {
            return Err(VehicleError::Malformed { input: s.to_owned() });
        }
        let year = year.parse::<u16>().map_err(|_| VehicleError::InvalidYear {
            year: (*year).to_owned(),
        })?;
        Ok(Self {
            brand: (*brand).to_owned(),
            model: model.join(" "),
            year,
        })
    }
}

impl fmt::Display for VehicleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.brand, self.model, self.year)
    }
}

/// Where a profile's consumption rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Override,
    Catalog,
    Fallback,
}

/// A vehicle together with its resolved consumption rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub vehicle: Option<VehicleSpec>,
    pub consumption: ConsumptionRate,
    pub source: RateSource,
}

impl VehicleProfile {
    /// Resolve the consumption rate for `vehicle`.
    ///
    /// An explicit override wins, then a catalogue hit, then
    /// [`ConsumptionRate::FALLBACK`]. The catalogue is not consulted when an
    /// override is present or no vehicle was named.
    pub fn resolve<C>(
        vehicle: Option<VehicleSpec>,
        override_rate: Option<ConsumptionRate>,
        catalog: &C,
    ) -> Self
    where
        C: FuelCatalog + ?Sized,
    {
        if let Some(consumption) = override_rate {
            return Self {
                vehicle,
                consumption,
                source: RateSource::Override,
            };
        }
        let looked_up = vehicle.as_ref().and_then(|v| catalog.lookup(v));
        match looked_up {
            Some(consumption) => Self {
                vehicle,
                consumption,
                source: RateSource::Catalog,
            },
            None => {
                if let Some(v) = &vehicle {
                    log::warn!(
                        "no consumption figure for {v}; assuming {}",
                        ConsumptionRate::FALLBACK
                    );
                }
                Self {
                    vehicle,
                    consumption: ConsumptionRate::FALLBACK,
                    source: RateSource::Fallback,
                }
            }
        }
    }

    /// Replace the resolved rate after construction.
    pub fn override_consumption(&mut self, rate: ConsumptionRate) {
        self.consumption = rate;
        self.source = RateSource::Override;
    }
}
