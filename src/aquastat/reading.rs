// Aquastat - Aquaponics station sensor history and dashboard
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use chrono::NaiveDateTime;
use std::fmt::{self, Formatter};
use std::str::FromStr;

/// One of the fixed set of values reported by the station.
///
/// The order of `Metric::ALL` is the column order of the history store.
#[derive(PartialEq, Eq, Debug, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Metric {
    WaterTemperature,
    AirTemperature,
    Moisture,
    Ph,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::WaterTemperature,
        Metric::AirTemperature,
        Metric::Moisture,
        Metric::Ph,
    ];

    /// Column name of this metric in the history store (also used as a metric label).
    pub fn name(&self) -> &'static str {
        match self {
            Metric::WaterTemperature => "water_temperature",
            Metric::AirTemperature => "air_temperature",
            Metric::Moisture => "moisture",
            Metric::Ph => "ph",
        }
    }

    /// Position of this metric within `Metric::ALL`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a column name doesn't correspond to any `Metric`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric '{}'", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .find(|m| m.name() == s)
            .copied()
            .ok_or_else(|| UnknownMetric(s.to_owned()))
    }
}

/// Temperature, in degrees celsius
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct TemperatureCelsius(f64);

impl From<TemperatureCelsius> for f64 {
    fn from(v: TemperatureCelsius) -> Self {
        v.0
    }
}

impl From<f64> for TemperatureCelsius {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for TemperatureCelsius {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}c", self.0)
    }
}

/// Soil moisture, as a percentage (from 0 to 100)
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct Moisture(f64);

impl From<Moisture> for f64 {
    fn from(v: Moisture) -> Self {
        v.0
    }
}

impl From<f64> for Moisture {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for Moisture {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Acidity of the water (pH, nominally 0 to 14)
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct Ph(f64);

impl From<Ph> for f64 {
    fn from(v: Ph) -> Self {
        v.0
    }
}

impl From<f64> for Ph {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for Ph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}pH", self.0)
    }
}

/// Every value reported by the station at a single point in time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Measurements {
    pub water_temperature: TemperatureCelsius,
    pub air_temperature: TemperatureCelsius,
    pub moisture: Moisture,
    pub ph: Ph,
}

impl Measurements {
    /// Get the raw value of a single metric.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::WaterTemperature => self.water_temperature.into(),
            Metric::AirTemperature => self.air_temperature.into(),
            Metric::Moisture => self.moisture.into(),
            Metric::Ph => self.ph.into(),
        }
    }

    /// Build measurements by asking `f` for the value of each metric, in column order.
    ///
    /// The first error returned by `f` is returned and the remaining metrics are
    /// not visited.
    pub fn try_from_fn<F, E>(mut f: F) -> Result<Self, E>
    where
        F: FnMut(Metric) -> Result<f64, E>,
    {
        Ok(Self {
            water_temperature: TemperatureCelsius::from(f(Metric::WaterTemperature)?),
            air_temperature: TemperatureCelsius::from(f(Metric::AirTemperature)?),
            moisture: Moisture::from(f(Metric::Moisture)?),
            ph: Ph::from(f(Metric::Ph)?),
        })
    }
}

/// Measurements stamped with the (local, second precision) time they were collected.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reading {
    pub when: NaiveDateTime,
    pub measurements: Measurements,
}

impl Reading {
    pub fn new(when: NaiveDateTime, measurements: Measurements) -> Self {
        Self { when, measurements }
    }
}
