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

use crate::reading::{Measurements, Metric};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{self, Formatter};

/// Patterns used to find the value of each metric in the status page of the station.
///
/// Each pattern is matched against the entire page (not line by line) and must contain
/// exactly one capture group for the numeric value. When a label appears more than once,
/// the first match is used.
pub const DEFAULT_PATTERNS: [(Metric, &str); 4] = [
    (Metric::WaterTemperature, r"Water Temperature: (-?\d*\.?\d+)"),
    (Metric::AirTemperature, r"Air Temperature: (-?\d*\.?\d+)"),
    (Metric::Moisture, r"Moisture: (-?\d+)%"),
    (Metric::Ph, r"pH: (-?\d*\.?\d+)"),
];

static DEFAULT_EXTRACTOR: Lazy<Extractor> =
    Lazy::new(|| Extractor::new(&DEFAULT_PATTERNS).expect("invalid default extraction patterns"));

/// No value could be found for a metric in the text of the status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    metric: Metric,
}

impl ExtractionError {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "no {} value found in device status page", self.metric)
    }
}

impl Error for ExtractionError {}

/// Problem with a table of extraction patterns
#[derive(Debug)]
pub enum PatternError {
    Invalid(Metric, regex::Error),
    CaptureGroups(Metric, usize),
    Missing(Metric),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Invalid(metric, e) => write!(f, "invalid pattern for {}: {}", metric, e),
            PatternError::CaptureGroups(metric, got) => {
                write!(f, "pattern for {} must have one capture group, got {}", metric, got)
            }
            PatternError::Missing(metric) => write!(f, "no pattern for {}", metric),
        }
    }
}

impl Error for PatternError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PatternError::Invalid(_, ref e) => Some(e),
            _ => None,
        }
    }
}

/// Extract the value of every metric from the free form text of the station status page.
#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: Vec<Regex>,
}

impl Extractor {
    /// Compile a table of patterns, one per metric.
    ///
    /// An error is returned if a pattern doesn't compile, doesn't have exactly one
    /// capture group, or if any metric has no pattern. Later entries for the same metric
    /// replace earlier ones.
    pub fn new(table: &[(Metric, &str)]) -> Result<Self, PatternError> {
        let mut compiled: [Option<Regex>; Metric::ALL.len()] = Default::default();

        for &(metric, pattern) in table {
            let re = Regex::new(pattern).map_err(|e| PatternError::Invalid(metric, e))?;
            // captures_len() includes the implicit group for the entire match
            let groups = re.captures_len() - 1;
            if groups != 1 {
                return Err(PatternError::CaptureGroups(metric, groups));
            }

            compiled[metric.index()] = Some(re);
        }

        let mut patterns = Vec::with_capacity(compiled.len());
        for (metric, re) in Metric::ALL.iter().zip(compiled) {
            patterns.push(re.ok_or(PatternError::Missing(*metric))?);
        }

        Ok(Self { patterns })
    }

    /// Extract every metric from `text`, failing on the first metric that can't be found.
    pub fn extract(&self, text: &str) -> Result<Measurements, ExtractionError> {
        let measurements = Measurements::try_from_fn(|metric| self.value(metric, text))?;

        tracing::debug!(
            message = "extracted values from device text",
            water_temperature = %measurements.water_temperature,
            air_temperature = %measurements.air_temperature,
            moisture = %measurements.moisture,
            ph = %measurements.ph,
        );

        Ok(measurements)
    }

    fn value(&self, metric: Metric, text: &str) -> Result<f64, ExtractionError> {
        let raw = self.patterns[metric.index()]
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ExtractionError::new(metric))?;

        raw.parse::<f64>().map_err(|e| {
            tracing::debug!(message = "matched non-numeric value", metric = %metric, raw = raw, error = %e);
            ExtractionError::new(metric)
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}
