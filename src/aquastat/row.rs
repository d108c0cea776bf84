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

use crate::reading::{Measurements, Metric, Reading};
use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{self, Formatter};
use std::num::ParseFloatError;
use std::str::Utf8Error;

/// Name of the timestamp column of the history store.
pub const WHEN_COLUMN: &str = "when";

/// Header row written as the first line of every history store.
pub const HEADER: &str = "when,water_temperature,air_temperature,moisture,ph";

/// Locale independent format of the `when` column, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DELIMITER: char = ',';

/// A single column of the history store.
#[derive(PartialEq, Eq, Debug, Hash, Clone, Copy)]
pub enum Column {
    When,
    Value(Metric),
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::When => WHEN_COLUMN,
            Column::Value(m) => m.name(),
        }
    }
}

/// Problem with the header row of a history store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    Unknown(String),
    Duplicate(&'static str),
    Missing(&'static str),
    Encoding(Utf8Error),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::Unknown(name) => write!(f, "unknown column '{}' in header", name),
            HeaderError::Duplicate(name) => write!(f, "duplicate column '{}' in header", name),
            HeaderError::Missing(name) => write!(f, "missing column '{}' in header", name),
            HeaderError::Encoding(e) => write!(f, "header is not valid UTF-8: {}", e),
        }
    }
}

impl Error for HeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HeaderError::Encoding(ref e) => Some(e),
            _ => None,
        }
    }
}

/// Problem decoding a single data row of a history store
#[derive(Debug, Clone, PartialEq)]
pub enum RowError {
    ColumnCount(usize, usize),
    Timestamp(String, chrono::ParseError),
    Value(Metric, String, ParseFloatError),
    Encoding(Utf8Error),
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RowError::ColumnCount(expected, got) => {
                write!(f, "wrong number of columns: expected {}, got {}", expected, got)
            }
            RowError::Timestamp(raw, e) => write!(f, "invalid timestamp '{}': {}", raw, e),
            RowError::Value(metric, raw, e) => write!(f, "invalid {} value '{}': {}", metric, raw, e),
            RowError::Encoding(e) => write!(f, "row is not valid UTF-8: {}", e),
        }
    }
}

impl Error for RowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RowError::ColumnCount(_, _) => None,
            RowError::Timestamp(_, ref e) => Some(e),
            RowError::Value(_, _, ref e) => Some(e),
            RowError::Encoding(ref e) => Some(e),
        }
    }
}

/// Position of each column within the rows of a history store.
///
/// Stores written by this crate always use the canonical layout (see `HEADER`) but any
/// ordering of the same five columns is accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<Column>,
    when: usize,
    values: [usize; Metric::ALL.len()],
}

impl Layout {
    /// Layout matching `HEADER`: the timestamp followed by each metric in column order.
    pub fn canonical() -> Self {
        let mut columns = vec![Column::When];
        columns.extend(Metric::ALL.iter().map(|&m| Column::Value(m)));
        Self {
            columns,
            when: 0,
            values: [1, 2, 3, 4],
        }
    }

    /// Discover the layout of a store from its header row.
    pub fn from_header(line: &str) -> Result<Self, HeaderError> {
        let mut columns = Vec::with_capacity(Metric::ALL.len() + 1);

        for name in line.trim_end_matches('\r').split(DELIMITER) {
            let name = name.trim();
            let column = if name == WHEN_COLUMN {
                Column::When
            } else {
                name.parse::<Metric>()
                    .map(Column::Value)
                    .map_err(|e| HeaderError::Unknown(e.0))?
            };

            if columns.contains(&column) {
                return Err(HeaderError::Duplicate(column.name()));
            }

            columns.push(column);
        }

        let position = |column: Column| {
            columns
                .iter()
                .position(|&c| c == column)
                .ok_or(HeaderError::Missing(column.name()))
        };

        let when = position(Column::When)?;
        let mut values = [0; Metric::ALL.len()];
        for metric in Metric::ALL {
            values[metric.index()] = position(Column::Value(metric))?;
        }

        Ok(Self { columns, when, values })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Decode a single data row according to this layout.
    pub fn decode(&self, line: &str) -> Result<Reading, RowError> {
        let fields: Vec<&str> = line.trim_end_matches('\r').split(DELIMITER).collect();
        if fields.len() != self.columns.len() {
            return Err(RowError::ColumnCount(self.columns.len(), fields.len()));
        }

        let raw_when = fields[self.when].trim();
        let when = NaiveDateTime::parse_from_str(raw_when, TIMESTAMP_FORMAT)
            .map_err(|e| RowError::Timestamp(raw_when.to_owned(), e))?;

        let measurements = Measurements::try_from_fn(|metric| {
            let raw = fields[self.values[metric.index()]].trim();
            raw.parse::<f64>()
                .map_err(|e| RowError::Value(metric, raw.to_owned(), e))
        })?;

        Ok(Reading::new(when, measurements))
    }
}

impl Reading {
    /// Encode this reading as a single row of the history store, without a trailing newline.
    ///
    /// Values are written in their shortest form that parses back to the same `f64`,
    /// always including a decimal point (`42.0` rather than `42`).
    pub fn to_row(&self) -> String {
        let mut row = self.when.format(TIMESTAMP_FORMAT).to_string();
        for metric in Metric::ALL {
            row.push(DELIMITER);
            row.push_str(&format!("{:?}", self.measurements.get(metric)));
        }

        row
    }

    /// Decode a row written by `Reading::to_row`.
    pub fn from_row(line: &str) -> Result<Self, RowError> {
        Layout::canonical().decode(line)
    }
}

#[cfg(test)]
mod test {
    use super::{Column, HeaderError, Layout, RowError, HEADER};
    use crate::reading::{Measurements, Metric, Moisture, Ph, Reading, TemperatureCelsius};
    use chrono::NaiveDate;

    fn reading() -> Reading {
        let when = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        Reading::new(
            when,
            Measurements {
                water_temperature: TemperatureCelsius::from(21.5),
                air_temperature: TemperatureCelsius::from(19.0),
                moisture: Moisture::from(42.0),
                ph: Ph::from(6.8),
            },
        )
    }

    #[test]
    fn test_to_row() {
        assert_eq!("2024-01-01 12:00:00,21.5,19.0,42.0,6.8", reading().to_row());
    }

    #[test]
    fn test_from_row_round_trip() {
        let mut r = reading();
        r.measurements.water_temperature = TemperatureCelsius::from(-127.0);
        r.measurements.ph = Ph::from(0.1 + 0.2);

        assert_eq!(r, Reading::from_row(&r.to_row()).unwrap());
    }

    #[test]
    fn test_from_row_crlf() {
        let r = Reading::from_row("2024-01-01 12:00:00,21.5,19.0,42.0,6.8\r").unwrap();
        assert_eq!(reading(), r);
    }

    #[test]
    fn test_from_row_integral_values() {
        let r = Reading::from_row("2024-01-01 12:00:00,21.5,19,42,6.8").unwrap();
        assert_eq!(reading(), r);
    }

    #[test]
    fn test_from_row_column_count() {
        let res = Reading::from_row("2024-01-01 12:00:00,21.5,19.0,42.0");
        assert_eq!(RowError::ColumnCount(5, 4), res.unwrap_err());
    }

    #[test]
    fn test_from_row_bad_timestamp() {
        let res = Reading::from_row("2024-01-01T12:00:00,21.5,19.0,42.0,6.8");
        assert!(matches!(res, Err(RowError::Timestamp(raw, _)) if raw == "2024-01-01T12:00:00"));
    }

    #[test]
    fn test_from_row_bad_value() {
        let res = Reading::from_row("2024-01-01 12:00:00,21.5,19.0,wet,6.8");
        assert!(matches!(res, Err(RowError::Value(Metric::Moisture, raw, _)) if raw == "wet"));
    }

    #[test]
    fn test_layout_from_canonical_header() {
        assert_eq!(Layout::canonical(), Layout::from_header(HEADER).unwrap());
    }

    #[test]
    fn test_layout_reordered_header() {
        let layout = Layout::from_header("ph,moisture,when,air_temperature,water_temperature").unwrap();
        assert_eq!(Column::Value(Metric::Ph), layout.columns()[0]);

        let r = layout.decode("6.8,42,2024-01-01 12:00:00,19.0,21.5").unwrap();
        assert_eq!(reading(), r);
    }

    #[test]
    fn test_layout_header_errors() {
        assert_eq!(
            HeaderError::Unknown("humidity".to_owned()),
            Layout::from_header("when,humidity,water_temperature,air_temperature,moisture,ph").unwrap_err()
        );
        assert_eq!(
            HeaderError::Duplicate("ph"),
            Layout::from_header("when,ph,water_temperature,air_temperature,moisture,ph").unwrap_err()
        );
        assert_eq!(
            HeaderError::Missing("when"),
            Layout::from_header("water_temperature,air_temperature,moisture,ph").unwrap_err()
        );
        assert_eq!(
            HeaderError::Missing("moisture"),
            Layout::from_header("when,water_temperature,air_temperature,ph").unwrap_err()
        );
    }
}
