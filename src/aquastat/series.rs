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
use crate::row::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// History of readings in columnar form: a single time axis and one sequence of
/// values per metric, suitable for charting.
///
/// Values can only be added a reading at a time, so the timeline and every metric's
/// values always have the same length, and the value at index `i` of each metric belongs
/// to the reading at index `i` of the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    timeline: Vec<NaiveDateTime>,
    values: [Vec<f64>; Metric::ALL.len()],
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading to the end of the timeline and each metric's values.
    pub fn push(&mut self, reading: &Reading) {
        self.timeline.push(reading.when);
        for metric in Metric::ALL {
            self.values[metric.index()].push(reading.measurements.get(metric));
        }
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn timeline(&self) -> &[NaiveDateTime] {
        &self.timeline
    }

    pub fn values(&self, metric: Metric) -> &[f64] {
        &self.values[metric.index()]
    }

    /// Every metric and its values, in column order.
    pub fn series(&self) -> impl Iterator<Item = (Metric, &[f64])> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.values(m)))
    }

    /// Rebuild the reading at index `i` of the timeline.
    pub fn get(&self, i: usize) -> Option<Reading> {
        let when = *self.timeline.get(i)?;
        // Every metric has a value at `i` if the timeline does
        let measurements = Measurements::try_from_fn::<_, ()>(|m| Ok(self.values(m)[i])).ok()?;
        Some(Reading::new(when, measurements))
    }

    /// The most recently appended reading.
    pub fn latest(&self) -> Option<Reading> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }
}

impl Extend<Reading> for SeriesSet {
    fn extend<T: IntoIterator<Item = Reading>>(&mut self, iter: T) {
        for r in iter {
            self.push(&r);
        }
    }
}

impl FromIterator<Reading> for SeriesSet {
    fn from_iter<T: IntoIterator<Item = Reading>>(iter: T) -> Self {
        let mut set = SeriesSet::new();
        set.extend(iter);
        set
    }
}

struct Timeline<'a>(&'a [NaiveDateTime]);

impl Serialize for Timeline<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|t| t.format(TIMESTAMP_FORMAT).to_string()))
    }
}

struct Series<'a>(&'a SeriesSet);

impl Serialize for Series<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.series().map(|(m, v)| (m.name(), v)))
    }
}

/// Serialized as `{"timeline": ["2024-01-01 12:00:00", ...], "series": {"water_temperature": [21.5, ...], ...}}`
impl Serialize for SeriesSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SeriesSet", 2)?;
        s.serialize_field("timeline", &Timeline(&self.timeline))?;
        s.serialize_field("series", &Series(self))?;
        s.end()
    }
}

#[cfg(test)]
mod test {
    use super::SeriesSet;
    use crate::reading::{Measurements, Metric, Moisture, Ph, Reading, TemperatureCelsius};
    use chrono::NaiveDate;

    fn reading(minute: u32, base: f64) -> Reading {
        let when = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap();

        Reading::new(
            when,
            Measurements {
                water_temperature: TemperatureCelsius::from(base),
                air_temperature: TemperatureCelsius::from(base + 1.0),
                moisture: Moisture::from(base + 2.0),
                ph: Ph::from(base + 3.0),
            },
        )
    }

    #[test]
    fn test_empty() {
        let set = SeriesSet::new();

        assert!(set.is_empty());
        assert_eq!(None, set.latest());
        assert!(set.series().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_push_keeps_alignment() {
        let readings = vec![reading(0, 10.0), reading(1, 20.0), reading(2, 30.0)];
        let set: SeriesSet = readings.iter().copied().collect();

        assert_eq!(3, set.len());
        for (metric, values) in set.series() {
            assert_eq!(set.timeline().len(), values.len());
            for (i, r) in readings.iter().enumerate() {
                assert_eq!(r.measurements.get(metric), values[i]);
            }
        }

        assert_eq!(&[20.0, 21.0, 22.0, 23.0], &[
            set.values(Metric::WaterTemperature)[1],
            set.values(Metric::AirTemperature)[1],
            set.values(Metric::Moisture)[1],
            set.values(Metric::Ph)[1],
        ]);
    }

    #[test]
    fn test_get_and_latest() {
        let set: SeriesSet = vec![reading(0, 10.0), reading(1, 20.0)].into_iter().collect();

        assert_eq!(Some(reading(0, 10.0)), set.get(0));
        assert_eq!(Some(reading(1, 20.0)), set.latest());
        assert_eq!(None, set.get(2));
    }

    #[test]
    fn test_serialize_json() {
        let set: SeriesSet = vec![reading(0, 10.0)].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();

        assert_eq!(
            serde_json::json!({
                "timeline": ["2024-01-01 12:00:00"],
                "series": {
                    "water_temperature": [10.0],
                    "air_temperature": [11.0],
                    "moisture": [12.0],
                    "ph": [13.0],
                },
            }),
            json
        );
    }
}
