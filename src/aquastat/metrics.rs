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

use crate::load::LoadError;
use crate::reading::Metric;
use crate::series::SeriesSet;
use chrono::Local;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};

/// Prometheus metrics describing the history store each time it is loaded by the dashboard.
///
/// The latest value of each metric is emitted as a gauge labeled with the metric name.
#[derive(Clone)]
pub struct HistoryMetrics {
    readings: Gauge,
    last_reading: Gauge,
    latest: GaugeVec,
    loads: Counter,
    errors: CounterVec,
}

impl HistoryMetrics {
    pub fn new(reg: &Registry) -> Result<Self, prometheus::Error> {
        let readings = Gauge::new("aquastat_history_readings", "Number of readings in the history")?;
        let last_reading = Gauge::new(
            "aquastat_last_reading_timestamp",
            "Timestamp of the most recent reading in the history",
        )?;
        let latest = GaugeVec::new(
            Opts::new("aquastat_latest_value", "Most recent value of each metric"),
            &["metric"],
        )?;
        let loads = Counter::new("aquastat_history_loads_total", "Number of attempted history loads")?;
        let errors = CounterVec::new(
            Opts::new("aquastat_history_load_errors_total", "Number of failed history loads by type"),
            &["kind"],
        )?;

        reg.register(Box::new(readings.clone()))?;
        reg.register(Box::new(last_reading.clone()))?;
        reg.register(Box::new(latest.clone()))?;
        reg.register(Box::new(loads.clone()))?;
        reg.register(Box::new(errors.clone()))?;

        Ok(Self {
            readings,
            last_reading,
            latest,
            loads,
            errors,
        })
    }

    pub fn update(&self, result: &Result<SeriesSet, LoadError>) {
        self.loads.inc();

        match result {
            Ok(set) => {
                self.readings.set(set.len() as f64);

                if let Some(reading) = set.latest() {
                    for metric in Metric::ALL {
                        self.latest
                            .with_label_values(&[metric.name()])
                            .set(reading.measurements.get(metric));
                    }

                    // Readings are stamped with local time. Skip the update when the time
                    // is ambiguous or doesn't exist in the local timezone (DST transitions).
                    if let Some(t) = reading.when.and_local_timezone(Local).earliest() {
                        self.last_reading.set(t.timestamp() as f64);
                    }
                }
            }
            Err(e) => {
                self.errors.with_label_values(&[e.as_label()]).inc();
            }
        }
    }
}
