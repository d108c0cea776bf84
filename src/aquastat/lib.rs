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

//! Record aquaponics station sensor readings and chart their history.
//!
//! ## Features
//!
//! Aquastat reads the status page served by an ESP32 based aquaponics station, extracts the
//! values reported by its sensors, and appends them to a CSV file. A small dashboard then
//! charts the entire history in a browser.
//!
//! The following values are recorded:
//!
//! * `water_temperature` - Degrees celsius of the water in the fish tank.
//! * `air_temperature` - Degrees celsius of the air around the grow bed.
//! * `moisture` - Moisture of the grow bed, from 0 to 100.
//! * `ph` - pH of the water in the fish tank.
//!
//! ## Collection
//!
//! `aquastat-collect` performs a single collection each time it runs: it fetches the status
//! page, extracts each value, and appends a row to the history. It is meant to be run
//! periodically by something else, for example cron.
//!
//! ```text
//! */5 * * * * /usr/local/bin/aquastat-collect --history /var/lib/aquastat/history.csv
//! ```
//!
//! If the station can't be reached, any value is missing from the page, or the history
//! can't be written, nothing is recorded and `aquastat-collect` exits with a non-zero status.
//! The row written to the history is also printed to stdout.
//!
//! ## History
//!
//! The history is a CSV file with a header row, one row per reading, and timestamps in the
//! local timezone of the collector.
//!
//! ```text
//! when,water_temperature,air_temperature,moisture,ph
//! 2024-01-01 12:00:00,21.5,19.0,42.0,6.8
//! 2024-01-01 12:05:00,21.5,19.1,42.0,6.8
//! ```
//!
//! Rows are only ever appended. If the file doesn't exist, it is created and the header is
//! written along with the first row. The directory it lives in must already exist.
//!
//! ## Dashboard
//!
//! `aquastat-dashboard` serves charts of the history on port `8050`. The history is read
//! again for each request so new readings show up without restarting it. Images for the
//! two cameras on the page are served from the `--static-dir` directory as `camera1.jpg`
//! and `camera2.jpg`.
//!
//! ```text
//! aquastat-dashboard --history /var/lib/aquastat/history.csv --static-dir /var/lib/aquastat/static
//! ```
//!
//! Prometheus metrics about the history are exposed at `/metrics`.
//!

pub mod collect;
pub mod device;
pub mod http;
pub mod load;
pub mod metrics;
pub mod reading;
pub mod record;
pub mod row;
pub mod series;
