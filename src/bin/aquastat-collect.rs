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

use aquastat::collect::Collector;
use aquastat::device::{Extractor, HttpFetcher};
use aquastat::record::Recorder;
use clap::{crate_version, Parser};
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

const DEFAULT_DEVICE_URL: &str = "http://192.168.1.110";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOG_LEVEL: Level = Level::WARN;

/// Record a single reading from the aquaponics station
///
/// Fetch the status page of the station, extract each sensor value, and append them as
/// a row to the history file. The row is also printed to stdout. Run this periodically
/// (cron, a systemd timer) to build up a history.
#[derive(Debug, Parser)]
#[clap(name = "aquastat-collect", version = crate_version!())]
struct CollectApplication {
    /// URL of the status page of the station
    #[clap(long, env = "AQUASTAT_DEVICE_URL", default_value = DEFAULT_DEVICE_URL)]
    device_url: String,

    /// Path to the history CSV file. It will be created if it doesn't exist but the
    /// directory it is in must exist
    #[clap(long, env = "AQUASTAT_HISTORY")]
    history: PathBuf,

    /// Give up fetching the status page after this many seconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

fn main() {
    let opts = CollectApplication::parse();
    // Logs go to stderr, stdout is reserved for the recorded row
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .with_writer(io::stderr)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let fetcher = HttpFetcher::new(&opts.device_url, Duration::from_secs(opts.timeout_secs)).unwrap_or_else(|e| {
        tracing::error!(message = "failed to initialize HTTP client", url = %opts.device_url, error = %e);
        process::exit(1)
    });

    let collector = Collector::new(fetcher, Extractor::default());
    let recorder = Recorder::new(&opts.history);

    match collector.run(&recorder) {
        Ok(row) => {
            println!("{}", row);
        }
        Err(e) => {
            tracing::error!(
                message = "failed to record reading",
                kind = e.kind().as_label(),
                url = %opts.device_url,
                history = %opts.history.display(),
                error = %e,
            );
            process::exit(1)
        }
    }
}
