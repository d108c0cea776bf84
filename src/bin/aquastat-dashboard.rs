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

use aquastat::http::{http_route, RequestContext};
use aquastat::load::Loader;
use aquastat::metrics::HistoryMetrics;
use clap::{crate_version, Parser};
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use std::{io, process};
use tokio::signal::unix::{self, SignalKind};
use tracing::{Instrument, Level};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8050);
const DEFAULT_STATIC_DIR: &str = "static";

/// Serve charts of the aquaponics station history
#[derive(Debug, Parser)]
#[clap(name = "aquastat-dashboard", version = crate_version!())]
struct DashboardApplication {
    /// Path to the history CSV file written by aquastat-collect
    #[clap(long, env = "AQUASTAT_HISTORY")]
    history: PathBuf,

    /// Directory of camera images and other files served under /static/
    #[clap(long, env = "AQUASTAT_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to bind to. By default, aquastat-dashboard will bind to a public address
    /// since the purpose is to be viewed from other machines on the network
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let opts = DashboardApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let startup = Instant::now();
    let registry = prometheus::default_registry().clone();
    let metrics = HistoryMetrics::new(&registry).unwrap_or_else(|e| {
        tracing::error!(message = "failed to register history metrics", error = %e);
        process::exit(1)
    });

    let context = Arc::new(RequestContext::new(
        Loader::new(&opts.history),
        metrics,
        registry,
        opts.static_dir.clone(),
    ));

    // The history must be readable at startup
    let initial = context.load().await.unwrap_or_else(|e| {
        tracing::error!(message = "failed to load history", path = %opts.history.display(), error = %e);
        process::exit(1)
    });

    tracing::info!(message = "loaded history", path = %opts.history.display(), readings = initial.len());

    let service = make_service_fn(move |_| {
        let context = context.clone();

        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| {
                http_route(req, context.clone()).instrument(tracing::debug_span!("aquastat_request"))
            }))
        }
    });

    let server = Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error starting server", address = %opts.bind, error = %e);
        process::exit(1)
    });

    tracing::info!(message = "server started", address = %opts.bind);

    server
        .serve(service)
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!(message = "server shutdown", runtime_secs = %startup.elapsed().as_secs());
    Ok(())
}

async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

async fn sigint() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
