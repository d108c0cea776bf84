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

use crate::load::{LoadError, Loader};
use crate::metrics::HistoryMetrics;
use crate::series::SeriesSet;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tracing::Instrument;

const DASHBOARD_PAGE: &str = include_str!("dashboard.html");
const HTML_FORMAT: &str = "text/html; charset=utf-8";
const JSON_FORMAT: &str = "application/json";
const STATIC_PREFIX: &str = "/static/";

/// Global state shared between all HTTP requests via Arc.
pub struct RequestContext {
    loader: Loader,
    metrics: HistoryMetrics,
    registry: Registry,
    static_dir: PathBuf,
}

impl RequestContext {
    pub fn new(loader: Loader, metrics: HistoryMetrics, registry: Registry, static_dir: PathBuf) -> Self {
        RequestContext {
            loader,
            metrics,
            registry,
            static_dir,
        }
    }

    /// Reload the entire history store in a blocking task, recording the outcome in
    /// Prometheus metrics.
    pub async fn load(&self) -> Result<SeriesSet, LoadError> {
        let loader = self.loader.clone();

        // Reading and parsing the store is blocking file I/O, run it on the tokio
        // blocking pool instead of the current future.
        let res = task::spawn_blocking(move || loader.load())
            .instrument(tracing::debug_span!("aquastat_load"))
            .await
            .unwrap_or_else(|e| Err(LoadError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))));

        self.metrics.update(&res);
        res
    }
}

pub async fn http_route(req: Request<Body>, context: Arc<RequestContext>) -> Result<Response<Body>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let res = match (&method, path.as_ref()) {
        (&Method::GET, "/") => body_with_type(DASHBOARD_PAGE, HTML_FORMAT),
        (&Method::GET, "/api/series") => series(&context).await,
        (&Method::GET, "/metrics") => metrics(&context),
        (&Method::GET, p) if p.starts_with(STATIC_PREFIX) => static_file(&context, &p[STATIC_PREFIX.len()..]).await,

        (_, "/") | (_, "/api/series") | (_, "/metrics") => http_status_no_body(StatusCode::METHOD_NOT_ALLOWED),
        (_, p) if p.starts_with(STATIC_PREFIX) => http_status_no_body(StatusCode::METHOD_NOT_ALLOWED),

        _ => http_status_no_body(StatusCode::NOT_FOUND),
    };

    Ok(res)
}

async fn series(context: &RequestContext) -> Response<Body> {
    let set = match context.load().await {
        Ok(set) => set,
        Err(e) => {
            tracing::error!(message = "unable to load history", path = %context.loader.path().display(), error = %e);
            return http_status_no_body(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match serde_json::to_vec(&set) {
        Ok(buf) => body_with_type(buf, JSON_FORMAT),
        Err(e) => {
            tracing::error!(message = "unable to encode history", error = %e);
            http_status_no_body(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn metrics(context: &RequestContext) -> Response<Body> {
    let encoder = TextEncoder::new();
    let families = context.registry.gather();
    let mut buf = Vec::new();

    match encoder.encode(&families, &mut buf) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_metrics = families.len());
            body_with_type(buf, prometheus::TEXT_FORMAT)
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics to text format", error = %e);
            http_status_no_body(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Serve a single file (camera images, etc.) from the static directory. Only plain
/// file names are allowed, anything that could refer to another directory is a 404.
async fn static_file(context: &RequestContext, name: &str) -> Response<Body> {
    if name.is_empty() || name.starts_with('.') || name.contains('/') || name.contains('\\') {
        return http_status_no_body(StatusCode::NOT_FOUND);
    }

    let path = context.static_dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(buf) => body_with_type(buf, content_type(name)),
        Err(e) => {
            tracing::debug!(message = "unable to read static file", path = %path.display(), error = %e);
            http_status_no_body(StatusCode::NOT_FOUND)
        }
    }
}

fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("html") => HTML_FORMAT,
        _ => "application/octet-stream",
    }
}

fn body_with_type<B: Into<Body>>(body: B, content_type: &'static str) -> Response<Body> {
    let mut res = Response::new(body.into());
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

fn http_status_no_body(code: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = code;
    res
}

#[cfg(test)]
mod test {
    use super::{http_route, RequestContext};
    use crate::load::Loader;
    use crate::metrics::HistoryMetrics;
    use crate::reading::Metric;
    use hyper::header::CONTENT_TYPE;
    use hyper::{Body, Method, Request, Response, StatusCode};
    use prometheus::Registry;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    const HISTORY: &str = "when,water_temperature,air_temperature,moisture,ph
2024-01-01 12:00:00,21.5,19.0,42.0,6.8
";

    fn context(dir: &Path) -> Arc<RequestContext> {
        let registry = Registry::new();
        let metrics = HistoryMetrics::new(&registry).unwrap();
        let loader = Loader::new(dir.join("history.csv"));
        Arc::new(RequestContext::new(loader, metrics, registry, dir.join("static")))
    }

    async fn request(context: Arc<RequestContext>, method: Method, path: &str) -> Response<Body> {
        let req = Request::builder().method(method).uri(path).body(Body::empty()).unwrap();
        http_route(req, context).await.unwrap()
    }

    async fn body_string(res: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_series_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("history.csv"), HISTORY).unwrap();

        let res = request(context(dir.path()), Method::GET, "/api/series").await;
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!("application/json", res.headers()[CONTENT_TYPE]);

        let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
        assert_eq!("2024-01-01 12:00:00", json["timeline"][0]);
        assert_eq!(6.8, json["series"][Metric::Ph.name()][0]);
    }

    #[tokio::test]
    async fn test_series_reloads_each_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, HISTORY).unwrap();
        let ctx = context(dir.path());

        assert_eq!(1, ctx.load().await.unwrap().len());

        let mut contents = HISTORY.to_owned();
        contents.push_str("2024-01-01 12:30:00,21.7,19.4,41.0,6.9\n");
        fs::write(&path, contents).unwrap();

        assert_eq!(2, ctx.load().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_series_bad_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = HISTORY.to_owned();
        contents.push_str("2024-01-01 12:30:00,21.7,19.4,damp,6.9\n");
        fs::write(dir.path().join("history.csv"), contents).unwrap();
        let ctx = context(dir.path());

        let res = request(ctx.clone(), Method::GET, "/api/series").await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

        let metrics = body_string(request(ctx, Method::GET, "/metrics").await).await;
        assert!(metrics.contains("aquastat_history_load_errors_total{kind=\"row\"} 1"));
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let dir = tempfile::tempdir().unwrap();
        let res = request(context(dir.path()), Method::GET, "/").await;

        assert_eq!(StatusCode::OK, res.status());
        assert!(body_string(res).await.contains("/api/series"));
    }

    #[tokio::test]
    async fn test_static_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static").join("camera1.jpg"), b"jpeg").unwrap();
        let ctx = context(dir.path());

        let res = request(ctx.clone(), Method::GET, "/static/camera1.jpg").await;
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!("image/jpeg", res.headers()[CONTENT_TYPE]);
        assert_eq!("jpeg", body_string(res).await);

        let res = request(ctx.clone(), Method::GET, "/static/camera2.jpg").await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());

        let res = request(ctx, Method::GET, "/static/../history.csv").await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let res = request(context(dir.path()), Method::POST, "/api/series").await;

        assert_eq!(StatusCode::METHOD_NOT_ALLOWED, res.status());
    }

    #[tokio::test]
    async fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let res = request(context(dir.path()), Method::GET, "/charts").await;

        assert_eq!(StatusCode::NOT_FOUND, res.status());
    }
}
