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

use std::error::Error;
use std::fmt::{self, Formatter};
use std::time::Duration;

/// Error fetching the status page of the station
#[derive(Debug)]
pub struct FetchError {
    url: String,
    cause: Box<dyn Error + Send + Sync>,
}

impl FetchError {
    pub fn new<E>(url: &str, cause: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            url: url.to_owned(),
            cause: cause.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unable to fetch {}: {}", self.url, self.cause)
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Source of the raw text of the station status page.
///
/// Abstraction around an HTTP client to allow for easier testing.
pub trait Fetch {
    fn fetch(&self) -> Result<String, FetchError>;
}

/// Fetch the status page with a single blocking HTTP `GET`.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpFetcher {
    /// Create a new fetcher for `url` where each request (connecting and reading the
    /// entire body) must complete within `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::new(url, e))?;

        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self) -> Result<String, FetchError> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::new(&self.url, e))?;

        tracing::debug!(message = "fetched device status page", url = %self.url, status = %res.status());
        res.text().map_err(|e| FetchError::new(&self.url, e))
    }
}
