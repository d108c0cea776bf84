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

#![cfg(test)]

use crate::device::{Fetch, FetchError};
use std::io;

/// Status page as served by the station firmware.
pub(crate) const STATUS_PAGE: &str = "<!DOCTYPE html><html><head><title>ESP32-WROOM-32 1</title></head>
<body>
<h1>ESP32-WROOM-32 1</h1>
<p>Water Temperature: 21.50&#x2103;, 70.70&#x2109;</p>
<p>Air Temperature: 19.00&#x2103;, 66.20&#x2109;</p>
<p>Moisture: 42%</p>
<p>pH: 6.80</p>
</body></html>";

/// Fetch implementation that returns the same page for every request
pub(crate) struct StaticFetcher {
    page: String,
}

impl StaticFetcher {
    pub(crate) fn new(page: &str) -> Self {
        Self { page: page.to_owned() }
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self) -> Result<String, FetchError> {
        Ok(self.page.clone())
    }
}

/// Fetch implementation that fails every request as if the device were unreachable
pub(crate) struct UnreachableFetcher;

impl Fetch for UnreachableFetcher {
    fn fetch(&self) -> Result<String, FetchError> {
        Err(FetchError::new(
            "http://192.168.1.110",
            io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        ))
    }
}
