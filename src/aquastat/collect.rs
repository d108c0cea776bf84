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

use crate::device::{ExtractionError, Extractor, Fetch, FetchError};
use crate::reading::Reading;
use crate::record::{PersistError, Recorder};
use chrono::{Local, NaiveDateTime, SubsecRound};
use std::error::Error;
use std::fmt::{self, Debug, Formatter};

/// Potential kinds of errors that can be encountered during a collection cycle
#[derive(PartialEq, Eq, Debug, Hash, Clone, Copy)]
pub enum CollectErrorKind {
    Fetch,
    Extraction,
    Persist,
}

impl CollectErrorKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            CollectErrorKind::Fetch => "fetch",
            CollectErrorKind::Extraction => "extraction",
            CollectErrorKind::Persist => "persist",
        }
    }
}

/// Error fetching, extracting, or recording a reading. Each of these ends the cycle
/// and nothing is retried.
#[derive(Debug)]
pub enum CollectError {
    Fetch(FetchError),
    Extraction(ExtractionError),
    Persist(PersistError),
}

impl CollectError {
    pub fn kind(&self) -> CollectErrorKind {
        match self {
            CollectError::Fetch(_) => CollectErrorKind::Fetch,
            CollectError::Extraction(_) => CollectErrorKind::Extraction,
            CollectError::Persist(_) => CollectErrorKind::Persist,
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Fetch(ref e) => fmt::Display::fmt(e, f),
            CollectError::Extraction(ref e) => fmt::Display::fmt(e, f),
            CollectError::Persist(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl Error for CollectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CollectError::Fetch(ref e) => Some(e),
            CollectError::Extraction(ref e) => Some(e),
            CollectError::Persist(ref e) => Some(e),
        }
    }
}

impl From<FetchError> for CollectError {
    fn from(e: FetchError) -> Self {
        CollectError::Fetch(e)
    }
}

impl From<ExtractionError> for CollectError {
    fn from(e: ExtractionError) -> Self {
        CollectError::Extraction(e)
    }
}

impl From<PersistError> for CollectError {
    fn from(e: PersistError) -> Self {
        CollectError::Persist(e)
    }
}

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Perform a single fetch-extract-record cycle against the status page of the station.
///
/// There is no scheduling here: each call to `run` performs exactly one cycle and
/// periodic collection is left to whatever invokes it (cron, a systemd timer, etc.).
pub struct Collector {
    fetcher: Box<dyn Fetch + Send + Sync + 'static>,
    extractor: Extractor,
}

impl Collector {
    pub fn new<T>(fetcher: T, extractor: Extractor) -> Self
    where
        T: Fetch + Send + Sync + 'static,
    {
        Self {
            fetcher: Box::new(fetcher),
            extractor,
        }
    }

    /// Fetch the status page and extract a reading stamped with `when`.
    ///
    /// Nothing is written to the history store.
    pub fn collect_at(&self, when: NaiveDateTime) -> Result<Reading, CollectError> {
        let text = self.fetcher.fetch()?;
        let measurements = self.extractor.extract(&text)?;
        Ok(Reading::new(when, measurements))
    }

    /// Run one cycle stamped with `when`, appending the reading to the history store of
    /// `recorder`. The encoded row is returned on success. If any step fails the store
    /// is left untouched.
    pub fn run_at(&self, recorder: &Recorder, when: NaiveDateTime) -> Result<String, CollectError> {
        let reading = self.collect_at(when)?;
        let row = reading.to_row();
        recorder.append_row(&row)?;

        tracing::info!(message = "recorded reading", path = %recorder.path().display(), row = %row);
        Ok(row)
    }

    /// Run one cycle stamped with the current local time.
    pub fn run(&self, recorder: &Recorder) -> Result<String, CollectError> {
        self.run_at(recorder, now())
    }
}

impl Debug for Collector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector").field("extractor", &self.extractor).finish()
    }
}
