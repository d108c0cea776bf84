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

use crate::row::{HeaderError, Layout, RowError};
use crate::series::SeriesSet;
use std::error::Error;
use std::fmt::{self, Formatter};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str;

/// Error reloading the history store. No partial `SeriesSet` is ever returned.
#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Header(HeaderError),
    /// A data row (numbered from 1, not counting the header or blank lines) could not be decoded
    Row(usize, RowError),
}

impl LoadError {
    /// Index of the data row that couldn't be decoded, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            LoadError::Row(row, _) => Some(*row),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::Io(_) => "io",
            LoadError::Header(_) => "header",
            LoadError::Row(_, _) => "row",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(ref e) => write!(f, "unable to read history: {}", e),
            LoadError::Header(ref e) => write!(f, "invalid history header: {}", e),
            LoadError::Row(row, ref e) => write!(f, "invalid history row {}: {}", row, e),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io(ref e) => Some(e),
            LoadError::Header(ref e) => Some(e),
            LoadError::Row(_, ref e) => Some(e),
        }
    }
}

/// Decode an entire history store into a `SeriesSet`, failing on the first row that
/// can't be decoded.
///
/// The first non-blank line must be the header. An input with no lines at all (a store
/// that exists but has never been appended to) results in an empty `SeriesSet`.
pub fn read_history<R: BufRead>(reader: R) -> Result<SeriesSet, LoadError> {
    let mut layout: Option<Layout> = None;
    let mut set = SeriesSet::new();
    let mut row = 0;

    for line in reader.split(b'\n') {
        let line = line.map_err(LoadError::Io)?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match layout {
            None => {
                let text = str::from_utf8(&line).map_err(|e| LoadError::Header(HeaderError::Encoding(e)))?;
                layout = Some(Layout::from_header(text).map_err(LoadError::Header)?);
            }
            Some(ref l) => {
                row += 1;
                let reading = str::from_utf8(&line)
                    .map_err(RowError::Encoding)
                    .and_then(|text| l.decode(text))
                    .map_err(|e| LoadError::Row(row, e))?;
                set.push(&reading);
            }
        }
    }

    Ok(set)
}

/// Reads the entire history store each time `load` is called.
///
/// Nothing is cached between calls and loading has no side effects, so it's safe to
/// call as often as fresh data is needed.
#[derive(Debug, Clone)]
pub struct Loader {
    path: PathBuf,
}

impl Loader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SeriesSet, LoadError> {
        let file = File::open(&self.path).map_err(LoadError::Io)?;
        let set = read_history(BufReader::new(file))?;

        tracing::debug!(
            message = "loaded history",
            path = %self.path.display(),
            readings = set.len(),
        );

        Ok(set)
    }
}
