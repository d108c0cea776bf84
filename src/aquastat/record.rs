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

use crate::reading::Reading;
use crate::row::HEADER;
use std::error::Error;
use std::fmt::{self, Formatter};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Error appending a row to the history store
#[derive(Debug)]
pub struct PersistError {
    path: PathBuf,
    cause: io::Error,
}

impl PersistError {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unable to append to {}: {}", self.path.display(), self.cause)
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Append-only writer of the history store.
///
/// The store is never rewritten. Each row (and the header, for the first row written to
/// an empty store) is written with a single `write` to a file opened in append mode so
/// that readers see either the entire row or none of it. If that write fails, the store
/// is cut back to its previous length.
#[derive(Debug, Clone)]
pub struct Recorder {
    path: PathBuf,
}

impl Recorder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode and append a single reading to the store.
    pub fn append(&self, reading: &Reading) -> Result<(), PersistError> {
        self.append_row(&reading.to_row())
    }

    /// Append an encoded row (without a trailing newline) to the store, creating the
    /// store and writing its header first if it doesn't exist or is empty. The directory
    /// containing the store must already exist.
    pub fn append_row(&self, row: &str) -> Result<(), PersistError> {
        self.write_row(row).map_err(|e| PersistError {
            path: self.path.clone(),
            cause: e,
        })
    }

    fn write_row(&self, row: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();
        let new_store = len == 0;

        let mut buf = String::with_capacity(HEADER.len() + row.len() + 2);
        if new_store {
            buf.push_str(HEADER);
            buf.push('\n');
        } else if !ends_with_newline(&mut file)? {
            // Keep a partial trailing line from swallowing this row
            buf.push('\n');
        }

        buf.push_str(row);
        buf.push('\n');

        if let Err(e) = file.write_all(buf.as_bytes()) {
            // Remove any part of the row that made it into the store
            if let Err(te) = file.set_len(len) {
                tracing::warn!(
                    message = "unable to remove partial row from history",
                    path = %self.path.display(),
                    error = %te,
                );
            }

            return Err(e);
        }

        file.sync_data()?;

        tracing::debug!(
            message = "appended row to history",
            path = %self.path.display(),
            header = new_store,
            bytes = buf.len(),
        );

        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod test {
    use super::Recorder;
    use crate::reading::{Measurements, Moisture, Ph, Reading, TemperatureCelsius};
    use chrono::NaiveDate;
    use std::fs;

    fn reading(minute: u32) -> Reading {
        let when = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap();

        Reading::new(
            when,
            Measurements {
                water_temperature: TemperatureCelsius::from(21.5),
                air_temperature: TemperatureCelsius::from(19.0),
                moisture: Moisture::from(42.0),
                ph: Ph::from(6.8),
            },
        )
    }

    #[test]
    fn test_append_new_store_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let recorder = Recorder::new(&path);

        recorder.append(&reading(0)).unwrap();

        assert_eq!(
            "when,water_temperature,air_temperature,moisture,ph\n2024-01-01 12:00:00,21.5,19.0,42.0,6.8\n",
            fs::read_to_string(&path).unwrap()
        );
    }

    #[test]
    fn test_append_empty_store_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "").unwrap();

        Recorder::new(&path).append(&reading(0)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("when,"));
        assert_eq!(2, contents.lines().count());
    }

    #[test]
    fn test_append_existing_store_only_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let recorder = Recorder::new(&path);

        recorder.append(&reading(0)).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        recorder.append(&reading(1)).unwrap();
        let after = fs::read_to_string(&path).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!("2024-01-01 12:01:00,21.5,19.0,42.0,6.8\n", &after[before.len()..]);
    }

    #[test]
    fn test_append_after_partial_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(
            &path,
            "when,water_temperature,air_temperature,moisture,ph\n2024-01-01 12:00:00,21.5,19.0,42.0,6.8\n2024-01-01 12:05:00,21.5,19",
        )
        .unwrap();

        Recorder::new(&path)
            .append_row("2024-01-01 12:10:00,21.5,19.0,42.0,6.8")
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(4, lines.len());
        assert_eq!("2024-01-01 12:05:00,21.5,19", lines[2]);
        assert_eq!("2024-01-01 12:10:00,21.5,19.0,42.0,6.8", lines[3]);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn test_append_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("history.csv");
        let res = Recorder::new(&path).append(&reading(0));

        let err = res.unwrap_err();
        assert_eq!(path.as_path(), err.path());
        assert!(!path.exists());
    }
}
