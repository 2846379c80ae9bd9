//! Reader for the line-based ledger format used before the JSON document.
//!
//! Each non-empty line holds one JSON object. Only the fields needed to point a
//! path back at its original data are read; anything else on the line is ignored.

use crate::error::{Error, Result};
use crate::model::ContainerId;
use camino::Utf8Path;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};

/// One record of a legacy ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyRecord {
    pub name: String,
    pub full_path: String,
    #[serde(rename = "datFile")]
    pub container_id: ContainerId,
    pub original_offset: i64,
}

/// Iterates the records of a legacy ledger, yielding each with its 1-based line number.
///
/// Blank lines are skipped. A line that is not UTF-8 or not a JSON record is
/// returned as [`Error::MigrationRecord`]; iteration may continue past it, but
/// the engine stops at the first error.
pub struct LegacyLedgerReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl LegacyLedgerReader<BufReader<File>> {
    /// Open the legacy ledger at `path`.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = match File::open(path.as_std_path()) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::LedgerNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LegacyLedgerReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for LegacyLedgerReader<R> {
    type Item = Result<(usize, LegacyRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.lines.next()?;
            self.line += 1;
            let text = match next {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    return Some(Err(Error::MigrationRecord {
                        line: self.line,
                        name: String::new(),
                        path: String::new(),
                        source: Box::new(e.into()),
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            };

            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line = self.line;
            return Some(
                serde_json::from_str::<LegacyRecord>(trimmed)
                    .map(|record| (line, record))
                    .map_err(|e| Error::MigrationRecord {
                        line,
                        name: String::new(),
                        path: String::new(),
                        source: Box::new(e.into()),
                    }),
            );
        }
    }
}
