//! Pipe-delimited record files
//!
//! One record per line: `name|quantity|unit|added_date|expires_in`.
//! Lines that do not parse are skipped on load without being reported, and a
//! missing file loads as an empty list.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, and every write (or read-modify-write through [`RecordFile::update`])
//! holds an exclusive advisory lock on `<file>.lock`. The lock is a `flock`
//! style lock on its own open file, so it serialises writers inside one
//! process as well as across the web server and the CLI.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use tracing::{debug, info};

use crate::model::{format_quantity, Ingredient, FIELD_SEPARATOR};
use crate::time::{format_date, parse_date, today};
use crate::Result;

/// Which fields a line must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// All five fields are required
    Inventory,
    /// Only the name is required; missing fields take defaults
    /// (quantity 0, unit empty, added today, expires in 0)
    Standard,
}

/// Parse one line; `None` for blank or malformed lines
pub fn parse_line(line: &str, layout: RecordLayout, today: NaiveDate) -> Option<Ingredient> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let record = match layout {
        RecordLayout::Inventory => {
            if parts.len() != 5 {
                return None;
            }
            Ingredient::new(
                parts[0],
                parts[1].trim().parse::<f64>().ok()?,
                parts[2],
                parse_date(parts[3])?,
                parts[4].trim().parse::<i64>().ok()?,
            )
        }
        RecordLayout::Standard => {
            if parts[0].is_empty() {
                return None;
            }
            let quantity = match parts.get(1) {
                Some(text) => text.trim().parse::<f64>().ok()?,
                None => 0.0,
            };
            let unit = parts.get(2).copied().unwrap_or("");
            let added_date = match parts.get(3) {
                Some(text) => parse_date(text)?,
                None => today,
            };
            let expires_in = match parts.get(4) {
                Some(text) => text.trim().parse::<i64>().ok()?,
                None => 0,
            };
            Ingredient::new(parts[0], quantity, unit, added_date, expires_in)
        }
    };

    if !record.quantity.is_finite() || record.checked_expiry_date().is_none() {
        return None;
    }
    Some(record)
}

/// Serialise one record (without the trailing newline)
pub fn format_line(item: &Ingredient) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        item.name,
        format_quantity(item.quantity),
        item.unit,
        format_date(item.added_date),
        item.expires_in
    )
}

/// A record file on disk
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    layout: RecordLayout,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>, layout: RecordLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Load all well-formed records
    pub fn load(&self) -> Result<Vec<Ingredient>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found. Starting fresh.", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let today = today();
        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            match parse_line(line, self.layout, today) {
                Some(record) => records.push(record),
                None if !line.trim().is_empty() => {
                    debug!(
                        file = %self.path.display(),
                        line = index + 1,
                        "Skipping malformed record"
                    );
                }
                None => {}
            }
        }
        Ok(records)
    }

    /// Replace the whole file with `records`
    pub fn save(&self, records: &[Ingredient]) -> Result<()> {
        let _lock = self.lock()?;
        self.write_atomic(records)
    }

    /// Load, let `mutate` edit the records, and write them back if changed,
    /// all under the file lock
    pub fn update<T, F>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Ingredient>) -> T,
    {
        let _lock = self.lock()?;
        let mut records = self.load()?;
        let before = records.clone();
        let outcome = mutate(&mut records);
        if records != before {
            self.write_atomic(&records)?;
        }
        Ok(outcome)
    }

    fn lock_path(&self) -> PathBuf {
        sibling_path(&self.path, "lock")
    }

    fn lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn write_atomic(&self, records: &[Ingredient]) -> Result<()> {
        let mut content = String::new();
        for record in records {
            content.push_str(&format_line(record));
            content.push('\n');
        }

        let tmp = sibling_path(&self.path, "tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;

        debug!(
            file = %self.path.display(),
            records = records.len(),
            "Record file rewritten"
        );
        Ok(())
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
