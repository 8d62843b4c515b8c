//! Price history: one CSV row per successful product check.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error_handling::HistoryError;
use crate::parse::ProductRecord;

/// Timestamp format of the `timestamp` column (local time).
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One history row. Absent fields are written as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Local time of the check
    pub timestamp: String,
    /// Product ASIN
    pub asin: String,
    /// Product title
    pub title: Option<String>,
    /// Price as scraped
    pub price_raw: Option<String>,
    /// Normalized price
    pub price: Option<f64>,
    /// Stock text or `Unknown`
    pub stock: String,
    /// Rating text
    pub rating_raw: Option<String>,
    /// Review count text
    pub reviews_raw: Option<String>,
    /// Product page URL
    pub url: String,
}

impl HistoryRow {
    /// Builds the row for `record` checked at `at`.
    pub fn from_record(record: &ProductRecord, at: DateTime<Local>) -> Self {
        Self {
            timestamp: at.format(HISTORY_TIMESTAMP_FORMAT).to_string(),
            asin: record.asin.clone(),
            title: record.title.clone(),
            price_raw: record.price_raw.clone(),
            price: record.price,
            stock: record.stock.clone(),
            rating_raw: record.rating_raw.clone(),
            reviews_raw: record.reviews_raw.clone(),
            url: record.url.clone(),
        }
    }
}

/// Appends records to the history CSV.
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    path: PathBuf,
}

impl HistoryWriter {
    /// Writer for the CSV at `path`; nothing is created until the first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// CSV file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` stamped with the current local time.
    pub fn append(&self, record: &ProductRecord) -> Result<HistoryRow, HistoryError> {
        self.append_at(record, Local::now())
    }

    /// Appends `record` stamped with `at`.
    ///
    /// The header row is written when the file is new or empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created or written.
    pub fn append_at(
        &self,
        record: &ProductRecord,
        at: DateTime<Local>,
    ) -> Result<HistoryRow, HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        let row = HistoryRow::from_record(record, at);
        writer.serialize(&row)?;
        writer.flush()?;
        log::debug!("History row written for {}", row.asin);
        Ok(row)
    }

    /// Reads every row; a missing file yields an empty history.
    pub fn load_history(&self) -> Result<Vec<HistoryRow>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize::<HistoryRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows of one product, oldest first.
    pub fn history_for(&self, asin: &str) -> Result<Vec<HistoryRow>, HistoryError> {
        Ok(self
            .load_history()?
            .into_iter()
            .filter(|row| row.asin == asin)
            .collect())
    }
}
