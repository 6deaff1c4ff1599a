use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};

use crate::error::{AdvisorError, Result};
use crate::models::{ExpenseType, Transaction, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a currency cell. Accepts thousands separators, quotes, rupee/dollar
/// prefixes and accounting-style parenthesised negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.replace([',', '"', '\u{20b9}', '$'], "");
    for prefix in ["INR", "Rs.", "Rs"] {
        s = s.replace(prefix, "");
    }
    let s = s.trim();
    let parsed = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => inner.trim().parse::<f64>().ok().map(|v| -v),
        None => s.parse::<f64>().ok(),
    };
    parsed.filter(|v| v.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Names from `REQUIRED_COLUMNS` absent in `headers`, in required order.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a transactions CSV. The header row must carry every required column;
/// any unparseable row aborts the whole load.
pub fn parse_transactions(data: &[u8]) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        return Err(AdvisorError::MissingColumns(missing));
    }
    let idx = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (i_dt, i_amt, i_cat, i_type) = (
        idx("datetime"),
        idx("amount"),
        idx("merchant_category"),
        idx("expense_type"),
    );

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let datetime = parse_datetime(field(i_dt)).ok_or_else(|| AdvisorError::InvalidRow {
            line,
            message: format!("unrecognised datetime {:?}", field(i_dt)),
        })?;
        let amount = parse_amount(field(i_amt)).ok_or_else(|| AdvisorError::InvalidRow {
            line,
            message: format!("invalid amount {:?}", field(i_amt)),
        })?;
        let category = field(i_cat);
        if category.is_empty() {
            return Err(AdvisorError::InvalidRow {
                line,
                message: "empty merchant_category".to_string(),
            });
        }

        rows.push(Transaction {
            datetime,
            amount,
            merchant_category: category.to_string(),
            expense_type: ExpenseType::parse(field(i_type)),
        });
    }

    let unrecognized = rows
        .iter()
        .filter(|t| matches!(t.expense_type, ExpenseType::Unrecognized(_)))
        .count();
    if unrecognized > 0 {
        tracing::warn!(
            rows = unrecognized,
            "expense_type is neither essential nor non-essential; counted in totals only"
        );
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Dataset + memoized loading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Dataset {
    pub path: PathBuf,
    pub checksum: String,
    pub transactions: Vec<Transaction>,
}

pub fn load_file(path: &Path) -> Result<Dataset> {
    let data = std::fs::read(path)?;
    let checksum = compute_checksum(&data);
    let transactions = parse_transactions(&data)?;
    tracing::info!(path = %path.display(), rows = transactions.len(), "loaded transactions");
    Ok(Dataset {
        path: path.to_path_buf(),
        checksum,
        transactions,
    })
}

/// Parsed files keyed by path. An entry is reused only while the file's
/// content hash matches; any change on disk triggers a re-parse.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
    parses: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let data = std::fs::read(&key)?;
        let checksum = compute_checksum(&data);

        if let Some(hit) = self.entries.get(&key) {
            if hit.checksum == checksum {
                tracing::debug!(path = %key.display(), "dataset cache hit");
                return Ok(Arc::clone(hit));
            }
            tracing::info!(path = %key.display(), "file changed on disk, re-parsing");
        }

        // A failed parse must not leave a stale entry behind.
        self.entries.remove(&key);
        let transactions = parse_transactions(&data)?;
        self.parses += 1;
        let dataset = Arc::new(Dataset {
            path: key.clone(),
            checksum,
            transactions,
        });
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn invalidate(&mut self, path: &Path) {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key);
    }

    /// Number of times a file was actually parsed (cache misses).
    pub fn parse_count(&self) -> usize {
        self.parses
    }
}
