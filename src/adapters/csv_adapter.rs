//! CSV price series adapter.
//!
//! Reads one `<SYMBOL>.csv` file per instrument with `date,close` columns.
//! All files are aligned on one timeline whose newest date is bar 0.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::chart::{Chart, Price};
use crate::domain::error::BartraderError;
use crate::domain::instrument::Instrument;
use crate::ports::data_port::DataPort;

type Series = Vec<(NaiveDate, Price)>;

pub struct CsvAdapter {
    base_path: PathBuf,
    symbols: Option<Vec<String>>,
}

impl CsvAdapter {
    /// Load every `*.csv` file in `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            symbols: None,
        }
    }

    /// Load only the named symbols.
    pub fn with_symbols(base_path: PathBuf, symbols: Vec<String>) -> Self {
        Self {
            base_path,
            symbols: Some(symbols),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    pub fn list_symbols(&self) -> Result<Vec<String>, BartraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BartraderError::Data {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BartraderError::Data {
                reason: format!("directory entry error: {e}"),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv")
                && let Some(stem) = path.file_stem()
            {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

fn parse_close(value: Option<&str>, path: &Path) -> Result<Price, BartraderError> {
    let value = value.ok_or_else(|| BartraderError::Data {
        reason: format!("{}: missing close column", path.display()),
    })?;
    value.trim().parse().map_err(|e| BartraderError::Data {
        reason: format!("{}: invalid close value {value:?}: {e}", path.display()),
    })
}

/// Read `date,close` rows sorted by date. A repeated date keeps its last row.
fn read_series(path: &Path) -> Result<Series, BartraderError> {
    let content = fs::read_to_string(path).map_err(|e| BartraderError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut series = Series::new();
    for result in rdr.records() {
        let record = result.map_err(|e| BartraderError::Data {
            reason: format!("{}: CSV parse error: {}", path.display(), e),
        })?;
        let date_str = record.get(0).ok_or_else(|| BartraderError::Data {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            BartraderError::Data {
                reason: format!("{}: invalid date {date_str:?}: {e}", path.display()),
            }
        })?;
        let close = parse_close(record.get(1), path)?;
        if close <= 0.0 {
            return Err(BartraderError::Data {
                reason: format!("{}: non-positive close on {date}", path.display()),
            });
        }
        series.push((date, close));
    }

    series.sort_by_key(|(date, _)| *date);
    series.reverse();
    series.dedup_by_key(|(date, _)| *date);
    series.reverse();
    Ok(series)
}

/// Sorted union of all dates.
pub fn build_unified_timeline(series: &[Series]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.iter().map(|(date, _)| *date))
        .collect();
    unique_dates.into_iter().collect()
}

/// Chart of `series` over its span of `timeline`, gaps filled with the
/// previous close.
fn align(series: &Series, timeline: &[NaiveDate]) -> Option<Chart> {
    let (first, _) = series.first()?;
    let (last, _) = series.last()?;
    let from = timeline.binary_search(first).ok()?;
    let to = timeline.binary_search(last).ok()?;

    let mut values = Vec::with_capacity(to - from + 1);
    let mut rows = series.iter().peekable();
    let mut current = series[0].1;
    for date in &timeline[from..=to] {
        while let Some((row_date, close)) = rows.peek() {
            if row_date > date {
                break;
            }
            current = *close;
            rows.next();
        }
        values.push(current);
    }
    let end = timeline.len() - 1 - to;
    Some(Chart::new(values, end))
}

impl DataPort for CsvAdapter {
    fn load(&self) -> Result<Vec<Instrument>, BartraderError> {
        let symbols = match &self.symbols {
            Some(symbols) => symbols.clone(),
            None => self.list_symbols()?,
        };

        let mut loaded: Vec<(String, Series)> = Vec::new();
        for symbol in symbols {
            let series = read_series(&self.csv_path(&symbol))?;
            if series.is_empty() {
                warn!(symbol = %symbol, "no price rows, skipping");
                continue;
            }
            debug!(symbol = %symbol, rows = series.len(), "loaded price series");
            loaded.push((symbol, series));
        }

        let all: Vec<Series> = loaded.iter().map(|(_, s)| s.clone()).collect();
        let timeline = build_unified_timeline(&all);

        let mut instruments = Vec::with_capacity(loaded.len());
        for (symbol, series) in loaded {
            match align(&series, &timeline) {
                Some(chart) => instruments.push(Instrument::new(chart, symbol, None)),
                None => warn!(symbol = %symbol, "series outside timeline, skipping"),
            }
        }
        Ok(instruments)
    }
}
