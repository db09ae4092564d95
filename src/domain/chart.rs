//! Bar-indexed numeric series.
//!
//! Bar 0 is the most recent observation and larger bars are older. Values are
//! stored oldest to newest, so a chart covering bars `start..=end` (with
//! `start >= end`) keeps the value for `start` at index 0 and the value for
//! `end` at the last index.

use crate::domain::error::BartraderError;

/// Index into a time series; 0 is the newest bar.
pub type Bar = usize;

/// Price of one instrument unit.
pub type Price = f64;

/// Amount of cash.
pub type Amount = f64;

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    values: Vec<f64>,
    end: Bar,
}

impl Chart {
    /// `values` ordered oldest to newest; `end` is the bar of the newest value.
    pub fn new(values: Vec<f64>, end: Bar) -> Self {
        Chart { values, end }
    }

    /// An empty series whose first value will land on `start`.
    pub fn accumulating(start: Bar) -> Self {
        Chart {
            values: Vec::new(),
            end: start,
        }
    }

    /// Oldest bar in the series.
    pub fn start(&self) -> Bar {
        (self.end + self.values.len()).saturating_sub(1).max(self.end)
    }

    /// Newest bar in the series.
    pub fn end(&self) -> Bar {
        self.end
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has(&self, bar: Bar) -> bool {
        !self.values.is_empty() && bar >= self.end && bar <= self.start()
    }

    /// Value at `bar`.
    pub fn value(&self, bar: Bar) -> Result<f64, BartraderError> {
        if !self.has(bar) {
            return Err(BartraderError::OutOfRange {
                bar,
                start: self.start(),
                end: self.end,
            });
        }
        // index = length - bar + end - 1
        Ok(self.values[self.values.len() + self.end - bar - 1])
    }

    /// Oldest value.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Newest value.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Values ordered oldest to newest.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Append a value one bar newer than the current newest.
    pub fn add(&mut self, value: f64) -> Result<(), BartraderError> {
        if !self.values.is_empty() {
            if self.end == 0 {
                return Err(BartraderError::Exhausted);
            }
            self.end -= 1;
        }
        self.values.push(value);
        Ok(())
    }

    /// Sub-series covering `start..=end`.
    pub fn slice(&self, start: Bar, end: Bar) -> Result<Chart, BartraderError> {
        for bar in [start, end] {
            if !self.has(bar) {
                return Err(BartraderError::OutOfRange {
                    bar,
                    start: self.start(),
                    end: self.end,
                });
            }
        }
        if start < end {
            return Err(BartraderError::OutOfRange {
                bar: start,
                start: self.start(),
                end,
            });
        }
        let from = self.start() - start;
        let to = self.start() - end;
        Ok(Chart::new(self.values[from..=to].to_vec(), end))
    }
}
