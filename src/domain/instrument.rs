//! Tradeable instrument: a price chart with a symbol.

use std::fmt;
use std::rc::Rc;

use crate::domain::chart::{Bar, Chart, Price};
use crate::domain::error::BartraderError;

/// Instruments are shared between the exchange, positions and trades.
/// Identity is the allocation, not the price data.
pub type InstrumentRef = Rc<Instrument>;

pub type Instruments = Vec<InstrumentRef>;

#[derive(Debug, Clone)]
pub struct Instrument {
    chart: Chart,
    pub symbol: String,
    pub name: Option<String>,
}

impl Instrument {
    pub fn new(chart: Chart, symbol: impl Into<String>, name: Option<String>) -> Self {
        Instrument {
            chart,
            symbol: symbol.into(),
            name,
        }
    }

    /// Build from closing prices ordered oldest to newest.
    pub fn from_prices(prices: Vec<Price>, end: Bar, symbol: impl Into<String>) -> Self {
        Instrument::new(Chart::new(prices, end), symbol, None)
    }

    /// Oldest bar with a price.
    pub fn start(&self) -> Bar {
        self.chart.start()
    }

    /// Newest bar with a price.
    pub fn end(&self) -> Bar {
        self.chart.end()
    }

    pub fn len(&self) -> usize {
        self.chart.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chart.is_empty()
    }

    /// Does the instrument have a price at `bar`.
    pub fn has(&self, bar: Bar) -> bool {
        self.chart.has(bar)
    }

    pub fn price(&self, bar: Bar) -> Result<Price, BartraderError> {
        self.chart.value(bar)
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// New instrument over `start..=end`, named after the range.
    pub fn slice(&self, start: Bar, end: Bar) -> Result<Instrument, BartraderError> {
        let chart = self.chart.slice(start, end)?;
        let base = self.name.as_deref().unwrap_or(&self.symbol);
        Ok(Instrument {
            chart,
            symbol: self.symbol.clone(),
            name: Some(format!("{base} [{start}-{end}]")),
        })
    }

    /// Reference identity between two shared instruments.
    pub fn same(a: &InstrumentRef, b: &InstrumentRef) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.symbol, name),
            None => write!(f, "{}", self.symbol),
        }
    }
}
