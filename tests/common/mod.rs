#![allow(dead_code)]

use bartrader::domain::chart::{Bar, Price};
use bartrader::domain::error::BartraderError;
use bartrader::domain::exchange::{Exchange, ExchangeConfig};
use bartrader::domain::instrument::Instrument;
use bartrader::ports::data_port::DataPort;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Most recent bar.
pub const NEWEST: Bar = 0;

pub struct MockDataPort {
    pub instruments: Vec<Instrument>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            error: None,
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: Vec<Price>, end: Bar) -> Self {
        self.instruments
            .push(Instrument::from_prices(prices, end, symbol));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load(&self) -> Result<Vec<Instrument>, BartraderError> {
        if let Some(reason) = &self.error {
            return Err(BartraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.instruments.clone())
    }
}

/// Prices rising by one per bar from `first`.
pub fn rising(first: Price, len: usize) -> Vec<Price> {
    (0..len).map(|i| first + i as f64).collect()
}

pub fn make_exchange(port: &dyn DataPort, config: ExchangeConfig) -> Rc<Exchange> {
    let instruments = port.load().unwrap().into_iter().map(Rc::new).collect();
    Rc::new(Exchange::new(instruments, config).unwrap())
}

/// Single flat-priced instrument on a zero-cost exchange.
pub fn flat_exchange(price: Price, len: usize) -> Rc<Exchange> {
    let port = MockDataPort::new().with_prices("FLAT", vec![price; len], NEWEST);
    make_exchange(&port, ExchangeConfig::default())
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Write `<symbol>.csv` with a header and `date,close` rows.
pub fn write_csv(dir: &Path, symbol: &str, rows: &[(&str, f64)]) {
    let mut content = String::from("date,close\n");
    for (date, close) in rows {
        content.push_str(&format!("{date},{close}\n"));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
