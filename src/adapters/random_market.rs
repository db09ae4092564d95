//! Synthetic instruments for demonstration and testing.
//!
//! Each instrument is a seeded random walk with a four letter symbol and a
//! name made up from the symbol's letters. The newest bar of each
//! instrument falls somewhere in the most recent fifth of the series, so
//! instruments expire at different bars.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::chart::{Bar, Chart, Price};
use crate::domain::error::BartraderError;
use crate::domain::instrument::Instrument;
use crate::ports::data_port::DataPort;

const WORDS: &[&str] = &[
    "Atlantic", "Allen", "Banking", "Bureau", "Civil", "Consumer", "Defense", "Direct", "Electric",
    "Energy", "Federal", "Foundation", "Government", "Global", "Health", "Housing", "Institute",
    "International", "Java", "Jet", "Key", "Kind", "League", "Legal", "Mining", "Motor", "National",
    "Network", "Oracle", "Olympic", "Petroleum", "Public", "Quest", "Quick", "Revenue", "Rifle",
    "Service", "Space", "Telegraph", "Transport", "Union", "Urban", "Value", "Water", "Works",
    "World", "Xero", "Xtra", "Young", "Yogurt", "Zebra", "Zero",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomMarket {
    pub count: usize,
    pub bars: usize,
    pub seed: u64,
}

impl RandomMarket {
    pub fn new(count: usize, bars: usize, seed: u64) -> Self {
        Self { count, bars, seed }
    }
}

fn make_series<R: Rng>(rng: &mut R, count: usize) -> Vec<Price> {
    let mut price: Price = rng.gen_range(1.0..1000.0);
    let mut series = Vec::with_capacity(count);
    for _ in 0..count {
        let change = rng.gen_range(-0.025..0.025);
        price *= 1.0 + change;
        series.push((price * 10_000.0).round() / 10_000.0);
    }
    series
}

fn make_symbol<R: Rng>(rng: &mut R) -> String {
    (0..4).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))).collect()
}

/// One word per letter, picked among words with the same initial.
fn make_name<R: Rng>(rng: &mut R, symbol: &str) -> String {
    symbol
        .chars()
        .map(|letter| {
            let matching: Vec<&str> = WORDS
                .iter()
                .copied()
                .filter(|word| word.starts_with(letter))
                .collect();
            if matching.is_empty() {
                WORDS[rng.gen_range(0..WORDS.len())]
            } else {
                matching[rng.gen_range(0..matching.len())]
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl DataPort for RandomMarket {
    fn load(&self) -> Result<Vec<Instrument>, BartraderError> {
        if self.bars == 0 {
            return Err(BartraderError::Data {
                reason: "random market needs at least one bar".into(),
            });
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let instruments = (0..self.count)
            .map(|_| {
                let symbol = make_symbol(&mut rng);
                let name = make_name(&mut rng, &symbol);
                let series = make_series(&mut rng, self.bars);
                let end: Bar = rng.gen_range(0..(self.bars / 5).max(1));
                Instrument::new(Chart::new(series, end), symbol, Some(name))
            })
            .collect();
        Ok(instruments)
    }
}
