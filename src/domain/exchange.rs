//! Exchange: instrument universe and fill simulation.
//!
//! Converts purchase intents into positions and positions back into cash.
//! Spread and fee are ratios applied once per leg.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rand::Rng;

use super::account::Account;
use super::chart::{Amount, Bar, Price};
use super::error::BartraderError;
use super::instrument::{InstrumentRef, Instruments};
use super::position::{Position, PositionId};

/// Execution cost parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeConfig {
    pub spread: f64,
    pub fee: f64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            spread: 0.0,
            fee: 0.0,
        }
    }
}

/// Price paid per unit when buying: market_price * (1 + spread).
pub fn apply_spread_buy(market_price: Price, spread: f64) -> Price {
    market_price * (1.0 + spread)
}

/// Value received when selling: value * (1 - spread).
pub fn apply_spread_sell(value: Amount, spread: f64) -> Amount {
    value * (1.0 - spread)
}

/// Amount left after the fee: amount * (1 - fee).
pub fn deduct_fee(amount: Amount, fee: f64) -> Amount {
    amount * (1.0 - fee)
}

#[derive(Debug)]
pub struct Exchange {
    instruments: Instruments,
    config: ExchangeConfig,
    start: Bar,
    end: Bar,
    next_id: Cell<u64>,
    on_cache: RefCell<HashMap<Bar, Instruments>>,
}

impl Exchange {
    /// Market range is the span from the oldest to the newest price of any
    /// instrument.
    pub fn new(instruments: Instruments, config: ExchangeConfig) -> Result<Self, BartraderError> {
        let start = instruments
            .iter()
            .map(|i| i.start())
            .max()
            .ok_or(BartraderError::EmptyMarket)?;
        let end = instruments
            .iter()
            .map(|i| i.end())
            .min()
            .ok_or(BartraderError::EmptyMarket)?;
        Ok(Exchange {
            instruments,
            config,
            start,
            end,
            next_id: Cell::new(1),
            on_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Oldest bar of the market.
    pub fn start(&self) -> Bar {
        self.start
    }

    /// Newest bar of the market.
    pub fn end(&self) -> Bar {
        self.end
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn instruments(&self) -> &[InstrumentRef] {
        &self.instruments
    }

    /// Open an account on this exchange with an initial deposit at `bar`.
    pub fn create_account(
        self: &Rc<Self>,
        deposit: Amount,
        bar: Bar,
    ) -> Result<Account, BartraderError> {
        Account::new(Rc::clone(self), deposit, bar)
    }

    /// Instruments with a price at `bar`.
    pub fn on(&self, bar: Bar) -> Instruments {
        if let Some(cached) = self.on_cache.borrow().get(&bar) {
            return cached.clone();
        }
        let active: Instruments = self
            .instruments
            .iter()
            .filter(|i| i.has(bar))
            .cloned()
            .collect();
        self.on_cache.borrow_mut().insert(bar, active.clone());
        active
    }

    /// A uniformly random instrument of the universe.
    pub fn any<R: Rng + ?Sized>(&self, rng: &mut R) -> InstrumentRef {
        let index = rng.gen_range(0..self.instruments.len());
        Rc::clone(&self.instruments[index])
    }

    /// Create a position worth `amount` of `instrument` at `bar`.
    ///
    /// Cash sufficiency is the caller's concern.
    pub fn buy(
        &self,
        instrument: &InstrumentRef,
        amount: Amount,
        bar: Bar,
    ) -> Result<Position, BartraderError> {
        let market_price = instrument.price(bar)?;
        let price = apply_spread_buy(market_price, self.config.spread);
        let net = deduct_fee(amount, self.config.fee);
        let units = net / price;
        let id = PositionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        Ok(Position {
            id,
            instrument: Rc::clone(instrument),
            amount,
            price,
            net,
            units,
            start: bar,
        })
    }

    /// Cash returned for selling `position` at `bar`.
    pub fn sell(&self, position: &Position, bar: Bar) -> Result<Amount, BartraderError> {
        let value = position.value(bar)?;
        let amount = apply_spread_sell(value, self.config.spread);
        Ok(deduct_fee(amount, self.config.fee))
    }
}
