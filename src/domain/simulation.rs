//! Bar loop driving a strategy against an exchange.

use std::rc::Rc;

use tracing::{debug, info};

use crate::domain::account::Account;
use crate::domain::chart::{Amount, Bar};
use crate::domain::error::BartraderError;
use crate::domain::exchange::Exchange;
use crate::domain::position::CloseReason;
use crate::domain::strategy::{CloseOrder, PurchaseOrder, Strategy, StrategyContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub deposit: Amount,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig { deposit: 10_000.0 }
    }
}

/// Counters collected while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Performance {
    pub steps: usize,
    pub buys: usize,
    pub sells: usize,
    pub expired: usize,
    /// Purchase orders not covered by cash.
    pub skipped: usize,
}

/// Relative slack under which an order is trimmed to the remaining cash.
const SPLIT_TOLERANCE: f64 = 1e-9;

/// `amount`, or the whole balance when `amount` exceeds it by rounding only.
fn settle_amount(amount: Amount, balance: Amount) -> Amount {
    if amount > balance && balance > 0.0 && amount - balance <= amount * SPLIT_TOLERANCE {
        balance
    } else {
        amount
    }
}

pub struct Simulation {
    exchange: Rc<Exchange>,
    strategy: Box<dyn Strategy>,
    account: Account,
    performance: Performance,
}

impl Simulation {
    /// Opens the account at the oldest bar of the market.
    pub fn new(
        exchange: Rc<Exchange>,
        strategy: Box<dyn Strategy>,
        config: SimulationConfig,
    ) -> Result<Self, BartraderError> {
        let account = exchange.create_account(config.deposit, exchange.start())?;
        Ok(Simulation {
            exchange,
            strategy,
            account,
            performance: Performance::default(),
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn into_account(self) -> Account {
        self.account
    }

    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    /// Close positions whose instrument has no price at `bar`, at the last
    /// bar they were priced.
    fn expire(&mut self, bar: Bar) -> Result<(), BartraderError> {
        let expired: Vec<_> = self
            .account
            .portfolio()
            .positions()
            .filter(|p| !p.instrument.has(bar))
            .cloned()
            .collect();
        for position in expired {
            if self.account.remove(&position, bar + 1, CloseReason::Expire)? {
                debug!(bar = bar + 1, position = %position, "expired");
                self.performance.expired += 1;
            }
        }
        Ok(())
    }

    fn context(&mut self, bar: Bar) -> Result<StrategyContext, BartraderError> {
        let value = self.account.value(bar)?;
        let amount = self.account.balance();
        let instruments = self.exchange.on(bar);
        let suggested = if instruments.is_empty() {
            0.0
        } else {
            amount / instruments.len() as f64
        };
        let purchase_orders = instruments
            .into_iter()
            .map(|instrument| PurchaseOrder {
                instrument,
                amount: suggested,
            })
            .collect();
        let positions = self.account.positions();
        let close_orders = positions
            .iter()
            .map(|position| CloseOrder {
                position: position.clone(),
                confidence: 1.0,
                reason: CloseReason::Close,
            })
            .collect();
        Ok(StrategyContext {
            bar,
            value,
            amount,
            purchase_orders,
            positions,
            close_orders,
        })
    }

    fn sell(&mut self, context: &StrategyContext) -> Result<(), BartraderError> {
        for order in self.strategy.close(context) {
            if self.account.remove(&order.position, context.bar, order.reason)? {
                self.performance.sells += 1;
            }
        }
        Ok(())
    }

    fn buy(&mut self, context: &StrategyContext) -> Result<(), BartraderError> {
        for order in self.strategy.open(context) {
            if order.amount <= 0.0 {
                self.performance.skipped += 1;
                continue;
            }
            let amount = settle_amount(order.amount, self.account.balance());
            match self.account.add(&order.instrument, amount, context.bar)? {
                Some(_) => self.performance.buys += 1,
                None => {
                    debug!(bar = context.bar, symbol = %order.instrument.symbol, amount = order.amount, "skipped purchase");
                    self.performance.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// One bar: expire, then sell, then buy.
    fn step(&mut self, bar: Bar) -> Result<(), BartraderError> {
        self.expire(bar)?;
        let context = self.context(bar)?;
        self.sell(&context)?;
        self.buy(&context)?;
        self.performance.steps += 1;
        Ok(())
    }

    /// Run from the oldest to the newest bar of the market.
    pub fn run(&mut self) -> Result<(), BartraderError> {
        let (start, end) = (self.exchange.start(), self.exchange.end());
        info!(
            strategy = %self.strategy.name(),
            start,
            end,
            instruments = self.exchange.instruments().len(),
            "simulation started"
        );
        for bar in (end..=start).rev() {
            self.step(bar)?;
        }
        self.account.withdraw(0.0, end)?;
        info!(
            steps = self.performance.steps,
            buys = self.performance.buys,
            sells = self.performance.sells,
            expired = self.performance.expired,
            skipped = self.performance.skipped,
            balance = self.account.balance(),
            "simulation finished"
        );
        Ok(())
    }
}
