//! Account bookkeeping: journal, portfolio and trade history.
//!
//! Every cash-affecting operation first valuates the account up to its bar,
//! so the journal holds one or more entries for every bar between the
//! opening bar and the latest operation.

use std::rc::Rc;

use tracing::debug;

use super::chart::{Amount, Bar, Chart};
use super::error::BartraderError;
use super::exchange::Exchange;
use super::instrument::InstrumentRef;
use super::journal::{Journal, Saldo, Transaction};
use super::portfolio::Portfolio;
use super::position::{CloseReason, Position, Trade};

#[derive(Debug)]
pub struct Account {
    exchange: Rc<Exchange>,
    portfolio: Portfolio,
    journal: Journal,
    trades: Vec<Trade>,
}

impl Account {
    /// Open an account with an initial deposit at `bar`.
    pub fn new(exchange: Rc<Exchange>, deposit: Amount, bar: Bar) -> Result<Self, BartraderError> {
        let mut account = Account {
            exchange,
            portfolio: Portfolio::new(),
            journal: Journal::new(),
            trades: Vec::new(),
        };
        account.deposit(deposit, bar)?;
        Ok(account)
    }

    pub fn exchange(&self) -> &Rc<Exchange> {
        &self.exchange
    }

    /// Fill the journal with valuations from the latest entry down to `bar`.
    fn valuate(&mut self, bar: Bar) -> Result<(), BartraderError> {
        let Some(latest) = self.journal.end() else {
            return Ok(());
        };
        if bar > latest {
            return Err(BartraderError::Ordering { bar, latest });
        }
        let cash = self.journal.last().cash;
        for index in (bar..latest).rev() {
            let equity = self.portfolio.value(index)?;
            self.journal.add(Transaction::Valuation {
                bar: index,
                saldo: Saldo { cash, equity },
            })?;
        }
        Ok(())
    }

    pub fn deposit(&mut self, amount: Amount, bar: Bar) -> Result<(), BartraderError> {
        self.valuate(bar)?;
        let last = self.journal.last();
        let saldo = Saldo {
            cash: last.cash + amount,
            equity: last.equity,
        };
        debug!(bar, amount, cash = saldo.cash, "deposit");
        self.journal.add(Transaction::Deposit { bar, amount, saldo })
    }

    pub fn withdraw(&mut self, amount: Amount, bar: Bar) -> Result<(), BartraderError> {
        self.valuate(bar)?;
        let last = self.journal.last();
        let saldo = Saldo {
            cash: last.cash - amount,
            equity: last.equity,
        };
        debug!(bar, amount, cash = saldo.cash, "withdraw");
        self.journal.add(Transaction::Withdraw { bar, amount, saldo })
    }

    /// Buy `amount` of `instrument` at `bar`.
    ///
    /// Returns `Ok(None)` when the cash balance does not cover the amount.
    pub fn add(
        &mut self,
        instrument: &InstrumentRef,
        amount: Amount,
        bar: Bar,
    ) -> Result<Option<Position>, BartraderError> {
        let balance = self.balance();
        if amount > balance {
            debug!(bar, symbol = %instrument.symbol, amount, balance, "insufficient funds");
            return Ok(None);
        }
        let position = self.exchange.buy(instrument, amount, bar)?;
        self.valuate(bar)?;
        let last = self.journal.last();
        let price = if position.units != 0.0 {
            amount / position.units
        } else {
            position.price
        };
        self.journal.add(Transaction::Open {
            bar,
            amount,
            position: position.clone(),
            price,
            saldo: Saldo {
                cash: last.cash - amount,
                equity: last.equity + amount,
            },
        })?;
        debug!(bar, position = %position, id = %position.id, "open");
        self.portfolio.add(position.clone());
        Ok(Some(position))
    }

    /// Sell a held position at `bar`.
    ///
    /// Returns `Ok(false)` when the position is not (or no longer) held.
    pub fn remove(
        &mut self,
        position: &Position,
        bar: Bar,
        reason: CloseReason,
    ) -> Result<bool, BartraderError> {
        let Some(held) = self.portfolio.get(position.id).cloned() else {
            return Ok(false);
        };
        let amount = self.exchange.sell(&held, bar)?;
        self.valuate(bar)?;
        self.portfolio.remove(held.id);
        let last = self.journal.last();
        let price = if held.units != 0.0 {
            amount / held.units
        } else {
            held.price
        };
        self.journal.add(Transaction::Close {
            bar,
            amount,
            position: held.clone(),
            price,
            reason,
            saldo: Saldo {
                cash: last.cash + amount,
                equity: last.equity - amount,
            },
        })?;
        debug!(bar, position = %held, id = %held.id, %reason, amount, "close");
        self.trades.push(Trade::new(held, bar, amount, reason));
        Ok(true)
    }

    /// Cash available after the latest journal entry.
    pub fn balance(&self) -> Amount {
        self.journal.last().cash
    }

    /// Cash plus equity at `bar`, valuating up to it first.
    pub fn value(&mut self, bar: Bar) -> Result<Amount, BartraderError> {
        self.valuate(bar)?;
        Ok(self.journal.last().value())
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn positions(&self) -> Vec<Position> {
        self.portfolio.positions().cloned().collect()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.journal.transactions()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn daily(&self) -> Vec<Saldo> {
        self.journal.daily()
    }

    /// Daily account value as a chart over the journal's bar range.
    pub fn valuation(&self) -> Result<Chart, BartraderError> {
        let Some(start) = self.journal.start() else {
            return Ok(Chart::new(Vec::new(), 0));
        };
        let mut chart = Chart::accumulating(start);
        for saldo in self.journal.daily() {
            chart.add(saldo.value())?;
        }
        Ok(chart)
    }

    /// Number of bars spanned by the journal.
    pub fn bars(&self) -> usize {
        match (self.journal.start(), self.journal.end()) {
            (Some(start), Some(end)) => start - end + 1,
            _ => 0,
        }
    }
}
