//! Open positions and closed trades.

use std::fmt;

use crate::domain::chart::{Amount, Bar, Price};
use crate::domain::error::BartraderError;
use crate::domain::instrument::InstrumentRef;

/// Unique position identifier, issued by the exchange and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Position {
    pub id: PositionId,
    pub instrument: InstrumentRef,
    /// Cash committed, including fees.
    pub amount: Amount,
    /// Execution price of one unit, including spread.
    pub price: Price,
    /// Cash converted into units, after the fee.
    pub net: Amount,
    pub units: f64,
    /// Bar at which the position was opened.
    pub start: Bar,
}

impl Position {
    pub fn invested(&self) -> Amount {
        self.amount
    }

    /// Market value at `bar`, equal to `units * price(bar)`.
    ///
    /// Scaled from the net amount so that a position valued at its opening
    /// price is worth exactly the cash converted into it.
    pub fn value(&self, bar: Bar) -> Result<Amount, BartraderError> {
        let price = self.instrument.price(bar)?;
        Ok(self.net * (price / self.price))
    }

    /// Unrealized profit at `bar`.
    pub fn profit(&self, bar: Bar) -> Result<Amount, BartraderError> {
        Ok(self.value(bar)? - self.amount)
    }
}

/// Positions are compared by identity.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:.2} [{}-{}-{}]",
            self.instrument.symbol,
            self.amount,
            self.instrument.start(),
            self.start,
            self.instrument.end()
        )
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    Close,
    Expire,
    Loss,
    Profit,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::Close => "Close",
            CloseReason::Expire => "Expire",
            CloseReason::Loss => "Loss",
            CloseReason::Profit => "Profit",
        };
        f.pad(s)
    }
}

/// A position that has been opened and closed.
#[derive(Debug, Clone)]
pub struct Trade {
    pub position: Position,
    pub end: Bar,
    /// Cash returned at close.
    pub amount: Amount,
    pub reason: CloseReason,
}

impl Trade {
    pub fn new(position: Position, end: Bar, amount: Amount, reason: CloseReason) -> Self {
        Trade {
            position,
            end,
            amount,
            reason,
        }
    }

    /// Number of bars from open to close.
    pub fn length(&self) -> usize {
        self.position.start.saturating_sub(self.end)
    }

    pub fn profit(&self) -> Amount {
        self.amount - self.position.amount
    }

    pub fn is_win(&self) -> bool {
        self.profit() > 0.0
    }
}
