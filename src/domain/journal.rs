//! Ordered ledger of cash and equity snapshots.
//!
//! Transactions are appended from the oldest bar towards the newest; a
//! transaction may never be recorded at a bar newer than the latest one.

use super::chart::{Amount, Bar, Price};
use super::error::BartraderError;
use super::position::{CloseReason, Position};

/// Split of account value into cash and position equity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Saldo {
    pub cash: Amount,
    pub equity: Amount,
}

impl Saldo {
    pub fn value(&self) -> Amount {
        self.cash + self.equity
    }
}

#[derive(Debug, Clone)]
pub enum Transaction {
    Deposit {
        bar: Bar,
        amount: Amount,
        saldo: Saldo,
    },
    Withdraw {
        bar: Bar,
        amount: Amount,
        saldo: Saldo,
    },
    Open {
        bar: Bar,
        amount: Amount,
        position: Position,
        price: Price,
        saldo: Saldo,
    },
    Close {
        bar: Bar,
        amount: Amount,
        position: Position,
        price: Price,
        reason: CloseReason,
        saldo: Saldo,
    },
    /// Synthesized mark-to-market entry, no cash movement.
    Valuation { bar: Bar, saldo: Saldo },
}

impl Transaction {
    pub fn bar(&self) -> Bar {
        match self {
            Transaction::Deposit { bar, .. }
            | Transaction::Withdraw { bar, .. }
            | Transaction::Open { bar, .. }
            | Transaction::Close { bar, .. }
            | Transaction::Valuation { bar, .. } => *bar,
        }
    }

    pub fn saldo(&self) -> Saldo {
        match self {
            Transaction::Deposit { saldo, .. }
            | Transaction::Withdraw { saldo, .. }
            | Transaction::Open { saldo, .. }
            | Transaction::Close { saldo, .. }
            | Transaction::Valuation { saldo, .. } => *saldo,
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Transaction::Deposit { amount, .. }
            | Transaction::Withdraw { amount, .. }
            | Transaction::Open { amount, .. }
            | Transaction::Close { amount, .. } => Some(*amount),
            Transaction::Valuation { .. } => None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            Transaction::Open { position, .. } | Transaction::Close { position, .. } => {
                Some(position)
            }
            _ => None,
        }
    }

    pub fn price(&self) -> Option<Price> {
        match self {
            Transaction::Open { price, .. } | Transaction::Close { price, .. } => Some(*price),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Transaction::Deposit { .. } => "Deposit".to_string(),
            Transaction::Withdraw { .. } => "Withdraw".to_string(),
            Transaction::Open { .. } => "Open".to_string(),
            Transaction::Close { reason, .. } => reason.to_string(),
            Transaction::Valuation { .. } => "Valuation".to_string(),
        }
    }

    pub fn is_valuation(&self) -> bool {
        matches!(self, Transaction::Valuation { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    list: Vec<Transaction>,
    start: Option<Bar>,
    end: Option<Bar>,
}

impl Journal {
    pub fn new() -> Self {
        Journal::default()
    }

    /// Oldest recorded bar.
    pub fn start(&self) -> Option<Bar> {
        self.start
    }

    /// Newest recorded bar.
    pub fn end(&self) -> Option<Bar> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.list
    }

    /// Saldo of the first transaction.
    pub fn first(&self) -> Saldo {
        self.list.first().map(Transaction::saldo).unwrap_or_default()
    }

    /// Saldo of the most recent transaction.
    pub fn last(&self) -> Saldo {
        self.list.last().map(Transaction::saldo).unwrap_or_default()
    }

    /// Append a transaction. Fails if it is newer than the latest entry.
    pub fn add(&mut self, transaction: Transaction) -> Result<(), BartraderError> {
        let bar = transaction.bar();
        if let Some(latest) = self.end
            && bar > latest
        {
            return Err(BartraderError::Ordering { bar, latest });
        }
        if self.start.is_none() {
            self.start = Some(bar);
        }
        self.end = Some(bar);
        self.list.push(transaction);
        Ok(())
    }

    /// Last saldo recorded at `bar`.
    pub fn saldo(&self, bar: Bar) -> Option<Saldo> {
        self.list
            .iter()
            .rev()
            .find(|t| t.bar() == bar)
            .map(Transaction::saldo)
    }

    /// One saldo per bar, oldest first, taking the last entry at each bar.
    pub fn daily(&self) -> Vec<Saldo> {
        let mut daily: Vec<Saldo> = Vec::new();
        let mut current: Option<Bar> = None;
        for t in &self.list {
            if current == Some(t.bar()) {
                if let Some(last) = daily.last_mut() {
                    *last = t.saldo();
                }
            } else {
                current = Some(t.bar());
                daily.push(t.saldo());
            }
        }
        daily
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEWEST: Bar = 0;

    fn deposit(bar: Bar, cash: f64) -> Transaction {
        Transaction::Deposit {
            bar,
            amount: cash,
            saldo: Saldo { cash, equity: 0.0 },
        }
    }

    fn valuation(bar: Bar, cash: f64, equity: f64) -> Transaction {
        Transaction::Valuation {
            bar,
            saldo: Saldo { cash, equity },
        }
    }

    #[test]
    fn empty_journal() {
        let journal = Journal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.start(), None);
        assert_eq!(journal.end(), None);
        assert_eq!(journal.first(), Saldo::default());
        assert_eq!(journal.last(), Saldo::default());
        assert!(journal.daily().is_empty());
    }

    #[test]
    fn add_tracks_range() {
        let mut journal = Journal::new();
        journal.add(deposit(3, 100.0)).unwrap();
        journal.add(deposit(1, 200.0)).unwrap();
        assert_eq!(journal.start(), Some(3));
        assert_eq!(journal.end(), Some(1));
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn same_bar_is_accepted() {
        let mut journal = Journal::new();
        journal.add(deposit(2, 100.0)).unwrap();
        journal.add(deposit(2, 150.0)).unwrap();
        assert_eq!(journal.end(), Some(2));
    }

    #[test]
    fn newer_bar_is_rejected() {
        let mut journal = Journal::new();
        journal.add(deposit(1, 100.0)).unwrap();
        let err = journal.add(deposit(2, 100.0)).unwrap_err();
        assert!(matches!(err, BartraderError::Ordering { bar: 2, latest: 1 }));
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn daily_takes_last_entry_per_bar() {
        let mut journal = Journal::new();
        journal.add(deposit(2, 100.0)).unwrap();
        journal.add(valuation(1, 100.0, 0.0)).unwrap();
        journal.add(deposit(1, 200.0)).unwrap();
        journal.add(deposit(NEWEST, 300.0)).unwrap();
        let values: Vec<f64> = journal.daily().iter().map(Saldo::value).collect();
        assert_eq!(values, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn saldo_at_bar() {
        let mut journal = Journal::new();
        journal.add(deposit(2, 100.0)).unwrap();
        journal.add(valuation(1, 100.0, 5.0)).unwrap();
        journal.add(deposit(1, 200.0)).unwrap();
        assert_eq!(journal.saldo(1).map(|s| s.cash), Some(200.0));
        assert_eq!(journal.saldo(2).map(|s| s.cash), Some(100.0));
        assert_eq!(journal.saldo(NEWEST), None);
    }

    #[test]
    fn transaction_accessors() {
        let t = valuation(4, 10.0, 5.0);
        assert_eq!(t.bar(), 4);
        assert!((t.saldo().value() - 15.0).abs() < f64::EPSILON);
        assert_eq!(t.amount(), None);
        assert!(t.position().is_none());
        assert!(t.is_valuation());
        assert_eq!(t.summary(), "Valuation");
        assert_eq!(deposit(1, 3.0).summary(), "Deposit");
        assert_eq!(deposit(1, 3.0).amount(), Some(3.0));
    }
}
