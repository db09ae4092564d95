//! Collection of open positions keyed by id.

use std::collections::BTreeMap;

use super::chart::{Amount, Bar};
use super::error::BartraderError;
use super::position::{Position, PositionId};

#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: BTreeMap<PositionId, Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Portfolio::default()
    }

    /// Insert a position. A position with the same id is replaced.
    pub fn add(&mut self, position: Position) {
        self.positions.insert(position.id, position);
    }

    /// Take a position out of the portfolio, if held.
    pub fn remove(&mut self, id: PositionId) -> Option<Position> {
        self.positions.remove(&id)
    }

    pub fn has(&self, id: PositionId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Held positions in order of opening.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Cost basis of all positions.
    pub fn invested(&self) -> Amount {
        self.positions.values().map(Position::invested).sum()
    }

    /// Market value of all positions at `bar`.
    pub fn value(&self, bar: Bar) -> Result<Amount, BartraderError> {
        self.positions.values().map(|p| p.value(bar)).sum()
    }

    /// Unrealized profit of all positions at `bar`.
    pub fn profit(&self, bar: Bar) -> Result<Amount, BartraderError> {
        Ok(self.value(bar)? - self.invested())
    }
}
