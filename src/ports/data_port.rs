//! Source of an instrument universe.

use crate::domain::error::BartraderError;
use crate::domain::instrument::Instrument;

pub trait DataPort {
    /// Load every instrument, each with a chart addressed by bar.
    fn load(&self) -> Result<Vec<Instrument>, BartraderError>;
}
