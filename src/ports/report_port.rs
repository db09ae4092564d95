//! Run summary output.

use std::io::Write;

use crate::domain::account::Account;
use crate::domain::error::BartraderError;
use crate::domain::stats::Stats;

pub trait ReportPort {
    fn write(&self, account: &Account, stats: &Stats, out: &mut dyn Write)
        -> Result<(), BartraderError>;
}
