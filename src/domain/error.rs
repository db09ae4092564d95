//! Domain error types.

use crate::domain::chart::Bar;

/// Top-level error type for bartrader.
#[derive(Debug, thiserror::Error)]
pub enum BartraderError {
    #[error("bar {bar} is outside range {start}->{end}")]
    OutOfRange { bar: Bar, start: Bar, end: Bar },

    #[error("bar {bar} is newer than latest recorded bar {latest}")]
    Ordering { bar: Bar, latest: Bar },

    #[error("series already reaches the newest bar")]
    Exhausted,

    #[error("market has no instruments")]
    EmptyMarket,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BartraderError {
    /// True for errors raised by the simulation core rather than its inputs.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BartraderError::OutOfRange { .. }
                | BartraderError::Ordering { .. }
                | BartraderError::Exhausted
        )
    }
}

impl From<&BartraderError> for std::process::ExitCode {
    fn from(err: &BartraderError) -> Self {
        let code: u8 = match err {
            BartraderError::Io(_) => 1,
            BartraderError::ConfigParse { .. }
            | BartraderError::ConfigMissing { .. }
            | BartraderError::ConfigInvalid { .. } => 2,
            BartraderError::Data { .. } | BartraderError::EmptyMarket => 3,
            BartraderError::OutOfRange { .. }
            | BartraderError::Ordering { .. }
            | BartraderError::Exhausted => 4,
        };
        std::process::ExitCode::from(code)
    }
}
