//! Performance statistics over an account's daily values.
//!
//! All ratios are computed over the journal's daily series, oldest first.
//! Degenerate inputs (no movement, no variance, non-positive values) yield 0.

use super::account::Account;
use super::journal::Saldo;
use super::position::CloseReason;

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub bars: usize,
    pub profit: f64,
    pub win_ratio: f64,
    pub invested_ratio: f64,
    pub fragility: f64,
    pub stddev: f64,
    pub sharpe_ratio: f64,
    pub omega_ratio: f64,
    pub trades: usize,
    pub trade_win_ratio: f64,
    pub expired: usize,
}

impl Stats {
    pub fn compute(account: &Account) -> Self {
        let daily = account.daily();
        let values: Vec<f64> = daily.iter().map(Saldo::value).collect();
        let trades = account.trades();

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let trade_win_ratio = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };
        let expired = trades
            .iter()
            .filter(|t| t.reason == CloseReason::Expire)
            .count();

        Stats {
            bars: account.bars(),
            profit: profit(&values),
            win_ratio: win_ratio(&values),
            invested_ratio: invested_ratio(&daily),
            fragility: fragility(&values),
            stddev: stddev(&values),
            sharpe_ratio: sharpe_ratio(&values),
            omega_ratio: omega_ratio(&values),
            trades: trades.len(),
            trade_win_ratio,
            expired,
        }
    }
}

/// Last value relative to the first, minus one.
pub fn profit(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Sum of gains over the sum of all movement.
pub fn win_ratio(values: &[f64]) -> f64 {
    let (mut gain, mut movement) = (0.0, 0.0);
    for w in values.windows(2) {
        let diff = w[1] - w[0];
        movement += diff.abs();
        if diff >= 0.0 {
            gain += diff;
        }
    }
    if movement == 0.0 { 0.0 } else { gain / movement }
}

/// Average share of value held as equity.
pub fn invested_ratio(daily: &[Saldo]) -> f64 {
    if daily.is_empty() {
        return 0.0;
    }
    let total: f64 = daily
        .iter()
        .map(|s| {
            let value = s.value();
            if value != 0.0 { s.equity / value } else { 0.0 }
        })
        .sum();
    total / daily.len() as f64
}

/// Deviation from an exponential trend, relative to the median value.
pub fn fragility(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().any(|&v| v <= 0.0) {
        return 0.0;
    }
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let (intercept, slope) = linear_regression(&logs);
    let residuals: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, v)| v - (intercept + slope * i as f64).exp())
        .collect();
    let median = median(values);
    if median == 0.0 {
        return 0.0;
    }
    std_dev(&residuals) / median
}

/// Exponential of the standard deviation of log values.
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|&v| v <= 0.0) {
        return 0.0;
    }
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    std_dev(&logs).exp()
}

/// Mean over standard deviation of simple returns.
///
/// A negative mean is multiplied by the deviation instead, so that among
/// losing series the steadier one ranks higher.
pub fn sharpe_ratio(values: &[f64]) -> f64 {
    let returns: Vec<f64> = values
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let avg = mean(&returns);
    let std = std_dev(&returns);
    if avg >= 0.0 {
        if std > 0.0 { avg / std } else { 0.0 }
    } else {
        avg * std
    }
}

/// Summed gains over summed losses.
pub fn omega_ratio(values: &[f64]) -> f64 {
    let (mut gains, mut losses) = (0.0, 0.0);
    for w in values.windows(2) {
        let diff = w[1] - w[0];
        if diff > 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }
    if losses == 0.0 { 0.0 } else { gains / losses }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Upper median.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}

/// Least squares fit of `y = intercept + slope * i`.
fn linear_regression(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(ys);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (y_mean - slope * x_mean, slope)
}
