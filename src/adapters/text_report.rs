//! Plain-text run statement.
//!
//! Three sections: summary statistics, the transaction statement without
//! valuation entries, and the closed trades.

use std::io::Write;

use crate::domain::account::Account;
use crate::domain::error::BartraderError;
use crate::domain::journal::Transaction;
use crate::domain::position::Trade;
use crate::domain::stats::Stats;
use crate::ports::report_port::ReportPort;

pub struct TextReport;

impl TextReport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReport {
    fn default() -> Self {
        Self::new()
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn format_stats(stats: &Stats) -> String {
    let rows = [
        ("Bars", stats.bars.to_string()),
        ("Profit", pct(stats.profit)),
        ("Win ratio", format!("{:.4}", stats.win_ratio)),
        ("Invested ratio", format!("{:.4}", stats.invested_ratio)),
        ("Fragility", format!("{:.4}", stats.fragility)),
        ("Std dev", format!("{:.4}", stats.stddev)),
        ("Sharpe ratio", format!("{:.4}", stats.sharpe_ratio)),
        ("Omega ratio", format!("{:.4}", stats.omega_ratio)),
        ("Trades", stats.trades.to_string()),
        ("Trade win ratio", pct(stats.trade_win_ratio)),
        ("Expired", stats.expired.to_string()),
    ];
    let mut out = String::from("Statistics\n");
    for (label, value) in rows {
        out.push_str(&format!("  {label:<16} {value:>12}\n"));
    }
    out
}

pub fn format_statement(transactions: &[Transaction]) -> String {
    let mut out = String::from("Transactions\n");
    out.push_str(&format!(
        "  {:>5} {:<9} {:<6} {:>10} {:>12} {:>12} {:>12} {:>12}\n",
        "Bar", "Action", "Symbol", "Price", "Amount", "Equity", "Cash", "Value"
    ));
    for t in transactions.iter().filter(|t| !t.is_valuation()) {
        let saldo = t.saldo();
        let symbol = t
            .position()
            .map(|p| p.instrument.symbol.as_str())
            .unwrap_or("");
        let price = t.price().map(|p| format!("{p:.2}")).unwrap_or_default();
        let amount = t.amount().map(|a| format!("{a:.2}")).unwrap_or_default();
        out.push_str(&format!(
            "  {:>5} {:<9} {:<6} {:>10} {:>12} {:>12.2} {:>12.2} {:>12.2}\n",
            t.bar(),
            t.summary(),
            symbol,
            price,
            amount,
            saldo.equity,
            saldo.cash,
            saldo.value()
        ));
    }
    out
}

pub fn format_trades(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "Trades\n  (none)\n".to_string();
    }
    let mut out = String::from("Trades\n");
    out.push_str(&format!(
        "  {:<6} {:>5} {:>5} {:>6} {:>12} {:>12} {:>12} {:<7}\n",
        "Symbol", "Open", "Close", "Bars", "Invested", "Returned", "Profit", "Reason"
    ));
    for trade in trades {
        out.push_str(&format!(
            "  {:<6} {:>5} {:>5} {:>6} {:>12.2} {:>12.2} {:>12.2} {:<7}\n",
            trade.position.instrument.symbol,
            trade.position.start,
            trade.end,
            trade.length(),
            trade.position.amount,
            trade.amount,
            trade.profit(),
            trade.reason
        ));
    }
    out
}

impl ReportPort for TextReport {
    fn write(
        &self,
        account: &Account,
        stats: &Stats,
        out: &mut dyn Write,
    ) -> Result<(), BartraderError> {
        writeln!(out, "{}", format_stats(stats))?;
        writeln!(out, "{}", format_statement(account.transactions()))?;
        write!(out, "{}", format_trades(account.trades()))?;
        Ok(())
    }
}
