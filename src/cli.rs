//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::random_market::RandomMarket;
use crate::adapters::text_report::TextReport;
use crate::domain::config_validation::validate_config;
use crate::domain::error::BartraderError;
use crate::domain::exchange::{Exchange, ExchangeConfig};
use crate::domain::instrument::Instrument;
use crate::domain::simulation::{Simulation, SimulationConfig};
use crate::domain::stats::Stats;
use crate::domain::strategy::Chain;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Chain used when `[strategy] steps` is not set.
pub const DEFAULT_STEPS: &[&str] = &["candidates", "active", "random", "max", "limit"];

const DEFAULT_SEED: u64 = 1;
const DEFAULT_INSTRUMENTS: usize = 3;
const DEFAULT_BARS: usize = 730;

#[derive(Parser, Debug)]
#[command(name = "bartrader", about = "Bar-indexed trading strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation and print its statement
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [simulation] seed
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the bar range and instruments of the configured market
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Where instruments come from.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketConfig {
    Random { instruments: usize, bars: usize },
    Csv { path: PathBuf, symbols: Option<Vec<String>> },
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig::Random {
            instruments: DEFAULT_INSTRUMENTS,
            bars: DEFAULT_BARS,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Simulate {
            config,
            seed,
            output,
        } => run_simulate(&config, seed, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, seed } => run_info(&config, seed),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, BartraderError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn build_exchange_config(adapter: &dyn ConfigPort) -> ExchangeConfig {
    let defaults = ExchangeConfig::default();
    ExchangeConfig {
        spread: adapter.get_double("exchange", "spread", defaults.spread),
        fee: adapter.get_double("exchange", "fee", defaults.fee),
    }
}

pub fn build_simulation_config(adapter: &dyn ConfigPort) -> SimulationConfig {
    let defaults = SimulationConfig::default();
    SimulationConfig {
        deposit: adapter.get_double("simulation", "deposit", defaults.deposit),
    }
}

pub fn build_seed(adapter: &dyn ConfigPort, overridden: Option<u64>) -> u64 {
    overridden.unwrap_or_else(|| {
        u64::try_from(adapter.get_int("simulation", "seed", DEFAULT_SEED as i64))
            .unwrap_or(DEFAULT_SEED)
    })
}

pub fn build_market_config(adapter: &dyn ConfigPort) -> Result<MarketConfig, BartraderError> {
    let source = adapter
        .get_string("market", "source")
        .unwrap_or_else(|| "random".to_string());
    match source.trim() {
        "random" => Ok(MarketConfig::Random {
            instruments: usize::try_from(adapter.get_int(
                "market",
                "instruments",
                DEFAULT_INSTRUMENTS as i64,
            ))
            .unwrap_or(DEFAULT_INSTRUMENTS),
            bars: usize::try_from(adapter.get_int("market", "bars", DEFAULT_BARS as i64))
                .unwrap_or(DEFAULT_BARS),
        }),
        "csv" => {
            let path = adapter
                .get_string("market", "path")
                .ok_or_else(|| BartraderError::ConfigMissing {
                    section: "market".into(),
                    key: "path".into(),
                })?;
            let symbols = adapter.get_list("market", "symbols");
            Ok(MarketConfig::Csv {
                path: PathBuf::from(path.trim()),
                symbols: if symbols.is_empty() { None } else { Some(symbols) },
            })
        }
        other => Err(BartraderError::ConfigInvalid {
            section: "market".into(),
            key: "source".into(),
            reason: format!("unknown source {other:?}"),
        }),
    }
}

pub fn build_data_port(market: &MarketConfig, seed: u64) -> Box<dyn DataPort> {
    match market {
        MarketConfig::Random { instruments, bars } => {
            Box::new(RandomMarket::new(*instruments, *bars, seed))
        }
        MarketConfig::Csv {
            path,
            symbols: Some(symbols),
        } => Box::new(CsvAdapter::with_symbols(path.clone(), symbols.clone())),
        MarketConfig::Csv {
            path,
            symbols: None,
        } => Box::new(CsvAdapter::new(path.clone())),
    }
}

/// Chain from `[strategy] steps`, each name appended in order after the
/// base step.
pub fn build_strategy(adapter: &dyn ConfigPort, seed: u64) -> Result<Chain, BartraderError> {
    let mut steps = adapter.get_list("strategy", "steps");
    if steps.is_empty() {
        steps = DEFAULT_STEPS.iter().map(|s| s.to_string()).collect();
    }
    let limit = usize::try_from(adapter.get_int("strategy", "limit", 1)).unwrap_or(1);
    let max = adapter.get_double("strategy", "max", 1000.0);

    let mut chain = Chain::new();
    for (index, step) in steps.iter().enumerate() {
        chain = match step.as_str() {
            "candidates" => chain.candidates(),
            "null" => chain.null(),
            "exit" => chain.exit(),
            "limit" => chain.limit(limit),
            "max" => chain.max(max),
            // distinct stream per random step
            "random" => chain.random(seed.wrapping_add(index as u64)),
            "active" => chain.active(),
            "expired" => chain.expired(),
            other => {
                return Err(BartraderError::ConfigInvalid {
                    section: "strategy".into(),
                    key: "steps".into(),
                    reason: format!("unknown step {other:?}"),
                });
            }
        };
    }
    Ok(chain)
}

fn load_exchange(adapter: &dyn ConfigPort, seed: u64) -> Result<Rc<Exchange>, BartraderError> {
    let market = build_market_config(adapter)?;
    eprintln!("Loading market: {market:?}");
    let instruments: Vec<Rc<Instrument>> = build_data_port(&market, seed)
        .load()?
        .into_iter()
        .map(Rc::new)
        .collect();
    let exchange = Exchange::new(instruments, build_exchange_config(adapter))?;
    Ok(Rc::new(exchange))
}

fn run_simulate(
    config_path: &PathBuf,
    seed: Option<u64>,
    output_path: Option<&PathBuf>,
) -> Result<(), BartraderError> {
    let adapter = load_config(config_path)?;
    let seed = build_seed(&adapter, seed);
    let exchange = load_exchange(&adapter, seed)?;
    let strategy = build_strategy(&adapter, seed)?;
    eprintln!(
        "Simulating {} instruments over bars {} -> {} with strategy {}",
        exchange.instruments().len(),
        exchange.start(),
        exchange.end(),
        strategy
    );

    let mut simulation = Simulation::new(
        Rc::clone(&exchange),
        Box::new(strategy),
        build_simulation_config(&adapter),
    )?;
    simulation.run()?;
    let performance = *simulation.performance();
    let account = simulation.into_account();
    let stats = Stats::compute(&account);

    eprintln!("\n=== Results ===");
    eprintln!("Bars:             {}", stats.bars);
    eprintln!("Profit:           {:.2}%", stats.profit * 100.0);
    eprintln!("Win Ratio:        {:.4}", stats.win_ratio);
    eprintln!("Sharpe Ratio:     {:.4}", stats.sharpe_ratio);
    eprintln!(
        "Orders:           {} buys, {} sells, {} expired, {} skipped",
        performance.buys, performance.sells, performance.expired, performance.skipped
    );

    let report = TextReport::new();
    match output_path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let mut file = File::create(path)?;
            report.write(&account, &stats, &mut file)?;
            file.flush()?;
            eprintln!("\nReport written to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report.write(&account, &stats, &mut out)?;
        }
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), BartraderError> {
    let adapter = load_config(config_path)?;
    let seed = build_seed(&adapter, None);
    let market = build_market_config(&adapter)?;
    let strategy = build_strategy(&adapter, seed)?;
    let exchange = build_exchange_config(&adapter);
    let simulation = build_simulation_config(&adapter);

    eprintln!("Config validated successfully");
    eprintln!("  market:   {market:?}");
    eprintln!("  exchange: spread {} fee {}", exchange.spread, exchange.fee);
    eprintln!("  deposit:  {}", simulation.deposit);
    eprintln!("  seed:     {seed}");
    eprintln!("  strategy: {strategy}");
    Ok(())
}

fn run_info(config_path: &PathBuf, seed: Option<u64>) -> Result<(), BartraderError> {
    let adapter = load_config(config_path)?;
    let seed = build_seed(&adapter, seed);
    let exchange = load_exchange(&adapter, seed)?;

    println!("Bars: {} -> {}", exchange.start(), exchange.end());
    for instrument in exchange.instruments() {
        println!(
            "{:<6} {:>5} {:>5} {:>12.4} {:>12.4}  {}",
            instrument.symbol,
            instrument.start(),
            instrument.end(),
            instrument.chart().first().unwrap_or_default(),
            instrument.chart().last().unwrap_or_default(),
            instrument.name.as_deref().unwrap_or("")
        );
    }
    eprintln!("{} instruments", exchange.instruments().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn exchange_config_defaults_to_no_costs() {
        let config = build_exchange_config(&make_config(""));
        assert_eq!(config, ExchangeConfig::default());
        let config = build_exchange_config(&make_config("[exchange]\nspread = 0.01\nfee = 0.002\n"));
        assert!((config.spread - 0.01).abs() < f64::EPSILON);
        assert!((config.fee - 0.002).abs() < f64::EPSILON);
    }

    #[test]
    fn simulation_deposit() {
        let config = build_simulation_config(&make_config(""));
        assert!((config.deposit - 10_000.0).abs() < f64::EPSILON);
        let config = build_simulation_config(&make_config("[simulation]\ndeposit = 500\n"));
        assert!((config.deposit - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seed_override_wins() {
        let adapter = make_config("[simulation]\nseed = 9\n");
        assert_eq!(build_seed(&adapter, None), 9);
        assert_eq!(build_seed(&adapter, Some(3)), 3);
        assert_eq!(build_seed(&make_config(""), None), DEFAULT_SEED);
    }

    #[test]
    fn market_config_variants() {
        assert_eq!(
            build_market_config(&make_config("")).unwrap(),
            MarketConfig::default()
        );
        let csv = build_market_config(&make_config(
            "[market]\nsource = csv\npath = /data\nsymbols = AAA, BBB\n",
        ))
        .unwrap();
        assert_eq!(
            csv,
            MarketConfig::Csv {
                path: PathBuf::from("/data"),
                symbols: Some(vec!["AAA".into(), "BBB".into()]),
            }
        );
        assert!(build_market_config(&make_config("[market]\nsource = csv\n")).is_err());
    }

    #[test]
    fn strategy_default_steps() {
        let chain = build_strategy(&make_config(""), 1).unwrap();
        assert_eq!(
            chain.names(),
            vec!["base", "candidates", "active", "random", "max", "limit"]
        );
    }

    #[test]
    fn strategy_from_steps() {
        let chain =
            build_strategy(&make_config("[strategy]\nsteps = candidates, expired\n"), 1).unwrap();
        assert_eq!(chain.names(), vec!["base", "candidates", "expired"]);
        assert!(build_strategy(&make_config("[strategy]\nsteps = nope\n"), 1).is_err());
    }

    #[test]
    fn random_market_port_loads() {
        let market = MarketConfig::Random {
            instruments: 2,
            bars: 30,
        };
        let instruments = build_data_port(&market, 5).load().unwrap();
        assert_eq!(instruments.len(), 2);
    }
}
