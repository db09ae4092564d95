//! CLI integration tests: config parsing and full command runs against INI
//! files on disk.

mod common;

use bartrader::adapters::file_config_adapter::FileConfigAdapter;
use bartrader::cli::{self, Cli, Command, MarketConfig};
use bartrader::domain::error::BartraderError;
use common::*;
use std::path::PathBuf;
use std::process::ExitCode;

const VALID_INI: &str = r#"
[exchange]
spread = 0.001
fee = 0.0005

[simulation]
deposit = 25000
seed = 42

[market]
source = random
instruments = 3
bars = 60

[strategy]
steps = candidates, active, random, max, limit
limit = 2
max = 500
"#;

/// ExitCode has no PartialEq, compare through Debug.
fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn simulate(config: PathBuf, seed: Option<u64>, output: Option<PathBuf>) -> ExitCode {
    cli::run(Cli {
        command: Command::Simulate {
            config,
            seed,
            output,
        },
    })
}

mod config_loading {
    use super::*;

    #[test]
    fn full_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let exchange = cli::build_exchange_config(&adapter);
        assert!((exchange.spread - 0.001).abs() < f64::EPSILON);
        assert!((exchange.fee - 0.0005).abs() < f64::EPSILON);
        assert!((cli::build_simulation_config(&adapter).deposit - 25_000.0).abs() < f64::EPSILON);
        assert_eq!(cli::build_seed(&adapter, None), 42);
        assert_eq!(
            cli::build_market_config(&adapter).unwrap(),
            MarketConfig::Random {
                instruments: 3,
                bars: 60
            }
        );
        let chain = cli::build_strategy(&adapter, 42).unwrap();
        assert_eq!(
            chain.to_string(),
            "base > candidates > active > random > max > limit"
        );
    }

    #[test]
    fn unknown_market_source() {
        let adapter = FileConfigAdapter::from_string("[market]\nsource = ftp\n").unwrap();
        let err = cli::build_market_config(&adapter).unwrap_err();
        assert!(matches!(err, BartraderError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let file = write_temp_ini("[exchange]\nspread = 2\n");
        let err = cli::load_config(&file.path().to_path_buf()).err().unwrap();
        assert!(matches!(err, BartraderError::ConfigInvalid { key, .. } if key == "spread"));
    }
}

mod commands {
    use super::*;

    #[test]
    fn simulate_writes_report() {
        let ini = write_temp_ini(VALID_INI);
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("reports").join("run.txt");

        let code = simulate(ini.path().to_path_buf(), None, Some(output.clone()));
        assert!(same_code(code, ExitCode::SUCCESS));

        let report = std::fs::read_to_string(&output).unwrap();
        assert!(report.starts_with("Statistics"));
        assert!(report.contains("Deposit"));
        assert!(report.contains("Withdraw"));
        assert!(report.contains("Trades"));
    }

    #[test]
    fn same_seed_same_report() {
        let ini = write_temp_ini(VALID_INI);
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");

        simulate(ini.path().to_path_buf(), Some(9), Some(first.clone()));
        simulate(ini.path().to_path_buf(), Some(9), Some(second.clone()));
        assert_eq!(
            std::fs::read_to_string(first).unwrap(),
            std::fs::read_to_string(second).unwrap()
        );
    }

    #[test]
    fn simulate_csv_market() {
        let data = tempfile::TempDir::new().unwrap();
        write_csv(
            data.path(),
            "AAA",
            &[("2024-01-01", 10.0), ("2024-01-02", 10.5), ("2024-01-03", 11.0)],
        );
        write_csv(
            data.path(),
            "BBB",
            &[("2024-01-01", 20.0), ("2024-01-02", 19.0), ("2024-01-03", 21.0)],
        );
        let ini = write_temp_ini(&format!(
            "[market]\nsource = csv\npath = {}\nsymbols = AAA\n\n[strategy]\nsteps = candidates\n",
            data.path().display()
        ));
        let output = data.path().join("out.txt");

        let code = simulate(ini.path().to_path_buf(), None, Some(output.clone()));
        assert!(same_code(code, ExitCode::SUCCESS));
        let report = std::fs::read_to_string(output).unwrap();
        assert!(report.contains("AAA"));
        assert!(!report.contains("BBB"));
    }

    #[test]
    fn validate_good_config() {
        let ini = write_temp_ini(VALID_INI);
        let code = cli::run(Cli {
            command: Command::Validate {
                config: ini.path().to_path_buf(),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_bad_config_exits_with_config_code() {
        let ini = write_temp_ini("[strategy]\nsteps = candidates, teleport\n");
        let code = cli::run(Cli {
            command: Command::Validate {
                config: ini.path().to_path_buf(),
            },
        });
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn missing_config_file() {
        let code = simulate(PathBuf::from("/nonexistent/bartrader.ini"), None, None);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn empty_csv_market_is_data_error() {
        let data = tempfile::TempDir::new().unwrap();
        let ini = write_temp_ini(&format!(
            "[market]\nsource = csv\npath = {}\n",
            data.path().display()
        ));
        let code = simulate(ini.path().to_path_buf(), None, None);
        assert!(same_code(code, ExitCode::from(3)));
    }

    #[test]
    fn info_lists_market() {
        let ini = write_temp_ini(VALID_INI);
        let code = cli::run(Cli {
            command: Command::Info {
                config: ini.path().to_path_buf(),
                seed: Some(1),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }
}
