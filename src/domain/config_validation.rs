//! Configuration validation.
//!
//! Checks every configured value before a market is loaded or a simulation
//! is run. Missing optional keys fall back to their defaults.

use std::path::Path;

use crate::domain::error::BartraderError;
use crate::domain::strategy::STEP_NAMES;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BartraderError> {
    validate_exchange_config(config)?;
    validate_simulation_config(config)?;
    validate_market_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_exchange_config(config: &dyn ConfigPort) -> Result<(), BartraderError> {
    validate_ratio(config, "exchange", "spread")?;
    validate_ratio(config, "exchange", "fee")?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), BartraderError> {
    if let Some(deposit) = parse_double(config, "simulation", "deposit")?
        && deposit <= 0.0
    {
        return Err(invalid("simulation", "deposit", "deposit must be positive"));
    }
    if let Some(seed) = parse_int(config, "simulation", "seed")?
        && seed < 0
    {
        return Err(invalid("simulation", "seed", "seed must be non-negative"));
    }
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), BartraderError> {
    let source = config
        .get_string("market", "source")
        .unwrap_or_else(|| "random".to_string());
    match source.trim() {
        "random" => {
            if let Some(count) = parse_int(config, "market", "instruments")?
                && count < 1
            {
                return Err(invalid("market", "instruments", "instruments must be at least 1"));
            }
            if let Some(bars) = parse_int(config, "market", "bars")?
                && bars < 2
            {
                return Err(invalid("market", "bars", "bars must be at least 2"));
            }
            Ok(())
        }
        "csv" => match config.get_string("market", "path") {
            Some(path) if !path.trim().is_empty() => {
                if Path::new(path.trim()).is_dir() {
                    Ok(())
                } else {
                    Err(invalid("market", "path", &format!("{path} is not a directory")))
                }
            }
            _ => Err(BartraderError::ConfigMissing {
                section: "market".to_string(),
                key: "path".to_string(),
            }),
        },
        other => Err(invalid(
            "market",
            "source",
            &format!("unknown source {other:?}, expected random or csv"),
        )),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BartraderError> {
    for step in config.get_list("strategy", "steps") {
        if !STEP_NAMES.contains(&step.as_str()) {
            return Err(invalid(
                "strategy",
                "steps",
                &format!("unknown step {step:?}, expected one of {}", STEP_NAMES.join(", ")),
            ));
        }
    }
    if let Some(limit) = parse_int(config, "strategy", "limit")?
        && limit < 0
    {
        return Err(invalid("strategy", "limit", "limit must be non-negative"));
    }
    if let Some(max) = parse_double(config, "strategy", "max")?
        && max <= 0.0
    {
        return Err(invalid("strategy", "max", "max must be positive"));
    }
    Ok(())
}

fn validate_ratio(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), BartraderError> {
    if let Some(value) = parse_double(config, section, key)?
        && !(0.0..1.0).contains(&value)
    {
        return Err(invalid(section, key, &format!("{key} must be in [0, 1)")));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> BartraderError {
    BartraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, BartraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(section, key, &format!("{raw:?} is not a number"))),
    }
}

fn parse_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, BartraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("{raw:?} is not an integer"))),
    }
}
