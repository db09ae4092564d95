//! Core domain types and logic.

pub mod chart;
pub mod instrument;
pub mod position;
pub mod portfolio;
pub mod exchange;
pub mod journal;
pub mod account;
pub mod strategy;
pub mod simulation;
pub mod stats;
pub mod config_validation;
pub mod error;
