//! # DeadEnd Core
//!
//! Shared types and utilities for thermodynamic dead-end simulation of
//! microbial metabolic networks.
//!
//! ## Units
//!
//! | Quantity | Unit |
//! |----------|------|
//! | Concentration | µM |
//! | Free energy | kJ/mol |
//! | Time | days |
//! | Rate | µM/day |
//! | Temperature | K |
//!
//! ## Design Philosophy
//!
//! 1. Thermodynamic gating ahead of kinetics
//! 2. Immutable configuration, private per-run state
//! 3. Deterministic given a seed

use ndarray::Array1;
use thiserror::Error;

pub mod fehlberg;

pub use fehlberg::{rkf45_step, FehlbergStep};

/// Common errors
#[derive(Debug, Error)]
pub enum DeadEndError {
    /// Malformed network, unknown reference, mismatched parameter lengths.
    /// Always fatal and raised before a run starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeadEndError>;

/// Time point (days)
pub type Time = f64;

/// Concentration (µM)
pub type Concentration = f64;

/// Free energy (kJ/mol)
pub type Energy = f64;

/// Temperature (K)
pub type Temperature = f64;

/// State vector for ODE systems
pub type StateVector = Array1<f64>;

/// Universal gas constant (kJ/(mol·K))
pub const GAS_CONSTANT: f64 = 8.3e-3;

/// Default simulation temperature (K)
pub const DEFAULT_TEMPERATURE: Temperature = 298.0;

/// ODE system trait (for integrators)
pub trait OdeSystem {
    /// System dimension
    fn dimension(&self) -> usize;

    /// Compute derivatives: dy/dt = f(t, y)
    fn derivatives(&self, t: Time, y: &StateVector) -> StateVector;
}

/// Returns `Err(Configuration)` unless `actual == expected`.
pub fn ensure_len(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(DeadEndError::Configuration(format!(
            "{what} has length {actual}, expected {expected}"
        )));
    }
    Ok(())
}

/// `n` evenly spaced points over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
