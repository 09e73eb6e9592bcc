//! Run-wide simulation settings.

use deadend_core::{
    Concentration, DeadEndError, Energy, Result, Temperature, Time, DEFAULT_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum simulated time (days): one hundred years.
pub const DEFAULT_RUNTIME: Time = 100.0 * 365.0;

/// Iteration cap guarding against endless step-size cycling.
pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;

/// Lower error bound for the Fehlberg step (µM).
pub const DEFAULT_E_MIN: f64 = 0.1;

/// Upper error bound for the Fehlberg step (µM).
pub const DEFAULT_E_MAX: f64 = 1.0;

/// A run is a dead end once every ΔG is at or above this value (kJ/mol).
pub const DEFAULT_DELTA_G_BOUND: Energy = -1.0;

/// The timestep is only doubled while every concentration exceeds this (µM).
pub const DOUBLING_CONCENTRATION_THRESHOLD: Concentration = 1.0;

/// Consecutive resize rejections before a step is force-accepted.
pub const DEFAULT_OSCILLATION_LIMIT: u32 = 5;

/// Spacing of Ornstein-Uhlenbeck knots (days).
pub const DEFAULT_KNOT_SPACING: Time = 7.0;

/// Typical metabolite concentration used to scale OU means (µM).
pub const DEFAULT_TYPICAL_CONCENTRATION: Concentration = 1.0;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Horizon (days)
    pub runtime: Time,
    /// Temperature (K)
    pub temperature: Temperature,
    pub max_iterations: usize,
    /// Step error below which the timestep may double (µM)
    pub e_min: f64,
    /// Step error above which the timestep halves (µM)
    pub e_max: f64,
    /// Dead-end bound on every ΔG (kJ/mol)
    pub delta_g_bound: Energy,
    /// See [`DOUBLING_CONCENTRATION_THRESHOLD`]
    pub doubling_threshold: Concentration,
    pub oscillation_limit: u32,
    /// OU knot spacing (days)
    pub knot_spacing: Time,
    /// Typical concentration for OU calibration (µM)
    pub typical_concentration: Concentration,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME,
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            e_min: DEFAULT_E_MIN,
            e_max: DEFAULT_E_MAX,
            delta_g_bound: DEFAULT_DELTA_G_BOUND,
            doubling_threshold: DOUBLING_CONCENTRATION_THRESHOLD,
            oscillation_limit: DEFAULT_OSCILLATION_LIMIT,
            knot_spacing: DEFAULT_KNOT_SPACING,
            typical_concentration: DEFAULT_TYPICAL_CONCENTRATION,
        }
    }
}

impl SimulationSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("runtime", self.runtime),
            ("temperature", self.temperature),
            ("knot spacing", self.knot_spacing),
            ("typical concentration", self.typical_concentration),
            ("e_max", self.e_max),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DeadEndError::Configuration(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        if !(self.e_min >= 0.0 && self.e_min <= self.e_max) {
            return Err(DeadEndError::Configuration(format!(
                "error bounds must satisfy 0 <= e_min <= e_max, got ({}, {})",
                self.e_min, self.e_max
            )));
        }
        if !self.delta_g_bound.is_finite() || !self.doubling_threshold.is_finite() {
            return Err(DeadEndError::Configuration(
                "dead-end bound and doubling threshold must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Number of whole knot intervals covering the runtime.
    pub fn knot_weeks(&self) -> usize {
        (self.runtime / self.knot_spacing).floor() as usize
    }
}
