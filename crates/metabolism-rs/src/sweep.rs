//! Batches of independent dead-end searches.
//!
//! Runs share the network read-only and own everything else, so they are
//! executed on the rayon pool. An unsuccessful run is an ordinary result;
//! only invalid configuration aborts the batch, and it does so before any
//! run starts.

use deadend_core::{linspace, Concentration, DeadEndError, Result, Time};
use log::info;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationSettings;
use crate::integrator::{Simulation, Termination};
use crate::network::NetworkConfig;
use crate::trace::RunTrace;

/// How each run of a batch is seeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPolicy {
    /// Every run uses the same seed, so only the varied input differs
    Fixed(u64),
    /// Run `i` uses `base + i`
    PerRun(u64),
    /// Fresh entropy per run
    Entropy,
}

impl SeedPolicy {
    pub fn seed_for(self, run: usize) -> Option<u64> {
        match self {
            Self::Fixed(seed) => Some(seed),
            Self::PerRun(base) => Some(base.wrapping_add(run as u64)),
            Self::Entropy => None,
        }
    }
}

/// Initial concentration of one metabolite swept linearly across the runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variation {
    pub metabolite: String,
    /// (min, max) in µM, both strictly positive, max > min
    pub range: (Concentration, Concentration),
}

/// Batch description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpec {
    pub runs: usize,
    /// Initial timestep (days)
    pub timestep: f64,
    pub seeds: SeedPolicy,
    pub variation: Option<Variation>,
    /// Keep the full trace of every run, not only its summary
    pub keep_traces: bool,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            runs: 50,
            timestep: 5.0,
            seeds: SeedPolicy::Entropy,
            variation: None,
            keep_traces: false,
        }
    }
}

/// Summary of one run in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub index: usize,
    pub seed: Option<u64>,
    /// Value of the varied metabolite, if any
    pub varied_concentration: Option<Concentration>,
    pub success: bool,
    pub termination: Termination,
    pub iterations: usize,
    pub final_time: Time,
    /// Composition at the dead end (successful runs only)
    pub dead_end: Option<Array1<f64>>,
    pub trace: Option<RunTrace>,
}

/// Outcomes of a batch, in run order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub metabolite_names: Vec<String>,
    pub runs: Vec<RunSummary>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.runs.iter().filter(|r| r.success).count()
    }

    /// Dead-end compositions of all successful runs
    pub fn dead_ends(&self) -> Vec<&Array1<f64>> {
        self.runs.iter().filter_map(|r| r.dead_end.as_ref()).collect()
    }
}

/// Per-run network configurations, validated before anything runs
fn run_configs(
    network: &NetworkConfig,
    spec: &SweepSpec,
) -> Result<Vec<(NetworkConfig, Option<f64>)>> {
    let Some(variation) = &spec.variation else {
        return Ok((0..spec.runs).map(|_| (network.clone(), None)).collect());
    };

    let index = network.metabolite_index(&variation.metabolite).ok_or_else(|| {
        DeadEndError::Configuration(format!(
            "unknown metabolite '{}' in sweep",
            variation.metabolite
        ))
    })?;
    let (min, max) = variation.range;
    if !(min > 0.0 && max > min && max.is_finite()) {
        return Err(DeadEndError::Configuration(format!(
            "sweep range must satisfy 0 < min < max, got ({min}, {max})"
        )));
    }

    linspace(min, max, spec.runs)
        .into_iter()
        .map(|value| Ok((network.with_initial_concentration(index, value)?, Some(value))))
        .collect()
}

/// Execute every run of `spec` in parallel.
pub fn run_batch(
    network: &NetworkConfig,
    settings: &SimulationSettings,
    spec: &SweepSpec,
) -> Result<BatchReport> {
    settings.validate()?;
    network.validate()?;
    if !(spec.timestep.is_finite() && spec.timestep > 0.0) {
        return Err(DeadEndError::Configuration(format!(
            "sweep timestep must be finite and positive, got {}",
            spec.timestep
        )));
    }
    let configs = run_configs(network, spec)?;

    let runs = configs
        .par_iter()
        .enumerate()
        .map(|(index, (config, varied))| {
            let seed = spec.seeds.seed_for(index);
            let outcome = Simulation::new(config, settings.clone()).execute(spec.timestep, seed)?;
            info!(
                "run {index}: {:?} after {} iterations at t={:.2}",
                outcome.termination, outcome.iterations, outcome.final_time
            );
            let dead_end = if outcome.success {
                outcome.trace.final_composition()
            } else {
                None
            };
            Ok(RunSummary {
                index,
                seed,
                varied_concentration: *varied,
                success: outcome.success,
                termination: outcome.termination,
                iterations: outcome.iterations,
                final_time: outcome.final_time,
                dead_end,
                trace: spec.keep_traces.then_some(outcome.trace),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let report = BatchReport {
        metabolite_names: network.metabolite_names.clone(),
        runs,
    };
    info!(
        "batch finished: {}/{} runs reached a dead end",
        report.success_count(),
        report.runs.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::networks;

    fn settings() -> SimulationSettings {
        SimulationSettings {
            runtime: 60.0,
            max_iterations: 500,
            ..SimulationSettings::default()
        }
    }

    #[test]
    fn test_seed_policy() {
        assert_eq!(SeedPolicy::Fixed(3).seed_for(7), Some(3));
        assert_eq!(SeedPolicy::PerRun(3).seed_for(7), Some(10));
        assert_eq!(SeedPolicy::Entropy.seed_for(7), None);
    }

    #[test]
    fn test_variation_configs() {
        let network = networks::anoxic_basin().build().unwrap();
        let spec = SweepSpec {
            runs: 3,
            variation: Some(Variation {
                metabolite: "O2".into(),
                range: (10.0, 30.0),
            }),
            ..SweepSpec::default()
        };
        let configs = run_configs(&network, &spec).unwrap();
        let o2 = network.metabolite_index("O2").unwrap();
        let values: Vec<_> = configs.iter().map(|(c, _)| c.initial_composition[o2]).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
        assert_eq!(configs[1].1, Some(20.0));
    }

    #[test]
    fn test_unknown_variation_rejected() {
        let network = networks::anoxic_basin().build().unwrap();
        let spec = SweepSpec {
            runs: 2,
            variation: Some(Variation {
                metabolite: "Fe3+".into(),
                range: (1.0, 2.0),
            }),
            ..SweepSpec::default()
        };
        let err = run_batch(&network, &settings(), &spec).unwrap_err();
        assert!(matches!(err, DeadEndError::Configuration(_)));
    }

    #[test]
    fn test_inverted_variation_rejected() {
        let network = networks::anoxic_basin().build().unwrap();
        let spec = SweepSpec {
            runs: 2,
            variation: Some(Variation {
                metabolite: "O2".into(),
                range: (5.0, 1.0),
            }),
            ..SweepSpec::default()
        };
        assert!(run_batch(&network, &settings(), &spec).is_err());
    }

    #[test]
    fn test_batch_runs_in_order() {
        let network = networks::anoxic_basin().build().unwrap();
        let spec = SweepSpec {
            runs: 4,
            timestep: 0.01,
            seeds: SeedPolicy::PerRun(100),
            keep_traces: true,
            ..SweepSpec::default()
        };
        let report = run_batch(&network, &settings(), &spec).unwrap();
        assert_eq!(report.runs.len(), 4);
        for (i, run) in report.runs.iter().enumerate() {
            assert_eq!(run.index, i);
            assert_eq!(run.seed, Some(100 + i as u64));
            assert!(run.trace.is_some());
            assert_eq!(run.dead_end.is_some(), run.success);
        }
        assert_eq!(report.dead_ends().len(), report.success_count());
    }
}
