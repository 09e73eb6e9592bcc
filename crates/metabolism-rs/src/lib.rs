//! # DEADEND-METABOLISM
//!
//! Stochastic-thermodynamic simulator for microbial metabolic networks.
//!
//! ## Model
//!
//! A network of metabolites and reactions evolves under kinetics gated by
//! thermodynamics: a reaction only carries flux while its Gibbs free energy
//! change is negative, scaled by a reaction-specific rate that wanders
//! along an Ornstein-Uhlenbeck path. The system is integrated with an
//! adaptive Runge-Kutta-Fehlberg 4(5) scheme until every reaction is at or
//! above the dead-end bound, the iteration cap is hit, the timestep
//! collapses, or the runtime runs out.
//!
//! ## Features
//!
//! 1. **Network**: species with CONST / NL flags, three stoichiometric views
//! 2. **Thermodynamics**: ΔG from formation energies and concentrations
//! 3. **Stochastic rates**: calibrated OU knots, linearly interpolated
//! 4. **Integration**: error-controlled step acceptance with replayable decisions
//! 5. **Batches**: parallel sweeps over seeds and initial concentrations

pub mod config;
pub mod flux;
pub mod gibbs;
pub mod integrator;
pub mod network;
pub mod ornstein;
pub mod sweep;
pub mod trace;

pub use config::SimulationSettings;
pub use deadend_core::{DeadEndError, Result};
pub use integrator::{execute, RunOutcome, Simulation, StepDecision, Termination};
pub use network::{Metabolite, NetworkConfig, NetworkModel, Reaction, SpeciesReference};
pub use ornstein::{OuParameters, OuProcess};
pub use sweep::{run_batch, BatchReport, SeedPolicy, SweepSpec, Variation};
pub use trace::RunTrace;
