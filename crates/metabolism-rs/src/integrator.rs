//! Adaptive RKF45 integration towards a thermodynamic dead end.
//!
//! Each iteration evaluates ΔG at the current composition, samples the OU
//! rate multipliers once, takes an embedded Fehlberg step and then decides:
//!
//! | Check (in order) | Decision |
//! |------------------|----------|
//! | iteration cap exceeded | stop, unsuccessful |
//! | non-finite tentative state | halve, retry |
//! | negative tentative state | halve, retry |
//! | oscillation counter over limit | force-accept |
//! | error > `e_max` | halve, count, retry |
//! | error < `e_min` and all C > threshold | double, count, retry |
//! | timestep is exactly zero | stop, unsuccessful |
//! | otherwise | accept |
//!
//! After an accepted step the run ends successfully when every ΔG of the
//! pre-step composition sits at or above the dead-end bound.

use deadend_core::{ensure_len, rkf45_step, DeadEndError, Result, Time};
use log::{debug, info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::config::SimulationSettings;
use crate::flux::MetabolicRhs;
use crate::gibbs::gibbs;
use crate::network::NetworkConfig;
use crate::ornstein::{seeded_rng, OuParameters, OuProcess};
use crate::trace::{RunTrace, TraceRecorder};

// =============================================================================
// STATES AND DECISIONS
// =============================================================================

/// Outcome of the acceptance policy for one tentative step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDecision {
    /// Iteration cap exceeded (terminal)
    MaxIterations,
    /// Tentative state has NaN or infinite entries; halve and retry
    HalveNonFinite,
    /// Tentative state has a negative entry; halve and retry
    HalveNegative,
    /// Too many consecutive resizes; take the step as is
    ForceAccept,
    /// Error above `e_max`; halve and retry
    HalveError,
    /// Error below `e_min` with every concentration above threshold; double and retry
    Double,
    /// Timestep decayed to exactly zero (terminal)
    TimestepZero,
    Accept,
}

impl StepDecision {
    /// Whether the step advances the state
    pub fn accepts(self) -> bool {
        matches!(self, Self::Accept | Self::ForceAccept)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::MaxIterations | Self::TimestepZero)
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every ΔG reached the bound
    DeadEnd,
    MaxIterations,
    TimestepZero,
    /// Clock passed the runtime horizon
    TimeExceeded,
}

impl Termination {
    pub fn is_success(self) -> bool {
        self == Self::DeadEnd
    }
}

/// Loop counters the acceptance policy depends on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepContext {
    /// 1-based iteration number
    pub iteration: usize,
    /// Consecutive resize rejections
    pub oscillations: u32,
    pub timestep: f64,
}

/// Everything computed for one tentative step
#[derive(Debug, Clone)]
pub struct StepEvaluation {
    /// ΔG at the current composition
    pub delta_g: Array1<f64>,
    /// OU multipliers sampled at the current time
    pub stochastic: Array1<f64>,
    /// 5th order increment
    pub flux: Array1<f64>,
    /// ‖Δ₅ − Δ₄‖₂
    pub error: f64,
    /// `C + flux`
    pub tentative: Array1<f64>,
}

/// One iteration of a recorded run, enough to replay its decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub time: Time,
    pub context: StepContext,
    pub composition: Array1<f64>,
    pub decision: StepDecision,
}

/// Result of [`Simulation::execute`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub trace: RunTrace,
    pub success: bool,
    pub termination: Termination,
    pub iterations: usize,
    pub final_time: Time,
    pub final_timestep: f64,
    /// Calibrated OU parameters (absent when a process was supplied)
    pub parameters: Option<OuParameters>,
    /// Per-iteration decisions, only filled when recording is enabled
    pub steps: Vec<StepRecord>,
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Dead-end search over one network. Holds only shared, read-only inputs;
/// every `execute` call owns its own state and RNG.
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    network: &'a NetworkConfig,
    settings: SimulationSettings,
    record_steps: bool,
}

impl<'a> Simulation<'a> {
    pub fn new(network: &'a NetworkConfig, settings: SimulationSettings) -> Self {
        Self {
            network,
            settings,
            record_steps: false,
        }
    }

    /// Keep a [`StepRecord`] for every iteration
    pub fn record_steps(mut self, enabled: bool) -> Self {
        self.record_steps = enabled;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        self.network
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Calibrate the OU process from `seed` and run to termination.
    pub fn execute(&self, timestep: f64, seed: Option<u64>) -> Result<RunOutcome> {
        self.settings.validate()?;
        self.network.validate()?;
        let mut rng = seeded_rng(seed);
        let (params, process) = OuProcess::for_network(self.network, &self.settings, &mut rng)?;
        let mut outcome = self.run(&process, timestep)?;
        outcome.parameters = Some(params);
        Ok(outcome)
    }

    /// Run against a prepared stochastic process.
    pub fn execute_with_process(&self, process: &OuProcess, timestep: f64) -> Result<RunOutcome> {
        self.settings.validate()?;
        self.network.validate()?;
        self.run(process, timestep)
    }

    fn run(&self, process: &OuProcess, timestep: f64) -> Result<RunOutcome> {
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(DeadEndError::Configuration(format!(
                "initial timestep must be finite and positive, got {timestep}"
            )));
        }
        if process.knot_values().nrows() != self.network.n_reactions() {
            return Err(DeadEndError::Configuration(format!(
                "OU process has {} reactions, network has {}",
                process.knot_values().nrows(),
                self.network.n_reactions()
            )));
        }

        let s = &self.settings;
        let mut trace = TraceRecorder::new();
        let mut steps = Vec::new();

        let mut composition = self.network.initial_composition.clone();
        let mut time: Time = 0.0;
        let mut ctx = StepContext {
            iteration: 0,
            oscillations: 0,
            timestep,
        };

        trace.note("# Time (in days) : message.");
        trace.message(time, format!("simulation starts with timestep {timestep}."));
        debug!(
            "starting run: {} metabolites, {} reactions, timestep {timestep}",
            self.network.n_metabolites(),
            self.network.n_reactions()
        );

        let termination = loop {
            if !(time <= s.runtime) {
                trace.message(time, format!("runtime of {} days exceeded.", s.runtime));
                break Termination::TimeExceeded;
            }

            ctx.iteration += 1;
            let eval = self.evaluate(process, time, ctx.timestep, &composition)?;
            let decision = self.decide(&ctx, &eval);

            if self.record_steps {
                steps.push(StepRecord {
                    time,
                    context: ctx,
                    composition: composition.clone(),
                    decision,
                });
            }

            match decision {
                StepDecision::MaxIterations => {
                    trace.message(
                        time,
                        format!(
                            "simulation terminated after {} iterations (iteration limit {}).",
                            ctx.iteration, s.max_iterations
                        ),
                    );
                    break Termination::MaxIterations;
                }
                StepDecision::HalveNonFinite => {
                    ctx.timestep /= 2.0;
                    debug!("t={time:.4}: non-finite state, timestep -> {}", ctx.timestep);
                    trace.message(
                        time,
                        format!(
                            "timestep halved to {} due to non-finite concentrations.",
                            ctx.timestep
                        ),
                    );
                    continue;
                }
                StepDecision::HalveNegative => {
                    ctx.timestep /= 2.0;
                    debug!("t={time:.4}: negative state, timestep -> {}", ctx.timestep);
                    trace.message(
                        time,
                        format!(
                            "timestep halved to {} due to negative concentrations.",
                            ctx.timestep
                        ),
                    );
                    continue;
                }
                StepDecision::HalveError => {
                    ctx.timestep /= 2.0;
                    ctx.oscillations += 1;
                    debug!(
                        "t={time:.4}: error {:.3e} > {}, timestep -> {}",
                        eval.error, s.e_max, ctx.timestep
                    );
                    trace.message(
                        time,
                        format!(
                            "timestep halved to {} due to error over {}.",
                            ctx.timestep, s.e_max
                        ),
                    );
                    continue;
                }
                StepDecision::Double => {
                    ctx.timestep *= 2.0;
                    ctx.oscillations += 1;
                    debug!(
                        "t={time:.4}: error {:.3e} < {}, timestep -> {}",
                        eval.error, s.e_min, ctx.timestep
                    );
                    trace.message(
                        time,
                        format!(
                            "timestep doubled to {} due to error under {}.",
                            ctx.timestep, s.e_min
                        ),
                    );
                    continue;
                }
                StepDecision::TimestepZero => {
                    trace.message(
                        time,
                        format!("simulation terminated early with timestep {}.", ctx.timestep),
                    );
                    break Termination::TimestepZero;
                }
                StepDecision::ForceAccept => {
                    warn!(
                        "t={time:.4}: {} consecutive resizes, forcing timestep {}",
                        ctx.oscillations, ctx.timestep
                    );
                    trace.message(
                        time,
                        format!(
                            "excessive loop count detected. Continuing with timestep {}.",
                            ctx.timestep
                        ),
                    );
                }
                StepDecision::Accept => {}
            }

            trace.record(time, &composition, &eval.delta_g, &eval.stochastic, &eval.flux);
            ctx.oscillations = 0;

            if eval.delta_g.iter().all(|&g| g >= s.delta_g_bound) {
                trace.message(
                    time,
                    format!("simulation terminated successfully with timestep {}.", ctx.timestep),
                );
                break Termination::DeadEnd;
            }

            composition = eval.tentative;
            time += ctx.timestep;
        };

        let success = termination.is_success();
        if !success {
            trace.message(
                time,
                format!("simulation terminated unsuccessfully with timestep {}.", ctx.timestep),
            );
        }
        trace.note(format!("Simulation terminated after {} loop iterations.", ctx.iteration));
        info!(
            "run finished: {termination:?} at t={time:.4} after {} iterations ({} accepted steps)",
            ctx.iteration,
            trace.len()
        );

        Ok(RunOutcome {
            trace: trace.finish(self.network.n_metabolites(), self.network.n_reactions()),
            success,
            termination,
            iterations: ctx.iteration,
            final_time: time,
            final_timestep: ctx.timestep,
            parameters: None,
            steps,
        })
    }

    /// Evaluate ΔG, the OU sample and the Fehlberg step at `(t, C)` with
    /// timestep `h`. Pure: nothing about the run state changes.
    pub fn evaluate(
        &self,
        process: &OuProcess,
        t: Time,
        h: f64,
        composition: &Array1<f64>,
    ) -> Result<StepEvaluation> {
        ensure_len("composition", composition.len(), self.network.n_metabolites())?;
        let s = &self.network.stoichiometry;
        let delta_g = gibbs(
            composition,
            &s.full,
            &self.network.formation_energies,
            self.settings.temperature,
        );
        let stochastic = process.sample(t)?;

        let rhs = MetabolicRhs {
            network: self.network,
            temperature: self.settings.temperature,
            stochastic: &stochastic,
        };
        let step = rkf45_step(&rhs, t, h, composition);
        let tentative = composition + &step.increment;

        Ok(StepEvaluation {
            delta_g,
            stochastic,
            flux: step.increment,
            error: step.error,
            tentative,
        })
    }

    /// Acceptance policy for one evaluated step.
    pub fn decide(&self, ctx: &StepContext, eval: &StepEvaluation) -> StepDecision {
        let s = &self.settings;

        if ctx.iteration > s.max_iterations {
            return StepDecision::MaxIterations;
        }
        if eval.tentative.iter().any(|c| !c.is_finite()) {
            return StepDecision::HalveNonFinite;
        }
        if eval.tentative.iter().any(|&c| c < 0.0) {
            return StepDecision::HalveNegative;
        }

        let forced = ctx.oscillations > s.oscillation_limit;
        if !forced {
            if eval.error > s.e_max {
                return StepDecision::HalveError;
            }
            if eval.error < s.e_min && eval.tentative.iter().all(|&c| c > s.doubling_threshold) {
                return StepDecision::Double;
            }
        }

        if ctx.timestep == 0.0 {
            StepDecision::TimestepZero
        } else if forced {
            StepDecision::ForceAccept
        } else {
            StepDecision::Accept
        }
    }

    /// Re-derive the decision of every recorded iteration.
    pub fn replay(&self, process: &OuProcess, records: &[StepRecord]) -> Result<Vec<StepDecision>> {
        records
            .iter()
            .map(|r| {
                let eval = self.evaluate(process, r.time, r.context.timestep, &r.composition)?;
                Ok(self.decide(&r.context, &eval))
            })
            .collect()
    }
}

/// Run one dead-end search.
///
/// Returns the trace and whether a dead end was reached. Numerical trouble
/// never surfaces as `Err`; only invalid configuration does.
pub fn execute(
    network: &NetworkConfig,
    settings: &SimulationSettings,
    timestep: f64,
    seed: Option<u64>,
) -> Result<(RunTrace, bool)> {
    let outcome = Simulation::new(network, settings.clone()).execute(timestep, seed)?;
    Ok((outcome.trace, outcome.success))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Metabolite, NetworkModel, Reaction, SpeciesReference};
    use ndarray::array;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A -> B with fixed rate `k` and standard energies `g_a`, `g_b`
    fn a_to_b(g_a: f64, g_b: f64, c_a: f64, c_b: f64, k: f64) -> NetworkConfig {
        let mut model = NetworkModel::new();
        model.add_metabolite(Metabolite::new("A", g_a, c_a));
        model.add_metabolite(Metabolite::new("B", g_b, c_b));
        model.add_reaction(
            Reaction::new("r")
                .reactant(SpeciesReference::new("A", 1.0))
                .product(SpeciesReference::new("B", 1.0))
                .with_ranges((k, k), (1.0, 1.0), (0.0, 0.0)),
        );
        model.build().unwrap()
    }

    fn short_settings() -> SimulationSettings {
        SimulationSettings {
            runtime: 70.0,
            max_iterations: 10_000,
            ..SimulationSettings::default()
        }
    }

    fn ctx(iteration: usize, oscillations: u32, timestep: f64) -> StepContext {
        StepContext {
            iteration,
            oscillations,
            timestep,
        }
    }

    fn eval(error: f64, tentative: Array1<f64>) -> StepEvaluation {
        StepEvaluation {
            delta_g: array![-5.0],
            stochastic: array![1.0],
            flux: Array1::zeros(tentative.len()),
            error,
            tentative,
        }
    }

    #[test]
    fn test_decision_order() {
        let network = a_to_b(0.0, -10.0, 5.0, 5.0, 1.0);
        let sim = Simulation::new(&network, short_settings());

        use StepDecision::*;
        let cases = [
            (ctx(10_001, 0, 1.0), eval(f64::NAN, array![f64::NAN, -1.0]), MaxIterations),
            (ctx(1, 0, 1.0), eval(0.5, array![f64::INFINITY, -1.0]), HalveNonFinite),
            (ctx(1, 9, 1.0), eval(0.5, array![2.0, -1.0]), HalveNegative),
            (ctx(1, 6, 1.0), eval(50.0, array![2.0, 2.0]), ForceAccept),
            (ctx(1, 5, 1.0), eval(50.0, array![2.0, 2.0]), HalveError),
            (ctx(1, 0, 1.0), eval(0.01, array![2.0, 2.0]), Double),
            // doubling needs every concentration above the threshold
            (ctx(1, 0, 1.0), eval(0.01, array![2.0, 0.5]), Accept),
            (ctx(1, 0, 1.0), eval(0.5, array![2.0, 2.0]), Accept),
            (ctx(1, 0, 0.0), eval(0.5, array![2.0, 0.5]), TimestepZero),
            (ctx(1, 6, 0.0), eval(0.0, array![2.0, 2.0]), TimestepZero),
        ];
        for (context, evaluation, expected) in cases {
            assert_eq!(sim.decide(&context, &evaluation), expected);
        }
    }

    #[test]
    fn test_doubling_threshold_overridable() {
        let network = a_to_b(0.0, -10.0, 5.0, 5.0, 1.0);
        let settings = SimulationSettings {
            doubling_threshold: 0.1,
            ..short_settings()
        };
        let sim = Simulation::new(&network, settings);
        assert_eq!(
            sim.decide(&ctx(1, 0, 1.0), &eval(0.01, array![2.0, 0.5])),
            StepDecision::Double
        );
    }

    #[test]
    fn test_dead_end_at_start() {
        init_logger();
        // ΔG = +50 for A -> B at equal concentrations
        let network = a_to_b(-50.0, 0.0, 0.5, 0.5, 10.0);
        let outcome = Simulation::new(&network, short_settings()).execute(0.01, Some(1)).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.termination, Termination::DeadEnd);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.trace.time()[0], 0.0);
        assert!(outcome
            .trace
            .message_lines()
            .iter()
            .any(|m| m.contains("terminated successfully")));
    }

    #[test]
    fn test_iteration_cap() {
        init_logger();
        // both species constant: ΔG never moves
        let mut model = NetworkModel::new();
        model.add_metabolite(Metabolite::new("A", 0.0, 0.5));
        model.add_metabolite(Metabolite::new("B", -100.0, 0.5));
        model.add_reaction(
            Reaction::new("r")
                .reactant(SpeciesReference::new("A", 1.0).constant())
                .product(SpeciesReference::new("B", 1.0).constant()),
        );
        let network = model.build().unwrap();
        let settings = SimulationSettings {
            max_iterations: 10,
            ..short_settings()
        };

        let outcome = Simulation::new(&network, settings).execute(0.01, Some(3)).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.termination, Termination::MaxIterations);
        assert_eq!(outcome.trace.len(), 10);
        assert!(outcome
            .trace
            .message_lines()
            .iter()
            .any(|m| m.contains("iteration limit 10")));
        // composition untouched throughout
        assert!(outcome.trace.composition().iter().all(|&c| c == 0.5));
    }

    #[test]
    fn test_negative_step_is_halved() {
        init_logger();
        let network = a_to_b(-10.0, -60.0, 5.0, 5.0, 1000.0);
        let outcome = Simulation::new(&network, short_settings())
            .record_steps(true)
            .execute(1.0, Some(4))
            .unwrap();

        assert_eq!(outcome.steps[0].decision, StepDecision::HalveNegative);
        assert!(outcome
            .trace
            .message_lines()
            .iter()
            .any(|m| m.contains("due to negative concentrations")));
        assert!(outcome.trace.composition().iter().all(|&c| c >= 0.0));
        assert!(outcome.final_timestep < 1.0);
    }

    #[test]
    fn test_oscillation_escape_hatch() {
        init_logger();
        // no flux, concentrations above threshold: error 0 keeps asking to double
        let mut model = NetworkModel::new();
        model.add_metabolite(Metabolite::new("A", 0.0, 5.0));
        model.add_metabolite(Metabolite::new("B", -100.0, 5.0));
        model.add_reaction(
            Reaction::new("r")
                .reactant(SpeciesReference::new("A", 1.0).constant())
                .product(SpeciesReference::new("B", 1.0).constant()),
        );
        let network = model.build().unwrap();
        let settings = SimulationSettings {
            max_iterations: 7,
            ..short_settings()
        };

        let outcome = Simulation::new(&network, settings)
            .record_steps(true)
            .execute(0.01, Some(5))
            .unwrap();

        let decisions: Vec<_> = outcome.steps.iter().map(|r| r.decision).collect();
        let mut expected = vec![StepDecision::Double; 6];
        expected.push(StepDecision::ForceAccept);
        expected.push(StepDecision::MaxIterations);
        assert_eq!(decisions, expected);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.final_timestep, 0.01 * 64.0);
        assert!(outcome
            .trace
            .message_lines()
            .iter()
            .any(|m| m.contains("excessive loop count")));
    }

    #[test]
    fn test_replay_reproduces_decisions() {
        let network = a_to_b(-10.0, -60.0, 5.0, 5.0, 200.0);
        let settings = SimulationSettings {
            max_iterations: 300,
            ..short_settings()
        };
        let sim = Simulation::new(&network, settings.clone()).record_steps(true);

        let mut rng = seeded_rng(Some(17));
        let (_, process) = OuProcess::for_network(&network, &settings, &mut rng).unwrap();
        let outcome = sim.execute_with_process(&process, 0.5).unwrap();
        assert!(!outcome.steps.is_empty());

        let replayed = sim.replay(&process, &outcome.steps).unwrap();
        let recorded: Vec<_> = outcome.steps.iter().map(|r| r.decision).collect();
        assert_eq!(replayed, recorded);
    }

    #[test]
    fn test_replay_rejects_wrong_length_composition() {
        let network = crate::network::networks::anoxic_basin().build().unwrap();
        let settings = short_settings();
        let sim = Simulation::new(&network, settings.clone());
        let (_, process) =
            OuProcess::for_network(&network, &settings, &mut seeded_rng(Some(3))).unwrap();

        let record = StepRecord {
            time: 0.0,
            context: ctx(1, 0, 0.1),
            composition: array![1.0, 2.0],
            decision: StepDecision::Accept,
        };
        let result = sim.replay(&process, &[record]);
        assert!(matches!(result, Err(DeadEndError::Configuration(_))));
    }

    #[test]
    fn test_timestep_collapses_to_zero() {
        init_logger();
        // A starts empty but is drained without gating the rate, so every
        // positive step overshoots below zero
        let mut network = a_to_b(1000.0, 0.0, 1.0, 1.0, 1000.0);
        network.stoichiometry.limiting[[0, 0]] = 0.0;
        network.initial_composition[0] = 0.0;
        let settings = short_settings();
        let (_, process) =
            OuProcess::for_network(&network, &settings, &mut seeded_rng(Some(2))).unwrap();

        let outcome = Simulation::new(&network, settings)
            .record_steps(true)
            .run(&process, 1.0)
            .unwrap();
        assert_eq!(outcome.termination, Termination::TimestepZero);
        assert!(!outcome.success);
        assert_eq!(outcome.final_timestep, 0.0);
        assert!(outcome.trace.is_empty());

        let decisions: Vec<_> = outcome.steps.iter().map(|r| r.decision).collect();
        let (last, halvings) = decisions.split_last().unwrap();
        assert_eq!(*last, StepDecision::TimestepZero);
        assert!(halvings.len() > 1000);
        assert!(halvings.iter().all(|&d| d == StepDecision::HalveNegative));
        assert!(outcome
            .trace
            .message_lines()
            .iter()
            .any(|m| m.contains("terminated early with timestep 0.")));
    }

    #[test]
    fn test_constant_species_untouched() {
        let network = crate::network::networks::anoxic_basin().build().unwrap();
        let h_plus = network.metabolite_index("H+").unwrap();
        let settings = SimulationSettings {
            runtime: 30.0,
            max_iterations: 2_000,
            ..SimulationSettings::default()
        };
        let outcome = Simulation::new(&network, settings).execute(0.01, Some(21)).unwrap();
        let column = outcome.trace.composition().column(h_plus);
        assert!(column.iter().all(|&c| c == network.initial_composition[h_plus]));
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let network = a_to_b(0.0, -10.0, 5.0, 5.0, 1.0);
        let sim = Simulation::new(&network, short_settings());
        assert!(matches!(sim.execute(0.0, Some(1)), Err(DeadEndError::Configuration(_))));
        assert!(matches!(sim.execute(f64::NAN, Some(1)), Err(DeadEndError::Configuration(_))));
    }

    #[test]
    fn test_execute_contract() {
        let network = a_to_b(-50.0, 0.0, 0.5, 0.5, 10.0);
        let (trace, success) = execute(&network, &short_settings(), 0.01, Some(2)).unwrap();
        assert!(success);
        assert_eq!(trace.composition().row(0).to_vec(), vec![0.5, 0.5]);
    }
}
