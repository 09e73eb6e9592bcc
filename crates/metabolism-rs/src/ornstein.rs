//! Ornstein-Uhlenbeck rate multipliers.
//!
//! Each reaction gets a mean-reverting stochastic rate. Calibration draws
//! the per-reaction OU parameters from the configured ranges, knots are
//! generated on a weekly grid with the exact discrete OU transition, and
//! the integrator samples a piecewise-linear interpolant of the knots.
//!
//! One RNG stream feeds calibration and then knot generation, so a seed
//! fixes the whole process.

use deadend_core::{ensure_len, linspace, Concentration, DeadEndError, Result, Time};
use log::debug;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::config::SimulationSettings;
use crate::network::{NetworkConfig, OuRanges};

/// RNG for a run: reproducible with a seed, entropy-seeded otherwise
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

// =============================================================================
// CALIBRATION
// =============================================================================

/// Per-reaction OU parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuParameters {
    /// Long-run mean (µM/day scaled by typical concentration)
    pub means: Array1<f64>,
    /// Volatility
    pub sigmas: Array1<f64>,
    /// Mean-reversion rate (1/day)
    pub decays: Array1<f64>,
    /// Value at t = 0
    pub starts: Array1<f64>,
}

impl OuParameters {
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// All four arrays must describe the same reactions
    pub fn validate(&self) -> Result<()> {
        let n = self.means.len();
        ensure_len("OU sigmas", self.sigmas.len(), n)?;
        ensure_len("OU decays", self.decays.len(), n)?;
        ensure_len("OU starts", self.starts.len(), n)?;
        Ok(())
    }
}

/// Number of limiting substrates of reaction `n`
fn limiting_substrates(stoich_lim: &Array2<f64>, n: usize) -> i32 {
    stoich_lim.column(n).iter().filter(|&&s| s < 0.0).count() as i32
}

/// Draw OU parameters for every reaction from `rng`.
pub fn calibrate_with<R: Rng + ?Sized>(
    stoich_lim: &Array2<f64>,
    ranges: &OuRanges,
    typical_concentration: Concentration,
    rng: &mut R,
) -> Result<OuParameters> {
    let n_reactions = stoich_lim.ncols();
    ranges.validate(n_reactions)?;
    if !(typical_concentration.is_finite() && typical_concentration > 0.0) {
        return Err(DeadEndError::Configuration(format!(
            "typical concentration must be finite and positive, got {typical_concentration}"
        )));
    }

    let mut means = Array1::zeros(n_reactions);
    let mut sigmas = Array1::zeros(n_reactions);
    let mut decays = Array1::zeros(n_reactions);
    let mut starts = Array1::zeros(n_reactions);

    for n in 0..n_reactions {
        let limiting = limiting_substrates(stoich_lim, n);

        let mean = rng.gen_range(ranges.rates[[n, 0]]..=ranges.rates[[n, 1]])
            / typical_concentration.powi(limiting);
        if !mean.is_finite() {
            return Err(DeadEndError::Configuration(format!(
                "OU mean of reaction {n} overflows with typical concentration \
                 {typical_concentration}"
            )));
        }
        let sigma = rng.gen_range(ranges.stds[[n, 0]] * mean..=ranges.stds[[n, 1]] * mean);
        let log_decay =
            rng.gen_range(ranges.decays[[n, 0]].log10()..=ranges.decays[[n, 1]].log10());
        let start = Normal::new(mean, sigma)
            .map_err(|e| {
                DeadEndError::Configuration(format!("OU start distribution for reaction {n}: {e}"))
            })?
            .sample(rng)
            .abs();

        means[n] = mean;
        sigmas[n] = sigma;
        decays[n] = 10f64.powf(log_decay).abs();
        starts[n] = start;
    }

    Ok(OuParameters {
        means,
        sigmas,
        decays,
        starts,
    })
}

/// Seeded calibration; identical inputs and seed give bit-identical output.
pub fn calibrate(
    stoich_lim: &Array2<f64>,
    ranges: &OuRanges,
    typical_concentration: Concentration,
    seed: Option<u64>,
) -> Result<OuParameters> {
    calibrate_with(stoich_lim, ranges, typical_concentration, &mut seeded_rng(seed))
}

// =============================================================================
// TRAJECTORY
// =============================================================================

/// OU values at `n_knots` points spaced `dt` apart, floored at zero.
pub fn knots<R: Rng + ?Sized>(
    n_knots: usize,
    mean: f64,
    sigma: f64,
    decay: f64,
    start: f64,
    dt: Time,
    rng: &mut R,
) -> Vec<f64> {
    let mut values = Vec::with_capacity(n_knots);
    if n_knots == 0 {
        return values;
    }
    values.push(start);

    let std = sigma * (1.0 - (-2.0 * decay * dt).exp()).sqrt();
    let reversion = (-decay * dt).exp();

    for _ in 1..n_knots {
        let previous = values[values.len() - 1];
        let expectation = mean + (previous - mean) * reversion;
        let z: f64 = StandardNormal.sample(rng);
        values.push((expectation + std * z).max(0.0));
    }

    values
}

/// Stochastic rate process: knots per reaction plus a linear interpolant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuProcess {
    times: Vec<Time>,
    /// reactions × knots
    values: Array2<f64>,
}

impl OuProcess {
    /// Generate knots for every reaction at `times`.
    pub fn generate<R: Rng + ?Sized>(
        times: Vec<Time>,
        params: &OuParameters,
        dt: Time,
        rng: &mut R,
    ) -> Result<Self> {
        params.validate()?;
        if times.len() < 2 {
            return Err(DeadEndError::Configuration(format!(
                "OU process needs at least two knot times, got {}",
                times.len()
            )));
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(DeadEndError::Configuration(
                "OU knot times must be strictly increasing".into(),
            ));
        }

        let mut values = Array2::zeros((params.len(), times.len()));
        for n in 0..params.len() {
            let row = knots(
                times.len(),
                params.means[n],
                params.sigmas[n],
                params.decays[n],
                params.starts[n],
                dt,
                rng,
            );
            values.row_mut(n).assign(&Array1::from(row));
        }

        Ok(Self { times, values })
    }

    /// Calibrate and generate the process covering the run horizon.
    ///
    /// Knot times are `linspace(0, (weeks + 1)·dt, weeks + 1)` with
    /// `weeks = ⌊runtime / dt⌋`, so the last knot lies past the horizon.
    pub fn for_network<R: Rng + ?Sized>(
        network: &NetworkConfig,
        settings: &SimulationSettings,
        rng: &mut R,
    ) -> Result<(OuParameters, Self)> {
        let params = calibrate_with(
            &network.stoichiometry.limiting,
            &network.ou_ranges,
            settings.typical_concentration,
            rng,
        )?;

        let weeks = settings.knot_weeks().max(1);
        let times = linspace(0.0, (weeks + 1) as f64 * settings.knot_spacing, weeks + 1);
        debug!(
            "OU process: {} reactions, {} knots up to day {:.1}",
            params.len(),
            times.len(),
            times[times.len() - 1]
        );

        let process = Self::generate(times, &params, settings.knot_spacing, rng)?;
        Ok((params, process))
    }

    pub fn knot_times(&self) -> &[Time] {
        &self.times
    }

    /// reactions × knots
    pub fn knot_values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Covered interval `[first knot, last knot]`
    pub fn domain(&self) -> (Time, Time) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Rate multipliers for every reaction at time `t`.
    ///
    /// Queries outside [`Self::domain`] are configuration errors; the
    /// process is never extrapolated.
    pub fn sample(&self, t: Time) -> Result<Array1<f64>> {
        let (start, end) = self.domain();
        if !(t >= start && t <= end) {
            return Err(DeadEndError::Configuration(format!(
                "OU process sampled at t = {t}, outside knot domain [{start}, {end}]"
            )));
        }

        let upper = self.times.partition_point(|&k| k <= t);
        if upper == self.times.len() {
            return Ok(self.values.column(upper - 1).to_owned());
        }

        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let w = (t - t0) / (t1 - t0);
        let left = self.values.column(upper - 1);
        let right = self.values.column(upper);
        Ok(&left + &((&right - &left) * w))
    }
}
