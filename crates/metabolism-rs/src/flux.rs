//! Thermodynamically gated reaction kinetics (the ODE right-hand side).
//!
//! A reaction only runs while ΔG < 0. Its rate is the stochastic rate
//! multiplier times the concentration of every limiting substrate it
//! consumes; `dC/dt = S_nconst · H`.

use deadend_core::{OdeSystem, StateVector, Temperature, Time};
use ndarray::{Array1, Array2};

use crate::gibbs::gibbs;
use crate::network::NetworkConfig;

/// Per-reaction rates `H` (µM/day)
pub fn reaction_rates(
    c: &Array1<f64>,
    delta_g: &Array1<f64>,
    stochastic: &Array1<f64>,
    stoich_lim: &Array2<f64>,
) -> Array1<f64> {
    let mut rates = Array1::zeros(delta_g.len());

    for (n, rate) in rates.iter_mut().enumerate() {
        if delta_g[n] >= 0.0 {
            continue;
        }
        *rate = stoich_lim
            .column(n)
            .iter()
            .zip(c.iter())
            .filter(|&(&s, _)| s < 0.0)
            .fold(stochastic[n], |h, (_, &cm)| h * cm);
    }

    rates
}

/// Instantaneous composition change `dC/dt` (µM/day)
pub fn flux(
    c: &Array1<f64>,
    delta_g: &Array1<f64>,
    stochastic: &Array1<f64>,
    stoich_lim: &Array2<f64>,
    stoich_nconst: &Array2<f64>,
) -> Array1<f64> {
    stoich_nconst.dot(&reaction_rates(c, delta_g, stochastic, stoich_lim))
}

/// `f(t, C) = flux(C, gibbs(C), X)` with `X` frozen for one step.
///
/// ΔG is recomputed at every stage composition; the stochastic vector is
/// sampled once by the caller and passed in.
pub struct MetabolicRhs<'a> {
    pub network: &'a NetworkConfig,
    pub temperature: Temperature,
    pub stochastic: &'a Array1<f64>,
}

impl OdeSystem for MetabolicRhs<'_> {
    fn dimension(&self) -> usize {
        self.network.n_metabolites()
    }

    fn derivatives(&self, _t: Time, c: &StateVector) -> StateVector {
        let s = &self.network.stoichiometry;
        let delta_g = gibbs(c, &s.full, &self.network.formation_energies, self.temperature);
        flux(c, &delta_g, self.stochastic, &s.limiting, &s.non_constant)
    }
}
