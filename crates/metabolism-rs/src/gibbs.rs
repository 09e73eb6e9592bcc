//! Reaction Gibbs free energies.
//!
//! ΔG = Sᵗ · (ΔGf0 + R·T·ln(c)), with c the molar concentration.

use deadend_core::{Temperature, GAS_CONSTANT};
use ndarray::{Array1, Array2};

/// µM composition to the molar scale used in the log term
pub const MOLAR_SCALE: f64 = 1e-5;

/// Stand-in for non-positive molar concentrations inside the logarithm
pub const MOLAR_FLOOR: f64 = 1e-37;

/// Per-reaction ΔG (kJ/mol) for composition `c` (µM).
///
/// Never fails. Non-positive concentrations are floored for the log only;
/// `c` itself is left untouched.
pub fn gibbs(
    c: &Array1<f64>,
    stoich_full: &Array2<f64>,
    formation_energies: &Array1<f64>,
    temperature: Temperature,
) -> Array1<f64> {
    let rt = GAS_CONSTANT * temperature;
    let chemical_potential = c
        .iter()
        .zip(formation_energies.iter())
        .map(|(&ci, &g0)| {
            let molar = ci * MOLAR_SCALE;
            let molar = if molar > 0.0 { molar } else { MOLAR_FLOOR };
            g0 + rt * molar.ln()
        })
        .collect::<Array1<f64>>();

    stoich_full.t().dot(&chemical_potential)
}
