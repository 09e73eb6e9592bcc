//! Reaction network description and the immutable run configuration.
//!
//! A [`NetworkModel`] lists metabolites and reactions with flagged species
//! references. [`NetworkModel::build`] assembles the three stoichiometric
//! matrices and validates everything into a [`NetworkConfig`], which is the
//! only thing the integrator ever reads.

use deadend_core::{ensure_len, Concentration, DeadEndError, Energy, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// NETWORK DESCRIPTION
// =============================================================================

/// Per-species flag inside a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesFlag {
    /// Concentration is held fixed by this reaction (`CONST`)
    Constant,
    /// Does not gate the reaction rate (`NL`); consumed NL species are also constant
    NonLimiting,
}

/// Species reference in a reaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesReference {
    pub metabolite: String,
    /// Unsigned coefficient; the side of the reaction gives the sign
    pub coefficient: f64,
    pub flags: Vec<SpeciesFlag>,
}

impl SpeciesReference {
    pub fn new(metabolite: &str, coefficient: f64) -> Self {
        Self {
            metabolite: metabolite.to_string(),
            coefficient: coefficient.abs(),
            flags: Vec::new(),
        }
    }

    pub fn constant(mut self) -> Self {
        self.flags.push(SpeciesFlag::Constant);
        self
    }

    pub fn non_limiting(mut self) -> Self {
        self.flags.push(SpeciesFlag::NonLimiting);
        self
    }

    pub fn has(&self, flag: SpeciesFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Metabolite (chemical species)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metabolite {
    pub name: String,
    /// Standard formation free energy (kJ/mol)
    pub formation_energy: Energy,
    /// Initial concentration (µM), strictly positive
    pub initial_concentration: Concentration,
}

impl Metabolite {
    pub fn new(name: &str, formation_energy: Energy, initial_concentration: Concentration) -> Self {
        Self {
            name: name.to_string(),
            formation_energy,
            initial_concentration,
        }
    }
}

/// Closed interval `(min, max)`
pub type Range = (f64, f64);

/// Reaction with its Ornstein-Uhlenbeck parameter ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub reactants: Vec<SpeciesReference>,
    pub products: Vec<SpeciesReference>,
    /// Typical rate (µM/day)
    pub rate_range: Range,
    /// Typical OU decay rate (1/day)
    pub decay_range: Range,
    /// Typical standard deviation relative to the mean
    pub std_range: Range,
}

impl Reaction {
    /// Reaction with the default OU ranges of the reference networks
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reactants: Vec::new(),
            products: Vec::new(),
            rate_range: (0.1, 50.0),
            decay_range: (0.1, 20.0),
            std_range: (0.1, 1.0),
        }
    }

    pub fn reactant(mut self, species: SpeciesReference) -> Self {
        self.reactants.push(species);
        self
    }

    pub fn product(mut self, species: SpeciesReference) -> Self {
        self.products.push(species);
        self
    }

    pub fn with_ranges(mut self, rate: Range, decay: Range, std: Range) -> Self {
        self.rate_range = rate;
        self.decay_range = decay;
        self.std_range = std;
        self
    }

    /// (signed coefficient, reference) for every participant
    fn signed_species(&self) -> impl Iterator<Item = (f64, &SpeciesReference)> {
        self.reactants
            .iter()
            .map(|sr| (-sr.coefficient, sr))
            .chain(self.products.iter().map(|sr| (sr.coefficient, sr)))
    }
}

/// Complete network model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkModel {
    pub metabolites: Vec<Metabolite>,
    pub reactions: Vec<Reaction>,
}

impl NetworkModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metabolite
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        self.metabolites.push(metabolite);
    }

    /// Add a reaction
    pub fn add_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    /// Get metabolite by name
    pub fn get_metabolite(&self, name: &str) -> Option<&Metabolite> {
        self.metabolites.iter().find(|m| m.name == name)
    }

    /// Build the full, limiting and non-constant stoichiometry matrices.
    ///
    /// Unknown metabolites and species listed twice in one reaction are
    /// configuration errors.
    pub fn stoichiometry(&self) -> Result<Stoichiometry> {
        let n_metabolites = self.metabolites.len();
        let n_reactions = self.reactions.len();
        let mut full = Array2::zeros((n_metabolites, n_reactions));
        let mut limiting = Array2::zeros((n_metabolites, n_reactions));
        let mut non_constant = Array2::zeros((n_metabolites, n_reactions));

        let metabolite_index: HashMap<_, _> = self
            .metabolites
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), i))
            .collect();

        for (j, reaction) in self.reactions.iter().enumerate() {
            let mut seen = Vec::new();
            for (coeff, sr) in reaction.signed_species() {
                let i = *metabolite_index.get(sr.metabolite.as_str()).ok_or_else(|| {
                    DeadEndError::Configuration(format!(
                        "reaction '{}' references unknown metabolite '{}'",
                        reaction.name, sr.metabolite
                    ))
                })?;
                if seen.contains(&i) {
                    return Err(DeadEndError::Configuration(format!(
                        "metabolite '{}' appears more than once in reaction '{}'",
                        sr.metabolite, reaction.name
                    )));
                }
                seen.push(i);

                full[[i, j]] = coeff;
                if !sr.has(SpeciesFlag::Constant) {
                    non_constant[[i, j]] = coeff;
                }
                if sr.has(SpeciesFlag::NonLimiting) {
                    if coeff < 0.0 {
                        non_constant[[i, j]] = 0.0;
                    }
                } else {
                    limiting[[i, j]] = coeff;
                }
            }
        }

        Ok(Stoichiometry {
            full,
            limiting,
            non_constant,
        })
    }

    /// Assemble and validate the immutable run configuration
    pub fn build(&self) -> Result<NetworkConfig> {
        let stoichiometry = self.stoichiometry()?;
        let n = self.reactions.len();
        let mut ou_ranges = OuRanges {
            rates: Array2::zeros((n, 2)),
            decays: Array2::zeros((n, 2)),
            stds: Array2::zeros((n, 2)),
        };
        for (j, r) in self.reactions.iter().enumerate() {
            ou_ranges.rates[[j, 0]] = r.rate_range.0;
            ou_ranges.rates[[j, 1]] = r.rate_range.1;
            ou_ranges.decays[[j, 0]] = r.decay_range.0;
            ou_ranges.decays[[j, 1]] = r.decay_range.1;
            ou_ranges.stds[[j, 0]] = r.std_range.0;
            ou_ranges.stds[[j, 1]] = r.std_range.1;
        }

        NetworkConfig::new(
            self.metabolites.iter().map(|m| m.name.clone()).collect(),
            self.reactions.iter().map(|r| r.name.clone()).collect(),
            self.metabolites.iter().map(|m| m.formation_energy).collect(),
            self.metabolites.iter().map(|m| m.initial_concentration).collect(),
            stoichiometry,
            ou_ranges,
        )
    }
}

// =============================================================================
// RUN CONFIGURATION
// =============================================================================

/// The three metabolites × reactions matrices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stoichiometry {
    /// Signed coefficients, used for energetics
    pub full: Array2<f64>,
    /// Coefficients of species that gate kinetics
    pub limiting: Array2<f64>,
    /// Coefficients that change concentrations
    pub non_constant: Array2<f64>,
}

impl Stoichiometry {
    pub fn n_metabolites(&self) -> usize {
        self.full.nrows()
    }

    pub fn n_reactions(&self) -> usize {
        self.full.ncols()
    }
}

/// Per-reaction `(min, max)` rows for OU calibration (N × 2 each)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuRanges {
    /// Typical rate (µM/day)
    pub rates: Array2<f64>,
    /// Typical decay (1/day)
    pub decays: Array2<f64>,
    /// Typical relative standard deviation
    pub stds: Array2<f64>,
}

impl OuRanges {
    /// Every table is `n_reactions × 2`, finite, with `0 <= min <= max`;
    /// decay minima are strictly positive (they are sampled in log10).
    pub fn validate(&self, n_reactions: usize) -> Result<()> {
        for (label, ranges) in [
            ("rate ranges", &self.rates),
            ("decay ranges", &self.decays),
            ("std ranges", &self.stds),
        ] {
            if ranges.dim() != (n_reactions, 2) {
                return Err(DeadEndError::Configuration(format!(
                    "{label} is {:?}, expected ({n_reactions}, 2)",
                    ranges.dim()
                )));
            }
            for (j, row) in ranges.outer_iter().enumerate() {
                let (lo, hi) = (row[0], row[1]);
                if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || lo > hi {
                    return Err(DeadEndError::Configuration(format!(
                        "{label} for reaction {j} must satisfy 0 <= min <= max, got ({lo}, {hi})"
                    )));
                }
            }
        }
        if let Some(j) = self.decays.outer_iter().position(|row| row[0] <= 0.0) {
            return Err(DeadEndError::Configuration(format!(
                "decay range for reaction {j} must be strictly positive"
            )));
        }
        Ok(())
    }
}

/// Validated, immutable network configuration shared read-only by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub metabolite_names: Vec<String>,
    pub reaction_names: Vec<String>,
    /// ΔGf0 per metabolite (kJ/mol)
    pub formation_energies: Array1<f64>,
    /// Initial composition (µM)
    pub initial_composition: Array1<f64>,
    pub stoichiometry: Stoichiometry,
    pub ou_ranges: OuRanges,
}

impl NetworkConfig {
    pub fn new(
        metabolite_names: Vec<String>,
        reaction_names: Vec<String>,
        formation_energies: Array1<f64>,
        initial_composition: Array1<f64>,
        stoichiometry: Stoichiometry,
        ou_ranges: OuRanges,
    ) -> Result<Self> {
        let config = Self {
            metabolite_names,
            reaction_names,
            formation_energies,
            initial_composition,
            stoichiometry,
            ou_ranges,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn n_metabolites(&self) -> usize {
        self.metabolite_names.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reaction_names.len()
    }

    pub fn metabolite_index(&self, name: &str) -> Option<usize> {
        self.metabolite_names.iter().position(|m| m == name)
    }

    pub fn reaction_index(&self, name: &str) -> Option<usize> {
        self.reaction_names.iter().position(|r| r == name)
    }

    /// Copy of this configuration with one initial concentration replaced
    pub fn with_initial_concentration(
        &self,
        metabolite: usize,
        value: Concentration,
    ) -> Result<Self> {
        let mut config = self.clone();
        let slot = config.initial_composition.get_mut(metabolite).ok_or_else(|| {
            DeadEndError::Configuration(format!("metabolite index {metabolite} out of range"))
        })?;
        *slot = value;
        config.validate()?;
        Ok(config)
    }

    /// Check every dimension and value constraint
    pub fn validate(&self) -> Result<()> {
        let m = self.n_metabolites();
        let n = self.n_reactions();

        ensure_len("formation energies", self.formation_energies.len(), m)?;
        ensure_len("initial composition", self.initial_composition.len(), m)?;

        let s = &self.stoichiometry;
        for (label, mat) in [
            ("full stoichiometry", &s.full),
            ("limiting stoichiometry", &s.limiting),
            ("non-constant stoichiometry", &s.non_constant),
        ] {
            if mat.dim() != (m, n) {
                return Err(DeadEndError::Configuration(format!(
                    "{label} is {:?}, expected ({m}, {n})",
                    mat.dim()
                )));
            }
        }

        self.ou_ranges.validate(n)?;

        if let Some(i) = self
            .initial_composition
            .iter()
            .position(|&c| !(c > 0.0 && c.is_finite()))
        {
            return Err(DeadEndError::Configuration(format!(
                "initial concentration of '{}' must be strictly positive, got {}",
                self.metabolite_names[i], self.initial_composition[i]
            )));
        }
        if let Some(i) = self.formation_energies.iter().position(|g| !g.is_finite()) {
            return Err(DeadEndError::Configuration(format!(
                "formation energy of '{}' is not finite",
                self.metabolite_names[i]
            )));
        }

        Ok(())
    }
}

// =============================================================================
// STANDARD NETWORKS
// =============================================================================

pub mod networks {
    use super::*;

    /// Aerobic respiration, nitrification and sulfide oxidation in an
    /// anoxic basin. Energies from CHNOSZ, concentrations typical of the
    /// Cariaco basin.
    pub fn anoxic_basin() -> NetworkModel {
        let mut model = NetworkModel::new();

        model.add_metabolite(Metabolite::new("O2", 16.5435, 20.0));
        model.add_metabolite(Metabolite::new("H2O", 0.0, 5.5e7));
        model.add_metabolite(Metabolite::new("H+", 0.0, 2.399e-2));
        model.add_metabolite(Metabolite::new("NH4+", -79.4542, 25.0));
        model.add_metabolite(Metabolite::new("NO2-", -32.2168, 0.1));
        model.add_metabolite(Metabolite::new("NO3-", -110.905, 10.0));
        model.add_metabolite(Metabolite::new("H2S", -27.9198, 50.0));
        model.add_metabolite(Metabolite::new("SO4-2", -744.459, 2.8e4));

        // aerobic ammonium oxidation: NH4+ + 1.5 O2 -> NO2- + H2O + 2 H+
        model.add_reaction(
            Reaction::new("amoA")
                .reactant(SpeciesReference::new("NH4+", 1.0))
                .reactant(SpeciesReference::new("O2", 1.5))
                .product(SpeciesReference::new("NO2-", 1.0))
                .product(SpeciesReference::new("H2O", 1.0).constant())
                .product(SpeciesReference::new("H+", 2.0).constant()),
        );

        // aerobic nitrite oxidation: NO2- + 0.5 O2 -> NO3-
        model.add_reaction(
            Reaction::new("nxr")
                .reactant(SpeciesReference::new("NO2-", 1.0))
                .reactant(SpeciesReference::new("O2", 0.5))
                .product(SpeciesReference::new("NO3-", 1.0)),
        );

        // aerobic sulfide oxidation: H2S + 2 O2 -> SO4-2 + 2 H+
        model.add_reaction(
            Reaction::new("asos")
                .reactant(SpeciesReference::new("H2S", 1.0))
                .reactant(SpeciesReference::new("O2", 2.0))
                .product(SpeciesReference::new("SO4-2", 1.0))
                .product(SpeciesReference::new("H+", 2.0).constant()),
        );

        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged_model() -> NetworkModel {
        let mut model = NetworkModel::new();
        model.add_metabolite(Metabolite::new("A", -10.0, 5.0));
        model.add_metabolite(Metabolite::new("B", -20.0, 5.0));
        model.add_metabolite(Metabolite::new("W", 0.0, 100.0));
        model.add_metabolite(Metabolite::new("P", -30.0, 1.0));
        model.add_reaction(
            Reaction::new("r1")
                .reactant(SpeciesReference::new("A", 1.0))
                .reactant(SpeciesReference::new("W", 2.0).non_limiting())
                .reactant(SpeciesReference::new("B", 1.0).constant())
                .product(SpeciesReference::new("P", 3.0)),
        );
        model
    }

    #[test]
    fn test_create_network() {
        let model = networks::anoxic_basin();
        assert_eq!(model.metabolites.len(), 8);
        assert_eq!(model.reactions.len(), 3);
        assert!(model.get_metabolite("SO4-2").is_some());
        let config = model.build().unwrap();
        assert_eq!(config.stoichiometry.n_metabolites(), 8);
        assert_eq!(config.stoichiometry.n_reactions(), 3);
    }

    #[test]
    fn test_stoichiometry_flags() {
        let s = flagged_model().stoichiometry().unwrap();

        // full keeps every signed coefficient
        assert_eq!(s.full.column(0).to_vec(), vec![-1.0, -1.0, -2.0, 3.0]);
        // NL consumed species neither limits nor changes
        assert_eq!(s.limiting[[2, 0]], 0.0);
        assert_eq!(s.non_constant[[2, 0]], 0.0);
        // CONST species still limits but does not change
        assert_eq!(s.limiting[[1, 0]], -1.0);
        assert_eq!(s.non_constant[[1, 0]], 0.0);
        // plain species everywhere
        assert_eq!(s.limiting[[0, 0]], -1.0);
        assert_eq!(s.non_constant[[0, 0]], -1.0);
        assert_eq!(s.non_constant[[3, 0]], 3.0);
    }

    #[test]
    fn test_unknown_metabolite_is_configuration_error() {
        let mut model = flagged_model();
        model.add_reaction(Reaction::new("r2").reactant(SpeciesReference::new("Z", 1.0)));
        let err = model.build().unwrap_err();
        assert!(matches!(err, DeadEndError::Configuration(_)));
        assert!(err.to_string().contains("'Z'"));
    }

    #[test]
    fn test_duplicate_species_rejected() {
        let mut model = flagged_model();
        model.add_reaction(
            Reaction::new("r2")
                .reactant(SpeciesReference::new("A", 1.0))
                .product(SpeciesReference::new("A", 1.0)),
        );
        assert!(model.stoichiometry().is_err());
    }

    #[test]
    fn test_non_positive_initial_concentration_rejected() {
        let mut model = flagged_model();
        model.metabolites[0].initial_concentration = 0.0;
        assert!(model.build().is_err());
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let config = flagged_model().build().unwrap();
        let result = NetworkConfig::new(
            config.metabolite_names.clone(),
            config.reaction_names.clone(),
            Array1::zeros(2),
            config.initial_composition.clone(),
            config.stoichiometry.clone(),
            config.ou_ranges.clone(),
        );
        assert!(matches!(result, Err(DeadEndError::Configuration(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut model = flagged_model();
        model.reactions[0].rate_range = (5.0, 1.0);
        assert!(model.build().is_err());
    }

    #[test]
    fn test_with_initial_concentration() {
        let config = flagged_model().build().unwrap();
        let varied = config.with_initial_concentration(3, 42.0).unwrap();
        assert_eq!(varied.initial_composition[3], 42.0);
        assert_eq!(config.initial_composition[3], 1.0);
        assert!(config.with_initial_concentration(9, 1.0).is_err());
        assert!(config.with_initial_concentration(0, -1.0).is_err());
    }
}
