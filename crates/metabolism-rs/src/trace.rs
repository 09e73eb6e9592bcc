//! Append-only record of an integration run.
//!
//! Channels are kept as parallel rows (struct of arrays). The integrator
//! appends while stepping; [`TraceRecorder::finish`] freezes the channels into
//! matrices once the run ends.

use deadend_core::Time;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Diagnostic message stamped with the simulation time it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMessage {
    /// `None` for run-level notes that have no clock position
    pub time: Option<Time>,
    pub text: String,
}

impl std::fmt::Display for TraceMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time {
            Some(t) => write!(f, "{t:.4}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// Growing trace, owned by the integrator during a run
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    time: Vec<Time>,
    composition: Vec<Array1<f64>>,
    delta_g: Vec<Array1<f64>>,
    stochastic: Vec<Array1<f64>>,
    flux: Vec<Array1<f64>>,
    messages: Vec<TraceMessage>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted step
    pub fn record(
        &mut self,
        t: Time,
        composition: &Array1<f64>,
        delta_g: &Array1<f64>,
        stochastic: &Array1<f64>,
        flux: &Array1<f64>,
    ) {
        self.time.push(t);
        self.composition.push(composition.clone());
        self.delta_g.push(delta_g.clone());
        self.stochastic.push(stochastic.clone());
        self.flux.push(flux.clone());
    }

    pub fn message(&mut self, t: Time, text: impl Into<String>) {
        self.messages.push(TraceMessage {
            time: Some(t),
            text: text.into(),
        });
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.messages.push(TraceMessage {
            time: None,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Freeze into fixed matrices (rows = accepted steps).
    ///
    /// `n_metabolites` and `n_reactions` give the column counts when no
    /// step was accepted.
    pub fn finish(self, n_metabolites: usize, n_reactions: usize) -> RunTrace {
        RunTrace {
            time: Array1::from(self.time),
            composition: stack_rows(&self.composition, n_metabolites),
            delta_g: stack_rows(&self.delta_g, n_reactions),
            stochastic: stack_rows(&self.stochastic, n_reactions),
            flux: stack_rows(&self.flux, n_metabolites),
            messages: self.messages,
        }
    }
}

fn stack_rows(rows: &[Array1<f64>], width: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), width), |(i, j)| rows[i][j])
}

/// Finished, read-only trace of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    time: Array1<f64>,
    composition: Array2<f64>,
    delta_g: Array2<f64>,
    stochastic: Array2<f64>,
    flux: Array2<f64>,
    messages: Vec<TraceMessage>,
}

impl RunTrace {
    /// Time of each accepted step (days)
    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    /// steps × metabolites (µM)
    pub fn composition(&self) -> &Array2<f64> {
        &self.composition
    }

    /// steps × reactions (kJ/mol)
    pub fn delta_g(&self) -> &Array2<f64> {
        &self.delta_g
    }

    /// steps × reactions
    pub fn stochastic(&self) -> &Array2<f64> {
        &self.stochastic
    }

    /// steps × metabolites, the accepted 5th order increment
    pub fn flux(&self) -> &Array2<f64> {
        &self.flux
    }

    pub fn messages(&self) -> &[TraceMessage] {
        &self.messages
    }

    /// Messages rendered as `time: text` lines
    pub fn message_lines(&self) -> Vec<String> {
        self.messages.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Last recorded composition; the dead-end state of a successful run
    pub fn final_composition(&self) -> Option<Array1<f64>> {
        let n = self.composition.len_of(Axis(0));
        (n > 0).then(|| self.composition.row(n - 1).to_owned())
    }
}
