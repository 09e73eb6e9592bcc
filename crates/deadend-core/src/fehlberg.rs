//! Embedded Runge-Kutta-Fehlberg 4(5) step.
//!
//! One call evaluates the six Fehlberg stages and returns the 5th order
//! increment together with the Euclidean distance between the 4th and
//! 5th order increments. Step-size control is left to the caller.
//!
//! Reference: Cheney & Kincaid, Numerical Mathematics and Computing,
//! 6th ed. (2008), pp. 450-453.

use crate::{OdeSystem, StateVector, Time};

/// Result of a single embedded step
#[derive(Debug, Clone)]
pub struct FehlbergStep {
    /// 5th order increment (`y_next = y + increment`)
    pub increment: StateVector,
    /// ‖increment₅ − increment₄‖₂
    pub error: f64,
}

/// Take one RKF45 step of size `h` from `(t, y)`.
pub fn rkf45_step<S: OdeSystem + ?Sized>(
    system: &S,
    t: Time,
    h: f64,
    y: &StateVector,
) -> FehlbergStep {
    let k1 = system.derivatives(t, y) * h;

    let y2 = y + &(&k1 * 0.25);
    let k2 = system.derivatives(t + 0.25 * h, &y2) * h;

    let y3 = y + &(&k1 * (3.0 / 32.0)) + &(&k2 * (9.0 / 32.0));
    let k3 = system.derivatives(t + 0.375 * h, &y3) * h;

    let y4 = y + &(&k1 * (1932.0 / 2197.0)) - &(&k2 * (7200.0 / 2197.0))
        + &(&k3 * (7296.0 / 2197.0));
    let k4 = system.derivatives(t + 12.0 / 13.0 * h, &y4) * h;

    let y5 = y + &(&k1 * (439.0 / 216.0)) - &(&k2 * 8.0) + &(&k3 * (3680.0 / 513.0))
        - &(&k4 * (845.0 / 4104.0));
    let k5 = system.derivatives(t + h, &y5) * h;

    let y6 = y - &(&k1 * (8.0 / 27.0)) + &(&k2 * 2.0) - &(&k3 * (3544.0 / 2565.0))
        + &(&k4 * (1859.0 / 4104.0))
        - &(&k5 * (11.0 / 40.0));
    let k6 = system.derivatives(t + 0.5 * h, &y6) * h;

    let order4 = &k1 * (25.0 / 216.0) + &(&k3 * (1408.0 / 2565.0)) + &(&k4 * (2197.0 / 4104.0))
        - &(&k5 * 0.2);
    let order5 = &k1 * (16.0 / 135.0)
        + &(&k3 * (6656.0 / 12825.0))
        + &(&k4 * (28561.0 / 56430.0))
        - &(&k5 * (9.0 / 50.0))
        + &(&k6 * (2.0 / 55.0));

    let error = (&order5 - &order4).mapv(|d| d * d).sum().sqrt();

    FehlbergStep {
        increment: order5,
        error,
    }
}
