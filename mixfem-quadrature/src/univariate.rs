//! Gauss-Legendre rules on the unit segment, in barycentric form `(1 - s, s)`.

use crate::{Error, SegmentRule};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x` in `(-1, 1)`.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // n P_n(x) = (2n - 1) x P_{n - 1}(x) - (n - 1) P_{n - 2}(x)
    let (mut current, mut previous) = (1.0, 0.0);
    for m in 1..=n {
        let m = m as f64;
        let next = ((2.0 * m - 1.0) * x * current - (m - 1.0) * previous) / m;
        previous = current;
        current = next;
    }
    let derivative = n as f64 * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// The Gauss-Legendre rule with `num_points` points on the unit segment.
///
/// Integrates polynomials of degree `2 * num_points - 1` exactly. Weights sum to one.
pub fn gauss_legendre(num_points: usize) -> Result<SegmentRule, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::NoRuleAvailable);
    }

    let mut weights = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        // Root i of P_n on [-1, 1], starting from the Chebyshev-like estimate
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut iterations = 0;
        let dp = loop {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            iterations += 1;
            if dx.abs() <= 1e-15 || iterations == MAX_NEWTON_ITERATIONS {
                break legendre(n, x).1;
            }
        };
        // Map from [-1, 1] (total weight 2) to [0, 1] (total weight 1)
        let s = 0.5 * (1.0 - x);
        weights.push(1.0 / ((1.0 - x * x) * dp * dp));
        points.push([1.0 - s, s]);
    }

    Ok((weights, points))
}
