//! Quadrature rules for simplicial reference domains.
//!
//! All rules are expressed in *barycentric* coordinates: a rule for the `d`-simplex has points
//! with `d + 1` coordinates summing to one, and weights summing to one. An integral over a
//! physical simplex `K` is therefore approximated by `|K| * sum_q w_q f(x(λ_q))`.
//!
//! The crate has no dependencies and may be used independently of `mixfem`.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A point given by `N` barycentric coordinates.
pub type Barycentric<const N: usize> = [f64; N];

/// A rule with `N` barycentric coordinates per point, stored as `(weights, points)`.
pub type Rule<const N: usize> = (Vec<f64>, Vec<Barycentric<N>>);

/// A rule on the unit segment.
pub type SegmentRule = Rule<2>;

/// A rule on the reference triangle.
pub type TriangleRule = Rule<3>;

/// A rule on the reference tetrahedron.
pub type TetrahedronRule = Rule<4>;

/// Applies a rule to a function of the barycentric coordinates.
pub fn integrate<const N: usize>(rule: &Rule<N>, f: impl Fn(&Barycentric<N>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, point)| w * f(point))
        .sum()
}
