//! Quadrature rules in barycentric coordinates.
use crate::Real;
use mixfem_quadrature::{simplex, univariate, Rule};
use nalgebra::{DMatrix, RowDVector};

/// Errors returned by quadrature methods.
pub use mixfem_quadrature::Error as QuadratureError;

/// A quadrature rule on a reference simplex.
///
/// Points are stored as the rows of a matrix of barycentric coordinates, in the layout accepted
/// by the basis evaluation routines of the function spaces. Weights sum to one, so integrals
/// over a physical cell must be scaled by the cell measure.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<T: Real> {
    weights: Vec<T>,
    points: DMatrix<T>,
}

impl<T: Real> QuadratureRule<T> {
    /// Creates a rule from weights and barycentric points (one point per row).
    ///
    /// # Panics
    ///
    /// Panics if the number of weights does not match the number of points.
    pub fn from_weights_and_points(weights: Vec<T>, points: DMatrix<T>) -> Self {
        assert_eq!(weights.len(), points.nrows(), "one weight per point required");
        Self { weights, points }
    }

    /// The Gauss-Legendre rule with `num_points` points on the unit segment.
    pub fn segment(num_points: usize) -> Result<Self, QuadratureError> {
        univariate::gauss_legendre(num_points).map(Self::from_rule)
    }

    /// The symmetric triangle rule with the given index (`1..=5`).
    pub fn triangle(index: usize) -> Result<Self, QuadratureError> {
        simplex::triangle(index).map(Self::from_rule)
    }

    /// The symmetric tetrahedron rule with the given index (`1..=3`).
    pub fn tetrahedron(index: usize) -> Result<Self, QuadratureError> {
        simplex::tetrahedron(index).map(Self::from_rule)
    }

    /// The rule with the given index for cells of the given geometric dimension.
    pub fn for_simplex(dim: usize, index: usize) -> Result<Self, QuadratureError> {
        match dim {
            1 => Self::segment(index),
            2 => Self::triangle(index),
            3 => Self::tetrahedron(index),
            _ => Err(QuadratureError::NoRuleAvailable),
        }
    }

    fn from_rule<const N: usize>((weights, points): Rule<N>) -> Self {
        let convert = |x: f64| T::from_f64(x).expect("Quadrature data must fit in T");
        Self {
            weights: weights.into_iter().map(convert).collect(),
            points: DMatrix::from_fn(points.len(), N, |q, j| convert(points[q][j])),
        }
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    pub fn points(&self) -> &DMatrix<T> {
        &self.points
    }

    pub fn point(&self, index: usize) -> RowDVector<T> {
        self.points.row(index).into_owned()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
