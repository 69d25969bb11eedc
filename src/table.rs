//! Dense tables of function values at quadrature points.
use crate::Real;
use nalgebra::{DMatrixView, DVectorView};
use rayon::prelude::*;

/// The shape of a single value stored in a [`ValueTable`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    /// A vector with the given number of components.
    Vector(usize),
    /// A square `d x d` matrix, stored in column-major order.
    Tensor(usize),
}

impl ValueShape {
    /// The number of scalars needed to store one value.
    pub fn size(&self) -> usize {
        match *self {
            ValueShape::Scalar => 1,
            ValueShape::Vector(n) => n,
            ValueShape::Tensor(d) => d * d,
        }
    }
}

/// Values of a collection of functions at quadrature points of a number of cells.
///
/// Conceptually an array of shape `(num_points, num_cells, num_functions, shape...)`,
/// stored contiguously with the point index varying slowest.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable<T> {
    num_points: usize,
    num_cells: usize,
    num_functions: usize,
    shape: ValueShape,
    data: Vec<T>,
}

impl<T: Real> ValueTable<T> {
    pub fn zeros(num_points: usize, num_cells: usize, num_functions: usize, shape: ValueShape) -> Self {
        Self {
            num_points,
            num_cells,
            num_functions,
            shape,
            data: vec![T::zero(); num_points * num_cells * num_functions * shape.size()],
        }
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn num_functions(&self) -> usize {
        self.num_functions
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn offset(&self, point: usize, cell: usize, function: usize) -> usize {
        assert!(point < self.num_points, "point index out of bounds");
        assert!(cell < self.num_cells, "cell index out of bounds");
        assert!(function < self.num_functions, "function index out of bounds");
        ((point * self.num_cells + cell) * self.num_functions + function) * self.shape.size()
    }

    /// The raw storage of the value of `function` at `point` in `cell`.
    ///
    /// # Panics
    ///
    /// Panics if any of the indices is out of bounds.
    pub fn entry(&self, point: usize, cell: usize, function: usize) -> &[T] {
        let offset = self.offset(point, cell, function);
        &self.data[offset..offset + self.shape.size()]
    }

    pub fn entry_mut(&mut self, point: usize, cell: usize, function: usize) -> &mut [T] {
        let offset = self.offset(point, cell, function);
        let size = self.shape.size();
        &mut self.data[offset..offset + size]
    }

    /// # Panics
    ///
    /// Panics if the table does not hold [`ValueShape::Scalar`] values.
    pub fn scalar(&self, point: usize, cell: usize, function: usize) -> T {
        assert_eq!(self.shape, ValueShape::Scalar, "table does not hold scalars");
        self.entry(point, cell, function)[0]
    }

    /// The value of `function` at `point` in `cell` as a column vector.
    ///
    /// # Panics
    ///
    /// Panics if the table does not hold [`ValueShape::Vector`] values.
    pub fn vector(&self, point: usize, cell: usize, function: usize) -> DVectorView<'_, T> {
        let ValueShape::Vector(n) = self.shape else {
            panic!("table does not hold vectors")
        };
        DVectorView::from_slice(self.entry(point, cell, function), n)
    }

    /// The value of `function` at `point` in `cell` as a square matrix.
    ///
    /// # Panics
    ///
    /// Panics if the table does not hold [`ValueShape::Tensor`] values.
    pub fn matrix(&self, point: usize, cell: usize, function: usize) -> DMatrixView<'_, T> {
        let ValueShape::Tensor(d) = self.shape else {
            panic!("table does not hold matrices")
        };
        DMatrixView::from_slice(self.entry(point, cell, function), d, d)
    }

    /// Fills the table in parallel, one quadrature point at a time.
    ///
    /// The closure receives the point index and the storage of all values at that point,
    /// laid out as `(num_cells, num_functions, shape...)`.
    pub(crate) fn par_fill_points<F>(&mut self, fill: F)
    where
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        let stride = self.num_cells * self.num_functions * self.shape.size();
        if stride == 0 {
            return;
        }
        self.data
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(point, values)| fill(point, values));
    }

    /// Contracts the functions of `basis` against per-cell coefficients.
    ///
    /// `coefficients(c, i)` is the coefficient of function `i` in cell `c`. The result has a
    /// single function per cell.
    pub(crate) fn contract<F>(&self, coefficients: F) -> Self
    where
        F: Fn(usize, usize) -> T + Sync + Send,
    {
        let size = self.shape.size();
        let (num_cells, num_functions) = (self.num_cells, self.num_functions);
        let mut result = Self::zeros(self.num_points, num_cells, 1, self.shape);
        let source = &self.data;
        result.par_fill_points(|point, values| {
            for (cell, value) in values.chunks_exact_mut(size).enumerate() {
                for function in 0..num_functions {
                    let coefficient = coefficients(cell, function);
                    let offset = ((point * num_cells + cell) * num_functions + function) * size;
                    for (v, &s) in value.iter_mut().zip(&source[offset..offset + size]) {
                        *v += coefficient * s;
                    }
                }
            }
        });
        result
    }
}
