//! Mixed and vector-valued finite element spaces on simplicial meshes.
//!
//! The central types are [`HuZhangSpace`](space::HuZhangSpace), a symmetric-tensor space
//! for stress-like unknowns on triangles and tetrahedra, and
//! [`VectorSpace`](space::VectorSpace), which provides the lowest-order H(div) and H(curl)
//! elements on triangles. Both build on a scalar [`LagrangeSpace`](space::LagrangeSpace) over
//! a [`SimplexMesh`](mesh::SimplexMesh), and evaluate their bases at barycentric points into
//! [`ValueTable`](table::ValueTable)s.

use nalgebra::RealField;

pub mod error;
pub mod mesh;
pub mod quadrature;
pub mod space;
pub mod table;

pub extern crate nalgebra;

/// The scalar type used throughout the crate.
pub trait Real: RealField + Copy + Send + Sync {}

impl<T> Real for T where T: RealField + Copy + Send + Sync {}

/// Converts a count to the scalar type.
pub(crate) fn from_usize<T: Real>(n: usize) -> T {
    T::from_usize(n).expect("usize must fit in T")
}
