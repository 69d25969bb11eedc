//! Finite element spaces on simplicial meshes.
//!
//! The scalar [`LagrangeSpace`] provides the DOF layout and basis on which the
//! symmetric-tensor [`HuZhangSpace`] is built. The H(div) and H(curl) elements of
//! [`VectorSpace`] are defined directly in terms of barycentric coordinates.
use crate::mesh::MeshError;
use crate::table::ValueTable;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

mod dof_map;
mod frames;
mod hu_zhang;
mod lagrange;
mod vector;

pub use dof_map::{DofCounts, TensorDofMap};
pub use frames::{tensor_dimension, SymmetricBasis, TensorFrame, TensorFrames};
pub use hu_zhang::HuZhangSpace;
pub use lagrange::LagrangeSpace;
pub use vector::{VectorElement, VectorFamily, VectorSpace};

/// Errors raised by the construction or evaluation of function spaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SpaceError {
    #[error("{space} spaces are not available in {dim} dimensions")]
    UnsupportedDimension { space: &'static str, dim: usize },
    #[error("{space} spaces do not support polynomial degree {degree}")]
    UnsupportedDegree { space: &'static str, degree: usize },
    #[error("the {family:?} family has no element of degree {degree}")]
    UnsupportedElement { family: VectorFamily, degree: usize },
    #[error("the scalar space is {found}-dimensional, but the mesh is {expected}-dimensional")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("expected points with {expected} barycentric coordinates, but got {found}")]
    PointDimensionMismatch { expected: usize, found: usize },
    #[error("cell index {cell} is out of bounds for a mesh with {num_cells} cells")]
    CellOutOfBounds { cell: usize, num_cells: usize },
    #[error("the DOF vector has length {found}, but the space has {expected} DOFs")]
    DofVectorLength { expected: usize, found: usize },
    #[error("the field has shape {found:?}, but {expected:?} was expected")]
    FieldShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("the tensor frame of face {face} is singular")]
    DegenerateFrame { face: usize },
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Inconsistencies between a mesh, a scalar space and the spaces built on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InvariantViolation {
    #[error("classification masks have length {found}, but the scalar space has {expected} local DOFs")]
    ClassificationLength { expected: usize, found: usize },
    #[error("local DOF {local_dof} is classified {count} times, expected exactly once")]
    ClassificationOverlap { local_dof: usize, count: usize },
    #[error("local {entity} {local_entity} carries {found} interior DOFs, expected {expected}")]
    EntityDofCount {
        entity: &'static str,
        local_entity: usize,
        expected: usize,
        found: usize,
    },
    #[error("scalar DOF {dof} of cell {cell} lies outside the global range of {category} DOFs")]
    ScalarDofOutOfRange {
        cell: usize,
        dof: usize,
        category: &'static str,
    },
    #[error("only {used} of {expected} global DOFs are referenced by the DOF map")]
    IncompleteDofMap { expected: usize, used: usize },
    #[error("global DOF {dof} received disagreeing values during interpolation")]
    InconsistentSharedDof { dof: usize },
    #[error("the topology of cell {cell} is inconsistent with its nodes")]
    InconsistentTopology { cell: usize },
}

/// Boolean masks classifying the local DOFs of a scalar element.
///
/// `edge[l]` flags the DOFs in the interior of local edge `l`, and `face[l]` those in the
/// interior of local face `l`. Together with `node` and `cell` the masks must partition the
/// local DOFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofClassification {
    pub node: Vec<bool>,
    pub edge: Vec<Vec<bool>>,
    pub face: Vec<Vec<bool>>,
    pub cell: Vec<bool>,
}

/// The category of a local scalar DOF, with its offset among the cell's DOFs of that category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalDofKind {
    Node { offset: usize },
    Edge { local_edge: usize, offset: usize },
    Face { local_face: usize, offset: usize },
    Cell { offset: usize },
}

impl DofClassification {
    /// Converts the masks into one [`LocalDofKind`] per local DOF.
    ///
    /// Fails if the masks do not partition the local DOFs.
    pub fn to_kinds(&self) -> Result<Vec<LocalDofKind>, InvariantViolation> {
        let ldof = self.node.len();
        let mut masks = self.edge.iter().chain(&self.face).chain([&self.cell]);
        if let Some(mask) = masks.find(|mask| mask.len() != ldof) {
            return Err(InvariantViolation::ClassificationLength {
                expected: ldof,
                found: mask.len(),
            });
        }

        let (mut nodes, mut edges, mut faces, mut cells) = (0, 0, 0, 0);
        let mut kinds = Vec::with_capacity(ldof);
        for i in 0..ldof {
            let mut candidates = Vec::new();
            if self.node[i] {
                candidates.push(LocalDofKind::Node { offset: nodes });
            }
            for (local_edge, mask) in self.edge.iter().enumerate() {
                if mask[i] {
                    candidates.push(LocalDofKind::Edge { local_edge, offset: edges });
                }
            }
            for (local_face, mask) in self.face.iter().enumerate() {
                if mask[i] {
                    candidates.push(LocalDofKind::Face { local_face, offset: faces });
                }
            }
            if self.cell[i] {
                candidates.push(LocalDofKind::Cell { offset: cells });
            }

            match candidates.as_slice() {
                [kind] => {
                    match kind {
                        LocalDofKind::Node { .. } => nodes += 1,
                        LocalDofKind::Edge { .. } => edges += 1,
                        LocalDofKind::Face { .. } => faces += 1,
                        LocalDofKind::Cell { .. } => cells += 1,
                    }
                    kinds.push(*kind);
                }
                _ => {
                    return Err(InvariantViolation::ClassificationOverlap {
                        local_dof: i,
                        count: candidates.len(),
                    })
                }
            }
        }
        Ok(kinds)
    }
}

/// A scalar finite element space with DOFs attached to mesh entities.
///
/// Global DOFs must be numbered in consecutive ranges: all node DOFs (one per node, in node
/// order), then edge DOFs, face DOFs and finally cell-interior DOFs.
pub trait ScalarElementSpace<T: Real> {
    fn geometric_dim(&self) -> usize;

    fn degree(&self) -> usize;

    fn number_of_local_dofs(&self) -> usize;

    fn number_of_global_dofs(&self) -> usize;

    /// The global DOFs of a cell, in local DOF order.
    fn cell_dofs(&self, cell: usize) -> &[usize];

    fn dof_classification(&self) -> DofClassification;

    /// Physical coordinates of the interpolation point of each global DOF.
    fn interpolation_points(&self) -> &[DVector<T>];

    /// Basis values at barycentric points, one row per point and one column per local DOF.
    fn basis(&self, points: &DMatrix<T>) -> Result<DMatrix<T>, SpaceError>;

    /// Physical gradients of the basis, shaped `(points, cells, local DOFs, dim)`.
    fn grad_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError>;
}

/// Resolves an optional cell subset into explicit cell indices.
pub(crate) fn select_cells(cells: Option<&[usize]>, num_cells: usize) -> Result<Vec<usize>, SpaceError> {
    match cells {
        None => Ok((0..num_cells).collect()),
        Some(cells) => {
            if let Some(&cell) = cells.iter().find(|&&c| c >= num_cells) {
                Err(SpaceError::CellOutOfBounds { cell, num_cells })
            } else {
                Ok(cells.to_vec())
            }
        }
    }
}

/// Checks that points carry one barycentric coordinate per vertex of a `dim`-simplex.
pub(crate) fn check_points<T: Real>(points: &DMatrix<T>, dim: usize) -> Result<(), SpaceError> {
    if points.ncols() == dim + 1 {
        Ok(())
    } else {
        Err(SpaceError::PointDimensionMismatch {
            expected: dim + 1,
            found: points.ncols(),
        })
    }
}

pub(crate) fn check_dof_vector<T: Real>(uh: &DVector<T>, num_dofs: usize) -> Result<(), SpaceError> {
    if uh.len() == num_dofs {
        Ok(())
    } else {
        Err(SpaceError::DofVectorLength {
            expected: num_dofs,
            found: uh.len(),
        })
    }
}
