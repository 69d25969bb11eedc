//! Global numbering of the DOFs of the symmetric-tensor space.
use crate::mesh::topology::{local_edges, local_faces};
use crate::mesh::MeshTopology;
use crate::space::{tensor_dimension, InvariantViolation, LocalDofKind, ScalarElementSpace, SpaceError};
use crate::Real;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of in-plane tensor components of a face DOF that are numbered per cell.
const FACE_CELL_COMPONENTS: usize = 3;

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Sizes of the blocks of the global DOF numbering, in numbering order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DofCounts {
    /// All components of node DOFs.
    pub node: usize,
    /// The components `1..tdim` of edge DOFs, shared by all cells containing the edge.
    pub shared_edge: usize,
    /// The normal components `3..6` of face DOFs, shared by both cells containing the face.
    pub shared_face: usize,
    /// All components of cell-interior DOFs.
    pub cell_interior: usize,
    /// The tangential-tangential component of edge DOFs, numbered per cell.
    pub cell_edge: usize,
    /// The in-plane components `0..3` of face DOFs, numbered per cell.
    pub cell_face: usize,
}

impl DofCounts {
    pub fn total(&self) -> usize {
        self.node + self.shared_edge + self.shared_face + self.cell_interior + self.cell_edge + self.cell_face
    }
}

/// The cell-to-global DOF map of the Hu-Zhang space.
///
/// Local DOF `i * tdim + k` of a cell is component `k` of scalar DOF `i`, where components refer
/// to the canonical symmetric basis for node and cell DOFs, and to the edge or face frame for
/// DOFs in the interior of an edge or face.
///
/// Global indices are allocated in the blocks of [`DofCounts`], in the order of its fields. The
/// tangential-tangential component of every edge DOF and the in-plane components of every face
/// DOF receive a fresh index in each cell, i.e. they are discontinuous across the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDofMap {
    tensor_dim: usize,
    local_kinds: Vec<LocalDofKind>,
    counts: DofCounts,
    cell_dofs: Vec<usize>,
}

impl TensorDofMap {
    /// Builds the DOF map from the layout of a scalar space of degree `p >= 1`.
    pub fn build<T, M, S>(mesh: &M, scalar: &S) -> Result<Self, SpaceError>
    where
        T: Real,
        M: MeshTopology<T> + ?Sized,
        S: ScalarElementSpace<T> + ?Sized,
    {
        let dim = mesh.geometric_dim();
        if !(2..=3).contains(&dim) {
            return Err(SpaceError::UnsupportedDimension { space: "Hu-Zhang", dim });
        }
        if scalar.geometric_dim() != dim {
            return Err(SpaceError::DimensionMismatch {
                expected: dim,
                found: scalar.geometric_dim(),
            });
        }
        let degree = scalar.degree();
        if degree == 0 {
            return Err(SpaceError::UnsupportedDegree { space: "Hu-Zhang", degree });
        }

        let tdim = tensor_dimension(dim);
        let local_kinds = scalar.dof_classification().to_kinds()?;
        let ldof = scalar.number_of_local_dofs();
        if local_kinds.len() != ldof {
            return Err(InvariantViolation::ClassificationLength {
                expected: ldof,
                found: local_kinds.len(),
            }
            .into());
        }

        let num_local_edges = local_edges(dim + 1).len();
        let num_local_faces = local_faces(dim + 1).len();
        let edge_dofs = degree - 1;
        let face_dofs = if dim == 3 { binomial(degree - 1, 2) } else { 0 };
        let interior_dofs = binomial(degree - 1, dim);
        check_entity_counts(&local_kinds, num_local_edges, num_local_faces, edge_dofs, face_dofs, interior_dofs)?;

        let (num_nodes, num_edges) = (mesh.number_of_nodes(), mesh.number_of_edges());
        let (num_faces, num_cells) = (mesh.number_of_faces(), mesh.number_of_cells());
        let edge_dofs_per_cell = num_local_edges * edge_dofs;
        let face_dofs_per_cell = num_local_faces * face_dofs;

        // Global ranges of the scalar DOFs of each category
        let scalar_nodes = 0..num_nodes;
        let scalar_edges = scalar_nodes.end..scalar_nodes.end + num_edges * edge_dofs;
        let scalar_faces = scalar_edges.end..scalar_edges.end + num_faces * face_dofs;
        let scalar_cells = scalar_faces.end..scalar_faces.end + num_cells * interior_dofs;

        let counts = DofCounts {
            node: tdim * num_nodes,
            shared_edge: (tdim - 1) * edge_dofs * num_edges,
            shared_face: (tdim - FACE_CELL_COMPONENTS) * face_dofs * num_faces,
            cell_interior: tdim * interior_dofs * num_cells,
            cell_edge: edge_dofs_per_cell * num_cells,
            cell_face: FACE_CELL_COMPONENTS * face_dofs_per_cell * num_cells,
        };
        if dim == 2 {
            debug_assert_eq!(counts.shared_face + counts.cell_face, 0);
        }
        let shared_edge_begin = counts.node;
        let shared_face_begin = shared_edge_begin + counts.shared_edge;
        let cell_interior_begin = shared_face_begin + counts.shared_face;
        let cell_edge_begin = cell_interior_begin + counts.cell_interior;
        let cell_face_begin = cell_edge_begin + counts.cell_edge;
        let num_global_dofs = counts.total();

        let mut cell_dofs = Vec::with_capacity(num_cells * ldof * tdim);
        for cell in 0..num_cells {
            let scalar_dofs = scalar.cell_dofs(cell);
            for (&kind, &dof) in local_kinds.iter().zip(scalar_dofs) {
                let relative = |range: &Range<usize>, category| {
                    if range.contains(&dof) {
                        Ok(dof - range.start)
                    } else {
                        Err(InvariantViolation::ScalarDofOutOfRange { cell, dof, category })
                    }
                };
                match kind {
                    LocalDofKind::Node { .. } => {
                        let r = relative(&scalar_nodes, "node")?;
                        cell_dofs.extend((0..tdim).map(|k| tdim * r + k));
                    }
                    LocalDofKind::Edge { offset, .. } => {
                        let r = relative(&scalar_edges, "edge")?;
                        cell_dofs.push(cell_edge_begin + cell * edge_dofs_per_cell + offset);
                        cell_dofs.extend((1..tdim).map(|k| shared_edge_begin + (tdim - 1) * r + (k - 1)));
                    }
                    LocalDofKind::Face { offset, .. } => {
                        let r = relative(&scalar_faces, "face")?;
                        let first = cell_face_begin + FACE_CELL_COMPONENTS * (cell * face_dofs_per_cell + offset);
                        cell_dofs.extend((0..FACE_CELL_COMPONENTS).map(|k| first + k));
                        cell_dofs.extend((FACE_CELL_COMPONENTS..tdim).map(|k| {
                            shared_face_begin + (tdim - FACE_CELL_COMPONENTS) * r + (k - FACE_CELL_COMPONENTS)
                        }));
                    }
                    LocalDofKind::Cell { .. } => {
                        let r = relative(&scalar_cells, "cell")?;
                        cell_dofs.extend((0..tdim).map(|k| cell_interior_begin + tdim * r + k));
                    }
                }
            }
        }

        let mut used = vec![false; num_global_dofs];
        for &dof in &cell_dofs {
            used[dof] = true;
        }
        let num_used = used.iter().filter(|&&u| u).count();
        if num_used != num_global_dofs {
            return Err(InvariantViolation::IncompleteDofMap {
                expected: num_global_dofs,
                used: num_used,
            }
            .into());
        }

        debug!(
            "Hu-Zhang DOF map of degree {} in {}D: {} global DOFs ({:?})",
            degree, dim, num_global_dofs, counts
        );

        Ok(Self {
            tensor_dim: tdim,
            local_kinds,
            counts,
            cell_dofs,
        })
    }

    pub fn tensor_dim(&self) -> usize {
        self.tensor_dim
    }

    /// The category of each local scalar DOF.
    pub fn local_kinds(&self) -> &[LocalDofKind] {
        &self.local_kinds
    }

    pub fn counts(&self) -> &DofCounts {
        &self.counts
    }

    pub fn number_of_local_dofs(&self) -> usize {
        self.local_kinds.len() * self.tensor_dim
    }

    pub fn number_of_global_dofs(&self) -> usize {
        self.counts.total()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cell_dofs.len() / self.number_of_local_dofs()
    }

    pub fn cell_dofs(&self, cell: usize) -> &[usize] {
        let n = self.number_of_local_dofs();
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    /// The DOF map as a flat array, one row of `number_of_local_dofs()` entries per cell.
    pub fn as_slice(&self) -> &[usize] {
        &self.cell_dofs
    }
}

fn check_entity_counts(
    kinds: &[LocalDofKind],
    num_local_edges: usize,
    num_local_faces: usize,
    edge_dofs: usize,
    face_dofs: usize,
    interior_dofs: usize,
) -> Result<(), InvariantViolation> {
    let mismatch = |entity, local_entity, expected, found| InvariantViolation::EntityDofCount {
        entity,
        local_entity,
        expected,
        found,
    };
    for l in 0..num_local_edges {
        let found = kinds
            .iter()
            .filter(|kind| matches!(kind, LocalDofKind::Edge { local_edge, .. } if *local_edge == l))
            .count();
        if found != edge_dofs {
            return Err(mismatch("edge", l, edge_dofs, found));
        }
    }
    for l in 0..num_local_faces {
        let found = kinds
            .iter()
            .filter(|kind| matches!(kind, LocalDofKind::Face { local_face, .. } if *local_face == l))
            .count();
        if found != face_dofs {
            return Err(mismatch("face", l, face_dofs, found));
        }
    }
    let found = kinds
        .iter()
        .filter(|kind| matches!(kind, LocalDofKind::Cell { .. }))
        .count();
    if found != interior_dofs {
        return Err(mismatch("cell", 0, interior_dofs, found));
    }
    Ok(())
}
