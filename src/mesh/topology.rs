//! Incidence relations between the cells, faces, edges and nodes of a simplicial mesh.
use crate::mesh::MeshError;
use crate::Real;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Local edges of a triangle. Edge `i` is opposite vertex `i`.
pub const TRIANGLE_EDGES: [[usize; 2]; 3] = [[1, 2], [2, 0], [0, 1]];

/// Local edges of a tetrahedron.
pub const TETRAHEDRON_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Local faces of a tetrahedron. Face `i` is opposite vertex `i` and has outward orientation.
pub const TETRAHEDRON_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

/// Orientation of a local entity relative to the orientation stored for the global entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn as_scalar<T: Real>(self) -> T {
        match self {
            Sign::Positive => T::one(),
            Sign::Negative => -T::one(),
        }
    }
}

/// The (at most two tracked) cells adjacent to an edge or face.
///
/// `left` is the first cell in which the entity occurs, and the one whose local vertex order
/// defines the stored orientation of the entity. `right` is the last cell in which it occurs,
/// and coincides with `left` on the boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCells {
    pub left: usize,
    pub right: usize,
    pub left_local: usize,
    pub right_local: usize,
}

impl IncidentCells {
    fn single(cell: usize, local: usize) -> Self {
        Self {
            left: cell,
            right: cell,
            left_local: local,
            right_local: local,
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.left == self.right
    }
}

/// Local edges of a simplex with the given number of vertices.
pub fn local_edges(nodes_per_cell: usize) -> Vec<[usize; 2]> {
    match nodes_per_cell {
        3 => TRIANGLE_EDGES.to_vec(),
        4 => TETRAHEDRON_EDGES.to_vec(),
        n => (0..n).tuple_combinations().map(|(a, b)| [a, b]).collect(),
    }
}

/// Local faces of a simplex with the given number of vertices.
///
/// Faces are only tracked for tetrahedra.
pub fn local_faces(nodes_per_cell: usize) -> Vec<[usize; 3]> {
    match nodes_per_cell {
        4 => TETRAHEDRON_FACES.to_vec(),
        _ => Vec::new(),
    }
}

fn sorted<const N: usize>(mut indices: [usize; N]) -> [usize; N] {
    indices.sort_unstable();
    indices
}

/// Edges, faces and their incidences for a list of simplicial cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplexTopology {
    nodes_per_cell: usize,
    local_edges: Vec<[usize; 2]>,
    local_faces: Vec<[usize; 3]>,
    edges: Vec<[usize; 2]>,
    faces: Vec<[usize; 3]>,
    cell_edges: Vec<usize>,
    cell_edge_signs: Vec<Sign>,
    cell_faces: Vec<usize>,
    edge_cells: Vec<IncidentCells>,
    face_cells: Vec<IncidentCells>,
    face_edges: Vec<[usize; 3]>,
}

impl SimplexTopology {
    /// Builds the topology from flat cell connectivity with `nodes_per_cell` vertices per cell.
    ///
    /// Global edges and faces are numbered in order of first occurrence and inherit the
    /// local vertex order of that occurrence.
    pub fn from_cells(cells: &[usize], nodes_per_cell: usize) -> Result<Self, MeshError> {
        let local_edges = local_edges(nodes_per_cell);
        let local_faces = local_faces(nodes_per_cell);
        // Edges of triangles bound cells, so more than two incident cells is not a manifold
        let max_cells_per_edge = if nodes_per_cell == 3 { 2 } else { usize::MAX };

        // Use BTreeMap to avoid non-determinism
        let mut edge_lookup = BTreeMap::new();
        let mut edges = Vec::new();
        let mut edge_cells = Vec::new();
        let mut edge_multiplicity = Vec::new();
        let mut cell_edges = Vec::with_capacity(cells.len() / nodes_per_cell.max(1) * local_edges.len());
        let mut cell_edge_signs = Vec::with_capacity(cell_edges.capacity());

        let mut face_lookup = BTreeMap::new();
        let mut faces = Vec::new();
        let mut face_cells = Vec::new();
        let mut face_multiplicity = Vec::new();
        let mut cell_faces = Vec::new();

        for (cell_index, cell) in cells.chunks_exact(nodes_per_cell).enumerate() {
            for (local_index, &[a, b]) in local_edges.iter().enumerate() {
                let edge = [cell[a], cell[b]];
                let edge_index = *edge_lookup.entry(sorted(edge)).or_insert_with(|| {
                    edges.push(edge);
                    edge_cells.push(IncidentCells::single(cell_index, local_index));
                    edge_multiplicity.push(0);
                    edges.len() - 1
                });

                edge_multiplicity[edge_index] += 1;
                if edge_multiplicity[edge_index] > max_cells_per_edge {
                    return Err(MeshError::NonManifoldEdge { edge: sorted(edge) });
                } else if edge_multiplicity[edge_index] > 1 {
                    edge_cells[edge_index].right = cell_index;
                    edge_cells[edge_index].right_local = local_index;
                }

                let sign = if edges[edge_index] == edge {
                    Sign::Positive
                } else {
                    Sign::Negative
                };
                cell_edges.push(edge_index);
                cell_edge_signs.push(sign);
            }

            for (local_index, &[a, b, c]) in local_faces.iter().enumerate() {
                let face = [cell[a], cell[b], cell[c]];
                let face_index = *face_lookup.entry(sorted(face)).or_insert_with(|| {
                    faces.push(face);
                    face_cells.push(IncidentCells::single(cell_index, local_index));
                    face_multiplicity.push(0);
                    faces.len() - 1
                });

                face_multiplicity[face_index] += 1;
                if face_multiplicity[face_index] > 2 {
                    return Err(MeshError::NonManifoldFace { face: sorted(face) });
                } else if face_multiplicity[face_index] > 1 {
                    face_cells[face_index].right = cell_index;
                    face_cells[face_index].right_local = local_index;
                }
                cell_faces.push(face_index);
            }
        }

        // Edge i of a face is opposite its vertex i, as for triangles
        let face_edges = faces
            .iter()
            .map(|face| TRIANGLE_EDGES.map(|[a, b]| edge_lookup[&sorted([face[a], face[b]])]))
            .collect();

        Ok(Self {
            nodes_per_cell,
            local_edges,
            local_faces,
            edges,
            faces,
            cell_edges,
            cell_edge_signs,
            cell_faces,
            edge_cells,
            face_cells,
            face_edges,
        })
    }

    pub fn nodes_per_cell(&self) -> usize {
        self.nodes_per_cell
    }

    pub fn local_edges(&self) -> &[[usize; 2]] {
        &self.local_edges
    }

    pub fn local_faces(&self) -> &[[usize; 3]] {
        &self.local_faces
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn cell_edges(&self, cell: usize) -> &[usize] {
        let n = self.local_edges.len();
        &self.cell_edges[n * cell..n * (cell + 1)]
    }

    pub fn cell_edge_signs(&self, cell: usize) -> &[Sign] {
        let n = self.local_edges.len();
        &self.cell_edge_signs[n * cell..n * (cell + 1)]
    }

    pub fn cell_faces(&self, cell: usize) -> &[usize] {
        let n = self.local_faces.len();
        &self.cell_faces[n * cell..n * (cell + 1)]
    }

    pub fn edge_cells(&self) -> &[IncidentCells] {
        &self.edge_cells
    }

    pub fn face_cells(&self) -> &[IncidentCells] {
        &self.face_cells
    }

    pub fn face_edges(&self) -> &[[usize; 3]] {
        &self.face_edges
    }
}
