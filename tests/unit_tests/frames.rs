use crate::{kuhn_cube_mesh, unit_square_mesh};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::mesh::{IncidentCells, MeshTopology, Sign, SimplexMesh, TetrahedronMesh};
use mixfem::space::{tensor_dimension, HuZhangSpace, SpaceError, SymmetricBasis, TensorFrame, TensorFrames};
use nalgebra::{DMatrix, DVector, Point1};

fn gram_matrix(frame: &TensorFrame<f64>, n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |k, l| frame.tensor(k).dot(frame.tensor(l)))
}

fn assert_biorthogonal(frame: &TensorFrame<f64>, n: usize) {
    let products = DMatrix::from_fn(n, n, |k, l| frame.dual(k).dot(frame.tensor(l)));
    assert_matrix_eq!(products, DMatrix::<f64>::identity(n, n), comp = abs, tol = 1e-12);
}

#[test]
fn canonical_coefficients_are_upper_entries() {
    let basis = SymmetricBasis::<f64>::new(3);
    assert_eq!(basis.pairs(), &[(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]);
    let s = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0]);
    let c = basis.coefficients(&s);
    assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_matrix_eq!(basis.tensor_from_coefficients(c.as_slice()), s, comp = abs, tol = 1e-15);
}

fn check_edge_frames<M: MeshTopology<f64>>(mesh: &M) {
    let frames = TensorFrames::new(mesh).unwrap();
    let n = tensor_dimension(mesh.geometric_dim());
    assert_eq!(frames.edge_frames().len(), mesh.number_of_edges());
    for edge in 0..mesh.number_of_edges() {
        let frame = frames.edge(edge);
        assert_matrix_eq!(gram_matrix(frame, n), DMatrix::<f64>::identity(n, n), comp = abs, tol = 1e-12);
        assert_biorthogonal(frame, n);
        let t = mesh.edge_unit_tangent(edge);
        assert_matrix_eq!(frame.tensor(0), &t * t.transpose(), comp = abs, tol = 1e-12);
        assert_eq!(frame.coefficients().shape(), (n, n));
    }
}

#[test]
fn edge_frames_are_orthonormal_and_start_with_tangential_tensor() {
    check_edge_frames(&unit_square_mesh(2));
    check_edge_frames(&kuhn_cube_mesh());
}

#[test]
fn face_frames_separate_in_plane_and_normal_components() {
    let cube = kuhn_cube_mesh();
    let frames = TensorFrames::new(&cube).unwrap();
    assert_eq!(frames.face_frames().len(), cube.number_of_faces());
    for face in 0..cube.number_of_faces() {
        let frame = frames.face(face);
        let normal = cube.face_unit_normal(face);
        assert_biorthogonal(frame, 6);

        // The in-plane tensors t t^T of the face edges have no normal part
        for (k, edge) in cube.face_to_edge(face).into_iter().enumerate() {
            let t = cube.edge_unit_tangent(edge);
            assert_matrix_eq!(frame.tensor(k), &t * t.transpose(), comp = abs, tol = 1e-12);
            assert_scalar_eq!((frame.tensor(k) * &normal).norm(), 0.0, comp = abs, tol = 1e-12);
        }
        assert_matrix_eq!(frame.tensor(3), &normal * normal.transpose(), comp = abs, tol = 1e-12);
        for k in 4..6 {
            // √2 sym(n ⊗ s) with s in the face plane
            let s = frame.tensor(k) * &normal * 2.0_f64.sqrt();
            assert_scalar_eq!(s.dot(&normal), 0.0, comp = abs, tol = 1e-12);
            assert_scalar_eq!(s.norm(), 1.0, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn frame_coordinates_reconstruct_symmetric_tensors() {
    let cube = kuhn_cube_mesh();
    let frames = TensorFrames::new(&cube).unwrap();
    let s = DMatrix::from_row_slice(3, 3, &[2.0, -1.0, 0.5, -1.0, 3.0, 1.5, 0.5, 1.5, -4.0]);
    for frame in frames.edge_frames().iter().chain(frames.face_frames()) {
        let c = frame.coordinates(&s);
        let reconstructed = (0..6).fold(DMatrix::zeros(3, 3), |acc, k| acc + frame.tensor(k) * c[k]);
        assert_matrix_eq!(reconstructed, s, comp = abs, tol = 1e-12);
    }
}

#[test]
fn frames_require_two_or_three_dimensions() {
    let vertices = vec![Point1::new(0.0), Point1::new(1.0)];
    let mesh = SimplexMesh::from_vertices_and_cells(vertices, [[0, 1]]).unwrap();
    assert_eq!(
        TensorFrames::new(&mesh).err(),
        Some(SpaceError::UnsupportedDimension {
            space: "tensor frame",
            dim: 1
        })
    );
}

/// A tetrahedral mesh whose edges all report the same unit tangent.
struct ParallelTangents<'a>(&'a TetrahedronMesh<f64>);

impl MeshTopology<f64> for ParallelTangents<'_> {
    fn geometric_dim(&self) -> usize {
        self.0.geometric_dim()
    }

    fn number_of_nodes(&self) -> usize {
        self.0.number_of_nodes()
    }

    fn number_of_edges(&self) -> usize {
        self.0.number_of_edges()
    }

    fn number_of_faces(&self) -> usize {
        self.0.number_of_faces()
    }

    fn number_of_cells(&self) -> usize {
        self.0.number_of_cells()
    }

    fn cell_nodes(&self, cell: usize) -> &[usize] {
        self.0.cell_nodes(cell)
    }

    fn cell_to_edge(&self, cell: usize) -> &[usize] {
        self.0.cell_to_edge(cell)
    }

    fn cell_edge_signs(&self, cell: usize) -> &[Sign] {
        self.0.cell_edge_signs(cell)
    }

    fn cell_to_face(&self, cell: usize) -> &[usize] {
        self.0.cell_to_face(cell)
    }

    fn edge_nodes(&self, edge: usize) -> [usize; 2] {
        self.0.edge_nodes(edge)
    }

    fn face_nodes(&self, face: usize) -> [usize; 3] {
        self.0.face_nodes(face)
    }

    fn edge_to_cell(&self, edge: usize) -> IncidentCells {
        self.0.edge_to_cell(edge)
    }

    fn face_to_edge(&self, face: usize) -> [usize; 3] {
        self.0.face_to_edge(face)
    }

    fn node_coords(&self, node: usize) -> DVector<f64> {
        self.0.node_coords(node)
    }

    fn edge_unit_tangent(&self, _edge: usize) -> DVector<f64> {
        DVector::from_column_slice(&[1.0, 0.0, 0.0])
    }
}

#[test]
fn faces_with_parallel_edge_tangents_are_degenerate() {
    let mesh = kuhn_cube_mesh();
    let degenerate = ParallelTangents(&mesh);
    // t t^T is the same tensor for all three edges of every face
    assert_eq!(TensorFrames::new(&degenerate).err(), Some(SpaceError::DegenerateFrame { face: 0 }));
    assert_eq!(
        HuZhangSpace::new(&degenerate, 1).err(),
        Some(SpaceError::DegenerateFrame { face: 0 })
    );
}
