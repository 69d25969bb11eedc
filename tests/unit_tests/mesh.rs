use crate::{kuhn_cube_mesh, unit_square_mesh};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::mesh::{MeshError, MeshTopology, Sign, SimplexTopology, TriangleMesh};
use nalgebra::{DMatrix, Point2};

#[test]
fn unit_square_topology_satisfies_euler_formula() {
    let mesh = unit_square_mesh(2);
    assert_eq!(mesh.number_of_nodes(), 9);
    assert_eq!(mesh.number_of_cells(), 8);
    assert_eq!(mesh.number_of_edges(), 16);
    assert_eq!(mesh.number_of_faces(), 0);

    let boundary_edges = (0..mesh.number_of_edges())
        .filter(|&e| mesh.edge_to_cell(e).is_boundary())
        .count();
    assert_eq!(boundary_edges, 8);
}

#[test]
fn kuhn_cube_topology_satisfies_euler_formula() {
    let mesh = kuhn_cube_mesh();
    assert_eq!(mesh.number_of_nodes(), 8);
    assert_eq!(mesh.number_of_cells(), 6);
    // 12 cube edges, 6 face diagonals and the main diagonal
    assert_eq!(mesh.number_of_edges(), 19);
    assert_eq!(mesh.number_of_faces(), 18);

    let total_volume: f64 = (0..6).map(|c| mesh.cell_measure(c)).sum();
    assert_scalar_eq!(total_volume, 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn interior_edges_have_opposite_signs_in_their_cells() {
    let mesh = unit_square_mesh(2);
    for edge in 0..mesh.number_of_edges() {
        let cells = mesh.edge_to_cell(edge);
        assert_eq!(mesh.cell_to_edge(cells.left)[cells.left_local], edge);
        assert_eq!(mesh.cell_edge_signs(cells.left)[cells.left_local], Sign::Positive);
        if !cells.is_boundary() {
            assert_eq!(mesh.cell_to_edge(cells.right)[cells.right_local], edge);
            assert_eq!(mesh.cell_edge_signs(cells.right)[cells.right_local], Sign::Negative);
        }
    }
}

#[test]
fn clockwise_cells_are_reoriented() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)];
    let mesh = TriangleMesh::from_vertices_and_cells(vertices, [[0, 1, 2]]).unwrap();
    assert_eq!(mesh.cell_nodes(0), &[0, 2, 1]);

    let jacobian = DMatrix::from_fn(2, 2, |i, k| {
        let nodes = mesh.cell_nodes(0);
        mesh.node_coords(nodes[k + 1])[i] - mesh.node_coords(nodes[0])[i]
    });
    assert!(jacobian.determinant() > 0.0);
    assert_scalar_eq!(mesh.cell_measure(0), 0.5, comp = abs, tol = 1e-15);
}

#[test]
fn barycentric_gradients_are_dual_to_cell_edges() {
    let mesh = kuhn_cube_mesh();
    for cell in 0..mesh.number_of_cells() {
        let grad_lambda = mesh.grad_lambda(cell).unwrap();
        let nodes = mesh.cell_nodes(cell);
        let x0 = mesh.node_coords(nodes[0]);
        for j in 1..4 {
            let edge = mesh.node_coords(nodes[j]) - &x0;
            for i in 0..4 {
                let expected = if i == j {
                    1.0
                } else if i == 0 {
                    -1.0
                } else {
                    0.0
                };
                assert_scalar_eq!(grad_lambda.row(i).transpose().dot(&edge), expected, comp = abs, tol = 1e-12);
            }
        }
        let sum = grad_lambda.row_sum();
        assert_matrix_eq!(sum, DMatrix::zeros(1, 3), comp = abs, tol = 1e-12);
    }
}

#[test]
fn face_normals_are_orthogonal_to_face_edges() {
    let mesh = kuhn_cube_mesh();
    for face in 0..mesh.number_of_faces() {
        let normal = mesh.face_unit_normal(face);
        assert_scalar_eq!(normal.norm(), 1.0, comp = abs, tol = 1e-14);
        for edge in mesh.face_to_edge(face) {
            let tangent = mesh.edge_unit_tangent(edge);
            assert_scalar_eq!(normal.dot(&tangent), 0.0, comp = abs, tol = 1e-14);
            let [a, b] = mesh.edge_nodes(edge);
            let face_nodes = mesh.face_nodes(face);
            assert!(face_nodes.contains(&a) && face_nodes.contains(&b));
        }
    }
}

#[test]
fn barycentric_points_map_to_vertex_combinations() {
    let mesh = unit_square_mesh(1);
    let nodes = mesh.cell_nodes(1).to_vec();
    let x = mesh.bary_to_physical(1, &[0.2, 0.3, 0.5]);
    let expected =
        mesh.node_coords(nodes[0]) * 0.2 + mesh.node_coords(nodes[1]) * 0.3 + mesh.node_coords(nodes[2]) * 0.5;
    assert_matrix_eq!(x, expected, comp = abs, tol = 1e-15);
}

#[test]
fn invalid_cells_are_rejected() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
    assert_eq!(
        TriangleMesh::from_vertices_and_cells(vertices.clone(), [[0, 1, 2]]),
        Err(MeshError::DegenerateCell { cell: 0 })
    );
    assert_eq!(
        TriangleMesh::from_vertices_and_cells(vertices.clone(), [vec![0, 1]]),
        Err(MeshError::WrongCellSize {
            cell: 0,
            expected: 3,
            found: 2
        })
    );
    assert_eq!(
        TriangleMesh::from_vertices_and_cells(vertices, [[0, 1, 5]]),
        Err(MeshError::VertexOutOfBounds {
            cell: 0,
            vertex: 5,
            num_vertices: 3
        })
    );
}

#[test]
fn edges_shared_by_three_triangles_are_rejected() {
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(0.5, 1.0),
        Point2::new(0.5, -1.0),
        Point2::new(0.5, 2.0),
    ];
    let result = TriangleMesh::from_vertices_and_cells(vertices, [[0, 1, 2], [0, 1, 3], [0, 1, 4]]);
    assert_eq!(result, Err(MeshError::NonManifoldEdge { edge: [0, 1] }));
}

#[test]
fn topology_serializes_to_json() {
    let mesh = unit_square_mesh(1);
    let json = serde_json::to_string(mesh.topology()).unwrap();
    let topology: SimplexTopology = serde_json::from_str(&json).unwrap();
    assert_eq!(&topology, mesh.topology());
    assert_eq!(topology.cell_edges(1), mesh.cell_to_edge(1));
}
