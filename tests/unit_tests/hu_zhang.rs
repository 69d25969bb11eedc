use crate::{barycentric_in_cell, irregular_dof_vector, kuhn_cube_mesh, reference_triangle_mesh, unit_square_mesh};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::mesh::{MeshTopology, SimplexMesh, TriangleMesh};
use mixfem::quadrature::QuadratureRule;
use mixfem::space::{
    DofClassification, HuZhangSpace, InvariantViolation, LagrangeSpace, LocalDofKind, ScalarElementSpace, SpaceError,
};
use mixfem::table::{ValueShape, ValueTable};
use nalgebra::{DMatrix, DVector, Point4};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn quadratic_field_2d(x: &DVector<f64>) -> DMatrix<f64> {
    let (x, y) = (x[0], x[1]);
    DMatrix::from_row_slice(2, 2, &[x * x + y, x * y - 1.0, x * y - 1.0, 1.0 - y * y + x])
}

fn quadratic_field_3d(x: &DVector<f64>) -> DMatrix<f64> {
    let (x, y, z) = (x[0], x[1], x[2]);
    DMatrix::from_row_slice(3, 3, &[x * x, y * z, 1.0, y * z, y + z, x * z, 1.0, x * z, z * z - x])
}

fn points_matrix(bary: &[f64]) -> DMatrix<f64> {
    DMatrix::from_row_slice(1, bary.len(), bary)
}

fn value_at(space: &HuZhangSpace<f64, impl MeshTopology<f64>>, uh: &DVector<f64>, cell: usize, bary: &[f64]) -> DMatrix<f64> {
    let table = space.value(uh, &points_matrix(bary), Some(&[cell])).unwrap();
    table.matrix(0, 0, 0).into_owned()
}

/// Checks that the interpolant of `u` reproduces it at the quadrature points of every cell.
fn assert_interpolation_is_exact<M: MeshTopology<f64>>(
    space: &HuZhangSpace<f64, M>,
    u: impl Fn(&DVector<f64>) -> DMatrix<f64>,
    rule: &QuadratureRule<f64>,
) {
    let mesh = space.mesh();
    let uh = space.interpolation(&u).unwrap();
    let values = space.value(&uh, rule.points(), None).unwrap();
    for cell in 0..mesh.number_of_cells() {
        for q in 0..rule.len() {
            let bary: Vec<_> = rule.points().row(q).iter().copied().collect();
            let x = mesh.bary_to_physical(cell, &bary);
            assert_matrix_eq!(values.matrix(q, cell, 0), u(&x), comp = abs, tol = 1e-9);
        }
    }
}

#[test]
fn single_linear_triangle_has_distinct_node_dofs() {
    let mesh = reference_triangle_mesh();
    let space = HuZhangSpace::new(&mesh, 1).unwrap();
    assert_eq!(space.number_of_global_dofs(), 9);
    assert_eq!(space.number_of_local_dofs(), 9);
    let mut dofs = space.cell_to_dof(0).to_vec();
    dofs.sort_unstable();
    assert_eq!(dofs, (0..9).collect::<Vec<_>>());
}

#[test]
fn quadratic_edge_dofs_share_only_normal_components() {
    let mesh = unit_square_mesh(1);
    let space = HuZhangSpace::new(&mesh, 2).unwrap();
    let counts = space.dof_counts();
    assert_eq!(counts.node, 12);
    assert_eq!(counts.shared_edge, 10);
    assert_eq!(counts.cell_interior, 0);
    assert_eq!(counts.cell_edge, 6);
    assert_eq!(counts.shared_face + counts.cell_face, 0);
    assert_eq!(space.number_of_global_dofs(), 28);

    let local_edge_dof = |l: usize| {
        space
            .dof_map()
            .local_kinds()
            .iter()
            .position(|kind| matches!(kind, LocalDofKind::Edge { local_edge, .. } if *local_edge == l))
            .unwrap()
    };
    let tensor_dofs = |cell: usize, l: usize| {
        let i = local_edge_dof(l);
        space.cell_to_dof(cell)[3 * i..3 * i + 3].to_vec()
    };

    let interior: Vec<_> = (0..mesh.number_of_edges())
        .filter(|&e| !mesh.edge_to_cell(e).is_boundary())
        .collect();
    assert_eq!(interior.len(), 1);
    let cells = mesh.edge_to_cell(interior[0]);
    let left = tensor_dofs(cells.left, cells.left_local);
    let right = tensor_dofs(cells.right, cells.right_local);
    assert_ne!(left[0], right[0]);
    assert_eq!(left[1..], right[1..]);
}

#[test]
fn local_dofs_are_tensor_multiples_of_scalar_dofs() {
    let square = unit_square_mesh(1);
    let cube = kuhn_cube_mesh();
    for p in 1..=3 {
        let space = HuZhangSpace::new(&square, p).unwrap();
        assert_eq!(space.number_of_local_dofs(), 3 * space.scalar_space().number_of_local_dofs());
        assert_eq!(space.dof_counts().total(), space.number_of_global_dofs());

        let space = HuZhangSpace::new(&cube, p).unwrap();
        assert_eq!(space.number_of_local_dofs(), 6 * space.scalar_space().number_of_local_dofs());
        assert_eq!(space.dof_map().number_of_cells(), 6);
    }
}

#[test]
fn every_global_dof_is_referenced() {
    let cube = kuhn_cube_mesh();
    let space = HuZhangSpace::new(&cube, 3).unwrap();
    let mut used = vec![false; space.number_of_global_dofs()];
    for cell in 0..cube.number_of_cells() {
        for &dof in space.cell_to_dof(cell) {
            used[dof] = true;
        }
    }
    assert!(used.into_iter().all(|u| u));
}

#[test]
fn basis_tables_have_expected_shapes() {
    let mesh = unit_square_mesh(2);
    let space = HuZhangSpace::new(&mesh, 2).unwrap();
    let rule = QuadratureRule::triangle(3).unwrap();
    let basis: ValueTable<f64> = space.basis(rule.points(), Some(&[0, 5])).unwrap();
    assert_eq!(basis.num_points(), rule.len());
    assert_eq!(basis.num_cells(), 2);
    assert_eq!(basis.num_functions(), 18);
    assert_eq!(basis.shape(), ValueShape::Tensor(2));

    let div = space.div_basis(rule.points(), None).unwrap();
    assert_eq!(div.num_cells(), 8);
    assert_eq!(div.shape(), ValueShape::Vector(2));

    // Every basis tensor is symmetric
    for q in 0..basis.num_points() {
        for i in 0..basis.num_functions() {
            let s = basis.matrix(q, 1, i);
            assert_scalar_eq!(s[(0, 1)], s[(1, 0)], comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn normal_traces_are_continuous_across_edges() {
    let mesh = unit_square_mesh(2);
    let space = HuZhangSpace::new(&mesh, 3).unwrap();
    let uh = irregular_dof_vector(space.number_of_global_dofs());
    for edge in 0..mesh.number_of_edges() {
        let cells = mesh.edge_to_cell(edge);
        if cells.is_boundary() {
            continue;
        }
        let [a, b] = mesh.edge_nodes(edge);
        let t = mesh.edge_unit_tangent(edge);
        let n = DVector::from_column_slice(&[t[1], -t[0]]);
        for s in [0.2, 0.5, 0.9] {
            let combination = [(a, s), (b, 1.0 - s)];
            let left = value_at(&space, &uh, cells.left, &barycentric_in_cell(&mesh, cells.left, &combination));
            let right = value_at(&space, &uh, cells.right, &barycentric_in_cell(&mesh, cells.right, &combination));
            assert_matrix_eq!(&left * &n, &right * &n, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn normal_traces_are_continuous_across_faces() {
    let mesh = kuhn_cube_mesh();
    let space = HuZhangSpace::new(&mesh, 3).unwrap();
    let uh = irregular_dof_vector(space.number_of_global_dofs());

    let mut face_cells: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for cell in 0..mesh.number_of_cells() {
        for &face in mesh.cell_to_face(cell) {
            face_cells.entry(face).or_default().push(cell);
        }
    }

    let mut num_interior = 0;
    for (&face, cells) in face_cells.iter().filter(|(_, cells)| cells.len() == 2) {
        num_interior += 1;
        let [a, b, c] = mesh.face_nodes(face);
        let n = mesh.face_unit_normal(face);
        let combination = [(a, 0.2), (b, 0.3), (c, 0.5)];
        let left = value_at(&space, &uh, cells[0], &barycentric_in_cell(&mesh, cells[0], &combination));
        let right = value_at(&space, &uh, cells[1], &barycentric_in_cell(&mesh, cells[1], &combination));
        assert_matrix_eq!(&left * &n, &right * &n, comp = abs, tol = 1e-12);
    }
    assert_eq!(num_interior, 6);
}

#[test]
fn interpolation_is_exact_for_quadratic_fields_in_2d() {
    let mesh = unit_square_mesh(2);
    let rule = QuadratureRule::triangle(4).unwrap();
    for p in 2..=3 {
        let space = HuZhangSpace::new(&mesh, p).unwrap();
        assert_interpolation_is_exact(&space, quadratic_field_2d, &rule);
    }
}

#[test]
fn interpolation_is_exact_for_quadratic_fields_in_3d() {
    let mesh = kuhn_cube_mesh();
    let rule = QuadratureRule::tetrahedron(3).unwrap();
    for p in 2..=3 {
        let space = HuZhangSpace::new(&mesh, p).unwrap();
        assert_interpolation_is_exact(&space, quadratic_field_3d, &rule);
    }
}

#[test]
fn interpolation_is_exact_with_cell_interior_dofs_in_3d() {
    let mesh = kuhn_cube_mesh();
    let rule = QuadratureRule::tetrahedron(3).unwrap();
    let quartic = |x: &DVector<f64>| {
        let (x, y, z) = (x[0], x[1], x[2]);
        let xz = x * z * z;
        DMatrix::from_row_slice(3, 3, &[x * x * y * z, z, xz, z, y.powi(4), x, xz, x, x * y * z - 1.0])
    };
    for p in 4..=5 {
        let space = HuZhangSpace::new(&mesh, p).unwrap();
        assert!(space.dof_counts().cell_interior > 0);
        assert_interpolation_is_exact(&space, quartic, &rule);
    }
}

#[test]
fn interpolation_is_exact_for_quintic_fields_in_2d() {
    let mesh = unit_square_mesh(2);
    let rule = QuadratureRule::triangle(5).unwrap();
    let space = HuZhangSpace::new(&mesh, 5).unwrap();
    let quintic = |x: &DVector<f64>| {
        let (x, y) = (x[0], x[1]);
        DMatrix::from_row_slice(2, 2, &[x.powi(5), x * y * y, x * y * y, y.powi(4) - x])
    };
    assert_interpolation_is_exact(&space, quintic, &rule);
}

#[test]
fn diagonal_components_of_node_and_cell_dofs_carry_the_trace() {
    let mesh = unit_square_mesh(2);
    let space = HuZhangSpace::new(&mesh, 4).unwrap();
    let scalar = space.scalar_space();
    let (tdim, pairs) = (space.tensor_dim(), space.frames().basis().pairs());
    let canonical: Vec<_> = space
        .dof_map()
        .local_kinds()
        .iter()
        .map(|kind| matches!(kind, LocalDofKind::Node { .. } | LocalDofKind::Cell { .. }))
        .collect();
    assert!(space.dof_map().local_kinds().iter().any(|kind| matches!(kind, LocalDofKind::Cell { .. })));

    // Basis level: tr(φ_i S_k) is φ_i for diagonal pairs and zero otherwise
    let rule = QuadratureRule::triangle(3).unwrap();
    let basis = space.basis(rule.points(), None).unwrap();
    let phi = scalar.basis(rule.points()).unwrap();
    for (cell, q) in itertools::iproduct!(0..mesh.number_of_cells(), 0..rule.len()) {
        for i in (0..canonical.len()).filter(|&i| canonical[i]) {
            for (k, &(a, b)) in pairs.iter().enumerate() {
                let expected = if a == b { phi[(q, i)] } else { 0.0 };
                assert_scalar_eq!(basis.matrix(q, cell, i * tdim + k).trace(), expected, comp = abs, tol = 1e-12);
            }
        }
    }

    // Coefficient level: the diagonal coefficients of an interpolant sum to the trace of the field
    let u = |x: &DVector<f64>| DMatrix::from_row_slice(2, 2, &[x[0] * x[1] + 1.0, x[1], x[1], 2.0 - x[0] * x[0]]);
    let uh = space.interpolation(u).unwrap();
    for cell in 0..mesh.number_of_cells() {
        let (scalar_dofs, dofs) = (scalar.cell_dofs(cell), space.cell_to_dof(cell));
        for i in (0..canonical.len()).filter(|&i| canonical[i]) {
            let trace: f64 = (0..tdim)
                .filter(|&k| pairs[k].0 == pairs[k].1)
                .map(|k| uh[dofs[i * tdim + k]])
                .sum();
            let x = &scalar.interpolation_points()[scalar_dofs[i]];
            assert_scalar_eq!(trace, u(x).trace(), comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn interpolated_field_reproduces_node_values() {
    let mesh = kuhn_cube_mesh();
    let space = HuZhangSpace::new(&mesh, 1).unwrap();
    let u = |x: &DVector<f64>| {
        DMatrix::from_row_slice(3, 3, &[x[0], 1.0, x[2], 1.0, x[1] - x[0], 2.0, x[2], 2.0, -x[1]])
    };
    let uh = space.interpolation(u).unwrap();
    for cell in 0..mesh.number_of_cells() {
        for (j, &node) in mesh.cell_nodes(cell).iter().enumerate() {
            let mut bary = [0.0; 4];
            bary[j] = 1.0;
            assert_matrix_eq!(value_at(&space, &uh, cell, &bary), u(&mesh.node_coords(node)), comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn divergence_of_interpolated_field_is_exact() {
    let mesh = unit_square_mesh(2);
    let space = HuZhangSpace::new(&mesh, 2).unwrap();
    let uh = space.interpolation(quadratic_field_2d).unwrap();
    let rule = QuadratureRule::triangle(2).unwrap();
    let div = space.div_value(&uh, rule.points(), None).unwrap();
    for cell in 0..mesh.number_of_cells() {
        for q in 0..rule.len() {
            let bary: Vec<_> = rule.points().row(q).iter().copied().collect();
            let x = mesh.bary_to_physical(cell, &bary);
            let expected = DVector::from_column_slice(&[3.0 * x[0], -x[1]]);
            assert_matrix_eq!(div.vector(q, cell, 0), expected, comp = abs, tol = 1e-11);
        }
    }
}

fn divergence_by_finite_differences<M: MeshTopology<f64>>(
    space: &HuZhangSpace<f64, M>,
    uh: &DVector<f64>,
    cell: usize,
    bary: &[f64],
) -> DVector<f64> {
    let mesh = space.mesh();
    let dim = mesh.geometric_dim();
    let grad_lambda = mesh.grad_lambda(cell).unwrap();
    let h = 1e-5;
    let mut div = DVector::zeros(dim);
    for j in 0..dim {
        let shifted = |sign: f64| -> Vec<f64> {
            bary.iter()
                .enumerate()
                .map(|(k, &l)| l + sign * h * grad_lambda[(k, j)])
                .collect()
        };
        let derivative = (value_at(space, uh, cell, &shifted(1.0)) - value_at(space, uh, cell, &shifted(-1.0))) / (2.0 * h);
        div += derivative.column(j);
    }
    div
}

#[test]
fn divergence_matches_finite_differences_in_3d() {
    let mesh = kuhn_cube_mesh();
    let space = HuZhangSpace::new(&mesh, 2).unwrap();
    let uh = irregular_dof_vector(space.number_of_global_dofs());
    let bary = [0.1, 0.2, 0.3, 0.4];
    for cell in 0..mesh.number_of_cells() {
        let div = space.div_value(&uh, &points_matrix(&bary), Some(&[cell])).unwrap();
        let approx = divergence_by_finite_differences(&space, &uh, cell, &bary);
        assert_matrix_eq!(div.vector(0, 0, 0), approx, comp = abs, tol = 1e-6);
    }
}

proptest! {
    #[test]
    fn divergence_matches_finite_differences_in_2d(
        (s, t) in (0.0..1.0, 0.0..1.0),
        cell in 0..8usize,
        p in 1..=3usize,
    ) {
        let (s, t): (f64, f64) = if s + t > 1.0 { (1.0 - s, 1.0 - t) } else { (s, t) };
        let bary = [1.0 - s - t, s, t];
        let mesh = unit_square_mesh(2);
        let space = HuZhangSpace::new(&mesh, p).unwrap();
        let uh = irregular_dof_vector(space.number_of_global_dofs());
        let div = space.div_value(&uh, &points_matrix(&bary), Some(&[cell])).unwrap();
        let approx = divergence_by_finite_differences(&space, &uh, cell, &bary);
        assert_matrix_eq!(div.vector(0, 0, 0), approx, comp = abs, tol = 1e-6);
    }
}

#[test]
fn unsupported_configurations_are_rejected() {
    let square = unit_square_mesh(1);
    assert_eq!(
        HuZhangSpace::new(&square, 0).err(),
        Some(SpaceError::UnsupportedDegree {
            space: "Hu-Zhang",
            degree: 0
        })
    );

    let vertices = vec![
        Point4::new(0.0, 0.0, 0.0, 0.0),
        Point4::new(1.0, 0.0, 0.0, 0.0),
        Point4::new(0.0, 1.0, 0.0, 0.0),
        Point4::new(0.0, 0.0, 1.0, 0.0),
        Point4::new(0.0, 0.0, 0.0, 1.0),
    ];
    let mesh = SimplexMesh::from_vertices_and_cells(vertices, [[0, 1, 2, 3, 4]]).unwrap();
    assert_eq!(
        HuZhangSpace::new(&mesh, 1).err(),
        Some(SpaceError::UnsupportedDimension {
            space: "Hu-Zhang",
            dim: 4
        })
    );
}

#[test]
fn invalid_arguments_are_rejected() {
    let mesh = unit_square_mesh(1);
    let space = HuZhangSpace::new(&mesh, 2).unwrap();
    let point = points_matrix(&[0.2, 0.3, 0.5]);

    assert_eq!(
        space.value(&DVector::zeros(3), &point, None).err(),
        Some(SpaceError::DofVectorLength { expected: 28, found: 3 })
    );
    assert_eq!(
        space.basis(&points_matrix(&[0.5, 0.5]), None).err(),
        Some(SpaceError::PointDimensionMismatch { expected: 3, found: 2 })
    );
    assert_eq!(
        space.div_basis(&point, Some(&[0, 7])).err(),
        Some(SpaceError::CellOutOfBounds { cell: 7, num_cells: 2 })
    );
    assert_eq!(
        space.interpolation(|_| DMatrix::zeros(3, 3)).err(),
        Some(SpaceError::FieldShape {
            expected: (2, 2),
            found: (3, 3)
        })
    );
}

/// A Lagrange space with an edited classification or edited cell DOF lists.
struct Modified<'a> {
    inner: LagrangeSpace<'a, f64, TriangleMesh<f64>>,
    reclassify: fn(&mut DofClassification),
    cell_dofs: Vec<usize>,
}

impl<'a> Modified<'a> {
    fn new(mesh: &'a TriangleMesh<f64>, degree: usize) -> Self {
        let inner = LagrangeSpace::new(mesh, degree).unwrap();
        let cell_dofs = (0..mesh.number_of_cells())
            .flat_map(|cell| inner.cell_dofs(cell).to_vec())
            .collect();
        Self {
            inner,
            reclassify: |_| {},
            cell_dofs,
        }
    }

    fn reclassified(self, reclassify: fn(&mut DofClassification)) -> Self {
        Self { reclassify, ..self }
    }

    fn renumbered(mut self, cell: usize, edit: impl FnOnce(&mut [usize])) -> Self {
        let n = self.inner.number_of_local_dofs();
        edit(&mut self.cell_dofs[n * cell..n * (cell + 1)]);
        self
    }

    fn local_kinds(&self) -> Vec<LocalDofKind> {
        self.inner.dof_classification().to_kinds().unwrap()
    }
}

impl ScalarElementSpace<f64> for Modified<'_> {
    fn geometric_dim(&self) -> usize {
        self.inner.geometric_dim()
    }

    fn degree(&self) -> usize {
        self.inner.degree()
    }

    fn number_of_local_dofs(&self) -> usize {
        self.inner.number_of_local_dofs()
    }

    fn number_of_global_dofs(&self) -> usize {
        self.inner.number_of_global_dofs()
    }

    fn cell_dofs(&self, cell: usize) -> &[usize] {
        let n = self.inner.number_of_local_dofs();
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    fn dof_classification(&self) -> DofClassification {
        let mut classification = self.inner.dof_classification();
        (self.reclassify)(&mut classification);
        classification
    }

    fn interpolation_points(&self) -> &[DVector<f64>] {
        self.inner.interpolation_points()
    }

    fn basis(&self, points: &DMatrix<f64>) -> Result<DMatrix<f64>, SpaceError> {
        self.inner.basis(points)
    }

    fn grad_basis(&self, points: &DMatrix<f64>, cells: Option<&[usize]>) -> Result<ValueTable<f64>, SpaceError> {
        self.inner.grad_basis(points, cells)
    }
}

#[test]
fn inconsistent_classifications_are_rejected() {
    let mesh = unit_square_mesh(1);

    let overlapping = Modified::new(&mesh, 2).reclassified(|c| c.cell[0] = true);
    assert_eq!(
        HuZhangSpace::from_scalar_space(&mesh, overlapping).err(),
        Some(SpaceError::Invariant(InvariantViolation::ClassificationOverlap {
            local_dof: 0,
            count: 2
        }))
    );

    let missing_edge_dof = Modified::new(&mesh, 2).reclassified(|c| {
        let i = c.edge[0].iter().position(|&m| m).unwrap();
        c.edge[0][i] = false;
        c.node[i] = true;
    });
    assert_eq!(
        HuZhangSpace::from_scalar_space(&mesh, missing_edge_dof).err(),
        Some(SpaceError::Invariant(InvariantViolation::EntityDofCount {
            entity: "edge",
            local_entity: 0,
            expected: 1,
            found: 0
        }))
    );
}

#[test]
fn scalar_dofs_outside_their_category_are_rejected() {
    let mesh = unit_square_mesh(1);
    let scalar = Modified::new(&mesh, 2);
    let kinds = scalar.local_kinds();
    let node = kinds.iter().position(|k| matches!(k, LocalDofKind::Node { .. })).unwrap();
    let edge = kinds.iter().position(|k| matches!(k, LocalDofKind::Edge { .. })).unwrap();
    assert!(node < edge);
    let edge_dof = scalar.cell_dofs(1)[edge];

    let swapped = scalar.renumbered(1, |dofs| dofs.swap(node, edge));
    assert_eq!(
        HuZhangSpace::from_scalar_space(&mesh, swapped).err(),
        Some(SpaceError::Invariant(InvariantViolation::ScalarDofOutOfRange {
            cell: 1,
            dof: edge_dof,
            category: "node"
        }))
    );
}

#[test]
fn unreferenced_global_dofs_are_rejected() {
    let mesh = unit_square_mesh(1);
    // Cells [0, 1, 3] and [0, 3, 2] with node 3 replaced by node 0
    let replace_node = |dofs: &mut [usize]| {
        for dof in dofs.iter_mut().filter(|dof| **dof == 3) {
            *dof = 0;
        }
    };
    let scalar = Modified::new(&mesh, 1)
        .renumbered(0, replace_node)
        .renumbered(1, replace_node);
    assert_eq!(
        HuZhangSpace::from_scalar_space(&mesh, scalar).err(),
        Some(SpaceError::Invariant(InvariantViolation::IncompleteDofMap {
            expected: 12,
            used: 9
        }))
    );
}

#[test]
fn shared_dofs_interpolated_in_different_frames_are_rejected() {
    let mesh = unit_square_mesh(1);
    let uniaxial = |_: &DVector<f64>| DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
    assert!(HuZhangSpace::new(&mesh, 2).unwrap().interpolation(uniaxial).is_ok());

    let scalar = Modified::new(&mesh, 2);
    let kinds = scalar.local_kinds();
    let on_edge = |l: usize| {
        kinds
            .iter()
            .position(|k| matches!(k, LocalDofKind::Edge { local_edge, .. } if *local_edge == l))
            .unwrap()
    };
    let (vertical, diagonal) = (on_edge(0), on_edge(1));
    // Cell 0 now sees the DOF of the shared diagonal through the frame of its vertical edge
    let permuted = scalar.renumbered(0, |dofs| dofs.swap(vertical, diagonal));
    let space = HuZhangSpace::from_scalar_space(&mesh, permuted).unwrap();
    assert!(matches!(
        space.interpolation(uniaxial),
        Err(SpaceError::Invariant(InvariantViolation::InconsistentSharedDof { .. }))
    ));
}

#[test]
fn dof_counts_serialize_to_json() {
    let mesh = kuhn_cube_mesh();
    let space = HuZhangSpace::new(&mesh, 3).unwrap();
    let json = serde_json::to_value(space.dof_counts()).unwrap();
    assert_eq!(json["node"], 6 * 8);
    assert_eq!(json["shared_face"], 3 * mesh.number_of_faces());
    assert_eq!(json["cell_face"], 3 * 4 * mesh.number_of_cells());
}
