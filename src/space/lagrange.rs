use crate::mesh::topology::{local_edges, local_faces};
use crate::mesh::MeshTopology;
use crate::space::{check_points, select_cells, DofClassification, InvariantViolation, ScalarElementSpace, SpaceError};
use crate::table::{ValueShape, ValueTable};
use crate::{from_usize, Real};
use itertools::izip;
use log::debug;
use nalgebra::{DMatrix, DVector};

/// Multi-indices of `num_vars` non-negative integers summing to `degree`.
///
/// The ordering is reverse lexicographic, so that the first index is `(degree, 0, ..., 0)`.
pub(crate) fn multi_indices(num_vars: usize, degree: usize) -> Vec<Vec<usize>> {
    match num_vars {
        0 => Vec::new(),
        1 => vec![vec![degree]],
        _ => (0..=degree)
            .rev()
            .flat_map(|first| {
                multi_indices(num_vars - 1, degree - first)
                    .into_iter()
                    .map(move |rest| {
                        let mut index = Vec::with_capacity(num_vars);
                        index.push(first);
                        index.extend(rest);
                        index
                    })
            })
            .collect(),
    }
}

/// The mesh entity in whose interior a local DOF lies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LocalEntity {
    Vertex(usize),
    Edge(usize),
    Face(usize),
    /// Cell interior, with the offset among the interior DOFs.
    Interior(usize),
}

fn classify_local_dofs(
    multi_indices: &[Vec<usize>],
    local_edges: &[[usize; 2]],
    local_faces: &[[usize; 3]],
) -> Vec<LocalEntity> {
    let mut num_interior = 0;
    multi_indices
        .iter()
        .map(|alpha| {
            let support: Vec<usize> = (0..alpha.len()).filter(|&j| alpha[j] > 0).collect();
            let spans = |vertices: &[usize]| vertices.len() == support.len() && vertices.iter().all(|v| support.contains(v));
            if let &[vertex] = support.as_slice() {
                LocalEntity::Vertex(vertex)
            } else if let Some(l) = local_edges.iter().position(|edge| spans(&edge[..])) {
                LocalEntity::Edge(l)
            } else if let Some(l) = local_faces.iter().position(|face| spans(&face[..])) {
                LocalEntity::Face(l)
            } else {
                num_interior += 1;
                LocalEntity::Interior(num_interior - 1)
            }
        })
        .collect()
}

/// Values `A_m = prod_{k < m} (p λ - k) / (k + 1)` and their derivatives in `λ`, for `m <= p`.
fn lagrange_factors<T: Real>(degree: usize, lambda: T) -> (Vec<T>, Vec<T>) {
    let p = from_usize::<T>(degree);
    let mut values = vec![T::one(); degree + 1];
    let mut derivatives = vec![T::zero(); degree + 1];
    for m in 1..=degree {
        let shift = p * lambda - from_usize(m - 1);
        let m_t = from_usize::<T>(m);
        derivatives[m] = (derivatives[m - 1] * shift + values[m - 1] * p) / m_t;
        values[m] = values[m - 1] * shift / m_t;
    }
    (values, derivatives)
}

/// Derivatives of every basis function with respect to every barycentric coordinate,
/// as an `ldof x (dim + 1)` matrix.
fn barycentric_derivatives<T: Real>(degree: usize, multi_indices: &[Vec<usize>], lambda: &[T]) -> DMatrix<T> {
    let factors: Vec<_> = lambda.iter().map(|&l| lagrange_factors(degree, l)).collect();
    DMatrix::from_fn(multi_indices.len(), lambda.len(), |i, j| {
        let alpha = &multi_indices[i];
        (0..lambda.len()).fold(T::one(), |product, l| {
            let (values, derivatives) = &factors[l];
            if l == j {
                product * derivatives[alpha[l]]
            } else {
                product * values[alpha[l]]
            }
        })
    })
}

/// The continuous Lagrange space of degree `p >= 1` on a simplex mesh in 1, 2 or 3 dimensions.
///
/// Local DOFs are the principal lattice points `α / p` in reverse lexicographic order. Global
/// DOFs are numbered by nodes, then edges, faces and cells, in the order of the mesh entities.
/// DOFs in the interior of an edge or face are ordered along the stored orientation of the
/// entity, so that they agree between all cells sharing it.
#[derive(Debug, Clone)]
pub struct LagrangeSpace<'a, T: Real, M> {
    mesh: &'a M,
    degree: usize,
    multi_indices: Vec<Vec<usize>>,
    local_entities: Vec<LocalEntity>,
    cell_dofs: Vec<usize>,
    num_global_dofs: usize,
    interpolation_points: Vec<DVector<T>>,
    grad_lambda: Vec<DMatrix<T>>,
}

impl<'a, T, M> LagrangeSpace<'a, T, M>
where
    T: Real,
    M: MeshTopology<T>,
{
    pub fn new(mesh: &'a M, degree: usize) -> Result<Self, SpaceError> {
        let dim = mesh.geometric_dim();
        if !(1..=3).contains(&dim) {
            return Err(SpaceError::UnsupportedDimension { space: "Lagrange", dim });
        }
        if degree == 0 {
            return Err(SpaceError::UnsupportedDegree {
                space: "Lagrange",
                degree,
            });
        }

        let multi_indices = multi_indices(dim + 1, degree);
        let local_edges = local_edges(dim + 1);
        let local_faces = local_faces(dim + 1);
        let local_entities = classify_local_dofs(&multi_indices, &local_edges, &local_faces);
        let count = |predicate: fn(&LocalEntity) -> bool| local_entities.iter().filter(|e| predicate(e)).count();
        let edge_dofs = count(|e| *e == LocalEntity::Edge(0));
        let face_dofs = count(|e| *e == LocalEntity::Face(0));
        let interior_dofs = count(|e| matches!(e, LocalEntity::Interior(_)));
        let face_multi_indices = multi_indices_for_face(degree);

        let (num_nodes, num_edges) = (mesh.number_of_nodes(), mesh.number_of_edges());
        let (num_faces, num_cells) = (mesh.number_of_faces(), mesh.number_of_cells());
        let edge_begin = num_nodes;
        let face_begin = edge_begin + num_edges * edge_dofs;
        let cell_begin = face_begin + num_faces * face_dofs;
        let num_global_dofs = cell_begin + num_cells * interior_dofs;

        let grad_lambda = (0..num_cells)
            .map(|cell| mesh.grad_lambda(cell))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cell_dofs = Vec::with_capacity(num_cells * multi_indices.len());
        let mut points: Vec<Option<DVector<T>>> = vec![None; num_global_dofs];
        for (node, point) in points.iter_mut().take(num_nodes).enumerate() {
            *point = Some(mesh.node_coords(node));
        }

        for cell in 0..num_cells {
            let nodes = mesh.cell_nodes(cell);
            let inconsistent = InvariantViolation::InconsistentTopology { cell };
            let local_vertex = |global: usize| nodes.iter().position(|&n| n == global);
            let vertex_coords: Vec<_> = nodes.iter().map(|&n| mesh.node_coords(n)).collect();

            for (alpha, entity) in izip!(&multi_indices, &local_entities) {
                let dof = match *entity {
                    LocalEntity::Vertex(j) => nodes[j],
                    LocalEntity::Edge(l) => {
                        let edge = mesh.cell_to_edge(cell)[l];
                        let [_, end] = mesh.edge_nodes(edge);
                        let j = local_vertex(end).ok_or(inconsistent.clone())?;
                        edge_begin + edge * edge_dofs + alpha[j] - 1
                    }
                    LocalEntity::Face(l) => {
                        let face = mesh.cell_to_face(cell)[l];
                        let beta = mesh
                            .face_nodes(face)
                            .iter()
                            .map(|&g| local_vertex(g).map(|j| alpha[j] - 1))
                            .collect::<Option<Vec<_>>>()
                            .ok_or(inconsistent.clone())?;
                        let position = face_multi_indices
                            .iter()
                            .position(|gamma| *gamma == beta)
                            .ok_or(inconsistent.clone())?;
                        face_begin + face * face_dofs + position
                    }
                    LocalEntity::Interior(offset) => cell_begin + cell * interior_dofs + offset,
                };

                points[dof].get_or_insert_with(|| {
                    let mut x = DVector::zeros(dim);
                    for (&a, coords) in alpha.iter().zip(&vertex_coords) {
                        x.axpy(from_usize::<T>(a) / from_usize(degree), coords, T::one());
                    }
                    x
                });
                cell_dofs.push(dof);
            }
        }

        let used = points.iter().filter(|p| p.is_some()).count();
        let interpolation_points = points
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(InvariantViolation::IncompleteDofMap {
                expected: num_global_dofs,
                used,
            })?;

        debug!(
            "Lagrange space of degree {} in {}D: {} local and {} global DOFs",
            degree,
            dim,
            multi_indices.len(),
            num_global_dofs
        );

        Ok(Self {
            mesh,
            degree,
            multi_indices,
            local_entities,
            cell_dofs,
            num_global_dofs,
            interpolation_points,
            grad_lambda,
        })
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }

    /// The multi-index `α` of each local DOF, located at the barycentric point `α / p`.
    pub fn multi_indices(&self) -> &[Vec<usize>] {
        &self.multi_indices
    }
}

fn multi_indices_for_face(degree: usize) -> Vec<Vec<usize>> {
    degree
        .checked_sub(3)
        .map(|interior_degree| multi_indices(3, interior_degree))
        .unwrap_or_default()
}

impl<'a, T, M> ScalarElementSpace<T> for LagrangeSpace<'a, T, M>
where
    T: Real,
    M: MeshTopology<T>,
{
    fn geometric_dim(&self) -> usize {
        self.mesh.geometric_dim()
    }

    fn degree(&self) -> usize {
        self.degree
    }

    fn number_of_local_dofs(&self) -> usize {
        self.multi_indices.len()
    }

    fn number_of_global_dofs(&self) -> usize {
        self.num_global_dofs
    }

    fn cell_dofs(&self, cell: usize) -> &[usize] {
        let n = self.multi_indices.len();
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    fn dof_classification(&self) -> DofClassification {
        let dim = self.mesh.geometric_dim();
        let mask = |predicate: &dyn Fn(&LocalEntity) -> bool| self.local_entities.iter().map(predicate).collect();
        DofClassification {
            node: mask(&|e| matches!(e, LocalEntity::Vertex(_))),
            edge: (0..local_edges(dim + 1).len())
                .map(|l| mask(&|e| *e == LocalEntity::Edge(l)))
                .collect(),
            face: (0..local_faces(dim + 1).len())
                .map(|l| mask(&|e| *e == LocalEntity::Face(l)))
                .collect(),
            cell: mask(&|e| matches!(e, LocalEntity::Interior(_))),
        }
    }

    fn interpolation_points(&self) -> &[DVector<T>] {
        &self.interpolation_points
    }

    fn basis(&self, points: &DMatrix<T>) -> Result<DMatrix<T>, SpaceError> {
        check_points(points, self.mesh.geometric_dim())?;
        let mut values = DMatrix::zeros(points.nrows(), self.multi_indices.len());
        for (q, lambda) in points.row_iter().enumerate() {
            let factors: Vec<_> = lambda.iter().map(|&l| lagrange_factors(self.degree, l).0).collect();
            for (i, alpha) in self.multi_indices.iter().enumerate() {
                values[(q, i)] = izip!(alpha, &factors).fold(T::one(), |product, (&a, f)| product * f[a]);
            }
        }
        Ok(values)
    }

    fn grad_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        let dim = self.mesh.geometric_dim();
        check_points(points, dim)?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;

        let ldof = self.multi_indices.len();
        let mut table = ValueTable::zeros(points.nrows(), cells.len(), ldof, ValueShape::Vector(dim));
        let (degree, multi_indices, grad_lambda) = (self.degree, &self.multi_indices, &self.grad_lambda);
        table.par_fill_points(|q, values| {
            let lambda: Vec<T> = points.row(q).iter().copied().collect();
            let derivatives = barycentric_derivatives(degree, multi_indices, &lambda);
            for (&cell, cell_values) in cells.iter().zip(values.chunks_exact_mut(ldof * dim)) {
                let gradients = &derivatives * &grad_lambda[cell];
                for (i, gradient) in cell_values.chunks_exact_mut(dim).enumerate() {
                    for (g, &d) in gradient.iter_mut().zip(gradients.row(i).iter()) {
                        *g = d;
                    }
                }
            }
        });
        Ok(table)
    }
}
