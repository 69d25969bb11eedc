//! Simplicial meshes and the topology queries consumed by the function spaces.
use crate::{from_usize, Real};
use log::debug;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DVector, DefaultAllocator, DimName, OPoint, Scalar, U2, U3};

pub mod topology;

pub use topology::{IncidentCells, Sign, SimplexTopology};

/// Errors raised while constructing or querying a mesh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MeshError {
    #[error("cell {cell} has {found} vertices, but a simplex in this dimension has {expected}")]
    WrongCellSize { cell: usize, expected: usize, found: usize },
    #[error("cell {cell} references vertex {vertex}, but the mesh only has {num_vertices} vertices")]
    VertexOutOfBounds {
        cell: usize,
        vertex: usize,
        num_vertices: usize,
    },
    #[error("cell {cell} is degenerate")]
    DegenerateCell { cell: usize },
    #[error("edge {edge:?} is shared by more than two cells")]
    NonManifoldEdge { edge: [usize; 2] },
    #[error("face {face:?} is shared by more than two cells")]
    NonManifoldFace { face: [usize; 3] },
}

/// Topology and geometry queries of a simplicial mesh.
///
/// Cells are simplices with `geometric_dim() + 1` vertices. Local edges and faces follow the
/// numbering of [`topology::local_edges`] and [`topology::local_faces`].
pub trait MeshTopology<T: Real> {
    fn geometric_dim(&self) -> usize;

    fn number_of_nodes(&self) -> usize;

    fn number_of_edges(&self) -> usize;

    /// The number of faces. Faces are only tracked in three dimensions.
    fn number_of_faces(&self) -> usize;

    fn number_of_cells(&self) -> usize;

    fn cell_nodes(&self, cell: usize) -> &[usize];

    fn cell_to_edge(&self, cell: usize) -> &[usize];

    /// Orientation of each local edge of the cell relative to the stored global edge.
    fn cell_edge_signs(&self, cell: usize) -> &[Sign];

    fn cell_to_face(&self, cell: usize) -> &[usize];

    fn edge_nodes(&self, edge: usize) -> [usize; 2];

    fn face_nodes(&self, face: usize) -> [usize; 3];

    fn edge_to_cell(&self, edge: usize) -> IncidentCells;

    /// The edges of a face `(g0, g1, g2)`, in the order `(g1, g2)`, `(g2, g0)`, `(g0, g1)`.
    fn face_to_edge(&self, face: usize) -> [usize; 3];

    fn node_coords(&self, node: usize) -> DVector<T>;

    /// Unit tangent pointing from the first to the second stored node of the edge.
    fn edge_unit_tangent(&self, edge: usize) -> DVector<T> {
        let [a, b] = self.edge_nodes(edge);
        (self.node_coords(b) - self.node_coords(a)).normalize()
    }

    /// Unit normal of a face, oriented by the right-hand rule on its stored node order.
    ///
    /// # Panics
    ///
    /// Panics if the mesh is not three-dimensional.
    fn face_unit_normal(&self, face: usize) -> DVector<T> {
        assert_eq!(self.geometric_dim(), 3, "face normals are only defined in 3D");
        let [a, b, c] = self.face_nodes(face);
        let x0 = self.node_coords(a);
        let u = self.node_coords(b) - &x0;
        let v = self.node_coords(c) - &x0;
        u.cross(&v).normalize()
    }

    /// Gradients of the barycentric coordinates of a cell, one per row.
    ///
    /// The result has `geometric_dim() + 1` rows and `geometric_dim()` columns.
    fn grad_lambda(&self, cell: usize) -> Result<DMatrix<T>, MeshError> {
        let d = self.geometric_dim();
        let inverse = cell_jacobian(self, cell)
            .try_inverse()
            .ok_or(MeshError::DegenerateCell { cell })?;
        let mut gradients = DMatrix::zeros(d + 1, d);
        // λ_i = (J^{-1} (x - x_0))_{i - 1} for i > 0, and λ_0 = 1 - sum_i λ_i
        gradients.rows_mut(1, d).copy_from(&inverse);
        for j in 0..d {
            gradients[(0, j)] = -inverse.column(j).sum();
        }
        Ok(gradients)
    }

    fn cell_measure(&self, cell: usize) -> T {
        let d = self.geometric_dim();
        let factorial = (1..=d).fold(T::one(), |acc, k| acc * from_usize::<T>(k));
        cell_jacobian(self, cell).determinant().abs() / factorial
    }

    /// Maps barycentric coordinates in a cell to physical coordinates.
    fn bary_to_physical(&self, cell: usize, bary: &[T]) -> DVector<T> {
        let mut x = DVector::zeros(self.geometric_dim());
        for (&node, &lambda) in self.cell_nodes(cell).iter().zip(bary) {
            x.axpy(lambda, &self.node_coords(node), T::one());
        }
        x
    }
}

/// The Jacobian `[x_1 - x_0, ..., x_d - x_0]` of the affine map from the reference simplex.
fn cell_jacobian<T, M>(mesh: &M, cell: usize) -> DMatrix<T>
where
    T: Real,
    M: MeshTopology<T> + ?Sized,
{
    let d = mesh.geometric_dim();
    let nodes = mesh.cell_nodes(cell);
    let x0 = mesh.node_coords(nodes[0]);
    let mut jacobian = DMatrix::zeros(d, d);
    for (k, &node) in nodes.iter().skip(1).enumerate() {
        jacobian.set_column(k, &(mesh.node_coords(node) - &x0));
    }
    jacobian
}

/// A conforming mesh of simplices with vertices in `D` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexMesh<T: Scalar, D>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    vertices: Vec<OPoint<T, D>>,
    cells: Vec<usize>,
    topology: SimplexTopology,
}

pub type TriangleMesh<T> = SimplexMesh<T, U2>;
pub type TetrahedronMesh<T> = SimplexMesh<T, U3>;

impl<T, D> SimplexMesh<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Constructs a mesh from vertices and cells given as lists of vertex indices.
    ///
    /// Cells with negative orientation are reoriented by swapping two of their vertices, so that
    /// every cell of the resulting mesh has positive orientation. Degenerate cells and vertex
    /// indices out of bounds are rejected.
    pub fn from_vertices_and_cells<C>(
        vertices: Vec<OPoint<T, D>>,
        cells: impl IntoIterator<Item = C>,
    ) -> Result<Self, MeshError>
    where
        C: AsRef<[usize]>,
    {
        let d = D::dim();
        let nodes_per_cell = d + 1;
        let mut connectivity = Vec::new();
        let mut num_reoriented = 0;

        for (cell_index, cell) in cells.into_iter().enumerate() {
            let cell = cell.as_ref();
            if cell.len() != nodes_per_cell {
                return Err(MeshError::WrongCellSize {
                    cell: cell_index,
                    expected: nodes_per_cell,
                    found: cell.len(),
                });
            }
            if let Some(&vertex) = cell.iter().find(|&&v| v >= vertices.len()) {
                return Err(MeshError::VertexOutOfBounds {
                    cell: cell_index,
                    vertex,
                    num_vertices: vertices.len(),
                });
            }

            let mut cell = cell.to_vec();
            let x0 = &vertices[cell[0]];
            let jacobian = DMatrix::from_fn(d, d, |i, k| vertices[cell[k + 1]][i] - x0[i]);
            let scale = jacobian
                .column_iter()
                .fold(T::one(), |acc, column| acc * column.norm());
            let det = jacobian.determinant();
            if det.abs() <= T::default_epsilon() * scale {
                return Err(MeshError::DegenerateCell { cell: cell_index });
            }
            if det < T::zero() {
                let (i, j) = if nodes_per_cell > 2 { (1, 2) } else { (0, 1) };
                cell.swap(i, j);
                num_reoriented += 1;
            }
            connectivity.extend(cell);
        }

        let topology = SimplexTopology::from_cells(&connectivity, nodes_per_cell)?;
        debug!(
            "Built simplex mesh with {} nodes, {} edges, {} faces and {} cells ({} reoriented)",
            vertices.len(),
            topology.number_of_edges(),
            topology.number_of_faces(),
            connectivity.len() / nodes_per_cell,
            num_reoriented
        );

        Ok(Self {
            vertices,
            cells: connectivity,
            topology,
        })
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    /// Iterates over the vertex indices of each cell.
    pub fn cells(&self) -> impl '_ + Iterator<Item = &[usize]> {
        self.cells.chunks_exact(D::dim() + 1)
    }

    pub fn topology(&self) -> &SimplexTopology {
        &self.topology
    }
}

impl<T, D> MeshTopology<T> for SimplexMesh<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn geometric_dim(&self) -> usize {
        D::dim()
    }

    fn number_of_nodes(&self) -> usize {
        self.vertices.len()
    }

    fn number_of_edges(&self) -> usize {
        self.topology.number_of_edges()
    }

    fn number_of_faces(&self) -> usize {
        self.topology.number_of_faces()
    }

    fn number_of_cells(&self) -> usize {
        self.cells.len() / (D::dim() + 1)
    }

    fn cell_nodes(&self, cell: usize) -> &[usize] {
        let n = D::dim() + 1;
        &self.cells[n * cell..n * (cell + 1)]
    }

    fn cell_to_edge(&self, cell: usize) -> &[usize] {
        self.topology.cell_edges(cell)
    }

    fn cell_edge_signs(&self, cell: usize) -> &[Sign] {
        self.topology.cell_edge_signs(cell)
    }

    fn cell_to_face(&self, cell: usize) -> &[usize] {
        self.topology.cell_faces(cell)
    }

    fn edge_nodes(&self, edge: usize) -> [usize; 2] {
        self.topology.edges()[edge]
    }

    fn face_nodes(&self, face: usize) -> [usize; 3] {
        self.topology.faces()[face]
    }

    fn edge_to_cell(&self, edge: usize) -> IncidentCells {
        self.topology.edge_cells()[edge]
    }

    fn face_to_edge(&self, face: usize) -> [usize; 3] {
        self.topology.face_edges()[face]
    }

    fn node_coords(&self, node: usize) -> DVector<T> {
        DVector::from_iterator(D::dim(), self.vertices[node].coords.iter().copied())
    }
}
