use crate::mesh::MeshTopology;
use crate::space::{
    check_dof_vector, check_points, select_cells, DofCounts, InvariantViolation, LagrangeSpace, LocalDofKind,
    ScalarElementSpace, SpaceError, SymmetricBasis, TensorDofMap, TensorFrames,
};
use crate::table::{ValueShape, ValueTable};
use crate::Real;
use log::trace;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

/// The tensor basis attached to a local scalar DOF of a cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LocalFrame {
    Canonical,
    Edge(usize),
    Face(usize),
}

fn frame_tensor<'b, T: Real>(frames: &'b TensorFrames<T>, frame: LocalFrame, k: usize) -> &'b DMatrix<T> {
    match frame {
        LocalFrame::Canonical => frames.basis().tensor(k),
        LocalFrame::Edge(edge) => frames.edge(edge).tensor(k),
        LocalFrame::Face(face) => frames.face(face).tensor(k),
    }
}

/// The Hu-Zhang space of symmetric `dim x dim` tensors with piecewise polynomial entries of
/// degree `p >= 1`, on triangles (`dim = 2`) or tetrahedra (`dim = 3`).
///
/// Each scalar DOF `i` of the underlying Lagrange space carries `tdim` tensor DOFs, one per
/// tensor of the frame associated with its location: the canonical symmetric basis for node
/// and cell-interior DOFs, and the edge or face frame of [`TensorFrames`] for DOFs in the
/// interior of an edge or face. The global numbering is described by [`TensorDofMap`].
///
/// The basis function of the tensor DOF `(i, k)` is `φ_i S_k`, and its row-wise divergence is
/// `S_k ∇φ_i`.
#[derive(Debug)]
pub struct HuZhangSpace<'a, T: Real, M, S = LagrangeSpace<'a, T, M>> {
    mesh: &'a M,
    scalar: S,
    frames: TensorFrames<T>,
    dof_map: TensorDofMap,
    local_frames: Vec<LocalFrame>,
}

impl<'a, T, M> HuZhangSpace<'a, T, M>
where
    T: Real,
    M: MeshTopology<T>,
{
    /// Constructs the space of degree `degree` on the given mesh.
    pub fn new(mesh: &'a M, degree: usize) -> Result<Self, SpaceError> {
        let dim = mesh.geometric_dim();
        if !(2..=3).contains(&dim) {
            return Err(SpaceError::UnsupportedDimension { space: "Hu-Zhang", dim });
        }
        if degree == 0 {
            return Err(SpaceError::UnsupportedDegree { space: "Hu-Zhang", degree });
        }
        let scalar = LagrangeSpace::new(mesh, degree)?;
        Self::from_scalar_space(mesh, scalar)
    }
}

impl<'a, T, M, S> HuZhangSpace<'a, T, M, S>
where
    T: Real,
    M: MeshTopology<T>,
    S: ScalarElementSpace<T>,
{
    /// Constructs the space on top of an arbitrary scalar space over the same mesh.
    ///
    /// The scalar space must number its global DOFs as required by [`ScalarElementSpace`], and
    /// its classification must partition the local DOFs with `p - 1` DOFs per edge and the
    /// full interior lattice on faces and cells.
    pub fn from_scalar_space(mesh: &'a M, scalar: S) -> Result<Self, SpaceError> {
        let dof_map = TensorDofMap::build(mesh, &scalar)?;
        let frames = TensorFrames::new(mesh)?;

        let mut local_frames = Vec::with_capacity(mesh.number_of_cells() * dof_map.local_kinds().len());
        for cell in 0..mesh.number_of_cells() {
            local_frames.extend(dof_map.local_kinds().iter().map(|kind| match *kind {
                LocalDofKind::Node { .. } | LocalDofKind::Cell { .. } => LocalFrame::Canonical,
                LocalDofKind::Edge { local_edge, .. } => LocalFrame::Edge(mesh.cell_to_edge(cell)[local_edge]),
                LocalDofKind::Face { local_face, .. } => LocalFrame::Face(mesh.cell_to_face(cell)[local_face]),
            }));
        }

        Ok(Self {
            mesh,
            scalar,
            frames,
            dof_map,
            local_frames,
        })
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }

    pub fn scalar_space(&self) -> &S {
        &self.scalar
    }

    pub fn frames(&self) -> &TensorFrames<T> {
        &self.frames
    }

    pub fn dof_map(&self) -> &TensorDofMap {
        &self.dof_map
    }

    pub fn dof_counts(&self) -> &DofCounts {
        self.dof_map.counts()
    }

    pub fn degree(&self) -> usize {
        self.scalar.degree()
    }

    pub fn geometric_dim(&self) -> usize {
        self.mesh.geometric_dim()
    }

    pub fn tensor_dim(&self) -> usize {
        self.dof_map.tensor_dim()
    }

    pub fn number_of_global_dofs(&self) -> usize {
        self.dof_map.number_of_global_dofs()
    }

    pub fn number_of_local_dofs(&self) -> usize {
        self.dof_map.number_of_local_dofs()
    }

    /// Global indices of the local DOFs of a cell, `i * tdim + k` for scalar DOF `i`.
    pub fn cell_to_dof(&self, cell: usize) -> &[usize] {
        self.dof_map.cell_dofs(cell)
    }

    /// A zero DOF vector.
    pub fn array(&self) -> DVector<T> {
        DVector::zeros(self.number_of_global_dofs())
    }

    /// Basis tensors at barycentric points, shaped `(points, cells, local DOFs, dim, dim)`.
    pub fn basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        let dim = self.geometric_dim();
        check_points(points, dim)?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let phi = self.scalar.basis(points)?;

        let (ldof, tdim) = (self.scalar.number_of_local_dofs(), self.tensor_dim());
        let mut table = ValueTable::zeros(points.nrows(), cells.len(), ldof * tdim, ValueShape::Tensor(dim));
        let (frames, local_frames) = (&self.frames, &self.local_frames);
        table.par_fill_points(|q, values| {
            let mut entries = values.chunks_exact_mut(dim * dim);
            for &cell in &cells {
                for i in 0..ldof {
                    let frame = local_frames[cell * ldof + i];
                    for k in 0..tdim {
                        let tensor = frame_tensor(frames, frame, k);
                        let entry = entries.next().expect("Table has one entry per basis function");
                        for (e, &s) in entry.iter_mut().zip(tensor.iter()) {
                            *e = phi[(q, i)] * s;
                        }
                    }
                }
            }
        });
        Ok(table)
    }

    /// Row-wise divergence of the basis, shaped `(points, cells, local DOFs, dim)`.
    pub fn div_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        let dim = self.geometric_dim();
        check_points(points, dim)?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let grad_phi = self.scalar.grad_basis(points, Some(cells.as_slice()))?;

        let (ldof, tdim) = (self.scalar.number_of_local_dofs(), self.tensor_dim());
        let mut table = ValueTable::zeros(points.nrows(), cells.len(), ldof * tdim, ValueShape::Vector(dim));
        let (frames, local_frames) = (&self.frames, &self.local_frames);
        table.par_fill_points(|q, values| {
            let mut entries = values.chunks_exact_mut(dim);
            for (c, &cell) in cells.iter().enumerate() {
                for i in 0..ldof {
                    let gradient = grad_phi.vector(q, c, i);
                    let frame = local_frames[cell * ldof + i];
                    for k in 0..tdim {
                        let divergence = frame_tensor(frames, frame, k) * gradient;
                        let entry = entries.next().expect("Table has one entry per basis function");
                        entry.copy_from_slice(divergence.as_slice());
                    }
                }
            }
        });
        Ok(table)
    }

    /// The tensor field represented by `uh`, shaped `(points, cells, 1, dim, dim)`.
    pub fn value(
        &self,
        uh: &DVector<T>,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        check_dof_vector(uh, self.number_of_global_dofs())?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let basis = self.basis(points, Some(cells.as_slice()))?;
        let dof_map = &self.dof_map;
        Ok(basis.contract(|c, j| uh[dof_map.cell_dofs(cells[c])[j]]))
    }

    /// The divergence of the field represented by `uh`, shaped `(points, cells, 1, dim)`.
    pub fn div_value(
        &self,
        uh: &DVector<T>,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        check_dof_vector(uh, self.number_of_global_dofs())?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let div_basis = self.div_basis(points, Some(cells.as_slice()))?;
        let dof_map = &self.dof_map;
        Ok(div_basis.contract(|c, j| uh[dof_map.cell_dofs(cells[c])[j]]))
    }

    /// Interpolates a tensor field given in physical coordinates.
    ///
    /// The field is evaluated once at the interpolation point of every scalar DOF and
    /// symmetrized. Node and cell DOFs take its canonical coefficients, edge and face DOFs its
    /// coordinates in the respective frame. A global DOF written from several cells must
    /// receive the same value every time, which holds for fields continuous across the mesh.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn interpolation<F>(&self, f: F) -> Result<DVector<T>, SpaceError>
    where
        F: Fn(&DVector<T>) -> DMatrix<T>,
    {
        let dim = self.geometric_dim();
        let values = self
            .scalar
            .interpolation_points()
            .iter()
            .map(|x| {
                let u = f(x);
                if u.shape() == (dim, dim) {
                    Ok((&u + u.transpose()) * 0.5)
                } else {
                    Err(SpaceError::FieldShape {
                        expected: (dim, dim),
                        found: u.shape(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (ldof, tdim) = (self.scalar.number_of_local_dofs(), self.tensor_dim());
        let basis: &SymmetricBasis<T> = self.frames.basis();
        let tolerance = T::default_epsilon().sqrt();
        let mut uh = self.array();
        let mut written = vec![false; uh.len()];
        for cell in 0..self.mesh.number_of_cells() {
            let scalar_dofs = self.scalar.cell_dofs(cell);
            let tensor_dofs = self.cell_to_dof(cell);
            for (i, &scalar_dof) in scalar_dofs.iter().enumerate() {
                let u = &values[scalar_dof];
                let coefficients = match self.local_frames[cell * ldof + i] {
                    LocalFrame::Canonical => basis.coefficients(u),
                    LocalFrame::Edge(edge) => self.frames.edge(edge).coordinates(u),
                    LocalFrame::Face(face) => self.frames.face(face).coordinates(u),
                };
                for (k, &coefficient) in coefficients.iter().enumerate() {
                    let dof = tensor_dofs[i * tdim + k];
                    if written[dof] {
                        let existing = uh[dof];
                        let scale = T::one().max(existing.abs()).max(coefficient.abs());
                        if (existing - coefficient).abs() > tolerance * scale {
                            return Err(InvariantViolation::InconsistentSharedDof { dof }.into());
                        }
                    } else {
                        uh[dof] = coefficient;
                        written[dof] = true;
                    }
                }
            }
        }

        trace!(
            "Interpolated tensor field into {} Hu-Zhang DOFs",
            written.iter().filter(|&&w| w).count()
        );
        Ok(uh)
    }
}
