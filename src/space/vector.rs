//! Lowest-order H(div) and H(curl) conforming vector elements on triangles.
//!
//! All elements are built from the edge functions
//!
//! ```text
//! φ_i = s (λ_a w_b - λ_b w_a),    ψ_i = λ_a w_b + λ_b w_a,
//! ```
//!
//! where `(a, b) = (i + 1, i + 2) mod 3` are the vertices of local edge `i`, `s` is the sign of
//! the local edge relative to the global edge, and `w_j = curl λ_j = (∂_y λ_j, -∂_x λ_j)` for the
//! H(div) families or `w_j = ∇λ_j` for the H(curl) families. The lowest-order families use `φ_i`
//! only, the full linear families use both.
use crate::mesh::MeshTopology;
use crate::quadrature::QuadratureRule;
use crate::space::{check_dof_vector, check_points, select_cells, SpaceError};
use crate::table::{ValueShape, ValueTable};
use crate::Real;
use log::{debug, trace};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorFamily {
    RaviartThomas,
    BrezziDouglasMarini,
    FirstKindNedelec,
    SecondKindNedelec,
}

/// A supported combination of vector family and polynomial degree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorElement {
    /// `RT0`, one normal flux per edge.
    RaviartThomas0,
    /// `BDM1`, linear normal traces on each edge.
    BrezziDouglasMarini1,
    /// `NED0`, one tangential circulation per edge.
    Nedelec0,
    /// Second-kind `NED1`, linear tangential traces on each edge.
    SecondKindNedelec1,
}

impl VectorElement {
    pub fn new(family: VectorFamily, degree: usize) -> Result<Self, SpaceError> {
        match (family, degree) {
            (VectorFamily::RaviartThomas, 0) => Ok(Self::RaviartThomas0),
            (VectorFamily::BrezziDouglasMarini, 1) => Ok(Self::BrezziDouglasMarini1),
            (VectorFamily::FirstKindNedelec, 0) => Ok(Self::Nedelec0),
            (VectorFamily::SecondKindNedelec, 1) => Ok(Self::SecondKindNedelec1),
            _ => Err(SpaceError::UnsupportedElement { family, degree }),
        }
    }

    pub fn family(&self) -> VectorFamily {
        match self {
            Self::RaviartThomas0 => VectorFamily::RaviartThomas,
            Self::BrezziDouglasMarini1 => VectorFamily::BrezziDouglasMarini,
            Self::Nedelec0 => VectorFamily::FirstKindNedelec,
            Self::SecondKindNedelec1 => VectorFamily::SecondKindNedelec,
        }
    }

    pub fn degree(&self) -> usize {
        match self {
            Self::RaviartThomas0 | Self::Nedelec0 => 0,
            Self::BrezziDouglasMarini1 | Self::SecondKindNedelec1 => 1,
        }
    }

    /// Whether the element is H(div) conforming. Otherwise it is H(curl) conforming.
    pub fn is_div_conforming(&self) -> bool {
        matches!(self, Self::RaviartThomas0 | Self::BrezziDouglasMarini1)
    }

    pub fn functions_per_edge(&self) -> usize {
        match self {
            Self::RaviartThomas0 | Self::Nedelec0 => 1,
            Self::BrezziDouglasMarini1 | Self::SecondKindNedelec1 => 2,
        }
    }
}

/// Per-cell data needed to evaluate the edge functions.
#[derive(Debug, Clone, PartialEq)]
struct CellGeometry<T: Real> {
    grad_lambda: [Vector2<T>; 3],
    directions: [Vector2<T>; 3],
    signs: [T; 3],
}

/// The edge function `c_ab λ_a w_b + c_ba λ_b w_a` at a point.
struct EdgeTerms<T: Real> {
    lambda_a: T,
    lambda_b: T,
    grad_a: Vector2<T>,
    grad_b: Vector2<T>,
    w_a: Vector2<T>,
    w_b: Vector2<T>,
    c_ab: T,
    c_ba: T,
}

impl<T: Real> EdgeTerms<T> {
    fn value(&self) -> Vector2<T> {
        self.w_b * (self.c_ab * self.lambda_a) + self.w_a * (self.c_ba * self.lambda_b)
    }

    /// The Jacobian `∂φ_m / ∂x_n`.
    fn gradient(&self) -> Matrix2<T> {
        self.w_b * self.grad_a.transpose() * self.c_ab + self.w_a * self.grad_b.transpose() * self.c_ba
    }

    fn divergence(&self) -> T {
        self.c_ab * self.w_b.dot(&self.grad_a) + self.c_ba * self.w_a.dot(&self.grad_b)
    }

    fn curl(&self) -> T {
        self.c_ab * self.grad_a.perp(&self.w_b) + self.c_ba * self.grad_b.perp(&self.w_a)
    }
}

/// A vector-valued finite element space of one of the [`VectorElement`]s on a triangle mesh.
///
/// Local DOF `i` (or `2i`, `2i + 1` for the linear families) belongs to local edge `i`. The
/// global DOFs of edge `e` are `e`, or `2e` and `2e + 1`.
#[derive(Debug)]
pub struct VectorSpace<'a, T: Real, M> {
    mesh: &'a M,
    element: VectorElement,
    geometry: Vec<CellGeometry<T>>,
    cell_dofs: Vec<usize>,
}

impl<'a, T, M> VectorSpace<'a, T, M>
where
    T: Real,
    M: MeshTopology<T>,
{
    pub fn new(mesh: &'a M, family: VectorFamily, degree: usize) -> Result<Self, SpaceError> {
        Self::from_element(mesh, VectorElement::new(family, degree)?)
    }

    pub fn from_element(mesh: &'a M, element: VectorElement) -> Result<Self, SpaceError> {
        let dim = mesh.geometric_dim();
        if dim != 2 {
            return Err(SpaceError::UnsupportedDimension { space: "vector", dim });
        }

        let num_cells = mesh.number_of_cells();
        let per_edge = element.functions_per_edge();
        let mut geometry = Vec::with_capacity(num_cells);
        let mut cell_dofs = Vec::with_capacity(num_cells * 3 * per_edge);
        for cell in 0..num_cells {
            let g = mesh.grad_lambda(cell)?;
            let grad_lambda = [0, 1, 2].map(|i| Vector2::new(g[(i, 0)], g[(i, 1)]));
            let directions = grad_lambda.map(|grad| {
                if element.is_div_conforming() {
                    Vector2::new(grad.y, -grad.x)
                } else {
                    grad
                }
            });
            let edge_signs = mesh.cell_edge_signs(cell);
            let signs = [0, 1, 2].map(|i| edge_signs[i].as_scalar());
            geometry.push(CellGeometry {
                grad_lambda,
                directions,
                signs,
            });
            for &edge in mesh.cell_to_edge(cell) {
                cell_dofs.extend((0..per_edge).map(|j| per_edge * edge + j));
            }
        }

        debug!(
            "Constructed {:?} space with {} global DOFs",
            element,
            per_edge * mesh.number_of_edges()
        );

        Ok(Self {
            mesh,
            element,
            geometry,
            cell_dofs,
        })
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }

    pub fn element(&self) -> VectorElement {
        self.element
    }

    pub fn number_of_local_dofs(&self) -> usize {
        3 * self.element.functions_per_edge()
    }

    pub fn number_of_global_dofs(&self) -> usize {
        self.element.functions_per_edge() * self.mesh.number_of_edges()
    }

    pub fn cell_to_dof(&self, cell: usize) -> &[usize] {
        let n = self.number_of_local_dofs();
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    pub fn array(&self) -> DVector<T> {
        DVector::zeros(self.number_of_global_dofs())
    }

    /// Evaluates `kernel` for every local function in every selected cell at every point.
    fn tabulate<F>(
        &self,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
        shape: ValueShape,
        kernel: F,
    ) -> Result<ValueTable<T>, SpaceError>
    where
        F: Fn(&EdgeTerms<T>, &mut [T]) + Sync + Send,
    {
        check_points(points, 2)?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let per_edge = self.element.functions_per_edge();
        let mut table = ValueTable::zeros(points.nrows(), cells.len(), 3 * per_edge, shape);
        let size = shape.size();
        let geometry = &self.geometry;
        table.par_fill_points(|q, values| {
            let lambda = points.row(q);
            let mut entries = values.chunks_exact_mut(size);
            for &cell in &cells {
                let g = &geometry[cell];
                for i in 0..3 {
                    let (a, b) = ((i + 1) % 3, (i + 2) % 3);
                    for j in 0..per_edge {
                        let (c_ab, c_ba) = if j == 0 {
                            (g.signs[i], -g.signs[i])
                        } else {
                            (T::one(), T::one())
                        };
                        let terms = EdgeTerms {
                            lambda_a: lambda[a],
                            lambda_b: lambda[b],
                            grad_a: g.grad_lambda[a],
                            grad_b: g.grad_lambda[b],
                            w_a: g.directions[a],
                            w_b: g.directions[b],
                            c_ab,
                            c_ba,
                        };
                        let entry = entries.next().expect("Table has one entry per basis function");
                        kernel(&terms, entry);
                    }
                }
            }
        });
        Ok(table)
    }

    /// Basis values, shaped `(points, cells, local DOFs, 2)`.
    pub fn basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        self.tabulate(points, cells, ValueShape::Vector(2), |terms, entry| {
            entry.copy_from_slice(terms.value().as_slice())
        })
    }

    /// Basis Jacobians, shaped `(points, cells, local DOFs, 2, 2)`.
    pub fn grad_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        self.tabulate(points, cells, ValueShape::Tensor(2), |terms, entry| {
            entry.copy_from_slice(terms.gradient().as_slice())
        })
    }

    pub fn div_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        self.tabulate(points, cells, ValueShape::Scalar, |terms, entry| {
            entry[0] = terms.divergence()
        })
    }

    /// The scalar curl `∂_x φ_y - ∂_y φ_x` of the basis.
    pub fn curl_basis(&self, points: &DMatrix<T>, cells: Option<&[usize]>) -> Result<ValueTable<T>, SpaceError> {
        self.tabulate(points, cells, ValueShape::Scalar, |terms, entry| entry[0] = terms.curl())
    }

    fn contract(
        &self,
        uh: &DVector<T>,
        table: impl FnOnce(&[usize]) -> Result<ValueTable<T>, SpaceError>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        check_dof_vector(uh, self.number_of_global_dofs())?;
        let cells = select_cells(cells, self.mesh.number_of_cells())?;
        let table = table(&cells)?;
        let (cell_dofs, ldof) = (&self.cell_dofs, table.num_functions());
        Ok(table.contract(|c, j| uh[cell_dofs[cells[c] * ldof + j]]))
    }

    pub fn value(
        &self,
        uh: &DVector<T>,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        self.contract(uh, |cells| self.basis(points, Some(cells)), cells)
    }

    pub fn div_value(
        &self,
        uh: &DVector<T>,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        self.contract(uh, |cells| self.div_basis(points, Some(cells)), cells)
    }

    pub fn curl_value(
        &self,
        uh: &DVector<T>,
        points: &DMatrix<T>,
        cells: Option<&[usize]>,
    ) -> Result<ValueTable<T>, SpaceError> {
        self.contract(uh, |cells| self.curl_basis(points, Some(cells)), cells)
    }

    /// Interpolates a vector field given in physical coordinates through its edge moments.
    ///
    /// With `ν` the outward unit normal (H(div)) or the unit tangent from `a` to `b` (H(curl)) of
    /// each edge in its first incident cell, the DOFs are `s ∫_e u·ν ds` and, for the linear
    /// families, `∫_e u·ν 3(λ_a - λ_b) ds`. Both are computed with a 3-point Gauss rule, which
    /// is exact for the local polynomial spaces.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn interpolation<F>(&self, f: F) -> Result<DVector<T>, SpaceError>
    where
        F: Fn(&DVector<T>) -> DVector<T>,
    {
        let rule = QuadratureRule::<T>::segment(3).expect("The 3-point Gauss-Legendre rule is always available");
        let per_edge = self.element.functions_per_edge();
        let mut uh = self.array();
        for edge in 0..self.mesh.number_of_edges() {
            let incident = self.mesh.edge_to_cell(edge);
            let (cell, i) = (incident.left, incident.left_local);
            let (a, b) = ((i + 1) % 3, (i + 2) % 3);
            let nodes = self.mesh.cell_nodes(cell);
            let (x_a, x_b) = (self.mesh.node_coords(nodes[a]), self.mesh.node_coords(nodes[b]));
            let length = (&x_b - &x_a).norm();
            let g = &self.geometry[cell];
            let direction = if self.element.is_div_conforming() {
                -g.grad_lambda[i].normalize()
            } else {
                let tangent = (&x_b - &x_a) / length;
                Vector2::new(tangent[0], tangent[1])
            };

            let (mut flux, mut moment) = (0.0, 0.0);
            for (q, &w) in rule.weights().iter().enumerate() {
                let (lambda_a, lambda_b) = (rule.points()[(q, 0)], rule.points()[(q, 1)]);
                let x = &x_a * lambda_a + &x_b * lambda_b;
                let u = f(&x);
                if u.len() != 2 {
                    return Err(SpaceError::FieldShape {
                        expected: (2, 1),
                        found: u.shape(),
                    });
                }
                let normal_component = u[0] * direction.x + u[1] * direction.y;
                flux += w * normal_component;
                moment += w * normal_component * 3.0 * (lambda_a - lambda_b);
            }

            let dofs = &self.cell_to_dof(cell)[per_edge * i..per_edge * (i + 1)];
            uh[dofs[0]] = g.signs[i] * flux * length;
            if per_edge == 2 {
                uh[dofs[1]] = moment * length;
            }
        }

        trace!("Interpolated vector field into {} {:?} DOFs", uh.len(), self.element);
        Ok(uh)
    }
}
