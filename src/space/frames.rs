//! Bases of symmetric tensors aligned with the edges and faces of a mesh.
//!
//! On a face, the tangential-normal block is spanned by `√2 sym(n ⊗ s_1)` and `√2 sym(n ⊗ s_2)`
//! for an orthonormal pair `s_1, s_2` in the plane of the face. The three tensors `sym(n ⊗ t_i)`
//! of the edge tangents only span two dimensions, because the tangents of a triangle are
//! linearly dependent, so they cannot be used together with `t_i t_i^T` and `n n^T`.
use crate::mesh::MeshTopology;
use crate::space::SpaceError;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

/// The number of independent components of a symmetric `dim x dim` tensor.
pub fn tensor_dimension(dim: usize) -> usize {
    dim * (dim + 1) / 2
}

/// The symmetrized outer product `(a b^T + b a^T) / 2`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn symmetric_product<T: Real>(a: &DVector<T>, b: &DVector<T>) -> DMatrix<T> {
    (a * b.transpose() + b * a.transpose()) * 0.5
}

/// The canonical basis of symmetric tensors.
///
/// For the index pairs `(0, 0), (0, 1), ..., (1, 1), ...` (row-major upper triangle), the basis
/// tensor of a diagonal pair `(a, a)` is `E_aa`, and that of an off-diagonal pair `(a, b)` is
/// `E_ab + E_ba`. The coefficient of `S` for the pair `(a, b)` is therefore simply `S[(a, b)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricBasis<T: Real> {
    dim: usize,
    pairs: Vec<(usize, usize)>,
    tensors: Vec<DMatrix<T>>,
}

impl<T: Real> SymmetricBasis<T> {
    pub fn new(dim: usize) -> Self {
        let pairs: Vec<_> = (0..dim).flat_map(|a| (a..dim).map(move |b| (a, b))).collect();
        let tensors = pairs
            .iter()
            .map(|&(a, b)| {
                let mut tensor = DMatrix::zeros(dim, dim);
                tensor[(a, b)] = T::one();
                tensor[(b, a)] = T::one();
                tensor
            })
            .collect();
        Self { dim, pairs, tensors }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn tensor_dim(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn tensor(&self, k: usize) -> &DMatrix<T> {
        &self.tensors[k]
    }

    /// Canonical coefficients of a symmetric tensor.
    pub fn coefficients(&self, tensor: &DMatrix<T>) -> DVector<T> {
        DVector::from_iterator(self.pairs.len(), self.pairs.iter().map(|&(a, b)| tensor[(a, b)]))
    }

    pub fn tensor_from_coefficients(&self, coefficients: &[T]) -> DMatrix<T> {
        let mut tensor = DMatrix::zeros(self.dim, self.dim);
        for (basis_tensor, &c) in self.tensors.iter().zip(coefficients) {
            tensor += basis_tensor * c;
        }
        tensor
    }
}

/// A basis `S_0, ..., S_{tdim - 1}` of symmetric tensors together with its dual basis.
///
/// The dual tensors satisfy `D_k : S_l = δ_kl` under the Frobenius inner product.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorFrame<T: Real> {
    coefficients: DMatrix<T>,
    tensors: Vec<DMatrix<T>>,
    duals: Vec<DMatrix<T>>,
}

impl<T: Real> TensorFrame<T> {
    /// Returns `None` if the tensors are linearly dependent.
    fn from_tensors(tensors: Vec<DMatrix<T>>, basis: &SymmetricBasis<T>) -> Option<Self> {
        let n = tensors.len();
        let gram = DMatrix::from_fn(n, n, |k, l| tensors[k].dot(&tensors[l]));
        let gram_inverse = gram.try_inverse()?;
        let duals = (0..n)
            .map(|k| {
                let mut dual = DMatrix::zeros(basis.dim(), basis.dim());
                for (l, tensor) in tensors.iter().enumerate() {
                    dual += tensor * gram_inverse[(k, l)];
                }
                dual
            })
            .collect();
        let mut coefficients = DMatrix::zeros(n, basis.tensor_dim());
        for (k, tensor) in tensors.iter().enumerate() {
            coefficients.set_row(k, &basis.coefficients(tensor).transpose());
        }
        Some(Self {
            coefficients,
            tensors,
            duals,
        })
    }

    /// The canonical coefficients of the frame tensors, one tensor per row.
    pub fn coefficients(&self) -> &DMatrix<T> {
        &self.coefficients
    }

    pub fn tensor(&self, k: usize) -> &DMatrix<T> {
        &self.tensors[k]
    }

    pub fn dual(&self, k: usize) -> &DMatrix<T> {
        &self.duals[k]
    }

    /// The coordinates of a symmetric tensor with respect to the frame.
    pub fn coordinates(&self, tensor: &DMatrix<T>) -> DVector<T> {
        DVector::from_iterator(self.duals.len(), self.duals.iter().map(|dual| dual.dot(tensor)))
    }
}

/// Tensor frames for every edge, and in 3D every face, of a mesh.
///
/// The frame of an edge with unit tangent `t` is built from an orthonormal completion
/// `f_0 = t, f_1, ...` of the tangent: for each canonical pair `(j, k)` it contains
/// `sym(f_j ⊗ f_k)`, scaled by `√2` when `j != k`. The frame is orthonormal, and its first
/// tensor `t t^T` carries the tangential-tangential component.
///
/// The frame of a face with unit normal `n` and edges `e_0, e_1, e_2` consists of the three
/// tangential tensors `t_i t_i^T` of its edges followed by `n n^T`, `√2 sym(n ⊗ s_1)` and
/// `√2 sym(n ⊗ s_2)`, where `s_1 = t_0` and `s_2 = n × s_1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorFrames<T: Real> {
    basis: SymmetricBasis<T>,
    edges: Vec<TensorFrame<T>>,
    faces: Vec<TensorFrame<T>>,
}

impl<T: Real> TensorFrames<T> {
    pub fn new<M>(mesh: &M) -> Result<Self, SpaceError>
    where
        M: MeshTopology<T> + ?Sized,
    {
        let dim = mesh.geometric_dim();
        if !(2..=3).contains(&dim) {
            return Err(SpaceError::UnsupportedDimension {
                space: "tensor frame",
                dim,
            });
        }

        let basis = SymmetricBasis::new(dim);
        let tangents: Vec<_> = (0..mesh.number_of_edges())
            .map(|edge| mesh.edge_unit_tangent(edge))
            .collect();
        let edges = tangents
            .iter()
            .map(|tangent| edge_frame(tangent, &basis))
            .collect();

        let faces = if dim == 3 {
            (0..mesh.number_of_faces())
                .map(|face| {
                    let tangents = mesh.face_to_edge(face).map(|edge| &tangents[edge]);
                    face_frame(&mesh.face_unit_normal(face), tangents, &basis)
                        .ok_or(SpaceError::DegenerateFrame { face })
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        Ok(Self { basis, edges, faces })
    }

    pub fn basis(&self) -> &SymmetricBasis<T> {
        &self.basis
    }

    pub fn edge(&self, edge: usize) -> &TensorFrame<T> {
        &self.edges[edge]
    }

    pub fn face(&self, face: usize) -> &TensorFrame<T> {
        &self.faces[face]
    }

    pub fn edge_frames(&self) -> &[TensorFrame<T>] {
        &self.edges
    }

    pub fn face_frames(&self) -> &[TensorFrame<T>] {
        &self.faces
    }
}

/// Completes a unit vector to an orthonormal basis whose first vector is `t`.
fn orthonormal_completion<T: Real>(t: &DVector<T>) -> Vec<DVector<T>> {
    // The eigenvectors of t t^T are the right singular vectors of t seen as a 1 x d matrix
    let eigen = (t * t.transpose()).symmetric_eigen();
    let dominant = eigen.eigenvalues.imax();
    let mut frame = vec![t.clone()];
    frame.extend(
        (0..t.len())
            .filter(|&i| i != dominant)
            .map(|i| eigen.eigenvectors.column(i).into_owned()),
    );
    frame
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn edge_frame<T: Real>(tangent: &DVector<T>, basis: &SymmetricBasis<T>) -> TensorFrame<T> {
    let frame = orthonormal_completion(tangent);
    let tensors = basis
        .pairs()
        .iter()
        .map(|&(j, k)| {
            let product = symmetric_product(&frame[j], &frame[k]);
            if j == k {
                product
            } else {
                product * T::sqrt(2.0)
            }
        })
        .collect();
    TensorFrame::from_tensors(tensors, basis).expect("An orthonormal frame is never singular")
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn face_frame<T: Real>(
    normal: &DVector<T>,
    edge_tangents: [&DVector<T>; 3],
    basis: &SymmetricBasis<T>,
) -> Option<TensorFrame<T>> {
    let s1 = edge_tangents[0].clone();
    let s2 = normal.cross(&s1);
    let mut tensors: Vec<_> = edge_tangents
        .iter()
        .map(|&t| symmetric_product(t, t))
        .collect();
    tensors.push(symmetric_product(normal, normal));
    tensors.push(symmetric_product(normal, &s1) * T::sqrt(2.0));
    tensors.push(symmetric_product(normal, &s2) * T::sqrt(2.0));
    TensorFrame::from_tensors(tensors, basis)
}
