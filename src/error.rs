//! Functionality for error estimation.
use crate::mesh::MeshTopology;
use crate::quadrature::QuadratureRule;
use crate::space::{HuZhangSpace, ScalarElementSpace, SpaceError, VectorSpace};
use crate::table::ValueTable;
use crate::Real;
use eyre::WrapErr;
use nalgebra::{DMatrix, DVector};

/// Sums `|K| Σ_q w_q e(q, c)` over all cells, where `e` is the squared pointwise error.
fn integrate_squared_error<T, M>(
    mesh: &M,
    rule: &QuadratureRule<T>,
    mut pointwise: impl FnMut(usize, usize, &DVector<T>) -> Result<T, SpaceError>,
) -> Result<T, SpaceError>
where
    T: Real,
    M: MeshTopology<T>,
{
    let mut result = T::zero();
    for cell in 0..mesh.number_of_cells() {
        let mut cell_error = T::zero();
        for (q, &w) in rule.weights().iter().enumerate() {
            let bary: Vec<T> = rule.points().row(q).iter().copied().collect();
            let x = mesh.bary_to_physical(cell, &bary);
            cell_error += w * pointwise(q, cell, &x)?;
        }
        result += mesh.cell_measure(cell) * cell_error;
    }
    Ok(result)
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ of a symmetric tensor field, measured in the
/// Frobenius norm, with the given quadrature rule on every cell.
#[allow(non_snake_case)]
pub fn estimate_tensor_L2_error<T, M, S>(
    space: &HuZhangSpace<'_, T, M, S>,
    u_h: &DVector<T>,
    u: impl Fn(&DVector<T>) -> DMatrix<T>,
    rule: &QuadratureRule<T>,
) -> eyre::Result<T>
where
    T: Real,
    M: MeshTopology<T>,
    S: ScalarElementSpace<T>,
{
    let dim = space.geometric_dim();
    let values: ValueTable<T> = space
        .value(u_h, rule.points(), None)
        .wrap_err("failed to evaluate discrete tensor field")?;
    let squared = integrate_squared_error(space.mesh(), rule, |q, cell, x| {
        let exact = u(x);
        if exact.shape() != (dim, dim) {
            return Err(SpaceError::FieldShape {
                expected: (dim, dim),
                found: exact.shape(),
            });
        }
        Ok((values.matrix(q, cell, 0) - exact).norm_squared())
    })
    .wrap_err("failed to integrate tensor error")?;
    Ok(squared.sqrt())
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ of a vector field with the given quadrature
/// rule on every cell.
#[allow(non_snake_case)]
pub fn estimate_vector_L2_error<T, M>(
    space: &VectorSpace<'_, T, M>,
    u_h: &DVector<T>,
    u: impl Fn(&DVector<T>) -> DVector<T>,
    rule: &QuadratureRule<T>,
) -> eyre::Result<T>
where
    T: Real,
    M: MeshTopology<T>,
{
    let values = space
        .value(u_h, rule.points(), None)
        .wrap_err("failed to evaluate discrete vector field")?;
    let squared = integrate_squared_error(space.mesh(), rule, |q, cell, x| {
        let exact = u(x);
        if exact.len() != 2 {
            return Err(SpaceError::FieldShape {
                expected: (2, 1),
                found: exact.shape(),
            });
        }
        Ok((values.vector(q, cell, 0) - exact).norm_squared())
    })
    .wrap_err("failed to integrate vector error")?;
    Ok(squared.sqrt())
}
