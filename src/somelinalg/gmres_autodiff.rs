//! Jacobians of systems of AD nodes and a GMRES solve driven by them.
//!
//! Every equation of the system is a node built from the same independent variables,
//! so row i of the Jacobian is the gradient of equation i. For a linear system
//! A x the Jacobian is A itself, which is how `gmres_autodiff` solves A x = b without
//! ever being handed A.
//!
//! Example#
//! ```
//! use RustedAutoDiff::autodiff::ad_variable::Variable;
//! use RustedAutoDiff::somelinalg::gmres_autodiff::gmres_autodiff;
//! use nalgebra::DVector;
//! let x1 = Variable::new(1.0, "x1");
//! let x2 = Variable::new(1.0, "x2");
//! let system = vec![2.0 * &x1 + &x2, &x1 + 3.0 * &x2];
//! let b = DVector::from_vec(vec![3.0, 4.0]);
//! let x = gmres_autodiff(&system, &["x1", "x2"], &b, 1e-10, 100).unwrap();
//! assert!((x[0] - 1.0).abs() < 1e-8 && (x[1] - 1.0).abs() < 1e-8);
//! ```
use crate::autodiff::ad_errors::{AdError, AdResult};
use crate::autodiff::ad_variable::Variable;
use faer::mat::Mat;
use faer::sparse::{SparseColMat, Triplet};
use faer_gmres::gmres;
use log::{debug, error, info};
use nalgebra::{DMatrix, DVector};
use std::error::Error;

/// J[(i, j)] = d(system[i])/d(names[j]) at the (single) evaluation point of the system
pub fn jacobian(system: &[Variable], names: &[&str]) -> AdResult<DMatrix<f64>> {
    if let Some((i, eq)) = system.iter().enumerate().find(|(_, eq)| eq.len() != 1) {
        return Err(AdError::ShapeError(format!(
            "equation {} holds {} evaluation points, the Jacobian needs exactly one",
            i,
            eq.len()
        )));
    }
    Ok(DMatrix::from_fn(system.len(), names.len(), |i, j| {
        system[i].partial(names[j])[0]
    }))
}

/// p -> J p, the Jacobian-vector product of the system
pub fn jacobian_action(
    system: &[Variable],
    names: &[&str],
) -> AdResult<impl Fn(&DVector<f64>) -> DVector<f64> + use<>> {
    let J = jacobian(system, names)?;
    Ok(move |p: &DVector<f64>| &J * p)
}

/// rows of A as AD equations sum_j A[(i, j)] * names[j], each variable set to 1
pub fn linear_system_from_matrix(A: &DMatrix<f64>, names: &[&str]) -> AdResult<Vec<Variable>> {
    if A.ncols() != names.len() {
        return Err(AdError::ShapeError(format!(
            "matrix has {} columns but {} variables were given",
            A.ncols(),
            names.len()
        )));
    }
    let x: Vec<Variable> = names.iter().map(|name| Variable::new(1.0, name)).collect();
    A.row_iter()
        .map(|row| {
            row.iter()
                .zip(x.iter())
                .try_fold(Variable::constant(0.0), |acc, (a, xj)| {
                    acc.try_add(xj.try_mul(*a)?)
                })
        })
        .collect()
}

pub fn dense_to_sparse(dense: &DMatrix<f64>) -> Result<SparseColMat<usize, f64>, Box<dyn Error>> {
    let (nrows, ncols) = dense.shape();
    let mut vec_of_triplets: Vec<Triplet<usize, usize, f64>> = Vec::new();
    for i in 0..nrows {
        for j in 0..ncols {
            let value = dense[(i, j)];
            if value != 0.0 {
                vec_of_triplets.push(Triplet::new(i, j, value));
            }
        }
    }
    SparseColMat::<usize, f64>::try_new_from_triplets(nrows, ncols, &vec_of_triplets)
        .map_err(|e| format!("failed to build sparse matrix: {:?}", e).into())
}

/// Solves J x = b by GMRES, J being the Jacobian of `system` with respect to `names`.
pub fn gmres_autodiff(
    system: &[Variable],
    names: &[&str],
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
) -> Result<DVector<f64>, Box<dyn Error>> {
    let J = jacobian(system, names)?;
    let (n, m) = J.shape();
    if n != m || n != b.len() {
        return Err(format!(
            "GMRES needs a square system: jacobian {}x{}, rhs of length {}",
            n,
            m,
            b.len()
        )
        .into());
    }
    debug!("jacobian of the system: {}", J);
    let sparse = dense_to_sparse(&J)?;
    let rhs: Mat<f64> = Mat::from_fn(n, 1, |i, _| b[i]);
    let mut x: Mat<f64> = Mat::<f64>::zeros(n, 1);
    match gmres(sparse.as_ref(), rhs.as_ref(), x.as_mut(), max_iter, tol, None) {
        Ok((err, iters)) => {
            info!("GMRES finished in {} iterations, residual {}", iters, err);
            let solution = DVector::from_fn(n, |i, _| x[(i, 0)]);
            let residual = (&J * &solution - b).norm();
            if !residual.is_finite() || residual > tol * b.norm().max(1.0) * 1e3 {
                error!("GMRES did not converge, residual {}", residual);
                return Err(format!("GMRES did not converge, residual {}", residual).into());
            }
            Ok(solution)
        }
        Err(e) => {
            error!("Error while solving linear system: {:?}", e);
            Err(format!("GMRES failed: {:?}", e).into())
        }
    }
}
