use matrix::Matrix;
use nalgebra::{DMatrix, SymmetricEigen};
use std::fmt;
use types::c64;

#[derive(Debug, Clone, PartialEq)]
pub struct EighError {
    pub dim: usize,
}

impl fmt::Display for EighError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "hermitian eigendecomposition of a {}x{} matrix did not converge",
            self.dim, self.dim
        )
    }
}

impl std::error::Error for EighError {}

/// Eigendecomposition of a Hermitian matrix. Eigenvalues are returned in
/// ascending order with the eigenvectors as the matching columns.
pub fn eigh(mat: &Matrix<c64>) -> Result<(Vec<f64>, Matrix<c64>), EighError> {
    let n = mat.nrow();
    assert_eq!(n, mat.ncol(), "eigh requires a square matrix");

    let a = DMatrix::<c64>::from_column_slice(n, n, mat.as_slice());

    let eig = SymmetricEigen::try_new(a, f64::EPSILON, 0).ok_or(EighError { dim: n })?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let eigval: Vec<f64> = order.iter().map(|&i| eig.eigenvalues[i]).collect();

    let mut eigvec = Matrix::<c64>::new(n, n);

    for (jnew, &jold) in order.iter().enumerate() {
        for i in 0..n {
            eigvec[[i, jnew]] = eig.eigenvectors[(i, jold)];
        }
    }

    Ok((eigval, eigvec))
}
