mod lobpcg;
pub use lobpcg::*;

mod pcg;
pub use pcg::*;

use linalg::EighError;
use matrix::Matrix;
use num_traits::Zero;
use preconditioner::Preconditioner;
use serde::Deserialize;
use std::fmt;
use types::c64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EigenSolverScheme {
    Lobpcg,
    Pcg,
}

impl Default for EigenSolverScheme {
    fn default() -> Self {
        EigenSolverScheme::Lobpcg
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EigenSolverError {
    TooManyBands { nband: usize, npw: usize },
    BlockCollapsed { rank: usize, nband: usize },
    Subspace(EighError),
    NonFinite { iteration: usize },
}

impl fmt::Display for EigenSolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EigenSolverError::TooManyBands { nband, npw } => {
                write!(f, "{} bands requested from a basis of {} plane waves", nband, npw)
            }
            EigenSolverError::BlockCollapsed { rank, nband } => {
                write!(f, "trial block collapsed to rank {} of {}", rank, nband)
            }
            EigenSolverError::Subspace(e) => write!(f, "Rayleigh-Ritz failed: {}", e),
            EigenSolverError::NonFinite { iteration } => {
                write!(f, "non-finite Ritz values at eigensolver iteration {}", iteration)
            }
        }
    }
}

impl std::error::Error for EigenSolverError {}

impl From<EighError> for EigenSolverError {
    fn from(e: EighError) -> Self {
        EigenSolverError::Subspace(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EigenSolverStats {
    /// every band below the residual tolerance
    pub converged: bool,
    pub n_iter: usize,
    pub n_hpsi: usize,
    pub n_band_converged: usize,
    pub max_residual: f64,
}

/// Block Hamiltonian application, out = H in.
pub type HamOnPsi<'a> = dyn Fn(&Matrix<c64>, &mut Matrix<c64>) + 'a;

pub trait EigenSolver: Send + Sync {
    /// Lowest `evecs.ncol()` eigenpairs. `evecs` holds the trial block on
    /// input and orthonormal eigenvectors on output, `evals` ascends.
    /// Running out of iterations is reported in the stats, not as an error.
    fn compute(
        &self,
        ham_on_psi: &HamOnPsi,
        precond: &dyn Preconditioner,
        evecs: &mut Matrix<c64>,
        evals: &mut [f64],
        tol: f64,
        max_iter: usize,
    ) -> Result<EigenSolverStats, EigenSolverError>;
}

pub fn new(scheme: EigenSolverScheme) -> Box<dyn EigenSolver> {
    match scheme {
        EigenSolverScheme::Lobpcg => Box::new(EigenSolverLOBPCG::new()),
        EigenSolverScheme::Pcg => Box::new(EigenSolverPCG::new()),
    }
}

// Below this relative norm a direction is treated as linearly dependent.
const DROP_TOL: f64 = 1e-8;

/// v -= sum_j <b_j|v> b_j over orthonormal `basis`, two passes; returns the
/// accumulated coefficients so images under H can follow.
fn orthogonalize(basis: &[Vec<c64>], v: &mut [c64]) -> Vec<c64> {
    let mut coef = vec![c64::zero(); basis.len()];

    for _ in 0..2 {
        for (c, b) in coef.iter_mut().zip(basis.iter()) {
            let proj = utility::zdot_product(b, v);

            utility::add_and_zscale(b, v, -proj);

            *c += proj;
        }
    }

    coef
}

fn subtract_images(hbasis: &[Vec<c64>], coef: &[c64], hv: &mut [c64]) {
    for (hb, c) in hbasis.iter().zip(coef.iter()) {
        utility::add_and_zscale(hb, hv, -c);
    }
}

/// Normalizes `v` after orthogonalization; None when less than DROP_TOL of
/// its original norm `norm0` survived.
fn normalize_or_drop(v: &mut [c64], norm0: f64) -> Option<f64> {
    let norm = utility::vec_norm(v);

    if norm0 > 0.0 && norm > DROP_TOL * norm0 && norm.is_finite() {
        v.iter_mut().for_each(|x| *x /= norm);
        Some(norm)
    } else {
        None
    }
}

/// Residual norms |H x - lambda x| per column.
fn residuals(x: &Matrix<c64>, hx: &Matrix<c64>, lambda: &[f64]) -> (Matrix<c64>, Vec<f64>) {
    let mut r = hx.clone();

    for (ib, &lam) in lambda.iter().enumerate() {
        utility::add_and_scale(x.get_col(ib), r.get_mut_col(ib), -lam);
    }

    let norms = (0..r.ncol()).map(|ib| utility::vec_norm(r.get_col(ib))).collect();

    (r, norms)
}

/// Rayleigh-Ritz of H on the orthonormal columns of `s` with images `hs`;
/// returns all Ritz values (ascending) and the coefficient matrix.
fn rayleigh_ritz(s: &Matrix<c64>, hs: &Matrix<c64>) -> Result<(Vec<f64>, Matrix<c64>), EigenSolverError> {
    let mut shs = s.adjoint_dot(hs);

    shs.hermitize();

    Ok(linalg::eigh(&shs)?)
}
