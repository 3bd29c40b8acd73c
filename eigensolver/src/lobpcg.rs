//! Locally optimal block preconditioned conjugate gradient.
//!
//! Each step searches span{X, P, W}: the current Ritz vectors, the previous
//! conjugate directions and the preconditioned residuals of the bands that
//! are not yet converged. The search basis is made orthonormal by
//! Gram-Schmidt, dropping directions that are numerically dependent, so the
//! projected problem is a standard Hermitian one.

use crate::*;
use log::debug;

pub struct EigenSolverLOBPCG {}

impl EigenSolverLOBPCG {
    pub fn new() -> EigenSolverLOBPCG {
        EigenSolverLOBPCG {}
    }
}

impl Default for EigenSolverLOBPCG {
    fn default() -> Self {
        EigenSolverLOBPCG::new()
    }
}

impl EigenSolver for EigenSolverLOBPCG {
    fn compute(
        &self,
        ham_on_psi: &HamOnPsi,
        precond: &dyn Preconditioner,
        evecs: &mut Matrix<c64>,
        evals: &mut [f64],
        tol: f64,
        max_iter: usize,
    ) -> Result<EigenSolverStats, EigenSolverError> {
        let npw = evecs.nrow();
        let nband = evecs.ncol();

        assert_eq!(evals.len(), nband);

        if nband > npw {
            return Err(EigenSolverError::TooManyBands { nband, npw });
        }

        let mut stats = EigenSolverStats::default();

        // orthonormal starting block

        let mut xcols: Vec<Vec<c64>> = Vec::with_capacity(nband);

        for ib in 0..nband {
            let mut v = evecs.get_col(ib).to_vec();
            let norm0 = utility::vec_norm(&v);

            orthogonalize(&xcols, &mut v);

            if normalize_or_drop(&mut v, norm0).is_some() {
                xcols.push(v);
            }
        }

        if xcols.len() < nband {
            return Err(EigenSolverError::BlockCollapsed {
                rank: xcols.len(),
                nband,
            });
        }

        let mut x = Matrix::from_columns(npw, &xcols);
        let mut hx = Matrix::<c64>::new(npw, nband);

        ham_on_psi(&x, &mut hx);
        stats.n_hpsi += nband;

        // Rayleigh-Ritz in the starting block

        let (theta, c) = rayleigh_ritz(&x, &hx)?;

        x = x.dot(&c);
        hx = hx.dot(&c);

        let mut lambda = theta;

        let mut p: Option<(Matrix<c64>, Matrix<c64>)> = None;

        let mut iter = 0;

        loop {
            let (r, rnorm) = residuals(&x, &hx, &lambda);

            stats.max_residual = rnorm.iter().cloned().fold(0.0, f64::max);
            stats.n_band_converged = rnorm.iter().filter(|&&n| n < tol).count();

            if !stats.max_residual.is_finite() {
                return Err(EigenSolverError::NonFinite { iteration: iter });
            }

            if stats.n_band_converged == nband {
                stats.converged = true;
                break;
            }

            if iter >= max_iter {
                break;
            }

            iter += 1;

            let active: Vec<usize> = (0..nband).filter(|&ib| rnorm[ib] >= tol).collect();

            // X, then P, are kept together with their images under H

            let mut basis: Vec<Vec<c64>> = (0..nband).map(|ib| x.get_col(ib).to_vec()).collect();
            let mut hbasis: Vec<Vec<c64>> = (0..nband).map(|ib| hx.get_col(ib).to_vec()).collect();

            if let Some((pm, hpm)) = p.as_ref() {
                for ip in 0..pm.ncol() {
                    let mut v = pm.get_col(ip).to_vec();
                    let mut hv = hpm.get_col(ip).to_vec();
                    let norm0 = utility::vec_norm(&v);

                    let coef = orthogonalize(&basis, &mut v);

                    subtract_images(&hbasis, &coef, &mut hv);

                    if let Some(norm) = normalize_or_drop(&mut v, norm0) {
                        hv.iter_mut().for_each(|y| *y /= norm);

                        basis.push(v);
                        hbasis.push(hv);
                    }
                }
            }

            // preconditioned residuals of the active bands

            let mut wcols: Vec<Vec<c64>> = Vec::with_capacity(active.len());

            for &ib in active.iter() {
                let mut w = vec![c64::zero(); npw];

                precond.apply(x.get_col(ib), r.get_col(ib), &mut w);

                let norm0 = utility::vec_norm(&w);

                orthogonalize(&basis, &mut w);
                orthogonalize(&wcols, &mut w);

                if normalize_or_drop(&mut w, norm0).is_some() {
                    wcols.push(w);
                }
            }

            if wcols.is_empty() {
                debug!("lobpcg: no new search directions at iteration {}", iter);
                break;
            }

            let w = Matrix::from_columns(npw, &wcols);
            let mut hw = Matrix::<c64>::new(npw, w.ncol());

            ham_on_psi(&w, &mut hw);
            stats.n_hpsi += w.ncol();

            let s = Matrix::hstack(&[&Matrix::from_columns(npw, &basis), &w]);
            let hs = Matrix::hstack(&[&Matrix::from_columns(npw, &hbasis), &hw]);

            let (theta, c) = rayleigh_ritz(&s, &hs)?;

            if theta.iter().take(nband).any(|t| !t.is_finite()) {
                return Err(EigenSolverError::NonFinite { iteration: iter });
            }

            let cx = c.columns(0, nband);

            // new conjugate directions: the P and W components of the update

            let ns = s.ncol();

            let c_pw = cx.rows(nband, ns - nband);
            let s_pw = s.columns(nband, ns - nband);
            let hs_pw = hs.columns(nband, ns - nband);

            p = Some((s_pw.dot(&c_pw), hs_pw.dot(&c_pw)));

            x = s.dot(&cx);
            hx = hs.dot(&cx);

            lambda = theta[..nband].to_vec();

            // keep X orthonormal against slow drift
            if x.adjoint_dot(&x).max_deviation_from_identity() > DROP_TOL {
                reorthonormalize(&mut x, &mut hx)?;
            }
        }

        stats.n_iter = iter;

        evals.copy_from_slice(&lambda);
        *evecs = x;

        Ok(stats)
    }
}

fn reorthonormalize(x: &mut Matrix<c64>, hx: &mut Matrix<c64>) -> Result<(), EigenSolverError> {
    let npw = x.nrow();
    let nband = x.ncol();

    let mut xcols: Vec<Vec<c64>> = Vec::with_capacity(nband);
    let mut hxcols: Vec<Vec<c64>> = Vec::with_capacity(nband);

    for ib in 0..nband {
        let mut v = x.get_col(ib).to_vec();
        let mut hv = hx.get_col(ib).to_vec();
        let norm0 = utility::vec_norm(&v);

        let coef = orthogonalize(&xcols, &mut v);

        subtract_images(&hxcols, &coef, &mut hv);

        match normalize_or_drop(&mut v, norm0) {
            Some(norm) => {
                hv.iter_mut().for_each(|y| *y /= norm);
                xcols.push(v);
                hxcols.push(hv);
            }
            None => {
                return Err(EigenSolverError::BlockCollapsed {
                    rank: xcols.len(),
                    nband,
                })
            }
        }
    }

    *x = Matrix::from_columns(npw, &xcols);
    *hx = Matrix::from_columns(npw, &hxcols);

    Ok(())
}
