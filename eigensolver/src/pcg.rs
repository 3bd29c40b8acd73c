//! Band-by-band preconditioned conjugate gradient with a final subspace
//! rotation. Each band minimizes its Rayleigh quotient in the complement of
//! the lower bands.

use crate::*;
use dwconsts::*;

pub struct EigenSolverPCG {}

impl EigenSolverPCG {
    pub fn new() -> EigenSolverPCG {
        EigenSolverPCG {}
    }
}

impl Default for EigenSolverPCG {
    fn default() -> Self {
        EigenSolverPCG::new()
    }
}

// single-vector application through the block interface
fn apply_one(ham_on_psi: &HamOnPsi, v: &[c64], hv: &mut [c64]) {
    let vin = Matrix::from_column_slice(v.len(), 1, v);
    let mut vout = Matrix::<c64>::new(v.len(), 1);

    ham_on_psi(&vin, &mut vout);

    hv.copy_from_slice(vout.get_col(0));
}

impl EigenSolver for EigenSolverPCG {
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

        // work space
        let mut h_x0 = vec![c64::zero(); npw];
        let mut d0 = vec![c64::zero(); npw];
        let mut h_d0 = vec![c64::zero(); npw];
        let mut g1 = vec![c64::zero(); npw];
        let mut pg0 = vec![c64::zero(); npw];
        let mut pg1 = vec![c64::zero(); npw];
        let mut g0 = vec![c64::zero(); npw];

        // orthonormal starting block

        let mut start: Vec<Vec<c64>> = Vec::with_capacity(nband);

        for iband in 0..nband {
            let mut v = evecs.get_col(iband).to_vec();
            let norm0 = utility::vec_norm(&v);

            orthogonalize(&start, &mut v);

            if normalize_or_drop(&mut v, norm0).is_none() {
                return Err(EigenSolverError::BlockCollapsed { rank: iband, nband });
            }

            start.push(v);
        }

        let mut lower: Vec<Vec<c64>> = Vec::with_capacity(nband);

        for (iband, mut x0) in start.into_iter().enumerate() {
            // orthogonalize to the converged lower bands and normalize

            orthogonalize(&lower, &mut x0);

            if normalize_or_drop(&mut x0, 1.0).is_none() {
                return Err(EigenSolverError::BlockCollapsed { rank: iband, nband });
            }

            apply_one(ham_on_psi, &x0, &mut h_x0);
            stats.n_hpsi += 1;

            let mut omega = utility::zdot_product(&x0, &h_x0).re;

            for cg_iter in 0..max_iter {
                // gradient

                for i in 0..npw {
                    g1[i] = h_x0[i] - omega * x0[i];
                }

                orthogonalize(&lower, &mut g1);

                // headroom for the residual parts along the lower bands
                if utility::vec_norm(&g1) < 0.5 * tol {
                    break;
                }

                stats.n_iter = stats.n_iter.max(cg_iter + 1);

                precond.apply(&x0, &g1, &mut pg1);

                orthogonalize(&lower, &mut pg1);

                utility::normalize_vector_c64(&mut pg1);

                // Polak-Ribiere
                let beta = if cg_iter == 0 {
                    0.0
                } else {
                    let num: c64 = g1.iter().zip(pg1.iter().zip(pg0.iter())).map(|(g, (p1, p0))| g * (p1 - p0).conj()).sum();
                    let den = utility::zdot_product(&pg0, &g0);

                    if den.norm() > EPS20 {
                        (num / den).re.max(0.0)
                    } else {
                        0.0
                    }
                };

                for i in 0..npw {
                    d0[i] = -pg1[i] + beta * d0[i];
                }

                let proj = utility::zdot_product(&x0, &d0);

                utility::add_and_zscale(&x0, &mut d0, -proj); // d0 = d0 - proj*x0

                orthogonalize(&lower, &mut d0);

                if utility::vec_norm(&d0) < EPS14 {
                    break;
                }

                utility::normalize_vector_c64(&mut d0);

                apply_one(ham_on_psi, &d0, &mut h_d0);
                stats.n_hpsi += 1;

                // exact line minimization in span{x0, d0}
                let (cs, sn) = get_rotation(&x0, &d0, &h_x0, &h_d0)?;

                for i in 0..npw {
                    x0[i] = cs * x0[i] + sn * d0[i];
                    h_x0[i] = cs * h_x0[i] + sn * h_d0[i];
                }

                omega = utility::zdot_product(&x0, &h_x0).re;

                if !omega.is_finite() {
                    return Err(EigenSolverError::NonFinite { iteration: cg_iter + 1 });
                }

                pg0.copy_from_slice(&pg1);
                g0.copy_from_slice(&g1);
            }

            lower.push(x0);
        }

        // subspace rotation: bands come out ordered and Ritz-diagonal

        let x = Matrix::from_columns(npw, &lower);
        let mut hx = Matrix::<c64>::new(npw, nband);

        ham_on_psi(&x, &mut hx);
        stats.n_hpsi += nband;

        let (theta, c) = rayleigh_ritz(&x, &hx)?;

        let x = x.dot(&c);
        let hx = hx.dot(&c);

        let (_, rnorm) = residuals(&x, &hx, &theta);

        stats.max_residual = rnorm.iter().cloned().fold(0.0, f64::max);
        stats.n_band_converged = rnorm.iter().filter(|&&n| n < tol).count();
        stats.converged = stats.n_band_converged == nband;

        evals.copy_from_slice(&theta);
        *evecs = x;

        Ok(stats)
    }
}

/// Coefficients (c_x, c_d) of the unit vector c_x x0 + c_d d0 minimizing the
/// Rayleigh quotient in span{x0, d0}, from the lowest eigenvector of the
/// 2x2 pencil. c_x is real and non-negative, so the band keeps its phase
/// and the carried conjugate direction matches the new gradient.
pub fn get_rotation(x0: &[c64], d0: &[c64], h_x0: &[c64], h_d0: &[c64]) -> Result<(c64, c64), EigenSolverError> {
    let mut mh: Matrix<c64> = Matrix::new(2, 2);
    let mut mo: Matrix<c64> = Matrix::new(2, 2);

    mh[[0, 0]] = utility::zdot_product(x0, h_x0);
    mh[[0, 1]] = utility::zdot_product(x0, h_d0);
    mh[[1, 0]] = utility::zdot_product(d0, h_x0);
    mh[[1, 1]] = utility::zdot_product(d0, h_d0);

    mo[[0, 0]] = utility::zdot_product(x0, x0);
    mo[[0, 1]] = utility::zdot_product(x0, d0);
    mo[[1, 0]] = utility::zdot_product(d0, x0);
    mo[[1, 1]] = utility::zdot_product(d0, d0);

    mh.hermitize();

    // x0 and d0 are orthonormal up to round-off
    mo.pinv();

    let mut oinvh = mo.dot(&mh);
    oinvh.hermitize();

    let (_es, ev) = linalg::eigh(&oinvh)?;

    let ev0 = ev.get_col(0);

    let norm = (ev0[0].norm_sqr() + ev0[1].norm_sqr()).sqrt();

    let cx = ev0[0].norm();

    let phase = if cx > 0.0 { ev0[0].conj() / cx } else { c64::new(1.0, 0.0) };

    Ok((c64::new(cx / norm, 0.0), ev0[1] * phase / norm))
}
