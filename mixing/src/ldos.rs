use crate::*;
use dwconsts::*;
use log::warn;
use num_traits::Zero;

const MAX_CG_ITER: usize = 200;
const CG_TOL: f64 = 1E-8;
// Above this the direction is rejected rather than used approximately.
const CG_REJECT: f64 = 1E-2;

/// Model dielectric mixing with a local susceptibility -LDOS(r):
/// (G^2 + 4 pi LDOS(r)) drho = beta G^2 R, solved by preconditioned CG on
/// the density sphere. A uniform LDOS reduces to Kerker with
/// k0^2 = 4 pi LDOS; a zero LDOS (insulator) to simple mixing.
pub struct MixingLDOS {
    beta: f64,
}

impl MixingLDOS {
    pub fn new(beta: f64) -> MixingLDOS {
        MixingLDOS { beta }
    }
}

impl Mixing for MixingLDOS {
    fn get_name(&self) -> &'static str {
        "ldos"
    }

    fn precondition_residual(&self, ctx: &MixingContext, residual: &[c64]) -> Result<Vec<c64>, MixingError> {
        let ldos_3d = ctx.ldos_3d.ok_or(MixingError::MissingLdos)?;

        let lr: Vec<f64> = ldos_3d.as_slice().iter().map(|x| FOURPI * x.re.max(0.0)).collect();

        let lmean = lr.iter().sum::<f64>() / lr.len() as f64;

        if lmean < EPS12 {
            return Ok(residual.iter().map(|r| r * self.beta).collect());
        }

        let g2: Vec<f64> = ctx.gs.iter().map(|g| g * g).collect();

        let rhs: Vec<c64> = multizip((residual.iter(), g2.iter())).map(|(r, q)| r * q).collect();

        let shape = ldos_3d.shape();
        let mut work = Array3::<c64>::new(shape);

        let apply = |x: &[c64], y: &mut [c64], work: &mut Array3<c64>| {
            ctx.rgtrans.g1d_to_r3d(x, work.as_mut_slice());

            for (w, l) in multizip((work.as_mut_slice().iter_mut(), lr.iter())) {
                *w *= *l;
            }

            ctx.rgtrans.r3d_to_g1d(work.as_slice(), y);

            for (yi, xi, q) in multizip((y.iter_mut(), x.iter(), g2.iter())) {
                *yi += xi * q;
            }
        };

        let precond: Vec<f64> = g2.iter().map(|q| 1.0 / (q + lmean)).collect();

        let (mut x, iterations, relative_residual) = pcg_solve(&rhs, &precond, |x, y| apply(x, y, &mut work));

        if relative_residual > CG_TOL {
            if relative_residual > CG_REJECT || !relative_residual.is_finite() {
                return Err(MixingError::LdosSolve {
                    iterations,
                    relative_residual,
                });
            }

            warn!(
                "LDOS mixing: CG stopped at relative residual {:.3e} after {} iterations",
                relative_residual, iterations
            );
        }

        x.iter_mut().for_each(|v| *v *= self.beta);

        Ok(x)
    }
}

/// Solves A x = b for Hermitian positive A given by `apply`, with diagonal
/// preconditioner `precond`. Returns (x, iterations, |b - A x| / |b|).
fn pcg_solve<F>(b: &[c64], precond: &[f64], mut apply: F) -> (Vec<c64>, usize, f64)
where
    F: FnMut(&[c64], &mut [c64]),
{
    let n = b.len();

    let mut x = vec![c64::zero(); n];

    let bnorm = utility::vec_norm(b);

    if bnorm == 0.0 {
        return (x, 0, 0.0);
    }

    let mut r = b.to_vec();
    let mut z: Vec<c64> = multizip((r.iter(), precond.iter())).map(|(r, m)| r * m).collect();
    let mut p = z.clone();
    let mut ap = vec![c64::zero(); n];

    let mut rz = utility::zdot_product(&r, &z).re;

    let mut rel = 1.0;

    for iter in 0..MAX_CG_ITER {
        apply(&p, &mut ap);

        let pap = utility::zdot_product(&p, &ap).re;

        if !(pap > 0.0) {
            return (x, iter, rel);
        }

        let alpha = rz / pap;

        utility::add_and_scale(&p, &mut x, alpha);
        utility::add_and_scale(&ap, &mut r, -alpha);

        rel = utility::vec_norm(&r) / bnorm;

        if rel < CG_TOL {
            return (x, iter + 1, rel);
        }

        for (zi, ri, m) in multizip((z.iter_mut(), r.iter(), precond.iter())) {
            *zi = ri * m;
        }

        let rz_new = utility::zdot_product(&r, &z).re;

        let beta = rz_new / rz;

        rz = rz_new;

        for (pi, zi) in multizip((p.iter_mut(), z.iter())) {
            *pi = zi + *pi * beta;
        }
    }

    (x, MAX_CG_ITER, rel)
}
