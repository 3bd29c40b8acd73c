//! PBE exchange enhancement on top of Slater exchange.

use crate::traits::{XCFamily, XCKernel};
use crate::RHO_FLOOR;
use dwconsts::*;

const KAPPA: f64 = 0.804;
const MU: f64 = 0.219_514_972_764_517_1;

/// Returns `(exc, vrho, vsigma)` for one point.
///
/// With E = A rho^(4/3) Fx(s^2) and s^2 = cs sigma rho^(-8/3):
///   dE/drho   = A rho^(1/3) (4/3 Fx - 8/3 s^2 Fx')
///   dE/dsigma = A rho^(4/3) Fx' cs rho^(-8/3)
#[inline]
pub fn pbe_x_unpolarized(rho: f64, sigma: f64) -> (f64, f64, f64) {
    let a = -0.75 * (3.0 / PI).powf(1.0 / 3.0);
    let cs = 1.0 / (4.0 * (3.0 * PI * PI).powf(2.0 / 3.0));

    let rho13 = rho.cbrt();
    let rho43 = rho * rho13;
    let rho83 = rho43 * rho43;

    let s2 = cs * sigma / rho83;

    let denom = 1.0 + MU * s2 / KAPPA;
    let fx = 1.0 + KAPPA - KAPPA / denom;
    let dfx = MU / (denom * denom);

    let exc = a * rho13 * fx;
    let vrho = a * rho13 * (4.0 / 3.0 * fx - 8.0 / 3.0 * s2 * dfx);
    let vsigma = a * rho43 * dfx * cs / rho83;

    (exc, vrho, vsigma)
}

pub struct GgaXPbe;

impl XCKernel for GgaXPbe {
    fn get_id(&self) -> &'static str {
        "gga_x_pbe"
    }

    fn family(&self) -> XCFamily {
        XCFamily::GGA
    }

    fn compute_lda(&self, rho: &[f64], exc: &mut [f64], vrho: &mut [f64]) {
        for (i, &r) in rho.iter().enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let (e, v, _) = pbe_x_unpolarized(r, 0.0);

            exc[i] += e;
            vrho[i] += v;
        }
    }

    fn compute_gga(&self, rho: &[f64], sigma: &[f64], exc: &mut [f64], vrho: &mut [f64], vsigma: &mut [f64]) {
        for (i, (&r, &s)) in rho.iter().zip(sigma.iter()).enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let (e, v, vs) = pbe_x_unpolarized(r, s.max(0.0));

            exc[i] += e;
            vrho[i] += v;
            vsigma[i] += vs;
        }
    }
}
