//! PBE correlation: PW92 plus the gradient correction H(rs, t) for an
//! unpolarized density (phi = 1).

use super::pw92::pw92_unpolarized;
use crate::traits::{XCFamily, XCKernel};
use crate::RHO_FLOOR;
use dwconsts::*;

const BETA: f64 = 0.066_724_550_603_149_22;

fn gamma() -> f64 {
    (1.0 - std::f64::consts::LN_2) / (PI * PI)
}

/// Returns `(exc, vrho, vsigma)` for one point.
///
/// t^2 = ct sigma rho^(-7/3), H = gamma ln(1 + X),
/// X = (beta/gamma) t^2 (1 + A t^2) / (1 + A t^2 + A^2 t^4),
/// A = (beta/gamma) / (exp(-ec/gamma) - 1).
pub fn pbe_c_unpolarized(rho: f64, sigma: f64) -> (f64, f64, f64) {
    let g = gamma();
    let bg = BETA / g;

    let pw = pw92_unpolarized(rho);

    let ct = PI / (16.0 * (3.0 * PI * PI).cbrt());
    let rho73 = rho * rho * rho.cbrt();

    let t2 = ct * sigma / rho73;

    let expo = (-pw.ec / g).exp();
    let a = bg / (expo - 1.0);
    let da_dec = bg * expo / (g * (expo - 1.0) * (expo - 1.0));

    let num = 1.0 + a * t2;
    let den = 1.0 + a * t2 + a * a * t2 * t2;

    let x = bg * t2 * num / den;
    let h = g * (1.0 + x).ln();

    let dh_dx = g / (1.0 + x);

    // dX/dt2 and dX/dA
    let dx_dt2 = bg * (num / den + t2 * (a * den - num * (a + 2.0 * a * a * t2)) / (den * den));
    let dx_da = bg * t2 * (t2 * den - num * (t2 + 2.0 * a * t2 * t2)) / (den * den);

    let dh_dt2 = dh_dx * dx_dt2;
    let dh_da = dh_dx * dx_da;

    // rho dH/drho at fixed sigma; rho d ec/d rho = -rs/3 d ec/d rs
    let rho_dec_drho = -pw.rs / 3.0 * pw.dec_drs;
    let rho_dh_drho = -7.0 / 3.0 * t2 * dh_dt2 + dh_da * da_dec * rho_dec_drho;

    let exc = pw.ec + h;
    let vrho = pw.vc + h + rho_dh_drho;
    let vsigma = rho * dh_dt2 * ct / rho73;

    (exc, vrho, vsigma)
}

pub struct GgaCPbe;

impl XCKernel for GgaCPbe {
    fn get_id(&self) -> &'static str {
        "gga_c_pbe"
    }

    fn family(&self) -> XCFamily {
        XCFamily::GGA
    }

    fn compute_lda(&self, rho: &[f64], exc: &mut [f64], vrho: &mut [f64]) {
        for (i, &r) in rho.iter().enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let pw = pw92_unpolarized(r);

            exc[i] += pw.ec;
            vrho[i] += pw.vc;
        }
    }

    fn compute_gga(&self, rho: &[f64], sigma: &[f64], exc: &mut [f64], vrho: &mut [f64], vsigma: &mut [f64]) {
        for (i, (&r, &s)) in rho.iter().zip(sigma.iter()).enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let (e, v, vs) = pbe_c_unpolarized(r, s.max(0.0));

            exc[i] += e;
            vrho[i] += v;
            vsigma[i] += vs;
        }
    }
}
