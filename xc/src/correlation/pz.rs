//! Perdew-Zunger parameterization of the Ceperley-Alder correlation energy.
//!
//! rs = (3/(4 pi rho))^(1/3); a Pade form is used for rs >= 1 and a
//! logarithmic expansion for rs < 1.

use crate::traits::{XCFamily, XCKernel};
use crate::RHO_FLOOR;
use dwconsts::FOURPI;

const T13: f64 = 1.0 / 3.0;

#[derive(Debug, Clone, Copy)]
pub struct PZParams {
    pub gamma: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Paramagnetic parameters
pub const PZ_UNPOLARIZED: PZParams = PZParams {
    gamma: -0.1423,
    beta1: 1.0529,
    beta2: 0.3334,
    a: 0.0311,
    b: -0.048,
    c: 0.0020,
    d: -0.0116,
};

/// Returns `(vc, ec)`.
#[inline]
pub fn pz_correlation(rho: f64, params: PZParams) -> (f64, f64) {
    let rs = (3.0 / FOURPI / rho).powf(T13);

    if rs >= 1.0 {
        let rroot = rs.sqrt();

        let dt = 1.0 + params.beta1 * rroot + params.beta2 * rs;

        let ec = params.gamma / dt;

        // vc = d(rho ec)/d rho
        let nt = 1.0 + 7.0 / 6.0 * params.beta1 * rroot + 4.0 / 3.0 * params.beta2 * rs;

        let vc = ec * nt / dt;

        (vc, ec)
    } else {
        let rln = rs.ln();

        let vc = params.a * rln
            + (params.b - params.a / 3.0)
            + 2.0 / 3.0 * params.c * rs * rln
            + 1.0 / 3.0 * (2.0 * params.d - params.c) * rs;

        let ec = params.a * rln + params.b + params.c * rs * rln + params.d * rs;

        (vc, ec)
    }
}

#[inline]
pub fn pz_unpolarized(rho: f64) -> (f64, f64) {
    pz_correlation(rho, PZ_UNPOLARIZED)
}

pub struct LdaCPz;

impl XCKernel for LdaCPz {
    fn get_id(&self) -> &'static str {
        "lda_c_pz"
    }

    fn family(&self) -> XCFamily {
        XCFamily::LDA
    }

    fn compute_lda(&self, rho: &[f64], exc: &mut [f64], vrho: &mut [f64]) {
        for (i, &r) in rho.iter().enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let (vc, ec) = pz_unpolarized(r);

            exc[i] += ec;
            vrho[i] += vc;
        }
    }
}
