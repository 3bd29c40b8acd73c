//! Slater exchange of the uniform electron gas.

use crate::traits::{XCFamily, XCKernel};
use crate::RHO_FLOOR;

const T13: f64 = 1.0 / 3.0;

/// Returns `(vx, ex)` for an unpolarized density.
///
/// vx = -(3/pi)^(1/3) rho^(1/3), ex = 3/4 vx
#[inline]
pub fn slater_unpolarized(rho: f64) -> (f64, f64) {
    let cx: f64 = -(3.0 / std::f64::consts::PI).powf(T13);

    let vx = cx * rho.powf(T13);

    let ex = 0.75 * vx;

    (vx, ex)
}

pub struct LdaX;

impl XCKernel for LdaX {
    fn get_id(&self) -> &'static str {
        "lda_x"
    }

    fn family(&self) -> XCFamily {
        XCFamily::LDA
    }

    fn compute_lda(&self, rho: &[f64], exc: &mut [f64], vrho: &mut [f64]) {
        debug_assert_eq!(exc.len(), rho.len());
        debug_assert_eq!(vrho.len(), rho.len());

        for (i, &r) in rho.iter().enumerate() {
            if r < RHO_FLOOR {
                continue;
            }

            let (vx, ex) = slater_unpolarized(r);

            exc[i] += ex;
            vrho[i] += vx;
        }
    }
}
