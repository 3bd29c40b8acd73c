//! Perdew-Wang 1992 fit of the paramagnetic correlation energy.

use dwconsts::FOURPI;

const A: f64 = 0.031_090_7;
const ALPHA1: f64 = 0.213_70;
const BETA1: f64 = 7.5957;
const BETA2: f64 = 3.5876;
const BETA3: f64 = 1.6382;
const BETA4: f64 = 0.49294;

#[derive(Debug, Clone, Copy)]
pub struct PW92Point {
    pub rs: f64,
    pub ec: f64,
    /// d ec / d rs
    pub dec_drs: f64,
    /// d(rho ec)/d rho = ec - rs/3 d ec/d rs
    pub vc: f64,
}

#[inline]
pub fn rs_of_rho(rho: f64) -> f64 {
    (3.0 / FOURPI / rho).cbrt()
}

/// ec(rs) = -2A (1 + a1 rs) ln(1 + 1 / (2A (b1 rs^1/2 + b2 rs + b3 rs^3/2 + b4 rs^2)))
#[inline]
pub fn pw92_unpolarized(rho: f64) -> PW92Point {
    let rs = rs_of_rho(rho);
    let srs = rs.sqrt();

    let q0 = -2.0 * A * (1.0 + ALPHA1 * rs);
    let q1 = 2.0 * A * (BETA1 * srs + BETA2 * rs + BETA3 * rs * srs + BETA4 * rs * rs);
    let dq1 = A * (BETA1 / srs + 2.0 * BETA2 + 3.0 * BETA3 * srs + 4.0 * BETA4 * rs);

    let log_term = (1.0 + 1.0 / q1).ln();

    let ec = q0 * log_term;
    let dec_drs = -2.0 * A * ALPHA1 * log_term - q0 * dq1 / (q1 * q1 + q1);

    PW92Point {
        rs,
        ec,
        dec_drs,
        vc: ec - rs / 3.0 * dec_drs,
    }
}
