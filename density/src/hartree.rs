use dwconsts::*;
use itertools::multizip;
use pwdensity::PWDensity;
use types::c64;

/// V_H(G) = 4 pi rho(G) / G^2 on the density sphere, zero at G = 0.
pub fn hartree_potential_of_g(pwden: &PWDensity, rhog: &[c64], vhg: &mut [c64]) {
    for (v, r, &g) in multizip((vhg.iter_mut(), rhog.iter(), pwden.get_g().iter())) {
        *v = if g < EPS10 { ZERO_C64 } else { FOURPI * *r / (g * g) };
    }
}

/// E_H = Omega/2 sum_G V_H(G) conj(rho(G))
pub fn hartree_energy(pwden: &PWDensity, rhog: &[c64], volume: f64) -> f64 {
    let e: f64 = multizip((rhog.iter(), pwden.get_g().iter()))
        .filter(|(_, &g)| g > EPS10)
        .map(|(r, &g)| r.norm_sqr() / (g * g))
        .sum();

    0.5 * volume * FOURPI * e
}
