use std::f64::consts::PI;
use vector3::*;

pub fn erf(x: f64) -> f64 {
    libm::erf(x)
}

pub fn erfc(x: f64) -> f64 {
    libm::erfc(x)
}

// Real spherical harmonics, evaluated from the direction of `v`.
//
// The m < 0 members carry the sin(|m| phi) dependence and the m > 0 members
// the cos(m phi) dependence; the odd-m members have the Condon-Shortley sign.
// `v` must not be the zero vector.
//
pub fn real_spherical_harmonics(l: usize, lm: i32, v: Vector3f64) -> f64 {
    let r = v.norm2();

    let x = v.x / r;
    let y = v.y / r;
    let z = v.z / r;

    match (l, lm) {
        (0, 0) => 0.5 / PI.sqrt(),

        (1, -1) => -(0.75 / PI).sqrt() * y,
        (1, 0) => (0.75 / PI).sqrt() * z,
        (1, 1) => -(0.75 / PI).sqrt() * x,

        (2, -2) => 0.5 * (15.0 / PI).sqrt() * x * y,
        (2, -1) => 0.5 * (15.0 / PI).sqrt() * y * z,
        (2, 0) => 0.25 * (5.0 / PI).sqrt() * (2.0 * z * z - x * x - y * y),
        (2, 1) => 0.5 * (15.0 / PI).sqrt() * z * x,
        (2, 2) => 0.25 * (15.0 / PI).sqrt() * (x * x - y * y),

        (3, -3) => -0.25 * (17.5 / PI).sqrt() * (3.0 * x * x - y * y) * y,
        (3, -2) => 0.5 * (105.0 / PI).sqrt() * x * y * z,
        (3, -1) => -0.25 * (10.5 / PI).sqrt() * y * (4.0 * z * z - x * x - y * y),
        (3, 0) => 0.25 * (7.0 / PI).sqrt() * z * (2.0 * z * z - 3.0 * x * x - 3.0 * y * y),
        (3, 1) => -0.25 * (10.5 / PI).sqrt() * x * (4.0 * z * z - x * x - y * y),
        (3, 2) => 0.25 * (105.0 / PI).sqrt() * (x * x - y * y) * z,
        (3, 3) => -0.25 * (17.5 / PI).sqrt() * (x * x - 3.0 * y * y) * x,

        _ => panic!("real spherical harmonics for (l, m) = ({}, {}) are not implemented", l, lm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // sum_m Y_lm(r)^2 = (2l + 1) / 4pi for every direction
    #[test]
    fn test_real_spherical_harmonics_addition_theorem() {
        let dirs = [
            Vector3f64::new(0.3, -1.2, 0.7),
            Vector3f64::new(0.0, 0.0, 2.0),
            Vector3f64::new(-1.0, 1.0, 0.0),
        ];

        for v in dirs.iter() {
            for l in 0..4 {
                let s: f64 = (-(l as i32)..=l as i32)
                    .map(|m| real_spherical_harmonics(l, m, *v).powi(2))
                    .sum();

                assert_abs_diff_eq!(s, (2 * l + 1) as f64 / (4.0 * PI), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_erfc_complements_erf() {
        for &x in [0.0, 0.3, 1.7, 4.0].iter() {
            assert_abs_diff_eq!(erf(x) + erfc(x), 1.0, epsilon = 1e-15);
        }
    }
}
