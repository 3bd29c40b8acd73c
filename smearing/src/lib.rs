//! Smearing functions of x = (e - mu) / sigma, sigma (`temperature`) in
//! Hartree. Occupations are per spin orbital.

mod fd;
pub use fd::*;
mod gs;
pub use gs::*;
mod mp1;
pub use mp1::*;
mod mp2;
pub use mp2::*;

use dwconsts::*;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmearingScheme {
    /// fixed integer filling
    None,
    Fd,
    Gs,
    Mp1,
    Mp2,
}

impl Default for SmearingScheme {
    fn default() -> Self {
        SmearingScheme::None
    }
}

pub trait Smearing: Send + Sync {
    fn get_occupation_number(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64;

    /// -df/de
    fn get_occupation_derivative(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64;

    /// contribution of one spin orbital to -TS
    fn get_entropy_term(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64;
}

pub fn new(scheme: SmearingScheme) -> Option<Box<dyn Smearing>> {
    match scheme {
        SmearingScheme::None => None,
        SmearingScheme::Fd => Some(Box::new(SmearingFD {})),
        SmearingScheme::Gs => Some(Box::new(SmearingGS {})),
        SmearingScheme::Mp1 => Some(Box::new(SmearingMP1 {})),
        SmearingScheme::Mp2 => Some(Box::new(SmearingMP2 {})),
    }
}

fn reduced_energy(fermi_level: f64, temperature: f64, electron_energy: f64) -> (f64, f64) {
    let kbt = temperature.max(EPS30);

    ((electron_energy - fermi_level) / kbt, kbt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SCHEMES: [SmearingScheme; 4] = [SmearingScheme::Fd, SmearingScheme::Gs, SmearingScheme::Mp1, SmearingScheme::Mp2];

    #[test]
    fn test_limits_and_half_filling() {
        for scheme in SCHEMES.iter() {
            let s = new(*scheme).unwrap();

            assert_abs_diff_eq!(s.get_occupation_number(0.0, 0.01, -1.0), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(s.get_occupation_number(0.0, 0.01, 1.0), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(s.get_occupation_number(0.3, 0.01, 0.3), 0.5, epsilon = 1e-14);

            assert_abs_diff_eq!(s.get_entropy_term(0.0, 0.01, 1.0), 0.0, epsilon = 1e-12);
        }

        assert!(new(SmearingScheme::None).is_none());
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-6;
        let sigma = 0.05;

        for scheme in SCHEMES.iter() {
            let s = new(*scheme).unwrap();

            for &e in [-0.07, -0.01, 0.0, 0.02, 0.09].iter() {
                let fd = -(s.get_occupation_number(0.0, sigma, e + h) - s.get_occupation_number(0.0, sigma, e - h)) / (2.0 * h);

                assert_abs_diff_eq!(s.get_occupation_derivative(0.0, sigma, e), fd, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_derivative_integrates_to_one() {
        let sigma = 0.1;
        let de = 1e-3;

        for scheme in SCHEMES.iter() {
            let s = new(*scheme).unwrap();

            let total: f64 = (-3000..=3000)
                .map(|i| s.get_occupation_derivative(0.0, sigma, i as f64 * de) * de)
                .sum();

            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fermi_dirac_entropy_is_negative() {
        let s = SmearingFD {};

        assert!(s.get_entropy_term(0.0, 0.01, 0.005) < 0.0);
        assert_abs_diff_eq!(s.get_entropy_term(0.0, 0.01, 0.0), -0.01 * 2f64.ln(), epsilon = 1e-14);
    }
}
