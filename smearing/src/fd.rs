use crate::*;

/// Fermi-Dirac
pub struct SmearingFD {}

impl Smearing for SmearingFD {
    fn get_occupation_number(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        1.0 / (x.exp() + 1.0)
    }

    fn get_occupation_derivative(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, kbt) = reduced_energy(fermi_level, temperature, electron_energy);

        // f (1 - f) / kT, written to stay finite for large |x|
        let t = (-x.abs()).exp();

        t / ((1.0 + t) * (1.0 + t)) / kbt
    }

    fn get_entropy_term(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let f = self.get_occupation_number(fermi_level, temperature, electron_energy);

        let xlogx = |v: f64| if v > EPS30 { v * v.ln() } else { 0.0 };

        temperature * (xlogx(f) + xlogx(1.0 - f))
    }
}
