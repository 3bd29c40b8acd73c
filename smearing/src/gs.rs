use crate::*;

/// Gaussian
pub struct SmearingGS {}

impl Smearing for SmearingGS {
    fn get_occupation_number(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        0.5 * special::erfc(x)
    }

    fn get_occupation_derivative(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, kbt) = reduced_energy(fermi_level, temperature, electron_energy);

        (-x * x).exp() / PI.sqrt() / kbt
    }

    fn get_entropy_term(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        -temperature * (-x * x).exp() / (2.0 * PI.sqrt())
    }
}
