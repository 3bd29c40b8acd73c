use crate::*;

/// Methfessel-Paxton, second order
pub struct SmearingMP2 {}

impl Smearing for SmearingMP2 {
    fn get_occupation_number(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        0.5 * (1.0 - special::erf(x) - 1.0 / PI.sqrt() * x * (7.0 / 4.0 - 0.5 * x * x) * (-x * x).exp())
    }

    fn get_occupation_derivative(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, kbt) = reduced_energy(fermi_level, temperature, electron_energy);

        let x2 = x * x;

        (-x2).exp() / PI.sqrt() * (15.0 / 8.0 - 2.5 * x2 + 0.5 * x2 * x2) / kbt
    }

    // -A_2 H_4(x) exp(-x^2) / 2
    fn get_entropy_term(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        let x2 = x * x;

        -temperature * (4.0 * x2 * x2 - 12.0 * x2 + 3.0) * (-x2).exp() / (16.0 * PI.sqrt())
    }
}
