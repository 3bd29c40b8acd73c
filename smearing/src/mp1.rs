use crate::*;

/// Methfessel-Paxton, first order
pub struct SmearingMP1 {}

impl Smearing for SmearingMP1 {
    fn get_occupation_number(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        0.5 * (1.0 - special::erf(x) - 1.0 / PI.sqrt() * x * (-x * x).exp())
    }

    fn get_occupation_derivative(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, kbt) = reduced_energy(fermi_level, temperature, electron_energy);

        (-x * x).exp() / PI.sqrt() * (1.5 - x * x) / kbt
    }

    // -A_1 H_2(x) exp(-x^2) / 2
    fn get_entropy_term(&self, fermi_level: f64, temperature: f64, electron_energy: f64) -> f64 {
        let (x, _) = reduced_energy(fermi_level, temperature, electron_energy);

        temperature * (2.0 * x * x - 1.0) * (-x * x).exp() / (4.0 * PI.sqrt())
    }
}
