//! Diagonal preconditioners for the band eigensolvers, built per k point
//! from the kinetic energies |k+G|^2/2 of the basis.

use itertools::multizip;
use serde::Deserialize;
use types::c64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecondScheme {
    Kinetic,
    Tpa,
}

impl Default for PrecondScheme {
    fn default() -> Self {
        PrecondScheme::Kinetic
    }
}

pub trait Preconditioner: Send + Sync {
    /// out = P residual; `psi` is the band the residual belongs to
    fn apply(&self, psi: &[c64], residual: &[c64], out: &mut [c64]);
}

pub fn new(scheme: PrecondScheme, kin: &[f64], shift: f64) -> Box<dyn Preconditioner> {
    match scheme {
        PrecondScheme::Kinetic => Box::new(PrecondKinetic::new(kin, shift)),
        PrecondScheme::Tpa => Box::new(PrecondTPA::new(kin)),
    }
}

/// 1 / (|k+G|^2/2 + alpha), alpha > 0
pub struct PrecondKinetic {
    diag: Vec<f64>,
}

impl PrecondKinetic {
    pub fn new(kin: &[f64], shift: f64) -> PrecondKinetic {
        assert!(shift > 0.0, "preconditioner shift must be positive");

        PrecondKinetic {
            diag: kin.iter().map(|k| 1.0 / (k + shift)).collect(),
        }
    }
}

impl Preconditioner for PrecondKinetic {
    fn apply(&self, _psi: &[c64], residual: &[c64], out: &mut [c64]) {
        for (o, r, d) in multizip((out.iter_mut(), residual.iter(), self.diag.iter())) {
            *o = r * d;
        }
    }
}

/// Teter-Payne-Allan, scaled by the kinetic energy of the band.
pub struct PrecondTPA {
    kin: Vec<f64>,
}

impl PrecondTPA {
    pub fn new(kin: &[f64]) -> PrecondTPA {
        PrecondTPA { kin: kin.to_vec() }
    }

    fn band_kinetic_energy(&self, psi: &[c64]) -> f64 {
        let ek: f64 = psi.iter().zip(self.kin.iter()).map(|(c, k)| c.norm_sqr() * k).sum();
        let norm: f64 = psi.iter().map(|c| c.norm_sqr()).sum();

        // a band at G = 0 only would give zero
        if norm > 0.0 {
            (ek / norm).max(1e-2)
        } else {
            1.0
        }
    }
}

impl Preconditioner for PrecondTPA {
    fn apply(&self, psi: &[c64], residual: &[c64], out: &mut [c64]) {
        let ek = 1.5 * self.band_kinetic_energy(psi);

        for (o, r, k) in multizip((out.iter_mut(), residual.iter(), self.kin.iter())) {
            let x = k / ek;

            let x2 = x * x;
            let x3 = x * x2;
            let x4 = x * x3;

            let y = 27.0 + 18.0 * x + 12.0 * x2 + 8.0 * x3;

            *o = r * (y / (y + 16.0 * x4) * 2.0 / ek);
        }
    }
}
