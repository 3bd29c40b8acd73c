//! Density mixing on the density sphere. A base scheme turns the residual
//! R = rho_out - rho_in into an update direction; Pulay acceleration
//! combines the history of inputs and directions.

mod kerker;
pub use kerker::*;

mod ldos;
pub use ldos::*;

mod pulay;
pub use pulay::*;

mod simple;
pub use simple::*;

use itertools::multizip;
use ndarray::Array3;
use rgtransform::RGTransform;
use serde::Deserialize;
use std::fmt;
use types::c64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixingScheme {
    Simple,
    Kerker,
    Ldos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixingAcceleration {
    None,
    Pulay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MixingError {
    LengthMismatch { expected: usize, found: usize },
    MissingLdos,
    LdosSolve { iterations: usize, relative_residual: f64 },
    NonFinite,
}

impl fmt::Display for MixingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MixingError::LengthMismatch { expected, found } => {
                write!(f, "density has {} coefficients, expected {}", found, expected)
            }
            MixingError::MissingLdos => write!(f, "LDOS mixing needs the local density of states"),
            MixingError::LdosSolve {
                iterations,
                relative_residual,
            } => write!(
                f,
                "LDOS preconditioner did not converge in {} iterations (relative residual {:.3e})",
                iterations, relative_residual
            ),
            MixingError::NonFinite => write!(f, "mixed density is not finite"),
        }
    }
}

impl std::error::Error for MixingError {}

/// What a scheme may look at besides the densities.
pub struct MixingContext<'a> {
    /// |G| of every coefficient on the density sphere, G = 0 first
    pub gs: &'a [f64],
    pub rgtrans: &'a RGTransform,
    /// 2 sum_nk w_k (-df/de) |psi_nk(r)|^2; only read by LDOS mixing
    pub ldos_3d: Option<&'a Array3<c64>>,
}

pub trait Mixing: Send {
    fn get_name(&self) -> &'static str;

    /// Update direction for the residual R = rho_out - rho_in.
    fn precondition_residual(&self, ctx: &MixingContext, residual: &[c64]) -> Result<Vec<c64>, MixingError>;

    /// rho_in + P R
    fn compute_next_density(
        &mut self,
        ctx: &MixingContext,
        rhog_in: &[c64],
        rhog_out: &[c64],
    ) -> Result<Vec<c64>, MixingError> {
        check_lengths(ctx, rhog_in, rhog_out)?;

        let residual = get_residual(rhog_in, rhog_out);

        let direction = self.precondition_residual(ctx, &residual)?;

        let next: Vec<c64> = multizip((rhog_in.iter(), direction.iter()))
            .map(|(x, d)| x + d)
            .collect();

        check_finite(next)
    }

    /// Forget the history, if any.
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixingSettings {
    pub scheme: MixingScheme,
    pub acceleration: MixingAcceleration,
    pub damping: f64,
    pub kerker_k0: f64,
    pub kerker_floor: f64,
    pub history: usize,
    pub pulay_metric_weight: f64,
}

pub fn new(settings: &MixingSettings) -> Box<dyn Mixing> {
    let base: Box<dyn Mixing> = match settings.scheme {
        MixingScheme::Simple => Box::new(MixingSimple::new(settings.damping)),
        MixingScheme::Kerker => Box::new(MixingKerker::new(
            settings.damping,
            settings.kerker_k0,
            settings.kerker_floor,
        )),
        MixingScheme::Ldos => Box::new(MixingLDOS::new(settings.damping)),
    };

    match settings.acceleration {
        MixingAcceleration::None => base,
        MixingAcceleration::Pulay => Box::new(MixingPulay::new(
            base,
            settings.history,
            settings.pulay_metric_weight,
        )),
    }
}

fn get_residual(rhog_in: &[c64], rhog_out: &[c64]) -> Vec<c64> {
    multizip((rhog_in.iter(), rhog_out.iter())).map(|(x, y)| y - x).collect()
}

fn check_lengths(ctx: &MixingContext, rhog_in: &[c64], rhog_out: &[c64]) -> Result<(), MixingError> {
    let expected = ctx.gs.len();

    for found in [rhog_in.len(), rhog_out.len()].iter() {
        if *found != expected {
            return Err(MixingError::LengthMismatch {
                expected,
                found: *found,
            });
        }
    }

    Ok(())
}

fn check_finite(v: Vec<c64>) -> Result<Vec<c64>, MixingError> {
    if v.iter().all(|x| x.re.is_finite() && x.im.is_finite()) {
        Ok(v)
    } else {
        Err(MixingError::NonFinite)
    }
}
