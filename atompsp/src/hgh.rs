use crate::{AtomPSP, PspError};
use dwconsts::*;
use serde::Deserialize;

/// Goedecker-Teter-Hutter / Hartwigsen-Goedecker-Hutter parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HGHParams {
    pub zion: f64,
    pub rloc: f64,
    #[serde(default)]
    pub cloc: Vec<f64>,
    /// indexed by angular momentum
    #[serde(default)]
    pub channels: Vec<HGHChannel>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HGHChannel {
    pub r: f64,
    /// full symmetric matrix, one row per projector
    pub h: Vec<Vec<f64>>,
}

pub fn builtin_hgh(name: &str) -> Result<HGHParams, PspError> {
    match name {
        // LDA, Goedecker-Teter-Hutter
        "Si-q4" => Ok(HGHParams {
            zion: 4.0,
            rloc: 0.44,
            cloc: vec![-7.33610297],
            channels: vec![
                HGHChannel {
                    r: 0.42273813,
                    h: vec![vec![5.90692831, -1.26189397], vec![-1.26189397, 3.25819622]],
                },
                HGHChannel {
                    r: 0.48427842,
                    h: vec![vec![2.72701346]],
                },
            ],
        }),

        // PBE, Krack
        "Mg-q2" => Ok(HGHParams {
            zion: 2.0,
            rloc: 0.57696017,
            cloc: vec![-2.69040744],
            channels: vec![
                HGHChannel {
                    r: 0.59392350,
                    h: vec![vec![3.50321099, -0.71677167], vec![-0.71677167, 0.92534825]],
                },
                HGHChannel {
                    r: 0.70715728,
                    h: vec![vec![0.83115848]],
                },
            ],
        }),

        _ => Err(PspError::UnknownLibraryEntry(name.to_string())),
    }
}

pub struct AtomPSPHGH {
    name: String,
    params: HGHParams,
}

impl AtomPSPHGH {
    pub fn new(name: &str, params: &HGHParams) -> Result<AtomPSPHGH, PspError> {
        let invalid = |reason: String| PspError::InvalidParameter {
            name: name.to_string(),
            reason,
        };

        if !(params.zion > 0.0) {
            return Err(invalid(format!("zion = {} must be positive", params.zion)));
        }

        if !(params.rloc > 0.0) {
            return Err(invalid(format!("rloc = {} must be positive", params.rloc)));
        }

        if params.cloc.len() > 4 {
            return Err(invalid(format!("{} local coefficients, at most 4", params.cloc.len())));
        }

        if params.channels.len() > 4 {
            return Err(invalid("projectors beyond l = 3".to_string()));
        }

        for (l, ch) in params.channels.iter().enumerate() {
            let n = ch.h.len();

            if n > 0 && !(ch.r > 0.0) {
                return Err(invalid(format!("r_{} = {} must be positive", l, ch.r)));
            }

            if n > 3 || n > 4 - l {
                return Err(invalid(format!("{} projectors for l = {}", n, l)));
            }

            for i in 0..n {
                if ch.h[i].len() != n {
                    return Err(invalid(format!("h matrix of l = {} is not square", l)));
                }

                for j in 0..i {
                    if (ch.h[i][j] - ch.h[j][i]).abs() > EPS8 {
                        return Err(invalid(format!("h matrix of l = {} is not symmetric", l)));
                    }
                }
            }
        }

        Ok(AtomPSPHGH {
            name: name.to_string(),
            params: params.clone(),
        })
    }

    fn cloc(&self, i: usize) -> f64 {
        self.params.cloc.get(i).copied().unwrap_or(0.0)
    }
}

impl AtomPSP for AtomPSPHGH {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_zion(&self) -> f64 {
        self.params.zion
    }

    fn get_lmax(&self) -> Option<usize> {
        self.params.channels.iter().rposition(|ch| !ch.h.is_empty())
    }

    fn get_nproj(&self, l: usize) -> usize {
        self.params.channels.get(l).map(|ch| ch.h.len()).unwrap_or(0)
    }

    fn get_dij(&self, l: usize, i: usize, j: usize) -> f64 {
        self.params.channels[l].h[i][j]
    }

    //
    // t = q rloc
    //
    // V(q) = exp(-t^2/2) [ -4 pi Z / q^2 + (2 pi)^(3/2) rloc^3 (C1 + C2 (3 - t^2)
    //        + C3 (15 - 10 t^2 + t^4) + C4 (105 - 105 t^2 + 21 t^4 - t^6)) ]
    //
    fn get_vloc_of_q(&self, q: f64) -> f64 {
        let rloc = self.params.rloc;
        let t = q * rloc;
        let t2 = t * t;
        let t4 = t2 * t2;
        let t6 = t4 * t2;

        let poly = self.cloc(0)
            + self.cloc(1) * (3.0 - t2)
            + self.cloc(2) * (15.0 - 10.0 * t2 + t4)
            + self.cloc(3) * (105.0 - 105.0 * t2 + 21.0 * t4 - t6);

        (-t2 / 2.0).exp() * (-FOURPI * self.params.zion / (q * q) + TWOPI.powf(1.5) * rloc.powi(3) * poly)
    }

    fn get_vloc_limit(&self) -> f64 {
        let rloc = self.params.rloc;

        TWOPI * self.params.zion * rloc * rloc
            + TWOPI.powf(1.5)
                * rloc.powi(3)
                * (self.cloc(0) + 3.0 * self.cloc(1) + 15.0 * self.cloc(2) + 105.0 * self.cloc(3))
    }

    fn get_projector_of_q(&self, l: usize, i: usize, q: f64) -> f64 {
        hgh_projector(l, i, self.params.channels[l].r, q)
    }

    fn get_atomic_density_of_q(&self, q: f64) -> f64 {
        let sigma = 2.0 * self.params.rloc;

        self.params.zion * (-0.5 * (q * sigma).powi(2)).exp()
    }
}

// Fourier transform of the normalized HGH projector p^l_i, x = q r_l.
fn hgh_projector(l: usize, i: usize, rp: f64, q: f64) -> f64 {
    let x = q * rp;
    let x2 = x * x;

    let common = 4.0 * PI.powf(1.25) * (2f64.powi(l as i32 + 1) * rp.powi(3)).sqrt() * (-x2 / 2.0).exp();

    match (l, i) {
        (0, 0) => common,
        (0, 1) => common * 2.0 / 15f64.sqrt() * (3.0 - x2),
        (0, 2) => common * 4.0 / 105f64.sqrt() * (15.0 - 10.0 * x2 + x2 * x2) / 3.0,

        (1, 0) => common / 3f64.sqrt() * x,
        (1, 1) => common * 2.0 / 105f64.sqrt() * x * (5.0 - x2),
        (1, 2) => common * 4.0 / (3.0 * 1155f64.sqrt()) * x * (35.0 - 14.0 * x2 + x2 * x2),

        (2, 0) => common / 15f64.sqrt() * x2,
        (2, 1) => common * 2.0 / (3.0 * 105f64.sqrt()) * x2 * (7.0 - x2),

        (3, 0) => common / 105f64.sqrt() * x2 * x,

        _ => panic!("HGH projector ({}, {}) does not exist", l, i),
    }
}
