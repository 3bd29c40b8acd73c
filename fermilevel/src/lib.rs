//! Occupations as a pure function of the eigenvalues at all k points: the
//! chemical potential is shared, so it is found once from every band.

use dwconsts::*;
use log::debug;
use smearing::Smearing;
use std::fmt;

const MAX_BRACKET_STEPS: usize = 64;
const MAX_BISECTION_STEPS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum FermiLevelError {
    InvalidElectronCount(f64),
    /// fixed filling needs an even electron number
    OddElectronCount(f64),
    TooFewBands { nband: usize, n_electrons: f64 },
    NoConvergence { iterations: usize, electron_error: f64 },
}

impl fmt::Display for FermiLevelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FermiLevelError::InvalidElectronCount(n) => write!(f, "invalid electron count {}", n),
            FermiLevelError::OddElectronCount(n) => {
                write!(f, "fixed occupations need an even number of electrons, got {}", n)
            }
            FermiLevelError::TooFewBands { nband, n_electrons } => {
                write!(f, "{} bands cannot hold {} electrons", nband, n_electrons)
            }
            FermiLevelError::NoConvergence {
                iterations,
                electron_error,
            } => write!(
                f,
                "Fermi level search stopped after {} steps with electron error {:e}",
                iterations, electron_error
            ),
        }
    }
}

impl std::error::Error for FermiLevelError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupations {
    pub fermi_level: f64,
    /// per k point and band, in [0, 2] for the non-negative schemes
    pub occ: Vec<Vec<f64>>,
    /// 2 (-df/de) per k point and band, without the k weight
    pub occ_derivative: Vec<Vec<f64>>,
    /// -TS, k weighted
    pub entropy_term: f64,
}

impl Occupations {
    pub fn get_total_electrons(&self, weights: &[f64]) -> f64 {
        self.occ
            .iter()
            .zip(weights.iter())
            .map(|(occ, w)| w * occ.iter().sum::<f64>())
            .sum()
    }
}

/// `evals[ik]` ascending, `weights` sum to one. Without smearing the lowest
/// n_electrons/2 bands at every k point are doubly occupied.
pub fn compute_occupations(
    smearing: Option<&dyn Smearing>,
    temperature: f64,
    evals: &[Vec<f64>],
    weights: &[f64],
    n_electrons: f64,
) -> Result<Occupations, FermiLevelError> {
    assert_eq!(evals.len(), weights.len());

    if !(n_electrons > 0.0) || !n_electrons.is_finite() {
        return Err(FermiLevelError::InvalidElectronCount(n_electrons));
    }

    let nband = evals.iter().map(|e| e.len()).min().unwrap_or(0);

    match smearing {
        None => fixed_occupations(evals, nband, n_electrons),
        Some(smearing) => smeared_occupations(smearing, temperature, evals, weights, nband, n_electrons),
    }
}

fn fixed_occupations(evals: &[Vec<f64>], nband: usize, n_electrons: f64) -> Result<Occupations, FermiLevelError> {
    let nocc_f64 = n_electrons / SPIN_DEGENERACY;

    if (nocc_f64 - nocc_f64.round()).abs() > EPS8 {
        return Err(FermiLevelError::OddElectronCount(n_electrons));
    }

    let nocc = nocc_f64.round() as usize;

    if nocc > nband {
        return Err(FermiLevelError::TooFewBands { nband, n_electrons });
    }

    // highest occupied level
    let fermi_level = evals
        .iter()
        .map(|e| e[nocc - 1])
        .fold(f64::NEG_INFINITY, f64::max);

    let occ = evals
        .iter()
        .map(|e| (0..e.len()).map(|ib| if ib < nocc { SPIN_DEGENERACY } else { 0.0 }).collect())
        .collect();

    let occ_derivative = evals.iter().map(|e| vec![0.0; e.len()]).collect();

    Ok(Occupations {
        fermi_level,
        occ,
        occ_derivative,
        entropy_term: 0.0,
    })
}

fn smeared_occupations(
    smearing: &dyn Smearing,
    temperature: f64,
    evals: &[Vec<f64>],
    weights: &[f64],
    nband: usize,
    n_electrons: f64,
) -> Result<Occupations, FermiLevelError> {
    // all bands full still has to exceed the electron count
    if n_electrons >= SPIN_DEGENERACY * nband as f64 {
        return Err(FermiLevelError::TooFewBands { nband, n_electrons });
    }

    let total_electrons = |mu: f64| -> f64 {
        evals
            .iter()
            .zip(weights.iter())
            .map(|(e, w)| {
                w * e
                    .iter()
                    .map(|&en| SPIN_DEGENERACY * smearing.get_occupation_number(mu, temperature, en))
                    .sum::<f64>()
            })
            .sum()
    };

    let emin = evals.iter().flatten().cloned().fold(f64::INFINITY, f64::min);
    let emax = evals.iter().flatten().cloned().fold(f64::NEG_INFINITY, f64::max);

    // bracket [lower, upper] with N(lower) < N < N(upper)

    let mut step = (emax - emin).max(temperature).max(EPS4);

    let mut lower = emin - step;
    let mut upper = emax + step;

    let mut nsteps = 0;

    while total_electrons(lower) > n_electrons || total_electrons(upper) < n_electrons {
        nsteps += 1;

        if nsteps > MAX_BRACKET_STEPS {
            return Err(FermiLevelError::NoConvergence {
                iterations: nsteps,
                electron_error: f64::NAN,
            });
        }

        step *= 2.0;
        lower -= step;
        upper += step;
    }

    // bisection

    let mut fermi_level = 0.5 * (lower + upper);
    let mut ntot = total_electrons(fermi_level);

    let mut iterations = 0;

    while (ntot - n_electrons).abs() > EPS12 {
        iterations += 1;

        if iterations > MAX_BISECTION_STEPS || upper - lower <= EPS16 * fermi_level.abs().max(1.0) {
            break;
        }

        if ntot > n_electrons {
            upper = fermi_level;
        } else {
            lower = fermi_level;
        }

        fermi_level = 0.5 * (lower + upper);
        ntot = total_electrons(fermi_level);
    }

    // the bracket can shrink to machine precision before the count is met
    if (ntot - n_electrons).abs() > EPS8 {
        return Err(FermiLevelError::NoConvergence {
            iterations,
            electron_error: ntot - n_electrons,
        });
    }

    debug!("fermi level = {:.12} after {} bisection steps", fermi_level, iterations);

    let occ = evals
        .iter()
        .map(|e| {
            e.iter()
                .map(|&en| SPIN_DEGENERACY * smearing.get_occupation_number(fermi_level, temperature, en))
                .collect()
        })
        .collect();

    let occ_derivative = evals
        .iter()
        .map(|e| {
            e.iter()
                .map(|&en| SPIN_DEGENERACY * smearing.get_occupation_derivative(fermi_level, temperature, en))
                .collect()
        })
        .collect();

    let entropy_term = evals
        .iter()
        .zip(weights.iter())
        .map(|(e, w)| {
            w * e
                .iter()
                .map(|&en| SPIN_DEGENERACY * smearing.get_entropy_term(fermi_level, temperature, en))
                .sum::<f64>()
        })
        .sum();

    Ok(Occupations {
        fermi_level,
        occ,
        occ_derivative,
        entropy_term,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use smearing::SmearingScheme;

    fn bands() -> (Vec<Vec<f64>>, Vec<f64>) {
        let evals = vec![
            vec![-0.20, 0.10, 0.10, 0.15, 0.40, 0.55],
            vec![-0.10, 0.05, 0.12, 0.22, 0.35, 0.60],
            vec![-0.05, 0.08, 0.18, 0.30, 0.31, 0.52],
        ];
        let weights = vec![0.25, 0.5, 0.25];

        (evals, weights)
    }

    #[test]
    fn test_smeared_occupations_conserve_electrons() {
        let (evals, weights) = bands();

        for scheme in [SmearingScheme::Fd, SmearingScheme::Gs, SmearingScheme::Mp1, SmearingScheme::Mp2].iter() {
            let smearing = smearing::new(*scheme).unwrap();

            for &nelec in [1.0, 4.0, 5.3, 8.0].iter() {
                let occ = compute_occupations(Some(smearing.as_ref()), 0.01, &evals, &weights, nelec).unwrap();

                assert_abs_diff_eq!(occ.get_total_electrons(&weights), nelec, epsilon = 1e-10);
                assert_eq!(occ.occ.len(), 3);
                assert_eq!(occ.occ_derivative[1].len(), 6);
            }
        }
    }

    #[test]
    fn test_fermi_dirac_occupations_are_monotonic() {
        let (evals, weights) = bands();
        let smearing = smearing::new(SmearingScheme::Fd).unwrap();

        let occ = compute_occupations(Some(smearing.as_ref()), 0.01, &evals, &weights, 4.0).unwrap();

        for (e, o) in evals.iter().zip(occ.occ.iter()) {
            for ib in 1..e.len() {
                assert!(o[ib] <= o[ib - 1] + 1e-15);
                assert!(o[ib] >= 0.0 && o[ib] <= 2.0);
            }
        }

        assert!(occ.entropy_term <= 0.0);
    }

    #[test]
    fn test_fixed_occupations() {
        let (evals, weights) = bands();

        let occ = compute_occupations(None, 0.0, &evals, &weights, 4.0).unwrap();

        assert_eq!(occ.occ[0], vec![2.0, 2.0, 0.0, 0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(occ.fermi_level, 0.10, epsilon = 1e-15);
        assert_abs_diff_eq!(occ.get_total_electrons(&weights), 4.0, epsilon = 1e-14);
        assert_eq!(occ.entropy_term, 0.0);
    }

    #[test]
    fn test_invalid_fillings() {
        let (evals, weights) = bands();

        assert_eq!(
            compute_occupations(None, 0.0, &evals, &weights, 3.0).err(),
            Some(FermiLevelError::OddElectronCount(3.0))
        );

        assert_eq!(
            compute_occupations(None, 0.0, &evals, &weights, 14.0).err(),
            Some(FermiLevelError::TooFewBands {
                nband: 6,
                n_electrons: 14.0
            })
        );

        let smearing = smearing::new(SmearingScheme::Gs).unwrap();

        assert_eq!(
            compute_occupations(Some(smearing.as_ref()), 0.01, &evals, &weights, 12.0).err(),
            Some(FermiLevelError::TooFewBands {
                nband: 6,
                n_electrons: 12.0
            })
        );

        assert_eq!(
            compute_occupations(Some(smearing.as_ref()), 0.01, &evals, &weights, 0.0).err(),
            Some(FermiLevelError::InvalidElectronCount(0.0))
        );
    }
}
