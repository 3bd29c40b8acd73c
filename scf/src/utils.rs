use eigensolver::{EigenSolver, EigenSolverError, EigenSolverStats};
use fermilevel::Occupations;
use gvector::GVector;
use itertools::multizip;
use kscf::{SolverSettings, KSCF};
use ndarray::Array3;
use rayon::prelude::*;
use rgtransform::RGTransform;
use types::*;

const PARALLEL_MIN_LEN: usize = 8192;

// residual tolerance of the first diagonalization from an atomic guess
const EIGVAL_EPSILON_START: f64 = 1E-3;

#[inline]
fn use_parallel_for_len(len: usize) -> bool {
    len >= PARALLEL_MIN_LEN && rayon::current_num_threads() > 1
}

// v_xc + v_h + v_psloc in G space

pub fn add_up_v(vpslocg: &[c64], vhg: &[c64], vxcg: &[c64], vlocg: &mut [c64]) {
    debug_assert_eq!(vpslocg.len(), vlocg.len());
    debug_assert_eq!(vhg.len(), vlocg.len());
    debug_assert_eq!(vxcg.len(), vlocg.len());

    if use_parallel_for_len(vlocg.len()) {
        vlocg
            .par_iter_mut()
            .zip(vxcg.par_iter())
            .zip(vhg.par_iter())
            .zip(vpslocg.par_iter())
            .for_each(|(((v_loc, v_xc), v_ha), v_psloc)| {
                *v_loc = *v_xc + *v_ha + *v_psloc;
            });
    } else {
        for (v_loc, v_xc, v_ha, v_psloc) in multizip((vlocg.iter_mut(), vxcg.iter(), vhg.iter(), vpslocg.iter())) {
            *v_loc = *v_xc + *v_ha + *v_psloc;
        }
    }
}

/// rho(G=0) = N_el / Omega
pub fn renormalize_density(rhog: &mut [c64], n_electrons: f64, volume: f64) {
    if let Some(g0) = rhog.first_mut() {
        *g0 = c64::new(n_electrons / volume, 0.0);
    }
}

pub fn is_finite_slice(v: &[c64]) -> bool {
    v.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

pub fn is_finite_3d(v: &Array3<c64>) -> bool {
    is_finite_slice(v.as_slice())
}

/// Residual tolerance of the band solver in this SCF step. Loose while the
/// density is far from self-consistency, tightened with the last density
/// change, never below `eigval_epsilon`.
pub fn get_eigvalue_epsilon(eigval_epsilon: f64, n_electrons: f64, drho_prev: Option<f64>) -> f64 {
    let eps = match drho_prev {
        None => EIGVAL_EPSILON_START,
        Some(drho) => EIGVAL_EPSILON_START.min(0.1 * drho / n_electrons.max(1.0)),
    };

    eps.max(eigval_epsilon)
}

/// Diagonalize every k point in parallel; each worker owns one KSCF.
pub fn solve_eigen_equations(
    vkscf: &mut [KSCF],
    gvec: &GVector,
    rgtrans: &RGTransform,
    vloc_3d: &Array3<c64>,
    solver: &dyn EigenSolver,
    settings: &SolverSettings,
) -> Result<Vec<EigenSolverStats>, EigenSolverError> {
    vkscf
        .par_iter_mut()
        .map(|kscf| kscf.run(gvec, rgtrans, vloc_3d, solver, settings))
        .collect()
}

pub fn set_occupations(vkscf: &mut [KSCF], occ: &Occupations) {
    for (kscf, f, df) in multizip((vkscf.iter_mut(), occ.occ.iter(), occ.occ_derivative.iter())) {
        kscf.set_occupations(f, df);
    }
}

pub fn collect_eigen_values(vkscf: &[KSCF]) -> Vec<Vec<f64>> {
    vkscf.iter().map(|k| k.get_evals().to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eigvalue_epsilon_schedule() {
        assert_eq!(get_eigvalue_epsilon(1E-8, 8.0, None), EIGVAL_EPSILON_START);

        // tightened with the density change
        let e1 = get_eigvalue_epsilon(1E-8, 8.0, Some(1E-2));
        let e2 = get_eigvalue_epsilon(1E-8, 8.0, Some(1E-4));
        assert!(e2 < e1 && e1 <= EIGVAL_EPSILON_START);

        // a converged starting density uses the final tolerance at once
        assert_eq!(get_eigvalue_epsilon(1E-8, 8.0, Some(0.0)), 1E-8);
    }

    #[test]
    fn test_renormalize_density() {
        let mut rhog = vec![c64::new(0.3, 0.1), c64::new(1.0, 0.0)];

        renormalize_density(&mut rhog, 8.0, 4.0);

        assert_eq!(rhog[0], c64::new(2.0, 0.0));
        assert_eq!(rhog[1], c64::new(1.0, 0.0));
    }

    #[test]
    fn test_add_up_v() {
        let n = 3;
        let a = vec![c64::new(1.0, 0.0); n];
        let b = vec![c64::new(0.0, 2.0); n];
        let c = vec![c64::new(-0.5, 0.0); n];
        let mut v = vec![c64::new(9.0, 9.0); n];

        add_up_v(&a, &b, &c, &mut v);

        assert!(v.iter().all(|z| *z == c64::new(0.5, 2.0)));
        assert!(is_finite_slice(&v));

        v[1] = c64::new(f64::NAN, 0.0);
        assert!(!is_finite_slice(&v));
    }
}
