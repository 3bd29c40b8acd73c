//! Per-k-point state of the self-consistent cycle: the plane-wave basis,
//! the non-local projectors, and the orbitals with their eigenvalues and
//! occupations. Each KSCF is owned by exactly one worker during an SCF step.

use crystal::{Crystal, CrystalError};
use dwconsts::*;
use eigensolver::{EigenSolver, EigenSolverError, EigenSolverStats};
use gvector::GVector;
use hpsi::{Hamiltonian, HamiltonianTerm, KineticTerm, NonLocalTerm};
use itertools::multizip;
use log::debug;
use matrix::Matrix;
use ndarray::Array3;
use preconditioner::PrecondScheme;
use pspot::PSPot;
use pwbasis::{BasisError, PWBasis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rgtransform::RGTransform;
use std::fmt;
use types::c64;
use vector3::Vector3f64;
use vnl::VNL;

#[derive(Debug, Clone, PartialEq)]
pub enum KSCFError {
    Basis(BasisError),
    Crystal(CrystalError),
    TooManyBands { k_index: usize, nband: usize, npw: usize },
}

impl fmt::Display for KSCFError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KSCFError::Basis(e) => write!(f, "{}", e),
            KSCFError::Crystal(e) => write!(f, "{}", e),
            KSCFError::TooManyBands { k_index, nband, npw } => write!(
                f,
                "{} bands requested but k-point {} has only {} plane waves",
                nband, k_index, npw
            ),
        }
    }
}

impl std::error::Error for KSCFError {}

impl From<BasisError> for KSCFError {
    fn from(e: BasisError) -> Self {
        KSCFError::Basis(e)
    }
}

impl From<CrystalError> for KSCFError {
    fn from(e: CrystalError) -> Self {
        KSCFError::Crystal(e)
    }
}

/// Eigensolver settings shared by all k points in one SCF iteration.
#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    pub precond_scheme: PrecondScheme,
    pub precond_shift: f64,
    pub tol: f64,
    pub max_iter: usize,
}

pub struct KSCF {
    ik: usize,
    k_weight: f64,
    pwwfc: PWBasis,
    vnl: VNL,
    kin: Vec<f64>,
    fft_linear_index: Vec<usize>,

    evecs: Matrix<c64>,
    evals: Vec<f64>,
    occ: Vec<f64>,
    occ_derivative: Vec<f64>,
}

impl KSCF {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ik: usize,
        k_cart: Vector3f64,
        k_weight: f64,
        ecut: f64,
        nband: usize,
        gvec: &GVector,
        crystal: &Crystal,
        pspot: &PSPot,
        fft_shape: [usize; 3],
        seed: u64,
    ) -> Result<KSCF, KSCFError> {
        let pwwfc = PWBasis::new(k_cart, ik, ecut, gvec)?;

        let npw = pwwfc.get_n_plane_waves();

        if nband > npw {
            return Err(KSCFError::TooManyBands { k_index: ik, nband, npw });
        }

        let vnl = VNL::new(pspot, crystal, gvec, &pwwfc)?;

        let kin = pwwfc.get_kinetic_diagonal();

        let fft_linear_index = utility::compute_fft_linear_index_map(gvec.get_miller(), pwwfc.get_gindex(), fft_shape);

        let evecs = random_trial_block(&kin, nband, seed.wrapping_add(ik as u64));

        Ok(KSCF {
            ik,
            k_weight,
            pwwfc,
            vnl,
            kin,
            fft_linear_index,
            evecs,
            evals: vec![0.0; nband],
            occ: vec![0.0; nband],
            occ_derivative: vec![0.0; nband],
        })
    }

    pub fn get_ik(&self) -> usize {
        self.ik
    }

    pub fn get_k_weight(&self) -> f64 {
        self.k_weight
    }

    pub fn get_pwwfc(&self) -> &PWBasis {
        &self.pwwfc
    }

    pub fn get_vnl(&self) -> &VNL {
        &self.vnl
    }

    pub fn get_nbands(&self) -> usize {
        self.evals.len()
    }

    pub fn get_evals(&self) -> &[f64] {
        &self.evals
    }

    pub fn get_evecs(&self) -> &Matrix<c64> {
        &self.evecs
    }

    pub fn get_occ(&self) -> &[f64] {
        &self.occ
    }

    pub fn get_occ_derivative(&self) -> &[f64] {
        &self.occ_derivative
    }

    pub fn get_fft_linear_index(&self) -> &[usize] {
        &self.fft_linear_index
    }

    pub fn set_occupations(&mut self, occ: &[f64], occ_derivative: &[f64]) {
        self.occ.copy_from_slice(occ);
        self.occ_derivative.copy_from_slice(occ_derivative);
    }

    /// Lowest bands of H[vloc]. The current orbitals are the starting block,
    /// so every call after the first is a warm start.
    pub fn run(
        &mut self,
        gvec: &GVector,
        rgtrans: &RGTransform,
        vloc_3d: &Array3<c64>,
        solver: &dyn EigenSolver,
        settings: &SolverSettings,
    ) -> Result<EigenSolverStats, EigenSolverError> {
        let ham = Hamiltonian::kohn_sham(gvec, &self.pwwfc, rgtrans, vloc_3d, &self.vnl);

        let precond = preconditioner::new(settings.precond_scheme, &self.kin, settings.precond_shift);

        let ham_on_psi = |vin: &Matrix<c64>, vout: &mut Matrix<c64>| ham.apply(vin, vout);

        let stats = solver.compute(
            &ham_on_psi,
            precond.as_ref(),
            &mut self.evecs,
            &mut self.evals,
            settings.tol,
            settings.max_iter,
        )?;

        if !stats.converged {
            debug!(
                "k-point {}: {} of {} bands converged after {} iterations, max residual {:.3e}",
                self.ik,
                stats.n_band_converged,
                self.evals.len(),
                stats.n_iter,
                stats.max_residual
            );
        }

        Ok(stats)
    }

    /// psi_nk(r) on the grid, without the Bloch phase
    pub fn get_unk(
        &self,
        rgtrans: &RGTransform,
        volume: f64,
        ib: usize,
        unk: &mut Array3<c64>,
        fft_workspace: &mut Array3<c64>,
    ) {
        hpsi::compute_unk_3d_with_cached_fft_index(
            rgtrans,
            volume,
            &self.fft_linear_index,
            self.evecs.get_col(ib),
            unk,
            fft_workspace,
        );
    }

    /// sum_n f_n e_n, without the k weight
    pub fn get_band_energy(&self) -> f64 {
        multizip((self.occ.iter(), self.evals.iter()))
            .map(|(f, e)| f * e)
            .sum()
    }

    /// sum_n f_n <psi_n|T|psi_n>, without the k weight
    pub fn get_kinetic_energy(&self) -> f64 {
        let term = KineticTerm::new(&self.pwwfc);

        self.occupied_expectation(&term)
    }

    /// sum_n f_n <psi_n|V_nl|psi_n>, without the k weight
    pub fn get_nonlocal_energy(&self) -> f64 {
        if self.vnl.get_n_projectors() == 0 {
            return 0.0;
        }

        let term = NonLocalTerm::new(&self.vnl);

        self.occupied_expectation(&term)
    }

    fn occupied_expectation(&self, term: &dyn HamiltonianTerm) -> f64 {
        let nocc = self.occ.iter().rposition(|&f| f.abs() > EPS20).map_or(0, |i| i + 1);

        if nocc == 0 {
            return 0.0;
        }

        let psi = self.evecs.columns(0, nocc);

        multizip((self.occ.iter(), term.expectation_values(&psi).iter()))
            .map(|(f, e)| f * e)
            .sum()
    }
}

/// Random vectors damped by 1/(T+1) so the start is smooth; the same seed
/// gives the same block.
fn random_trial_block(kin: &[f64], nband: usize, seed: u64) -> Matrix<c64> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut evecs = Matrix::<c64>::new(kin.len(), nband);

    for ib in 0..nband {
        let evec = evecs.get_mut_col(ib);

        utility::make_normalized_rand_vector(&mut rng, evec);

        for (x, t) in multizip((evec.iter_mut(), kin.iter())) {
            *x /= t + 1.0;
        }

        utility::normalize_vector_c64(evec);
    }

    evecs
}
