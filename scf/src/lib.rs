//! Self-consistent field iteration for a periodic crystal:
//!
//!   rho_in -> V_loc + V_H + V_xc -> bands at every k point -> occupations
//!          -> rho_out -> energies, convergence test -> mixing -> rho_in
//!
//! Running out of iterations is not an error; the result carries a flag.

mod utils;

use control::{Control, ControlError, ConvergenceCriterion, InputFile};
use crystal::{Crystal, CrystalError};
use eigensolver::EigenSolverError;
use energy::Energies;
use ewald::Ewald;
use fermilevel::FermiLevelError;
use fftgrid::FFTGrid;
use gvector::GVector;
use kpts::{KptsError, KPTS};
use kscf::{KSCFError, SolverSettings, KSCF};
use log::{info, warn};
use mixing::{MixingContext, MixingError, MixingScheme};
use ndarray::Array3;
use num_traits::identities::Zero;
use pspot::PSPot;
use pwdensity::PWDensity;
use rgtransform::RGTransform;
use std::fmt;
use types::*;
use vector3::Vector3f64;
use xc::{XCDriver, XCError};

#[derive(Debug, Clone, PartialEq)]
pub enum ScfError {
    Config(ControlError),
    Crystal(CrystalError),
    Kpts(KptsError),
    Psp(atompsp::PspError),
    KSCF(KSCFError),
    EigenSolver(EigenSolverError),
    FermiLevel(FermiLevelError),
    Mixing(MixingError),
    XC(XCError),
    StartingDensity { expected: usize, found: usize },
    /// NaN or Inf in `quantity` during SCF step `iteration`
    NumericalInstability { quantity: &'static str, iteration: usize },
}

impl fmt::Display for ScfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScfError::Config(e) => write!(f, "{}", e),
            ScfError::Crystal(e) => write!(f, "{}", e),
            ScfError::Kpts(e) => write!(f, "{}", e),
            ScfError::Psp(e) => write!(f, "{}", e),
            ScfError::KSCF(e) => write!(f, "{}", e),
            ScfError::EigenSolver(e) => write!(f, "{}", e),
            ScfError::FermiLevel(e) => write!(f, "{}", e),
            ScfError::Mixing(e) => write!(f, "{}", e),
            ScfError::XC(e) => write!(f, "{}", e),
            ScfError::StartingDensity { expected, found } => write!(
                f,
                "starting density has {} coefficients, the density sphere has {}",
                found, expected
            ),
            ScfError::NumericalInstability { quantity, iteration } => {
                write!(f, "{} is not finite in SCF step {}", quantity, iteration)
            }
        }
    }
}

impl std::error::Error for ScfError {}

macro_rules! impl_from_error {
    ($from:ty, $variant:ident) => {
        impl From<$from> for ScfError {
            fn from(e: $from) -> Self {
                ScfError::$variant(e)
            }
        }
    };
}

impl_from_error!(ControlError, Config);
impl_from_error!(CrystalError, Crystal);
impl_from_error!(KptsError, Kpts);
impl_from_error!(atompsp::PspError, Psp);
impl_from_error!(KSCFError, KSCF);
impl_from_error!(EigenSolverError, EigenSolver);
impl_from_error!(FermiLevelError, FermiLevel);
impl_from_error!(MixingError, Mixing);
impl_from_error!(XCError, XC);

/// One row of the iteration table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScfIteration {
    pub iteration: usize,
    pub eigval_epsilon: f64,
    /// k points whose bands missed the tolerance
    pub n_kpts_unconverged: usize,
    pub fermi_level: f64,
    pub charge: f64,
    pub total_energy: f64,
    pub energy_change: f64,
    pub density_change: f64,
}

#[derive(Debug, Clone)]
pub struct ScfResult {
    pub converged: bool,
    pub n_iter: usize,
    /// input density of the last step, the one the convergence test measured
    pub rhog: Vec<c64>,
    pub rho_3d: Array3<c64>,
    pub volume: f64,
    pub n_electrons: f64,
    pub k_frac: Vec<Vector3f64>,
    pub k_weights: Vec<f64>,
    pub n_plane_waves: Vec<usize>,
    /// ascending, per k point
    pub eigenvalues: Vec<Vec<f64>>,
    pub occupations: Vec<Vec<f64>>,
    pub fermi_level: f64,
    pub energies: Energies,
    /// last |rho_out - rho_in|
    pub density_change: f64,
    pub history: Vec<ScfIteration>,
}

impl ScfResult {
    /// sum_k w_k sum_n f_nk
    pub fn get_total_occupation(&self) -> f64 {
        self.occupations
            .iter()
            .zip(self.k_weights.iter())
            .map(|(occ, w)| w * occ.iter().sum::<f64>())
            .sum()
    }

    /// integral of the density over the cell
    pub fn get_charge(&self) -> f64 {
        density::integrate(&self.rho_3d, self.volume)
    }
}

/// Builds crystal, pseudopotentials and k points from a parsed input file
/// and runs the SCF from the atomic guess.
pub fn run_input(input: &InputFile) -> Result<ScfResult, ScfError> {
    let crystal = Crystal::from_input(&input.crystal)?;

    let pspot = PSPot::new(&input.pseudopotentials)?;

    let kpts = kpts::new(&input.kpoints)?;

    run(&input.control, &crystal, &pspot, kpts.as_ref(), None)
}

fn xc_failure(e: XCError, iteration: usize) -> ScfError {
    match e {
        XCError::InvalidDensity { .. } => ScfError::NumericalInstability {
            quantity: "density",
            iteration,
        },
        XCError::NonFinitePotential { .. } => ScfError::NumericalInstability {
            quantity: "exchange-correlation potential",
            iteration,
        },
        e => ScfError::XC(e),
    }
}

fn ensure(ok: bool, quantity: &'static str, iteration: usize) -> Result<(), ScfError> {
    if ok {
        Ok(())
    } else {
        Err(ScfError::NumericalInstability { quantity, iteration })
    }
}

/// Runs the SCF cycle. `rhog_start` replaces the atomic guess; it must live
/// on the density sphere of this crystal and cutoff.
pub fn run(
    control: &Control,
    crystal: &Crystal,
    pspot: &PSPot,
    kpts: &dyn KPTS,
    rhog_start: Option<&[c64]>,
) -> Result<ScfResult, ScfError> {
    control.validate()?;

    crystal.check_pseudopotentials(pspot)?;

    let n_electrons = crystal.get_n_total_electrons(pspot)?;

    let nband = control.get_nband(n_electrons)?;

    let latt = crystal.get_latt();
    let volume = latt.volume();

    // grids

    let fftgrid = FFTGrid::new(latt, control.get_ecutrho());
    let fft_shape = fftgrid.get_size();

    let gvec = GVector::new(latt, &fftgrid);
    let pwden = PWDensity::new(control.get_ecutrho(), &gvec);
    let rgtrans = RGTransform::new(&fftgrid, &gvec, &pwden);

    let npw_rho = pwden.get_n_plane_waves();

    info!("   FFTGrid = {}", fftgrid);
    info!("   npw_rho = {}", npw_rho);
    info!("   n_electrons = {}, n_bands = {}", n_electrons, nband);

    // one KSCF per k point

    let blatt = latt.reciprocal();

    let mut vkscf = Vec::with_capacity(kpts.get_n_kpts());

    for ik in 0..kpts.get_n_kpts() {
        let k_cart = kpts.frac_to_cart(&kpts.get_k_frac(ik), &blatt);

        vkscf.push(KSCF::new(
            ik,
            k_cart,
            kpts.get_k_weight(ik),
            control.get_ecut(),
            nband,
            &gvec,
            crystal,
            pspot,
            fft_shape,
            control.get_seed(),
        )?);
    }

    let k_weights = kpts.get_k_weights();

    // fixed for given ion positions

    let zions = crystal.get_zions(pspot)?;

    let ewald = Ewald::new(crystal, &zions, &gvec, &pwden);

    let psp_correction = energy::psp_correction(crystal, pspot)?;

    let vpslocg = vloc::from_atomic_super_position(pspot, crystal, &gvec, &pwden)?;

    // strategies

    let functional = xc::new(control.get_xc())?;
    let xc_driver = XCDriver::new(&gvec, &pwden, &rgtrans);

    let smearing = smearing::new(control.get_smearing_scheme());

    let solver = eigensolver::new(control.get_eigen_solver());

    let mixing_settings = control.get_mixing_settings();
    let mut mixing = mixing::new(&mixing_settings);

    // starting density

    let mut rhog = vec![c64::zero(); npw_rho];
    let mut rho_3d = Array3::<c64>::new(fft_shape);

    match rhog_start {
        Some(start) => {
            if start.len() != npw_rho {
                return Err(ScfError::StartingDensity {
                    expected: npw_rho,
                    found: start.len(),
                });
            }

            rhog.copy_from_slice(start);

            info!("   start from the given charge density");
        }

        None => {
            density::from_atomic_super_position(pspot, crystal, &gvec, &pwden, &rgtrans, &mut rhog, &mut rho_3d)?;

            info!("   construct charge density from constituent atoms");
        }
    }

    utils::renormalize_density(&mut rhog, n_electrons, volume);
    rgtrans.g1d_to_r3d(&rhog, rho_3d.as_mut_slice());

    info!("   initial_charge = {:.10}", density::integrate(&rho_3d, volume));

    // work arrays

    let mut vhg = vec![c64::zero(); npw_rho];
    let mut vxcg = vec![c64::zero(); npw_rho];
    let mut vlocg = vec![c64::zero(); npw_rho];
    let mut rhog_out = vec![c64::zero(); npw_rho];

    let mut vxc_3d = Array3::<c64>::new(fft_shape);
    let mut vloc_3d = Array3::<c64>::new(fft_shape);
    let mut rho_out_3d = Array3::<c64>::new(fft_shape);

    let mut ldos_3d = match mixing_settings.scheme {
        MixingScheme::Ldos => Some(Array3::<c64>::new(fft_shape)),
        _ => None,
    };

    // a given starting density is taken as nearly self-consistent
    let mut drho_prev = rhog_start.map(|_| 0.0);

    let mut energy_prev: Option<f64> = None;

    let mut history = Vec::new();

    info!(
        "    {:>3}  {:>10} {:>4} {:>14} {:>14} {:>22} {:>12} {:>12}",
        "", "eig_eps", "nkx", "Fermi(Ha)", "charge", "Etot(Ha)", "dE(Ha)", "drho"
    );

    let mut scf_iter = 1;

    let result = loop {
        // local potential of rho_in

        ensure(utils::is_finite_slice(&rhog), "input density", scf_iter)?;

        density::hartree_potential_of_g(&pwden, &rhog, &mut vhg);

        xc_driver
            .compute(&functional, &rho_3d, volume, &mut vxc_3d)
            .map_err(|e| xc_failure(e, scf_iter))?;

        rgtrans.r3d_to_g1d(vxc_3d.as_slice(), &mut vxcg);

        utils::add_up_v(&vpslocg, &vhg, &vxcg, &mut vlocg);

        rgtrans.g1d_to_r3d(&vlocg, vloc_3d.as_mut_slice());

        ensure(utils::is_finite_3d(&vloc_3d), "local potential", scf_iter)?;

        // bands

        let eigval_epsilon = utils::get_eigvalue_epsilon(control.get_eigval_epsilon(), n_electrons, drho_prev);

        let settings = SolverSettings {
            precond_scheme: control.get_precond_scheme(),
            precond_shift: control.get_precond_shift(),
            tol: eigval_epsilon,
            max_iter: control.get_eigen_max_iter(),
        };

        let stats = utils::solve_eigen_equations(&mut vkscf, &gvec, &rgtrans, &vloc_3d, solver.as_ref(), &settings)?;

        let n_kpts_unconverged = stats.iter().filter(|s| !s.converged).count();

        let evals = utils::collect_eigen_values(&vkscf);

        ensure(
            evals.iter().flatten().all(|e| e.is_finite()),
            "eigenvalues",
            scf_iter,
        )?;

        // occupations, shared Fermi level over all k points

        let occ = fermilevel::compute_occupations(
            smearing.as_deref(),
            control.get_temperature(),
            &evals,
            &k_weights,
            n_electrons,
        )?;

        utils::set_occupations(&mut vkscf, &occ);

        // rho_out

        density::compute_charge_density(&vkscf, &rgtrans, volume, &mut rho_out_3d);

        ensure(utils::is_finite_3d(&rho_out_3d), "output density", scf_iter)?;

        rgtrans.r3d_to_g1d(rho_out_3d.as_slice(), &mut rhog_out);

        let charge = density::integrate(&rho_out_3d, volume);

        // energies of the new orbitals and rho_out

        let energy_xc = xc_driver
            .compute(&functional, &rho_out_3d, volume, &mut vxc_3d)
            .map_err(|e| xc_failure(e, scf_iter))?;

        let energies = Energies {
            kinetic: energy::kinetic(&vkscf),
            hartree: density::hartree_energy(&pwden, &rhog_out, volume),
            local: energy::vpsloc(volume, &vpslocg, &rhog_out),
            nonlocal: energy::nonlocal(&vkscf),
            xc: energy_xc,
            ewald: ewald.get_energy(),
            psp_correction,
            entropy: occ.entropy_term,
            band_energy: energy::band_structure(&vkscf),
        };

        ensure(energies.is_finite(), "total energy", scf_iter)?;

        let total_energy = energies.total();

        let energy_change = energy_prev.map_or(f64::INFINITY, |e| (total_energy - e).abs());

        let density_change = density::get_change_in_density(&rhog, &rhog_out, volume);

        let row = ScfIteration {
            iteration: scf_iter,
            eigval_epsilon,
            n_kpts_unconverged,
            fermi_level: occ.fermi_level,
            charge,
            total_energy,
            energy_change,
            density_change,
        };

        info!(
            "    {:>3}: {:>10.3E} {:>4} {:>14.8} {:>14.8} {:>22.12} {:>12.3E} {:>12.3E}",
            row.iteration,
            row.eigval_epsilon,
            row.n_kpts_unconverged,
            row.fermi_level,
            row.charge,
            row.total_energy,
            row.energy_change,
            row.density_change
        );

        history.push(row);

        // check convergence

        let converged = match control.get_convergence() {
            ConvergenceCriterion::Density => density_change < control.get_rho_epsilon(),
            ConvergenceCriterion::Energy => energy_change < control.get_energy_epsilon(),
        };

        if converged || scf_iter == control.get_scf_max_iter() {
            if converged {
                info!("     scf_convergence_success");
            } else {
                warn!(
                    "scf not converged after {} iterations: drho = {:.3E}, dE = {:.3E} Ha",
                    scf_iter, density_change, energy_change
                );
            }

            break ScfResult {
                converged,
                n_iter: scf_iter,
                rhog,
                rho_3d,
                volume,
                n_electrons,
                k_frac: (0..kpts.get_n_kpts()).map(|ik| kpts.get_k_frac(ik)).collect(),
                k_weights,
                n_plane_waves: vkscf.iter().map(|k| k.get_pwwfc().get_n_plane_waves()).collect(),
                eigenvalues: evals,
                occupations: occ.occ,
                fermi_level: occ.fermi_level,
                energies,
                density_change,
                history,
            };
        }

        // next rho_in

        if let Some(ldos_3d) = ldos_3d.as_mut() {
            density::compute_ldos(&vkscf, &rgtrans, volume, ldos_3d);
        }

        let ctx = MixingContext {
            gs: pwden.get_g(),
            rgtrans: &rgtrans,
            ldos_3d: ldos_3d.as_ref(),
        };

        rhog = match mixing.compute_next_density(&ctx, &rhog, &rhog_out) {
            Ok(next) => next,
            Err(MixingError::NonFinite) => {
                return Err(ScfError::NumericalInstability {
                    quantity: "mixed density",
                    iteration: scf_iter,
                })
            }
            Err(e) => return Err(e.into()),
        };

        utils::renormalize_density(&mut rhog, n_electrons, volume);

        rgtrans.g1d_to_r3d(&rhog, rho_3d.as_mut_slice());

        drho_prev = Some(density_change);
        energy_prev = Some(total_energy);

        scf_iter += 1;
    };

    Ok(result)
}
