//! Electron density on the shared grid: the atomic guess, accumulation of
//! orbital densities over k points, and the Hartree potential.

mod hartree;
pub use hartree::*;

use atompsp::AtomPSP;
use crystal::{Crystal, CrystalError};
use dwconsts::*;
use gvector::GVector;
use itertools::multizip;
use kscf::KSCF;
use ndarray::Array3;
use num_traits::identities::Zero;
use pspot::PSPot;
use pwdensity::PWDensity;
use rayon::prelude::*;
use rgtransform::RGTransform;
use types::*;
use vector3::*;

/// Superposition of atomic valence densities, on the density sphere and on
/// the grid. rhog[0] equals N_el / Omega.
pub fn from_atomic_super_position(
    pspot: &PSPot,
    crystal: &Crystal,
    gvec: &GVector,
    pwden: &PWDensity,
    rgtrans: &RGTransform,
    rhog: &mut [c64],
    rho_3d: &mut Array3<c64>,
) -> Result<(), CrystalError> {
    let volume = crystal.get_latt().volume();

    rhog.iter_mut().for_each(|x| *x = c64::zero());

    for (isp, sp) in crystal.get_unique_species().iter().enumerate() {
        let atpsp = pspot
            .get_psp(sp)
            .ok_or_else(|| CrystalError::MissingPseudopotential(sp.clone()))?;

        let atom_positions = crystal.get_atom_positions_of_specie(isp);

        let rhog_one = atom_super_pos_one_specie(atpsp, &atom_positions, pwden, gvec, volume);

        for (x, y) in multizip((rhog_one.iter(), rhog.iter_mut())) {
            *y += *x;
        }
    }

    // 1D Rho(G) -> 3D Rho(r)

    rgtrans.g1d_to_r3d(rhog, rho_3d.as_mut_slice());

    Ok(())
}

fn atom_super_pos_one_specie(
    atompsp: &dyn AtomPSP,
    atom_positions: &[Vector3f64],
    pwden: &PWDensity,
    gvec: &GVector,
    volume: f64,
) -> Vec<c64> {
    let sfact = fhkl::compute_structure_factor(gvec.get_miller(), pwden.get_gindex(), atom_positions);

    // form factor on G shells

    let ffact: Vec<f64> = pwden
        .get_gshell_norms()
        .iter()
        .map(|&g| atompsp.get_atomic_density_of_q(g) / volume)
        .collect();

    multizip((sfact.iter(), pwden.get_gshell_index().iter()))
        .map(|(s, &ish)| ffact[ish] * *s)
        .collect()
}

/// sqrt(Omega sum_G |rho_new(G) - rho(G)|^2), the L2 norm of the change
/// over the cell.
pub fn get_change_in_density(rhog: &[c64], rhog_new: &[c64], volume: f64) -> f64 {
    let delta: f64 = multizip((rhog.iter(), rhog_new.iter()))
        .map(|(x, y)| (x - y).norm_sqr())
        .sum();

    (volume * delta).sqrt()
}

/// Omega/N sum_r rho(r)
pub fn integrate(rho_3d: &Array3<c64>, volume: f64) -> f64 {
    rho_3d.sum().re * volume / rho_3d.len() as f64
}

/// rho(r) = sum_k w_k sum_n f_nk |psi_nk(r)|^2, reduced over k points.
pub fn compute_charge_density(vkscf: &[KSCF], rgtrans: &RGTransform, volume: f64, rho_3d: &mut Array3<c64>) {
    accumulate_orbital_densities(vkscf, rgtrans, volume, KSCF::get_occ, rho_3d);
}

/// Local density of states at the Fermi level,
/// sum_k w_k sum_n 2(-df/de)_nk |psi_nk(r)|^2.
pub fn compute_ldos(vkscf: &[KSCF], rgtrans: &RGTransform, volume: f64, ldos_3d: &mut Array3<c64>) {
    accumulate_orbital_densities(vkscf, rgtrans, volume, KSCF::get_occ_derivative, ldos_3d);
}

fn accumulate_orbital_densities<F>(
    vkscf: &[KSCF],
    rgtrans: &RGTransform,
    volume: f64,
    band_weights: F,
    out_3d: &mut Array3<c64>,
) where
    F: Fn(&KSCF) -> &[f64] + Sync,
{
    let shape = out_3d.shape();

    let total = vkscf
        .par_iter()
        .fold(
            || Array3::<c64>::new(shape),
            |mut acc, kscf| {
                let mut unk = Array3::<c64>::new(shape);
                let mut fft_work = Array3::<c64>::new(shape);

                let wk = kscf.get_k_weight();

                for (ib, &f) in band_weights(kscf).iter().enumerate() {
                    if f.abs() > EPS20 {
                        // c_nk(G) -> u_nk(r)

                        kscf.get_unk(rgtrans, volume, ib, &mut unk, &mut fft_work);

                        acc.scaled_sqr_add(&unk, f * wk);
                    }
                }

                acc
            },
        )
        .reduce(
            || Array3::<c64>::new(shape),
            |mut a, b| {
                a.add_from(&b);
                a
            },
        );

    out_3d.assign(&total);
}

#[cfg(test)]
mod tests;
