use atompsp::AtomPSP;
use crystal::{Crystal, CrystalError};
use gvector::GVector;
use itertools::multizip;
use num_traits::identities::Zero;
use pspot::PSPot;
use pwdensity::PWDensity;
use types::*;
use vector3::*;

/// V_loc(G) on the density sphere as a superposition of atomic form factors.
/// The G = 0 term is zero: its divergent part cancels against Hartree and
/// the finite remainder enters the energy through the pseudopotential
/// correction.
pub fn from_atomic_super_position(
    pspot: &PSPot,
    crystal: &Crystal,
    gvec: &GVector,
    pwden: &PWDensity,
) -> Result<Vec<c64>, CrystalError> {
    let volume = crystal.get_latt().volume();

    let mut vlocg = vec![c64::zero(); pwden.get_n_plane_waves()];

    for (isp, sp) in crystal.get_unique_species().iter().enumerate() {
        let atpsp = pspot
            .get_psp(sp)
            .ok_or_else(|| CrystalError::MissingPseudopotential(sp.clone()))?;

        let atom_positions = crystal.get_atom_positions_of_specie(isp);

        let vlocg_one = atom_super_pos_one_specie(atpsp, &atom_positions, pwden, gvec, volume);

        for (x, y) in multizip((vlocg_one.iter(), vlocg.iter_mut())) {
            *y += *x;
        }
    }

    Ok(vlocg)
}

fn atom_super_pos_one_specie(
    atompsp: &dyn AtomPSP,
    atom_positions: &[Vector3f64],
    pwden: &PWDensity,
    gvec: &GVector,
    volume: f64,
) -> Vec<c64> {
    // structure factor

    let sfact = fhkl::compute_structure_factor(gvec.get_miller(), pwden.get_gindex(), atom_positions);

    // form factor on G shells

    let ffact_vloc = vloc_of_g_on_shells(atompsp, pwden, volume);

    multizip((sfact.iter(), pwden.get_gshell_index().iter()))
        .map(|(s, &ish)| ffact_vloc[ish] * *s)
        .collect()
}

pub fn vloc_of_g_on_shells(atompsp: &dyn AtomPSP, pwden: &PWDensity, volume: f64) -> Vec<f64> {
    pwden
        .get_gshell_norms()
        .iter()
        .map(|&g| {
            if g < dwconsts::EPS10 {
                0.0
            } else {
                atompsp.get_vloc_of_q(g) / volume
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use fftgrid::FFTGrid;
    use lattice::Lattice;
    use pspot::PspSource;
    use std::collections::BTreeMap;

    #[test]
    fn test_single_atom_at_origin() {
        let latt = Lattice::from_columns(&[[8.0, 0.0, 0.0], [0.0, 8.0, 0.0], [0.0, 0.0, 8.0]]);
        let crystal = Crystal::new(latt.clone(), vec!["Si".to_string()], vec![Vector3f64::zeros()]).unwrap();

        let mut sources = BTreeMap::new();
        sources.insert("Si".to_string(), PspSource::library("Si-q4"));
        let pspot = PSPot::new(&sources).unwrap();

        let fftgrid = FFTGrid::new(&latt, 10.0);
        let gvec = GVector::new(&latt, &fftgrid);
        let pwden = PWDensity::new(10.0, &gvec);

        let vlocg = from_atomic_super_position(&pspot, &crystal, &gvec, &pwden).unwrap();

        assert_eq!(vlocg[0], c64::zero());

        let psp = pspot.get_psp("Si").unwrap();
        let g = pwden.get_g();

        for ig in 1..vlocg.len() {
            assert_abs_diff_eq!(vlocg[ig].re, psp.get_vloc_of_q(g[ig]) / latt.volume(), epsilon = 1e-12);
            assert_abs_diff_eq!(vlocg[ig].im, 0.0, epsilon = 1e-14);
        }

        // attractive at small G
        assert!(vlocg[1].re < 0.0);
    }

    #[test]
    fn test_missing_species() {
        let latt = Lattice::from_columns(&[[8.0, 0.0, 0.0], [0.0, 8.0, 0.0], [0.0, 0.0, 8.0]]);
        let crystal = Crystal::new(latt.clone(), vec!["C".to_string()], vec![Vector3f64::zeros()]).unwrap();

        let pspot = PSPot::new(&BTreeMap::new()).unwrap();

        let fftgrid = FFTGrid::new(&latt, 4.0);
        let gvec = GVector::new(&latt, &fftgrid);
        let pwden = PWDensity::new(4.0, &gvec);

        assert_eq!(
            from_atomic_super_position(&pspot, &crystal, &gvec, &pwden).err(),
            Some(CrystalError::MissingPseudopotential("C".to_string()))
        );
    }
}
