use super::*;
use approx::assert_abs_diff_eq;
use fftgrid::FFTGrid;
use lattice::Lattice;
use pspot::PspSource;
use std::collections::BTreeMap;

struct Setup {
    crystal: Crystal,
    pspot: PSPot,
    fftgrid: FFTGrid,
    gvec: GVector,
    pwden: PWDensity,
    rgtrans: RGTransform,
}

fn silicon(ecut: f64) -> Setup {
    let s = 5.13157;
    let latt = Lattice::from_columns(&[[0.0, s, s], [s, 0.0, s], [s, s, 0.0]]);

    let crystal = Crystal::new(
        latt,
        vec!["Si".to_string(), "Si".to_string()],
        vec![Vector3f64::new(0.125, 0.125, 0.125), Vector3f64::new(-0.125, -0.125, -0.125)],
    )
    .unwrap();

    let mut sources = BTreeMap::new();
    sources.insert("Si".to_string(), PspSource::library("Si-q4"));
    let pspot = PSPot::new(&sources).unwrap();

    let fftgrid = FFTGrid::new(crystal.get_latt(), 4.0 * ecut);
    let gvec = GVector::new(crystal.get_latt(), &fftgrid);
    let pwden = PWDensity::new(4.0 * ecut, &gvec);
    let rgtrans = RGTransform::new(&fftgrid, &gvec, &pwden);

    Setup {
        crystal,
        pspot,
        fftgrid,
        gvec,
        pwden,
        rgtrans,
    }
}

fn kpoints(s: &Setup, ecut: f64, nband: usize) -> Vec<KSCF> {
    let blatt = s.crystal.get_latt().reciprocal();
    let ks = [[0.0, 0.0, 0.0], [1.0 / 3.0, 0.0, 0.0]];
    let weights = [0.25, 0.75];

    ks.iter()
        .zip(weights.iter())
        .enumerate()
        .map(|(ik, (k, &w))| {
            let xk = blatt.frac_to_cart(&Vector3f64::new(k[0], k[1], k[2]));

            KSCF::new(
                ik,
                xk,
                w,
                ecut,
                nband,
                &s.gvec,
                &s.crystal,
                &s.pspot,
                s.fftgrid.get_size(),
                11,
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn test_atomic_guess_holds_valence_charge() {
    let s = silicon(4.0);
    let volume = s.crystal.get_latt().volume();

    let mut rhog = vec![c64::zero(); s.pwden.get_n_plane_waves()];
    let mut rho_3d = Array3::<c64>::new(s.fftgrid.get_size());

    from_atomic_super_position(&s.pspot, &s.crystal, &s.gvec, &s.pwden, &s.rgtrans, &mut rhog, &mut rho_3d).unwrap();

    assert_abs_diff_eq!(rhog[0].re * volume, 8.0, epsilon = 1E-10);
    assert_abs_diff_eq!(integrate(&rho_3d, volume), 8.0, epsilon = 1E-8);

    // two atoms at +-tau: the superposition is real in G space
    for x in rhog.iter() {
        assert_abs_diff_eq!(x.im, 0.0, epsilon = 1E-12);
    }
}

#[test]
fn test_atomic_guess_requires_pseudopotentials() {
    let s = silicon(2.0);
    let empty = PSPot::new(&BTreeMap::new()).unwrap();

    let mut rhog = vec![c64::zero(); s.pwden.get_n_plane_waves()];
    let mut rho_3d = Array3::<c64>::new(s.fftgrid.get_size());

    let err = from_atomic_super_position(&empty, &s.crystal, &s.gvec, &s.pwden, &s.rgtrans, &mut rhog, &mut rho_3d);

    assert_eq!(err, Err(CrystalError::MissingPseudopotential("Si".to_string())));
}

#[test]
fn test_change_in_density() {
    let a = vec![c64::new(1.0, 0.0), c64::new(0.5, 0.5)];
    let b = vec![c64::new(1.0, 0.0), c64::new(0.5, -0.5)];

    assert_eq!(get_change_in_density(&a, &a, 10.0), 0.0);
    assert_abs_diff_eq!(get_change_in_density(&a, &b, 4.0), 2.0, epsilon = 1E-14);
}

#[test]
fn test_orbital_density_counts_electrons() {
    let s = silicon(3.0);
    let volume = s.crystal.get_latt().volume();

    let mut vkscf = kpoints(&s, 3.0, 6);

    // fractional fillings summing to 8 per k point
    let occ = [2.0, 2.0, 2.0, 1.5, 0.5, 0.0];
    let deriv = [0.0, 0.0, 0.0, 1.0, 3.0, 0.0];
    for kscf in vkscf.iter_mut() {
        kscf.set_occupations(&occ, &deriv);
    }

    let mut rho_3d = Array3::<c64>::new(s.fftgrid.get_size());
    compute_charge_density(&vkscf, &s.rgtrans, volume, &mut rho_3d);

    assert_abs_diff_eq!(integrate(&rho_3d, volume), 8.0, epsilon = 1E-10);
    assert!(rho_3d.min_real() >= 0.0);

    let mut ldos_3d = Array3::<c64>::new(s.fftgrid.get_size());
    compute_ldos(&vkscf, &s.rgtrans, volume, &mut ldos_3d);

    assert_abs_diff_eq!(integrate(&ldos_3d, volume), 4.0, epsilon = 1E-10);
}

#[test]
fn test_hartree_of_a_cosine() {
    let s = silicon(3.0);
    let volume = s.crystal.get_latt().volume();
    let npw = s.pwden.get_n_plane_waves();

    let mut rhog = vec![c64::zero(); npw];
    rhog[0] = c64::new(1.0, 0.0);
    rhog[1] = c64::new(0.25, 0.0);

    let mut vhg = vec![c64::zero(); npw];
    hartree_potential_of_g(&s.pwden, &rhog, &mut vhg);

    let g = s.pwden.get_g()[1];

    assert_eq!(vhg[0], c64::zero());
    assert_abs_diff_eq!(vhg[1].re, FOURPI * 0.25 / (g * g), epsilon = 1E-12);

    let e = hartree_energy(&s.pwden, &rhog, volume);
    assert_abs_diff_eq!(e, 0.5 * volume * vhg[1].re * 0.25, epsilon = 1E-10);
}
