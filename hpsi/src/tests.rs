use super::*;
use approx::assert_abs_diff_eq;
use crystal::Crystal;
use fftgrid::FFTGrid;
use lattice::Lattice;
use pspot::{PSPot, PspSource};
use pwdensity::PWDensity;
use std::collections::BTreeMap;
use vector3::Vector3f64;

struct Setup {
    crystal: Crystal,
    pots: PSPot,
    gvec: GVector,
    rgtrans: RGTransform,
    pwwfc: PWBasis,
    shape: [usize; 3],
}

fn setup() -> Setup {
    let latt = Lattice::from_columns(&[[6.0, 0.0, 0.0], [0.0, 6.0, 0.0], [0.0, 0.0, 6.0]]);

    let crystal = Crystal::new(latt.clone(), vec!["Si".to_string()], vec![Vector3f64::new(0.1, 0.2, 0.3)]).unwrap();

    let mut sources = BTreeMap::new();
    sources.insert("Si".to_string(), PspSource::library("Si-q4"));
    let pots = PSPot::new(&sources).unwrap();

    let ecut = 2.0;
    let fftgrid = FFTGrid::new(&latt, 4.0 * ecut);
    let gvec = GVector::new(&latt, &fftgrid);
    let pwden = PWDensity::new(4.0 * ecut, &gvec);
    let rgtrans = RGTransform::new(&fftgrid, &gvec, &pwden);

    let xk = latt.reciprocal().frac_to_cart(&Vector3f64::new(0.25, 0.0, 0.1));
    let pwwfc = PWBasis::new(xk, 0, ecut, &gvec).unwrap();

    Setup {
        crystal,
        pots,
        gvec,
        rgtrans,
        pwwfc,
        shape: fftgrid.get_size(),
    }
}

#[test]
fn test_constant_potential_shifts_kinetic() {
    let s = setup();

    let v0 = -0.37;
    let mut vloc_3d = Array3::<c64>::new(s.shape);
    vloc_3d.set_value(c64::new(v0, 0.0));

    let mut ham = Hamiltonian::new();
    ham.push(Box::new(KineticTerm::new(&s.pwwfc)));
    ham.push(Box::new(LocalPotentialTerm::new(&s.gvec, &s.pwwfc, &s.rgtrans, &vloc_3d)));

    let npw = s.pwwfc.get_n_plane_waves();
    let psi = Matrix::<c64>::identity(npw).columns(0, 3);
    let mut hpsi = Matrix::<c64>::new(npw, 3);

    ham.apply(&psi, &mut hpsi);

    let kin = s.pwwfc.get_kinetic_diagonal();

    for ib in 0..3 {
        for ipw in 0..npw {
            let expected = if ipw == ib { kin[ib] + v0 } else { 0.0 };

            assert_abs_diff_eq!(hpsi[[ipw, ib]].re, expected, epsilon = 1e-12);
            assert_abs_diff_eq!(hpsi[[ipw, ib]].im, 0.0, epsilon = 1e-12);
        }
    }

    let ekin = ham.get_term("kinetic").unwrap().expectation_values(&psi);
    assert_abs_diff_eq!(ekin[2], kin[2], epsilon = 1e-14);
}

#[test]
fn test_kohn_sham_operator_is_hermitian() {
    let s = setup();

    // a real, non-uniform potential
    let [n1, n2, n3] = s.shape;
    let mut vloc_3d = Array3::<c64>::new(s.shape);

    for i2 in 0..n3 {
        for i1 in 0..n2 {
            for i0 in 0..n1 {
                let x = i0 as f64 / n1 as f64;
                let z = i2 as f64 / n3 as f64;

                vloc_3d.as_mut_slice()[i0 + i1 * n1 + i2 * n1 * n2] =
                    c64::new((dwconsts::TWOPI * x).cos() + 0.5 * (dwconsts::TWOPI * (x + 2.0 * z)).sin(), 0.0);
            }
        }
    }

    let vnl = VNL::new(&s.pots, &s.crystal, &s.gvec, &s.pwwfc).unwrap();

    let ham = Hamiltonian::kohn_sham(&s.gvec, &s.pwwfc, &s.rgtrans, &vloc_3d, &vnl);

    assert_eq!(ham.get_terms().len(), 3);

    let npw = s.pwwfc.get_n_plane_waves();
    let ident = Matrix::<c64>::identity(npw);
    let mut hmat = Matrix::<c64>::new(npw, npw);

    ham.apply(&ident, &mut hmat);

    for i in 0..npw {
        for j in 0..npw {
            assert_abs_diff_eq!(hmat[[i, j]].re, hmat[[j, i]].re, epsilon = 1e-10);
            assert_abs_diff_eq!(hmat[[i, j]].im, -hmat[[j, i]].im, epsilon = 1e-10);
        }
    }

    // the block application is column-wise
    let mut hcol = Matrix::<c64>::new(npw, 1);
    ham.apply(&ident.columns(4, 1), &mut hcol);

    for i in 0..npw {
        assert_abs_diff_eq!(hcol[[i, 0]].re, hmat[[i, 4]].re, epsilon = 1e-12);
        assert_abs_diff_eq!(hcol[[i, 0]].im, hmat[[i, 4]].im, epsilon = 1e-12);
    }
}
