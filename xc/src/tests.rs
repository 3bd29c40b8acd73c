use super::*;
use crate::correlation::pbe::pbe_c_unpolarized;
use crate::correlation::pw92::{pw92_unpolarized, rs_of_rho};
use crate::correlation::pz::pz_unpolarized;
use crate::exchange::pbe::pbe_x_unpolarized;
use crate::exchange::slater::slater_unpolarized;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use dwconsts::*;
use fftgrid::FFTGrid;
use gvector::GVector;
use lattice::Lattice;
use ndarray::Array3;
use pwdensity::PWDensity;
use rgtransform::RGTransform;
use serde::Deserialize;
use types::c64;

fn energy_density(f: impl Fn(f64, f64) -> (f64, f64, f64), rho: f64, sigma: f64) -> f64 {
    rho * f(rho, sigma).0
}

fn check_derivatives(f: impl Fn(f64, f64) -> (f64, f64, f64) + Copy, rho: f64, sigma: f64) {
    let (_, vrho, vsigma) = f(rho, sigma);

    let h = 1E-6 * rho;
    let fd_rho = (energy_density(f, rho + h, sigma) - energy_density(f, rho - h, sigma)) / (2.0 * h);
    assert_relative_eq!(vrho, fd_rho, max_relative = 1E-6);

    let hs = 1E-6 * sigma;
    let fd_sigma = (energy_density(f, rho, sigma + hs) - energy_density(f, rho, sigma - hs)) / (2.0 * hs);
    assert_relative_eq!(vsigma, fd_sigma, max_relative = 1E-5);
}

#[test]
fn test_slater_at_unit_density() {
    let (vx, ex) = slater_unpolarized(1.0);

    assert_abs_diff_eq!(vx, -(3.0 / PI).cbrt(), epsilon = 1E-14);
    assert_abs_diff_eq!(ex, 0.75 * vx, epsilon = 1E-14);
}

#[test]
fn test_pz_potential_is_derivative_of_energy() {
    for &rho in [1E-3, 0.05, 2.0].iter() {
        let (vc, _) = pz_unpolarized(rho);

        let h = 1E-6 * rho;
        let ep = (rho + h) * pz_unpolarized(rho + h).1;
        let em = (rho - h) * pz_unpolarized(rho - h).1;

        assert_relative_eq!(vc, (ep - em) / (2.0 * h), max_relative = 1E-6);
    }
}

#[test]
fn test_pw92_close_to_pz() {
    // rs = 2
    let rho = 3.0 / (FOURPI * 8.0);
    assert_relative_eq!(rs_of_rho(rho), 2.0, max_relative = 1E-12);

    let pw = pw92_unpolarized(rho);
    let (_, ec_pz) = pz_unpolarized(rho);

    assert!(pw.ec < 0.0);
    assert_abs_diff_eq!(pw.ec, ec_pz, epsilon = 1E-3);

    let h = 1E-6 * rho;
    let fd = ((rho + h) * pw92_unpolarized(rho + h).ec - (rho - h) * pw92_unpolarized(rho - h).ec) / (2.0 * h);
    assert_relative_eq!(pw.vc, fd, max_relative = 1E-6);
}

#[test]
fn test_pbe_reduces_to_local_at_zero_gradient() {
    let rho = 0.07;

    let (ex, vx, _) = pbe_x_unpolarized(rho, 0.0);
    let (vx_lda, ex_lda) = slater_unpolarized(rho);
    assert_relative_eq!(ex, ex_lda, max_relative = 1E-12);
    assert_relative_eq!(vx, vx_lda, max_relative = 1E-12);

    let (ec, vc, _) = pbe_c_unpolarized(rho, 0.0);
    let pw = pw92_unpolarized(rho);
    assert_relative_eq!(ec, pw.ec, max_relative = 1E-12);
    assert_relative_eq!(vc, pw.vc, max_relative = 1E-12);
}

#[test]
fn test_pbe_derivatives_match_finite_differences() {
    for &(rho, sigma) in [(0.1, 0.05), (0.02, 1E-3), (1.5, 0.8)].iter() {
        check_derivatives(pbe_x_unpolarized, rho, sigma);
        check_derivatives(pbe_c_unpolarized, rho, sigma);
    }
}

#[test]
fn test_pbe_exchange_enhancement_is_bounded() {
    let rho = 0.01;
    let (ex, _, _) = pbe_x_unpolarized(rho, 1E6);
    let (_, ex_lda) = slater_unpolarized(rho);

    // Lieb-Oxford: Fx <= 1 + kappa
    assert!(ex / ex_lda <= 1.804 + 1E-12);
    assert!(ex / ex_lda > 1.0);
}

#[derive(Deserialize)]
struct Input {
    xc: XCInput,
}

#[test]
fn test_functional_from_toml() {
    let pbe: Input = toml::from_str("xc = \"pbe\"").unwrap();
    let f = XCFunctional::new(&pbe.xc).unwrap();
    assert_eq!(f.get_ids(), vec!["gga_x_pbe", "gga_c_pbe"]);
    assert!(f.needs_gradient());

    let list: Input = toml::from_str("xc = [\"lda_x\", \"lda_c_pz\"]").unwrap();
    let f = XCFunctional::new(&list.xc).unwrap();
    assert_eq!(f.get_ids(), vec!["lda_x", "lda_c_pz"]);
    assert!(!f.needs_gradient());

    let none: Input = toml::from_str("xc = \"none\"").unwrap();
    assert!(XCFunctional::new(&none.xc).unwrap().is_empty());

    let bad: Input = toml::from_str("xc = [\"lda_x\", \"gga_x_b88\"]").unwrap();
    assert_eq!(
        XCFunctional::new(&bad.xc).err(),
        Some(XCError::UnknownScheme("gga_x_b88".to_string()))
    );
}

#[test]
fn test_floor_gives_zero_contribution() {
    let f = XCFunctional::new(&XCInput::Shortcut("pbe".to_string())).unwrap();

    let rho = [1E-12, -1E-3, 0.1];
    let sigma = [0.0, 0.0, 0.01];
    let mut exc = [1.0; 3];
    let mut vrho = [1.0; 3];
    let mut vsigma = [1.0; 3];

    f.compute_batch(&rho, &sigma, &mut exc, &mut vrho, &mut vsigma);

    for i in 0..2 {
        assert_eq!(exc[i], 0.0);
        assert_eq!(vrho[i], 0.0);
        assert_eq!(vsigma[i], 0.0);
    }
    assert!(exc[2] < 0.0);
}

struct Grid {
    latt: Lattice,
    gvec: GVector,
    pwden: PWDensity,
    rgtrans: RGTransform,
    size: [usize; 3],
}

fn cubic_grid(a: f64) -> Grid {
    let latt = Lattice::from_columns(&[[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]);
    let fftgrid = FFTGrid::new(&latt, 8.0);
    let gvec = GVector::new(&latt, &fftgrid);
    let pwden = PWDensity::new(8.0, &gvec);
    let rgtrans = RGTransform::new(&fftgrid, &gvec, &pwden);
    let size = fftgrid.get_size();

    Grid { latt, gvec, pwden, rgtrans, size }
}

fn density_with_wave(grid: &Grid, a: f64, mean: f64, amp: f64) -> Array3<c64> {
    let [n1, n2, n3] = grid.size;
    let q = TWOPI / a;

    let mut rho = Array3::<c64>::new(grid.size);
    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                let x = a * i as f64 / n1 as f64;
                rho[[i, j, k]] = c64::new(mean + amp * (q * x).cos(), 0.0);
            }
        }
    }

    rho
}

#[test]
fn test_driver_uniform_density() {
    let a = 6.0;
    let grid = cubic_grid(a);
    let volume = grid.latt.volume();
    let driver = XCDriver::new(&grid.gvec, &grid.pwden, &grid.rgtrans);

    let rho0 = 0.03;
    let rho = density_with_wave(&grid, a, rho0, 0.0);
    let mut vxc = Array3::<c64>::new(grid.size);

    for shortcut in ["lda-pz", "pbe"].iter() {
        let f = XCFunctional::new(&XCInput::Shortcut(shortcut.to_string())).unwrap();
        let exc = driver.compute(&f, &rho, volume, &mut vxc).unwrap();

        let mut e = [0.0];
        let mut v = [0.0];
        let mut vs = [0.0];
        f.compute_batch(&[rho0], &[0.0], &mut e, &mut v, &mut vs);

        assert_relative_eq!(exc, volume * rho0 * e[0], max_relative = 1E-10);
        for x in vxc.as_slice().iter() {
            assert_abs_diff_eq!(x.re, v[0], epsilon = 1E-10);
        }
    }
}

#[test]
fn test_driver_gga_potential_is_functional_derivative() {
    let a = 6.0;
    let grid = cubic_grid(a);
    let volume = grid.latt.volume();
    let driver = XCDriver::new(&grid.gvec, &grid.pwden, &grid.rgtrans);
    let f = XCFunctional::new(&XCInput::Shortcut("pbe".to_string())).unwrap();

    let rho = density_with_wave(&grid, a, 0.05, 0.02);
    let delta = density_with_wave(&grid, a, 0.0, 1.0);

    let mut vxc = Array3::<c64>::new(grid.size);
    driver.compute(&f, &rho, volume, &mut vxc).unwrap();

    let ntot = rho.len() as f64;
    let dedv: f64 = vxc
        .as_slice()
        .iter()
        .zip(delta.as_slice().iter())
        .map(|(v, d)| v.re * d.re)
        .sum::<f64>()
        * volume
        / ntot;

    let eps = 1E-4;
    let mut scratch = Array3::<c64>::new(grid.size);

    let mut rho_p = rho.clone();
    rho_p.scaled_add(&delta, eps);
    let ep = driver.compute(&f, &rho_p, volume, &mut scratch).unwrap();

    let mut rho_m = rho.clone();
    rho_m.scaled_add(&delta, -eps);
    let em = driver.compute(&f, &rho_m, volume, &mut scratch).unwrap();

    assert_relative_eq!(dedv, (ep - em) / (2.0 * eps), max_relative = 1E-5);
}

#[test]
fn test_driver_rejects_nan_density() {
    let grid = cubic_grid(5.0);
    let driver = XCDriver::new(&grid.gvec, &grid.pwden, &grid.rgtrans);
    let f = XCFunctional::new(&XCInput::default()).unwrap();

    let mut rho = Array3::<c64>::new(grid.size);
    rho.set_value(c64::new(0.01, 0.0));
    rho[[1, 0, 0]] = c64::new(f64::NAN, 0.0);

    let mut vxc = Array3::<c64>::new(grid.size);

    match driver.compute(&f, &rho, 125.0, &mut vxc) {
        Err(XCError::InvalidDensity { index, .. }) => assert_eq!(index, 1),
        other => panic!("unexpected {:?}", other),
    }
}
