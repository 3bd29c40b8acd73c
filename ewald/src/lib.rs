//! Ion-ion energy of point charges Z in a neutralizing background, split
//! with the Ewald parameter eta into
//!
//!   E = 1/2 sum' Z_i Z_j erfc(sqrt(eta) r) / r
//!     + 2 pi / Omega sum_{G != 0} |S(G)|^2 exp(-G^2 / 4 eta) / G^2
//!     - sqrt(eta / pi) sum Z_i^2 - pi (sum Z_i)^2 / (2 Omega eta)
//!
//! where the primed real-space sum runs over all lattice vectors R and
//! skips only i == j at R = 0.

use crystal::Crystal;
use dwconsts::*;
use gvector::GVector;
use log::debug;
use num_traits::identities::Zero;
use pwdensity::PWDensity;
use types::*;
use vector3::*;

const EWALD_EPS: f64 = 1E-30;

#[derive(Debug, Clone, Copy, Default)]
pub struct Ewald {
    energy_r: f64,
    energy_g: f64,
    energy_self: f64,
    energy_background: f64,
}

impl Ewald {
    pub fn new(crystal: &Crystal, zions: &[f64], gvec: &GVector, pwden: &PWDensity) -> Ewald {
        assert_eq!(zions.len(), crystal.get_n_atoms());

        // cutoff in G space
        let eta = get_eta_based_on_gcut(pwden, EWALD_EPS);

        // cutoff in R space
        let rmax = get_rmax_based_on_eta(eta, EWALD_EPS);

        let cells = make_near_cells(crystal, rmax);

        let volume = crystal.get_latt().volume();

        let energy_r = compute_energy_real_space_part(crystal, zions, eta, &cells);
        let energy_g = compute_energy_g_space_part(zions, crystal, gvec, pwden, eta);

        let zsum: f64 = zions.iter().sum();
        let z2sum: f64 = zions.iter().map(|z| z * z).sum();

        let energy_self = -(eta / PI).sqrt() * z2sum;
        let energy_background = -PI * zsum * zsum / (2.0 * volume * eta);

        debug!(
            "ewald: eta = {:.6}, rmax = {:.3}, {} cells, real = {:.10}, recip = {:.10}",
            eta,
            rmax,
            cells.len(),
            energy_r,
            energy_g
        );

        Ewald {
            energy_r,
            energy_g,
            energy_self,
            energy_background,
        }
    }

    pub fn get_energy(&self) -> f64 {
        self.energy_r + self.energy_g + self.energy_self + self.energy_background
    }

    pub fn get_real_space_energy(&self) -> f64 {
        self.energy_r
    }

    pub fn get_g_space_energy(&self) -> f64 {
        self.energy_g
    }
}

// lattice translations, in units of a, b, c, with |R| < rmax plus a margin
// covering atoms anywhere in the home cell
fn make_near_cells(crystal: &Crystal, rmax: f64) -> Vec<Vector3i32> {
    let latt = crystal.get_latt();

    let na = (rmax / latt.get_vector_a().norm2()).ceil() as i32 + 2;
    let nb = (rmax / latt.get_vector_b().norm2()).ceil() as i32 + 2;
    let nc = (rmax / latt.get_vector_c().norm2()).ceil() as i32 + 2;

    let mut cells = Vec::new();

    for ia in -na..=na {
        for ib in -nb..=nb {
            for ic in -nc..=nc {
                cells.push(Vector3i32::new(ia, ib, ic));
            }
        }
    }

    cells
}

// 4pi/G^2*exp(-G^2/4/eta) = eps at the largest G of the density sphere

fn get_eta_based_on_gcut(pwden: &PWDensity, eps: f64) -> f64 {
    let gmax = pwden.get_g().iter().cloned().fold(0.0, f64::max);

    let g2 = gmax * gmax;

    -0.25 * g2 / (eps * g2 / FOURPI).ln()
}

fn get_rmax_based_on_eta(eta: f64, eps: f64) -> f64 {
    let mut rmax = 0.1;

    while special::erfc(rmax * eta.sqrt()) > rmax * eps {
        rmax += 0.1;
    }

    rmax
}

fn compute_energy_real_space_part(crystal: &Crystal, zions: &[f64], eta: f64, cells: &[Vector3i32]) -> f64 {
    let latt = crystal.get_latt();

    let atoms = crystal.get_atom_positions();

    let eta_sqrt = eta.sqrt();

    let mut sum = 0.0;

    for cell in cells.iter() {
        let home = cell.x == 0 && cell.y == 0 && cell.z == 0;

        let rcell = Vector3f64::new(cell.x as f64, cell.y as f64, cell.z as f64);

        for (i, ati) in atoms.iter().enumerate() {
            for (j, atj) in atoms.iter().enumerate() {
                if home && i == j {
                    continue;
                }

                // d_i - d_j - R
                let r = latt.frac_to_cart(&(*ati - *atj - rcell)).norm2();

                sum += 0.5 * zions[i] * zions[j] / r * special::erfc(eta_sqrt * r);
            }
        }
    }

    sum
}

fn compute_energy_g_space_part(zions: &[f64], crystal: &Crystal, gvec: &GVector, pwden: &PWDensity, eta: f64) -> f64 {
    let npw = pwden.get_n_plane_waves();

    let g = pwden.get_g();

    let gindex = pwden.get_gindex();

    let miller = gvec.get_miller();

    // S(G) = sum_i Z_i exp(-i G.d_i)
    let mut sfact = vec![c64::zero(); npw];

    for (z, atom) in zions.iter().zip(crystal.get_atom_positions().iter()) {
        let phase = fhkl::compute_structure_factor_for_many_g_one_atom(miller, gindex, *atom);

        for (s, p) in sfact.iter_mut().zip(phase.iter()) {
            *s += *z * p;
        }
    }

    let mut sum = 0.0;

    for ig in 0..npw {
        if g[ig] < EPS10 {
            continue;
        }

        let g2 = g[ig] * g[ig];

        sum += sfact[ig].norm_sqr() * (-g2 / 4.0 / eta).exp() / g2;
    }

    sum * TWOPI / crystal.get_latt().volume()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fftgrid::FFTGrid;
    use lattice::Lattice;

    fn ewald_energy(latt: &Lattice, positions: Vec<Vector3f64>, zion: f64, ecutrho: f64) -> f64 {
        let natoms = positions.len();
        let species = vec!["X".to_string(); natoms];

        let crystal = Crystal::new(latt.clone(), species, positions).unwrap();

        let fftgrid = FFTGrid::new(latt, ecutrho);
        let gvec = GVector::new(latt, &fftgrid);
        let pwden = PWDensity::new(ecutrho, &gvec);

        Ewald::new(&crystal, &vec![zion; natoms], &gvec, &pwden).get_energy()
    }

    fn cubic(a: f64) -> Lattice {
        Lattice::from_columns(&[[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    #[test]
    fn test_simple_cubic_madelung() {
        // E = -alpha Z^2 / (2 a), alpha = 2.837297479
        let a = 8.0;
        let e = ewald_energy(&cubic(a), vec![Vector3f64::zeros()], 1.0, 10.0);

        assert_relative_eq!(e, -2.837297479 / (2.0 * a), max_relative = 1e-7);
    }

    #[test]
    fn test_independent_of_cutoff() {
        let a = 6.0;
        let pos = vec![Vector3f64::new(0.1, 0.2, 0.3), Vector3f64::new(0.6, 0.5, 0.9)];

        let e1 = ewald_energy(&cubic(a), pos.clone(), 2.0, 8.0);
        let e2 = ewald_energy(&cubic(a), pos, 2.0, 30.0);

        assert_relative_eq!(e1, e2, max_relative = 1e-8);
    }

    #[test]
    fn test_rigid_translation() {
        let latt = Lattice::from_columns(&[[0.0, 5.13, 5.13], [5.13, 0.0, 5.13], [5.13, 5.13, 0.0]]);

        let pos = vec![Vector3f64::zeros(), Vector3f64::new(0.25, 0.25, 0.25)];
        let shift = Vector3f64::new(0.13, -0.07, 0.41);
        let shifted = pos.iter().map(|p| *p + shift).collect();

        let e1 = ewald_energy(&latt, pos, 4.0, 20.0);
        let e2 = ewald_energy(&latt, shifted, 4.0, 20.0);

        assert!(e1 < 0.0);
        assert_relative_eq!(e1, e2, max_relative = 1e-9);
    }

    #[test]
    fn test_supercell_is_extensive() {
        // bcc: primitive cell versus the two-atom cubic cell
        let a = 6.0;
        let h = 0.5 * a;

        let primitive = Lattice::from_columns(&[[-h, h, h], [h, -h, h], [h, h, -h]]);

        let e_prim = ewald_energy(&primitive, vec![Vector3f64::zeros()], 2.0, 12.0);

        let e_conv = ewald_energy(
            &cubic(a),
            vec![Vector3f64::zeros(), Vector3f64::new(0.5, 0.5, 0.5)],
            2.0,
            12.0,
        );

        assert_relative_eq!(e_conv, 2.0 * e_prim, max_relative = 1e-8);
    }
}
