//! Structure factors S(G) = sum_atoms exp(-2 pi i G.tau), G in Miller
//! indices and tau in fractional coordinates.

use dwconsts::*;
use num_traits::Zero;
use types::c64;
use vector3::*;

pub fn compute_structure_factor(miller: &[Vector3i32], gindex: &[usize], atom_positions: &[Vector3f64]) -> Vec<c64> {
    gindex
        .iter()
        .map(|&ig| {
            atom_positions
                .iter()
                .fold(c64::zero(), |acc, &tau| acc + phase(miller[ig], tau))
        })
        .collect()
}

pub fn compute_structure_factor_for_many_g_one_atom(
    miller: &[Vector3i32],
    gindex: &[usize],
    atom_position: Vector3f64,
) -> Vec<c64> {
    gindex.iter().map(|&ig| phase(miller[ig], atom_position)).collect()
}

fn phase(g: Vector3i32, tau: Vector3f64) -> c64 {
    let gr = utility::dot_product_v3i32_v3f64(g, tau);

    (-I_C64 * TWOPI * gr).exp()
}
