//! Matrix-free Kohn-Sham Hamiltonian at one k point, applied to blocks of
//! plane-wave coefficients (one column per band).

use gvector::GVector;
use itertools::multizip;
use matrix::Matrix;
use ndarray::Array3;
use pwbasis::PWBasis;
use rayon::prelude::*;
use rgtransform::RGTransform;
use types::c64;
use vnl::VNL;

const PARALLEL_MIN_LEN: usize = 8192;

#[inline]
fn use_parallel_for_len(len: usize) -> bool {
    len >= PARALLEL_MIN_LEN && rayon::current_num_threads() > 1
}

pub trait HamiltonianTerm: Send + Sync {
    fn get_name(&self) -> &'static str;

    /// vout += T vin
    fn apply_block(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>);

    /// <psi_n|T|psi_n> for every column
    fn expectation_values(&self, psi: &Matrix<c64>) -> Vec<f64> {
        let mut tpsi = Matrix::<c64>::new(psi.nrow(), psi.ncol());

        self.apply_block(psi, &mut tpsi);

        (0..psi.ncol())
            .map(|ib| utility::zdot_product(psi.get_col(ib), tpsi.get_col(ib)).re)
            .collect()
    }
}

/// |k+G|^2 / 2, diagonal in reciprocal space.
pub struct KineticTerm {
    kin: Vec<f64>,
}

impl KineticTerm {
    pub fn new(pwwfc: &PWBasis) -> KineticTerm {
        KineticTerm {
            kin: pwwfc.get_kinetic_diagonal(),
        }
    }
}

impl HamiltonianTerm for KineticTerm {
    fn get_name(&self) -> &'static str {
        "kinetic"
    }

    fn apply_block(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>) {
        for ib in 0..vin.ncol() {
            kinetic_on_psi(&self.kin, vin.get_col(ib), vout.get_mut_col(ib));
        }
    }
}

pub fn kinetic_on_psi(kin: &[f64], vin: &[c64], vout: &mut [c64]) {
    debug_assert_eq!(kin.len(), vin.len());
    debug_assert_eq!(vin.len(), vout.len());

    if use_parallel_for_len(vout.len()) {
        vout.par_iter_mut()
            .zip(kin.par_iter())
            .zip(vin.par_iter())
            .for_each(|((z, x), y)| {
                *z += (*x) * (*y);
            });
    } else {
        for (x, y, z) in multizip((kin.iter(), vin.iter(), vout.iter_mut())) {
            *z += (*x) * (*y);
        }
    }
}

/// Total local potential V_psloc + V_H + V_xc, multiplied pointwise on the
/// real-space grid.
pub struct LocalPotentialTerm<'a> {
    rgtrans: &'a RGTransform,
    fft_linear_index: Vec<usize>,
    vloc_3d: &'a Array3<c64>,
}

impl<'a> LocalPotentialTerm<'a> {
    pub fn new(
        gvec: &GVector,
        pwwfc: &PWBasis,
        rgtrans: &'a RGTransform,
        vloc_3d: &'a Array3<c64>,
    ) -> LocalPotentialTerm<'a> {
        let fft_linear_index =
            utility::compute_fft_linear_index_map(gvec.get_miller(), pwwfc.get_gindex(), rgtrans.get_fftmesh());

        LocalPotentialTerm {
            rgtrans,
            fft_linear_index,
            vloc_3d,
        }
    }
}

impl<'a> HamiltonianTerm for LocalPotentialTerm<'a> {
    fn get_name(&self) -> &'static str {
        "local"
    }

    fn apply_block(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>) {
        let npw = vin.nrow();

        if npw == 0 {
            return;
        }

        let shape = self.vloc_3d.shape();

        vout.as_mut_slice()
            .par_chunks_mut(npw)
            .zip(vin.as_slice().par_chunks(npw))
            .for_each_init(
                || {
                    (
                        Array3::<c64>::new(shape),
                        Array3::<c64>::new(shape),
                        vec![c64::new(0.0, 0.0); npw],
                    )
                },
                |(unk_3d, fft_workspace, vpsi), (out, inp)| {
                    vloc_on_psi_with_cached_fft_index(
                        self.rgtrans,
                        &self.fft_linear_index,
                        self.vloc_3d,
                        unk_3d,
                        fft_workspace,
                        inp,
                        vpsi,
                    );

                    for (o, v) in out.iter_mut().zip(vpsi.iter()) {
                        *o += v;
                    }
                },
            );
    }
}

// The 1/sqrt(Omega) of the orbital and the sqrt(Omega) of the projection
// back cancel, so the coefficients are transformed as they are.
pub fn vloc_on_psi_with_cached_fft_index(
    rgtrans: &RGTransform,
    fft_linear_index: &[usize],
    vloc_3d: &Array3<c64>,
    unk_3d: &mut Array3<c64>,
    fft_workspace: &mut Array3<c64>,
    vin: &[c64],
    vout: &mut [c64],
) {
    // from cnk in G space to unk in r space

    utility::map_1d_to_3d_with_linear_index(fft_linear_index, vin, fft_workspace);

    rgtrans.g3d_to_r3d(fft_workspace.as_slice(), unk_3d.as_mut_slice());

    // v_loc|psi> in r space

    Array3::hadamard_product(vloc_3d, unk_3d, fft_workspace);

    // back to G space, keeping the plane waves of the basis

    rgtrans.r3d_to_g3d(fft_workspace.as_slice(), unk_3d.as_mut_slice());

    utility::map_3d_to_1d_with_linear_index(fft_linear_index, unk_3d, vout);
}

/// psi_nk(r) = sum_G c(G) exp(i(k+G)r) / sqrt(Omega), without the Bloch phase.
pub fn compute_unk_3d_with_cached_fft_index(
    rgtrans: &RGTransform,
    volume: f64,
    fft_linear_index: &[usize],
    v: &[c64],
    unk_3d: &mut Array3<c64>,
    fft_workspace: &mut Array3<c64>,
) {
    utility::map_1d_to_3d_with_linear_index(fft_linear_index, v, fft_workspace);

    rgtrans.g3d_to_r3d(fft_workspace.as_slice(), unk_3d.as_mut_slice());

    unk_3d.scale(1.0 / volume.sqrt());
}

pub struct NonLocalTerm<'a> {
    vnl: &'a VNL,
}

impl<'a> NonLocalTerm<'a> {
    pub fn new(vnl: &'a VNL) -> NonLocalTerm<'a> {
        NonLocalTerm { vnl }
    }
}

impl<'a> HamiltonianTerm for NonLocalTerm<'a> {
    fn get_name(&self) -> &'static str {
        "nonlocal"
    }

    fn apply_block(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>) {
        self.vnl.apply_block(vin, vout);
    }
}

/// Sum of terms; never materialized as a matrix.
#[derive(Default)]
pub struct Hamiltonian<'a> {
    terms: Vec<Box<dyn HamiltonianTerm + 'a>>,
}

impl<'a> Hamiltonian<'a> {
    pub fn new() -> Hamiltonian<'a> {
        Hamiltonian { terms: Vec::new() }
    }

    /// Kinetic + local + non-local at one k point.
    pub fn kohn_sham(
        gvec: &GVector,
        pwwfc: &PWBasis,
        rgtrans: &'a RGTransform,
        vloc_3d: &'a Array3<c64>,
        vnl: &'a VNL,
    ) -> Hamiltonian<'a> {
        let mut ham = Hamiltonian::new();

        ham.push(Box::new(KineticTerm::new(pwwfc)));
        ham.push(Box::new(LocalPotentialTerm::new(gvec, pwwfc, rgtrans, vloc_3d)));
        ham.push(Box::new(NonLocalTerm::new(vnl)));

        ham
    }

    pub fn push(&mut self, term: Box<dyn HamiltonianTerm + 'a>) {
        self.terms.push(term);
    }

    pub fn get_terms(&self) -> &[Box<dyn HamiltonianTerm + 'a>] {
        &self.terms
    }

    pub fn get_term(&self, name: &str) -> Option<&dyn HamiltonianTerm> {
        self.terms.iter().find(|t| t.get_name() == name).map(|t| t.as_ref())
    }

    /// vout = H vin
    pub fn apply(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>) {
        assert_eq!(vin.nrow(), vout.nrow());
        assert_eq!(vin.ncol(), vout.ncol());

        vout.as_mut_slice().iter_mut().for_each(|x| *x = c64::new(0.0, 0.0));

        for term in self.terms.iter() {
            term.apply_block(vin, vout);
        }
    }
}

#[cfg(test)]
mod tests;
