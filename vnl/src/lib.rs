//! Separable non-local pseudopotential at one k point,
//!
//!   V_nl = sum_{a,l,m} sum_{ij} |p^a_{lmi}> h^l_ij <p^a_{lmj}|,
//!
//!   <k+G|p^a_{lmi}> = Omega^{-1/2} P^l_i(|k+G|) Y_lm(k+G) exp(-i G.tau_a).
//!
//! The (-i)^l factor of the plane-wave expansion is dropped: h only couples
//! projectors of the same l, so it cancels in every term.

use atompsp::AtomPSP;
use crystal::{Crystal, CrystalError};
use gvector::GVector;
use kgylm::KGYLM;
use matrix::Matrix;
use pspot::PSPot;
use pwbasis::PWBasis;
use types::c64;

pub struct VNL {
    // npw x nproj
    beta: Matrix<c64>,
    // nproj x nproj, block diagonal in (atom, l, m)
    dij: Matrix<c64>,
}

impl VNL {
    pub fn new(pots: &PSPot, crystal: &Crystal, gvec: &GVector, pwwfc: &PWBasis) -> Result<VNL, CrystalError> {
        let npw = pwwfc.get_n_plane_waves();

        let volume = crystal.get_latt().volume();

        let lmax = match pots.get_max_lmax() {
            Some(l) => l,
            None => {
                return Ok(VNL {
                    beta: Matrix::new(npw, 0),
                    dij: Matrix::new(0, 0),
                })
            }
        };

        let kgylm = KGYLM::new(lmax, gvec, pwwfc);

        let kg = pwwfc.get_kg();

        let mut columns: Vec<Vec<c64>> = Vec::new();
        let mut blocks: Vec<(usize, Vec<Vec<f64>>)> = Vec::new();

        for (sp, tau) in crystal.get_atom_species().iter().zip(crystal.get_atom_positions()) {
            let atpsp = pots
                .get_psp(sp)
                .ok_or_else(|| CrystalError::MissingPseudopotential(sp.clone()))?;

            let sfact = fhkl::compute_structure_factor_for_many_g_one_atom(gvec.get_miller(), pwwfc.get_gindex(), *tau);

            let lmax_at = match atpsp.get_lmax() {
                Some(l) => l,
                None => continue,
            };

            for l in 0..=lmax_at {
                let nproj = atpsp.get_nproj(l);

                if nproj == 0 {
                    continue;
                }

                let radial = radial_projectors(atpsp, l, kg, volume);

                let hmat: Vec<Vec<f64>> = (0..nproj)
                    .map(|i| (0..nproj).map(|j| atpsp.get_dij(l, i, j)).collect())
                    .collect();

                for m in utility::get_quant_num_m(l) {
                    let ylm = kgylm.get_data(l, m);

                    blocks.push((columns.len(), hmat.clone()));

                    for p in radial.iter() {
                        let col = p
                            .iter()
                            .zip(ylm.iter())
                            .zip(sfact.iter())
                            .map(|((p, y), s)| p * y * *s)
                            .collect();

                        columns.push(col);
                    }
                }
            }
        }

        let nproj = columns.len();

        let beta = Matrix::from_columns(npw, &columns);

        let mut dij = Matrix::new(nproj, nproj);

        for (offset, hmat) in blocks.iter() {
            for (i, row) in hmat.iter().enumerate() {
                for (j, h) in row.iter().enumerate() {
                    dij[[offset + i, offset + j]] = c64::new(*h, 0.0);
                }
            }
        }

        Ok(VNL { beta, dij })
    }

    pub fn get_n_projectors(&self) -> usize {
        self.beta.ncol()
    }

    pub fn get_projectors(&self) -> &Matrix<c64> {
        &self.beta
    }

    pub fn get_coupling(&self) -> &Matrix<c64> {
        &self.dij
    }

    /// vout += V_nl vin, column by column.
    pub fn apply_block(&self, vin: &Matrix<c64>, vout: &mut Matrix<c64>) {
        if self.get_n_projectors() == 0 {
            return;
        }

        // <p|psi>
        let proj = self.beta.adjoint_dot(vin);

        let coef = self.dij.dot(&proj);

        *vout += &self.beta.dot(&coef);
    }
}

// Omega^{-1/2} P^l_i(|k+G|) for every projector of channel l
fn radial_projectors(atpsp: &dyn AtomPSP, l: usize, kg: &[f64], volume: f64) -> Vec<Vec<f64>> {
    let fact = 1.0 / volume.sqrt();

    (0..atpsp.get_nproj(l))
        .map(|i| kg.iter().map(|&q| fact * atpsp.get_projector_of_q(l, i, q)).collect())
        .collect()
}
