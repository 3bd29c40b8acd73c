use crate::{KptsError, KPTS};
use vector3::*;

use std::collections::BTreeMap;

/// Gamma-centred Monkhorst-Pack mesh, k_i = (n_i + s_i/2) / N_i folded
/// into (-1/2, 1/2]. With time reversal, k and -k are merged.
pub struct KptsMesh {
    k_frac: Vec<Vector3f64>,
    k_weight: Vec<f64>,
    k_mesh: [usize; 3],
}

impl KptsMesh {
    pub fn new(k_mesh: [usize; 3], shift: [bool; 3], time_reversal: bool) -> Result<KptsMesh, KptsError> {
        if k_mesh.iter().any(|&n| n == 0) {
            return Err(KptsError::InvalidMesh(k_mesh));
        }

        // k_i = m_i / (2 N_i) with m_i = 2 n_i + s_i, kept as integers mod 2 N_i
        let modulus: Vec<i64> = k_mesh.iter().map(|&n| 2 * n as i64).collect();

        let mut weights: BTreeMap<[i64; 3], usize> = BTreeMap::new();

        for n1 in 0..k_mesh[0] {
            for n2 in 0..k_mesh[1] {
                for n3 in 0..k_mesh[2] {
                    let m = [
                        2 * n1 as i64 + shift[0] as i64,
                        2 * n2 as i64 + shift[1] as i64,
                        2 * n3 as i64 + shift[2] as i64,
                    ];

                    let key = if time_reversal {
                        let minus = [0usize, 1, 2].map(|i| (-m[i]).rem_euclid(modulus[i]));
                        m.min(minus)
                    } else {
                        m
                    };

                    *weights.entry(key).or_insert(0) += 1;
                }
            }
        }

        let ntot = (k_mesh[0] * k_mesh[1] * k_mesh[2]) as f64;

        let mut k_frac = Vec::with_capacity(weights.len());
        let mut k_weight = Vec::with_capacity(weights.len());

        for (m, count) in weights.iter() {
            let fold = |i: usize| {
                let mut v = m[i];
                if 2 * v > modulus[i] {
                    v -= modulus[i];
                }
                v as f64 / modulus[i] as f64
            };

            k_frac.push(Vector3f64::new(fold(0), fold(1), fold(2)));
            k_weight.push(*count as f64 / ntot);
        }

        Ok(KptsMesh {
            k_frac,
            k_weight,
            k_mesh,
        })
    }

    pub fn get_k_mesh(&self) -> [usize; 3] {
        self.k_mesh
    }
}

impl KPTS for KptsMesh {
    fn get_k_frac(&self, k_index: usize) -> Vector3f64 {
        self.k_frac[k_index]
    }

    fn get_k_weight(&self, k_index: usize) -> f64 {
        self.k_weight[k_index]
    }

    fn get_n_kpts(&self) -> usize {
        self.k_frac.len()
    }
}
