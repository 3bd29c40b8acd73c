use crate::Array3;

use itertools::multizip;
use rayon::prelude::*;
use types::c64;

const PARALLEL_MIN_LEN: usize = 8192;

#[inline]
fn use_parallel_for_len(len: usize) -> bool {
    len >= PARALLEL_MIN_LEN && rayon::current_num_threads() > 1
}

impl Array3<c64> {
    pub fn scale(&mut self, f: f64) {
        self.data.iter_mut().for_each(|x| *x *= f);
    }

    pub fn norm2(&self) -> f64 {
        self.data.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
    }

    /// `self += factor * |rhs|^2`, the orbital density accumulation kernel.
    pub fn scaled_sqr_add(&mut self, rhs: &Array3<c64>, factor: f64) {
        let psrc = rhs.as_slice();
        let pdst = self.as_mut_slice();

        assert_eq!(psrc.len(), pdst.len());

        if use_parallel_for_len(pdst.len()) {
            pdst.par_iter_mut().zip(psrc.par_iter()).for_each(|(d, s)| {
                *d += s.norm_sqr() * factor;
            });
        } else {
            for (s, d) in multizip((psrc.iter(), pdst.iter_mut())) {
                *d += s.norm_sqr() * factor;
            }
        }
    }

    pub fn scaled_add(&mut self, rhs: &Array3<c64>, factor: f64) {
        let psrc = rhs.as_slice();
        let pdst = self.as_mut_slice();

        assert_eq!(psrc.len(), pdst.len());

        if use_parallel_for_len(pdst.len()) {
            pdst.par_iter_mut().zip(psrc.par_iter()).for_each(|(d, s)| {
                *d += (*s) * factor;
            });
        } else {
            for (s, d) in multizip((psrc.iter(), pdst.iter_mut())) {
                *d += (*s) * factor;
            }
        }
    }

    /// Real parts only; fields living on the grid are real up to round-off.
    pub fn min_real(&self) -> f64 {
        self.data.iter().map(|x| x.re).fold(f64::INFINITY, f64::min)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.re.is_finite() && x.im.is_finite())
    }
}

#[test]
fn test_array3_c64_kernels() {
    let mut acc = Array3::<c64>::new([2, 1, 1]);
    let psi = Array3::from_vec([2, 1, 1], vec![c64::new(3.0, 4.0), c64::new(0.0, 1.0)]);

    acc.scaled_sqr_add(&psi, 0.5);
    assert_eq!(acc.as_slice(), &[c64::new(12.5, 0.0), c64::new(0.5, 0.0)]);

    acc.scaled_add(&psi, 2.0);
    assert_eq!(acc[[0, 0, 0]], c64::new(18.5, 8.0));
    assert_eq!(acc.min_real(), 0.5);
    assert!(acc.is_finite());

    acc.scale(0.0);
    assert_eq!(acc.norm2(), 0.0);
}
