use crate::Matrix;
use dwconsts::*;

use itertools::multizip;
use nalgebra::DMatrix;
use num_traits::Zero;
use std::ops::{AddAssign, Mul, SubAssign};
use types::c64;

impl Matrix<c64> {
    pub fn identity(n: usize) -> Matrix<c64> {
        let mut mat = Matrix::<c64>::new(n, n);

        for i in 0..n {
            mat[[i, i]] = ONE_C64;
        }

        mat
    }

    pub fn adjoint(&self) -> Matrix<c64> {
        let mut mat = Matrix::<c64>::new(self.ncol, self.nrow);

        for j in 0..self.ncol {
            for i in 0..self.nrow {
                mat[[j, i]] = self[[i, j]].conj();
            }
        }

        mat
    }

    /// `self * rhs`
    pub fn dot(&self, rhs: &Matrix<c64>) -> Matrix<c64> {
        assert_eq!(self.ncol, rhs.nrow);

        let mut out = Matrix::<c64>::new(self.nrow, rhs.ncol);

        for j in 0..rhs.ncol {
            let oc = &mut out.data[j * self.nrow..(j + 1) * self.nrow];

            for l in 0..self.ncol {
                let f = rhs[[l, j]];

                if f.is_zero() {
                    continue;
                }

                for (o, a) in multizip((oc.iter_mut(), self.get_col(l).iter())) {
                    *o += a * f;
                }
            }
        }

        out
    }

    /// `self^H * rhs`, without forming the adjoint.
    pub fn adjoint_dot(&self, rhs: &Matrix<c64>) -> Matrix<c64> {
        assert_eq!(self.nrow, rhs.nrow);

        let mut out = Matrix::<c64>::new(self.ncol, rhs.ncol);

        for j in 0..rhs.ncol {
            let b = rhs.get_col(j);

            for i in 0..self.ncol {
                out[[i, j]] = self
                    .get_col(i)
                    .iter()
                    .zip(b.iter())
                    .map(|(a, b)| a.conj() * b)
                    .sum();
            }
        }

        out
    }

    pub fn action(&self, vin: &[c64], vout: &mut [c64]) {
        vout.iter_mut().for_each(|x| *x = c64::zero());

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                vout[j] += self[[j, i]] * vin[i];
            }
        }
    }

    /// Replaces a nearly Hermitian matrix by its Hermitian part.
    pub fn hermitize(&mut self) {
        assert_eq!(self.nrow, self.ncol);

        for j in 0..self.ncol {
            for i in j..self.nrow {
                let v = 0.5 * (self[[i, j]] + self[[j, i]].conj());
                self[[i, j]] = v;
                self[[j, i]] = v.conj();
            }
        }
    }

    /// Largest absolute deviation from the identity; orthonormality check.
    pub fn max_deviation_from_identity(&self) -> f64 {
        let mut dmax = 0.0f64;

        for j in 0..self.ncol {
            for i in 0..self.nrow {
                let e = if i == j { ONE_C64 } else { ZERO_C64 };
                dmax = dmax.max((self[[i, j]] - e).norm());
            }
        }

        dmax
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.re.is_finite() && v.im.is_finite())
    }

    pub fn pinv(&mut self) {
        assert_eq!(self.nrow, self.ncol, "Matrix::pinv requires a square matrix");

        let mat = DMatrix::<c64>::from_column_slice(self.nrow, self.ncol, self.as_slice());

        let svd = mat.svd(true, true);

        let smax = svd.singular_values.iter().cloned().fold(0.0, f64::max);

        // singular values below the threshold are dropped, so this cannot fail
        if let Ok(pinv) = svd.pseudo_inverse((smax * EPS12).max(EPS30)) {
            self.data.copy_from_slice(pinv.as_slice());
        }
    }
}

impl Mul<f64> for Matrix<c64> {
    type Output = Matrix<c64>;

    fn mul(mut self, rhs: f64) -> Matrix<c64> {
        for v in self.data.iter_mut() {
            *v *= rhs;
        }

        self
    }
}

impl AddAssign<&Matrix<c64>> for Matrix<c64> {
    fn add_assign(&mut self, rhs: &Matrix<c64>) {
        assert_eq!(self.data.len(), rhs.data.len());

        for (d, s) in multizip((self.data.iter_mut(), rhs.data.iter())) {
            *d += *s;
        }
    }
}

impl SubAssign<&Matrix<c64>> for Matrix<c64> {
    fn sub_assign(&mut self, rhs: &Matrix<c64>) {
        assert_eq!(self.data.len(), rhs.data.len());

        for (d, s) in multizip((self.data.iter_mut(), rhs.data.iter())) {
            *d -= *s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Matrix<c64> {
        Matrix::<c64>::from_row_slice(
            2,
            2,
            &[
                c64::new(1.0, 0.0),
                c64::new(2.0, 1.0),
                c64::new(0.0, -1.0),
                c64::new(3.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_adjoint_dot_matches_explicit_product() {
        let a = sample();
        let b = Matrix::<c64>::identity(2);

        let lhs = a.adjoint_dot(&a);
        let rhs = a.adjoint().dot(&a);

        for (x, y) in lhs.as_slice().iter().zip(rhs.as_slice().iter()) {
            assert_abs_diff_eq!((x - y).norm(), 0.0, epsilon = 1e-14);
        }

        assert_eq!(a.dot(&b), a);
    }

    #[test]
    fn test_hermitize() {
        let mut a = sample();
        a.hermitize();

        assert_abs_diff_eq!((a[[0, 1]] - a[[1, 0]].conj()).norm(), 0.0);
        assert_abs_diff_eq!(a[[0, 0]].im, 0.0);
    }

    #[test]
    fn test_pinv_of_invertible_matrix_is_inverse() {
        let a = sample();
        let mut ai = a.clone();
        ai.pinv();

        assert!(a.dot(&ai).max_deviation_from_identity() < 1e-12);
    }
}
