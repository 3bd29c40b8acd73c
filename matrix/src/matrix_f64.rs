use crate::Matrix;

use dwconsts::*;
use nalgebra::DMatrix;

impl Matrix<f64> {
    pub fn identity(n: usize) -> Matrix<f64> {
        let mut mat = Matrix::<f64>::new(n, n);

        for i in 0..n {
            mat[[i, i]] = 1.0;
        }

        mat
    }

    pub fn action(&self, vin: &[f64], vout: &mut [f64]) {
        vout.iter_mut().for_each(|x| *x = 0.0);

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                vout[j] += self[[j, i]] * vin[i];
            }
        }
    }

    pub fn pinv(&mut self) {
        assert_eq!(self.nrow, self.ncol, "Matrix::pinv requires a square matrix");

        let mat = DMatrix::<f64>::from_column_slice(self.nrow, self.ncol, self.as_slice());

        let svd = mat.svd(true, true);

        // singular values below this fraction of the largest are dropped
        let smax = svd.singular_values.iter().cloned().fold(0.0, f64::max);

        if let Ok(pinv) = svd.pseudo_inverse((smax * EPS12).max(EPS30)) {
            self.data.copy_from_slice(pinv.as_slice());
        }
    }
}

#[test]
fn test_pinv_of_singular_matrix() {
    // rank one: pinv(a) = a / |a|_F^2 for a = u u^T
    let mut a = Matrix::<f64>::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
    a.pinv();

    for v in a.as_slice() {
        assert!((v - 0.25).abs() < 1e-12);
    }

    let mut x = vec![0.0; 2];
    Matrix::<f64>::identity(2).action(&[3.0, 4.0], &mut x);
    assert_eq!(x, vec![3.0, 4.0]);
}
