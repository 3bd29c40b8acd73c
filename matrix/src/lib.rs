//! Dense column-major matrix used for wavefunction blocks and small
//! subspace problems. Element `[[i, j]]` lives at `data[i + j * nrow]`.

mod matrix_c64;
mod matrix_f64;

use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix<T> {
    nrow: usize,
    ncol: usize,
    data: Vec<T>,
}

impl<T: Default + Clone + Copy> Matrix<T> {
    pub fn new(nrow: usize, ncol: usize) -> Matrix<T> {
        Matrix {
            nrow,
            ncol,
            data: vec![T::default(); nrow * ncol],
        }
    }

    pub fn from_column_slice(nrow: usize, ncol: usize, v: &[T]) -> Matrix<T> {
        assert_eq!(v.len(), nrow * ncol);

        Matrix {
            nrow,
            ncol,
            data: v.to_vec(),
        }
    }

    pub fn from_row_slice(nrow: usize, ncol: usize, v: &[T]) -> Matrix<T> {
        assert_eq!(v.len(), nrow * ncol);

        let mut mat = Matrix::new(nrow, ncol);

        for i in 0..nrow {
            for j in 0..ncol {
                mat[[i, j]] = v[i * ncol + j];
            }
        }

        mat
    }

    /// Builds a matrix whose columns are `cols`, all of the same length.
    pub fn from_columns(nrow: usize, cols: &[Vec<T>]) -> Matrix<T> {
        let mut mat = Matrix::new(nrow, cols.len());

        for (j, c) in cols.iter().enumerate() {
            mat.set_col(j, c);
        }

        mat
    }

    #[inline]
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    #[inline]
    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get_col(&self, icol: usize) -> &[T] {
        &self.data[icol * self.nrow..(icol + 1) * self.nrow]
    }

    pub fn get_mut_col(&mut self, icol: usize) -> &mut [T] {
        &mut self.data[icol * self.nrow..(icol + 1) * self.nrow]
    }

    pub fn set_col(&mut self, icol: usize, v: &[T]) {
        self.get_mut_col(icol).copy_from_slice(v);
    }

    /// Copies of the columns `first..first+n`.
    pub fn columns(&self, first: usize, n: usize) -> Matrix<T> {
        Matrix {
            nrow: self.nrow,
            ncol: n,
            data: self.data[first * self.nrow..(first + n) * self.nrow].to_vec(),
        }
    }

    /// Keeps only the listed columns, in the given order.
    pub fn select_columns(&self, idx: &[usize]) -> Matrix<T> {
        let mut data = Vec::with_capacity(self.nrow * idx.len());

        for &j in idx.iter() {
            data.extend_from_slice(self.get_col(j));
        }

        Matrix {
            nrow: self.nrow,
            ncol: idx.len(),
            data,
        }
    }

    /// Horizontal concatenation `[a | b | ...]`; blocks must share `nrow`.
    pub fn hstack(blocks: &[&Matrix<T>]) -> Matrix<T> {
        let nrow = blocks.first().map(|b| b.nrow).unwrap_or(0);
        let mut data = Vec::new();
        let mut ncol = 0;

        for b in blocks.iter() {
            assert_eq!(b.nrow, nrow);
            data.extend_from_slice(&b.data);
            ncol += b.ncol;
        }

        Matrix { nrow, ncol, data }
    }

    /// The rows `first..first+n` of every column.
    pub fn rows(&self, first: usize, n: usize) -> Matrix<T> {
        let mut mat = Matrix::new(n, self.ncol);

        for j in 0..self.ncol {
            mat.set_col(j, &self.get_col(j)[first..first + n]);
        }

        mat
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut mat = Matrix::new(self.ncol, self.nrow);

        for j in 0..self.ncol {
            for i in 0..self.nrow {
                mat[[j, i]] = self[[i, j]];
            }
        }

        mat
    }
}

impl<T> Index<[usize; 2]> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: [usize; 2]) -> &T {
        &self.data[idx[0] + idx[1] * self.nrow]
    }
}

impl<T> IndexMut<[usize; 2]> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut T {
        &mut self.data[idx[0] + idx[1] * self.nrow]
    }
}

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..self.nrow {
            for j in 0..self.ncol {
                write!(f, " {:12.6}", self[[i, j]])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_column_major() {
        let m = Matrix::<f64>::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(m.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(m.get_col(1), &[2.0, 5.0]);
        assert_eq!(m[[1, 2]], 6.0);
        assert_eq!(m.transpose()[[2, 1]], 6.0);
    }

    #[test]
    fn test_column_blocks() {
        let m = Matrix::<f64>::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let tail = m.columns(1, 2);
        assert_eq!(tail.ncol(), 2);
        assert_eq!(tail.get_col(0), &[2.0, 5.0]);

        let picked = m.select_columns(&[2, 0]);
        assert_eq!(picked.get_col(0), &[3.0, 6.0]);
        assert_eq!(picked.get_col(1), &[1.0, 4.0]);

        let joined = Matrix::hstack(&[&picked, &tail]);
        assert_eq!(joined.ncol(), 4);
        assert_eq!(joined.get_col(3), &[3.0, 6.0]);

        let low = m.rows(1, 1);
        assert_eq!(low.as_slice(), &[4.0, 5.0, 6.0]);
    }
}
