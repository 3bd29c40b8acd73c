//! Unnormalized 3D complex FFT over first-index-fastest arrays.
//!
//! `fft3d` uses the exp(-i...) sign convention and `ifft3d` the exp(+i...)
//! one; neither divides by the number of points.

use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use types::c64;

pub struct DWFFT3D {
    shape: [usize; 3],
    plan_fwd: [Arc<dyn Fft<f64>>; 3],
    plan_bwd: [Arc<dyn Fft<f64>>; 3],
}

impl DWFFT3D {
    pub fn new(n1: usize, n2: usize, n3: usize) -> DWFFT3D {
        let mut planner = FftPlanner::<f64>::new();

        let plan_fwd = [
            planner.plan_fft_forward(n1),
            planner.plan_fft_forward(n2),
            planner.plan_fft_forward(n3),
        ];

        let plan_bwd = [
            planner.plan_fft_inverse(n1),
            planner.plan_fft_inverse(n2),
            planner.plan_fft_inverse(n3),
        ];

        DWFFT3D {
            shape: [n1, n2, n3],
            plan_fwd,
            plan_bwd,
        }
    }

    pub fn fft3d(&self, slice_in: &[c64], slice_out: &mut [c64]) {
        slice_out.copy_from_slice(slice_in);
        self.transform(&self.plan_fwd, slice_out);
    }

    pub fn ifft3d(&self, slice_in: &[c64], slice_out: &mut [c64]) {
        slice_out.copy_from_slice(slice_in);
        self.transform(&self.plan_bwd, slice_out);
    }

    fn transform(&self, plans: &[Arc<dyn Fft<f64>>; 3], data: &mut [c64]) {
        let [n1, n2, n3] = self.shape;

        assert_eq!(data.len(), n1 * n2 * n3);

        let scratch_len = plans.iter().map(|p| p.get_inplace_scratch_len()).max().unwrap_or(0);
        let mut scratch = vec![c64::new(0.0, 0.0); scratch_len];

        // axis 0 is contiguous
        for line in data.chunks_exact_mut(n1) {
            plans[0].process_with_scratch(line, &mut scratch);
        }

        let mut line = vec![c64::new(0.0, 0.0); n2.max(n3)];

        // axis 1, stride n1
        for k in 0..n3 {
            for i in 0..n1 {
                let base = i + k * n1 * n2;

                for j in 0..n2 {
                    line[j] = data[base + j * n1];
                }

                plans[1].process_with_scratch(&mut line[..n2], &mut scratch);

                for j in 0..n2 {
                    data[base + j * n1] = line[j];
                }
            }
        }

        // axis 2, stride n1*n2
        let plane = n1 * n2;

        for base in 0..plane {
            for k in 0..n3 {
                line[k] = data[base + k * plane];
            }

            plans[2].process_with_scratch(&mut line[..n3], &mut scratch);

            for k in 0..n3 {
                data[base + k * plane] = line[k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_plane_wave() {
        let (n1, n2, n3) = (4, 3, 5);
        let (m1, m2, m3) = (1, 2, 4);

        let mut r = vec![c64::new(0.0, 0.0); n1 * n2 * n3];

        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    let phase = 2.0
                        * std::f64::consts::PI
                        * ((m1 * i) as f64 / n1 as f64 + (m2 * j) as f64 / n2 as f64 + (m3 * k) as f64 / n3 as f64);
                    r[i + j * n1 + k * n1 * n2] = c64::new(phase.cos(), phase.sin());
                }
            }
        }

        let fft = DWFFT3D::new(n1, n2, n3);
        let mut g = vec![c64::new(0.0, 0.0); r.len()];

        fft.fft3d(&r, &mut g);

        let peak = m1 + m2 * n1 + m3 * n1 * n2;

        for (idx, v) in g.iter().enumerate() {
            let expected = if idx == peak { (n1 * n2 * n3) as f64 } else { 0.0 };
            assert_abs_diff_eq!(v.re, expected, epsilon = 1e-10);
            assert_abs_diff_eq!(v.im, 0.0, epsilon = 1e-10);
        }

        let mut back = vec![c64::new(0.0, 0.0); r.len()];
        fft.ifft3d(&g, &mut back);

        for (a, b) in back.iter().zip(r.iter()) {
            assert_abs_diff_eq!((a / (n1 * n2 * n3) as f64 - b).norm(), 0.0, epsilon = 1e-12);
        }
    }
}
