//! Evaluates a functional on the real-space density grid.

use crate::error::XCError;
use crate::functional::XCFunctional;
use dwconsts::*;
use gvector::GVector;
use log::debug;
use ndarray::Array3;
use pwdensity::PWDensity;
use rayon::prelude::*;
use rgtransform::RGTransform;
use types::c64;

const CHUNK_SIZE: usize = 4096;

pub struct XCDriver<'a> {
    gvec: &'a GVector,
    pwden: &'a PWDensity,
    rgtrans: &'a RGTransform,
}

impl<'a> XCDriver<'a> {
    pub fn new(gvec: &'a GVector, pwden: &'a PWDensity, rgtrans: &'a RGTransform) -> XCDriver<'a> {
        XCDriver { gvec, pwden, rgtrans }
    }

    /// Fills `vxc_3d` and returns E_xc = Omega/N sum_r rho(r) exc(r).
    ///
    /// For gradient functionals v = de/drho - 2 div(de/dsigma grad rho).
    pub fn compute(
        &self,
        functional: &XCFunctional,
        rho_3d: &Array3<c64>,
        volume: f64,
        vxc_3d: &mut Array3<c64>,
    ) -> Result<f64, XCError> {
        let n = rho_3d.len();

        let rho: Vec<f64> = rho_3d.as_slice().iter().map(|z| z.re).collect();

        if let Some((index, &value)) = rho.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(XCError::InvalidDensity { index, value });
        }

        vxc_3d.set_value(ZERO_C64);

        if functional.is_empty() {
            return Ok(0.0);
        }

        let n_negative = rho.iter().filter(|&&v| v < 0.0).count();
        if n_negative > 0 {
            debug!("xc: {} grid points with negative density are below the floor", n_negative);
        }

        let gga = functional.needs_gradient();

        let mut grad: [Vec<c64>; 3] = [vec![ZERO_C64; n], vec![ZERO_C64; n], vec![ZERO_C64; n]];

        let sigma: Vec<f64> = if gga {
            self.rgtrans.gradient_r3d(self.gvec, self.pwden, rho_3d.as_slice(), &mut grad);

            (0..n)
                .map(|i| grad.iter().map(|g| g[i].re * g[i].re).sum())
                .collect()
        } else {
            vec![0.0; n]
        };

        let mut exc = vec![0.0; n];
        let mut vrho = vec![0.0; n];
        let mut vsigma = vec![0.0; n];

        rho.par_chunks(CHUNK_SIZE)
            .zip(sigma.par_chunks(CHUNK_SIZE))
            .zip(exc.par_chunks_mut(CHUNK_SIZE))
            .zip(vrho.par_chunks_mut(CHUNK_SIZE))
            .zip(vsigma.par_chunks_mut(CHUNK_SIZE))
            .for_each(|((((r, s), e), v), vs)| functional.compute_batch(r, s, e, v, vs));

        let energy = rho.iter().zip(exc.iter()).map(|(r, e)| r * e).sum::<f64>() * volume / n as f64;

        let vxc = vxc_3d.as_mut_slice();

        for (out, v) in vxc.iter_mut().zip(vrho.iter()) {
            *out = c64::new(*v, 0.0);
        }

        if gga {
            // h = vsigma grad rho, reusing the gradient buffers
            for g in grad.iter_mut() {
                for (gi, vs) in g.iter_mut().zip(vsigma.iter()) {
                    *gi = c64::new(gi.re * vs, 0.0);
                }
            }

            let mut div = vec![ZERO_C64; n];
            self.rgtrans.divergence_r3d(self.gvec, self.pwden, &grad, &mut div);

            for (out, d) in vxc.iter_mut().zip(div.iter()) {
                *out -= 2.0 * d.re;
            }
        }

        if let Some(index) = vxc.iter().position(|v| !v.re.is_finite()) {
            return Err(XCError::NonFinitePotential { index });
        }

        Ok(energy)
    }
}
