use crate::*;
use fifo::*;
use matrix::*;
use num_traits::identities::Zero;

/// Pulay (DIIS) acceleration over a base scheme. The history keeps the
/// input densities, the raw residuals, and the base scheme's update
/// directions; the next density is sum_j c_j (rho_in_j + P R_j) with the c_j
/// minimizing the metric norm of sum_j c_j R_j under sum_j c_j = 1.
pub struct MixingPulay {
    base: Box<dyn Mixing>,
    metric_weight: f64,

    vin: FIFO<Vec<c64>>,
    vres: FIFO<Vec<c64>>,
    vdir: FIFO<Vec<c64>>,
}

impl MixingPulay {
    pub fn new(base: Box<dyn Mixing>, nhistory: usize, metric_weight: f64) -> MixingPulay {
        let nhistory = nhistory.max(1);

        MixingPulay {
            base,
            metric_weight,
            vin: FIFO::new(nhistory),
            vres: FIFO::new(nhistory),
            vdir: FIFO::new(nhistory),
        }
    }

    pub fn get_history_len(&self) -> usize {
        self.vin.len()
    }
}

impl Mixing for MixingPulay {
    fn get_name(&self) -> &'static str {
        "pulay"
    }

    fn precondition_residual(&self, ctx: &MixingContext, residual: &[c64]) -> Result<Vec<c64>, MixingError> {
        self.base.precondition_residual(ctx, residual)
    }

    fn compute_next_density(
        &mut self,
        ctx: &MixingContext,
        rhog_in: &[c64],
        rhog_out: &[c64],
    ) -> Result<Vec<c64>, MixingError> {
        check_lengths(ctx, rhog_in, rhog_out)?;

        let residual = get_residual(rhog_in, rhog_out);
        let direction = self.base.precondition_residual(ctx, &residual)?;

        self.vin.push(rhog_in.to_vec());
        self.vres.push(residual);
        self.vdir.push(direction);

        let ng = rhog_in.len();

        let coef = if self.vin.len() == 1 {
            vec![1.0]
        } else {
            compute_coef(self.metric_weight, ctx.gs, &self.vres)
        };

        let mut next = vec![c64::zero(); ng];

        for (j, c) in coef.iter().enumerate() {
            for (z, x, d) in multizip((next.iter_mut(), self.vin[j].iter(), self.vdir[j].iter())) {
                *z += (x + d) * *c;
            }
        }

        check_finite(next)
    }

    fn reset(&mut self) {
        self.vin.clear();
        self.vres.clear();
        self.vdir.clear();
        self.base.reset();
    }
}

// metric (w + G^2) / G^2 weights long wavelengths; G = 0 is left out
//
// The coefficients come from the bordered system
//   [ A    s ] [c]   [0]
//   [ s^T  0 ] [m] = [s]
// with A_ji = <R_j|R_i>. Once the history is linearly dependent the
// solution is a null vector of A, which a pseudo-inverse of A alone drops.
// The border s is the largest diagonal of A.
fn compute_coef(weight: f64, gs: &[f64], vres: &FIFO<Vec<c64>>) -> Vec<f64> {
    let n = vres.len();

    let metric: Vec<f64> = gs
        .iter()
        .map(|&g| {
            let q2 = g * g;
            if q2 > 0.0 {
                (weight + q2) / q2
            } else {
                0.0
            }
        })
        .collect();

    let mut a = Matrix::<f64>::new(n + 1, n + 1);

    for i in 0..n {
        for j in 0..n {
            a[[j, i]] = utility::zdot_product_metric(&vres[j], &vres[i], &metric).re;
        }
    }

    let s = (0..n).map(|i| a[[i, i]]).fold(0.0, f64::max);

    // all residuals vanish: any affine combination will do
    if s <= 0.0 {
        let mut coef = vec![0.0; n];
        coef[n - 1] = 1.0;
        return coef;
    }

    for i in 0..n {
        a[[i, n]] = s;
        a[[n, i]] = s;
    }

    a.pinv();

    (0..n).map(|i| a[[i, n]] * s).collect()
}
