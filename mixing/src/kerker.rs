use crate::*;

/// P(G) = beta (G^2 + floor k0^2) / (G^2 + k0^2): beta at short wavelength,
/// beta * floor at G = 0.
pub struct MixingKerker {
    beta: f64,
    k0: f64,
    floor: f64,
}

impl MixingKerker {
    pub fn new(beta: f64, k0: f64, floor: f64) -> MixingKerker {
        MixingKerker { beta, k0, floor }
    }

    pub fn get_weight(&self, g: f64) -> f64 {
        let g2 = g * g;
        let k02 = self.k0 * self.k0;

        self.beta * (g2 + self.floor * k02) / (g2 + k02)
    }
}

impl Mixing for MixingKerker {
    fn get_name(&self) -> &'static str {
        "kerker"
    }

    fn precondition_residual(&self, ctx: &MixingContext, residual: &[c64]) -> Result<Vec<c64>, MixingError> {
        Ok(multizip((residual.iter(), ctx.gs.iter()))
            .map(|(r, &g)| r * self.get_weight(g))
            .collect())
    }
}
