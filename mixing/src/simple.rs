use crate::*;

/// rho_next = (1 - beta) rho_in + beta rho_out
pub struct MixingSimple {
    beta: f64,
}

impl MixingSimple {
    pub fn new(beta: f64) -> MixingSimple {
        MixingSimple { beta }
    }
}

impl Mixing for MixingSimple {
    fn get_name(&self) -> &'static str {
        "simple"
    }

    fn precondition_residual(&self, _ctx: &MixingContext, residual: &[c64]) -> Result<Vec<c64>, MixingError> {
        Ok(residual.iter().map(|r| *r * self.beta).collect())
    }

    // written as a convex combination so that beta = 1 returns rho_out bit for bit
    fn compute_next_density(
        &mut self,
        ctx: &MixingContext,
        rhog_in: &[c64],
        rhog_out: &[c64],
    ) -> Result<Vec<c64>, MixingError> {
        check_lengths(ctx, rhog_in, rhog_out)?;

        let next = multizip((rhog_in.iter(), rhog_out.iter()))
            .map(|(x, y)| *x * (1.0 - self.beta) + *y * self.beta)
            .collect();

        check_finite(next)
    }
}
