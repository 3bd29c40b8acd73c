//! Core traits shared by all XC kernels.

/// Family of an XC kernel. Determines which compute method is valid to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XCFamily {
    /// Local Density Approximation
    LDA,
    /// Generalized Gradient Approximation
    GGA,
}

/// A stateless kernel evaluated on batches of grid points.
///
/// All outputs are accumulated (`+=`) so that kernels can be summed into a
/// composite functional. `exc` is the energy per electron, so the energy
/// density is `rho * exc`; `vrho` is `d(rho*exc)/d rho` and `vsigma` is
/// `d(rho*exc)/d sigma` with `sigma = |grad rho|^2`.
pub trait XCKernel: Send + Sync {
    fn get_id(&self) -> &'static str;

    fn family(&self) -> XCFamily;

    fn compute_lda(&self, rho: &[f64], exc: &mut [f64], vrho: &mut [f64]);

    /// GGA batch. LDA kernels ignore `sigma` and leave `vsigma` untouched.
    fn compute_gga(&self, rho: &[f64], _sigma: &[f64], exc: &mut [f64], vrho: &mut [f64], _vsigma: &mut [f64]) {
        self.compute_lda(rho, exc, vrho);
    }
}
