//! Exchange-correlation functionals for unpolarized densities.
//!
//! Kernels are stateless and keyed by identifier (`lda_x`, `lda_c_pz`,
//! `gga_x_pbe`, `gga_c_pbe`); a [`XCFunctional`] sums them and an
//! [`XCDriver`] evaluates the sum on the real-space grid.

pub mod correlation;
pub mod driver;
pub mod error;
pub mod exchange;
pub mod functional;
pub mod traits;

pub use driver::XCDriver;
pub use error::XCError;
pub use functional::{kernel_from_id, XCFunctional, XCInput};
pub use traits::{XCFamily, XCKernel};

/// Points with a smaller density contribute neither energy nor potential.
pub const RHO_FLOOR: f64 = 1E-10;

pub fn new(input: &XCInput) -> Result<XCFunctional, XCError> {
    XCFunctional::new(input)
}

#[cfg(test)]
mod tests;
