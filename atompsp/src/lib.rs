mod hgh;
pub use hgh::*;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PspError {
    UnknownLibraryEntry(String),
    InvalidParameter { name: String, reason: String },
}

impl fmt::Display for PspError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PspError::UnknownLibraryEntry(name) => {
                write!(f, "no built-in pseudopotential named '{}'", name)
            }
            PspError::InvalidParameter { name, reason } => {
                write!(f, "invalid pseudopotential '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for PspError {}

/// Reciprocal-space view of a norm-conserving pseudopotential.
///
/// Radial functions take |q| in bohr^-1 and are not divided by the cell
/// volume; callers apply the 1/Omega (local) and 1/sqrt(Omega) (projector)
/// factors.
pub trait AtomPSP: Send + Sync {
    fn get_name(&self) -> &str;

    /// valence electron number
    fn get_zion(&self) -> f64;

    /// highest angular momentum with projectors; None without non-local part
    fn get_lmax(&self) -> Option<usize>;

    fn get_nproj(&self, l: usize) -> usize;

    /// coupling h^l_ij between projectors i and j of channel l
    fn get_dij(&self, l: usize, i: usize, j: usize) -> f64;

    /// local form factor including the -4 pi Z / q^2 tail; q > 0
    fn get_vloc_of_q(&self, q: f64) -> f64;

    /// lim_{q->0} [ vloc(q) + 4 pi Z / q^2 ]
    fn get_vloc_limit(&self) -> f64;

    fn get_projector_of_q(&self, l: usize, i: usize, q: f64) -> f64;

    /// valence density guess, equal to Z at q = 0
    fn get_atomic_density_of_q(&self, q: f64) -> f64;
}

pub fn new(name: &str, params: &HGHParams) -> Result<Box<dyn AtomPSP>, PspError> {
    Ok(Box::new(AtomPSPHGH::new(name, params)?))
}
