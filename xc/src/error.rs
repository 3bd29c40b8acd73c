//! Error types for the XC module

use std::fmt;

/// Errors that can occur in XC functional calculations
#[derive(Debug, Clone, PartialEq)]
pub enum XCError {
    /// Unknown shortcut or kernel identifier
    UnknownScheme(String),
    /// Density is not finite at some grid point
    InvalidDensity { index: usize, value: f64 },
    /// Potential came out non-finite
    NonFinitePotential { index: usize },
}

impl fmt::Display for XCError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XCError::UnknownScheme(scheme) => {
                write!(
                    f,
                    "Unknown XC scheme: '{}'. Supported: none, lda-pz, pbe, lda_x, lda_c_pz, gga_x_pbe, gga_c_pbe",
                    scheme
                )
            }
            XCError::InvalidDensity { index, value } => {
                write!(f, "Invalid density {} at grid point {}", value, index)
            }
            XCError::NonFinitePotential { index } => {
                write!(f, "XC potential is not finite at grid point {}", index)
            }
        }
    }
}

impl std::error::Error for XCError {}
