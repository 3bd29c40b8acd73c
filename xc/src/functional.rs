//! Composite exchange-correlation functionals built from kernel identifiers.

use crate::correlation::{pbe::GgaCPbe, pz::LdaCPz};
use crate::error::XCError;
use crate::exchange::{pbe::GgaXPbe, slater::LdaX};
use crate::traits::{XCFamily, XCKernel};
use serde::Deserialize;
use std::fmt;

/// `xc = "pbe"` or `xc = ["gga_x_pbe", "gga_c_pbe"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum XCInput {
    Shortcut(String),
    Kernels(Vec<String>),
}

impl Default for XCInput {
    fn default() -> Self {
        XCInput::Shortcut("lda-pz".to_string())
    }
}

impl fmt::Display for XCInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XCInput::Shortcut(s) => write!(f, "{}", s),
            XCInput::Kernels(ids) => write!(f, "[{}]", ids.join(", ")),
        }
    }
}

pub fn kernel_from_id(id: &str) -> Result<Box<dyn XCKernel>, XCError> {
    let kernel: Box<dyn XCKernel> = match id {
        "lda_x" => Box::new(LdaX),
        "lda_c_pz" => Box::new(LdaCPz),
        "gga_x_pbe" => Box::new(GgaXPbe),
        "gga_c_pbe" => Box::new(GgaCPbe),
        _ => return Err(XCError::UnknownScheme(id.to_string())),
    };

    Ok(kernel)
}

fn expand_shortcut(name: &str) -> Vec<&str> {
    match name {
        "none" => vec![],
        "lda-pz" | "lda" => vec!["lda_x", "lda_c_pz"],
        "pbe" => vec!["gga_x_pbe", "gga_c_pbe"],
        other => vec![other],
    }
}

/// Sum of kernels. An empty functional means no exchange-correlation.
pub struct XCFunctional {
    kernels: Vec<Box<dyn XCKernel>>,
}

impl XCFunctional {
    pub fn new(input: &XCInput) -> Result<XCFunctional, XCError> {
        let ids: Vec<&str> = match input {
            XCInput::Shortcut(name) => expand_shortcut(name.trim()),
            XCInput::Kernels(ids) => ids.iter().map(|s| s.trim()).collect(),
        };

        let kernels = ids.into_iter().map(kernel_from_id).collect::<Result<Vec<_>, _>>()?;

        Ok(XCFunctional { kernels })
    }

    pub fn from_kernels(kernels: Vec<Box<dyn XCKernel>>) -> XCFunctional {
        XCFunctional { kernels }
    }

    pub fn get_kernels(&self) -> &[Box<dyn XCKernel>] {
        &self.kernels
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn needs_gradient(&self) -> bool {
        self.kernels.iter().any(|k| k.family() == XCFamily::GGA)
    }

    pub fn get_ids(&self) -> Vec<&'static str> {
        self.kernels.iter().map(|k| k.get_id()).collect()
    }

    /// Pointwise evaluation of all kernels on one batch; outputs are overwritten.
    pub fn compute_batch(&self, rho: &[f64], sigma: &[f64], exc: &mut [f64], vrho: &mut [f64], vsigma: &mut [f64]) {
        exc.iter_mut().for_each(|x| *x = 0.0);
        vrho.iter_mut().for_each(|x| *x = 0.0);
        vsigma.iter_mut().for_each(|x| *x = 0.0);

        let gga = self.needs_gradient();

        for kernel in self.kernels.iter() {
            if gga {
                kernel.compute_gga(rho, sigma, exc, vrho, vsigma);
            } else {
                kernel.compute_lda(rho, exc, vrho);
            }
        }
    }
}
