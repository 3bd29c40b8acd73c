mod list;
pub use list::*;

mod mesh;
pub use mesh::*;

use lattice::Lattice;
use log::info;
use serde::Deserialize;
use std::fmt;
use vector3::Vector3f64;

#[derive(Debug, Clone, PartialEq)]
pub enum KptsError {
    Empty,
    WeightsLengthMismatch { points: usize, weights: usize },
    InvalidWeight { k_index: usize, weight: f64 },
    ZeroWeightSum,
    InvalidMesh([usize; 3]),
}

impl fmt::Display for KptsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KptsError::Empty => write!(f, "k-point set is empty"),
            KptsError::WeightsLengthMismatch { points, weights } => {
                write!(f, "{} weights given for {} k-points", weights, points)
            }
            KptsError::InvalidWeight { k_index, weight } => {
                write!(f, "weight {} of k-point {} is not a non-negative number", weight, k_index)
            }
            KptsError::ZeroWeightSum => write!(f, "k-point weights sum to zero"),
            KptsError::InvalidMesh(m) => write!(f, "invalid k-point mesh {} x {} x {}", m[0], m[1], m[2]),
        }
    }
}

impl std::error::Error for KptsError {}

/// `[kpoints]` section of the input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase", deny_unknown_fields)]
pub enum KptsInput {
    List {
        /// fractional coordinates
        points: Vec<[f64; 3]>,
        /// relative weights, normalized on input; uniform when omitted
        weights: Option<Vec<f64>>,
    },
    Mesh {
        mesh: [usize; 3],
        #[serde(default)]
        shift: [bool; 3],
        #[serde(default = "default_time_reversal")]
        time_reversal: bool,
    },
}

fn default_time_reversal() -> bool {
    true
}

// K-point provider interface: fractional coordinates with quadrature
// weights summing to one.
pub trait KPTS: Send + Sync {
    fn get_k_frac(&self, k_index: usize) -> Vector3f64;
    fn get_k_weight(&self, k_index: usize) -> f64;
    fn get_n_kpts(&self) -> usize;

    // k_cart = k1*b1 + k2*b2 + k3*b3
    fn frac_to_cart(&self, k_frac: &Vector3f64, blatt: &Lattice) -> Vector3f64 {
        blatt.get_vector_a() * k_frac.x + blatt.get_vector_b() * k_frac.y + blatt.get_vector_c() * k_frac.z
    }

    fn get_k_weights(&self) -> Vec<f64> {
        (0..self.get_n_kpts()).map(|ik| self.get_k_weight(ik)).collect()
    }

    fn display(&self) {
        info!("   {:-^88}", " k-points (fractional) ");
        info!("{:12} {:^6} {}", "", "nkpt =", self.get_n_kpts());
        info!("{:12} {:^6} {:^16} {:^16} {:^16} {:^12}", "", "index", "k1", "k2", "k3", "weight");

        for ik in 0..self.get_n_kpts() {
            let xk_frac = self.get_k_frac(ik);

            info!(
                "{:12} {:^6} {:16.12} {:16.12} {:16.12} {:12.8}",
                "",
                ik + 1,
                xk_frac.x,
                xk_frac.y,
                xk_frac.z,
                self.get_k_weight(ik)
            );
        }
    }
}

// Factory for k-point generation modes.
pub fn new(input: &KptsInput) -> Result<Box<dyn KPTS>, KptsError> {
    match input {
        KptsInput::List { points, weights } => Ok(Box::new(KptsList::new(points, weights.as_deref())?)),
        KptsInput::Mesh {
            mesh,
            shift,
            time_reversal,
        } => Ok(Box::new(KptsMesh::new(*mesh, *shift, *time_reversal)?)),
    }
}
