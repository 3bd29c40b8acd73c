use gvector::GVector;
use std::fmt;
use vector3::{Vector3f64, Vector3i32};

#[derive(Debug, Clone, PartialEq)]
pub enum BasisError {
    EmptyBasis { k_index: usize, ecut: f64 },
}

impl fmt::Display for BasisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BasisError::EmptyBasis { k_index, ecut } => write!(
                f,
                "no plane wave satisfies |k+G|^2/2 <= {} at k-point {}",
                ecut, k_index
            ),
        }
    }
}

impl std::error::Error for BasisError {}

/// Plane waves of one k-point, ordered by |k+G| (ties keep the G-vector
/// order, which is itself sorted by |G| and then by Miller index).
#[derive(Debug, Clone, Default)]
pub struct PWBasis {
    k_cart: Vector3f64, // in cartesian coordinates
    k_index: usize,     // index of this xk in all xks
    npw: usize,         // number of plane waves
    gindex: Vec<usize>, // indices of G vectors used in this set of plane wave basis
    kg: Vec<f64>,       // norms of the vectors xk+gvec
}

impl PWBasis {
    pub fn new(k_cart: Vector3f64, k_index: usize, ecut: f64, gvec: &GVector) -> Result<PWBasis, BasisError> {
        let t_gindex = gvec.get_g_vector_index(ecut, k_cart);

        if t_gindex.is_empty() {
            return Err(BasisError::EmptyBasis { k_index, ecut });
        }

        let gcart = gvec.get_cart();

        let t_kg: Vec<f64> = t_gindex.iter().map(|&j| (k_cart + gcart[j]).norm2()).collect();

        let ordered_index = utility::argsort(&t_kg);

        let gindex: Vec<usize> = ordered_index.iter().map(|&j| t_gindex[j]).collect();
        let kg: Vec<f64> = ordered_index.iter().map(|&j| t_kg[j]).collect();

        Ok(PWBasis {
            k_cart,
            k_index,
            npw: gindex.len(),
            gindex,
            kg,
        })
    }

    pub fn get_kg(&self) -> &[f64] {
        self.kg.as_slice()
    }

    /// |k+G|^2 / 2, the diagonal of the kinetic operator.
    pub fn get_kinetic_diagonal(&self) -> Vec<f64> {
        self.kg.iter().map(|x| 0.5 * x * x).collect()
    }

    pub fn get_k_cart(&self) -> Vector3f64 {
        self.k_cart
    }

    pub fn get_k_index(&self) -> usize {
        self.k_index
    }

    pub fn get_gindex(&self) -> &[usize] {
        self.gindex.as_slice()
    }

    pub fn get_n_plane_waves(&self) -> usize {
        self.npw
    }

    pub fn get_miller(&self, gvec: &GVector) -> Vec<Vector3i32> {
        let miller = gvec.get_miller();

        self.gindex.iter().map(|&j| miller[j]).collect()
    }
}
