use fftgrid::FFTGrid;
use itertools::iproduct;
use lattice::Lattice;
use vector3::{Vector3f64, Vector3i32};

/// All reciprocal lattice vectors representable on an FFT grid, ordered by
/// length (stable, so the order only depends on lattice and grid).
/// Index 0 is always G = 0.
#[derive(Debug)]
pub struct GVector {
    miller: Vec<Vector3i32>,
    cart: Vec<Vector3f64>,
}

impl GVector {
    pub fn new(latt: &Lattice, fftgrid: &FFTGrid) -> GVector {
        let blatt = latt.reciprocal();

        let [n1, n2, n3] = fftgrid.get_size();

        let t_miller: Vec<Vector3i32> = iproduct!(
            utility::fft_left_end(n1)..utility::fft_right_end(n1) + 1,
            utility::fft_left_end(n2)..utility::fft_right_end(n2) + 1,
            utility::fft_left_end(n3)..utility::fft_right_end(n3) + 1
        )
        .map(|(i, j, k)| Vector3i32::new(i, j, k))
        .collect();

        let t_cart: Vec<Vector3f64> = t_miller.iter().map(|mi| miller_to_cart(mi, &blatt)).collect();

        let t_g: Vec<f64> = t_cart.iter().map(|g| g.norm2()).collect();

        let ordered_index = utility::argsort(&t_g);

        let miller = ordered_index.iter().map(|&j| t_miller[j]).collect();
        let cart = ordered_index.iter().map(|&j| t_cart[j]).collect();

        GVector { miller, cart }
    }

    pub fn get_miller(&self) -> &[Vector3i32] {
        self.miller.as_slice()
    }

    pub fn get_cart(&self) -> &[Vector3f64] {
        self.cart.as_slice()
    }

    pub fn len(&self) -> usize {
        self.cart.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Indices of the G vectors with |k+G|^2 <= 2*Ecut, in storage order.
    pub fn get_g_vector_index(&self, ecut: f64, xk: Vector3f64) -> Vec<usize> {
        let two_ecut = 2.0 * ecut;

        self.cart
            .iter()
            .enumerate()
            .filter(|(_, g)| {
                let kg = xk + **g;
                kg.dot_product(&kg) <= two_ecut
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get_n_plane_waves(&self, ecut: f64, xk: Vector3f64) -> usize {
        self.get_g_vector_index(ecut, xk).len()
    }
}

// G = i * b1 + j * b2 + k * b3
fn miller_to_cart(mi: &Vector3i32, blatt: &Lattice) -> Vector3f64 {
    blatt.get_vector_a() * mi.x as f64 + blatt.get_vector_b() * mi.y as f64 + blatt.get_vector_c() * mi.z as f64
}
