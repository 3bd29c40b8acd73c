use dwconsts::*;
use vector3::*;

use std::fmt;

/// Three lattice vectors, stored as the columns a, b, c.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lattice {
    vectors: [Vector3f64; 3],
}

impl Lattice {
    pub fn new(a: Vector3f64, b: Vector3f64, c: Vector3f64) -> Lattice {
        Lattice { vectors: [a, b, c] }
    }

    pub fn from_columns(cols: &[[f64; 3]; 3]) -> Lattice {
        Lattice::new(
            Vector3f64::from_array(cols[0]),
            Vector3f64::from_array(cols[1]),
            Vector3f64::from_array(cols[2]),
        )
    }

    pub fn get_vector_a(&self) -> Vector3f64 {
        self.vectors[0]
    }

    pub fn get_vector_b(&self) -> Vector3f64 {
        self.vectors[1]
    }

    pub fn get_vector_c(&self) -> Vector3f64 {
        self.vectors[2]
    }

    pub fn get_vector(&self, i: usize) -> Vector3f64 {
        self.vectors[i]
    }

    // ( a x b ) . c
    pub fn triple_product(&self) -> f64 {
        let [a, b, c] = self.vectors;

        a.cross_product(&b).dot_product(&c)
    }

    pub fn volume(&self) -> f64 {
        self.triple_product().abs()
    }

    /// Degenerate when the cell volume is negligible against the cube of the
    /// longest lattice vector.
    pub fn is_degenerate(&self) -> bool {
        let lmax = self
            .vectors
            .iter()
            .map(|v| v.norm2())
            .fold(0.0, f64::max);

        !self.triple_product().is_finite() || self.volume() <= EPS8 * lmax.powi(3)
    }

    // ra = 2 x PI x (b x c) / volume
    // rb = 2 x PI x (c x a) / volume
    // rc = 2 x PI x (a x b) / volume
    pub fn reciprocal(&self) -> Lattice {
        let factor = TWOPI / self.triple_product();

        let [a, b, c] = self.vectors;

        Lattice::new(
            b.cross_product(&c) * factor,
            c.cross_product(&a) * factor,
            a.cross_product(&b) * factor,
        )
    }

    pub fn frac_to_cart(&self, pos_f: &Vector3f64) -> Vector3f64 {
        let [a, b, c] = self.vectors;

        a * pos_f.x + b * pos_f.y + c * pos_f.z
    }

    pub fn cart_to_frac(&self, pos_c: &Vector3f64) -> Vector3f64 {
        let blatt = self.reciprocal();

        Vector3f64::new(
            blatt.get_vector_a().dot_product(pos_c),
            blatt.get_vector_b().dot_product(pos_c),
            blatt.get_vector_c().dot_product(pos_c),
        ) * (1.0 / TWOPI)
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Lattice")?;

        for v in self.vectors.iter() {
            writeln!(f, "{:25.16}\t{:25.16}\t{:25.16}", v.x, v.y, v.z)?;
        }

        Ok(())
    }
}
