use dwconsts::*;
use lattice::Lattice;
use std::fmt;

/// Real-space grid shared by all k-points.
///
/// The grid holds every Miller index of the density sphere |G|^2 <= 2*ecutrho
/// without wrap-around: along axis i the largest index is |a_i| Gmax / 2pi,
/// so n_i >= 2 floor(|a_i| Gmax / 2pi) + 1, rounded up to a size with only
/// small prime factors. With ecutrho = 4*ecut the products V*psi of the
/// local potential apply are alias-free as well.
#[derive(Debug, Clone, PartialEq)]
pub struct FFTGrid {
    n1: usize,
    n2: usize,
    n3: usize,
}

impl FFTGrid {
    pub fn new(latt: &Lattice, ecutrho: f64) -> FFTGrid {
        let gmax = (2.0 * ecutrho).sqrt();

        let nmin = |len: f64| 2 * (gmax * len / TWOPI + EPS8).floor() as usize + 1;

        FFTGrid {
            n1: get_fft_size(nmin(latt.get_vector_a().norm2())),
            n2: get_fft_size(nmin(latt.get_vector_b().norm2())),
            n3: get_fft_size(nmin(latt.get_vector_c().norm2())),
        }
    }

    pub fn from_size(size: [usize; 3]) -> FFTGrid {
        FFTGrid {
            n1: size[0],
            n2: size[1],
            n3: size[2],
        }
    }

    pub fn get_ntotf64(&self) -> f64 {
        self.get_ntot() as f64
    }

    pub fn get_ntot(&self) -> usize {
        self.n1 * self.n2 * self.n3
    }

    pub fn get_size(&self) -> [usize; 3] {
        [self.n1, self.n2, self.n3]
    }
}

impl fmt::Display for FFTGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} x {} x {}", self.n1, self.n2, self.n3)
    }
}

fn get_fft_size(n: usize) -> usize {
    (n..).find(|&tn| has_small_factors_only(tn)).unwrap_or(n)
}

fn has_small_factors_only(n_to_check: usize) -> bool {
    const FACTORS: [usize; 4] = [2, 3, 5, 7];

    let mut tn = n_to_check;

    for fi in FACTORS.iter() {
        while tn % fi == 0 && tn != 1 {
            tn /= fi;
        }
    }

    tn == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_sizes_are_smooth() {
        assert_eq!(get_fft_size(11), 12);
        assert_eq!(get_fft_size(13), 14);
        assert_eq!(get_fft_size(17), 18);
        assert_eq!(get_fft_size(1), 1);
    }

    #[test]
    fn test_grid_covers_density_sphere() {
        let a = 10.0;
        let latt = Lattice::from_columns(&[[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, 2.0 * a]]);
        let ecutrho = 20.0;

        let grid = FFTGrid::new(&latt, ecutrho);
        let [n1, _, n3] = grid.get_size();

        let mmax = ((2.0 * ecutrho).sqrt() * a / TWOPI).floor() as usize;

        assert!(n1 >= 2 * mmax + 1);
        assert!(n3 >= 2 * (2 * mmax) + 1);
        assert_eq!(format!("{}", FFTGrid::from_size([4, 5, 6])), "4 x 5 x 6");
    }
}
