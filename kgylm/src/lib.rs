use dwconsts::*;
use gvector::GVector;
use pwbasis::PWBasis;
use vector3::Vector3f64;

//
// Y_lm(k+G) on the plane waves of one k point, l = 0..=lmax
//
pub struct KGYLM {
    lmax: usize,
    data: Vec<Vec<f64>>,
}

impl KGYLM {
    pub fn new(lmax: usize, gvec: &GVector, pwwfc: &PWBasis) -> KGYLM {
        let xk = pwwfc.get_k_cart();

        let gindex = pwwfc.get_gindex();

        let mut data = Vec::with_capacity((lmax + 1) * (lmax + 1));

        for l in 0..=lmax {
            for m in utility::get_quant_num_m(l) {
                data.push(compute_ylm_batch(gvec, xk, gindex, l, m));
            }
        }

        KGYLM { lmax, data }
    }

    pub fn get_lmax(&self) -> usize {
        self.lmax
    }

    pub fn get_data(&self, l: usize, m: i32) -> &[f64] {
        assert!(l <= self.lmax && m.unsigned_abs() as usize <= l);

        &self.data[l * l + (m + l as i32) as usize]
    }
}

fn compute_ylm_batch(gvec: &GVector, xk: Vector3f64, gindex: &[usize], l: usize, m: i32) -> Vec<f64> {
    let gcart = gvec.get_cart();

    gindex
        .iter()
        .map(|&ig| {
            let mut xkg = xk + gcart[ig];

            // direction of k+G = 0 is arbitrary
            if xkg.norm2() < EPS16 {
                xkg.y = xkg.y.signum() * EPS16;
            }

            special::real_spherical_harmonics(l, m, xkg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use fftgrid::FFTGrid;
    use lattice::Lattice;

    #[test]
    fn test_ylm_sum_rule() {
        let latt = Lattice::from_columns(&[[6.0, 0.0, 0.0], [0.0, 6.0, 0.0], [0.0, 0.0, 6.0]]);
        let fftgrid = FFTGrid::new(&latt, 20.0);
        let gvec = GVector::new(&latt, &fftgrid);

        let xk = Vector3f64::new(0.1, 0.0, 0.05);
        let pwwfc = PWBasis::new(xk, 0, 5.0, &gvec).unwrap();

        let kgylm = KGYLM::new(2, &gvec, &pwwfc);

        // sum_m |Y_lm|^2 = (2l+1) / 4 pi for every direction
        for l in 0..=2 {
            for ipw in 0..pwwfc.get_n_plane_waves() {
                let s: f64 = utility::get_quant_num_m(l)
                    .iter()
                    .map(|&m| kgylm.get_data(l, m)[ipw].powi(2))
                    .sum();

                assert_abs_diff_eq!(s, (2 * l + 1) as f64 / FOURPI, epsilon = 1e-12);
            }
        }
    }
}
