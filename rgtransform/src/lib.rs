//! Transforms between the density sphere (1D list of G coefficients) and the
//! real-space grid. Forward transforms divide by the number of grid points,
//! so the G = 0 coefficient of a field is its cell average.

use dwconsts::*;
use dwfft3d::DWFFT3D;
use fftgrid::FFTGrid;
use gvector::GVector;
use ndarray::*;
use pwdensity::PWDensity;
use types::c64;

use std::cell::RefCell;
use std::collections::HashMap;

struct ThreadWorkspace {
    pfft: DWFFT3D,
    fft_work: Array3<c64>,
}

thread_local! {
    static THREAD_WORKSPACE: RefCell<HashMap<[usize; 3], ThreadWorkspace>> = RefCell::new(HashMap::new());
}

pub struct RGTransform {
    fftmesh: [usize; 3],
    den_index: Vec<usize>,
}

impl RGTransform {
    pub fn new(fftgrid: &FFTGrid, gvec: &GVector, pwden: &PWDensity) -> RGTransform {
        let fftmesh = fftgrid.get_size();

        let den_index = utility::compute_fft_linear_index_map(gvec.get_miller(), pwden.get_gindex(), fftmesh);

        RGTransform { fftmesh, den_index }
    }

    pub fn get_fftmesh(&self) -> [usize; 3] {
        self.fftmesh
    }

    fn with_workspace<R>(&self, f: impl FnOnce(&DWFFT3D, &mut Array3<c64>) -> R) -> R {
        THREAD_WORKSPACE.with(|workspaces| {
            let mut workspaces = workspaces.borrow_mut();

            let workspace = workspaces.entry(self.fftmesh).or_insert_with(|| ThreadWorkspace {
                pfft: DWFFT3D::new(self.fftmesh[0], self.fftmesh[1], self.fftmesh[2]),
                fft_work: Array3::<c64>::new(self.fftmesh),
            });

            f(&workspace.pfft, &mut workspace.fft_work)
        })
    }

    pub fn r3d_to_g1d(&self, rho_3d: &[c64], rhog_1d: &mut [c64]) {
        self.with_workspace(|pfft, fft_work| {
            forward(pfft, rho_3d, fft_work.as_mut_slice());

            utility::map_3d_to_1d_with_linear_index(&self.den_index, fft_work, rhog_1d);
        });
    }

    pub fn g1d_to_r3d(&self, rhog_1d: &[c64], rho_3d: &mut [c64]) {
        self.with_workspace(|pfft, fft_work| {
            utility::map_1d_to_3d_with_linear_index(&self.den_index, rhog_1d, fft_work);

            backward(pfft, fft_work.as_slice(), rho_3d);
        });
    }

    /// Forward transform over the full grid, for orbital work with its own
    /// index map.
    pub fn r3d_to_g3d(&self, r: &[c64], g: &mut [c64]) {
        self.with_workspace(|pfft, _| forward(pfft, r, g));
    }

    pub fn g3d_to_r3d(&self, g: &[c64], r: &mut [c64]) {
        self.with_workspace(|pfft, _| backward(pfft, g, r));
    }

    /// Spectral gradient of a real field restricted to the density sphere.
    pub fn gradient_r3d(&self, gvec: &GVector, pwden: &PWDensity, rho_3d: &[c64], grad_3d: &mut [Vec<c64>; 3]) {
        let npw = pwden.get_n_plane_waves();

        let mut rhog = vec![ZERO_C64; npw];
        self.r3d_to_g1d(rho_3d, &mut rhog);

        let gindex = pwden.get_gindex();
        let gcart = gvec.get_cart();

        for (idir, grad) in grad_3d.iter_mut().enumerate() {
            // i * G * rho(G)
            let drhog: Vec<c64> = rhog
                .iter()
                .zip(gindex.iter())
                .map(|(v, &ig)| I_C64 * gcart[ig].to_array()[idir] * v)
                .collect();

            self.g1d_to_r3d(&drhog, grad);
        }
    }

    pub fn divergence_r3d(&self, gvec: &GVector, pwden: &PWDensity, vec_3d: &[Vec<c64>; 3], div_3d: &mut [c64]) {
        let npw = pwden.get_n_plane_waves();

        let gindex = pwden.get_gindex();
        let gcart = gvec.get_cart();

        let mut div_g = vec![ZERO_C64; npw];
        let mut vg = vec![ZERO_C64; npw];

        for (idir, v3d) in vec_3d.iter().enumerate() {
            self.r3d_to_g1d(v3d, &mut vg);

            for (d, (v, &ig)) in div_g.iter_mut().zip(vg.iter().zip(gindex.iter())) {
                *d += I_C64 * gcart[ig].to_array()[idir] * v;
            }
        }

        self.g1d_to_r3d(&div_g, div_3d);
    }
}

fn forward(pfft: &DWFFT3D, r: &[c64], g: &mut [c64]) {
    pfft.fft3d(r, g);

    let ng_f64 = g.len() as f64;

    g.iter_mut().for_each(|x| *x /= ng_f64);
}

fn backward(pfft: &DWFFT3D, g: &[c64], r: &mut [c64]) {
    pfft.ifft3d(g, r);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lattice::Lattice;

    #[test]
    fn test_round_trip_and_gradient_of_cosine() {
        let a = 6.0;
        let latt = Lattice::from_columns(&[[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]);
        let grid = FFTGrid::new(&latt, 8.0);
        let gvec = GVector::new(&latt, &grid);
        let pwden = PWDensity::new(8.0, &gvec);
        let rgtrans = RGTransform::new(&grid, &gvec, &pwden);

        let [n1, n2, n3] = grid.get_size();
        let q = TWOPI / a;

        // f(x) = 2 + cos(q x)
        let mut f = vec![ZERO_C64; grid.get_ntot()];
        for k in 0..n3 {
            for j in 0..n2 {
                for i in 0..n1 {
                    let x = a * i as f64 / n1 as f64;
                    f[i + j * n1 + k * n1 * n2] = c64::new(2.0 + (q * x).cos(), 0.0);
                }
            }
        }

        let mut fg = vec![ZERO_C64; pwden.get_n_plane_waves()];
        rgtrans.r3d_to_g1d(&f, &mut fg);
        assert_abs_diff_eq!(fg[0].re, 2.0, epsilon = 1e-12);

        let mut back = vec![ZERO_C64; f.len()];
        rgtrans.g1d_to_r3d(&fg, &mut back);
        for (x, y) in back.iter().zip(f.iter()) {
            assert_abs_diff_eq!((x - y).norm(), 0.0, epsilon = 1e-12);
        }

        let mut grad = [f.clone(), f.clone(), f.clone()];
        rgtrans.gradient_r3d(&gvec, &pwden, &f, &mut grad);

        for i in 0..n1 {
            let x = a * i as f64 / n1 as f64;
            assert_abs_diff_eq!(grad[0][i].re, -q * (q * x).sin(), epsilon = 1e-10);
            assert_abs_diff_eq!(grad[1][i].norm(), 0.0, epsilon = 1e-10);
        }

        // div(grad f) = -q^2 cos(q x)
        let mut lap = vec![ZERO_C64; f.len()];
        rgtrans.divergence_r3d(&gvec, &pwden, &grad, &mut lap);

        for i in 0..n1 {
            let x = a * i as f64 / n1 as f64;
            assert_abs_diff_eq!(lap[i].re, -q * q * (q * x).cos(), epsilon = 1e-10);
        }
    }
}
