use dwconsts::*;
use itertools::multizip;
use ndarray::Array3;
use rand::Rng;
use types::c64;
use vector3::*;

pub fn get_quant_num_m(l: usize) -> Vec<i32> {
    (0..2 * l + 1).map(|im| im as i32 - l as i32).collect()
}

pub fn add_and_scale(inp: &[c64], out: &mut [c64], factor: f64) {
    assert_eq!(inp.len(), out.len());

    for (x, y) in multizip((inp.iter(), out.iter_mut())) {
        *y += *x * factor;
    }
}

pub fn add_and_zscale(inp: &[c64], out: &mut [c64], factor: c64) {
    assert_eq!(inp.len(), out.len());

    for (x, y) in multizip((inp.iter(), out.iter_mut())) {
        *y += *x * factor;
    }
}

pub fn dot_product_v3i32_v3f64(g: Vector3i32, r: Vector3f64) -> f64 {
    f64::from(g.x) * r.x + f64::from(g.y) * r.y + f64::from(g.z) * r.z
}

/// `sum_i conj(u_i) v_i`
pub fn zdot_product(u: &[c64], v: &[c64]) -> c64 {
    assert_eq!(u.len(), v.len());

    multizip((u.iter(), v.iter()))
        .map(|(x, y)| x.conj() * (*y))
        .sum()
}

/// `sum_i conj(u_i) m_i v_i`
pub fn zdot_product_metric(u: &[c64], v: &[c64], metric: &[f64]) -> c64 {
    assert_eq!(u.len(), v.len());
    assert_eq!(u.len(), metric.len());

    multizip((u.iter(), v.iter(), metric.iter()))
        .map(|(x, y, m)| x.conj() * (*m) * (*y))
        .sum()
}

pub fn vec_norm(v: &[c64]) -> f64 {
    v.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}

pub fn normalize_vector_c64(v: &mut [c64]) {
    let s = vec_norm(v);

    if s > 0.0 {
        v.iter_mut().for_each(|x| *x /= s);
    }
}

/// Random unit vector drawn from `rng`; callers seed it for reproducible runs.
pub fn make_normalized_rand_vector<R: Rng>(rng: &mut R, v: &mut [c64]) {
    for y in v.iter_mut() {
        let t = rng.gen_range(-0.5f64, 0.5f64);
        let theta = t * TWOPI;

        *y = c64::new(t * theta.cos(), t * theta.sin());
    }

    normalize_vector_c64(v);
}

/// Stable ascending argsort; ties keep their input order.
pub fn argsort(v: &[f64]) -> Vec<usize> {
    let mut idx = (0..v.len()).collect::<Vec<_>>();

    idx.sort_by(|&i, &j| v[i].total_cmp(&v[j]));

    idx
}

/// N even, 8
///
/// n : 0 1 2 3 4 5 6 7
///
/// i : 0 1 2 3 4 -3 -2 -1
///
/// N Odd, 7
///
/// n : 0 1 2 3 4 5 6
///
/// i : 0 1 2 3 -3 -2 -1
pub fn fft_left_end(n: usize) -> i32 {
    let nn = n as i32;

    if n % 2 == 0 {
        -(nn - 2) / 2
    } else {
        -(nn - 1) / 2
    }
}

pub fn fft_right_end(n: usize) -> i32 {
    let nn = n as i32;

    if n % 2 == 0 {
        nn / 2
    } else {
        (nn - 1) / 2
    }
}

pub fn fft_i2n(i: i32, ntot: usize) -> usize {
    if i < 0 {
        (i + ntot as i32) as usize
    } else {
        i as usize
    }
}

pub fn fft_n2i(n: usize, ntot: usize) -> i32 {
    if n > ntot / 2 {
        n as i32 - ntot as i32
    } else {
        n as i32
    }
}

pub fn compute_fft_linear_index_map(miller: &[Vector3i32], gindex: &[usize], fftgrid: [usize; 3]) -> Vec<usize> {
    let [n1, n2, n3] = fftgrid;

    gindex
        .iter()
        .map(|&ig| {
            let mi = miller[ig];

            let idx0 = fft_i2n(mi.x, n1);
            let idx1 = fft_i2n(mi.y, n2);
            let idx2 = fft_i2n(mi.z, n3);

            debug_assert!(idx0 < n1 && idx1 < n2 && idx2 < n3);

            idx0 + idx1 * n1 + idx2 * n1 * n2
        })
        .collect()
}

pub fn map_3d_to_1d_with_linear_index(linear_index: &[usize], v3d: &Array3<c64>, v1d: &mut [c64]) {
    assert_eq!(linear_index.len(), v1d.len());

    let v3d_slice = v3d.as_slice();

    for (v, &idx) in multizip((v1d.iter_mut(), linear_index.iter())) {
        *v = v3d_slice[idx];
    }
}

pub fn map_1d_to_3d_with_linear_index(linear_index: &[usize], v1d: &[c64], v3d: &mut Array3<c64>) {
    assert_eq!(linear_index.len(), v1d.len());

    v3d.set_value(ZERO_C64);

    let v3d_slice = v3d.as_mut_slice();

    for (v, &idx) in multizip((v1d.iter(), linear_index.iter())) {
        v3d_slice[idx] = *v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_fft_index_helpers() {
        let v7: Vec<i32> = (fft_left_end(7)..fft_right_end(7) + 1).collect();
        let v8: Vec<i32> = (fft_left_end(8)..fft_right_end(8) + 1).collect();

        assert_eq!(v7, vec![-3, -2, -1, 0, 1, 2, 3]);
        assert_eq!(v8, vec![-3, -2, -1, 0, 1, 2, 3, 4]);

        for n in 0..8 {
            assert_eq!(fft_i2n(fft_n2i(n, 8), 8), n);
        }
    }

    #[test]
    fn test_argsort_is_stable() {
        let v = [0.5, 0.1, 0.5, 0.1];

        assert_eq!(argsort(&v), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_seeded_random_vector_is_reproducible() {
        let mut a = vec![ZERO_C64; 16];
        let mut b = vec![ZERO_C64; 16];

        make_normalized_rand_vector(&mut rand::rngs::StdRng::seed_from_u64(7), &mut a);
        make_normalized_rand_vector(&mut rand::rngs::StdRng::seed_from_u64(7), &mut b);

        assert_eq!(a, b);
        assert!((vec_norm(&a) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_linear_index_scatter_gather() {
        let miller = vec![Vector3i32::new(0, 0, 0), Vector3i32::new(-1, 1, 0)];
        let idx = compute_fft_linear_index_map(&miller, &[0, 1], [3, 3, 2]);

        assert_eq!(idx, vec![0, 2 + 3]);

        let v1d = vec![c64::new(1.0, 0.0), c64::new(2.0, -1.0)];
        let mut v3d = Array3::<c64>::new([3, 3, 2]);
        let mut back = vec![ZERO_C64; 2];

        map_1d_to_3d_with_linear_index(&idx, &v1d, &mut v3d);
        map_3d_to_1d_with_linear_index(&idx, &v3d, &mut back);

        assert_eq!(back, v1d);
        assert_eq!(v3d.sum(), c64::new(3.0, -1.0));
    }
}
