use dwconsts::*;
use gvector::GVector;
use vector3::Vector3f64;

/// The density sphere |G|^2 <= 2*ecutrho around Gamma, grouped in shells of
/// equal |G| so radial form factors are evaluated once per shell.
/// Entry 0 is G = 0.
pub struct PWDensity {
    gindex: Vec<usize>,
    g: Vec<f64>,              // |G|
    gshell: Vec<f64>,         // distinct |G|
    gshell_index: Vec<usize>, // shell of each G
}

impl PWDensity {
    pub fn new(ecutrho: f64, gvec: &GVector) -> PWDensity {
        let gindex = gvec.get_g_vector_index(ecutrho, Vector3f64::zeros());

        let gcart = gvec.get_cart();

        let g: Vec<f64> = gindex.iter().map(|&j| gcart[j].norm2()).collect();

        let mut gshell = Vec::new();
        let mut gshell_index = Vec::with_capacity(g.len());

        // g is ascending because gvec is
        for &x in g.iter() {
            match gshell.last() {
                Some(&glen) if x - glen <= EPS10 => {}
                _ => gshell.push(x),
            }

            gshell_index.push(gshell.len() - 1);
        }

        PWDensity {
            gindex,
            g,
            gshell,
            gshell_index,
        }
    }

    pub fn get_g(&self) -> &[f64] {
        self.g.as_slice()
    }

    pub fn get_gindex(&self) -> &[usize] {
        self.gindex.as_slice()
    }

    pub fn get_n_plane_waves(&self) -> usize {
        self.gindex.len()
    }

    pub fn get_n_gshell(&self) -> usize {
        self.gshell.len()
    }

    pub fn get_gshell_norms(&self) -> &[f64] {
        self.gshell.as_slice()
    }

    pub fn get_gshell_index(&self) -> &[usize] {
        self.gshell_index.as_slice()
    }

    /// Expands a per-shell radial quantity onto the G vectors of the sphere.
    pub fn expand_shells(&self, per_shell: &[f64]) -> Vec<f64> {
        self.gshell_index.iter().map(|&ish| per_shell[ish]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fftgrid::FFTGrid;
    use lattice::Lattice;

    #[test]
    fn test_shells_of_simple_cubic() {
        let latt = Lattice::from_columns(&[[TWOPI, 0.0, 0.0], [0.0, TWOPI, 0.0], [0.0, 0.0, TWOPI]]);
        let gvec = GVector::new(&latt, &FFTGrid::new(&latt, 8.0));
        let pwden = PWDensity::new(1.0, &gvec);

        // shells |G|^2 = 0, 1, 2 with 1, 6, 12 members
        assert_eq!(pwden.get_n_plane_waves(), 19);
        assert_eq!(pwden.get_n_gshell(), 3);
        assert_eq!(pwden.get_g()[0], 0.0);

        let members: Vec<usize> = (0..3)
            .map(|s| pwden.get_gshell_index().iter().filter(|&&i| i == s).count())
            .collect();
        assert_eq!(members, vec![1, 6, 12]);

        let expanded = pwden.expand_shells(&[0.0, 1.0, 2.0]);
        assert_eq!(expanded.iter().sum::<f64>(), 6.0 + 24.0);
    }
}
