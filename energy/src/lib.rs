use crystal::{Crystal, CrystalError};
use dwconsts::*;
use itertools::multizip;
use kscf::KSCF;
use log::info;
use num_traits::identities::Zero;
use pspot::PSPot;
use std::collections::BTreeMap;
use types::c64;

const OUT_WIDTH1: usize = 16;
const OUT_WIDTH2: usize = 20;

/// Total energy by component, in Hartree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Energies {
    pub kinetic: f64,
    pub hartree: f64,
    pub local: f64,
    pub nonlocal: f64,
    pub xc: f64,
    pub ewald: f64,
    pub psp_correction: f64,
    /// -TS of the smearing
    pub entropy: f64,
    /// sum f e, not part of the total
    pub band_energy: f64,
}

impl Energies {
    pub fn total(&self) -> f64 {
        self.kinetic
            + self.hartree
            + self.local
            + self.nonlocal
            + self.xc
            + self.ewald
            + self.psp_correction
            + self.entropy
    }

    pub fn is_finite(&self) -> bool {
        self.terms().iter().all(|(_, e)| e.is_finite())
    }

    fn terms(&self) -> [(&'static str, f64); 10] {
        [
            ("kinetic", self.kinetic),
            ("hartree", self.hartree),
            ("local", self.local),
            ("nonlocal", self.nonlocal),
            ("xc", self.xc),
            ("ewald", self.ewald),
            ("psp_correction", self.psp_correction),
            ("entropy", self.entropy),
            ("total", self.total()),
            ("band_energy", self.band_energy),
        ]
    }

    /// name -> value, including "total"
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.terms().iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    pub fn display(&self) {
        info!("      {:-^48}", " total energy (Ha) ");

        for (name, e) in self.terms().iter() {
            info!(
                "      {:<width1$} = {:>width2$.12} {:>width2$.8} eV",
                name,
                e,
                e * HA_TO_EV,
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }
    }
}

/// sum_k w_k sum_n f_nk <psi_nk|T|psi_nk>
pub fn kinetic(vkscf: &[KSCF]) -> f64 {
    vkscf.iter().map(|k| k.get_k_weight() * k.get_kinetic_energy()).sum()
}

/// sum_k w_k sum_n f_nk <psi_nk|V_nl|psi_nk>
pub fn nonlocal(vkscf: &[KSCF]) -> f64 {
    vkscf.iter().map(|k| k.get_k_weight() * k.get_nonlocal_energy()).sum()
}

pub fn band_structure(vkscf: &[KSCF]) -> f64 {
    vkscf.iter().map(|k| k.get_k_weight() * k.get_band_energy()).sum()
}

/// Omega sum_G conj(rho(G)) V_loc(G)
pub fn vpsloc(volume: f64, vpslocg: &[c64], rhog: &[c64]) -> f64 {
    let mut etot_vpsloc = c64::zero();

    for (vps, rho) in multizip((vpslocg.iter(), rhog.iter())) {
        etot_vpsloc += vps * rho.conj();
    }

    etot_vpsloc.re * volume
}

/// Energy of the G = 0 local pseudopotential left out of V_loc(G):
/// (N_el / Omega) sum_atoms lim_{q->0} [V_loc(q) + 4 pi Z / q^2].
pub fn psp_correction(crystal: &Crystal, pspot: &PSPot) -> Result<f64, CrystalError> {
    let n_electrons = crystal.get_n_total_electrons(pspot)?;

    let mut alpha = 0.0;

    for sp in crystal.get_atom_species().iter() {
        let psp = pspot
            .get_psp(sp)
            .ok_or_else(|| CrystalError::MissingPseudopotential(sp.clone()))?;

        alpha += psp.get_vloc_limit();
    }

    Ok(n_electrons * alpha / crystal.get_latt().volume())
}
