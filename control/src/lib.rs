//! Run parameters and the TOML input file.
//!
//! Energies are in Hartree, lengths in bohr. Every `[control]` key has a
//! default; unknown keys are rejected.

use crystal::CrystalInput;
use dwconsts::*;
use eigensolver::EigenSolverScheme;
use kpts::KptsInput;
use log::{info, warn};
use mixing::{MixingAcceleration, MixingScheme, MixingSettings};
use preconditioner::PrecondScheme;
use pspot::PspSource;
use serde::Deserialize;
use smearing::SmearingScheme;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use xc::XCInput;

const OUT_WIDTH1: usize = 24;
const OUT_WIDTH2: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    Io { path: String, reason: String },
    Parse(String),
    InvalidValue { name: &'static str, reason: String },
    TooFewBands { n_bands: usize, n_electrons: f64 },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlError::Io { path, reason } => write!(f, "cannot read '{}': {}", path, reason),
            ControlError::Parse(reason) => write!(f, "invalid input file: {}", reason),
            ControlError::InvalidValue { name, reason } => write!(f, "invalid '{}': {}", name, reason),
            ControlError::TooFewBands { n_bands, n_electrons } => {
                write!(f, "n_bands = {} cannot hold {} electrons", n_bands, n_electrons)
            }
        }
    }
}

impl std::error::Error for ControlError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvergenceCriterion {
    /// sqrt(Omega sum_G |rho_out(G) - rho_in(G)|^2) < tol
    Density,
    /// |E_n - E_{n-1}| < energy_tol
    Energy,
}

impl Default for ConvergenceCriterion {
    fn default() -> Self {
        ConvergenceCriterion::Density
    }
}

fn default_ecut() -> f64 {
    10.0
}

fn default_temperature() -> f64 {
    0.01
}

fn default_damping() -> f64 {
    0.8
}

fn default_kerker_k0() -> f64 {
    0.8
}

fn default_kerker_floor() -> f64 {
    0.05
}

fn default_mixing_history() -> usize {
    8
}

fn default_pulay_metric_weight() -> f64 {
    20.0
}

fn default_tol() -> f64 {
    1E-6
}

fn default_energy_tol() -> f64 {
    1E-8
}

fn default_scf_max_iter() -> usize {
    100
}

fn default_eigval_epsilon() -> f64 {
    1E-6
}

fn default_eigen_max_iter() -> usize {
    100
}

fn default_precond_shift() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    1234
}

/// `[control]` section of the input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Control {
    #[serde(default = "default_ecut")]
    ecut: f64,
    /// defaults to 4 ecut
    #[serde(default)]
    ecut_rho: Option<f64>,
    /// defaults from the electron count
    #[serde(default)]
    n_bands: Option<usize>,

    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default)]
    smearing: SmearingScheme,

    /// defaults to ldos with smearing, kerker otherwise
    #[serde(default)]
    mixing: Option<MixingScheme>,
    #[serde(default = "default_damping")]
    damping: f64,
    #[serde(default = "default_kerker_k0")]
    kerker_k0: f64,
    #[serde(default = "default_kerker_floor")]
    kerker_floor: f64,
    /// defaults to none for simple mixing, pulay otherwise
    #[serde(default)]
    mixing_acceleration: Option<MixingAcceleration>,
    #[serde(default = "default_mixing_history")]
    mixing_history: usize,
    #[serde(default = "default_pulay_metric_weight")]
    pulay_metric_weight: f64,

    #[serde(default = "default_tol")]
    tol: f64,
    #[serde(default = "default_energy_tol")]
    energy_tol: f64,
    #[serde(default)]
    convergence: ConvergenceCriterion,
    #[serde(default = "default_scf_max_iter")]
    scf_max_iter: usize,

    #[serde(default)]
    eigen_solver: EigenSolverScheme,
    #[serde(default = "default_eigval_epsilon")]
    eigval_epsilon: f64,
    #[serde(default = "default_eigen_max_iter")]
    eigen_max_iter: usize,
    #[serde(default)]
    preconditioner: PrecondScheme,
    #[serde(default = "default_precond_shift")]
    precond_shift: f64,

    #[serde(default)]
    xc: XCInput,

    #[serde(default = "default_seed")]
    seed: u64,
}

impl Default for Control {
    fn default() -> Self {
        Control {
            ecut: default_ecut(),
            ecut_rho: None,
            n_bands: None,
            temperature: default_temperature(),
            smearing: SmearingScheme::default(),
            mixing: None,
            damping: default_damping(),
            kerker_k0: default_kerker_k0(),
            kerker_floor: default_kerker_floor(),
            mixing_acceleration: None,
            mixing_history: default_mixing_history(),
            pulay_metric_weight: default_pulay_metric_weight(),
            tol: default_tol(),
            energy_tol: default_energy_tol(),
            convergence: ConvergenceCriterion::default(),
            scf_max_iter: default_scf_max_iter(),
            eigen_solver: EigenSolverScheme::default(),
            eigval_epsilon: default_eigval_epsilon(),
            eigen_max_iter: default_eigen_max_iter(),
            preconditioner: PrecondScheme::default(),
            precond_shift: default_precond_shift(),
            xc: XCInput::default(),
            seed: default_seed(),
        }
    }
}

fn invalid(name: &'static str, reason: &str) -> ControlError {
    ControlError::InvalidValue {
        name,
        reason: reason.to_string(),
    }
}

fn check_positive(name: &'static str, v: f64) -> Result<(), ControlError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be a positive number, got {}", v)))
    }
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Control, ControlError> {
        let ctrl: Control = toml::from_str(s).map_err(|e| ControlError::Parse(e.to_string()))?;

        ctrl.validate()?;

        Ok(ctrl)
    }

    /// Range checks that do not need the crystal.
    pub fn validate(&self) -> Result<(), ControlError> {
        check_positive("ecut", self.ecut)?;

        if let Some(ecut_rho) = self.ecut_rho {
            check_positive("ecut_rho", ecut_rho)?;

            if ecut_rho < self.ecut {
                return Err(invalid("ecut_rho", "must not be smaller than ecut"));
            }

            if ecut_rho < 4.0 * self.ecut {
                warn!("ecut_rho = {} is below 4 ecut; density products are aliased", ecut_rho);
            }
        }

        if self.n_bands == Some(0) {
            return Err(invalid("n_bands", "must be at least 1"));
        }

        if self.smearing != SmearingScheme::None {
            check_positive("temperature", self.temperature)?;
        } else if !(self.temperature >= 0.0) {
            return Err(invalid("temperature", "must not be negative"));
        }

        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(invalid("damping", &format!("must lie in (0, 1], got {}", self.damping)));
        }

        check_positive("kerker_k0", self.kerker_k0)?;

        if !(self.kerker_floor >= 0.0 && self.kerker_floor <= 1.0) {
            return Err(invalid("kerker_floor", "must lie in [0, 1]"));
        }

        if self.get_mixing_acceleration() == MixingAcceleration::Pulay && self.mixing_history < 2 {
            return Err(invalid("mixing_history", "Pulay mixing needs at least 2 steps of history"));
        }

        if !(self.pulay_metric_weight >= 0.0) {
            return Err(invalid("pulay_metric_weight", "must not be negative"));
        }

        check_positive("tol", self.tol)?;
        check_positive("energy_tol", self.energy_tol)?;
        check_positive("eigval_epsilon", self.eigval_epsilon)?;
        check_positive("precond_shift", self.precond_shift)?;

        if self.scf_max_iter == 0 {
            return Err(invalid("scf_max_iter", "must be at least 1"));
        }

        if self.eigen_max_iter == 0 {
            return Err(invalid("eigen_max_iter", "must be at least 1"));
        }

        xc::new(&self.xc).map_err(|e| ControlError::InvalidValue {
            name: "xc",
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Number of bands for `n_electrons`: the configured value after
    /// checking it holds every electron (with room above the Fermi level
    /// when smearing), or a default.
    pub fn get_nband(&self, n_electrons: f64) -> Result<usize, ControlError> {
        let n_filled = (n_electrons / SPIN_DEGENERACY).ceil() as usize;

        let smeared = self.smearing != SmearingScheme::None;

        match self.n_bands {
            Some(n_bands) => {
                if n_bands < n_filled || (smeared && SPIN_DEGENERACY * n_bands as f64 <= n_electrons) {
                    Err(ControlError::TooFewBands { n_bands, n_electrons })
                } else {
                    Ok(n_bands)
                }
            }
            None if smeared => Ok(n_filled + (n_filled / 5).max(4)),
            None => Ok(n_filled),
        }
    }

    pub fn get_ecut(&self) -> f64 {
        self.ecut
    }

    pub fn get_ecutrho(&self) -> f64 {
        self.ecut_rho.unwrap_or(4.0 * self.ecut)
    }

    pub fn get_temperature(&self) -> f64 {
        self.temperature
    }

    pub fn get_smearing_scheme(&self) -> SmearingScheme {
        self.smearing
    }

    pub fn get_mixing_scheme(&self) -> MixingScheme {
        match (self.mixing, self.smearing) {
            (Some(scheme), _) => scheme,
            (None, SmearingScheme::None) => MixingScheme::Kerker,
            (None, _) => MixingScheme::Ldos,
        }
    }

    /// Plain damping stays plain unless Pulay is asked for.
    pub fn get_mixing_acceleration(&self) -> MixingAcceleration {
        match (self.mixing_acceleration, self.get_mixing_scheme()) {
            (Some(acceleration), _) => acceleration,
            (None, MixingScheme::Simple) => MixingAcceleration::None,
            (None, _) => MixingAcceleration::Pulay,
        }
    }

    pub fn get_mixing_settings(&self) -> MixingSettings {
        MixingSettings {
            scheme: self.get_mixing_scheme(),
            acceleration: self.get_mixing_acceleration(),
            damping: self.damping,
            kerker_k0: self.kerker_k0,
            kerker_floor: self.kerker_floor,
            history: self.mixing_history,
            pulay_metric_weight: self.pulay_metric_weight,
        }
    }

    pub fn get_rho_epsilon(&self) -> f64 {
        self.tol
    }

    pub fn get_energy_epsilon(&self) -> f64 {
        self.energy_tol
    }

    pub fn get_convergence(&self) -> ConvergenceCriterion {
        self.convergence
    }

    pub fn get_scf_max_iter(&self) -> usize {
        self.scf_max_iter
    }

    pub fn get_eigen_solver(&self) -> EigenSolverScheme {
        self.eigen_solver
    }

    pub fn get_eigval_epsilon(&self) -> f64 {
        self.eigval_epsilon
    }

    pub fn get_eigen_max_iter(&self) -> usize {
        self.eigen_max_iter
    }

    pub fn get_precond_scheme(&self) -> PrecondScheme {
        self.preconditioner
    }

    pub fn get_precond_shift(&self) -> f64 {
        self.precond_shift
    }

    pub fn get_xc(&self) -> &XCInput {
        &self.xc
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    pub fn display(&self) {
        info!("   {:-^88}", " control parameters ");

        let rows: Vec<(&str, String)> = vec![
            ("ecut", format!("{:.6} Ha", self.get_ecut())),
            ("ecut_rho", format!("{:.6} Ha", self.get_ecutrho())),
            (
                "n_bands",
                self.n_bands.map_or_else(|| "auto".to_string(), |n| n.to_string()),
            ),
            ("smearing", format!("{:?}", self.smearing).to_lowercase()),
            ("temperature", format!("{:.6} Ha", self.temperature)),
            ("mixing", format!("{:?}", self.get_mixing_scheme()).to_lowercase()),
            (
                "mixing_acceleration",
                format!("{:?}", self.get_mixing_acceleration()).to_lowercase(),
            ),
            ("damping", format!("{}", self.damping)),
            ("kerker_k0", format!("{}", self.kerker_k0)),
            ("kerker_floor", format!("{}", self.kerker_floor)),
            ("mixing_history", format!("{}", self.mixing_history)),
            ("convergence", format!("{:?}", self.convergence).to_lowercase()),
            ("tol", format!("{:.3E}", self.tol)),
            ("energy_tol", format!("{:.3E} Ha", self.energy_tol)),
            ("scf_max_iter", format!("{}", self.scf_max_iter)),
            ("eigen_solver", format!("{:?}", self.eigen_solver).to_lowercase()),
            ("eigval_epsilon", format!("{:.3E}", self.eigval_epsilon)),
            ("preconditioner", format!("{:?}", self.preconditioner).to_lowercase()),
            ("precond_shift", format!("{}", self.precond_shift)),
            ("xc", format!("{}", self.xc)),
        ];

        for (name, value) in rows.iter() {
            info!(
                "   {:<width1$} = {:>width2$}",
                name,
                value,
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }
    }
}

/// The whole input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFile {
    #[serde(default)]
    pub control: Control,
    pub crystal: CrystalInput,
    pub kpoints: KptsInput,
    #[serde(default)]
    pub pseudopotentials: BTreeMap<String, PspSource>,
}

impl InputFile {
    pub fn from_toml_str(s: &str) -> Result<InputFile, ControlError> {
        let input: InputFile = toml::from_str(s).map_err(|e| ControlError::Parse(e.to_string()))?;

        input.control.validate()?;

        Ok(input)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<InputFile, ControlError> {
        let path = path.as_ref();

        let s = fs::read_to_string(path).map_err(|e| ControlError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        InputFile::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests;
