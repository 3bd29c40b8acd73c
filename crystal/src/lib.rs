use dwconsts::*;
use itertools::Itertools;
use lattice::Lattice;
use log::info;
use pspot::PSPot;
use serde::Deserialize;
use std::fmt;
use vector3::*;

#[derive(Debug, Clone, PartialEq)]
pub enum CrystalError {
    DegenerateLattice,
    NoAtoms,
    InvalidPosition { atom: usize },
    LengthMismatch { species: usize, positions: usize },
    MissingPseudopotential(String),
}

impl fmt::Display for CrystalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrystalError::DegenerateLattice => write!(f, "lattice vectors are linearly dependent"),
            CrystalError::NoAtoms => write!(f, "crystal contains no atoms"),
            CrystalError::InvalidPosition { atom } => {
                write!(f, "position of atom {} is not a finite vector", atom)
            }
            CrystalError::LengthMismatch { species, positions } => write!(
                f,
                "{} species labels given for {} positions",
                species, positions
            ),
            CrystalError::MissingPseudopotential(sp) => {
                write!(f, "no pseudopotential for species '{}'", sp)
            }
        }
    }
}

impl std::error::Error for CrystalError {}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Bohr,
    Angstrom,
}

impl Default for LengthUnit {
    fn default() -> Self {
        LengthUnit::Bohr
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomInput {
    pub species: String,
    /// fractional coordinates
    pub position: [f64; 3],
}

/// `[crystal]` section of the input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrystalInput {
    #[serde(default)]
    pub length_unit: LengthUnit,
    /// lattice vectors a, b, c
    pub lattice: [[f64; 3]; 3],
    pub atoms: Vec<AtomInput>,
}

// Crystal structure container.
//
// - lattice vectors stored in Bohr
// - atomic positions stored in fractional coordinates
#[derive(Debug, Clone)]
pub struct Crystal {
    latt: Lattice,
    atom_positions: Vec<Vector3f64>,
    atom_species: Vec<String>,
    atom_indices_by_specie: Vec<Vec<usize>>,
}

impl Crystal {
    pub fn new(latt: Lattice, atom_species: Vec<String>, atom_positions: Vec<Vector3f64>) -> Result<Crystal, CrystalError> {
        if latt.is_degenerate() {
            return Err(CrystalError::DegenerateLattice);
        }

        if atom_species.len() != atom_positions.len() {
            return Err(CrystalError::LengthMismatch {
                species: atom_species.len(),
                positions: atom_positions.len(),
            });
        }

        if atom_positions.is_empty() {
            return Err(CrystalError::NoAtoms);
        }

        if let Some(atom) = atom_positions.iter().position(|p| !p.is_finite()) {
            return Err(CrystalError::InvalidPosition { atom });
        }

        let unique: Vec<String> = atom_species.iter().cloned().unique().collect();

        let atom_indices_by_specie = unique
            .iter()
            .map(|sp| {
                atom_species
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| *s == sp)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        Ok(Crystal {
            latt,
            atom_positions,
            atom_species,
            atom_indices_by_specie,
        })
    }

    pub fn from_input(input: &CrystalInput) -> Result<Crystal, CrystalError> {
        let scale = match input.length_unit {
            LengthUnit::Bohr => 1.0,
            LengthUnit::Angstrom => ANG_TO_BOHR,
        };

        let mut cols = input.lattice;
        cols.iter_mut().flatten().for_each(|v| *v *= scale);

        Crystal::new(
            Lattice::from_columns(&cols),
            input.atoms.iter().map(|at| at.species.clone()).collect(),
            input.atoms.iter().map(|at| Vector3f64::from_array(at.position)).collect(),
        )
    }

    pub fn get_latt(&self) -> &Lattice {
        &self.latt
    }

    pub fn get_n_atoms(&self) -> usize {
        self.atom_positions.len()
    }

    pub fn get_atom_species(&self) -> &[String] {
        &self.atom_species
    }

    /// first-occurrence order
    pub fn get_unique_species(&self) -> Vec<String> {
        self.atom_species.iter().cloned().unique().collect()
    }

    pub fn get_n_unique_species(&self) -> usize {
        self.atom_indices_by_specie.len()
    }

    pub fn get_atom_indices_of_specie(&self, isp: usize) -> &[usize] {
        &self.atom_indices_by_specie[isp]
    }

    pub fn get_atom_positions(&self) -> &[Vector3f64] {
        &self.atom_positions
    }

    pub fn get_atom_positions_of_specie(&self, isp: usize) -> Vec<Vector3f64> {
        self.get_atom_indices_of_specie(isp)
            .iter()
            .map(|&i| self.atom_positions[i])
            .collect()
    }

    pub fn get_atom_positions_cart(&self) -> Vec<Vector3f64> {
        self.atom_positions.iter().map(|p| self.latt.frac_to_cart(p)).collect()
    }

    pub fn check_pseudopotentials(&self, pots: &PSPot) -> Result<(), CrystalError> {
        match self.get_unique_species().into_iter().find(|sp| !pots.has_species(sp)) {
            Some(sp) => Err(CrystalError::MissingPseudopotential(sp)),
            None => Ok(()),
        }
    }

    /// Per-atom ionic charges aligned with atom ordering.
    pub fn get_zions(&self, pots: &PSPot) -> Result<Vec<f64>, CrystalError> {
        self.atom_species
            .iter()
            .map(|sp| {
                pots.get_psp(sp)
                    .map(|p| p.get_zion())
                    .ok_or_else(|| CrystalError::MissingPseudopotential(sp.clone()))
            })
            .collect()
    }

    pub fn get_n_total_electrons(&self, pots: &PSPot) -> Result<f64, CrystalError> {
        Ok(self.get_zions(pots)?.iter().sum())
    }

    pub fn display(&self) {
        info!("   {:-^88}", " crystal structure ");

        info!("   lattice_vectors (bohr)");

        for (name, v) in ["a", "b", "c"].iter().zip(0..3) {
            let vec = self.latt.get_vector(v);
            info!("   {} = {:20.12}  {:20.12}  {:20.12}", name, vec.x, vec.y, vec.z);
        }

        info!("   volume = {:.6} bohr^3", self.latt.volume());
        info!("   natoms = {}", self.get_n_atoms());

        for (sp, pos) in self.atom_species.iter().zip(self.atom_positions.iter()) {
            info!("   {:>4} {:16.10} {:16.10} {:16.10}", sp, pos.x, pos.y, pos.z);
        }
    }
}
