use atompsp::{AtomPSP, HGHParams, PspError};
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Where the parameters of one species come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PspSource {
    Library { library: String },
    Hgh(HGHParams),
}

impl PspSource {
    pub fn library(name: &str) -> PspSource {
        PspSource::Library {
            library: name.to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            PspSource::Library { library } => format!("HGH {} (built-in)", library),
            PspSource::Hgh(p) => format!("HGH zion = {} rloc = {}", p.zion, p.rloc),
        }
    }
}

/// Pseudopotentials of all species, keyed by species name.
#[derive(Default)]
pub struct PSPot {
    pots: BTreeMap<String, Box<dyn AtomPSP>>,
    sources: BTreeMap<String, PspSource>,
}

impl PSPot {
    pub fn new(sources: &BTreeMap<String, PspSource>) -> Result<PSPot, PspError> {
        let mut pots = BTreeMap::new();

        for (sp, src) in sources.iter() {
            let params = match src {
                PspSource::Library { library } => atompsp::builtin_hgh(library)?,
                PspSource::Hgh(p) => p.clone(),
            };

            pots.insert(sp.clone(), atompsp::new(sp, &params)?);
        }

        Ok(PSPot {
            pots,
            sources: sources.clone(),
        })
    }

    pub fn get_psp(&self, sp: &str) -> Option<&dyn AtomPSP> {
        self.pots.get(sp).map(|p| p.as_ref())
    }

    pub fn has_species(&self, sp: &str) -> bool {
        self.pots.contains_key(sp)
    }

    pub fn get_max_lmax(&self) -> Option<usize> {
        self.pots.values().filter_map(|p| p.get_lmax()).max()
    }

    pub fn display(&self) {
        for (sp, src) in self.sources.iter() {
            info!("   {} : {}", sp, src.describe());
        }
    }
}
