pub mod pbe;
pub mod pw92;
pub mod pz;
