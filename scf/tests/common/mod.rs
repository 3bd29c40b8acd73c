#![allow(dead_code)]

use control::InputFile;

pub const SILICON_STRUCTURE: &str = r#"
[crystal]
lattice = [[0.0, 5.131570667152971, 5.131570667152971],
           [5.131570667152971, 0.0, 5.131570667152971],
           [5.131570667152971, 5.131570667152971, 0.0]]

[[crystal.atoms]]
species = "Si"
position = [0.125, 0.125, 0.125]

[[crystal.atoms]]
species = "Si"
position = [-0.125, -0.125, -0.125]

[kpoints]
scheme = "list"
points = [[0.0, 0.0, 0.0],
          [0.3333333333333333, 0.0, 0.0],
          [0.3333333333333333, 0.3333333333333333, 0.0],
          [-0.3333333333333333, 0.3333333333333333, 0.0]]
weights = [1.0, 8.0, 6.0, 12.0]

[pseudopotentials.Si]
library = "Si-q4"
"#;

pub const MAGNESIUM_STRUCTURE: &str = r#"
[crystal]
lattice = [[-3.01794, -5.22722, 0.0],
           [-3.01794, 5.22722, 0.0],
           [0.0, 0.0, -9.77362]]

[[crystal.atoms]]
species = "Mg"
position = [0.6666666666666666, 0.3333333333333333, 0.25]

[[crystal.atoms]]
species = "Mg"
position = [0.3333333333333333, 0.6666666666666666, 0.75]

[kpoints]
scheme = "mesh"
mesh = [2, 2, 2]

[pseudopotentials.Mg]
library = "Mg-q2"
"#;

/// `control` is the body of the [control] section.
pub fn silicon(control: &str) -> InputFile {
    InputFile::from_toml_str(&format!("[control]\n{}\n{}", control, SILICON_STRUCTURE)).unwrap()
}

pub fn magnesium(control: &str) -> InputFile {
    InputFile::from_toml_str(&format!("[control]\n{}\n{}", control, MAGNESIUM_STRUCTURE)).unwrap()
}
