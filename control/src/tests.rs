use super::*;

const SILICON: &str = r#"
[control]
ecut = 5.0
n_bands = 8
xc = "none"
mixing = "simple"
damping = 0.7

[crystal]
lattice = [[0.0, 5.13157, 5.13157], [5.13157, 0.0, 5.13157], [5.13157, 5.13157, 0.0]]

[[crystal.atoms]]
species = "Si"
position = [0.125, 0.125, 0.125]

[[crystal.atoms]]
species = "Si"
position = [-0.125, -0.125, -0.125]

[kpoints]
scheme = "list"
points = [[0.0, 0.0, 0.0], [0.25, 0.0, 0.0], [0.5, 0.0, 0.0], [0.25, 0.25, 0.0]]
weights = [1.0, 8.0, 6.0, 12.0]

[pseudopotentials.Si]
library = "Si-q4"
"#;

#[test]
fn test_full_input() {
    let input = InputFile::from_toml_str(SILICON).unwrap();

    let ctrl = &input.control;

    assert_eq!(ctrl.get_ecut(), 5.0);
    assert_eq!(ctrl.get_ecutrho(), 20.0);
    assert_eq!(ctrl.get_nband(8.0), Ok(8));
    assert_eq!(ctrl.get_xc(), &XCInput::Shortcut("none".to_string()));

    let mixing = ctrl.get_mixing_settings();
    assert_eq!(mixing.scheme, MixingScheme::Simple);
    assert_eq!(mixing.acceleration, MixingAcceleration::None);
    assert_eq!(mixing.damping, 0.7);

    assert_eq!(input.crystal.atoms.len(), 2);
    assert!(matches!(input.kpoints, KptsInput::List { ref points, .. } if points.len() == 4));
    assert_eq!(input.pseudopotentials["Si"], PspSource::library("Si-q4"));
}

#[test]
fn test_defaults() {
    let ctrl = Control::from_toml_str("").unwrap();

    assert_eq!(ctrl, Control::default());
    assert_eq!(ctrl.get_smearing_scheme(), SmearingScheme::None);
    assert_eq!(ctrl.get_convergence(), ConvergenceCriterion::Density);
    assert_eq!(ctrl.get_eigen_solver(), EigenSolverScheme::Lobpcg);
    assert_eq!(ctrl.get_precond_scheme(), PrecondScheme::Kinetic);
    assert_eq!(ctrl.get_ecutrho(), 4.0 * ctrl.get_ecut());

    let mixing = ctrl.get_mixing_settings();
    assert_eq!(mixing.scheme, MixingScheme::Kerker);
    assert_eq!(mixing.acceleration, MixingAcceleration::Pulay);
    assert_eq!(mixing.kerker_floor, 0.05);
}

#[test]
fn test_mixing_defaults() {
    // metals default to LDOS mixing
    let metal = Control::from_toml_str("smearing = \"fd\"\ntemperature = 0.01").unwrap();
    assert_eq!(metal.get_mixing_settings().scheme, MixingScheme::Ldos);
    assert_eq!(metal.get_mixing_settings().acceleration, MixingAcceleration::Pulay);

    // plain damping is not accelerated unless asked for
    let plain = Control::from_toml_str("mixing = \"simple\"\ndamping = 1.0").unwrap();
    assert_eq!(plain.get_mixing_settings().scheme, MixingScheme::Simple);
    assert_eq!(plain.get_mixing_settings().acceleration, MixingAcceleration::None);

    let accelerated = Control::from_toml_str("mixing = \"simple\"\nmixing_acceleration = \"pulay\"").unwrap();
    assert_eq!(accelerated.get_mixing_settings().acceleration, MixingAcceleration::Pulay);

    let explicit = Control::from_toml_str("smearing = \"gs\"\nmixing = \"kerker\"\nkerker_floor = 0.0").unwrap();
    assert_eq!(explicit.get_mixing_settings().scheme, MixingScheme::Kerker);
    assert_eq!(explicit.get_mixing_settings().kerker_floor, 0.0);
}

#[test]
fn test_magnesium_control() {
    let ctrl = Control::from_toml_str(
        r#"
        ecut = 5.0
        smearing = "fd"
        temperature = 0.01
        mixing = "kerker"
        damping = 0.8
        xc = ["gga_x_pbe", "gga_c_pbe"]
        convergence = "energy"
        "#,
    )
    .unwrap();

    assert_eq!(ctrl.get_smearing_scheme(), SmearingScheme::Fd);
    assert_eq!(ctrl.get_convergence(), ConvergenceCriterion::Energy);

    // two filled bands plus room above the Fermi level
    assert_eq!(ctrl.get_nband(4.0), Ok(6));
}

#[test]
fn test_unknown_key_is_rejected() {
    assert!(matches!(
        Control::from_toml_str("ecutwfc = 5.0"),
        Err(ControlError::Parse(_))
    ));

    let bad = SILICON.replace("[kpoints]", "[kpoint]");
    assert!(matches!(InputFile::from_toml_str(&bad), Err(ControlError::Parse(_))));
}

#[test]
fn test_invalid_values() {
    let cases = [
        ("ecut = -1.0", "ecut"),
        ("ecut = 10.0\necut_rho = 5.0", "ecut_rho"),
        ("damping = 0.0", "damping"),
        ("damping = 1.5", "damping"),
        ("tol = 0.0", "tol"),
        ("n_bands = 0", "n_bands"),
        ("smearing = \"gs\"\ntemperature = 0.0", "temperature"),
        ("precond_shift = 0.0", "precond_shift"),
        ("mixing_history = 1", "mixing_history"),
        ("xc = \"lda_x_unknown\"", "xc"),
    ];

    for (toml_str, key) in cases.iter() {
        match Control::from_toml_str(toml_str) {
            Err(ControlError::InvalidValue { name, .. }) => assert_eq!(&name, key),
            other => panic!("{}: expected an invalid value, got {:?}", toml_str, other),
        }
    }

    // damping 1 is plain replacement, which is allowed
    assert!(Control::from_toml_str("damping = 1.0").is_ok());
}

#[test]
fn test_band_count() {
    let ctrl = Control::from_toml_str("n_bands = 3").unwrap();

    assert_eq!(ctrl.get_nband(6.0), Ok(3));
    assert_eq!(
        ctrl.get_nband(8.0),
        Err(ControlError::TooFewBands {
            n_bands: 3,
            n_electrons: 8.0
        })
    );

    // smearing needs at least one empty band
    let ctrl = Control::from_toml_str("n_bands = 2\nsmearing = \"fd\"").unwrap();
    assert!(ctrl.get_nband(4.0).is_err());
    assert_eq!(ctrl.get_nband(3.0), Ok(2));

    assert_eq!(Control::default().get_nband(8.0), Ok(4));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        InputFile::from_file("/nonexistent/in.toml"),
        Err(ControlError::Io { .. })
    ));
}
