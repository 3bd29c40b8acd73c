use anyhow::{Context, Result};
use control::InputFile;
use crystal::Crystal;
use dwconsts::*;
use env_logger::{Builder, Env};
use log::{info, warn};
use pspot::PSPot;
use std::io::Write;

const DEFAULT_INPUT: &str = "in.toml";

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let stopwatch_main = std::time::Instant::now();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_INPUT.to_string());

    // read in the input file

    let input = InputFile::from_file(&path).with_context(|| format!("cannot load input '{}'", path))?;

    let control = &input.control;

    control.validate().context("invalid [control] section")?;

    control.display();

    let crystal = Crystal::from_input(&input.crystal).context("invalid [crystal] section")?;

    crystal.display();

    let pots = PSPot::new(&input.pseudopotentials).context("invalid [pseudopotentials] section")?;

    pots.display();

    let kpts = kpts::new(&input.kpoints).context("invalid [kpoints] section")?;

    kpts.display();

    // self-consistent field

    let result = scf::run(control, &crystal, &pots, kpts.as_ref(), None).context("scf failed")?;

    if !result.converged {
        warn!("results below are from an unconverged scf run");
    }

    // eigenvalues and occupations

    println!();
    println!("   {:-^88}", " eigenvalues (eV) and occupations ");

    for (ik, (evals, occ)) in result.eigenvalues.iter().zip(result.occupations.iter()).enumerate() {
        let k = &result.k_frac[ik];

        println!();
        println!(
            "   k = {:10.6} {:10.6} {:10.6}   weight = {:10.6}   npw = {}",
            k.x, k.y, k.z, result.k_weights[ik], result.n_plane_waves[ik]
        );

        for (ib, (e, f)) in evals.iter().zip(occ.iter()).enumerate() {
            println!("   {:>6} {:>16.8} {:>12.8}", ib + 1, e * HA_TO_EV, f);
        }
    }

    println!();
    println!("   {:16}{:5}{:16.8} eV", "Fermi level", ":", result.fermi_level * HA_TO_EV);
    println!("   {:16}{:5}{:16}", "scf steps", ":", result.n_iter);
    println!("   {:16}{:5}{:16}", "converged", ":", result.converged);

    info!("");
    result.energies.display();

    // computing time statistics

    println!();
    println!("   {:-^88}", " statistics ");
    println!();
    let elapsed_main_seconds = stopwatch_main.elapsed().as_secs_f64();
    println!(
        "   {:16}{:5}{:16.2} seconds {:16.2} hours",
        "Total",
        ":",
        elapsed_main_seconds,
        elapsed_main_seconds / 3600.0
    );

    Ok(())
}
