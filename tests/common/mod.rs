//! Synthetic VPLanet sweeps for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bigplanet::input::VplanetHelp;
use bigplanet::RunOptions;

/// Obliquity of the earth in each simulation (x axis).
pub const OBLIQUITIES: [f64; 2] = [0.1, 0.2];
/// Mass of the sun in each simulation (y axis).
pub const SUN_MASSES: [f64; 2] = [1.0, 2.0];

/// Final obliquity written to the log of a simulation.
pub fn final_obliquity(obliquity: f64, mass: f64) -> f64 {
    obliquity * mass
}

/// Mantle temperature series of simulation `index`.
pub fn mantle_temperatures(index: usize) -> Vec<f64> {
    vec![3000.0, 2900.0 - index as f64 * 10.0, 2800.0]
}

/// Build a four-simulation sweep under `root` and return the `bpl.in` path.
///
/// Simulations are named `sim_00` .. `sim_03`; simulation `i` uses
/// obliquity `OBLIQUITIES[i % 2]` and sun mass `SUN_MASSES[i / 2]`.
pub fn build_sweep(root: &Path, extra_options: &str) -> PathBuf {
    let folder = root.join("sweep");
    for index in 0..4 {
        let obliquity = OBLIQUITIES[index % 2];
        let mass = SUN_MASSES[index / 2];
        write_sim(&folder.join(format!("sim_{:02}", index)), index, obliquity, mass);
    }

    let input = root.join("bpl.in");
    fs::write(
        &input,
        format!(
            "sDestFolder sweep\nsArchiveFile sweep.bpa\nsOutputName sweep.bpf\n\
             saBodyFiles earth.in sun.in\nsPrimaryFile vpl.in\n{}",
            extra_options
        ),
    )
    .unwrap();
    input
}

fn write_sim(dir: &Path, index: usize, obliquity: f64, mass: f64) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("vpl.in"),
        "sSystemName solarsys\nsUnitMass kg\nsUnitTime year\nbDoForward 1\n",
    )
    .unwrap();
    fs::write(
        dir.join("earth.in"),
        format!(
            "sName earth\ndObliquity {}\nsaOutputOrder Time -TMan\n",
            obliquity
        ),
    )
    .unwrap();
    fs::write(dir.join("sun.in"), format!("sName sun\ndMass {}\n", mass)).unwrap();

    let log = format!(
        "\
-------- Log file solarsys.log -------

---- INITIAL SYSTEM PROPERTIES ----
(Age) System Age [year]: 0.000000
----- BODY: earth ----
(Obliquity) Obliquity [rad]: {obliquity}
Output Order: Time[year] TMan[K]
----- BODY: sun ----
(Mass) Mass [kg]: {mass}

---- FINAL SYSTEM PROPERTIES ----
(Age) System Age [year]: 2.000000
----- BODY: earth ----
(Obliquity) Obliquity [rad]: {final_obliquity}
Output Order: Time[year] TMan[K]
----- BODY: sun ----
(Mass) Mass [kg]: {mass}
",
        obliquity = obliquity,
        mass = mass,
        final_obliquity = final_obliquity(obliquity, mass),
    );
    fs::write(dir.join("solarsys.log"), log).unwrap();

    let temps = mantle_temperatures(index);
    let forward: String = temps
        .iter()
        .enumerate()
        .map(|(t, temp)| format!("{} {}\n", t, temp))
        .collect();
    fs::write(dir.join("solarsys.earth.forward"), forward).unwrap();
}

/// Run options that never call out to `vplanet`.
pub fn options() -> RunOptions {
    RunOptions::new().with_cores(2).with_help(VplanetHelp::new())
}
