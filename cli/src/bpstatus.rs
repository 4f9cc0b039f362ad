//! bpstatus - progress of a running BigPlanet archive build

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(name = "bpstatus")]
#[command(author = "VirtualPlanetaryLaboratory")]
#[command(version)]
#[command(about = "Show progress of a running BigPlanet archive build", long_about = None)]
struct Cli {
    /// BigPlanet or vspace input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match bigplanet::status(&cli.input) {
        Ok(counts) => {
            println!("Number of Simulations completed: {}", counts.completed);
            println!("Number of Simulations in progress: {}", counts.in_progress);
            println!("Number of Simulations remaining: {}", counts.remaining);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
