//! bigplanet CLI - VPLanet parameter sweep aggregation tool

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use bigplanet::model::format_number;
use bigplanet::store::{compact, md5_checksum, Md5Status};
use bigplanet::{
    columns_to_json, create_archive_with_progress, create_matrix, extract_column,
    extract_unique_values, list_datasets, write_output, BplFile, BplInput, ErrorMode, JsonFormat,
    OutputOptions, RunOptions, TrialOutcome,
};

#[derive(Parser)]
#[command(name = "bigplanet")]
#[command(author = "VirtualPlanetaryLaboratory")]
#[command(version)]
#[command(about = "Aggregate, filter and extract VPLanet parameter sweeps", long_about = None)]
struct Cli {
    /// BigPlanet input file (bpl.in)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, env = "BIGPLANET_CORES")]
    cores: Option<usize>,

    /// Replace existing output files
    #[arg(short, long)]
    overwrite: bool,

    /// Build the archive (.bpa) instead of a filtered file
    #[arg(short, long)]
    archive: bool,

    /// Delete the raw simulation folder once the archive is verified
    #[arg(long = "deleterawdata")]
    delete_raw_data: bool,

    /// Warn about checksum mismatches instead of failing
    #[arg(long = "ignorecorrupt")]
    ignore_corrupt: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print debugging output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress of a running archive build
    Status {
        /// BigPlanet or vspace input file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// List groups and datasets of a BigPlanet file
    Info {
        /// Archive or filtered file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write columns to a delimited text file
    Export {
        /// Archive or filtered file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keys to export (body:variable:aggregation)
        #[arg(value_name = "KEY", required = true)]
        keys: Vec<String>,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "bigplanet.out")]
        output: PathBuf,

        /// Cell delimiter
        #[arg(short, long, default_value = " ")]
        delimiter: String,

        /// Write a header line
        #[arg(long)]
        header: bool,

        /// VR Ulysses format (User.csv)
        #[arg(long, conflicts_with = "json")]
        ulysses: bool,

        /// Write JSON instead of delimited text
        #[arg(long)]
        json: bool,
    },

    /// Print a contour matrix of one key over two others
    Matrix {
        /// Archive or filtered file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Key along the x axis
        #[arg(long)]
        x: String,

        /// Key along the y axis
        #[arg(long)]
        y: String,

        /// Key holding the values
        #[arg(long)]
        z: String,

        /// Quarter turns clockwise
        #[arg(long, default_value = "1")]
        orientation: usize,
    },

    /// Check group and file checksums
    Verify {
        /// Archive or filtered file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Drop replaced and deleted groups from a file
    Compact {
        /// Archive or filtered file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let mut cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command.take() {
        Some(Commands::Status { input }) => cmd_status(&input),
        Some(Commands::Info { file, json }) => cmd_info(&file, json),
        Some(Commands::Export {
            file,
            keys,
            output,
            delimiter,
            header,
            ulysses,
            json,
        }) => cmd_export(&file, &keys, output, &delimiter, header, ulysses, json),
        Some(Commands::Matrix {
            file,
            x,
            y,
            z,
            orientation,
        }) => cmd_matrix(&file, &x, &y, &z, orientation),
        Some(Commands::Verify { file }) => cmd_verify(&file),
        Some(Commands::Compact { file }) => cmd_compact(&file),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match &cli.input {
            Some(input) => cmd_run(input, &cli),
            None => {
                println!("{}", "Usage: bigplanet <INPUT> [-a] [-c CORES]".yellow());
                println!("       bigplanet --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn cmd_run(input_path: &Path, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let input = BplInput::load(input_path)?;

    let mut options = RunOptions::new().with_overwrite(cli.overwrite);
    if let Some(cores) = cli.cores {
        options = options.with_cores(cores);
    }
    if cli.ignore_corrupt {
        options = options.with_error_mode(ErrorMode::Lenient);
    }

    if cli.delete_raw_data {
        return cmd_delete_raw_data(&input);
    }

    if cli.archive {
        let pb = spinner(cli.quiet);
        pb.set_message("Archiving simulations...");
        let summary = create_archive_with_progress(&input, &options.archive(), |outcome| {
            pb.inc(1);
            if let TrialOutcome::Failed { group, error } = outcome {
                pb.println(format!("{} {}: {}", "Failed".red(), group, error));
            } else {
                pb.set_message(outcome.group().to_string());
            }
        })?;
        pb.finish_and_clear();

        println!(
            "{} {} ({} created, {} skipped, {} failed)",
            "Archive".green().bold(),
            summary.archive.display(),
            summary.created,
            summary.skipped,
            summary.failed
        );
        if !summary.is_complete() {
            return Err("some simulations failed; rerun to retry them".into());
        }
    } else {
        let pb = spinner(cli.quiet);
        pb.set_message("Filtering...");
        let path = bigplanet::filter(&input, &options)?;
        pb.finish_and_clear();
        println!("{} {}", "Saved to".green(), path.display());
    }

    Ok(())
}

fn cmd_delete_raw_data(input: &BplInput) -> Result<(), Box<dyn std::error::Error>> {
    let folder = input.folder_path();
    print!(
        "{} Delete {} and keep only {}? (y/n) ",
        "WARNING:".yellow().bold(),
        folder.display(),
        input.archive_path().display()
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if !matches!(answer.trim(), "y" | "Y" | "yes") {
        println!("Raw data kept");
        return Ok(());
    }

    bigplanet::delete_raw_data(input)?;
    println!("{} {}", "Deleted".green(), folder.display());
    Ok(())
}

fn cmd_status(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let counts = bigplanet::status(input)?;
    println!("Number of Simulations completed: {}", counts.completed);
    println!("Number of Simulations in progress: {}", counts.in_progress);
    println!("Number of Simulations remaining: {}", counts.remaining);
    Ok(())
}

fn cmd_info(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bpl = BplFile::open(file)?;
    let datasets = list_datasets(&bpl);

    if json {
        let info = serde_json::json!({
            "file": file.display().to_string(),
            "kind": bpl.kind().to_string(),
            "created": bpl.created().to_rfc3339(),
            "groups": bpl.groups(),
            "datasets": datasets,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "File Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), file.display());
    println!("{}: {}", "Kind".bold(), bpl.kind());
    println!("{}: {}", "Created".bold(), bpl.created().to_rfc3339());
    println!("{}: {}", "Groups".bold(), bpl.len());

    println!();
    println!("{}", "Groups".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for group in bpl.groups() {
        println!("{}", group);
    }

    println!();
    println!("{}", "Datasets".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for name in datasets {
        println!("{}", name);
    }

    Ok(())
}

fn cmd_export(
    file: &Path,
    keys: &[String],
    output: PathBuf,
    delimiter: &str,
    header: bool,
    ulysses: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bpl = BplFile::open(file)?;

    if json {
        let text = columns_to_json(&bpl, keys, JsonFormat::Pretty)?;
        fs::write(&output, text)?;
        println!("{} {}", "Saved to".green(), output.display());
        return Ok(());
    }

    let mut options = OutputOptions::new(output)
        .with_delimiter(delimiter)
        .with_header(header);
    if ulysses {
        options = options.ulysses();
    }

    let path = write_output(&bpl, keys, &options)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_matrix(
    file: &Path,
    x: &str,
    y: &str,
    z: &str,
    orientation: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let bpl = BplFile::open(file)?;
    let xs = extract_unique_values(&bpl, x)?;
    let ys = extract_unique_values(&bpl, y)?;
    let zs = extract_column(&bpl, z)?.numbers();

    let matrix = create_matrix(&xs, &ys, &zs, orientation)?;
    for row in matrix {
        let cells: Vec<String> = row.into_iter().map(format_number).collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

fn cmd_verify(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bpl = BplFile::open(file)?;
    println!(
        "{} {} groups passed Fletcher-32 checks",
        "OK".green().bold(),
        bpl.len()
    );

    match md5_checksum(file, false)? {
        Md5Status::Created => println!("{} MD5 checksum created", "OK".green().bold()),
        Md5Status::Verified => println!("{} MD5 checksum verified", "OK".green().bold()),
        Md5Status::Mismatch => println!("{} MD5 checksum mismatch", "FAIL".red().bold()),
    }
    Ok(())
}

fn cmd_compact(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reclaimed = compact(file)?;
    println!("{} {} bytes reclaimed", "Compacted".green(), reclaimed);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "bigplanet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("VPLanet parameter sweep aggregation tool");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/VirtualPlanetaryLaboratory/BigPlanet".dimmed()
    );
    println!("License: MIT");
}
