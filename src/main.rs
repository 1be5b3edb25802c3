// src/main.rs - Command line driver for the trajectory repair session
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use hermite_path::{Config, Session, load_config};

/// Path Repair CLI
#[derive(Parser, Debug)]
#[command(
    name = "path-repair",
    about = "Repair and tighten a two-segment trajectory under an acceleration bound."
)]
struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print node states, durations and the constraint table (default)
    State,
    /// Apply commands in order, e.g. `run feasible "fixup 2" gradient`
    Run {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Apply commands read line by line from a file, or stdin when omitted
    Script { file: Option<PathBuf> },
    /// Alternate feasibility repair and time-shrinking steps
    Optimize {
        #[arg(short, long, default_value_t = 10)]
        iterations: usize,
    },
    /// Print sampled position/velocity/acceleration as JSON
    Sample {
        /// Samples per segment (defaults to output.samples_per_segment)
        #[arg(short, long)]
        samples: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(&path.to_string_lossy())?
        }
        None => Config::default(),
    };

    if let Some(Commands::Sample { samples: Some(samples) }) = &cli.command {
        config.output.samples_per_segment = *samples;
    }

    let mut session = Session::new(config)?;

    match cli.command.unwrap_or(Commands::State) {
        Commands::State => print!("{}", session.state_report()),
        Commands::Run { commands } => {
            for line in &commands {
                let outcome = session.apply_line(line)?;
                print!("{}", outcome);
            }
        }
        Commands::Script { file } => {
            let reader: Box<dyn BufRead> = match file {
                Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
                None => Box::new(BufReader::new(io::stdin())),
            };
            run_script(&mut session, reader)?;
        }
        Commands::Optimize { iterations } => {
            let summary = session.optimize(iterations);
            print!("{}", summary);
            print!("{}", session.state_report());
        }
        Commands::Sample { .. } => {
            let states = session.sample()?;
            println!("{}", serde_json::to_string_pretty(&states)?);
        }
    }

    Ok(())
}

/// Apply every non-empty, non-comment line. Bad lines are reported and skipped.
fn run_script(session: &mut Session, reader: impl BufRead) -> io::Result<()> {
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match session.apply_line(line) {
            Ok(outcome) => print!("{}", outcome),
            Err(e) => tracing::error!("line {}: {}", number + 1, e),
        }
    }
    Ok(())
}
