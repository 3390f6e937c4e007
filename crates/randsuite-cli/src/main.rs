//! CLI for randsuite: run the NIST SP 800-22 battery against a bit stream.

mod commands;
mod input;
mod render;

use clap::{Parser, Subcommand};

use commands::InputArgs;

#[derive(Parser)]
#[command(name = "randsuite")]
#[command(about = "randsuite: NIST SP 800-22 statistical tests for random bit sequences")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all fifteen tests and print a summary table
    Run {
        /// File holding the sequence (raw bytes or ASCII 0/1), or - for stdin
        path: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Run a single test and print every outcome
    Test {
        /// Test name, e.g. "serial" or "random-excursions"
        name: String,

        /// File holding the sequence (raw bytes or ASCII 0/1), or - for stdin
        path: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// List the tests in battery order
    List,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Run { path, input } => commands::run::run(&path, &input),
        Commands::Test { name, path, input } => commands::test::run(&name, &path, &input),
        Commands::List => {
            commands::list::run();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
