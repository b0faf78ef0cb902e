mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{attributes, check, eval, AttributesArgs, CheckArgs, EvalArgs};

/// Webcell CLI - inspect custom-element manifests and binding expressions
#[derive(Parser, Debug)]
#[command(name = "webcell")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a component manifest and compile its template bindings
    Check(CheckArgs),

    /// Print the observed attributes of every component
    Attributes(AttributesArgs),

    /// Compile and evaluate a binding expression
    Eval(EvalArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} cannot read current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Attributes(args) => attributes(args, &cwd),
        Command::Eval(args) => eval(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
