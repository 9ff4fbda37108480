//! histbook CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod events;
mod run;

#[derive(Parser)]
#[command(name = "histbook")]
#[command(about = "histbook - book, fill, and write named histograms")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book a registry and list the synthesized keys per kind
    Keys {
        /// Booking file (YAML)
        #[arg(short, long)]
        booking: PathBuf,
    },

    /// Book, replay fill instructions, post-process, and write an output file
    Run {
        /// Booking file (YAML)
        #[arg(short, long)]
        booking: PathBuf,

        /// Fill instructions (JSON array)
        #[arg(short, long)]
        events: PathBuf,

        /// Output file (JSON directory tree)
        #[arg(short, long)]
        output: PathBuf,

        /// Only write keys containing this substring
        #[arg(long, default_value = "")]
        filter: String,

        /// Require every `:`-separated token in the key
        #[arg(long, default_value = "")]
        include: String,

        /// Skip keys containing any `:`-separated token
        #[arg(long, default_value = "")]
        exclude: String,

        /// Output directory for written objects
        #[arg(long, default_value = "")]
        dir: String,

        /// Reset negative bins (underflow and regular) of every 1D histogram to zero
        #[arg(long)]
        zero_negative: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Keys { booking } => run::cmd_keys(&booking),
        Commands::Run { booking, events, output, filter, include, exclude, dir, zero_negative } => {
            let opts = run::RunOptions { filter, include, exclude, dir, zero_negative };
            run::cmd_run(&booking, &events, &output, &opts)
        }
    }
}
