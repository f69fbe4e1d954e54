mod artifacts;
mod commands;
mod config;
mod transport;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Command;

#[derive(Parser)]
#[command(name = "linkdeploy")]
#[command(about = "Deploy linked contracts in dependency order")]
#[command(version)]
struct Cli {
    /// Path to the project configuration file
    #[arg(long, global = true, default_value = config::CONFIG_FILE)]
    config: PathBuf,

    /// Maximum level of diagnostic logs written to stderr
    #[arg(long, global = true, default_value = "warn")]
    verbosity: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    cli.command.run(&cli.config).await
}
