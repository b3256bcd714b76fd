pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "natours")]
#[command(about = "Natours CLI - maintenance commands for the tour booking API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Load or remove development data")]
    Seed {
        #[command(subcommand)]
        cmd: commands::seed::SeedCommands,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Seed { cmd } => commands::seed::handle(cmd).await,
    }
}
