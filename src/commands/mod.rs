//! Command-line interface.
//!
//! One subcommand per trigger action, plus the interactive console and the
//! store/config maintenance commands.

pub mod console;
pub mod generate;
pub mod init;
pub mod memory;
pub mod monitor;
pub mod reset;
pub mod retrieve;

use crate::libs::app::{Action, App};
use crate::libs::log_buffer::LogBuffer;
use crate::libs::layout::Layout;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Populate the store with duplicated image titles")]
    Duplicate(generate::GenerateArgs),
    #[command(about = "Populate the store with one shared image title")]
    Normalized(generate::GenerateArgs),
    #[command(about = "Watch the store and re-materialize on every change")]
    Monitor,
    #[command(about = "Retrieve all tasks repeatedly in the background")]
    Retrieve,
    #[command(about = "Retrieve all tasks in batches")]
    Batches(retrieve::BatchesArgs),
    #[command(about = "Retrieve all tasks on the calling thread")]
    RetrieveMain,
    #[command(about = "Show memory usage and run the allocation probe")]
    Memory,
    #[command(about = "Interactive console with the log panel")]
    Console(console::ConsoleArgs),
    #[command(about = "Clear all record tables")]
    Reset,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Duplicate(args) => generate::cmd(Layout::Duplicated, args).await,
            Commands::Normalized(args) => generate::cmd(Layout::Normalized, args).await,
            Commands::Monitor => monitor::cmd().await,
            Commands::Retrieve => retrieve::cmd(Action::Retrieve).await,
            Commands::Batches(args) => retrieve::batches(args).await,
            Commands::RetrieveMain => retrieve::cmd(Action::RetrieveMain).await,
            Commands::Memory => memory::cmd(),
            Commands::Console(args) => console::cmd(args).await,
            Commands::Reset => reset::cmd(),
        }
    }
}

/// App for one-shot commands: routine lines are printed as they are logged.
pub(crate) fn one_shot_app() -> Result<App> {
    App::from_data_storage(LogBuffer::new().echoing())
}

/// Triggers `action` and waits for it to finish.
pub(crate) async fn run_to_completion(app: &mut App, action: Action) -> Result<()> {
    app.trigger(action)?;
    app.wait().await?;
    Ok(())
}
