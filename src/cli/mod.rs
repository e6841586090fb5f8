pub mod replay;
pub mod state;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use replay::handle_replay;
use state::handle_state;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Feed a recorded bus trace through an emulated controller
    Replay {
        /// Path to a YAML trace of bus exchanges
        trace: PathBuf,
        /// Path to a YAML controller configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the controller state to this file after the replay
        #[arg(long)]
        save_state: Option<PathBuf>,
    },
    /// Display a saved controller state
    State {
        /// Path to a file written with --save-state
        path: PathBuf,
    },
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    let Some(cmd) = args.cmd else {
        return Ok(());
    };

    match cmd {
        Commands::Replay {
            trace,
            config,
            save_state,
        } => handle_replay(trace, config, save_state).await?,
        Commands::State { path } => handle_state(path).await?,
    }

    Ok(())
}
