use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dogcare", version, about = "Dog health chat and image analysis server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Inspect stored session snapshots
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List every session that has a snapshot on disk
    List,

    /// Print the chat history of a session snapshot
    Show {
        id: String,
    },

    /// Render (or re-render) the PDF report of a session snapshot
    Report {
        id: String,
    },
}
