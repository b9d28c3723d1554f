//! CLI module for Griot.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Griot - Oral History Archive Companion
///
/// Browse the video catalog and talk with The Griot, a storytelling assistant
/// backed by a local or hosted language model.
#[derive(Parser, Debug)]
#[command(name = "griot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GRIOT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the video catalog
    Search {
        /// Text matched against titles, descriptions, interviewees, tags and people
        #[arg(default_value = "")]
        query: String,

        /// Tag or person to filter by (repeatable, any match passes)
        #[arg(short, long = "facet")]
        facets: Vec<String>,

        /// Exact location name
        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of results to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the most popular tags and people, and every location
    Facets {
        /// Number of tags and people to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Ask The Griot a single question
    Ask {
        /// The question to ask
        question: String,

        /// Print the answer as it is generated
        #[arg(short, long)]
        stream: bool,
    },

    /// Start an interactive conversation with The Griot
    Chat,

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
