// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use datalab_launcher::types::Deployment;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datalab-launcher")]
#[command(about = "Create, run and update local DataLab containers on Docker or Podman")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: launcher.yml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log everything at debug level
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a launcher.yml template in the current directory
    Init {
        /// Root directory for container content and notebooks
        #[arg(long)]
        local_drive: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run the startup checks (runtime, drives, image, updates)
    Check,

    /// List DataLab containers
    List,

    /// Create a new container
    Create {
        /// Container name; a random one is generated when omitted
        #[arg(default_value = "")]
        name: String,

        /// Cloud project id
        #[arg(short, long)]
        project: String,

        /// Local or Cloud
        #[arg(long, default_value_t = Deployment::Local)]
        deployment: Deployment,

        /// Gateway VM (required for Cloud)
        #[arg(short, long)]
        gateway: Option<String>,
    },

    /// Start a stopped container
    Start { name: String },

    /// Stop a running container
    Stop { name: String },

    /// Remove a stopped container and its metadata
    Remove { name: String },

    /// Print the address of a running container
    Open { name: String },

    /// Rebuild the image from the shared recipe
    Update,

    /// Show which actions are available for the given form input
    Controls {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        project: String,

        #[arg(long, default_value_t = Deployment::Local)]
        deployment: Deployment,

        #[arg(long, default_value = "")]
        gateway: String,
    },
}
