//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bramble blog engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file, or the directory containing bramble.toml
    #[arg(short = 'C', long, default_value = "bramble.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new blog skeleton
    Init {
        /// directory for the new blog
        name: PathBuf,
    },

    /// Serve the blog dynamically
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compile the blog to a static site
    Compile {
        /// Only recompile entries newer than their compiled output
        #[arg(long)]
        incremental: bool,
    },

    /// Render a single url to stdout
    RenderUrl {
        /// url path to render, e.g. /2021/index.html
        url: String,

        /// Print status and headers before the body
        #[arg(long)]
        headers: bool,
    },

    /// Copy static files into the compile directory
    Collectstatic,
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_compile(&self) -> bool {
        matches!(self.command, Commands::Compile { .. })
    }
}
