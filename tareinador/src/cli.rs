//! Command-line interface definitions for tareinador

use crate::config::{ENV_API_BASE, ENV_TIMEOUT_SECS};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the tareinador application
#[derive(Parser)]
#[command(name = "tareinador")]
#[command(version)]
#[command(about = "Generate, edit and export AI-written academic documents", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./tareinador.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration file
    #[arg(long, global = true, value_name = "URL", env = ENV_API_BASE)]
    pub api_base: Option<String>,

    /// Request timeout in seconds, overrides the configuration file
    #[arg(long, global = true, value_name = "SECS", env = ENV_TIMEOUT_SECS)]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for tareinador
#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter form file
    Init {
        /// Directory to write form.toml into (defaults to current directory)
        path: Option<PathBuf>,

        /// Overwrite an existing form.toml
        #[arg(short, long)]
        force: bool,

        /// Document title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Generate a document from a form file
    Generate {
        /// Form file (TOML)
        #[arg(value_name = "FORM", default_value = "form.toml")]
        form: PathBuf,

        /// Download the PDF right after generating
        #[arg(short, long)]
        download: bool,

        /// Directory for the downloaded PDF
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List the pages of a document
    Show {
        /// Document id
        doc_id: String,

        /// Print the composed markup of this page (1-based)
        #[arg(short, long)]
        page: Option<usize>,
    },

    /// Rewrite a page with the AI service
    Edit {
        /// Document id
        doc_id: String,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Instructions for the AI, e.g. "make it more formal"
        #[arg(required = true, num_args = 1..)]
        instructions: Vec<String>,
    },

    /// Save hand-edited page content
    ///
    /// The file is either edited page markup (as printed by `show --page`),
    /// whose heading and image blocks are stripped before saving, or a
    /// Markdown file (.md) that becomes the page body.
    Save {
        /// Document id
        doc_id: String,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// File with the edited markup or Markdown
        file: PathBuf,
    },

    /// Upload an image to a page
    AddImage {
        /// Document id
        doc_id: String,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Image file
        file: PathBuf,

        /// Caption shown under the image
        #[arg(long, default_value = "")]
        caption: String,
    },

    /// Remove an image from a page
    RemoveImage {
        /// Document id
        doc_id: String,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Image number on the page (1-based)
        image: usize,
    },

    /// Fetch the rendered HTML preview
    Preview {
        /// Document id
        doc_id: String,

        /// Write the HTML to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the PDF
    Download {
        /// Document id
        doc_id: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Interactive editing session
    Shell {
        /// Generate a document from this form before starting
        #[arg(value_name = "FORM", conflicts_with = "doc")]
        form: Option<PathBuf>,

        /// Open an existing document
        #[arg(short, long)]
        doc: Option<String>,
    },
}
