//! CLI Module
//!
//! Command-line shell over a `.biquadr` workspace file.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::model::{DataType, FilterType};

/// Biquadr - Butterworth biquad design and coefficient export
#[derive(Parser, Debug)]
#[command(name = "biquadr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty workspace file
    #[command(name = "init")]
    Init {
        /// Path for the new workspace
        workspace: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Register a deployment target
    #[command(name = "add-target")]
    AddTarget {
        workspace: PathBuf,

        #[arg(short, long)]
        name: String,

        /// float32, float64, int16 or int32
        #[arg(short, long, default_value = "float32")]
        data_type: DataType,

        /// Largest even filter order the target runs
        #[arg(short, long, default_value_t = 8)]
        max_order: usize,
    },

    /// Remove a target no project uses
    #[command(name = "remove-target")]
    RemoveTarget {
        workspace: PathBuf,

        /// Target name
        name: String,
    },

    /// List targets
    #[command(name = "targets")]
    Targets { workspace: PathBuf },

    /// Create a project on a target
    #[command(name = "add-project")]
    AddProject {
        workspace: PathBuf,

        #[arg(short, long)]
        name: String,

        /// Target name
        #[arg(short, long)]
        target: String,

        /// Sample rate in Hz (settings default when omitted)
        #[arg(short, long)]
        sample_rate: Option<f64>,
    },

    /// Add a channel to a project
    #[command(name = "add-channel")]
    AddChannel {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        name: String,
    },

    /// Add a Butterworth filter to a channel
    #[command(name = "add-filter")]
    AddFilter {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        channel: String,

        #[arg(short, long)]
        name: String,

        /// highpass or lowpass
        #[arg(short = 't', long = "type")]
        filter_type: FilterType,

        /// Even order, 2-32
        #[arg(short, long)]
        order: usize,

        /// Cutoff frequency in Hz
        #[arg(short = 'f', long)]
        cutoff: f64,

        /// Add the filter disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Remove a filter from a channel
    #[command(name = "remove-filter")]
    RemoveFilter {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        channel: String,

        #[arg(short, long)]
        name: String,
    },

    /// Enable or disable a filter
    #[command(name = "enable-filter")]
    EnableFilter {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        channel: String,

        #[arg(short, long)]
        name: String,

        /// Disable instead of enable
        #[arg(long)]
        off: bool,
    },

    /// Print projects, channels and filters
    #[command(name = "show")]
    Show {
        workspace: PathBuf,

        /// Only this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Print the designed biquad sections of a project
    #[command(name = "design")]
    Design {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,
    },

    /// Print the combined frequency response as CSV
    #[command(name = "response")]
    Response {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(long)]
        f_min: Option<f64>,

        #[arg(long)]
        f_max: Option<f64>,

        #[arg(long)]
        points: Option<usize>,

        /// Unwrap phase along the grid
        #[arg(long)]
        unwrap: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export quantized coefficients
    #[command(name = "export")]
    Export {
        workspace: PathBuf,

        #[arg(short, long)]
        project: String,

        /// header, json, csv or source
        #[arg(short, long, default_value = "header")]
        format: ExportFormat,

        /// Override the target data type
        #[arg(short, long)]
        data_type: Option<DataType>,

        /// Significant digits for floating values
        #[arg(long)]
        precision: Option<usize>,

        /// Include disabled channels and filters
        #[arg(long)]
        include_disabled: bool,

        /// Pad with identity sections up to this many sections
        #[arg(long)]
        pad: Option<usize>,

        /// One file per channel, written into this directory
        #[arg(long)]
        per_channel: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the SHA-256 of each exported document
        #[arg(long)]
        checksum: bool,
    },

    /// Import a project file from the earlier desktop tool
    #[command(name = "import-legacy")]
    ImportLegacy {
        workspace: PathBuf,

        /// Legacy project file
        file: PathBuf,

        /// Target name to bind the project to
        #[arg(short, long)]
        target: String,
    },

    /// Write a project in the desktop tool's project file layout
    #[command(name = "export-legacy")]
    ExportLegacy {
        workspace: PathBuf,

        project: String,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Find workspace files below a directory
    #[command(name = "list")]
    List {
        /// Directory to search
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}
