use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nalmux")]
#[command(author, version, about = "Mux raw H.264 Annex-B streams into MP4")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mux an Annex-B H.264 file into an MP4 file
    Mux {
        /// Input elementary stream
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (defaults to the input with an .mp4 extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames per second (overrides config)
        #[arg(long, allow_negative_numbers = true)]
        fps: Option<i64>,

        /// Picture width (probed from the SPS when omitted)
        #[arg(long)]
        width: Option<u32>,

        /// Picture height (probed from the SPS when omitted)
        #[arg(long)]
        height: Option<u32>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// List the NAL units of an Annex-B file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Frames per second used for durations (overrides config)
        #[arg(long, allow_negative_numbers = true)]
        fps: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
