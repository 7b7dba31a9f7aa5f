use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parcoll")]
#[command(author, version, about = "Compare host and device parallel collections")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Time generate, zip-multiply and sum for each size and write a CSV report
    Perf {
        /// CSV file to write results to
        output: PathBuf,

        /// Collection sizes to measure
        #[arg(required = true)]
        sizes: Vec<usize>,

        /// Which backend(s) to run
        #[arg(long, value_enum, default_value_t = BackendChoice::Both)]
        backend: BackendChoice,

        /// Seed for the random inputs (random when omitted)
        #[arg(long, env = "PARCOLL_PERF_SEED")]
        seed: Option<u64>,
    },

    /// Render the Mandelbrot set on the device to a PNG image
    #[command(allow_negative_numbers = true)]
    Mandelbrot {
        /// PNG file to write
        output: PathBuf,

        /// Image width in pixels
        width: u32,

        /// Image height in pixels
        height: u32,

        /// Iteration cap per pixel
        max_iters: u32,

        /// Leftmost real coordinate of the view
        view_left: f64,

        /// Lowest imaginary coordinate of the view
        view_bottom: f64,

        /// Height of the view in the complex plane
        view_height: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    Host,
    Device,
    Both,
}

impl BackendChoice {
    pub fn host(self) -> bool {
        matches!(self, BackendChoice::Host | BackendChoice::Both)
    }

    pub fn device(self) -> bool {
        matches!(self, BackendChoice::Device | BackendChoice::Both)
    }
}
