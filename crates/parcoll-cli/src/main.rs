use anyhow::Result;
use clap::Parser;
use parcoll_tracing::{init_global_tracing, TracingConfig};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    init_global_tracing(&TracingConfig::from_env())?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Perf {
            output,
            sizes,
            backend,
            seed,
        } => commands::perf::run(&output, &sizes, backend, seed),
        Commands::Mandelbrot {
            output,
            width,
            height,
            max_iters,
            view_left,
            view_bottom,
            view_height,
        } => {
            let view = commands::mandelbrot::View {
                left: view_left,
                bottom: view_bottom,
                height: view_height,
            };
            commands::mandelbrot::run(&output, width, height, max_iters, view)
        }
    }
}
