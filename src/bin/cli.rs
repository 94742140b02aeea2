//! Binary entry point for the quiver graph-store CLI.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quiver::{save_flags, Graph, Orientation, RmatConfig};

#[derive(Parser, Debug)]
#[command(
    name = "quiver",
    version,
    about = "CSR graph store: generate, convert, and inspect graph files",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, help = "Report progress for long operations")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic RMAT graph and save every orientation.
    Generate {
        #[arg(value_name = "BASE")]
        base: PathBuf,

        #[arg(long, default_value_t = 10, help = "log2 of the vertex count")]
        scale: u32,

        #[arg(
            long,
            default_value_t = 0.9,
            help = "Requested edges as a fraction of n*(n-1)"
        )]
        edge_factor: f64,

        #[arg(long, default_value_t = 0.60, help = "Top-left quadrant probability")]
        a: f64,

        #[arg(long, default_value_t = 0.20, help = "Top-right quadrant probability")]
        b: f64,

        #[arg(long, default_value_t = 0.15, help = "Bottom-left quadrant probability")]
        c: f64,

        #[arg(long, help = "RNG seed for reproducible graphs")]
        seed: Option<u64>,

        #[arg(long, help = "Write companion files in the binary layout")]
        binary: bool,
    },
    /// Load a graph from one base path and save it under another.
    Convert {
        #[arg(value_name = "INPUT_BASE")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT_BASE")]
        output: PathBuf,

        #[arg(long, help = "Write companion files in the binary layout")]
        binary: bool,
    },
    /// Print counts and a bounded adjacency listing.
    Info {
        #[arg(value_name = "BASE")]
        base: PathBuf,

        #[arg(long, value_enum, default_value_t = OrientationArg::Out)]
        orientation: OrientationArg,

        #[arg(
            long,
            default_value_t = 10,
            help = "Vertices and neighbors shown; 0 for all"
        )]
        range: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrientationArg {
    Out,
    In,
    Inter,
    Union,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Out => Orientation::Forward,
            OrientationArg::In => Orientation::Reverse,
            OrientationArg::Inter => Orientation::Intersection,
            OrientationArg::Union => Orientation::Union,
        }
    }
}

fn edge_mask(binary: bool) -> u32 {
    let mut mask = save_flags::ALL & !save_flags::MAPPING;
    if !binary {
        mask &= !save_flags::BINARY;
    }
    mask
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            base,
            scale,
            edge_factor,
            a,
            b,
            c,
            seed,
            binary,
        } => {
            let mut graph = Graph::new(cli.verbose);
            graph.generate_rmat(&RmatConfig {
                scale,
                edge_factor,
                a,
                b,
                c,
                seed,
            })?;
            graph.save(&base, edge_mask(binary))?;
            println!(
                "generated {} vertices, {} forward edges at {}",
                graph.vertex_count(),
                graph.edge_count(Orientation::Forward),
                base.display()
            );
        }
        Command::Convert {
            input,
            output,
            binary,
        } => {
            let graph = Graph::open(&input, cli.verbose)?;
            let mut mask = edge_mask(binary);
            if graph.has_mapping() {
                mask |= save_flags::MAPPING;
            }
            graph.save(&output, mask)?;
            println!("converted {} -> {}", input.display(), output.display());
        }
        Command::Info {
            base,
            orientation,
            range,
        } => {
            let graph = Graph::open(&base, cli.verbose)?;
            let mut stdout = std::io::stdout().lock();
            graph.write_dump(&mut stdout, orientation.into(), range)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
