use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use libqct::DumpOptions;
use qctool::{qct_to_image, query_metadata};
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Decoder debug output; also writes outline.kml and boundary.kml when
    /// querying
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Query metadata only, no image decode
    #[arg(short, long)]
    query: bool,

    /// Input chart (QCT format)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image; the format is chosen from the extension (png, ppm,
    /// gif, tiff)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Down-sampling factor, must divide 64
    #[arg(short, long, default_value_t = 1)]
    scale: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match (cli.debug, cli.verbose) {
        (0, 0) => Level::WARN,
        (0, 1) => Level::INFO,
        (0, _) | (1, _) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .init();

    if !cli.query && cli.output.is_none() {
        bail!("missing -q or -o option");
    }

    if cli.query {
        let options = if cli.verbose > 0 {
            DumpOptions::builder()
                .palette(true)
                .outline(true)
                .corners(true)
                .build()
        } else {
            DumpOptions::builder().corners(true).build()
        };
        query_metadata(&cli.input, &options, cli.debug > 0)?;
    }

    if let Some(output) = cli.output {
        qct_to_image(&cli.input, &output, cli.scale)?;
    }

    Ok(())
}
