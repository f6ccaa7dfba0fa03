use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use spectrastag::config::parse_color;
use spectrastag::detect::Spectrum;
use spectrastag::{batch, BatchConfig, Mode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Highlight bright or in-spectrum pixels across a folder of images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Paint near-white pixels, writing highlighted_<name>
    Highlight(Common),
    /// Paint the first matching spectrum, writing processed_<name>
    Spectrum {
        #[command(flatten)]
        common: Common,

        /// Spectrum in priority order, e.g. r=150-255,g=200-255,b=0-80,name=strict.
        /// Repeat for fallbacks; defaults to the built-in strict/moderate/broad options.
        #[arg(short, long = "spectrum", value_name = "SPEC")]
        spectra: Vec<Spectrum>,
    },
}

#[derive(Args, Debug)]
struct Common {
    /// Folder with .png/.jpg/.jpeg images
    input: PathBuf,

    /// Output folder (created if missing)
    output: PathBuf,

    /// Highlight color as B,G,R
    #[arg(short, long, default_value = "0,0,255", value_parser = parse_color)]
    color: [u8; 3],

    /// Process images in parallel
    #[arg(short, long)]
    parallel: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config_from(Cli::parse());

    batch::run(&config).with_context(|| {
        format!(
            "Failed to process {} into {}",
            config.input_dir.display(),
            config.output_dir.display()
        )
    })?;

    Ok(())
}

fn config_from(cli: Cli) -> BatchConfig {
    match cli.command {
        Command::Highlight(common) => build_config(common, Mode::Highlight),
        Command::Spectrum { common, spectra } => {
            let config = build_config(common, Mode::Spectrum);
            if spectra.is_empty() {
                config
            } else {
                config.with_spectra(spectra)
            }
        }
    }
}

fn build_config(common: Common, mode: Mode) -> BatchConfig {
    BatchConfig::new(common.input, common.output, mode)
        .with_color(common.color)
        .with_parallel(common.parallel)
}
