mod cli;

use nalmux::{config, inspect, mux};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "nalmux=trace,nalmux_annexb=trace,nalmux_mp4=trace".to_string()
        } else {
            "nalmux=info,nalmux_annexb=warn,nalmux_mp4=warn".to_string()
        }
    });

    // Logs go to stderr so `inspect --json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mux {
            input,
            output,
            fps,
            width,
            height,
            force,
        } => mux_file(
            input,
            output,
            fps,
            width,
            height,
            force,
            cli.config.as_deref(),
        ),
        Commands::Inspect { file, fps, json } => {
            inspect_file(&file, fps, json, cli.config.as_deref())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("nalmux {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn mux_file(
    input: PathBuf,
    output: Option<PathBuf>,
    fps: Option<i64>,
    width: Option<u32>,
    height: Option<u32>,
    force: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let output = output.unwrap_or_else(|| mux::default_output_path(&input));
    let request = mux::MuxRequest {
        input,
        output,
        fps,
        width,
        height,
        force,
    };

    let report = mux::mux_file(&request, &config)?;

    println!("Output: {}", report.output.display());
    println!("Dimensions: {}", report.dimensions);
    println!("Frame rate: {}", report.ingest.frame_rate);
    println!(
        "Units: {} ({} bytes, {} skipped)",
        report.ingest.units, report.ingest.bytes, report.ingest.skipped_bytes
    );
    println!(
        "Samples: {} ({} keyframes)",
        report.stats.samples, report.stats.keyframes
    );
    let secs = report.stats.duration_ticks as f64 / 90_000.0;
    println!("Duration: {:.3}s", secs);

    Ok(())
}

fn inspect_file(file: &Path, fps: Option<i64>, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let stream = std::fs::read(file)?;
    let report = inspect::inspect(&stream, fps.unwrap_or(config.mux.fps))?;

    if json {
        let json_str = serde_json::to_string_pretty(&report)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Size: {} bytes", stream.len());
    println!(
        "Frame rate: {} fps ({} ticks/unit)",
        report.fps, report.frame_duration
    );
    if let Some(ref sps) = report.sps {
        println!(
            "SPS: profile {} level {} {}x{}",
            sps.profile_idc, sps.level_idc, sps.width, sps.height
        );
    }

    println!("\nUnits: {}", report.units.len());
    for unit in &report.units {
        println!(
            "  [{}] offset {} len {} type {} ({}) duration {}",
            unit.index, unit.offset, unit.length, unit.nal_type, unit.name, unit.duration
        );
    }

    println!(
        "\nSlices: {} ({} IDR)",
        report.slices, report.idr_slices
    );
    if report.skipped_bytes > 0 {
        println!("Skipped bytes: {}", report.skipped_bytes);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_config(&config);
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("  FPS: {}", config.mux.fps);
    match (config.mux.width, config.mux.height) {
        (Some(w), Some(h)) => println!("  Dimensions: {}x{}", w, h),
        _ => println!("  Dimensions: probed from SPS"),
    }
    println!("  Overwrite: {}", config.mux.overwrite);
    println!(
        "  Brands: {} [{}]",
        config.mp4.major_brand,
        config.mp4.compatible_brands.join(", ")
    );
}
