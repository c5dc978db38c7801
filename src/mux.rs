//! File-to-file muxing.

use anyhow::{Context, Result};
use nalmux_annexb::{probe_dimensions, FrameRate};
use nalmux_mp4::{Dimensions, FileSink, Mp4MuxConfig, Mp4MuxStats, Mp4Muxer};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::ingest::{ingest, IngestSummary};

/// One input/output pair plus overrides for the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct MuxRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fps: Option<i64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Replace the output if it exists
    pub force: bool,
}

/// Outcome of a successful [`mux_file`].
#[derive(Debug, Clone)]
pub struct MuxReport {
    pub output: PathBuf,
    pub dimensions: Dimensions,
    pub ingest: IngestSummary,
    pub stats: Mp4MuxStats,
}

/// Default output path: the input with an `.mp4` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("mp4")
}

/// Mux an Annex-B file into an MP4 file.
///
/// Dimensions come from the request, then the config, then the stream's
/// first SPS. A failed pass may leave a partial output file behind.
pub fn mux_file(request: &MuxRequest, config: &Config) -> Result<MuxReport> {
    if request.input == request.output {
        anyhow::bail!("Input and output are the same file: {:?}", request.input);
    }

    let stream = std::fs::read(&request.input)
        .with_context(|| format!("Failed to read input file: {:?}", request.input))?;

    let fps = request.fps.unwrap_or(config.mux.fps);
    let frame_rate = FrameRate::try_from(fps)?;
    if frame_rate.frame_duration() == 0 {
        tracing::warn!(
            "{} is faster than the 90 kHz clock; samples will last 0 ticks",
            frame_rate
        );
    }
    let dimensions = resolve_dimensions(request, config, &stream)?;

    let is_mp4 = request
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
    if !is_mp4 {
        tracing::warn!("Output {:?} does not have an .mp4 extension", request.output);
    }

    let overwrite = request.force || config.mux.overwrite;
    let sink = FileSink::create(&request.output, overwrite)
        .with_context(|| format!("Failed to create output file: {:?}", request.output))?;

    tracing::info!(
        "Muxing {:?} -> {:?} ({}, {} fps)",
        request.input,
        request.output,
        dimensions,
        fps
    );

    let mut muxer = Mp4Muxer::with_config(dimensions, sink, Mp4MuxConfig::from(&config.mp4))?;
    let summary = ingest(&stream, fps, &mut muxer)
        .with_context(|| format!("Failed to mux {:?}", request.input))?;
    if summary.skipped_bytes > 0 {
        tracing::warn!(
            "Skipped {} bytes outside NAL units while resynchronising",
            summary.skipped_bytes
        );
    }

    let (sink, stats) = muxer
        .finish()
        .with_context(|| format!("Failed to finalize {:?}", request.output))?;

    Ok(MuxReport {
        output: sink.path().to_path_buf(),
        dimensions,
        ingest: summary,
        stats,
    })
}

fn resolve_dimensions(request: &MuxRequest, config: &Config, stream: &[u8]) -> Result<Dimensions> {
    let mut width = request.width.or(config.mux.width);
    let mut height = request.height.or(config.mux.height);

    if width.is_none() || height.is_none() {
        let (probed_w, probed_h) = probe_dimensions(stream).context(
            "Could not determine picture size from the stream; pass --width and --height",
        )?;
        tracing::debug!("Probed dimensions {}x{}", probed_w, probed_h);
        width = width.or(Some(probed_w));
        height = height.or(Some(probed_h));
    }

    let (width, height) = (width.unwrap_or(0), height.unwrap_or(0));
    Ok(Dimensions::new(width, height)?)
}
