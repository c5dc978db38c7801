//! Drive a container muxer from an Annex-B stream.

use nalmux_annexb::{segment, FrameRate};
use nalmux_mp4::{ContainerMuxer, MuxError};
use thiserror::Error;

/// Ingestion failure. Either kind aborts the whole pass.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Rejected before any scanning began.
    #[error(transparent)]
    InvalidArgument(#[from] nalmux_annexb::Error),

    /// The muxer refused a unit. Units after it were not offered.
    #[error("Muxer write failed for unit {index} at offset {offset}")]
    MuxerWriteFailed {
        index: usize,
        offset: usize,
        source: MuxError,
    },
}

/// What one ingestion pass handed to the muxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub frame_rate: FrameRate,
    /// Units written
    pub units: usize,
    /// Bytes covered by written units, start codes included
    pub bytes: usize,
    /// Bytes dropped by resynchronisation
    pub skipped_bytes: usize,
    /// Sum of unit durations in 90 kHz ticks
    pub duration_ticks: u64,
}

/// Segment `stream` at `fps` and write every unit to `muxer`, in order.
///
/// `fps` is validated before the stream is touched. The first muxer failure
/// stops the pass; whatever the muxer already wrote to its sink stays there.
pub fn ingest<M: ContainerMuxer>(
    stream: &[u8],
    fps: i64,
    muxer: &mut M,
) -> Result<IngestSummary, IngestError> {
    let mut paced = segment(stream, fps)?;

    let mut summary = IngestSummary {
        frame_rate: paced.frame_rate(),
        units: 0,
        bytes: 0,
        skipped_bytes: 0,
        duration_ticks: 0,
    };

    for (index, paced_unit) in paced.by_ref().enumerate() {
        let unit = paced_unit.unit;
        muxer
            .write_unit(unit.as_bytes(), paced_unit.duration)
            .map_err(|source| IngestError::MuxerWriteFailed {
                index,
                offset: unit.offset(),
                source,
            })?;

        summary.units += 1;
        summary.bytes += unit.len();
        summary.duration_ticks += u64::from(paced_unit.duration);
    }
    summary.skipped_bytes = paced.skipped();

    tracing::debug!(
        units = summary.units,
        skipped = summary.skipped_bytes,
        fps = %summary.frame_rate,
        "Ingested stream"
    );

    Ok(summary)
}
