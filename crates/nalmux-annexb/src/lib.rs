//! # nalmux-annexb
//!
//! Annex-B NAL unit segmentation and constant frame-rate pacing for
//! container ingestion.
//!
//! An H.264 elementary stream in Annex-B form is a run of NAL units, each
//! introduced by a `00 00 01` or `00 00 00 01` start code. This crate walks
//! such a buffer without copying it and yields every unit as a borrowed
//! `(offset, length)` view, stamped with a duration on the 90 kHz MPEG clock.
//!
//! ## Features
//!
//! - Zero-copy, single-pass segmentation over a caller-owned buffer
//! - Byte-by-byte resynchronisation over padding and broken boundaries
//! - Constant frame-rate pacing (`90000 / fps` ticks per unit)
//! - H.264 NAL header, slice header and SPS inspection helpers
//!
//! ## Example
//!
//! ```
//! let stream = [
//!     0x00, 0x00, 0x00, 0x01, 0xAA, 0xBB, // unit 1, 4-byte start code
//!     0x00, 0x00, 0x01, 0xCC, 0xDD,       // unit 2, 3-byte start code
//! ];
//!
//! let units: Vec<_> = nalmux_annexb::segment(&stream, 30)
//!     .unwrap()
//!     .map(|u| u.as_tuple())
//!     .collect();
//!
//! assert_eq!(units, vec![(0, 6, 3000), (6, 5, 3000)]);
//! ```

mod bits;
pub mod error;
pub mod nal;
pub mod pace;
pub mod segment;
pub mod sps;

pub use error::{Error, Result};
pub use nal::{first_mb_in_slice, NalHeader, NalUnitType};
pub use pace::{FrameRate, Paced, PacedUnit, TICKS_PER_SECOND};
pub use segment::{start_code_len, unit_length, NalUnit, NalUnits, MIN_UNIT_LEN};
pub use sps::{parse_sps, probe_dimensions, Sps};

/// Segment an Annex-B stream and pace it at a constant frame rate.
///
/// The frame rate is checked before any scanning happens; a non-positive
/// value fails with [`Error::InvalidArgument`]. The returned iterator is lazy
/// and single-pass. Calling `segment` again on the same buffer scans it from
/// the start and yields the same sequence.
///
/// # Arguments
///
/// * `stream` - Annex-B byte stream, borrowed for the whole pass
/// * `fps` - Frames per second
pub fn segment(stream: &[u8], fps: i64) -> Result<Paced<'_>> {
    let fps = FrameRate::try_from(fps)?;
    tracing::trace!(len = stream.len(), %fps, "Segmenting Annex-B stream");
    Ok(Paced::new(stream, fps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_rejects_non_positive_fps() {
        let stream = [0x00, 0x00, 0x01, 0x65, 0x88];
        assert!(matches!(segment(&stream, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(segment(&stream, -30), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_segment_empty_stream() {
        assert_eq!(segment(&[], 30).unwrap().count(), 0);
    }
}
