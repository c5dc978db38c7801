//! Annex-B NAL unit segmentation.
//!
//! An Annex-B elementary stream is a flat sequence of NAL units, each one
//! introduced by a start code (`00 00 01` or `00 00 00 01`). Segmentation
//! walks a borrowed buffer with an explicit cursor and yields one
//! [`NalUnit`] view per unit. Units keep their own leading start code, so the
//! emitted ranges tile the input buffer minus whatever had to be skipped.

use std::iter::FusedIterator;
use std::ops::Range;

use crate::nal::{NalHeader, NalUnitType};

/// 3-byte start code prefix.
pub const START_CODE_3: [u8; 3] = [0x00, 0x00, 0x01];

/// 4-byte start code prefix.
pub const START_CODE_4: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Shortest unit the segmenter will emit. Anything shorter is treated as
/// padding or a broken boundary and skipped.
pub const MIN_UNIT_LEN: usize = 4;

/// Bytes at the head of a unit that are never searched for the next start
/// code: they belong to the unit's own prefix.
const SEARCH_OFFSET: usize = 3;

/// Length of the start code at the beginning of `buf`, if there is one.
///
/// The 4-byte form is checked first so `00 00 00 01` is never reported as a
/// 3-byte code.
#[inline]
pub fn start_code_len(buf: &[u8]) -> Option<usize> {
    if buf.starts_with(&START_CODE_4) {
        Some(4)
    } else if buf.starts_with(&START_CODE_3) {
        Some(3)
    } else {
        None
    }
}

/// Length of the unit that starts at the head of `buf`.
///
/// Searches forward from byte 3 for the next 3- or 4-byte start code and
/// returns its position. The search stops as soon as fewer than four bytes
/// remain, in which case the whole buffer is reported.
pub fn unit_length(buf: &[u8]) -> usize {
    let mut pos = SEARCH_OFFSET;
    while buf.len().saturating_sub(pos) > 3 {
        if buf[pos] == 0 && buf[pos + 1] == 0 {
            if buf[pos + 2] == 1 {
                return pos;
            }
            if buf[pos + 2] == 0 && buf[pos + 3] == 1 {
                return pos;
            }
        }
        pos += 1;
    }
    buf.len()
}

/// A NAL unit as a view into the stream it was found in.
///
/// The view includes the unit's start code. It borrows the stream and cannot
/// outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> NalUnit<'a> {
    pub(crate) fn new(offset: usize, bytes: &'a [u8]) -> Self {
        Self { offset, bytes }
    }

    /// Byte offset of the unit within the stream.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the unit in bytes, start code included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for units produced by [`NalUnits`].
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Range of the unit within the stream.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }

    /// Raw bytes of the unit, start code included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Length of the leading start code (3 or 4).
    pub fn start_code_len(&self) -> usize {
        start_code_len(self.bytes).unwrap_or(0)
    }

    /// The unit with its start code removed: NAL header byte onwards.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.start_code_len()..]
    }

    /// Parsed NAL header, if the unit carries at least one payload byte.
    pub fn header(&self) -> Option<NalHeader> {
        self.payload().first().map(|&b| NalHeader::from(b))
    }

    /// NAL unit type from the header.
    pub fn nal_type(&self) -> Option<NalUnitType> {
        self.header().map(|h| h.nal_unit_type)
    }
}

impl AsRef<[u8]> for NalUnit<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

/// Single-pass iterator over the NAL units of an Annex-B buffer.
///
/// Each step looks at the bytes under the cursor. When they start with a
/// start code and the computed unit is at least [`MIN_UNIT_LEN`] bytes long,
/// the unit is emitted and the cursor jumps past it. Otherwise the cursor
/// moves forward one byte and the scan retries, so leading garbage and short
/// trailing fragments are dropped instead of aborting the pass.
#[derive(Debug, Clone)]
pub struct NalUnits<'a> {
    stream: &'a [u8],
    cursor: usize,
    skipped: usize,
}

impl<'a> NalUnits<'a> {
    /// Start a scan at the beginning of `stream`.
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            cursor: 0,
            skipped: 0,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of bytes dropped by resynchronisation so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The stream being scanned.
    pub fn stream(&self) -> &'a [u8] {
        self.stream
    }
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.stream.len() {
            let rest = &self.stream[self.cursor..];

            let len = if start_code_len(rest).is_some() {
                unit_length(rest)
            } else {
                0
            };

            if len < MIN_UNIT_LEN {
                self.cursor += 1;
                self.skipped += 1;
                continue;
            }

            let unit = NalUnit::new(self.cursor, &rest[..len]);
            self.cursor += len;
            return Some(unit);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.stream.len() - self.cursor;
        (0, Some(remaining / MIN_UNIT_LEN))
    }
}

impl FusedIterator for NalUnits<'_> {}
