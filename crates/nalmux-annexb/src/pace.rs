//! Constant frame-rate pacing on the 90 kHz MPEG clock.

use std::fmt;
use std::iter::FusedIterator;
use std::num::NonZeroU32;

use crate::error::{Error, Result};
use crate::segment::{NalUnit, NalUnits};

/// Ticks per second of the MPEG timestamp clock.
pub const TICKS_PER_SECOND: u32 = 90_000;

/// Frames per second. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRate(NonZeroU32);

impl FrameRate {
    /// Create a frame rate, rejecting zero.
    pub fn new(fps: u32) -> Result<Self> {
        NonZeroU32::new(fps)
            .map(Self)
            .ok_or_else(|| Error::invalid_argument("fps must be positive, got 0"))
    }

    /// Frames per second.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Duration of one frame in 90 kHz ticks.
    ///
    /// Integer division: the remainder is dropped, so rates that do not
    /// divide 90000 evenly drift slightly over long streams.
    pub fn frame_duration(self) -> u32 {
        TICKS_PER_SECOND / self.0.get()
    }
}

impl TryFrom<i64> for FrameRate {
    type Error = Error;

    fn try_from(fps: i64) -> Result<Self> {
        if fps <= 0 {
            return Err(Error::invalid_argument(format!(
                "fps must be positive, got {}",
                fps
            )));
        }
        let fps = u32::try_from(fps)
            .map_err(|_| Error::invalid_argument(format!("fps out of range: {}", fps)))?;
        Self::new(fps)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// A NAL unit together with its presentation duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacedUnit<'a> {
    /// The unit, as a view into the stream
    pub unit: NalUnit<'a>,
    /// Duration in 90 kHz ticks
    pub duration: u32,
}

impl<'a> PacedUnit<'a> {
    /// `(offset, length, duration)` triple.
    pub fn as_tuple(&self) -> (usize, usize, u32) {
        (self.unit.offset(), self.unit.len(), self.duration)
    }
}

/// Segmentation with every unit stamped with the same frame duration.
#[derive(Debug, Clone)]
pub struct Paced<'a> {
    units: NalUnits<'a>,
    fps: FrameRate,
    duration: u32,
}

impl<'a> Paced<'a> {
    /// Pace the units of `stream` at `fps`.
    pub fn new(stream: &'a [u8], fps: FrameRate) -> Self {
        Self {
            units: NalUnits::new(stream),
            fps,
            duration: fps.frame_duration(),
        }
    }

    /// Frame rate in use.
    pub fn frame_rate(&self) -> FrameRate {
        self.fps
    }

    /// Duration stamped on every unit.
    pub fn frame_duration(&self) -> u32 {
        self.duration
    }

    /// Bytes dropped by resynchronisation so far.
    pub fn skipped(&self) -> usize {
        self.units.skipped()
    }
}

impl<'a> Iterator for Paced<'a> {
    type Item = PacedUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let unit = self.units.next()?;
        Some(PacedUnit {
            unit,
            duration: self.duration,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.units.size_hint()
    }
}

impl FusedIterator for Paced<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(FrameRate::new(30).unwrap().frame_duration(), 3000);
        assert_eq!(FrameRate::new(25).unwrap().frame_duration(), 3600);
        assert_eq!(FrameRate::new(4).unwrap().frame_duration(), 22500);
        // 90000 / 7 = 12857.14..., remainder dropped
        assert_eq!(FrameRate::new(7).unwrap().frame_duration(), 12857);
    }

    #[test]
    fn test_zero_rejected() {
        assert!(matches!(FrameRate::new(0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_try_from_i64() {
        assert_eq!(FrameRate::try_from(60i64).unwrap().get(), 60);
        assert!(matches!(
            FrameRate::try_from(0i64),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            FrameRate::try_from(-24i64),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            FrameRate::try_from(i64::MAX),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameRate::new(24).unwrap().to_string(), "24 fps");
    }

    #[test]
    fn test_paced_units_share_duration() {
        let data = [
            0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E, //
            0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80, //
            0x00, 0x00, 0x01, 0x65, 0x88, 0x84,
        ];
        let paced = Paced::new(&data, FrameRate::new(30).unwrap());
        assert_eq!(paced.frame_duration(), 3000);
        let units: Vec<_> = paced.map(|u| u.as_tuple()).collect();
        assert_eq!(units, vec![(0, 8, 3000), (8, 8, 3000), (16, 6, 3000)]);
    }
}
