//! # nalmux-mp4
//!
//! Container side of nalmux: the muxer and sink contracts an ingestion pass
//! writes through, and an MP4 implementation of the muxer built on the
//! [`mp4`] box writer.
//!
//! ## Example
//!
//! ```
//! use nalmux_mp4::{ContainerMuxer, Dimensions, Mp4Muxer};
//!
//! let units: [&[u8]; 3] = [
//!     &[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x10, 0x99],
//!     &[0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80],
//!     &[0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21, 0xA0],
//! ];
//!
//! let mut muxer = Mp4Muxer::open(Dimensions::new(64, 64)?, Vec::<u8>::new())?;
//! for unit in units {
//!     muxer.write_unit(unit, 3000)?;
//! }
//! let file: Vec<u8> = muxer.close()?;
//! assert_eq!(&file[4..8], b"ftyp");
//! # Ok::<(), nalmux_mp4::MuxError>(())
//! ```

pub mod error;
pub mod muxer;
pub mod sink;

pub use error::{MuxError, Result};
pub use muxer::{ContainerMuxer, Dimensions, Mp4MuxConfig, Mp4MuxStats, Mp4Muxer};
pub use sink::{FileSink, Sink, SinkWriter};
