//! Container muxer contract and the MP4 adapter.

use std::io::Write;

use bytes::Bytes;
use mp4::{AvcConfig, FourCC, MediaConfig, Mp4Config, Mp4Sample, Mp4Writer, TrackConfig, TrackType};
use nalmux_annexb::{first_mb_in_slice, start_code_len, NalUnitType, TICKS_PER_SECOND};

use crate::error::{MuxError, Result};
use crate::sink::{Sink, SinkWriter};

/// Video track id assigned by the box writer to the first track.
const VIDEO_TRACK_ID: u32 = 1;

/// Picture dimensions in luma samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    /// Validate and narrow dimensions. Both sides must be in `1..=65535`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Self {
                width: w,
                height: h,
            }),
            _ => Err(MuxError::InvalidDimensions { width, height }),
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A container writer fed one Annex-B NAL unit at a time.
///
/// The writer owns its sink between `open` and `close`; `close` hands the
/// sink back once the container is finalized.
pub trait ContainerMuxer: Sized {
    /// Byte sink the container is written to.
    type Sink;

    /// Start a container for a stream of the given dimensions.
    fn open(dimensions: Dimensions, sink: Self::Sink) -> Result<Self>;

    /// Accept one NAL unit (start code included) lasting `duration` ticks
    /// of the 90 kHz clock.
    ///
    /// Implementations may buffer sample data, so a failing sink can first
    /// surface from `close`.
    fn write_unit(&mut self, unit: &[u8], duration: u32) -> Result<()>;

    /// Finalize the container and return the sink.
    fn close(self) -> Result<Self::Sink>;
}

/// MP4 file-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp4MuxConfig {
    /// `ftyp` major brand (four characters)
    pub major_brand: String,
    /// `ftyp` minor version
    pub minor_version: u32,
    /// `ftyp` compatible brands (four characters each)
    pub compatible_brands: Vec<String>,
    /// Movie header timescale
    pub movie_timescale: u32,
    /// ISO 639-2 language code of the video track
    pub language: String,
}

impl Default for Mp4MuxConfig {
    fn default() -> Self {
        Self {
            major_brand: "isom".to_string(),
            minor_version: 512,
            compatible_brands: ["isom", "iso2", "avc1", "mp41"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
            movie_timescale: 1000,
            language: "und".to_string(),
        }
    }
}

impl Mp4MuxConfig {
    fn to_mp4_config(&self) -> Result<Mp4Config> {
        Ok(Mp4Config {
            major_brand: parse_brand(&self.major_brand)?,
            minor_version: self.minor_version,
            compatible_brands: self
                .compatible_brands
                .iter()
                .map(|b| parse_brand(b))
                .collect::<Result<Vec<_>>>()?,
            timescale: self.movie_timescale,
        })
    }
}

fn parse_brand(brand: &str) -> Result<FourCC> {
    brand
        .parse()
        .map_err(|_| MuxError::config(format!("brand must be four bytes: {:?}", brand)))
}

/// Muxer statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mp4MuxStats {
    /// Samples (pictures) written
    pub samples: u64,
    /// Samples flagged as sync (IDR)
    pub keyframes: u64,
    /// Sample payload bytes written, length prefixes included
    pub bytes: u64,
    /// SPS/PPS units seen
    pub parameter_sets: u64,
    /// Units dropped (non-VCL, empty)
    pub skipped_units: u64,
    /// Decode time of the next sample, in ticks
    pub duration_ticks: u64,
}

/// A picture being assembled from its slices.
#[derive(Debug)]
struct PendingSample {
    data: Vec<u8>,
    duration: u32,
    is_sync: bool,
}

/// H.264 Annex-B to MP4 (`avc1`) muxer.
///
/// Parameter sets go into the track's `avcC` box; each picture becomes one
/// length-prefixed sample.
pub struct Mp4Muxer<S: Sink> {
    writer: Mp4Writer<SinkWriter<S>>,
    config: Mp4MuxConfig,
    dimensions: Dimensions,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    track_added: bool,
    pending: Option<PendingSample>,
    stats: Mp4MuxStats,
}

impl<S: Sink> Mp4Muxer<S> {
    /// Open a muxer with explicit file-level settings.
    pub fn with_config(dimensions: Dimensions, sink: S, config: Mp4MuxConfig) -> Result<Self> {
        let mp4_config = config.to_mp4_config()?;
        let writer = Mp4Writer::write_start(SinkWriter::new(sink), &mp4_config)?;

        tracing::debug!(%dimensions, brand = %config.major_brand, "Opened MP4 muxer");

        Ok(Self {
            writer,
            config,
            dimensions,
            sps: None,
            pps: None,
            track_added: false,
            pending: None,
            stats: Mp4MuxStats::default(),
        })
    }

    /// Track dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Statistics so far. A picture still being assembled is not counted.
    pub fn stats(&self) -> &Mp4MuxStats {
        &self.stats
    }

    /// Finalize the file, returning the sink and the final statistics.
    pub fn finish(mut self) -> Result<(S, Mp4MuxStats)> {
        self.flush_pending()?;
        if self.stats.samples == 0 {
            return Err(MuxError::NoSamples);
        }

        self.writer.write_end()?;

        tracing::debug!(
            samples = self.stats.samples,
            keyframes = self.stats.keyframes,
            bytes = self.stats.bytes,
            "Finalized MP4"
        );

        let mut writer = self.writer.into_writer();
        writer.flush()?;
        Ok((writer.into_inner(), self.stats))
    }

    fn on_parameter_set(&mut self, kind: NalUnitType, payload: &[u8]) -> Result<()> {
        self.stats.parameter_sets += 1;

        let slot = match kind {
            NalUnitType::Sps => &mut self.sps,
            _ => &mut self.pps,
        };

        if let Some(stored) = slot.as_deref() {
            if stored != payload {
                tracing::warn!(
                    "{} changed mid-stream; keeping the first one for the track",
                    kind
                );
            }
        } else {
            *slot = Some(payload.to_vec());
        }

        if !self.track_added {
            if let (Some(sps), Some(pps)) = (&self.sps, &self.pps) {
                let track = TrackConfig {
                    track_type: TrackType::Video,
                    timescale: TICKS_PER_SECOND,
                    language: self.config.language.clone(),
                    media_conf: MediaConfig::AvcConfig(AvcConfig {
                        width: self.dimensions.width,
                        height: self.dimensions.height,
                        seq_param_set: sps.clone(),
                        pic_param_set: pps.clone(),
                    }),
                };
                self.writer.add_track(&track)?;
                self.track_added = true;
                tracing::debug!(sps_len = sps.len(), pps_len = pps.len(), "Added video track");
            }
        }

        Ok(())
    }

    fn on_slice(&mut self, kind: NalUnitType, payload: &[u8], duration: u32) -> Result<()> {
        if !self.track_added {
            return Err(MuxError::MissingParameterSets {
                nal_type: kind.as_u8(),
            });
        }

        // Partitions B and C open with slice_id and always follow their
        // partition A.
        let continues_picture = self.pending.is_some()
            && match kind {
                NalUnitType::SlicePartitionB | NalUnitType::SlicePartitionC => true,
                _ => matches!(first_mb_in_slice(payload), Some(mb) if mb > 0),
            };

        if !continues_picture {
            self.flush_pending()?;
            self.pending = Some(PendingSample {
                data: Vec::with_capacity(payload.len() + 4),
                duration,
                is_sync: kind.is_idr(),
            });
        }

        if let Some(pending) = self.pending.as_mut() {
            let len = u32::try_from(payload.len())
                .map_err(|_| MuxError::config("NAL unit larger than 4 GiB"))?;
            pending.data.extend_from_slice(&len.to_be_bytes());
            pending.data.extend_from_slice(payload);
            pending.is_sync |= kind.is_idr();
        }

        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let size = pending.data.len() as u64;
        let sample = Mp4Sample {
            start_time: self.stats.duration_ticks,
            duration: pending.duration,
            rendering_offset: 0,
            is_sync: pending.is_sync,
            bytes: Bytes::from(pending.data),
        };
        self.writer.write_sample(VIDEO_TRACK_ID, &sample)?;

        tracing::trace!(
            start = sample.start_time,
            duration = sample.duration,
            size,
            sync = sample.is_sync,
            "Wrote sample"
        );

        self.stats.samples += 1;
        self.stats.bytes += size;
        self.stats.duration_ticks += u64::from(pending.duration);
        if pending.is_sync {
            self.stats.keyframes += 1;
        }
        Ok(())
    }
}

impl<S: Sink> ContainerMuxer for Mp4Muxer<S> {
    type Sink = S;

    fn open(dimensions: Dimensions, sink: S) -> Result<Self> {
        Self::with_config(dimensions, sink, Mp4MuxConfig::default())
    }

    fn write_unit(&mut self, unit: &[u8], duration: u32) -> Result<()> {
        let prefix = start_code_len(unit).unwrap_or(0);
        let mut payload = &unit[prefix..];
        while let [rest @ .., 0x00] = payload {
            payload = rest;
        }

        let Some(&first) = payload.first() else {
            tracing::trace!("Skipping empty NAL unit");
            self.stats.skipped_units += 1;
            return Ok(());
        };

        let kind = NalUnitType::from(first);
        match kind {
            NalUnitType::Sps | NalUnitType::Pps => self.on_parameter_set(kind, payload),
            k if k.is_vcl() => self.on_slice(k, payload, duration),
            k => {
                tracing::trace!(nal_type = %k, "Dropping non-VCL unit");
                self.stats.skipped_units += 1;
                Ok(())
            }
        }
    }

    fn close(self) -> Result<S> {
        self.finish().map(|(sink, _)| sink)
    }
}

impl<S: Sink> std::fmt::Debug for Mp4Muxer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mp4Muxer")
            .field("dimensions", &self.dimensions)
            .field("track_added", &self.track_added)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS: [u8; 11] = [0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x10, 0x99];
    const PPS: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80];
    const IDR: [u8; 8] = [0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21, 0xA0];

    fn dims() -> Dimensions {
        Dimensions::new(64, 64).unwrap()
    }

    #[test]
    fn test_dimensions_validation() {
        assert_eq!(
            Dimensions::new(1920, 1080).unwrap(),
            Dimensions {
                width: 1920,
                height: 1080
            }
        );
        assert!(matches!(
            Dimensions::new(0, 1080),
            Err(MuxError::InvalidDimensions { width: 0, .. })
        ));
        assert!(Dimensions::new(1920, 70_000).is_err());
        assert_eq!(dims().to_string(), "64x64");
    }

    #[test]
    fn test_default_config() {
        let config = Mp4MuxConfig::default();
        assert_eq!(config.major_brand, "isom");
        assert_eq!(config.minor_version, 512);
        assert_eq!(config.compatible_brands, vec!["isom", "iso2", "avc1", "mp41"]);
        assert_eq!(config.language, "und");
    }

    #[test]
    fn test_bad_brand_rejected() {
        let config = Mp4MuxConfig {
            major_brand: "mp4".to_string(),
            ..Default::default()
        };
        let err = Mp4Muxer::with_config(dims(), Vec::<u8>::new(), config).unwrap_err();
        assert!(matches!(err, MuxError::Config(_)));
    }

    #[test]
    fn test_slice_before_parameter_sets() {
        let mut muxer = Mp4Muxer::open(dims(), Vec::<u8>::new()).unwrap();
        let err = muxer.write_unit(&IDR, 3000).unwrap_err();
        assert!(matches!(err, MuxError::MissingParameterSets { nal_type: 5 }));
    }

    #[test]
    fn test_close_without_samples() {
        let mut muxer = Mp4Muxer::open(dims(), Vec::<u8>::new()).unwrap();
        muxer.write_unit(&SPS, 3000).unwrap();
        muxer.write_unit(&PPS, 3000).unwrap();
        assert!(matches!(muxer.close(), Err(MuxError::NoSamples)));
    }

    #[test]
    fn test_non_vcl_and_empty_units_skipped() {
        let mut muxer = Mp4Muxer::open(dims(), Vec::<u8>::new()).unwrap();
        muxer.write_unit(&[0x00, 0x00, 0x00, 0x01, 0x09, 0xF0], 3000).unwrap();
        muxer.write_unit(&[0x00, 0x00, 0x01, 0x00], 3000).unwrap();
        assert_eq!(muxer.stats().skipped_units, 2);
        assert_eq!(muxer.stats().samples, 0);
    }

    #[test]
    fn test_data_partitions_join_their_picture() {
        // Partition A at macroblock 0, then B and C whose slice_id would
        // otherwise read as first_mb_in_slice 0.
        let part_a = [0x00, 0x00, 0x01, 0x22, 0x88, 0x84];
        let part_b = [0x00, 0x00, 0x01, 0x23, 0x80, 0x40];
        let part_c = [0x00, 0x00, 0x01, 0x24, 0x80, 0x40];

        let mut muxer = Mp4Muxer::open(dims(), Vec::<u8>::new()).unwrap();
        for unit in [&SPS[..], &PPS[..], &IDR[..], &part_a, &part_b, &part_c] {
            muxer.write_unit(unit, 3000).unwrap();
        }

        let (_, stats) = muxer.finish().unwrap();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.keyframes, 1);
        assert_eq!(stats.bytes, (4 + 5) + 3 * (4 + 3));
    }

    #[test]
    fn test_stats_count_pictures() {
        let mut muxer = Mp4Muxer::open(dims(), Vec::<u8>::new()).unwrap();
        for unit in [&SPS[..], &PPS[..], &IDR[..], &IDR[..]] {
            muxer.write_unit(unit, 3000).unwrap();
        }
        // The second IDR closes the first picture.
        assert_eq!(muxer.stats().samples, 1);
        assert_eq!(muxer.stats().keyframes, 1);
        assert_eq!(muxer.stats().bytes, 4 + 5);
        assert_eq!(muxer.stats().parameter_sets, 2);
        assert_eq!(muxer.stats().duration_ticks, 3000);

        let out = muxer.close().unwrap();
        assert_eq!(&out[4..8], b"ftyp");
    }
}
