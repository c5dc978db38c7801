//! Integration tests for nalmux-mp4

use std::io::{self, Cursor};

use mp4::{FourCC, Mp4Reader};
use nalmux_mp4::{ContainerMuxer, Dimensions, FileSink, Mp4MuxConfig, Mp4Muxer, MuxError, Sink};

const SPS: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x10, 0x99];
const PPS: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80];
const IDR: &[u8] = &[0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21, 0xA0];
const P_SLICE: &[u8] = &[0x00, 0x00, 0x01, 0x41, 0x9A, 0x02, 0x33, 0x40];
const P_CONT: &[u8] = &[0x00, 0x00, 0x01, 0x41, 0x4D, 0x11, 0x80];

fn stream(units: &[&[u8]]) -> Vec<u8> {
    units.concat()
}

fn mux(units: &[&[u8]], duration: u32) -> nalmux_mp4::Result<Vec<u8>> {
    let mut muxer = Mp4Muxer::open(Dimensions::new(64, 64)?, Vec::<u8>::new())?;
    for unit in units {
        muxer.write_unit(unit, duration)?;
    }
    muxer.close()
}

fn read(data: &[u8]) -> Mp4Reader<Cursor<&[u8]>> {
    Mp4Reader::read_header(Cursor::new(data), data.len() as u64).unwrap()
}

fn length_prefixed(units: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        let payload = &unit[nalmux_annexb::start_code_len(unit).unwrap()..];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }
    out
}

#[test]
fn test_three_pictures_round_trip() {
    let input = stream(&[SPS, PPS, IDR, P_SLICE, P_SLICE]);

    let mut muxer = Mp4Muxer::open(Dimensions::new(64, 64).unwrap(), Vec::<u8>::new()).unwrap();
    for paced in nalmux_annexb::segment(&input, 30).unwrap() {
        muxer.write_unit(paced.unit.as_bytes(), paced.duration).unwrap();
    }
    // The last picture is still pending until the file is finished.
    assert_eq!(muxer.stats().samples, 2);
    let (data, stats) = muxer.finish().unwrap();

    assert_eq!(stats.samples, 3);
    assert_eq!(stats.keyframes, 1);
    assert_eq!(stats.parameter_sets, 2);
    assert_eq!(stats.duration_ticks, 9000);

    let mut reader = read(&data);
    let track = reader.tracks().get(&1).expect("video track");
    assert_eq!(track.width(), 64);
    assert_eq!(track.height(), 64);
    assert_eq!(track.timescale(), 90_000);
    assert_eq!(reader.sample_count(1).unwrap(), 3);

    let first = reader.read_sample(1, 1).unwrap().unwrap();
    assert!(first.is_sync);
    assert_eq!(first.start_time, 0);
    assert_eq!(first.duration, 3000);
    assert_eq!(&first.bytes[..], length_prefixed(&[IDR]).as_slice());

    let second = reader.read_sample(1, 2).unwrap().unwrap();
    assert!(!second.is_sync);
    assert_eq!(second.start_time, 3000);
    assert_eq!(&second.bytes[..], length_prefixed(&[P_SLICE]).as_slice());
}

#[test]
fn test_slices_of_one_picture_share_a_sample() {
    let data = mux(&[SPS, PPS, IDR, P_SLICE, P_CONT, P_SLICE], 3600).unwrap();

    let mut reader = read(&data);
    assert_eq!(reader.sample_count(1).unwrap(), 3);

    let grouped = reader.read_sample(1, 2).unwrap().unwrap();
    assert_eq!(grouped.duration, 3600);
    assert_eq!(
        &grouped.bytes[..],
        length_prefixed(&[P_SLICE, P_CONT]).as_slice()
    );
}

#[test]
fn test_parameter_sets_land_in_track_config() {
    let data = mux(&[SPS, PPS, IDR], 3000).unwrap();
    let reader = read(&data);
    let track = reader.tracks().get(&1).unwrap();
    assert_eq!(track.sequence_parameter_set().unwrap(), &SPS[4..]);
    assert_eq!(track.picture_parameter_set().unwrap(), &PPS[4..]);
}

#[test]
fn test_custom_brands() {
    let config = Mp4MuxConfig {
        major_brand: "mp42".to_string(),
        compatible_brands: vec!["mp42".to_string(), "isom".to_string()],
        ..Default::default()
    };
    let mut muxer =
        Mp4Muxer::with_config(Dimensions::new(64, 64).unwrap(), Vec::<u8>::new(), config).unwrap();
    for unit in [SPS, PPS, IDR] {
        muxer.write_unit(unit, 3000).unwrap();
    }
    let data = muxer.close().unwrap();

    let reader = read(&data);
    assert_eq!(*reader.major_brand(), "mp42".parse::<FourCC>().unwrap());
}

#[test]
fn test_slice_before_parameter_sets_fails() {
    let err = mux(&[IDR, SPS, PPS], 3000).unwrap_err();
    assert!(matches!(err, MuxError::MissingParameterSets { nal_type: 5 }));
}

#[test]
fn test_parameter_sets_only_is_no_samples() {
    let err = mux(&[SPS, PPS], 3000).unwrap_err();
    assert!(matches!(err, MuxError::NoSamples));
}

/// Stops accepting bytes once `capacity` is reached.
#[derive(Debug)]
struct FullDisk {
    data: Vec<u8>,
    capacity: usize,
}

impl Sink for FullDisk {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity.saturating_sub(offset as usize);
        let n = buf.len().min(room);
        self.data.write_at(offset, &buf[..n])
    }

    fn size(&mut self) -> io::Result<u64> {
        self.data.size()
    }
}

#[test]
fn test_short_write_surfaces_as_error() {
    let sink = FullDisk {
        data: Vec::new(),
        capacity: 64,
    };
    let big_idr: Vec<u8> = [&[0x00, 0x00, 0x01, 0x65, 0x88][..], &[0x5A; 200]].concat();

    let mut muxer = Mp4Muxer::open(Dimensions::new(64, 64).unwrap(), sink).unwrap();
    muxer.write_unit(SPS, 3000).unwrap();
    muxer.write_unit(PPS, 3000).unwrap();
    muxer.write_unit(&big_idr, 3000).unwrap();
    muxer.write_unit(P_SLICE, 3000).unwrap();

    let err = muxer.close().unwrap_err();
    assert!(
        matches!(&err, MuxError::Mp4(mp4::Error::IoError(e)) if e.kind() == io::ErrorKind::WriteZero),
        "unexpected error: {:?}",
        err
    );
}

#[test]
fn test_file_sink_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mp4");

    let sink = FileSink::create(&path, false).unwrap();
    let mut muxer = Mp4Muxer::open(Dimensions::new(64, 64).unwrap(), sink).unwrap();
    for unit in [SPS, PPS, IDR, P_SLICE] {
        muxer.write_unit(unit, 3000).unwrap();
    }
    let sink = muxer.close().unwrap();
    assert_eq!(sink.path(), path.as_path());

    let data = std::fs::read(&path).unwrap();
    let mut reader = read(&data);
    assert_eq!(reader.sample_count(1).unwrap(), 2);
    assert!(reader.read_sample(1, 1).unwrap().unwrap().is_sync);
}
