//! Shared fixtures for integration tests.
//!
//! Provides tiny but well-formed H.264 Annex-B streams: a 64x64 baseline
//! SPS, a PPS, and hand-made IDR and P slices.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const SPS: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x10, 0x99];
pub const PPS: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80];
pub const AUD: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x09, 0xF0];
pub const IDR: &[u8] = &[0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21, 0xA0];
pub const P_SLICE: &[u8] = &[0x00, 0x00, 0x01, 0x41, 0x9A, 0x02, 0x33, 0x40];

/// SPS, PPS, one IDR picture and `p_frames` P pictures.
pub fn stream(p_frames: usize) -> Vec<u8> {
    let mut out = [SPS, PPS, IDR].concat();
    for _ in 0..p_frames {
        out.extend_from_slice(P_SLICE);
    }
    out
}

/// Write `data` to `dir/name` and return the path.
pub fn write_input(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}
