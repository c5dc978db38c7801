//! Unit listing for the `inspect` command.

use nalmux_annexb::{parse_sps, segment, NalUnitType, Sps};
use serde::Serialize;

/// One segmented unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitInfo {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub nal_type: u8,
    pub name: &'static str,
    pub duration: u32,
}

/// Everything `inspect` reports about a stream.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub fps: u32,
    pub frame_duration: u32,
    pub units: Vec<UnitInfo>,
    pub skipped_bytes: usize,
    pub slices: usize,
    pub idr_slices: usize,
    /// First decodable SPS
    pub sps: Option<Sps>,
}

/// Segment `stream` and describe each unit.
pub fn inspect(stream: &[u8], fps: i64) -> nalmux_annexb::Result<InspectReport> {
    let mut paced = segment(stream, fps)?;

    let mut report = InspectReport {
        fps: paced.frame_rate().get(),
        frame_duration: paced.frame_duration(),
        units: Vec::new(),
        skipped_bytes: 0,
        slices: 0,
        idr_slices: 0,
        sps: None,
    };

    for (index, paced_unit) in paced.by_ref().enumerate() {
        let unit = paced_unit.unit;
        let kind = unit.nal_type().unwrap_or(NalUnitType::Other(0));

        if kind.is_vcl() {
            report.slices += 1;
            if kind.is_idr() {
                report.idr_slices += 1;
            }
        }
        if kind == NalUnitType::Sps && report.sps.is_none() {
            report.sps = parse_sps(unit.payload());
        }

        report.units.push(UnitInfo {
            index,
            offset: unit.offset(),
            length: unit.len(),
            nal_type: kind.as_u8(),
            name: kind.name(),
            duration: paced_unit.duration,
        });
    }
    report.skipped_bytes = paced.skipped();

    Ok(report)
}
