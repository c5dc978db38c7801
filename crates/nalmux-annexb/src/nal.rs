//! H.264 NAL unit header parsing

use crate::bits::BitReader;

/// H.264 NAL unit types (ITU-T H.264 table 7-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum NalUnitType {
    /// Coded slice of a non-IDR picture
    NonIdrSlice,
    /// Coded slice data partition A
    SlicePartitionA,
    /// Coded slice data partition B
    SlicePartitionB,
    /// Coded slice data partition C
    SlicePartitionC,
    /// Coded slice of an IDR picture
    IdrSlice,
    /// Supplemental enhancement information
    Sei,
    /// Sequence parameter set
    Sps,
    /// Picture parameter set
    Pps,
    /// Access unit delimiter
    Aud,
    /// End of sequence
    EndOfSequence,
    /// End of stream
    EndOfStream,
    /// Filler data
    Filler,
    /// Sequence parameter set extension
    SpsExtension,
    /// Prefix NAL unit (SVC)
    Prefix,
    /// Subset sequence parameter set
    SubsetSps,
    /// Coded slice of an auxiliary picture without partitioning
    AuxiliarySlice,
    /// Coded slice extension (SVC/MVC)
    SliceExtension,
    /// Reserved or unspecified type
    Other(u8),
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            1 => NalUnitType::NonIdrSlice,
            2 => NalUnitType::SlicePartitionA,
            3 => NalUnitType::SlicePartitionB,
            4 => NalUnitType::SlicePartitionC,
            5 => NalUnitType::IdrSlice,
            6 => NalUnitType::Sei,
            7 => NalUnitType::Sps,
            8 => NalUnitType::Pps,
            9 => NalUnitType::Aud,
            10 => NalUnitType::EndOfSequence,
            11 => NalUnitType::EndOfStream,
            12 => NalUnitType::Filler,
            13 => NalUnitType::SpsExtension,
            14 => NalUnitType::Prefix,
            15 => NalUnitType::SubsetSps,
            19 => NalUnitType::AuxiliarySlice,
            20 => NalUnitType::SliceExtension,
            v => NalUnitType::Other(v),
        }
    }
}

impl NalUnitType {
    /// Numeric `nal_unit_type` value.
    pub fn as_u8(&self) -> u8 {
        match self {
            NalUnitType::NonIdrSlice => 1,
            NalUnitType::SlicePartitionA => 2,
            NalUnitType::SlicePartitionB => 3,
            NalUnitType::SlicePartitionC => 4,
            NalUnitType::IdrSlice => 5,
            NalUnitType::Sei => 6,
            NalUnitType::Sps => 7,
            NalUnitType::Pps => 8,
            NalUnitType::Aud => 9,
            NalUnitType::EndOfSequence => 10,
            NalUnitType::EndOfStream => 11,
            NalUnitType::Filler => 12,
            NalUnitType::SpsExtension => 13,
            NalUnitType::Prefix => 14,
            NalUnitType::SubsetSps => 15,
            NalUnitType::AuxiliarySlice => 19,
            NalUnitType::SliceExtension => 20,
            NalUnitType::Other(v) => *v,
        }
    }

    /// Video coding layer unit carrying picture data.
    pub fn is_vcl(&self) -> bool {
        (1..=5).contains(&self.as_u8())
    }

    /// Slice of an instantaneous decoder refresh picture.
    pub fn is_idr(&self) -> bool {
        matches!(self, NalUnitType::IdrSlice)
    }

    /// SPS or PPS.
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NalUnitType::Sps | NalUnitType::Pps)
    }

    /// Short name used in listings.
    pub fn name(&self) -> &'static str {
        match self {
            NalUnitType::NonIdrSlice => "SLICE",
            NalUnitType::SlicePartitionA => "DPA",
            NalUnitType::SlicePartitionB => "DPB",
            NalUnitType::SlicePartitionC => "DPC",
            NalUnitType::IdrSlice => "IDR",
            NalUnitType::Sei => "SEI",
            NalUnitType::Sps => "SPS",
            NalUnitType::Pps => "PPS",
            NalUnitType::Aud => "AUD",
            NalUnitType::EndOfSequence => "EOSEQ",
            NalUnitType::EndOfStream => "EOSTREAM",
            NalUnitType::Filler => "FILLER",
            NalUnitType::SpsExtension => "SPS_EXT",
            NalUnitType::Prefix => "PREFIX",
            NalUnitType::SubsetSps => "SUBSET_SPS",
            NalUnitType::AuxiliarySlice => "AUX_SLICE",
            NalUnitType::SliceExtension => "SLICE_EXT",
            NalUnitType::Other(_) => "OTHER",
        }
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NalUnitType::Other(v) => write!(f, "OTHER({})", v),
            t => f.write_str(t.name()),
        }
    }
}

/// One-byte H.264 NAL unit header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalHeader {
    /// Must be zero in a conforming stream
    pub forbidden_zero_bit: bool,
    /// Reference importance (0 = disposable)
    pub nal_ref_idc: u8,
    /// Unit type
    pub nal_unit_type: NalUnitType,
}

impl From<u8> for NalHeader {
    fn from(byte: u8) -> Self {
        Self {
            forbidden_zero_bit: byte & 0x80 != 0,
            nal_ref_idc: (byte >> 5) & 0x03,
            nal_unit_type: NalUnitType::from(byte),
        }
    }
}

/// Read `first_mb_in_slice` from a slice NAL unit.
///
/// `payload` starts at the NAL header byte. A value of 0 marks the first
/// slice of a new picture; anything else continues the current picture.
/// Only slice types 1, 2 and 5 start with this field.
pub fn first_mb_in_slice(payload: &[u8]) -> Option<u32> {
    if payload.len() < 2 {
        return None;
    }

    // ue(v) is at most 32 bits wide, so a short prefix is enough.
    let end = payload.len().min(9);
    let rbsp = remove_emulation_prevention(&payload[1..end]);
    BitReader::new(&rbsp).read_ue()
}

/// Remove emulation prevention bytes (0x03) from NAL unit payload
///
/// Inside a NAL unit the sequence 0x00 0x00 0x03 protects the payload from
/// looking like a start code. The 0x03 is dropped to recover the RBSP.
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zeros = 0usize;

    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        if byte == 0 {
            zeros += 1;
        } else {
            zeros = 0;
        }
        result.push(byte);
    }

    result
}
