//! H.264 Sequence Parameter Set (SPS) parsing
//!
//! Only the fields needed to size a video track are decoded; parsing stops
//! after the frame cropping rectangle.

use crate::bits::BitReader;
use crate::nal::{remove_emulation_prevention, NalUnitType};
use crate::segment::NalUnits;

/// Sequence Parameter Set
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Sps {
    /// profile_idc (66 = Baseline, 77 = Main, 100 = High, ...)
    pub profile_idc: u8,
    /// Constraint flags byte
    pub constraint_flags: u8,
    /// level_idc (e.g. 31 for level 3.1)
    pub level_idc: u8,
    /// seq_parameter_set_id
    pub seq_parameter_set_id: u32,
    /// Chroma sampling (0 = monochrome, 1 = 4:2:0, 2 = 4:2:2, 3 = 4:4:4)
    pub chroma_format_idc: u32,
    /// Picture width in luma samples after cropping
    pub width: u32,
    /// Picture height in luma samples after cropping
    pub height: u32,
    /// Progressive-only stream
    pub frame_mbs_only: bool,
}

/// Profiles that carry chroma format and bit depth fields.
const HIGH_PROFILES: [u8; 13] = [
    100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135,
];

/// Parse an SPS NAL unit.
///
/// `data` starts at the NAL header byte (start code already removed).
pub fn parse_sps(data: &[u8]) -> Option<Sps> {
    if data.len() < 4 || NalUnitType::from(data[0]) != NalUnitType::Sps {
        return None;
    }

    let rbsp = remove_emulation_prevention(&data[1..]);
    let mut reader = BitReader::new(&rbsp);

    let profile_idc = reader.read_bits(8)? as u8;
    let constraint_flags = reader.read_bits(8)? as u8;
    let level_idc = reader.read_bits(8)? as u8;
    let seq_parameter_set_id = reader.read_ue()?;

    let mut chroma_format_idc = 1;
    let mut separate_colour_plane = false;
    if HIGH_PROFILES.contains(&profile_idc) {
        chroma_format_idc = reader.read_ue()?;
        if chroma_format_idc == 3 {
            separate_colour_plane = reader.read_flag()?;
        }
        // bit_depth_luma_minus8, bit_depth_chroma_minus8
        reader.read_ue()?;
        reader.read_ue()?;
        // qpprime_y_zero_transform_bypass_flag
        reader.skip_bits(1)?;

        let seq_scaling_matrix_present = reader.read_flag()?;
        if seq_scaling_matrix_present {
            let lists = if chroma_format_idc == 3 { 12 } else { 8 };
            for i in 0..lists {
                if reader.read_flag()? {
                    skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    // log2_max_frame_num_minus4
    reader.read_ue()?;

    let pic_order_cnt_type = reader.read_ue()?;
    match pic_order_cnt_type {
        0 => {
            // log2_max_pic_order_cnt_lsb_minus4
            reader.read_ue()?;
        }
        1 => {
            // delta_pic_order_always_zero_flag
            reader.skip_bits(1)?;
            // offset_for_non_ref_pic, offset_for_top_to_bottom_field
            reader.read_se()?;
            reader.read_se()?;
            let cycle = reader.read_ue()?;
            for _ in 0..cycle {
                reader.read_se()?;
            }
        }
        _ => {}
    }

    // max_num_ref_frames
    reader.read_ue()?;
    // gaps_in_frame_num_value_allowed_flag
    reader.skip_bits(1)?;

    let pic_width_in_mbs_minus1 = reader.read_ue()?;
    let pic_height_in_map_units_minus1 = reader.read_ue()?;
    let frame_mbs_only = reader.read_flag()?;
    if !frame_mbs_only {
        // mb_adaptive_frame_field_flag
        reader.skip_bits(1)?;
    }
    // direct_8x8_inference_flag
    reader.skip_bits(1)?;

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if reader.read_flag()? {
        crop_left = reader.read_ue()?;
        crop_right = reader.read_ue()?;
        crop_top = reader.read_ue()?;
        crop_bottom = reader.read_ue()?;
    }

    let frame_height_factor = if frame_mbs_only { 1 } else { 2 };
    let (crop_unit_x, crop_unit_y) = if chroma_format_idc == 0 || separate_colour_plane {
        (1, frame_height_factor)
    } else {
        let sub_width_c = if chroma_format_idc == 3 { 1 } else { 2 };
        let sub_height_c = if chroma_format_idc == 1 { 2 } else { 1 };
        (sub_width_c, sub_height_c * frame_height_factor)
    };

    let full_width = (pic_width_in_mbs_minus1 as u64 + 1) * 16;
    let full_height = (pic_height_in_map_units_minus1 as u64 + 1) * 16 * frame_height_factor;
    let width = full_width.checked_sub((crop_left as u64 + crop_right as u64) * crop_unit_x)?;
    let height = full_height.checked_sub((crop_top as u64 + crop_bottom as u64) * crop_unit_y)?;

    Some(Sps {
        profile_idc,
        constraint_flags,
        level_idc,
        seq_parameter_set_id,
        chroma_format_idc,
        width: u32::try_from(width).ok()?,
        height: u32::try_from(height).ok()?,
        frame_mbs_only,
    })
}

fn skip_scaling_list(reader: &mut BitReader, size: usize) -> Option<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = reader.read_se()?;
            if !(-128..=127).contains(&delta_scale) {
                return None;
            }
            next_scale = (last_scale + delta_scale + 256) % 256;
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Some(())
}

/// Find the first decodable SPS in an Annex-B stream.
pub fn find_sps(stream: &[u8]) -> Option<Sps> {
    NalUnits::new(stream)
        .filter(|unit| unit.nal_type() == Some(NalUnitType::Sps))
        .find_map(|unit| parse_sps(unit.payload()))
}

/// Picture dimensions of the first decodable SPS in an Annex-B stream.
pub fn probe_dimensions(stream: &[u8]) -> Option<(u32, u32)> {
    let sps = find_sps(stream)?;
    tracing::debug!(
        profile = sps.profile_idc,
        level = sps.level_idc,
        width = sps.width,
        height = sps.height,
        "Found SPS"
    );
    Some((sps.width, sps.height))
}
