//! In-memory DDS builders for tests

use super::{DDPF_ALPHAPIXELS, DDPF_FOURCC, DDS_HEADER_SIZE, DDS_MAGIC};

fn header(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0u8; DDS_HEADER_SIZE];
    data[..4].copy_from_slice(&DDS_MAGIC);
    data[4..8].copy_from_slice(&124u32.to_le_bytes());
    data[12..16].copy_from_slice(&height.to_le_bytes());
    data[16..20].copy_from_slice(&width.to_le_bytes());
    data[76..80].copy_from_slice(&32u32.to_le_bytes());
    data
}

/// A DDS file with a four-character code followed by `blocks`.
pub fn dds_fourcc(width: u32, height: u32, code: &[u8; 4], blocks: &[u8]) -> Vec<u8> {
    let mut data = header(width, height);
    data[80..84].copy_from_slice(&DDPF_FOURCC.to_le_bytes());
    data[84..88].copy_from_slice(code);
    data.extend_from_slice(blocks);
    data
}

/// A DDS file describing an uncompressed mask layout (no pixel data).
pub fn dds_masked(width: u32, height: u32, bits: u32, masks: [u32; 4], alpha: bool) -> Vec<u8> {
    let mut data = header(width, height);
    let flags = if alpha { DDPF_ALPHAPIXELS | 0x40 } else { 0x40 };
    data[80..84].copy_from_slice(&flags.to_le_bytes());
    data[88..92].copy_from_slice(&bits.to_le_bytes());
    for (i, mask) in masks.iter().enumerate() {
        let at = 92 + i * 4;
        data[at..at + 4].copy_from_slice(&mask.to_le_bytes());
    }
    data
}
