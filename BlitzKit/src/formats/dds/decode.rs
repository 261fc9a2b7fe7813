//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! DXT1/3/5 block decompression

#![allow(clippy::cast_possible_truncation)]

use super::DDS_HEADER_SIZE;
use super::header::BlockCodec;
use crate::error::{Error, Result};

/// One decoded 4x4 block, pixels in row-major order.
type Block = [[u8; 4]; 16];

/// Decode every block after the header into `width * height` RGBA8 pixels.
///
/// Blocks on the right and bottom edges are cropped to the image.
///
/// # Errors
/// Returns [`Error::TruncatedInput`] if the data holds fewer blocks than the
/// dimensions need.
pub fn decode_blocks(data: &[u8], width: u32, height: u32, codec: BlockCodec) -> Result<Vec<u8>> {
    let width = width as usize;
    let height = height as usize;
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = codec.block_size();

    let body = data.get(DDS_HEADER_SIZE..).unwrap_or_default();
    let needed = blocks_x.saturating_mul(blocks_y).saturating_mul(block_size);
    if needed > body.len() {
        return Err(Error::TruncatedInput {
            offset: DDS_HEADER_SIZE as u64,
            needed,
            available: body.len(),
        });
    }

    let mut rgba = vec![0u8; width * height * 4];
    for (i, block) in body.chunks_exact(block_size).take(blocks_x * blocks_y).enumerate() {
        let (bx, by) = (i % blocks_x, i / blocks_x);
        let pixels = match codec {
            BlockCodec::Dxt1 => decode_dxt1(block),
            BlockCodec::Dxt3 => decode_dxt3(block),
            BlockCodec::Dxt5 => decode_dxt5(block),
        };

        for (p, px) in pixels.iter().enumerate() {
            let fx = bx * 4 + p % 4;
            let fy = by * 4 + p / 4;
            if fx >= width || fy >= height {
                continue;
            }
            let dst = (fy * width + fx) * 4;
            rgba[dst..dst + 4].copy_from_slice(px);
        }
    }
    Ok(rgba)
}

/// Expand an R5G6B5 colour to 8 bits per channel.
fn expand_565(c: u16) -> [u32; 3] {
    let r = u32::from(c >> 11) & 0x1F;
    let g = u32::from(c >> 5) & 0x3F;
    let b = u32::from(c) & 0x1F;
    [r * 255 / 31, g * 255 / 63, b * 255 / 31]
}

fn mix(a: [u32; 3], wa: u32, b: [u32; 3], wb: u32) -> [u8; 4] {
    let total = wa + wb;
    [
        ((a[0] * wa + b[0] * wb) / total) as u8,
        ((a[1] * wa + b[1] * wb) / total) as u8,
        ((a[2] * wa + b[2] * wb) / total) as u8,
        255,
    ]
}

/// The four selectable colours of a colour block.
///
/// With `punch_through`, `c0 <= c1` selects three-colour mode where index 3
/// is transparent black.
fn color_table(c0: u16, c1: u16, punch_through: bool) -> [[u8; 4]; 4] {
    let e0 = expand_565(c0);
    let e1 = expand_565(c1);
    let solid = |e: [u32; 3]| [e[0] as u8, e[1] as u8, e[2] as u8, 255];

    if c0 > c1 || !punch_through {
        [solid(e0), solid(e1), mix(e0, 2, e1, 1), mix(e0, 1, e1, 2)]
    } else {
        [solid(e0), solid(e1), mix(e0, 1, e1, 1), [0, 0, 0, 0]]
    }
}

/// Decode the 8-byte colour half shared by all three codecs.
fn decode_colors(block: &[u8], punch_through: bool) -> Block {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let table = color_table(c0, c1, punch_through);

    let mut out = [[0u8; 4]; 16];
    for (row, &bits) in block[4..8].iter().enumerate() {
        for col in 0..4 {
            let selector = (bits >> (col * 2)) & 0x3;
            out[row * 4 + col] = table[usize::from(selector)];
        }
    }
    out
}

fn decode_dxt1(block: &[u8]) -> Block {
    decode_colors(block, true)
}

fn decode_dxt3(block: &[u8]) -> Block {
    let mut out = decode_colors(&block[8..16], false);
    let bits = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    for (i, px) in out.iter_mut().enumerate() {
        // first pixel in the low nibble
        let alpha = ((bits >> (i * 4)) & 0xF) as u8;
        px[3] = alpha * 17;
    }
    out
}

/// The eight selectable alpha values of a DXT5 alpha block.
fn alpha_table(a0: u8, a1: u8) -> [u8; 8] {
    let (a0w, a1w) = (u32::from(a0), u32::from(a1));
    let lerp = |w0: u32, w1: u32, d: u32| ((w0 * a0w + w1 * a1w) / d) as u8;
    if a0 > a1 {
        [
            a0,
            a1,
            lerp(6, 1, 7),
            lerp(5, 2, 7),
            lerp(4, 3, 7),
            lerp(3, 4, 7),
            lerp(2, 5, 7),
            lerp(1, 6, 7),
        ]
    } else {
        [
            a0,
            a1,
            lerp(4, 1, 5),
            lerp(3, 2, 5),
            lerp(2, 3, 5),
            lerp(1, 4, 5),
            0,
            255,
        ]
    }
}

fn decode_dxt5(block: &[u8]) -> Block {
    let mut out = decode_colors(&block[8..16], false);
    let table = alpha_table(block[0], block[1]);
    // 16 3-bit selectors packed little-endian into 48 bits
    let bits = u64::from_le_bytes([block[2], block[3], block[4], block[5], block[6], block[7], 0, 0]);
    for (i, px) in out.iter_mut().enumerate() {
        let selector = (bits >> (i * 3)) & 0x7;
        px[3] = table[selector as usize];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn color_block(c0: u16, c1: u16, rows: [u8; 4]) -> Vec<u8> {
        let mut block = Vec::new();
        block.extend_from_slice(&c0.to_le_bytes());
        block.extend_from_slice(&c1.to_le_bytes());
        block.extend_from_slice(&rows);
        block
    }

    #[test]
    fn test_expand_565_extremes() {
        assert_eq!(expand_565(0xFFFF), [255, 255, 255]);
        assert_eq!(expand_565(0x0000), [0, 0, 0]);
        assert_eq!(expand_565(0xF800), [255, 0, 0]);
        assert_eq!(expand_565(0x07E0), [0, 255, 0]);
        // 6-bit green keeps its precision
        assert_eq!(expand_565(0x0020), [0, 4, 0]);
    }

    #[test]
    fn test_dxt1_four_colour_mode() {
        // c0 white > c1 black
        let block = color_block(0xFFFF, 0x0000, [0b1110_0100, 0, 0, 0]);
        let px = decode_dxt1(&block);
        assert_eq!(px[0], [255, 255, 255, 255]);
        assert_eq!(px[1], [0, 0, 0, 255]);
        assert_eq!(px[2], [170, 170, 170, 255]);
        assert_eq!(px[3], [85, 85, 85, 255]);
    }

    #[test]
    fn test_dxt1_three_colour_mode_punches_through() {
        let block = color_block(0x0000, 0xFFFF, [0b1110_0100, 0, 0, 0]);
        let px = decode_dxt1(&block);
        assert_eq!(px[2], [127, 127, 127, 255]);
        assert_eq!(px[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_dxt3_alpha_low_nibble_first() {
        let mut block = vec![0x21, 0, 0, 0, 0, 0, 0, 0xF0];
        block.extend(color_block(0x0000, 0xFFFF, [0xFF; 4]));
        let px = decode_dxt3(&block);
        assert_eq!(px[0][3], 17);
        assert_eq!(px[1][3], 34);
        assert_eq!(px[15][3], 255);
        // no punch-through for explicit alpha: index 3 is a blend
        assert_eq!(px[0][..3], [170, 170, 170]);
    }

    #[test]
    fn test_dxt5_alpha_ramps() {
        assert_eq!(alpha_table(255, 0), [255, 0, 218, 182, 145, 109, 72, 36]);
        assert_eq!(alpha_table(0, 255), [0, 255, 51, 102, 153, 204, 0, 255]);
    }

    #[test]
    fn test_dxt5_selectors_are_per_pixel() {
        // pixel 0 -> selector 1, pixel 1 -> selector 0, pixel 8 -> selector 1
        let mut block = vec![200, 100, 0b0000_0001, 0, 0, 0b0000_0001, 0, 0];
        block.extend(color_block(0xFFFF, 0xFFFF, [0; 4]));
        let px = decode_dxt5(&block);
        assert_eq!(px[0][3], 100);
        assert_eq!(px[1][3], 200);
        assert_eq!(px[8][3], 100);
        assert_eq!(px[9][3], 200);
    }

    #[test]
    fn test_edge_blocks_are_cropped() {
        let mut data = vec![0u8; DDS_HEADER_SIZE];
        // 5x2: two blocks across, one down
        data.extend(color_block(0xF800, 0xF800, [0; 4]));
        data.extend(color_block(0x001F, 0x001F, [0; 4]));
        let rgba = decode_blocks(&data, 5, 2, BlockCodec::Dxt1).unwrap();
        assert_eq!(rgba.len(), 5 * 2 * 4);
        assert_eq!(rgba[..4], [255, 0, 0, 255]);
        assert_eq!(rgba[16..20], [0, 0, 255, 255]);
        assert_eq!(rgba[36..40], [0, 0, 255, 255]);
    }

    #[test]
    fn test_missing_blocks_are_truncated() {
        let data = vec![0u8; DDS_HEADER_SIZE + 8];
        assert!(matches!(
            decode_blocks(&data, 8, 8, BlockCodec::Dxt1),
            Err(Error::TruncatedInput { .. })
        ));
    }
}
