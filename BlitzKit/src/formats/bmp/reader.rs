//! BMP header validation and scanline unpacking
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

#![allow(clippy::cast_possible_truncation)]

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::{BMP_HEADER_SIZE, BMP_MAGIC, INFO_HEADER_SIZE, SUPPORTED_BIT_DEPTHS};
use crate::error::{Error, Result};
use crate::formats::common::ByteCursor;
use crate::formats::pixels::PixelBuffer;

/// `BI_RGB`
const COMPRESSION_NONE: u32 = 0;
/// `BI_BITFIELDS`; masks follow the header like they do for `BI_RGB` here.
const COMPRESSION_BITFIELDS: u32 = 3;

/// Validated header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitmapHeader {
    /// Declared file size.
    pub file_size: u32,
    pub width: u32,
    pub height: u32,
    pub bit_count: u16,
    pub compression: u32,
    /// Palette entries; 0 means `2^bit_count`.
    pub colors_used: u32,
}

impl BitmapHeader {
    /// Palette entries actually stored, for indexed depths.
    #[must_use]
    pub fn palette_len(&self) -> usize {
        if self.bit_count > 8 {
            0
        } else if self.colors_used == 0 {
            1 << self.bit_count
        } else {
            self.colors_used as usize
        }
    }
}

/// Read and validate just the header.
///
/// # Errors
/// Same header errors as [`load_bitmap`].
pub fn read_bitmap_header(data: &[u8]) -> Result<BitmapHeader> {
    let mut cursor: ByteCursor<'_> = ByteCursor::new(data);
    parse_header(&mut cursor)
}

/// Read and decode a bitmap file from disk.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read, otherwise the same
/// errors as [`load_bitmap`].
pub fn read_bitmap<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let data = fs::read(path)?;
    load_bitmap(&data)
}

/// Decode a bitmap from bytes.
///
/// # Errors
///
/// - [`Error::InvalidFormat`] if the data is shorter than the headers, the
///   declared size exceeds the data, the info header is not 40 bytes, the
///   dimensions are negative, the bit depth is unsupported or a palette
///   index is out of range
/// - [`Error::InvalidBitmapMagic`] if the data does not start with `BM`
/// - [`Error::UnsupportedFeature`] for run-length or embedded compression
/// - [`Error::TruncatedInput`] if the palette or pixel data is cut short
pub fn load_bitmap(data: &[u8]) -> Result<PixelBuffer> {
    let mut cursor: ByteCursor<'_> = ByteCursor::new(data);
    let header = parse_header(&mut cursor)?;
    if header.width == 0 || header.height == 0 {
        tracing::debug!("Empty {}x{} bitmap", header.width, header.height);
        return Ok(PixelBuffer::new(header.width, header.height));
    }

    let pixels = if header.bit_count <= 8 {
        let palette = read_palette(&mut cursor, header.palette_len())?;
        ensure_pixel_data(&cursor, &header)?;
        read_indexed(&mut cursor, &header, &palette)?
    } else if header.bit_count == 24 {
        ensure_pixel_data(&cursor, &header)?;
        read_bgr24(&mut cursor, &header)?
    } else {
        let masks = read_masks(&mut cursor)?;
        ensure_pixel_data(&cursor, &header)?;
        read_packed(&mut cursor, &header, masks)?
    };

    tracing::debug!(
        "Decoded {}x{} bitmap at {} bpp",
        header.width,
        header.height,
        header.bit_count
    );
    PixelBuffer::from_rgba(header.width, header.height, pixels)
}

fn parse_header(cursor: &mut ByteCursor<'_>) -> Result<BitmapHeader> {
    if cursor.len() < BMP_HEADER_SIZE as u64 {
        return Err(Error::InvalidFormat(format!(
            "bitmap is {} bytes, shorter than its {BMP_HEADER_SIZE}-byte header",
            cursor.len()
        )));
    }

    let magic = cursor.read_u16()?;
    if magic != BMP_MAGIC {
        return Err(Error::InvalidBitmapMagic(magic));
    }
    let file_size = cursor.read_u32()?;
    if u64::from(file_size) > cursor.len() {
        return Err(Error::InvalidFormat(format!(
            "bitmap declares {file_size} bytes but only {} are present",
            cursor.len()
        )));
    }
    // reserved, then the pixel offset (data is read sequentially instead)
    cursor.skip(8)?;

    let info_size = cursor.read_u32()?;
    if info_size != INFO_HEADER_SIZE {
        return Err(Error::InvalidFormat(format!(
            "unsupported bitmap info header size {info_size}"
        )));
    }
    let width = dimension(cursor.read_i32()?, "width")?;
    let height = dimension(cursor.read_i32()?, "height")?;
    // planes
    cursor.skip(2)?;
    let bit_count = cursor.read_u16()?;
    if !SUPPORTED_BIT_DEPTHS.contains(&bit_count) {
        return Err(Error::InvalidFormat(format!(
            "unsupported bitmap depth {bit_count}"
        )));
    }
    let compression = cursor.read_u32()?;
    if compression != COMPRESSION_NONE && compression != COMPRESSION_BITFIELDS {
        return Err(Error::UnsupportedFeature(format!(
            "compressed bitmap (method {compression})"
        )));
    }
    // image size, then horizontal and vertical resolution
    cursor.skip(12)?;
    let colors_used = cursor.read_u32()?;
    // important colors
    cursor.skip(4)?;

    Ok(BitmapHeader {
        file_size,
        width,
        height,
        bit_count,
        compression,
        colors_used,
    })
}

fn dimension(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("negative bitmap {what} {value}")))
}

/// Bytes needed to pad a row of `row_bytes` to a 4-byte boundary.
fn row_padding(row_bytes: usize) -> usize {
    (4 - row_bytes % 4) % 4
}

/// Packed (unpadded) bytes of one scanline.
fn row_bytes(header: &BitmapHeader) -> usize {
    (header.width as usize * usize::from(header.bit_count)).div_ceil(8)
}

/// Fail before allocating when the pixel rows cannot all be present.
fn ensure_pixel_data(cursor: &ByteCursor<'_>, header: &BitmapHeader) -> Result<()> {
    let needed = row_bytes(header).saturating_mul(header.height as usize);
    let available = cursor.remaining();
    if needed > available {
        return Err(Error::TruncatedInput {
            offset: cursor.position(),
            needed,
            available,
        });
    }
    Ok(())
}

/// Skip row padding; a missing pad after the last row is tolerated.
fn skip_padding(cursor: &mut ByteCursor<'_>, padding: usize) -> Result<()> {
    let padding = padding.min(cursor.remaining());
    cursor.skip(padding as u64)
}

fn read_palette(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<[u8; 4]>> {
    let mut palette = Vec::new();
    for _ in 0..count {
        let entry = cursor.read_bytes(4)?;
        palette.push([entry[2], entry[1], entry[0], 255]);
    }
    Ok(palette)
}

fn read_indexed(
    cursor: &mut ByteCursor<'_>,
    header: &BitmapHeader,
    palette: &[[u8; 4]],
) -> Result<Vec<u8>> {
    let bits = usize::from(header.bit_count);
    let mask = ((1u16 << bits) - 1) as u8;
    let stride = row_bytes(header);
    let padding = row_padding(stride);

    let mut pixels = Vec::with_capacity(header.width as usize * header.height as usize * 4);
    for _ in 0..header.height {
        let row = cursor.read_bytes(stride)?;
        for x in 0..header.width as usize {
            let bit = x * bits;
            // leftmost pixel sits in the most significant bits
            let shift = 8 - bits - bit % 8;
            let index = (row[bit / 8] >> shift) & mask;
            let color = palette.get(usize::from(index)).ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "palette index {index} out of range ({} entries)",
                    palette.len()
                ))
            })?;
            pixels.extend_from_slice(color);
        }
        skip_padding(cursor, padding)?;
    }
    Ok(pixels)
}

/// Channel bit-mask with its shift and maximum.
#[derive(Debug, Clone, Copy)]
struct ChannelMask {
    mask: u32,
    shift: u32,
    max: u32,
}

impl ChannelMask {
    fn new(mask: u32) -> Self {
        let shift = if mask == 0 { 0 } else { mask.trailing_zeros() };
        Self {
            mask,
            shift,
            max: mask >> shift,
        }
    }

    /// Extract the channel and scale it to 0..=255.
    fn extract(self, value: u32) -> u8 {
        if self.max == 0 {
            return 0;
        }
        let raw = u64::from((value & self.mask) >> self.shift);
        let max = u64::from(self.max);
        ((raw * 255 + max / 2) / max) as u8
    }
}

fn read_masks(cursor: &mut ByteCursor<'_>) -> Result<[ChannelMask; 3]> {
    Ok([
        ChannelMask::new(cursor.read_u32()?),
        ChannelMask::new(cursor.read_u32()?),
        ChannelMask::new(cursor.read_u32()?),
    ])
}

/// 16 or 32-bit pixels split by channel masks. Only 16-bit rows are padded;
/// 32-bit rows are always aligned.
fn read_packed(
    cursor: &mut ByteCursor<'_>,
    header: &BitmapHeader,
    [r, g, b]: [ChannelMask; 3],
) -> Result<Vec<u8>> {
    let wide = header.bit_count == 32;
    let padding = if wide { 0 } else { row_padding(header.width as usize * 2) };

    let mut pixels = Vec::with_capacity(header.width as usize * header.height as usize * 4);
    for _ in 0..header.height {
        for _ in 0..header.width {
            let value = if wide {
                cursor.read_u32()?
            } else {
                u32::from(cursor.read_u16()?)
            };
            pixels.extend_from_slice(&[r.extract(value), g.extract(value), b.extract(value), 255]);
        }
        skip_padding(cursor, padding)?;
    }
    Ok(pixels)
}

fn read_bgr24(cursor: &mut ByteCursor<'_>, header: &BitmapHeader) -> Result<Vec<u8>> {
    let stride = header.width as usize * 3;
    let padding = row_padding(stride);

    let mut pixels = Vec::with_capacity(header.width as usize * header.height as usize * 4);
    for _ in 0..header.height {
        let row = cursor.read_bytes(stride)?;
        for bgr in row.chunks_exact(3) {
            pixels.extend_from_slice(&[bgr[2], bgr[1], bgr[0], 255]);
        }
        skip_padding(cursor, padding)?;
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Headers for a bitmap whose palette/masks and pixel rows are `body`.
    fn bitmap(width: i32, height: i32, bits: u16, colors_used: u32, body: &[u8]) -> Vec<u8> {
        let size = (BMP_HEADER_SIZE + body.len()) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&bits.to_le_bytes());
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(&colors_used.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(body);
        data
    }

    fn masks(r: u32, g: u32, b: u32) -> Vec<u8> {
        [r, g, b].iter().flat_map(|m| m.to_le_bytes()).collect()
    }

    #[test]
    fn test_single_bgr_pixel() {
        let image = load_bitmap(&bitmap(1, 1, 24, 0, &[0, 0, 255, 0])).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_24bit_rows_are_padded_per_row() {
        // width 1: 3 data bytes + 1 pad per row; rows stay in file order
        let body = [1, 2, 3, 0, 4, 5, 6, 0];
        let image = load_bitmap(&bitmap(1, 2, 24, 0, &body)).unwrap();
        assert_eq!(image.pixel(0, 0), Some([3, 2, 1, 255]));
        assert_eq!(image.pixel(0, 1), Some([6, 5, 4, 255]));
    }

    #[test]
    fn test_1bit_is_msb_first() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0, 0, 0, 0]); // black
        body.extend_from_slice(&[255, 255, 255, 0]); // white
        body.extend_from_slice(&[0b1010_0000, 0, 0, 0]);
        let image = load_bitmap(&bitmap(3, 1, 1, 0, &body)).unwrap();
        assert_eq!(image.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(image.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(image.pixel(2, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_4bit_nibbles() {
        let mut body = Vec::new();
        for i in 0..3u8 {
            body.extend_from_slice(&[i * 10, i * 20, i * 30, 0]);
        }
        body.extend_from_slice(&[0x21, 0x00, 0, 0]);
        let image = load_bitmap(&bitmap(3, 1, 4, 3, &body)).unwrap();
        assert_eq!(image.pixel(0, 0), Some([60, 40, 20, 255]));
        assert_eq!(image.pixel(1, 0), Some([30, 20, 10, 255]));
        assert_eq!(image.pixel(2, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_8bit_palette_and_padding() {
        let mut body = Vec::new();
        body.extend_from_slice(&[10, 20, 30, 0]);
        body.extend_from_slice(&[40, 50, 60, 0]);
        // width 3: 3 index bytes + 1 pad per row
        body.extend_from_slice(&[0, 1, 0, 0xEE, 1, 1, 1, 0xEE]);
        let image = load_bitmap(&bitmap(3, 2, 8, 2, &body)).unwrap();
        assert_eq!(image.pixel(1, 0), Some([60, 50, 40, 255]));
        assert_eq!(image.pixel(0, 1), Some([60, 50, 40, 255]));
        assert_eq!(image.pixel(2, 0), Some([30, 20, 10, 255]));
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let mut body = vec![0, 0, 0, 0];
        body.extend_from_slice(&[5, 0, 0, 0]);
        assert!(matches!(
            load_bitmap(&bitmap(1, 1, 8, 1, &body)),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_16bit_masks_scale_channels() {
        let mut body = masks(0xF800, 0x07E0, 0x001F);
        body.extend_from_slice(&0xF800u16.to_le_bytes());
        body.extend_from_slice(&0x07FFu16.to_le_bytes());
        let image = load_bitmap(&bitmap(2, 1, 16, 0, &body)).unwrap();
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(1, 0), Some([0, 255, 255, 255]));
    }

    #[test]
    fn test_32bit_masks() {
        let mut body = masks(0x00FF_0000, 0x0000_FF00, 0x0000_00FF);
        body.extend_from_slice(&0x0012_3456u32.to_le_bytes());
        let image = load_bitmap(&bitmap(1, 1, 32, 0, &body)).unwrap();
        assert_eq!(image.pixels, vec![0x12, 0x34, 0x56, 255]);
    }

    #[test]
    fn test_zero_mask_gives_zero_channel() {
        let mut body = masks(0, 0xFF00, 0xFF);
        body.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        let image = load_bitmap(&bitmap(1, 1, 32, 0, &body)).unwrap();
        assert_eq!(image.pixels, vec![0, 255, 255, 255]);
    }

    #[test]
    fn test_header_rejections() {
        assert!(matches!(load_bitmap(b"BM"), Err(Error::InvalidFormat(_))));

        let mut bad_info = bitmap(1, 1, 24, 0, &[0; 4]);
        bad_info[14..18].copy_from_slice(&12u32.to_le_bytes());
        assert!(matches!(load_bitmap(&bad_info), Err(Error::InvalidFormat(_))));

        assert!(matches!(
            load_bitmap(&bitmap(1, 1, 2, 0, &[0; 8])),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            load_bitmap(&bitmap(-1, 1, 24, 0, &[0; 4])),
            Err(Error::InvalidFormat(_))
        ));

        let mut rle = bitmap(1, 1, 8, 0, &[0; 8]);
        rle[30..34].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(load_bitmap(&rle), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_truncated_pixels() {
        assert!(matches!(
            load_bitmap(&bitmap(4, 4, 24, 0, &[0; 6])),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_zero_dimension_skips_rows() {
        let tall = load_bitmap(&bitmap(0, i32::MAX, 24, 0, &[])).unwrap();
        assert_eq!((tall.width, tall.height), (0, i32::MAX as u32));
        assert!(tall.pixels.is_empty());

        let wide = load_bitmap(&bitmap(i32::MAX, 0, 8, 0, &[])).unwrap();
        assert_eq!(wide.pixel_count(), 0);
    }

    #[test]
    fn test_header_only() {
        let header = read_bitmap_header(&bitmap(7, 3, 8, 0, &[])).unwrap();
        assert_eq!(header.width, 7);
        assert_eq!(header.height, 3);
        assert_eq!(header.palette_len(), 256);
    }

    proptest! {
        #[test]
        fn prop_bad_magic_is_rejected(
            magic in any::<[u8; 2]>(),
            tail in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            prop_assume!(magic != [0x42, 0x4D]);
            let mut data = magic.to_vec();
            data.extend_from_slice(&tail);
            prop_assert!(load_bitmap(&data).is_err());
        }

        #[test]
        fn prop_oversized_declaration_is_rejected(extra in 1u32..100_000) {
            let mut data = bitmap(1, 1, 24, 0, &[0, 0, 0, 0]);
            let size = data.len() as u32 + extra;
            data[2..6].copy_from_slice(&size.to_le_bytes());
            prop_assert!(matches!(load_bitmap(&data), Err(Error::InvalidFormat(_))));
        }
    }
}
