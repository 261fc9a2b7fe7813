//! DDS header fields and pixel-format detection

use serde::Serialize;

use super::{DDS_HEADER_SIZE, DDS_MAGIC};
use crate::error::{Error, Result};
use crate::formats::common::ByteCursor;

const OFFSET_HEIGHT: u64 = 12;
const OFFSET_WIDTH: u64 = 16;
const OFFSET_PF_FLAGS: u64 = 80;
const OFFSET_FOURCC: u64 = 84;
const OFFSET_BIT_COUNT: u64 = 88;

/// Pixel-format flag: the format is named by a four-character code.
pub const DDPF_FOURCC: u32 = 0x4;
/// Pixel-format flag: the alpha mask is valid.
pub const DDPF_ALPHAPIXELS: u32 = 0x1;

/// Block-compressed codecs with a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockCodec {
    /// BC1: colour endpoints, 1-bit alpha by endpoint order.
    Dxt1,
    /// BC2: explicit 4-bit alpha (also covers DXT2).
    Dxt3,
    /// BC3: interpolated alpha (also covers DXT4).
    Dxt5,
}

impl BlockCodec {
    /// Bytes per 4x4 block.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Map a four-character code.
    #[must_use]
    pub fn from_fourcc(code: [u8; 4]) -> Option<Self> {
        match &code {
            b"DXT1" => Some(Self::Dxt1),
            b"DXT2" | b"DXT3" => Some(Self::Dxt3),
            b"DXT4" | b"DXT5" => Some(Self::Dxt5),
            _ => None,
        }
    }
}

/// Known uncompressed mask layouts. Recognised, but not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UncompressedLayout {
    A1R5G5B5,
    X1R5G5B5,
    A4R4G4B4,
    X4R4G4B4,
    R5G6B5,
    R8G8B8,
    A8B8G8R8,
    X8B8G8R8,
    A8R8G8B8,
    X8R8G8B8,
}

impl UncompressedLayout {
    const ALL: [Self; 10] = [
        Self::A1R5G5B5,
        Self::X1R5G5B5,
        Self::A4R4G4B4,
        Self::X4R4G4B4,
        Self::R5G6B5,
        Self::R8G8B8,
        Self::A8B8G8R8,
        Self::X8B8G8R8,
        Self::A8R8G8B8,
        Self::X8R8G8B8,
    ];

    /// Bits per pixel.
    #[must_use]
    pub const fn bit_count(self) -> u32 {
        match self {
            Self::A1R5G5B5 | Self::X1R5G5B5 | Self::A4R4G4B4 | Self::X4R4G4B4 | Self::R5G6B5 => 16,
            Self::R8G8B8 => 24,
            Self::A8B8G8R8 | Self::X8B8G8R8 | Self::A8R8G8B8 | Self::X8R8G8B8 => 32,
        }
    }

    /// Red, green, blue and alpha masks.
    #[must_use]
    pub const fn masks(self) -> [u32; 4] {
        match self {
            Self::A1R5G5B5 => [0x7C00, 0x03E0, 0x001F, 0x8000],
            Self::X1R5G5B5 => [0x7C00, 0x03E0, 0x001F, 0],
            Self::A4R4G4B4 => [0x0F00, 0x00F0, 0x000F, 0xF000],
            Self::X4R4G4B4 => [0x0F00, 0x00F0, 0x000F, 0],
            Self::R5G6B5 => [0xF800, 0x07E0, 0x001F, 0],
            Self::R8G8B8 => [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0],
            Self::A8B8G8R8 => [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000],
            Self::X8B8G8R8 => [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0],
            Self::A8R8G8B8 => [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000],
            Self::X8R8G8B8 => [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0],
        }
    }

    /// Find the layout with exactly this bit count and masks.
    #[must_use]
    pub fn find(bit_count: u32, masks: [u32; 4]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|layout| layout.bit_count() == bit_count && layout.masks() == masks)
    }
}

/// Pixel format named by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PixelFormat {
    Compressed(BlockCodec),
    Uncompressed(UncompressedLayout),
}

/// Header fields the decoder uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DdsHeader {
    pub width: u32,
    pub height: u32,
    /// Pixel-format flags.
    pub flags: u32,
    pub format: PixelFormat,
}

impl DdsHeader {
    /// Number of 4x4 blocks across and down.
    #[must_use]
    pub fn block_dims(&self) -> (usize, usize) {
        (
            (self.width as usize).div_ceil(4),
            (self.height as usize).div_ceil(4),
        )
    }
}

/// Read and validate the 128-byte header.
///
/// # Errors
///
/// - [`Error::InvalidDdsMagic`] if the data does not start with `DDS `
/// - [`Error::TruncatedInput`] if the data is shorter than the header
/// - [`Error::UnsupportedFeature`] for four-character codes without a decoder
/// - [`Error::InvalidFormat`] for an unrecognised mask layout
pub fn read_dds_header(data: &[u8]) -> Result<DdsHeader> {
    if data.len() >= 4 && data[..4] != DDS_MAGIC {
        return Err(Error::InvalidDdsMagic([data[0], data[1], data[2], data[3]]));
    }
    if data.len() < DDS_HEADER_SIZE {
        return Err(Error::TruncatedInput {
            offset: 0,
            needed: DDS_HEADER_SIZE,
            available: data.len(),
        });
    }

    let mut cursor: ByteCursor<'_> = ByteCursor::new(data);
    cursor.seek_to(OFFSET_HEIGHT)?;
    let height = cursor.read_u32()?;
    cursor.seek_to(OFFSET_WIDTH)?;
    let width = cursor.read_u32()?;
    cursor.seek_to(OFFSET_PF_FLAGS)?;
    let flags = cursor.read_u32()?;

    let format = if flags & DDPF_FOURCC != 0 {
        cursor.seek_to(OFFSET_FOURCC)?;
        let code = cursor.read_tag()?;
        let codec = BlockCodec::from_fourcc(code).ok_or_else(|| {
            Error::UnsupportedFeature(format!(
                "DDS four-character code {:?}",
                String::from_utf8_lossy(&code)
            ))
        })?;
        PixelFormat::Compressed(codec)
    } else {
        cursor.seek_to(OFFSET_BIT_COUNT)?;
        let bit_count = cursor.read_u32()?;
        let red = cursor.read_u32()?;
        let green = cursor.read_u32()?;
        let blue = cursor.read_u32()?;
        let alpha = cursor.read_u32()?;
        let alpha = if flags & DDPF_ALPHAPIXELS != 0 { alpha } else { 0 };
        let layout = UncompressedLayout::find(bit_count, [red, green, blue, alpha]).ok_or_else(
            || {
                Error::InvalidFormat(format!(
                    "unrecognised DDS pixel format: {bit_count} bits, masks \
                     {red:#x}/{green:#x}/{blue:#x}/{alpha:#x}"
                ))
            },
        )?;
        PixelFormat::Uncompressed(layout)
    };

    Ok(DdsHeader {
        width,
        height,
        flags,
        format,
    })
}
