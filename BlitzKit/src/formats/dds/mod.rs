//! DirectDraw Surface (DDS) block-texture decoder
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Decodes DXT1, DXT3 and DXT5 (and the premultiplied DXT2/DXT4 aliases)
//! into RGBA8. Uncompressed mask layouts are recognised and reported as
//! unsupported.

mod decode;
#[cfg(test)]
pub(crate) mod fixtures;
mod header;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::pixels::PixelBuffer;

pub use decode::decode_blocks;
pub use header::{
    BlockCodec, DDPF_ALPHAPIXELS, DDPF_FOURCC, DdsHeader, PixelFormat, UncompressedLayout,
    read_dds_header,
};

/// `DDS ` file signature.
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";

/// Signature plus header; block data starts here.
pub const DDS_HEADER_SIZE: usize = 128;

/// Decode a block-compressed DDS texture from bytes.
///
/// # Errors
///
/// - Header errors from [`read_dds_header`]
/// - [`Error::UnsupportedFeature`] for uncompressed layouts
/// - [`Error::TruncatedInput`] if block data is missing
pub fn load_block_texture(data: &[u8]) -> Result<PixelBuffer> {
    let header = read_dds_header(data)?;
    let codec = match header.format {
        PixelFormat::Compressed(codec) => codec,
        PixelFormat::Uncompressed(layout) => {
            return Err(Error::UnsupportedFeature(format!(
                "uncompressed DDS layout {layout:?}"
            )));
        }
    };

    let pixels = decode_blocks(data, header.width, header.height, codec)?;
    tracing::debug!(
        "Decoded {}x{} DDS texture ({codec:?})",
        header.width,
        header.height
    );
    PixelBuffer::from_rgba(header.width, header.height, pixels)
}

/// Read and decode a DDS file from disk.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read, otherwise the same
/// errors as [`load_block_texture`].
pub fn read_block_texture<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let data = fs::read(path)?;
    load_block_texture(&data)
}

#[cfg(test)]
mod tests {
    use super::fixtures::{dds_fourcc, dds_masked};
    use super::*;

    #[test]
    fn test_single_block_equal_endpoints() {
        // c0 == c1, every selector 0
        let block = [0x1F, 0x7C, 0x1F, 0x7C, 0, 0, 0, 0];
        let image = load_block_texture(&dds_fourcc(4, 4, b"DXT1", &block)).unwrap();
        assert_eq!((image.width, image.height), (4, 4));
        let first = image.pixel(0, 0).unwrap();
        assert_eq!(first[3], 255);
        assert!(image.pixels.chunks_exact(4).all(|px| px == first));
    }

    #[test]
    fn test_dxt5_texture() {
        let mut block = vec![0, 255, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        block.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
        let image = load_block_texture(&dds_fourcc(2, 2, b"DXT5", &block)).unwrap();
        // selector 7 with a0 <= a1 is fully opaque
        assert_eq!(image.pixels, [255, 255, 255, 255].repeat(4));
    }

    #[test]
    fn test_uncompressed_is_unsupported() {
        let data = dds_masked(1, 1, 32, UncompressedLayout::A8B8G8R8.masks(), true);
        assert!(matches!(
            load_block_texture(&data),
            Err(Error::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.dds");
        fs::write(&path, dds_fourcc(4, 4, b"DXT3", &[0; 16])).unwrap();
        let image = read_block_texture(&path).unwrap();
        assert_eq!(image.pixel_count(), 16);
        // all-zero DXT3 block: black with zero alpha
        assert_eq!(image.pixels, vec![0; 64]);
    }
}
