//! Texture loading by file kind
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! `.bmp` and `.dds` go through this crate's decoders; everything else is
//! handed to the `image` crate. [`TextureCache`] shares decoded textures
//! between the materials of a model.

mod cache;

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::formats::b3d::TextureKind;
use crate::formats::bmp::{load_bitmap, read_bitmap_header};
use crate::formats::dds::{PixelFormat, load_block_texture, read_dds_header};
use crate::formats::pixels::PixelBuffer;

pub use cache::{CachedTexture, TextureCache};

/// Kind of the texture at `path`, from its extension.
#[must_use]
pub fn texture_kind<P: AsRef<Path>>(path: P) -> TextureKind {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    TextureKind::from_file_name(&name)
}

/// Decode texture bytes of a known kind.
///
/// # Errors
/// Returns the decoder's error; [`crate::Error::Image`] for the generic
/// fallback.
pub fn decode_texture_bytes(data: &[u8], kind: TextureKind) -> Result<PixelBuffer> {
    match kind {
        TextureKind::Bitmap => load_bitmap(data),
        TextureKind::BlockTexture => load_block_texture(data),
        TextureKind::Other => Ok(image::load_from_memory(data)?.to_rgba8().into()),
    }
}

/// Read and decode the texture at `path`.
///
/// # Errors
/// Returns [`crate::Error::Io`] if the file cannot be read, otherwise the
/// same errors as [`decode_texture_bytes`].
pub fn decode_texture<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let kind = texture_kind(path);
    let data = fs::read(path)?;
    tracing::debug!("Decoding {} ({kind:?}, {} bytes)", path.display(), data.len());
    decode_texture_bytes(&data, kind)
}

/// What `texture info` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureInfo {
    pub kind: TextureKind,
    /// Stored pixel format, e.g. `8-bit indexed` or `Dxt5`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub has_transparency: bool,
}

/// Decode the texture at `path` and describe it.
///
/// # Errors
/// Same as [`decode_texture`].
pub fn inspect_texture<P: AsRef<Path>>(path: P) -> Result<TextureInfo> {
    let path = path.as_ref();
    let kind = texture_kind(path);
    let data = fs::read(path)?;

    let format = match kind {
        TextureKind::Bitmap => {
            let header = read_bitmap_header(&data)?;
            if header.bit_count <= 8 {
                format!("{}-bit indexed", header.bit_count)
            } else {
                format!("{}-bit", header.bit_count)
            }
        }
        TextureKind::BlockTexture => match read_dds_header(&data)?.format {
            PixelFormat::Compressed(codec) => format!("{codec:?}"),
            PixelFormat::Uncompressed(layout) => format!("{layout:?}"),
        },
        TextureKind::Other => image::guess_format(&data)
            .map(|f| format!("{f:?}"))
            .unwrap_or_else(|_| "unknown".to_string()),
    };

    let image = decode_texture_bytes(&data, kind)?;
    Ok(TextureInfo {
        kind,
        format,
        width: image.width,
        height: image.height,
        has_transparency: image.has_transparency(),
    })
}
