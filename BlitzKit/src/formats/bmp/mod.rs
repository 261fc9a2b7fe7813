//! Windows bitmap (BMP) decoder
//!
//! Handles uncompressed images with a 40-byte info header at 1, 4, 8, 16,
//! 24 and 32 bits per pixel. Rows come out in file order (bottom-up for
//! standard files); no vertical flip is applied.

mod reader;

pub use reader::{BitmapHeader, load_bitmap, read_bitmap, read_bitmap_header};

/// `BM`, read little-endian.
pub const BMP_MAGIC: u16 = 0x4D42;

/// File header plus info header.
pub const BMP_HEADER_SIZE: usize = 54;

/// The only accepted info header size (`BITMAPINFOHEADER`).
pub const INFO_HEADER_SIZE: u32 = 40;

/// Accepted bits per pixel.
pub const SUPPORTED_BIT_DEPTHS: [u16; 6] = [1, 4, 8, 16, 24, 32];
