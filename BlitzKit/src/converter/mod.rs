//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Texture conversion
//!
//! Decodes BMP, DDS and generic images and writes them out as PNG.

mod png;
mod types;

pub use png::{convert_texture_to_png, convert_texture_to_png_with_progress, encode_png};
pub use types::{ImagePhase, ImageProgress, ImageProgressCallback};
