//! File format handlers for Blitz3D assets

pub mod b3d;
pub mod bmp;
pub mod common;
pub mod dds;
pub mod pixels;

// Re-export the main entry points
pub use b3d::{SceneGraph, load_model, read_model};
pub use bmp::load_bitmap;
pub use dds::load_block_texture;
pub use pixels::PixelBuffer;
