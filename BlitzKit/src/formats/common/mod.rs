//! Shared building blocks for the binary format decoders

pub mod axis;
pub mod cursor;

pub use axis::{flip_quat, flip_vec3};
pub use cursor::ByteCursor;
