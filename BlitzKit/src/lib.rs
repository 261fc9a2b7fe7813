//! # BlitzKit
//!
//! A pure-Rust library for Blitz3D assets.
//!
//! ## Supported Formats
//!
//! - **B3D** - chunked models: textures, brushes, node hierarchy, meshes,
//!   bone weights and keyframes
//! - **BMP** - 1/4/8-bit indexed, 16/24/32-bit packed bitmaps
//! - **DDS** - DXT1, DXT3 and DXT5 block textures
//!
//! ## Quick Start
//!
//! ### Loading a Model
//!
//! ```no_run
//! use blitzkit::formats::b3d::read_model;
//! use blitzkit::scene::assemble;
//!
//! let graph = read_model("ninja.b3d")?;
//! for node in &graph.nodes {
//!     println!("{} (parent {:?})", node.name, node.parent);
//! }
//!
//! let scene = assemble(&graph);
//! println!("{} surfaces", scene.surfaces.len());
//! # Ok::<(), blitzkit::Error>(())
//! ```
//!
//! ### Converting Textures
//!
//! ```no_run
//! use blitzkit::converter::convert_texture_to_png;
//!
//! convert_texture_to_png("skin.dds", "skin.png")?;
//! # Ok::<(), blitzkit::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use blitzkit::prelude::*;
//!
//! let options = LoadOptions::new().with_animation(false);
//! assert!(!options.enable_animation);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `blitzkit` command-line binary

pub mod batch;
pub mod config;
pub mod converter;
pub mod error;
pub mod formats;
pub mod scene;
pub mod texture;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, LoadOptions, TextureOptions};
    pub use crate::error::{Error, Result};
    pub use crate::formats::b3d::{
        ModelSummary, NodeId, SceneGraph, SceneNode, TextureKind, load_model, load_model_with,
        read_model, read_model_with,
    };
    pub use crate::formats::bmp::{load_bitmap, read_bitmap};
    pub use crate::formats::dds::{load_block_texture, read_block_texture};
    pub use crate::formats::pixels::PixelBuffer;
    pub use crate::scene::{AssembledScene, Material, Surface, assemble};
    pub use crate::texture::{TextureCache, decode_texture};

    pub use crate::batch::{BatchResult, batch_convert_textures, find_texture_files};
    pub use crate::converter::{convert_texture_to_png, encode_png};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
