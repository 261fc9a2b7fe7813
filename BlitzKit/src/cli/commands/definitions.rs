//! Subcommand enum definitions for CLI

use clap::Subcommand;
use std::path::PathBuf;

/// B3D model commands
#[derive(Subcommand)]
pub enum ModelCommands {
    /// Print the node tree, meshes, brushes and textures of a model
    Inspect {
        /// B3D file to inspect
        path: PathBuf,

        /// Also assemble surfaces, skeletons and the animation clip
        #[arg(short, long)]
        assemble: bool,
    },

    /// Write the model summary as JSON
    Json {
        /// B3D file to read
        path: PathBuf,

        /// Output JSON file
        output: PathBuf,
    },
}

/// Texture commands
#[derive(Subcommand)]
pub enum TextureCommands {
    /// Show format, size and transparency of a texture
    Info {
        /// BMP, DDS or other image file
        path: PathBuf,
    },

    /// Convert a texture to PNG
    Convert {
        /// Input texture
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// Make near-black pixels transparent (unless disabled in the config)
        #[arg(short, long)]
        mask: bool,
    },

    /// Convert every BMP and DDS under a directory to PNG
    Batch {
        /// Directory to search recursively
        dir: PathBuf,

        /// Output directory (mirrors the source layout)
        output: PathBuf,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}
