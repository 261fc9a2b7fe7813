//! CLI subcommands

mod definitions;
mod execute;
pub mod model;
pub mod texture;

use clap::Subcommand;

pub use definitions::{ModelCommands, TextureCommands};

#[derive(Subcommand)]
pub enum Commands {
    /// B3D model operations
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    /// Texture operations (BMP/DDS decoding, PNG export)
    Texture {
        #[command(subcommand)]
        command: TextureCommands,
    },
}
