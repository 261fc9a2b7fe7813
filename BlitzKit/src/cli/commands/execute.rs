//! Command execution implementations

use super::Commands;
use super::definitions::{ModelCommands, TextureCommands};
use super::{model, texture};
use crate::config::Config;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            Commands::Model { command } => command.execute(config),
            Commands::Texture { command } => command.execute(config),
        }
    }
}

impl ModelCommands {
    /// Execute a model command.
    ///
    /// # Errors
    /// Returns an error if the model cannot be read or the output written.
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            ModelCommands::Inspect { path, assemble } => {
                model::inspect(path, &config.model, *assemble)
            }
            ModelCommands::Json { path, output } => model::export_json(path, output, &config.model),
        }
    }
}

impl TextureCommands {
    /// Execute a texture command.
    ///
    /// # Errors
    /// Returns an error if a texture cannot be read, decoded or written.
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            TextureCommands::Info { path } => texture::info(path),
            TextureCommands::Convert {
                input,
                output,
                mask,
            } => texture::convert(input, output, *mask && config.texture.apply_masks),
            TextureCommands::Batch { dir, output, quiet } => texture::batch(dir, output, *quiet),
        }
    }
}
