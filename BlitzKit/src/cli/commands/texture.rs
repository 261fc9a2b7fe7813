//! CLI commands for texture operations

use std::path::Path;
use std::time::Instant;

use crate::batch::{batch_convert_textures, find_texture_files};
use crate::cli::progress::{
    DISK, GEAR, LOOKING_GLASS, PICTURE, TRUCK, print_done, print_step, simple_bar,
};
use crate::converter::{ImagePhase, convert_texture_to_png_with_progress, encode_png};
use crate::texture::{decode_texture, inspect_texture};

/// Show info about a texture file
pub fn info(path: &Path) -> anyhow::Result<()> {
    let info = inspect_texture(path)?;

    println!("{PICTURE}Texture Information: {}", path.display());
    println!();
    println!("Kind: {:?}", info.kind);
    println!("Format: {}", info.format);
    println!("Dimensions: {}x{}", info.width, info.height);
    println!("Transparency: {}", if info.has_transparency { "yes" } else { "no" });

    Ok(())
}

/// Convert a texture to PNG, optionally masking near-black pixels
pub fn convert(input: &Path, output: &Path, mask: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    if mask {
        print_step(1, 3, LOOKING_GLASS, "Decoding texture...");
        let mut image = decode_texture(input)?;
        print_step(2, 3, GEAR, "Masking black pixels...");
        let masked = image.apply_black_mask();
        print_step(3, 3, DISK, &format!("Writing PNG ({masked} pixels masked)..."));
        std::fs::write(output, encode_png(&image)?)?;
    } else {
        convert_texture_to_png_with_progress(input, output, &|progress| {
            let emoji = match progress.phase {
                ImagePhase::ReadingFile => LOOKING_GLASS,
                ImagePhase::WritingFile => DISK,
                ImagePhase::Decoding | ImagePhase::Encoding | ImagePhase::Complete => GEAR,
            };
            if progress.phase != ImagePhase::Complete {
                print_step(
                    progress.current,
                    progress.total,
                    emoji,
                    progress.phase.as_str(),
                );
            }
        })?;
    }

    print_done(started.elapsed());
    Ok(())
}

/// Convert every BMP and DDS under `dir` to PNG
pub fn batch(dir: &Path, output: &Path, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    let files = find_texture_files(dir);
    if files.is_empty() {
        println!("No BMP or DDS files found in {}", dir.display());
        return Ok(());
    }
    println!("{TRUCK}Converting {} textures", files.len());

    let bar = simple_bar(files.len() as u64, "Converting");
    if quiet {
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let result = batch_convert_textures(&files, dir, output, |progress| {
        bar.set_position(progress.current as u64);
        if let Some(file) = &progress.current_file {
            bar.set_message(file.clone());
        }
    });
    bar.finish_and_clear();

    for message in result.results.iter().filter(|m| m.starts_with("Failed")) {
        println!("  {message}");
    }
    println!(
        "Converted {} textures, {} failed",
        result.success_count, result.fail_count
    );
    print_done(started.elapsed());

    if result.fail_count > 0 {
        anyhow::bail!("{} textures failed to convert", result.fail_count);
    }
    Ok(())
}
