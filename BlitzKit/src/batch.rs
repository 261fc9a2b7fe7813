//! Batch texture conversion
//!
//! Finds BMP and DDS textures under a directory and converts them to PNG
//! in parallel, mirroring the source layout in the destination.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::converter::{ImagePhase, ImageProgress, convert_texture_to_png};

/// Extensions picked up by [`find_texture_files`].
pub const TEXTURE_EXTENSIONS: [&str; 2] = ["bmp", "dds"];

/// Result of a batch conversion.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// One message per file, in input order.
    pub results: Vec<String>,
}

/// Find all BMP and DDS files under `dir`, sorted.
pub fn find_texture_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    TEXTURE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Convert `files` to PNG under `dest_base`.
///
/// Each output keeps its path relative to `source_base` with a `.png`
/// extension. Failures are counted and reported, never fatal.
pub fn batch_convert_textures<F>(
    files: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    progress: F,
) -> BatchResult
where
    F: Fn(&ImageProgress) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let results: Vec<String> = files
        .par_iter()
        .map(|source| {
            let relative = source.strip_prefix(source_base).unwrap_or(source.as_path());
            let display_path = relative.to_string_lossy();

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ImageProgress::with_file(
                ImagePhase::Decoding,
                current,
                total,
                display_path.to_string(),
            ));

            let dest = dest_base.join(relative).with_extension("png");
            let parent = dest.parent().unwrap_or(dest_base);
            if let Err(e) = std::fs::create_dir_all(parent) {
                fail_counter.fetch_add(1, Ordering::SeqCst);
                return format!("Failed to create folder for {display_path}: {e}");
            }

            match convert_texture_to_png(source, &dest) {
                Ok(()) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Converted: {display_path}")
                }
                Err(e) => {
                    tracing::warn!("Failed to convert {display_path}: {e}");
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Failed {display_path}: {e}")
                }
            }
        })
        .collect();

    BatchResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}
