//! Reference-counted texture cache
//!
//! Each path is decoded at most once while it is held. Holders call
//! [`TextureCache::release`] when done; the entry is evicted when its count
//! reaches zero. Decode failures are logged and reported as `None`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::decode_texture;
use crate::config::TextureOptions;
use crate::formats::b3d::{TextureFlags, TextureRef};
use crate::formats::pixels::PixelBuffer;

/// Shared handle to a decoded texture.
pub type CachedTexture = Arc<PixelBuffer>;

/// Masked and unmasked decodes of one file are separate entries.
type CacheKey = (PathBuf, bool);

#[derive(Debug)]
struct Entry {
    image: CachedTexture,
    refs: usize,
}

/// Decoded textures keyed by path.
#[derive(Debug, Default)]
pub struct TextureCache {
    options: TextureOptions,
    entries: HashMap<CacheKey, Entry>,
}

impl TextureCache {
    #[must_use]
    pub fn new(options: TextureOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
        }
    }

    /// Decode `path` (or reuse the cached decode) and take a reference.
    pub fn acquire<P: AsRef<Path>>(&mut self, path: P) -> Option<CachedTexture> {
        self.acquire_with(path.as_ref(), false)
    }

    /// Resolve a model texture against `dir` and take a reference.
    ///
    /// Textures flagged [`TextureFlags::MASKED`] have black pixels made
    /// transparent unless masking is disabled in the options.
    pub fn acquire_texture<P: AsRef<Path>>(
        &mut self,
        dir: P,
        texture: &TextureRef,
    ) -> Option<CachedTexture> {
        let masked = self.wants_mask(texture);
        self.acquire_with(&dir.as_ref().join(texture.file_name()), masked)
    }

    fn wants_mask(&self, texture: &TextureRef) -> bool {
        self.options.apply_masks && texture.flags.contains(TextureFlags::MASKED)
    }

    fn acquire_with(&mut self, path: &Path, masked: bool) -> Option<CachedTexture> {
        let key = (path.to_path_buf(), masked);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.refs += 1;
            return Some(Arc::clone(&entry.image));
        }

        let mut image = match decode_texture(path) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!("Failed to load texture {}: {err}", path.display());
                return None;
            }
        };
        if masked {
            let count = image.apply_black_mask();
            tracing::debug!("Masked {count} black pixels in {}", path.display());
        }

        let image = Arc::new(image);
        self.entries.insert(
            key,
            Entry {
                image: Arc::clone(&image),
                refs: 1,
            },
        );
        Some(image)
    }

    /// Drop one reference to `path`. Returns true when the entry was
    /// evicted.
    pub fn release<P: AsRef<Path>>(&mut self, path: P) -> bool {
        self.release_with(path.as_ref(), false)
    }

    /// Drop one reference taken with [`Self::acquire_texture`].
    pub fn release_texture<P: AsRef<Path>>(&mut self, dir: P, texture: &TextureRef) -> bool {
        let masked = self.wants_mask(texture);
        self.release_with(&dir.as_ref().join(texture.file_name()), masked)
    }

    fn release_with(&mut self, path: &Path, masked: bool) -> bool {
        let key = (path.to_path_buf(), masked);
        let Some(entry) = self.entries.get_mut(&key) else {
            tracing::debug!("Release of uncached texture {}", path.display());
            return false;
        };
        entry.refs -= 1;
        if entry.refs == 0 {
            self.entries.remove(&key);
            true
        } else {
            false
        }
    }

    /// References held on `path`, masked and unmasked combined.
    #[must_use]
    pub fn ref_count<P: AsRef<Path>>(&self, path: P) -> usize {
        let path = path.as_ref();
        [false, true]
            .into_iter()
            .filter_map(|masked| self.entries.get(&(path.to_path_buf(), masked)))
            .map(|entry| entry.refs)
            .sum()
    }

    /// Number of cached decodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry regardless of its count.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::b3d::BlendMode;
    use glam::Vec2;
    use std::fs;

    /// 2x1 24-bit bitmap: black then white.
    fn write_bitmap(path: &Path) {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&62u32.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0; 24]);
        data.extend_from_slice(&[0, 0, 0, 255, 255, 255, 0, 0]);
        fs::write(path, data).unwrap();
    }

    fn texture_ref(name: &str, flags: TextureFlags) -> TextureRef {
        TextureRef {
            name: name.to_string(),
            flags,
            blend: BlendMode::Multiply,
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_acquire_decodes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.bmp");
        write_bitmap(&path);

        let mut cache = TextureCache::default();
        let first = cache.acquire(&path).unwrap();
        let second = cache.acquire(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ref_count(&path), 2);

        assert!(!cache.release(&path));
        assert!(cache.release(&path));
        assert!(cache.is_empty());
        assert!(!cache.release(&path));
    }

    #[test]
    fn test_masked_textures() {
        let dir = tempfile::tempdir().unwrap();
        write_bitmap(&dir.path().join("leaf.bmp"));
        let masked = texture_ref("maps\\leaf.bmp", TextureFlags::COLOR | TextureFlags::MASKED);

        let mut cache = TextureCache::new(TextureOptions::default());
        let image = cache.acquire_texture(dir.path(), &masked).unwrap();
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(image.pixel(1, 0), Some([255, 255, 255, 255]));

        let plain = cache.acquire(dir.path().join("leaf.bmp")).unwrap();
        assert_eq!(plain.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.ref_count(dir.path().join("leaf.bmp")), 2);

        assert!(cache.release_texture(dir.path(), &masked));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_masking_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_bitmap(&dir.path().join("leaf.bmp"));
        let masked = texture_ref("leaf.bmp", TextureFlags::MASKED);

        let mut cache = TextureCache::new(TextureOptions { apply_masks: false });
        let image = cache.acquire_texture(dir.path(), &masked).unwrap();
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = TextureCache::default();
        assert!(cache.acquire(dir.path().join("missing.dds")).is_none());
        assert!(cache.is_empty());

        fs::write(dir.path().join("bad.bmp"), b"XX").unwrap();
        assert!(cache.acquire(dir.path().join("bad.bmp")).is_none());
        assert_eq!(cache.ref_count(dir.path().join("bad.bmp")), 0);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.bmp");
        write_bitmap(&path);
        let mut cache = TextureCache::default();
        cache.acquire(&path).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
