//! Decoded textures to PNG

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use super::types::{ImagePhase, ImageProgress, ImageProgressCallback};
use crate::error::Result;
use crate::formats::pixels::PixelBuffer;
use crate::texture::{decode_texture_bytes, texture_kind};

/// Encode RGBA8 pixels as a PNG file image.
///
/// # Errors
/// Returns [`crate::Error::Image`] if encoding fails.
pub fn encode_png(image: &PixelBuffer) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        &image.pixels,
        image.width,
        image.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png)
}

/// Decode the texture at `source` and write it to `dest` as PNG.
///
/// # Errors
/// Returns an error if the source cannot be read or decoded, or the PNG
/// cannot be written.
pub fn convert_texture_to_png<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Result<()> {
    convert_texture_to_png_with_progress(source, dest, &|_| {})
}

/// [`convert_texture_to_png`] reporting each phase.
///
/// # Errors
/// Same as [`convert_texture_to_png`].
pub fn convert_texture_to_png_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    progress: ImageProgressCallback,
) -> Result<()> {
    let source = source.as_ref();
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let step = |phase, current| progress(&ImageProgress::with_file(phase, current, 4, &name));

    step(ImagePhase::ReadingFile, 1);
    let data = fs::read(source)?;

    step(ImagePhase::Decoding, 2);
    let image = decode_texture_bytes(&data, texture_kind(source))?;

    step(ImagePhase::Encoding, 3);
    let png = encode_png(&image)?;

    step(ImagePhase::WritingFile, 4);
    let mut output = BufWriter::new(File::create(dest.as_ref())?);
    output.write_all(&png)?;
    output.flush()?;

    progress(&ImageProgress::new(ImagePhase::Complete, 4, 4));
    tracing::debug!(
        "Wrote {}x{} PNG to {}",
        image.width,
        image.height,
        dest.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::dds::fixtures::dds_fourcc;
    use std::sync::Mutex;

    #[test]
    fn test_encode_png_decodes_back() {
        let mut image = PixelBuffer::new(2, 2);
        image.set_pixel(1, 0, [255, 0, 0, 128]);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn test_convert_dds_with_progress() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("rock.dds");
        let dest = dir.path().join("rock.png");
        fs::write(&source, dds_fourcc(4, 4, b"DXT1", &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0])).unwrap();

        let phases = Mutex::new(Vec::new());
        convert_texture_to_png_with_progress(&source, &dest, &|p| {
            phases.lock().unwrap().push(p.phase);
        })
        .unwrap();

        assert_eq!(
            phases.into_inner().unwrap(),
            vec![
                ImagePhase::ReadingFile,
                ImagePhase::Decoding,
                ImagePhase::Encoding,
                ImagePhase::WritingFile,
                ImagePhase::Complete,
            ]
        );
        let written = image::open(&dest).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (4, 4));
        assert_eq!(written.get_pixel(3, 3).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(convert_texture_to_png(dir.path().join("none.bmp"), dir.path().join("o.png")).is_err());
    }
}
