use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, RgbaImage};
use thiserror::Error;

use crate::pixels::PixelBuffer;

const EXPORT_PREFIX: &str = "edited-";
const EXPORT_FALLBACK_STEM: &str = "image";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported media type {0:?}; expected an image/* file")]
    UnsupportedMediaType(String),
    #[error("failed to decode image: {0}")]
    Decode(#[source] ImageError),
    #[error("decoded image has no pixels")]
    EmptyImage,
    #[error("failed to encode png: {0}")]
    Encode(#[source] ImageError),
    #[error("canvas is empty")]
    EmptyCanvas,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Flattened PNG ready to hand to a download or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

pub trait ExportTarget {
    fn write_export(&self, artifact: &ExportArtifact) -> StorageResult<PathBuf>;
}

/// Writes exports into a directory under their suggested file name.
#[derive(Debug, Clone)]
pub struct DirectoryExportTarget {
    dir: PathBuf,
}

impl DirectoryExportTarget {
    pub const fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

impl ExportTarget for DirectoryExportTarget {
    fn write_export(&self, artifact: &ExportArtifact) -> StorageResult<PathBuf> {
        let target = self.target_path(&artifact.file_name);
        save_overwrite(&artifact.bytes, &target)?;
        Ok(target)
    }
}

/// Writes exports to one fixed path regardless of the suggested name.
#[derive(Debug, Clone)]
pub struct FileExportTarget {
    path: PathBuf,
}

impl FileExportTarget {
    pub const fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ExportTarget for FileExportTarget {
    fn write_export(&self, artifact: &ExportArtifact) -> StorageResult<PathBuf> {
        save_overwrite(&artifact.bytes, &self.path)?;
        Ok(self.path.clone())
    }
}

pub fn ensure_image_mime(mime: &str) -> StorageResult<()> {
    if mime.trim().to_ascii_lowercase().starts_with("image/") {
        Ok(())
    } else {
        Err(StorageError::UnsupportedMediaType(mime.to_string()))
    }
}

/// Validates the media type, then decodes `bytes` into an RGBA buffer at the
/// image's natural size.
pub fn decode_image(bytes: &[u8], mime: &str) -> StorageResult<PixelBuffer> {
    ensure_image_mime(mime)?;
    let decoded = image::load_from_memory(bytes).map_err(StorageError::Decode)?;
    PixelBuffer::from_image(decoded.to_rgba8()).map_err(|_| StorageError::EmptyImage)
}

pub fn encode_png(image: &RgbaImage) -> StorageResult<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(StorageError::EmptyCanvas);
    }
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(StorageError::Encode)?;
    Ok(bytes)
}

pub fn export_artifact(image: &RgbaImage, source_name: Option<&str>) -> StorageResult<ExportArtifact> {
    let bytes = encode_png(image)?;
    Ok(ExportArtifact {
        file_name: export_file_name(source_name),
        width: image.width(),
        height: image.height(),
        bytes,
    })
}

/// `edited-<stem>.png`, or `edited-image.png` when no usable name exists.
pub fn export_file_name(source_name: Option<&str>) -> String {
    let stem = source_name
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(EXPORT_FALLBACK_STEM);
    format!("{EXPORT_PREFIX}{stem}.png")
}

/// Best-effort media type from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Reads an image file, returning its bytes, media type, and file name.
pub fn read_image_file(path: &Path) -> StorageResult<(Vec<u8>, &'static str, Option<String>)> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    Ok((bytes, mime_for_path(path), name))
}

fn save_overwrite(bytes: &[u8], destination: &Path) -> StorageResult<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    fn sample_png() -> Vec<u8> {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(1, 1, image::Rgba([10, 20, 30, 40]));
        encode_png(&image).expect("encode sample")
    }

    #[test]
    fn non_image_mime_is_rejected_before_decoding() {
        let err = decode_image(&sample_png(), "text/plain").expect_err("text is not an image");
        assert!(matches!(err, StorageError::UnsupportedMediaType(ref mime) if mime == "text/plain"));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not a png", "image/png").expect_err("garbage bytes");
        assert!(matches!(err, StorageError::Decode(_)));
    }

    #[test]
    fn png_round_trip_preserves_alpha() {
        let buffer = decode_image(&sample_png(), "image/png").expect("valid png");
        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert_eq!(buffer.pixel(1, 1), Some([10, 20, 30, 40]));
        assert_eq!(buffer.pixel(0, 0), Some(Color::TRANSPARENT.to_array()));
    }

    #[test]
    fn empty_canvas_cannot_be_encoded() {
        let err = encode_png(&RgbaImage::new(0, 0)).expect_err("nothing to encode");
        assert!(matches!(err, StorageError::EmptyCanvas));
    }

    #[test]
    fn export_name_derives_from_source_stem() {
        assert_eq!(export_file_name(Some("holiday.jpg")), "edited-holiday.png");
        assert_eq!(export_file_name(Some("dir/cat.photo.webp")), "edited-cat.photo.png");
        assert_eq!(export_file_name(None), "edited-image.png");
        assert_eq!(export_file_name(Some("")), "edited-image.png");
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/B.JPEG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
    }

    #[test]
    fn directory_target_writes_under_suggested_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = DirectoryExportTarget::with_dir(dir.path().join("exports"));
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let artifact = export_artifact(&image, Some("shot.png")).expect("export");

        let path = target.write_export(&artifact).expect("write export");
        assert_eq!(path, dir.path().join("exports").join("edited-shot.png"));
        let written = fs::read(&path).expect("read back");
        assert_eq!(written, artifact.bytes);

        let (bytes, mime, name) = read_image_file(&path).expect("read image file");
        assert_eq!(mime, "image/png");
        assert_eq!(name.as_deref(), Some("edited-shot.png"));
        assert_eq!(decode_image(&bytes, mime).expect("decode").pixel(1, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn file_target_overwrites_existing_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.png");
        fs::write(&path, b"stale").expect("seed file");
        let target = FileExportTarget::with_path(path.clone());
        let artifact = ExportArtifact {
            file_name: "ignored.png".to_string(),
            width: 1,
            height: 1,
            bytes: b"fresh".to_vec(),
        };
        assert_eq!(target.write_export(&artifact).expect("write"), path);
        assert_eq!(fs::read(&path).expect("read back"), b"fresh");
    }
}
