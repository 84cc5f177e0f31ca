pub mod batch;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod pixels;
pub mod render;
pub mod scene;
pub mod selection;
pub mod storage;

use std::path::{Path, PathBuf};

pub use batch::{EditOp, EditOpParseError};
pub use config::EditorConfig;
pub use editor::{
    CommandAvailability, EditorCommand, EditorController, EditorError, EditorEvent, EditorOutcome,
    ToolKind,
};
pub use error::{AppError, AppResult};
pub use geometry::{Color, Rect, ToolPoint};
pub use pixels::{Filter, PixelBuffer, Rotation};

use storage::{ExportTarget, FileExportTarget};

/// Loads `input`, applies `ops` in order, and writes the flattened PNG to
/// `output`.
pub fn edit_file(
    input: &Path,
    output: &Path,
    ops: &[EditOp],
    config: &EditorConfig,
) -> AppResult<PathBuf> {
    let (bytes, mime, name) = storage::read_image_file(input)?;
    let mut controller = EditorController::new(config);
    controller.load_image(&bytes, mime, name.as_deref())?;

    for op in ops {
        tracing::debug!(?op, "applying operation");
        op.apply(&mut controller)?;
    }

    let artifact = controller.export()?;
    let path = FileExportTarget::with_path(output.to_path_buf()).write_export(&artifact)?;
    tracing::info!(path = %path.display(), ops = ops.len(), "edit complete");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let buffer = PixelBuffer::filled(width, height, Color::new(200, 100, 50)).expect("valid size");
        let bytes = storage::encode_png(buffer.as_image()).expect("encode");
        std::fs::write(path, bytes).expect("write input");
    }

    #[test]
    fn edit_file_applies_ops_and_writes_png() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("photo.png");
        let output = dir.path().join("out").join("result.png");
        write_png(&input, 40, 24);

        let ops: Vec<EditOp> = ["rotate-right", "invert", "text:0,0:A"]
            .iter()
            .map(|op| op.parse().expect("valid op"))
            .collect();
        let written = edit_file(&input, &output, &ops, &EditorConfig::default()).expect("edit succeeds");
        assert_eq!(written, output);

        let (bytes, mime, _) = storage::read_image_file(&output).expect("read output");
        let result = storage::decode_image(&bytes, mime).expect("decode output");
        assert_eq!((result.width(), result.height()), (24, 40));
        // Below the 30px text cell, so only the inverted base shows.
        assert_eq!(result.pixel(23, 39), Some([55, 155, 205, 255]));
    }

    #[test]
    fn edit_file_rejects_non_image_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"hello").expect("write input");

        let err = edit_file(&input, &dir.path().join("out.png"), &[], &EditorConfig::default())
            .expect_err("text file is not an image");
        assert!(matches!(err, AppError::Editor(EditorError::InputRejected(_))));
    }

    #[test]
    fn edit_file_surfaces_missing_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = edit_file(
            &dir.path().join("missing.png"),
            &dir.path().join("out.png"),
            &[],
            &EditorConfig::default(),
        )
        .expect_err("input does not exist");
        assert!(matches!(err, AppError::Storage(_)));
    }
}
