//! Event-driven editing controller over one [`EditSession`].

mod commands;
mod pointer;
pub mod session;
pub mod tools;

use thiserror::Error;

use crate::config::EditorConfig;
use crate::geometry::ToolPoint;
use crate::pixels::{Filter, PixelBuffer, PixelError, Rotation};
use crate::render::{self, Decoration, RenderedFrame, SelectionFlow, StrokePreview};
use crate::selection::{SelectionError, SnipPhase};
use crate::storage::{self, ExportArtifact, StorageError};

pub use session::{DestructiveOp, Document, EditSession, Gesture};
pub use tools::{ArmedPayload, ToolKind, ToolOptionPanels, ToolSettings};

const MSG_LOAD_FIRST: &str = "Load an image first.";
const MSG_FINISH_FIRST: &str = "Finish action first.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("input rejected: {0}")]
    InputRejected(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("operation failed: {0}")]
    OperationFailure(String),
}

pub type EditorResult<T> = std::result::Result<T, EditorError>;

impl EditorError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::InputRejected(message)
            | Self::PreconditionFailed(message)
            | Self::InvalidSelection(message)
            | Self::OperationFailure(message) => message,
        }
    }

    fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

impl From<SelectionError> for EditorError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::InvalidTransition { flow, .. } => {
                Self::PreconditionFailed(format!("That {flow} step is not available right now."))
            }
            SelectionError::InvalidSelection { flow } => {
                Self::InvalidSelection(format!("Invalid {flow} area. Drag to select first."))
            }
            SelectionError::GestureOpen => Self::precondition(MSG_FINISH_FIRST),
            SelectionError::OtherFlowActive { active } => {
                Self::PreconditionFailed(format!("Finish or cancel the {active} selection first."))
            }
            SelectionError::MissingRegion => {
                Self::OperationFailure("Area 1 is no longer available.".to_string())
            }
            SelectionError::Pixel(err) => err.into(),
        }
    }
}

impl From<PixelError> for EditorError {
    fn from(err: PixelError) -> Self {
        Self::OperationFailure(format!("Pixel access failed: {err}"))
    }
}

impl From<StorageError> for EditorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedMediaType(_) => {
                Self::InputRejected("Please select a valid image file.".to_string())
            }
            StorageError::Decode(_) | StorageError::EmptyImage => Self::InputRejected(
                "Error loading image data. File might be corrupt.".to_string(),
            ),
            StorageError::EmptyCanvas => Self::precondition("Canvas is empty."),
            StorageError::Encode(err) => Self::OperationFailure(format!("Download failed: {err}")),
            StorageError::Io(err) => Self::OperationFailure(format!("Download failed: {err}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    SelectTool(ToolKind),
    ConfirmCrop,
    CancelCrop,
    StartSnip,
    ConfirmSnip1,
    StartSnip2,
    ConfirmSnip2,
    CancelSnip,
    ArmText(String),
    ArmBubble(String),
    ApplyFilter(Filter),
    Rotate(Rotation),
    Undo,
    Revert,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    PointerDown(ToolPoint),
    PointerMove(ToolPoint),
    PointerUp(ToolPoint),
    PointerLeave,
    Command(EditorCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    /// Nothing changed; no redraw needed.
    Unchanged,
    /// Transient state changed; redraw.
    Redraw,
    /// The pixel buffer was rewritten and a history entry recorded.
    Committed(DestructiveOp),
}

/// Which command-surface entries are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandAvailability {
    pub tools: bool,
    pub confirm_crop: bool,
    pub cancel_crop: bool,
    pub confirm_snip1: bool,
    pub start_snip2: bool,
    pub confirm_snip2: bool,
    pub cancel_snip: bool,
    pub arm_text: bool,
    pub arm_bubble: bool,
    pub filters: bool,
    pub rotate: bool,
    pub undo: bool,
    pub revert: bool,
    pub download: bool,
    /// Option inputs to show for the active tool.
    pub options: ToolOptionPanels,
}

#[derive(Debug, Clone, Default)]
pub struct EditorController {
    session: EditSession,
    notice: Option<String>,
}

impl EditorController {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            session: EditSession::new(config),
            notice: None,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.session.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.session.settings
    }

    /// Decodes an image and starts a fresh session on it. On failure the
    /// session is left unloaded.
    pub fn load_image(&mut self, bytes: &[u8], mime: &str, name: Option<&str>) -> EditorResult<()> {
        self.notice = None;
        match storage::decode_image(bytes, mime) {
            Ok(buffer) => {
                self.load_buffer(buffer, name);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, mime, "image load rejected");
                self.session.unload();
                let err = EditorError::from(err);
                self.notice = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    pub fn load_buffer(&mut self, buffer: PixelBuffer, name: Option<&str>) {
        tracing::info!(
            width = buffer.width(),
            height = buffer.height(),
            name = name.unwrap_or("<unnamed>"),
            "loaded image"
        );
        self.session.replace_document(buffer, name.map(str::to_string));
        self.notice = None;
    }

    pub fn handle_event(&mut self, event: EditorEvent) -> EditorResult<EditorOutcome> {
        self.notice = None;
        let result = match event {
            EditorEvent::PointerDown(point) => self.pointer_down(point),
            EditorEvent::PointerMove(point) => self.pointer_move(point),
            EditorEvent::PointerUp(point) => self.pointer_up(point),
            EditorEvent::PointerLeave => self.pointer_leave(),
            EditorEvent::Command(command) => self.run_command(command),
        };
        if let Err(err) = &result {
            tracing::warn!(%err, tool = self.session.tool.label(), "editor event rejected");
            self.notice = Some(err.user_message().to_string());
        }
        result
    }

    /// Interactive view: buffer, objects, and any selection decoration.
    pub fn render(&self) -> RenderedFrame {
        let session = &self.session;
        let selection = session.buffer().map(PixelBuffer::bounds).and_then(|bounds| {
            match session.tool {
                ToolKind::Crop => session
                    .selection
                    .crop
                    .working_rect(bounds)
                    .map(|rect| (SelectionFlow::Crop, rect)),
                ToolKind::Snip => session
                    .selection
                    .snip
                    .working_rect(bounds)
                    .map(|rect| (SelectionFlow::Snip, rect)),
                _ => None,
            }
        });
        let stroke = match &session.gesture {
            Gesture::Stroke(points) => Some(StrokePreview {
                points,
                color: session.settings.stroke_color,
                width: session.settings.stroke_width(),
            }),
            _ => None,
        };
        let decoration = Decoration {
            selection,
            stroke,
            object_outline: true,
        };
        render::composite(session.buffer(), &session.layer, &decoration)
    }

    /// Flattens buffer and objects into a PNG. Refused while anything is in
    /// progress.
    pub fn export(&self) -> EditorResult<ExportArtifact> {
        let document = self
            .session
            .document
            .as_ref()
            .ok_or_else(|| EditorError::precondition(MSG_LOAD_FIRST))?;
        if self.session.gesture.is_open() || self.session.selection.is_open() {
            return Err(EditorError::precondition(MSG_FINISH_FIRST));
        }
        let image = render::flatten(&document.buffer, &self.session.layer);
        let artifact = storage::export_artifact(&image, document.name.as_deref())?;
        tracing::info!(
            file_name = %artifact.file_name,
            width = artifact.width,
            height = artifact.height,
            bytes = artifact.bytes.len(),
            "exported image"
        );
        Ok(artifact)
    }

    pub fn status_message(&self) -> String {
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        let session = &self.session;
        if !session.is_loaded() {
            return "Load an image to begin.".to_string();
        }
        let dragging = session.gesture.is_open();
        let message = match session.tool {
            ToolKind::Select => "Select a tool or apply filters/transforms.",
            ToolKind::Crop if dragging => "Release mouse to finalize selection.",
            ToolKind::Crop => "Crop: Drag to select area, then Confirm.",
            ToolKind::Snip => match session.selection.snip.phase() {
                SnipPhase::Idle => "Snip: Drag to select Area 1.",
                SnipPhase::Selecting1 if dragging => "Release for Area 1.",
                SnipPhase::Selecting1 => "Area 1 selected. Confirm or Cancel.",
                SnipPhase::Selected1 => "Snip: Click Select Area 2.",
                SnipPhase::Selecting2 if dragging => "Release for Area 2.",
                SnipPhase::Selecting2 => "Area 2 selected. Confirm or Cancel.",
                SnipPhase::Swapped => "Snip: Areas swapped! Cancel to reset.",
            },
            ToolKind::Draw => "Draw: Click and drag to draw.",
            ToolKind::Text if session.armed.is_some() => "Text: Click image to place.",
            ToolKind::Text => "Text: Configure, type, click Add.",
            ToolKind::Bubble if session.armed.is_some() => "Bubble: Click image to place.",
            ToolKind::Bubble => "Bubble: Configure, type, click Add.",
        };
        message.to_string()
    }

    pub fn command_availability(&self) -> CommandAvailability {
        let session = &self.session;
        let Some(buffer) = session.buffer() else {
            return CommandAvailability::default();
        };
        let bounds = buffer.bounds();
        let dragging = session.gesture.is_open();
        let tool = session.tool;
        let snip = &session.selection.snip;
        let snip_rect_ready = !dragging && snip.pending_rect().is_some_and(|r| r.fits_within(bounds));

        CommandAvailability {
            tools: true,
            confirm_crop: tool == ToolKind::Crop
                && !dragging
                && session.selection.crop.ready_rect().is_some(),
            cancel_crop: tool == ToolKind::Crop,
            confirm_snip1: tool == ToolKind::Snip
                && snip.phase() == SnipPhase::Selecting1
                && snip_rect_ready,
            start_snip2: tool == ToolKind::Snip && snip.phase() == SnipPhase::Selected1,
            confirm_snip2: tool == ToolKind::Snip
                && snip.phase() == SnipPhase::Selecting2
                && snip_rect_ready,
            cancel_snip: tool == ToolKind::Snip && snip.phase() != SnipPhase::Idle,
            arm_text: tool == ToolKind::Text,
            arm_bubble: tool == ToolKind::Bubble,
            filters: !dragging && !session.selection.is_open(),
            rotate: !dragging,
            undo: !dragging && !session.history.is_empty(),
            revert: !dragging,
            download: !dragging && !session.selection.is_open(),
            options: tool.option_panels(),
        }
    }

    fn require_loaded(&self) -> EditorResult<()> {
        if self.session.is_loaded() {
            Ok(())
        } else {
            Err(EditorError::precondition(MSG_LOAD_FIRST))
        }
    }

    fn require_idle_pointer(&self) -> EditorResult<()> {
        if self.session.gesture.is_open() {
            Err(EditorError::precondition(MSG_FINISH_FIRST))
        } else {
            Ok(())
        }
    }

    fn require_tool(&self, tool: ToolKind) -> EditorResult<()> {
        if self.session.tool == tool {
            Ok(())
        } else {
            Err(EditorError::PreconditionFailed(format!(
                "Switch to the {} tool first.",
                tool.label()
            )))
        }
    }

    /// Runs `apply` and records the pre-op buffer once it succeeds, then drops
    /// whatever the op invalidates. A failed op leaves history untouched and
    /// puts the pre-op buffer back.
    fn commit(
        &mut self,
        op: DestructiveOp,
        apply: impl FnOnce(&mut EditSession) -> EditorResult<()>,
    ) -> EditorResult<EditorOutcome> {
        let snapshot = self
            .session
            .buffer()
            .map(PixelBuffer::snapshot)
            .ok_or_else(|| EditorError::precondition(MSG_LOAD_FIRST))?;

        if let Err(err) = apply(&mut self.session) {
            self.recover(op, snapshot);
            return Err(err);
        }

        self.session.history.push(snapshot);
        self.session.invalidate_after(op);
        if let Some(buffer) = self.session.buffer() {
            tracing::info!(
                op = op.label(),
                width = buffer.width(),
                height = buffer.height(),
                history = self.session.history.len(),
                "committed destructive operation"
            );
        }
        Ok(EditorOutcome::Committed(op))
    }

    fn recover(&mut self, op: DestructiveOp, previous: PixelBuffer) {
        if let Some(document) = self.session.document.as_mut() {
            document.buffer = previous;
        }
        if op == DestructiveOp::Swap {
            // A half-written swap is never trusted: put area 1 back and start over.
            let buffer = self.session.document.as_mut().map(|d| &mut d.buffer);
            if let Err(err) = self.session.selection.snip.cancel(buffer) {
                tracing::warn!(%err, "could not restore area 1 after failed swap");
                self.session.selection.snip.reset();
            }
            self.session.selection.abort_all();
            self.session.layer.clear();
            self.session.gesture = Gesture::Idle;
        }
        tracing::warn!(op = op.label(), "operation failed; restored last good buffer");
    }
}

fn document_mut(document: &mut Option<Document>) -> EditorResult<&mut Document> {
    document
        .as_mut()
        .ok_or_else(|| EditorError::precondition(MSG_LOAD_FIRST))
}
