use crate::config::EditorConfig;
use crate::geometry::ToolPoint;
use crate::history::HistoryStack;
use crate::pixels::{Filter, PixelBuffer, Rotation};
use crate::scene::{BubbleLayout, ObjectDrag, SceneLayout, SceneObjectLayer};
use crate::selection::SelectionProtocol;

use super::tools::{ArmedPayload, ToolKind, ToolSettings};

/// The loaded image: the working buffer plus the pristine original for revert.
#[derive(Debug, Clone)]
pub struct Document {
    pub buffer: PixelBuffer,
    pub original: PixelBuffer,
    pub name: Option<String>,
}

/// The single pointer gesture that may be open.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Selection,
    Stroke(Vec<ToolPoint>),
    Object(ObjectDrag),
}

impl Gesture {
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Every operation that rewrites the pixel buffer and is undoable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructiveOp {
    Filter(Filter),
    Rotate(Rotation),
    Crop,
    Swap,
    Stroke,
    Revert,
}

impl DestructiveOp {
    /// Whether object coordinates stop making sense after the op.
    pub const fn invalidates_overlay(self) -> bool {
        match self {
            Self::Rotate(_) | Self::Crop | Self::Swap | Self::Revert => true,
            Self::Filter(_) | Self::Stroke => false,
        }
    }

    /// Whether crop and snip state must be dropped. A swap keeps its own
    /// flow in `Swapped`.
    pub const fn resets_selection(self) -> bool {
        matches!(self, Self::Rotate(_) | Self::Crop | Self::Revert)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Filter(filter) => filter.label(),
            Self::Rotate(Rotation::Clockwise) => "rotate-right",
            Self::Rotate(Rotation::CounterClockwise) => "rotate-left",
            Self::Crop => "crop",
            Self::Swap => "swap",
            Self::Stroke => "draw",
            Self::Revert => "revert",
        }
    }
}

/// Aggregate root of one editing session.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub(crate) document: Option<Document>,
    pub(crate) layer: SceneObjectLayer,
    pub(crate) selection: SelectionProtocol,
    pub(crate) history: HistoryStack,
    pub(crate) tool: ToolKind,
    pub(crate) settings: ToolSettings,
    pub(crate) armed: Option<ArmedPayload>,
    pub(crate) gesture: Gesture,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EditSession {
    pub fn new(config: &EditorConfig) -> Self {
        let layout = SceneLayout {
            handle_size: config.handle_size.max(1),
            min_font_size: config.min_font_size.max(1.0),
            bubble: BubbleLayout {
                padding: config.bubble_padding,
                tail_height: config.bubble_tail_height,
                tail_width: config.bubble_tail_width,
            },
        };
        Self {
            document: None,
            layer: SceneObjectLayer::new(layout),
            selection: SelectionProtocol::default(),
            history: HistoryStack::new(config.history_capacity),
            tool: ToolKind::Select,
            settings: ToolSettings::from_config(config),
            armed: None,
            gesture: Gesture::Idle,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.document.as_ref().map(|document| &document.buffer)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn layer(&self) -> &SceneObjectLayer {
        &self.layer
    }

    pub fn selection(&self) -> &SelectionProtocol {
        &self.selection
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn armed(&self) -> Option<&ArmedPayload> {
        self.armed.as_ref()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Starts over on `buffer`, discarding every piece of per-image state.
    pub(crate) fn replace_document(&mut self, buffer: PixelBuffer, name: Option<String>) {
        let original = buffer.snapshot();
        self.document = Some(Document {
            buffer,
            original,
            name,
        });
        self.reset_transients();
        self.history.clear();
    }

    pub(crate) fn unload(&mut self) {
        self.document = None;
        self.reset_transients();
        self.history.clear();
    }

    fn reset_transients(&mut self) {
        self.layer.clear();
        self.selection.abort_all();
        self.tool = ToolKind::Select;
        self.armed = None;
        self.gesture = Gesture::Idle;
    }

    /// Clears whatever `op` left positioned in stale buffer coordinates.
    pub(crate) fn invalidate_after(&mut self, op: DestructiveOp) {
        if op.invalidates_overlay() {
            self.layer.clear();
        }
        if op.resets_selection() {
            self.selection.abort_all();
            if matches!(self.gesture, Gesture::Selection) {
                self.gesture = Gesture::Idle;
            }
        }
    }
}
