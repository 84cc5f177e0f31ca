//! Scripted edits for headless use. Each [`EditOp`] expands into the same
//! pointer and command events an interactive surface would send.

use std::str::FromStr;

use thiserror::Error;

use crate::editor::{EditorCommand, EditorController, EditorEvent, EditorResult, ToolKind};
use crate::geometry::{Rect, ToolPoint};
use crate::pixels::{Filter, Rotation};
use crate::scene::BubbleKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditOpParseError {
    #[error("unknown operation {0:?}")]
    Unknown(String),
    #[error("malformed {op} operation: {reason}")]
    Malformed { op: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Filter(Filter),
    Rotate(Rotation),
    Crop(Rect),
    Swap(Rect, Rect),
    Text { at: ToolPoint, content: String },
    Bubble { at: ToolPoint, kind: BubbleKind, content: String },
    Draw(Vec<ToolPoint>),
    Undo,
    Revert,
}

impl FromStr for EditOp {
    type Err = EditOpParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, rest) = s.split_once(':').unwrap_or((s, ""));
        match name.to_ascii_lowercase().as_str() {
            "grayscale" => Ok(Self::Filter(Filter::Grayscale)),
            "sepia" => Ok(Self::Filter(Filter::Sepia)),
            "invert" => Ok(Self::Filter(Filter::Invert)),
            "rotate-left" => Ok(Self::Rotate(Rotation::CounterClockwise)),
            "rotate-right" => Ok(Self::Rotate(Rotation::Clockwise)),
            "undo" => Ok(Self::Undo),
            "revert" => Ok(Self::Revert),
            "crop" => parse_rect("crop", rest).map(Self::Crop),
            "swap" => {
                let (first, second) = rest
                    .split_once(':')
                    .ok_or_else(|| malformed("swap", "expected X,Y,W,H:X,Y,W,H"))?;
                Ok(Self::Swap(parse_rect("swap", first)?, parse_rect("swap", second)?))
            }
            "text" => {
                let (at, content) = rest
                    .split_once(':')
                    .ok_or_else(|| malformed("text", "expected X,Y:CONTENT"))?;
                Ok(Self::Text {
                    at: parse_point("text", at)?,
                    content: unescape(content),
                })
            }
            "bubble" => {
                let mut parts = rest.splitn(3, ':');
                let (Some(at), Some(kind), Some(content)) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(malformed("bubble", "expected X,Y:speech|thought:CONTENT"));
                };
                Ok(Self::Bubble {
                    at: parse_point("bubble", at)?,
                    kind: kind.parse().map_err(|reason| malformed("bubble", reason))?,
                    content: unescape(content),
                })
            }
            "draw" => {
                let points = rest
                    .split(';')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| parse_point("draw", part))
                    .collect::<Result<Vec<_>, _>>()?;
                if points.len() < 2 {
                    return Err(malformed("draw", "needs at least two points"));
                }
                Ok(Self::Draw(points))
            }
            _ => Err(EditOpParseError::Unknown(s.to_string())),
        }
    }
}

impl EditOp {
    /// Drives `controller` through the events this op stands for. Tools are
    /// switched as needed and the Select tool is active afterwards.
    pub fn apply(&self, controller: &mut EditorController) -> EditorResult<()> {
        match self {
            Self::Filter(filter) => run(controller, EditorCommand::ApplyFilter(*filter))?,
            Self::Rotate(rotation) => run(controller, EditorCommand::Rotate(*rotation))?,
            Self::Undo => run(controller, EditorCommand::Undo)?,
            Self::Revert => run(controller, EditorCommand::Revert)?,
            Self::Crop(rect) => {
                run(controller, EditorCommand::SelectTool(ToolKind::Crop))?;
                drag_rect(controller, *rect)?;
                run(controller, EditorCommand::ConfirmCrop)?;
            }
            Self::Swap(first, second) => {
                run(controller, EditorCommand::SelectTool(ToolKind::Snip))?;
                run(controller, EditorCommand::StartSnip)?;
                drag_rect(controller, *first)?;
                run(controller, EditorCommand::ConfirmSnip1)?;
                run(controller, EditorCommand::StartSnip2)?;
                drag_rect(controller, *second)?;
                run(controller, EditorCommand::ConfirmSnip2)?;
            }
            Self::Text { at, content } => {
                run(controller, EditorCommand::SelectTool(ToolKind::Text))?;
                run(controller, EditorCommand::ArmText(content.clone()))?;
                click(controller, *at)?;
            }
            Self::Bubble { at, kind, content } => {
                run(controller, EditorCommand::SelectTool(ToolKind::Bubble))?;
                controller.settings_mut().bubble_kind = *kind;
                run(controller, EditorCommand::ArmBubble(content.clone()))?;
                click(controller, *at)?;
            }
            Self::Draw(points) => {
                let (Some(first), Some(last)) = (points.first(), points.last()) else {
                    return Ok(());
                };
                run(controller, EditorCommand::SelectTool(ToolKind::Draw))?;
                send(controller, EditorEvent::PointerDown(*first))?;
                for point in &points[1..] {
                    send(controller, EditorEvent::PointerMove(*point))?;
                }
                send(controller, EditorEvent::PointerUp(*last))?;
            }
        }
        run(controller, EditorCommand::SelectTool(ToolKind::Select))
    }
}

fn send(controller: &mut EditorController, event: EditorEvent) -> EditorResult<()> {
    controller.handle_event(event).map(|_| ())
}

fn run(controller: &mut EditorController, command: EditorCommand) -> EditorResult<()> {
    send(controller, EditorEvent::Command(command))
}

fn click(controller: &mut EditorController, at: ToolPoint) -> EditorResult<()> {
    send(controller, EditorEvent::PointerDown(at))?;
    send(controller, EditorEvent::PointerUp(at))
}

fn drag_rect(controller: &mut EditorController, rect: Rect) -> EditorResult<()> {
    let start = canvas_point(rect.x, rect.y);
    let end = canvas_point(rect.right(), rect.bottom());
    send(controller, EditorEvent::PointerDown(start))?;
    send(controller, EditorEvent::PointerMove(end))?;
    send(controller, EditorEvent::PointerUp(end))
}

fn canvas_point(x: u32, y: u32) -> ToolPoint {
    ToolPoint::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}

fn malformed(op: &'static str, reason: impl Into<String>) -> EditOpParseError {
    EditOpParseError::Malformed {
        op,
        reason: reason.into(),
    }
}

fn parse_numbers<T: FromStr>(op: &'static str, input: &str, count: usize) -> Result<Vec<T>, EditOpParseError> {
    let values = input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<T>()
                .map_err(|_| malformed(op, format!("{part:?} is not a valid number")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != count {
        return Err(malformed(
            op,
            format!("expected {count} comma-separated numbers, got {}", values.len()),
        ));
    }
    Ok(values)
}

fn parse_point(op: &'static str, input: &str) -> Result<ToolPoint, EditOpParseError> {
    match parse_numbers::<i32>(op, input, 2)?.as_slice() {
        [x, y] => Ok(ToolPoint::new(*x, *y)),
        _ => Err(malformed(op, "expected X,Y")),
    }
}

fn parse_rect(op: &'static str, input: &str) -> Result<Rect, EditOpParseError> {
    match parse_numbers::<u32>(op, input, 4)?.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err(malformed(op, "expected X,Y,W,H")),
    }
}

/// `\n` in a command-line argument becomes a line break.
fn unescape(content: &str) -> String {
    content.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use crate::pixels::PixelBuffer;
    use crate::scene::SceneObject;

    fn parse(input: &str) -> EditOp {
        input.parse().expect("operation should parse")
    }

    #[test]
    fn parses_every_operation_form() {
        assert_eq!(parse("grayscale"), EditOp::Filter(Filter::Grayscale));
        assert_eq!(parse("Rotate-Left"), EditOp::Rotate(Rotation::CounterClockwise));
        assert_eq!(parse("crop:1,2,30,40"), EditOp::Crop(Rect::new(1, 2, 30, 40)));
        assert_eq!(
            parse("swap:0,0,5,5:10,10,5,5"),
            EditOp::Swap(Rect::new(0, 0, 5, 5), Rect::new(10, 10, 5, 5))
        );
        assert_eq!(
            parse("text:3,4:hello: world"),
            EditOp::Text {
                at: ToolPoint::new(3, 4),
                content: "hello: world".to_string()
            }
        );
        assert_eq!(
            parse("bubble:50,60:thought:hmm\\nok"),
            EditOp::Bubble {
                at: ToolPoint::new(50, 60),
                kind: BubbleKind::Thought,
                content: "hmm\nok".to_string()
            }
        );
        assert_eq!(
            parse("draw:0,0;5,-2;9,9"),
            EditOp::Draw(vec![ToolPoint::new(0, 0), ToolPoint::new(5, -2), ToolPoint::new(9, 9)])
        );
        assert_eq!(parse("undo"), EditOp::Undo);
    }

    #[test]
    fn rejects_unknown_and_malformed_operations() {
        assert!(matches!("blur".parse::<EditOp>(), Err(EditOpParseError::Unknown(_))));
        assert!(matches!(
            "crop:1,2,3".parse::<EditOp>(),
            Err(EditOpParseError::Malformed { op: "crop", .. })
        ));
        assert!(matches!(
            "crop:-1,0,3,3".parse::<EditOp>(),
            Err(EditOpParseError::Malformed { op: "crop", .. })
        ));
        assert!(matches!(
            "bubble:1,1:shout:hi".parse::<EditOp>(),
            Err(EditOpParseError::Malformed { op: "bubble", .. })
        ));
        assert!(matches!(
            "draw:1,1".parse::<EditOp>(),
            Err(EditOpParseError::Malformed { op: "draw", .. })
        ));
    }

    #[test]
    fn ops_drive_the_controller_and_return_to_select() {
        let mut controller = EditorController::default();
        let buffer = PixelBuffer::filled(40, 30, Color::WHITE).expect("valid size");
        controller.load_buffer(buffer, Some("scene.png"));

        parse("bubble:20,25:thought:hi")
            .apply(&mut controller)
            .expect("bubble placed");
        assert!(matches!(
            &controller.session().layer().objects()[0],
            SceneObject::Bubble(bubble) if bubble.style.kind == BubbleKind::Thought
        ));
        assert_eq!(controller.session().tool(), ToolKind::Select);

        parse("swap:0,0,4,4:10,10,4,4")
            .apply(&mut controller)
            .expect("swap");
        assert!(controller.session().layer().is_empty());

        parse("crop:0,0,20,10").apply(&mut controller).expect("crop");
        let buffer = controller.session().buffer().expect("loaded");
        assert_eq!((buffer.width(), buffer.height()), (20, 10));
        assert_eq!(controller.session().history().len(), 2);
        assert_eq!(controller.session().tool(), ToolKind::Select);
    }

    #[test]
    fn failing_op_reports_the_editor_error() {
        let mut controller = EditorController::default();
        let buffer = PixelBuffer::filled(10, 10, Color::WHITE).expect("valid size");
        controller.load_buffer(buffer, None);

        let err = parse("crop:10,10,5,5")
            .apply(&mut controller)
            .expect_err("rect lies outside the image");
        assert!(matches!(err, crate::editor::EditorError::InvalidSelection(_)));
    }
}
