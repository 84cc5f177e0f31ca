use super::*;
use crate::pixels::transform;

impl EditorController {
    pub(super) fn run_command(&mut self, command: EditorCommand) -> EditorResult<EditorOutcome> {
        match command {
            EditorCommand::SelectTool(tool) => self.select_tool(tool),
            EditorCommand::ConfirmCrop => self.confirm_crop(),
            EditorCommand::CancelCrop => self.cancel_crop(),
            EditorCommand::StartSnip => self.start_snip(),
            EditorCommand::ConfirmSnip1 => self.confirm_snip1(),
            EditorCommand::StartSnip2 => self.start_snip2(),
            EditorCommand::ConfirmSnip2 => self.confirm_snip2(),
            EditorCommand::CancelSnip => self.cancel_snip(),
            EditorCommand::ArmText(text) => self.arm_text(&text),
            EditorCommand::ArmBubble(text) => self.arm_bubble(&text),
            EditorCommand::ApplyFilter(filter) => self.apply_filter(filter),
            EditorCommand::Rotate(rotation) => self.rotate(rotation),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Revert => self.revert(),
        }
    }

    fn select_tool(&mut self, tool: ToolKind) -> EditorResult<EditorOutcome> {
        if tool != ToolKind::Select {
            self.require_loaded()?;
        }
        let previous = self.session.tool;
        if previous == tool {
            return Ok(EditorOutcome::Unchanged);
        }

        self.abandon_gesture()?;
        self.reset_tool_state(previous)?;
        self.session.tool = tool;
        tracing::debug!(from = previous.label(), to = tool.label(), "tool switched");
        Ok(EditorOutcome::Redraw)
    }

    /// Drops whatever the outgoing tool left behind. An extracted snip region
    /// is written back first.
    fn reset_tool_state(&mut self, tool: ToolKind) -> EditorResult<()> {
        match tool {
            ToolKind::Select => self.session.layer.deselect(),
            ToolKind::Crop => self.session.selection.crop.cancel(),
            ToolKind::Snip => {
                let buffer = self.session.document.as_mut().map(|d| &mut d.buffer);
                if self.session.selection.snip.cancel(buffer)? {
                    tracing::debug!("area 1 restored");
                }
            }
            ToolKind::Text | ToolKind::Bubble => self.session.armed = None,
            ToolKind::Draw => {}
        }
        Ok(())
    }

    fn confirm_crop(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Crop)?;
        self.require_idle_pointer()?;
        let Some(bounds) = self.session.buffer().map(PixelBuffer::bounds) else {
            return Err(EditorError::precondition(MSG_LOAD_FIRST));
        };
        let rect = self.session.selection.crop.confirm(bounds)?;

        let outcome = self.commit(DestructiveOp::Crop, |session| {
            let document = document_mut(&mut session.document)?;
            document.buffer = transform::crop(&document.buffer, rect)?;
            Ok(())
        })?;
        self.select_tool(ToolKind::Select)?;
        Ok(outcome)
    }

    fn cancel_crop(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Crop)?;
        if self.session.gesture == Gesture::Selection {
            self.session.gesture = Gesture::Idle;
        }
        self.session.selection.crop.cancel();
        Ok(EditorOutcome::Redraw)
    }

    fn start_snip(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Snip)?;
        self.require_idle_pointer()?;
        self.session.selection.snip.arm()?;
        Ok(EditorOutcome::Redraw)
    }

    fn confirm_snip1(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Snip)?;
        self.require_idle_pointer()?;
        let session = &mut self.session;
        let document = document_mut(&mut session.document)?;
        let rect = session.selection.snip.confirm_first(&mut document.buffer)?;
        tracing::debug!(?rect, "area 1 lifted");
        Ok(EditorOutcome::Redraw)
    }

    fn start_snip2(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Snip)?;
        self.require_idle_pointer()?;
        self.session.selection.snip.arm_second()?;
        Ok(EditorOutcome::Redraw)
    }

    fn confirm_snip2(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Snip)?;
        self.require_idle_pointer()?;
        let Some(bounds) = self.session.buffer().map(PixelBuffer::bounds) else {
            return Err(EditorError::precondition(MSG_LOAD_FIRST));
        };
        let (region1, region2) = self.session.selection.snip.prepare_swap(bounds)?;
        tracing::debug!(?region1, ?region2, "swapping areas");

        self.commit(DestructiveOp::Swap, |session| {
            let document = document_mut(&mut session.document)?;
            session
                .selection
                .snip
                .commit_swap(&mut document.buffer)
                .map(|_| ())
                .map_err(|err| EditorError::OperationFailure(format!("Swap failed: {err}")))
        })
    }

    fn cancel_snip(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Snip)?;
        if self.session.gesture == Gesture::Selection {
            self.session.gesture = Gesture::Idle;
        }
        self.reset_tool_state(ToolKind::Snip)?;
        Ok(EditorOutcome::Redraw)
    }

    fn arm_text(&mut self, text: &str) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Text)?;
        let text = armable_text(text)?;
        self.session.armed = Some(ArmedPayload::Text(text));
        Ok(EditorOutcome::Redraw)
    }

    fn arm_bubble(&mut self, text: &str) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_tool(ToolKind::Bubble)?;
        let text = armable_text(text)?;
        let style = self.session.settings.bubble_style();
        self.session.armed = Some(ArmedPayload::Bubble { text, style });
        Ok(EditorOutcome::Redraw)
    }

    fn apply_filter(&mut self, filter: Filter) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_idle_pointer()?;
        if self.session.selection.is_open() {
            return Err(EditorError::precondition(
                "Finish or cancel the current selection first.",
            ));
        }
        self.commit(DestructiveOp::Filter(filter), |session| {
            let document = document_mut(&mut session.document)?;
            document.buffer = filter.apply(&document.buffer);
            Ok(())
        })
    }

    fn rotate(&mut self, rotation: Rotation) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_idle_pointer()?;
        self.commit(DestructiveOp::Rotate(rotation), |session| {
            let document = document_mut(&mut session.document)?;
            document.buffer = transform::rotate90(&document.buffer, rotation);
            Ok(())
        })
    }

    fn undo(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_idle_pointer()?;
        let Some(previous) = self.session.history.pop() else {
            self.notice = Some("Nothing to undo.".to_string());
            return Ok(EditorOutcome::Unchanged);
        };
        let document = document_mut(&mut self.session.document)?;
        document.buffer = previous;
        self.session.layer.clear();
        self.session.selection.abort_all();
        self.session.armed = None;
        tracing::info!(history = self.session.history.len(), "undo");
        Ok(EditorOutcome::Redraw)
    }

    fn revert(&mut self) -> EditorResult<EditorOutcome> {
        self.require_loaded()?;
        self.require_idle_pointer()?;
        let outcome = self.commit(DestructiveOp::Revert, |session| {
            let document = document_mut(&mut session.document)?;
            document.buffer = document.original.snapshot();
            Ok(())
        })?;
        self.select_tool(ToolKind::Select)?;
        Ok(outcome)
    }
}

fn armable_text(text: &str) -> EditorResult<String> {
    let text = text.trim();
    if text.is_empty() {
        Err(EditorError::InputRejected("Enter some text first.".to_string()))
    } else {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use crate::scene::SceneObject;

    fn loaded() -> EditorController {
        let mut controller = EditorController::default();
        let buffer = PixelBuffer::filled(32, 24, Color::WHITE).expect("valid size");
        controller.load_buffer(buffer, None);
        controller
    }

    #[test]
    fn selection_commands_require_their_tool() {
        let mut controller = loaded();
        for command in [
            EditorCommand::ConfirmCrop,
            EditorCommand::CancelCrop,
            EditorCommand::StartSnip,
            EditorCommand::ConfirmSnip2,
        ] {
            let err = controller
                .run_command(command)
                .expect_err("select tool is active");
            assert!(matches!(err, EditorError::PreconditionFailed(_)));
        }
    }

    #[test]
    fn second_area_cannot_start_before_first_is_confirmed() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Snip))
            .expect("switch");
        let err = controller
            .run_command(EditorCommand::StartSnip2)
            .expect_err("area 1 missing");
        assert!(matches!(err, EditorError::PreconditionFailed(_)));
    }

    #[test]
    fn degenerate_second_area_returns_to_selected1() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Snip))
            .expect("switch");
        controller.pointer_down(ToolPoint::new(1, 1)).expect("down");
        controller.pointer_up(ToolPoint::new(6, 6)).expect("up");
        controller.run_command(EditorCommand::ConfirmSnip1).expect("lift");
        controller.run_command(EditorCommand::StartSnip2).expect("arm 2");
        controller.pointer_down(ToolPoint::new(10, 10)).expect("down");
        controller.pointer_up(ToolPoint::new(10, 10)).expect("zero-area up");

        assert_eq!(controller.session().selection().snip.phase(), SnipPhase::Selected1);
        let err = controller
            .run_command(EditorCommand::ConfirmSnip2)
            .expect_err("nothing to swap");
        assert!(matches!(err, EditorError::PreconditionFailed(_)));
        assert!(controller.session().history().is_empty());
    }

    #[test]
    fn bubble_style_is_captured_when_armed() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Bubble))
            .expect("switch");
        controller.settings_mut().bubble_fill = Color::new(0, 255, 0);
        controller
            .run_command(EditorCommand::ArmBubble("yo".into()))
            .expect("arm");
        controller.settings_mut().bubble_fill = Color::new(0, 0, 255);
        controller.pointer_down(ToolPoint::new(16, 20)).expect("place");

        let SceneObject::Bubble(bubble) = &controller.session().layer().objects()[0] else {
            panic!("expected a bubble");
        };
        assert_eq!(bubble.style.fill_color, Color::new(0, 255, 0));
    }

    #[test]
    fn text_style_is_read_at_placement() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Text))
            .expect("switch");
        controller
            .run_command(EditorCommand::ArmText("t".into()))
            .expect("arm");
        controller.settings_mut().text_color = Color::new(9, 9, 9);
        controller.pointer_down(ToolPoint::new(0, 0)).expect("place");

        let SceneObject::Text(text) = &controller.session().layer().objects()[0] else {
            panic!("expected text");
        };
        assert_eq!(text.style.color, Color::new(9, 9, 9));
    }

    #[test]
    fn switching_away_from_text_disarms() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Text))
            .expect("switch");
        controller
            .run_command(EditorCommand::ArmText("t".into()))
            .expect("arm");
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Bubble))
            .expect("switch");
        assert!(controller.session().armed().is_none());
    }

    #[test]
    fn rotation_aborts_open_snip_without_restoring() {
        let mut controller = loaded();
        controller
            .run_command(EditorCommand::SelectTool(ToolKind::Snip))
            .expect("switch");
        controller.pointer_down(ToolPoint::new(0, 0)).expect("down");
        controller.pointer_up(ToolPoint::new(4, 4)).expect("up");
        controller.run_command(EditorCommand::ConfirmSnip1).expect("lift");

        controller
            .run_command(EditorCommand::Rotate(Rotation::Clockwise))
            .expect("rotate");
        let snip = &controller.session().selection().snip;
        assert_eq!(snip.phase(), SnipPhase::Idle);
        assert!(!snip.holds_extracted_pixels());
        // Area 1 was at the top-left; clockwise it lands top-right and stays cleared.
        let buffer = controller.session().buffer().expect("loaded");
        assert_eq!(buffer.pixel(buffer.width() - 1, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn history_capacity_bounds_undo_depth() {
        let config = EditorConfig {
            history_capacity: 2,
            ..EditorConfig::default()
        };
        let mut controller = EditorController::new(&config);
        controller.load_buffer(PixelBuffer::filled(2, 2, Color::WHITE).expect("2x2"), None);
        for _ in 0..5 {
            controller
                .run_command(EditorCommand::ApplyFilter(Filter::Invert))
                .expect("filter");
        }
        assert_eq!(controller.session().history().len(), 2);
        controller.run_command(EditorCommand::Undo).expect("undo");
        controller.run_command(EditorCommand::Undo).expect("undo");
        assert_eq!(
            controller.run_command(EditorCommand::Undo).expect("empty undo"),
            EditorOutcome::Unchanged
        );
    }
}
