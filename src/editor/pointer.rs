use super::*;

impl EditorController {
    pub(super) fn pointer_down(&mut self, point: ToolPoint) -> EditorResult<EditorOutcome> {
        if !self.session.is_loaded() || self.session.gesture.is_open() {
            return Ok(EditorOutcome::Unchanged);
        }

        match self.session.tool {
            ToolKind::Select => {
                let had_selection = self.session.layer.selected_id().is_some();
                match self.session.layer.press(point) {
                    Some(drag) => {
                        tracing::debug!(id = drag.id(), resize = drag.is_resize(), "object drag started");
                        self.session.gesture = Gesture::Object(drag);
                        Ok(EditorOutcome::Redraw)
                    }
                    None if had_selection => Ok(EditorOutcome::Redraw),
                    None => Ok(EditorOutcome::Unchanged),
                }
            }
            ToolKind::Crop => {
                self.session.selection.begin_crop_drag(point)?;
                self.session.gesture = Gesture::Selection;
                Ok(EditorOutcome::Redraw)
            }
            ToolKind::Snip => {
                self.session.selection.begin_snip_drag(point)?;
                self.session.gesture = Gesture::Selection;
                Ok(EditorOutcome::Redraw)
            }
            ToolKind::Draw => {
                self.session.gesture = Gesture::Stroke(vec![point]);
                Ok(EditorOutcome::Redraw)
            }
            ToolKind::Text | ToolKind::Bubble => Ok(self.place_armed(point)),
        }
    }

    pub(super) fn pointer_move(&mut self, point: ToolPoint) -> EditorResult<EditorOutcome> {
        let session = &mut self.session;
        match &mut session.gesture {
            Gesture::Idle => return Ok(EditorOutcome::Unchanged),
            Gesture::Selection => match session.tool {
                ToolKind::Crop => session.selection.crop.update_drag(point),
                ToolKind::Snip => session.selection.snip.update_drag(point),
                _ => {}
            },
            Gesture::Stroke(points) => push_distinct(points, point),
            Gesture::Object(drag) => session.layer.drag_to(drag, point),
        }
        Ok(EditorOutcome::Redraw)
    }

    pub(super) fn pointer_up(&mut self, point: ToolPoint) -> EditorResult<EditorOutcome> {
        match std::mem::take(&mut self.session.gesture) {
            Gesture::Idle => Ok(EditorOutcome::Unchanged),
            Gesture::Selection => {
                let Some(bounds) = self.session.buffer().map(PixelBuffer::bounds) else {
                    return Ok(EditorOutcome::Unchanged);
                };
                let rect = match self.session.tool {
                    ToolKind::Crop => self.session.selection.crop.release(point, bounds)?,
                    ToolKind::Snip => self.session.selection.snip.release(point, bounds)?,
                    _ => None,
                };
                tracing::debug!(?rect, tool = self.session.tool.label(), "selection drag released");
                Ok(EditorOutcome::Redraw)
            }
            Gesture::Stroke(mut points) => {
                push_distinct(&mut points, point);
                if points.len() < 2 {
                    return Ok(EditorOutcome::Redraw);
                }
                let color = self.session.settings.stroke_color;
                let width = self.session.settings.stroke_width();
                self.commit(DestructiveOp::Stroke, |session| {
                    let document = document_mut(&mut session.document)?;
                    render::bake_stroke(&mut document.buffer, &points, color, width);
                    Ok(())
                })
            }
            Gesture::Object(drag) => {
                self.session.layer.finish_drag(&drag);
                Ok(EditorOutcome::Redraw)
            }
        }
    }

    /// Leaving the canvas rolls back whatever gesture is open.
    pub(super) fn pointer_leave(&mut self) -> EditorResult<EditorOutcome> {
        let rolled_back = self.abandon_gesture()?;
        Ok(if rolled_back {
            EditorOutcome::Redraw
        } else {
            EditorOutcome::Unchanged
        })
    }

    pub(super) fn abandon_gesture(&mut self) -> EditorResult<bool> {
        match std::mem::take(&mut self.session.gesture) {
            Gesture::Idle => return Ok(false),
            Gesture::Selection => {
                self.session.selection.crop.abort_drag()?;
                self.session.selection.snip.abort_drag()?;
            }
            Gesture::Stroke(points) => {
                tracing::debug!(points = points.len(), "stroke discarded");
            }
            Gesture::Object(drag) => self.session.layer.cancel_drag(&drag),
        }
        Ok(true)
    }

    fn place_armed(&mut self, point: ToolPoint) -> EditorOutcome {
        let session = &mut self.session;
        let id = match session.armed.take() {
            Some(ArmedPayload::Text(text)) if session.tool == ToolKind::Text => {
                session.layer.place_text(point, &text, session.settings.text_style())
            }
            Some(ArmedPayload::Bubble { text, style }) if session.tool == ToolKind::Bubble => {
                session.layer.place_bubble(point, &text, style)
            }
            other => {
                session.armed = other;
                return EditorOutcome::Unchanged;
            }
        };
        tracing::debug!(id, x = point.x, y = point.y, tool = session.tool.label(), "object placed");
        EditorOutcome::Redraw
    }
}

fn push_distinct(points: &mut Vec<ToolPoint>, point: ToolPoint) {
    if points.last() != Some(&point) {
        points.push(point);
    }
}
