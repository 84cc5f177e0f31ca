//! Modal region selection for crop and snip/swap.

pub mod error;
pub mod machine;

use crate::geometry::{ImageBounds, Rect, ToolPoint};
use crate::pixels::PixelBuffer;

pub use error::{SelectionError, SelectionResult};
pub use machine::{CropEvent, CropPhase, PhaseMachine, PhaseTable, PhaseTransition, SnipEvent, SnipPhase};

/// Pointer-down/current corner pair of an open selection drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRect {
    pub start: ToolPoint,
    pub current: ToolPoint,
}

impl DragRect {
    pub const fn new(start: ToolPoint) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn rect(&self, bounds: ImageBounds) -> Option<Rect> {
        Rect::from_corners(self.start, self.current, bounds)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CropSession {
    machine: PhaseMachine<CropPhase>,
    drag: Option<DragRect>,
    rect: Option<Rect>,
}

impl CropSession {
    pub fn phase(&self) -> CropPhase {
        self.machine.phase()
    }

    pub fn is_open(&self) -> bool {
        self.phase() != CropPhase::Idle
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn ready_rect(&self) -> Option<Rect> {
        match self.phase() {
            CropPhase::Ready => self.rect,
            _ => None,
        }
    }

    /// Rect to preview: the live drag while selecting, otherwise the captured one.
    pub fn working_rect(&self, bounds: ImageBounds) -> Option<Rect> {
        match self.drag {
            Some(drag) => drag.rect(bounds),
            None => self.ready_rect(),
        }
    }

    pub fn begin_drag(&mut self, at: ToolPoint) -> SelectionResult<()> {
        self.machine.transition(CropEvent::BeginDrag)?;
        self.drag = Some(DragRect::new(at));
        self.rect = None;
        Ok(())
    }

    pub fn update_drag(&mut self, to: ToolPoint) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current = to;
        }
    }

    /// Ends the drag. A degenerate rect steps the flow back to `Idle`.
    pub fn release(&mut self, at: ToolPoint, bounds: ImageBounds) -> SelectionResult<Option<Rect>> {
        let Some(mut drag) = self.drag.take() else {
            return Ok(None);
        };
        drag.current = at;
        match drag.rect(bounds) {
            Some(rect) => {
                self.machine.transition(CropEvent::Release)?;
                self.rect = Some(rect);
                Ok(Some(rect))
            }
            None => {
                self.machine.transition(CropEvent::Degenerate)?;
                Ok(None)
            }
        }
    }

    /// Abandons an open drag as if it had been released with zero area.
    pub fn abort_drag(&mut self) -> SelectionResult<()> {
        if self.drag.take().is_some() {
            self.machine.transition(CropEvent::Degenerate)?;
        }
        Ok(())
    }

    /// Consumes the captured rect, returning the flow to `Idle`.
    pub fn confirm(&mut self, bounds: ImageBounds) -> SelectionResult<Rect> {
        if self.is_dragging() {
            return Err(SelectionError::GestureOpen);
        }
        let rect = self
            .ready_rect()
            .filter(|rect| rect.fits_within(bounds))
            .ok_or(SelectionError::InvalidSelection { flow: CropPhase::FLOW })?;
        self.machine.transition(CropEvent::Confirm)?;
        self.rect = None;
        Ok(rect)
    }

    pub fn cancel(&mut self) {
        self.drag = None;
        self.rect = None;
        // Cancel is accepted from every phase.
        let _ = self.machine.transition(CropEvent::Cancel);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnipSession {
    machine: PhaseMachine<SnipPhase>,
    drag: Option<DragRect>,
    pending: Option<Rect>,
    region1: Option<Rect>,
    region1_pixels: Option<PixelBuffer>,
    region2: Option<Rect>,
}

impl SnipSession {
    pub fn phase(&self) -> SnipPhase {
        self.machine.phase()
    }

    /// True while a swap is mid-flow (`Swapped` counts as finished).
    pub fn is_open(&self) -> bool {
        !matches!(self.phase(), SnipPhase::Idle | SnipPhase::Swapped)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn holds_extracted_pixels(&self) -> bool {
        self.region1_pixels.is_some()
    }

    pub fn pending_rect(&self) -> Option<Rect> {
        self.pending
    }

    pub fn working_rect(&self, bounds: ImageBounds) -> Option<Rect> {
        match self.drag {
            Some(drag) => drag.rect(bounds),
            None => self.pending,
        }
    }

    pub fn arm(&mut self) -> SelectionResult<()> {
        self.machine.transition(SnipEvent::Arm)?;
        self.pending = None;
        self.region1 = None;
        self.region1_pixels = None;
        self.region2 = None;
        Ok(())
    }

    pub fn arm_second(&mut self) -> SelectionResult<()> {
        self.machine.transition(SnipEvent::ArmSecond)?;
        self.pending = None;
        Ok(())
    }

    /// Starts a drag, arming whichever region is next when the flow is waiting.
    pub fn begin_drag(&mut self, at: ToolPoint) -> SelectionResult<()> {
        match self.phase() {
            SnipPhase::Idle | SnipPhase::Swapped => self.arm()?,
            SnipPhase::Selected1 => self.arm_second()?,
            SnipPhase::Selecting1 | SnipPhase::Selecting2 => {}
        }
        self.drag = Some(DragRect::new(at));
        self.pending = None;
        Ok(())
    }

    pub fn update_drag(&mut self, to: ToolPoint) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current = to;
        }
    }

    /// Ends the drag. A valid rect waits for confirmation; a degenerate one
    /// steps the flow back one phase.
    pub fn release(&mut self, at: ToolPoint, bounds: ImageBounds) -> SelectionResult<Option<Rect>> {
        let Some(mut drag) = self.drag.take() else {
            return Ok(None);
        };
        drag.current = at;
        self.pending = drag.rect(bounds);
        if self.pending.is_none() {
            self.machine.transition(SnipEvent::Degenerate)?;
        }
        Ok(self.pending)
    }

    pub fn abort_drag(&mut self) -> SelectionResult<()> {
        if self.drag.take().is_some() {
            self.pending = None;
            self.machine.transition(SnipEvent::Degenerate)?;
        }
        Ok(())
    }

    /// Lifts region 1 out of `buffer`, leaving a transparent hole.
    pub fn confirm_first(&mut self, buffer: &mut PixelBuffer) -> SelectionResult<Rect> {
        if self.phase() != SnipPhase::Selecting1 {
            return Err(self.invalid_transition(SnipEvent::ConfirmFirst));
        }
        let rect = self.take_pending(buffer.bounds())?;
        let pixels = buffer.extract_region(rect)?;
        buffer.clear_region(rect)?;
        self.machine.transition(SnipEvent::ConfirmFirst)?;
        self.region1 = Some(rect);
        self.region1_pixels = Some(pixels);
        Ok(rect)
    }

    /// Validates region 2 without touching pixels, so callers can snapshot
    /// the buffer before [`SnipSession::commit_swap`].
    pub fn prepare_swap(&mut self, bounds: ImageBounds) -> SelectionResult<(Rect, Rect)> {
        if self.phase() != SnipPhase::Selecting2 {
            return Err(self.invalid_transition(SnipEvent::ConfirmSecond));
        }
        let region1 = match (self.region1, self.region1_pixels.as_ref()) {
            (Some(rect), Some(_)) => rect,
            _ => return Err(SelectionError::MissingRegion),
        };
        let region2 = self.take_pending(bounds)?;
        self.region2 = Some(region2);
        Ok((region1, region2))
    }

    /// Writes region 2's content into region 1's slot and the held region 1
    /// pixels into region 2's slot.
    pub fn commit_swap(&mut self, buffer: &mut PixelBuffer) -> SelectionResult<(Rect, Rect)> {
        if !self.machine.can_transition(SnipEvent::ConfirmSecond) {
            return Err(self.invalid_transition(SnipEvent::ConfirmSecond));
        }
        let (Some(region1), Some(region2)) = (self.region1, self.region2) else {
            return Err(SelectionError::MissingRegion);
        };
        let held = self
            .region1_pixels
            .as_ref()
            .ok_or(SelectionError::MissingRegion)?;

        let region2_pixels = buffer.extract_region(region2)?;
        buffer.put_region(&region2_pixels, region1.x, region1.y)?;
        buffer.put_region(held, region2.x, region2.y)?;

        self.machine.transition(SnipEvent::ConfirmSecond)?;
        self.pending = None;
        self.region1 = None;
        self.region1_pixels = None;
        self.region2 = None;
        Ok((region1, region2))
    }

    /// Returns to `Idle`, putting extracted region 1 pixels back first.
    pub fn cancel(&mut self, buffer: Option<&mut PixelBuffer>) -> SelectionResult<bool> {
        let mut restored = false;
        if let (Some(buffer), Some(rect), Some(pixels)) =
            (buffer, self.region1, self.region1_pixels.as_ref())
        {
            buffer.put_region(pixels, rect.x, rect.y)?;
            restored = true;
        }
        self.reset();
        Ok(restored)
    }

    /// Returns to `Idle` discarding any held pixels.
    pub fn reset(&mut self) {
        self.drag = None;
        self.pending = None;
        self.region1 = None;
        self.region1_pixels = None;
        self.region2 = None;
        let _ = self.machine.transition(SnipEvent::Cancel);
    }

    fn take_pending(&mut self, bounds: ImageBounds) -> SelectionResult<Rect> {
        if self.is_dragging() {
            return Err(SelectionError::GestureOpen);
        }
        match self.pending.take().filter(|rect| rect.fits_within(bounds)) {
            Some(rect) => Ok(rect),
            None => {
                self.machine.transition(SnipEvent::Degenerate)?;
                Err(SelectionError::InvalidSelection {
                    flow: SnipPhase::FLOW,
                })
            }
        }
    }

    fn invalid_transition(&self, event: SnipEvent) -> SelectionError {
        SelectionError::InvalidTransition {
            flow: SnipPhase::FLOW,
            from: format!("{:?}", self.phase()),
            event: format!("{event:?}"),
        }
    }
}

/// Both selection flows. At most one may be open at a time.
#[derive(Debug, Clone, Default)]
pub struct SelectionProtocol {
    pub crop: CropSession,
    pub snip: SnipSession,
}

impl SelectionProtocol {
    pub fn is_open(&self) -> bool {
        self.crop.is_open() || self.snip.is_open()
    }

    pub fn is_dragging(&self) -> bool {
        self.crop.is_dragging() || self.snip.is_dragging()
    }

    pub fn begin_crop_drag(&mut self, at: ToolPoint) -> SelectionResult<()> {
        if self.snip.is_open() {
            return Err(SelectionError::OtherFlowActive {
                active: SnipPhase::FLOW,
            });
        }
        self.crop.begin_drag(at)
    }

    pub fn begin_snip_drag(&mut self, at: ToolPoint) -> SelectionResult<()> {
        if self.crop.is_open() {
            return Err(SelectionError::OtherFlowActive {
                active: CropPhase::FLOW,
            });
        }
        self.snip.begin_drag(at)
    }

    /// Drops both flows without restoring anything; used when the whole
    /// buffer is about to be replaced.
    pub fn abort_all(&mut self) {
        self.crop.cancel();
        self.snip.reset();
    }
}
