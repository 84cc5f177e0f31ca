use std::fmt::Debug;

use super::error::{SelectionError, SelectionResult};

/// A phase enum with an exhaustive transition table.
pub trait PhaseTable: Copy + Debug + Default + Eq {
    type Event: Copy + Debug + Eq;

    const FLOW: &'static str;

    fn next(self, event: Self::Event) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPhase {
    #[default]
    Idle,
    Selecting,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropEvent {
    BeginDrag,
    Release,
    Degenerate,
    Confirm,
    Cancel,
}

impl PhaseTable for CropPhase {
    type Event = CropEvent;

    const FLOW: &'static str = "crop";

    fn next(self, event: CropEvent) -> Option<Self> {
        use CropEvent::*;
        match (self, event) {
            (Self::Idle | Self::Ready, BeginDrag) => Some(Self::Selecting),
            (Self::Selecting, Release) => Some(Self::Ready),
            (Self::Selecting, Degenerate) => Some(Self::Idle),
            (Self::Ready, Confirm) => Some(Self::Idle),
            (_, Cancel) => Some(Self::Idle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnipPhase {
    #[default]
    Idle,
    Selecting1,
    Selected1,
    Selecting2,
    Swapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnipEvent {
    Arm,
    ConfirmFirst,
    ArmSecond,
    ConfirmSecond,
    Degenerate,
    Cancel,
}

impl PhaseTable for SnipPhase {
    type Event = SnipEvent;

    const FLOW: &'static str = "snip";

    fn next(self, event: SnipEvent) -> Option<Self> {
        use SnipEvent::*;
        match (self, event) {
            (Self::Idle | Self::Swapped, Arm) => Some(Self::Selecting1),
            (Self::Selecting1, ConfirmFirst) => Some(Self::Selected1),
            (Self::Selecting1, Degenerate) => Some(Self::Idle),
            (Self::Selected1, ArmSecond) => Some(Self::Selecting2),
            (Self::Selecting2, ConfirmSecond) => Some(Self::Swapped),
            (Self::Selecting2, Degenerate) => Some(Self::Selected1),
            (_, Cancel) => Some(Self::Idle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition<P: PhaseTable> {
    pub from: P,
    pub event: P::Event,
    pub to: P,
}

/// Most recent transitions kept per flow.
pub const TRANSITION_LOG_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct PhaseMachine<P: PhaseTable> {
    phase: P,
    transition_history: Vec<PhaseTransition<P>>,
}

impl<P: PhaseTable> Default for PhaseMachine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PhaseTable> PhaseMachine<P> {
    pub fn new() -> Self {
        Self {
            phase: P::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn phase(&self) -> P {
        self.phase
    }

    pub fn can_transition(&self, event: P::Event) -> bool {
        self.phase.next(event).is_some()
    }

    pub fn transition(&mut self, event: P::Event) -> SelectionResult<P> {
        tracing::debug!(flow = P::FLOW, from = ?self.phase, event = ?event, "request selection transition");
        let next = self.phase.next(event).ok_or_else(|| {
            let from = self.phase;
            tracing::warn!(flow = P::FLOW, from = ?from, event = ?event, "invalid selection transition requested");
            SelectionError::InvalidTransition {
                flow: P::FLOW,
                from: format!("{from:?}"),
                event: format!("{event:?}"),
            }
        })?;

        // A flow that returns to its initial phase starts a fresh log.
        if next == P::default() {
            self.transition_history.clear();
        } else {
            if self.transition_history.len() == TRANSITION_LOG_LIMIT {
                self.transition_history.remove(0);
            }
            self.transition_history.push(PhaseTransition {
                from: self.phase,
                event,
                to: next,
            });
        }
        self.phase = next;
        Ok(next)
    }

    pub fn history(&self) -> &[PhaseTransition<P>] {
        &self.transition_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snip_happy_path_walks_every_phase() {
        let mut machine = PhaseMachine::<SnipPhase>::new();
        for (event, expected) in [
            (SnipEvent::Arm, SnipPhase::Selecting1),
            (SnipEvent::ConfirmFirst, SnipPhase::Selected1),
            (SnipEvent::ArmSecond, SnipPhase::Selecting2),
            (SnipEvent::ConfirmSecond, SnipPhase::Swapped),
        ] {
            assert_eq!(
                machine.transition(event).expect("happy path transition"),
                expected
            );
        }
        assert_eq!(machine.history().len(), 4);
        assert_eq!(
            machine.history()[1],
            PhaseTransition {
                from: SnipPhase::Selecting1,
                event: SnipEvent::ConfirmFirst,
                to: SnipPhase::Selected1,
            }
        );
    }

    #[test]
    fn degenerate_release_steps_back_one_phase() {
        assert_eq!(
            SnipPhase::Selecting1.next(SnipEvent::Degenerate),
            Some(SnipPhase::Idle)
        );
        assert_eq!(
            SnipPhase::Selecting2.next(SnipEvent::Degenerate),
            Some(SnipPhase::Selected1)
        );
        assert_eq!(
            CropPhase::Selecting.next(CropEvent::Degenerate),
            Some(CropPhase::Idle)
        );
    }

    #[test]
    fn cancel_is_accepted_from_every_phase() {
        for phase in [
            SnipPhase::Idle,
            SnipPhase::Selecting1,
            SnipPhase::Selected1,
            SnipPhase::Selecting2,
            SnipPhase::Swapped,
        ] {
            assert_eq!(phase.next(SnipEvent::Cancel), Some(SnipPhase::Idle));
        }
        for phase in [CropPhase::Idle, CropPhase::Selecting, CropPhase::Ready] {
            assert_eq!(phase.next(CropEvent::Cancel), Some(CropPhase::Idle));
        }
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_phase() {
        let mut machine = PhaseMachine::<CropPhase>::new();
        assert!(!machine.can_transition(CropEvent::Confirm));

        let err = machine
            .transition(CropEvent::Confirm)
            .expect_err("idle crop cannot confirm");
        assert!(matches!(
            err,
            SelectionError::InvalidTransition { flow: "crop", .. }
        ));
        assert_eq!(machine.phase(), CropPhase::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn repeated_swaps_without_cancel_keep_a_bounded_log() {
        let mut machine = PhaseMachine::<SnipPhase>::new();
        for _ in 0..50 {
            for event in [
                SnipEvent::Arm,
                SnipEvent::ConfirmFirst,
                SnipEvent::ArmSecond,
                SnipEvent::ConfirmSecond,
            ] {
                machine.transition(event).expect("swap cycle transition");
            }
        }
        assert_eq!(machine.phase(), SnipPhase::Swapped);
        assert_eq!(machine.history().len(), TRANSITION_LOG_LIMIT);
        let last = machine.history().last().expect("log is not empty");
        assert_eq!(last.to, SnipPhase::Swapped);
    }

    #[test]
    fn returning_to_idle_clears_the_flow_log() {
        let mut machine = PhaseMachine::<SnipPhase>::new();
        machine.transition(SnipEvent::Arm).expect("arm");
        assert_eq!(machine.history().len(), 1);
        machine.transition(SnipEvent::Cancel).expect("cancel");
        assert!(machine.history().is_empty());
        assert_eq!(machine.phase(), SnipPhase::Idle);
    }
}
