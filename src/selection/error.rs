use crate::pixels::PixelError;
use thiserror::Error;

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("invalid {flow} transition: from {from} using event {event}")]
    InvalidTransition {
        flow: &'static str,
        from: String,
        event: String,
    },
    #[error("{flow} selection is empty or outside the canvas")]
    InvalidSelection { flow: &'static str },
    #[error("a selection drag is still in progress")]
    GestureOpen,
    #[error("{active} selection is already in progress")]
    OtherFlowActive { active: &'static str },
    #[error("first snip region is missing")]
    MissingRegion,
    #[error(transparent)]
    Pixel(#[from] PixelError),
}
