use crate::bus::extension::Delivery;

/// Lifecycle of the single request a popup may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

/// What a call to `submit` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Rejected,
    /// A request is already outstanding; the submission was ignored.
    Busy,
    /// The backend answered. `dispatch` is set when the reply carried a directive.
    Answered { dispatch: Option<Delivery> },
    /// The backend failed and the fallback reply was appended.
    Failed,
}
