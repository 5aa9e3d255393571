//! Moderation - review visibility and vendor reply lifecycle

mod state_machine;

pub use state_machine::{
    ModerationStateMachine, ReviewMutation, Transition, MAX_REASON_LENGTH, MAX_REPLY_LENGTH,
};
