//! Video workflow engine
//!
//! Pure functions over static tables: no I/O, no clock reads. Callers pass
//! the current time into [`apply_update`].

pub mod effective;
pub mod filter;
pub mod orchestrator;
pub mod role;
pub mod status;
pub mod transitions;
pub mod visibility;

pub use effective::{effective_assignment, effective_status, Assignment, EffectiveStatus};
pub use filter::VideoListFilter;
pub use orchestrator::{apply_update, CorrectionRequest, UpdatePlan, VideoPatch};
pub use role::Role;
pub use status::VideoStatus;
pub use transitions::{
    allowed_transitions, can_revert_state, can_transition, can_unassign_video, previous_state,
};
pub use visibility::{can_edit_video, can_see_details, can_view_video, visible_states};
