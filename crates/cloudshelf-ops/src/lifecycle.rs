//! Which instance actions each lifecycle state permits.

use strum::IntoEnumIterator;

use cloudshelf_core::{InstanceAction, InstanceState};

/// Policy over instance states.
///
/// | action    | blocked when state is        |
/// |-----------|------------------------------|
/// | start     | running, pending             |
/// | stop      | stopped, stopping            |
/// | terminate | terminated, shutting-down    |
///
/// Terminated and shutting-down instances block every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleGuard;

impl LifecycleGuard {
    /// States in which `action` is blocked.
    pub fn blocked_states(action: InstanceAction) -> &'static [InstanceState] {
        use InstanceState::*;
        match action {
            InstanceAction::Start => &[Running, Pending, ShuttingDown, Terminated],
            InstanceAction::Stop => &[Stopped, Stopping, ShuttingDown, Terminated],
            InstanceAction::Terminate => &[ShuttingDown, Terminated],
        }
    }

    /// Whether `action` is currently permitted for an instance in `state`.
    pub fn permits(state: InstanceState, action: InstanceAction) -> bool {
        !state.is_terminal() && !Self::blocked_states(action).contains(&state)
    }

    /// All actions permitted in `state`.
    pub fn allowed_actions(state: InstanceState) -> Vec<InstanceAction> {
        InstanceAction::iter()
            .filter(|action| Self::permits(state, *action))
            .collect()
    }
}
