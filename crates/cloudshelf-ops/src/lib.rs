//! Guards for destructive and state-changing operations.
//!
//! - [`ActionGate`] sequences "confirm, then execute, then follow up" for
//!   deletions and keeps at most one [`PendingAction`] alive.
//! - [`LifecycleGuard`] decides which actions an instance state permits.
//! - [`InstanceBoard`] owns the instance working set, the per-instance busy
//!   flags and the one-shot re-fetch schedule after start/stop.
//!
//! None of these types perform I/O. They return descriptions of the remote
//! call to make ([`Dispatch`]) and of what to do once it resolves
//! ([`Followup`], [`InstanceOutcome`]).

mod board;
mod gate;
mod lifecycle;
mod pending;

pub use board::{GuardViolation, InstanceBoard, InstanceOutcome, RefetchTicket};
pub use gate::{ActionGate, ActionId, Dispatch, Followup, GateError};
pub use lifecycle::LifecycleGuard;
pub use pending::{ActionKind, PendingAction};
