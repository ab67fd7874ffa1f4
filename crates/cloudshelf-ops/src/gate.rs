//! Single-slot confirmation gate for destructive actions.

use std::fmt;

use thiserror::Error;

use cloudshelf_core::{GatewayResult, InstanceAction};

use crate::pending::PendingAction;

/// Identifier of one request made through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Misuse of the gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    /// A confirmed action is still executing.
    #[error("Another action is already executing")]
    Busy,

    /// Nothing is pending.
    #[error("No action is pending")]
    NoPending,

    /// The id does not refer to the current pending action.
    #[error("Action {0} is not the current pending action")]
    Superseded(ActionId),

    /// The action was already confirmed.
    #[error("Action {0} is already executing")]
    AlreadyExecuting(ActionId),

    /// The action has not been confirmed yet.
    #[error("Action {0} was never confirmed")]
    NotConfirmed(ActionId),
}

/// Remote call to make for a confirmed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    DeleteFile {
        container: String,
        full_path: String,
    },
    DeleteFolder {
        container: String,
        full_path: String,
    },
    DeleteContainer {
        container: String,
    },
    /// Hand-off to the instance board; the gate is already clear.
    Instance {
        instance_id: String,
        action: InstanceAction,
    },
}

/// What the caller does once a deletion resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    /// Re-fetch the current listing.
    RefreshListing,
    /// Go back to the container list and re-fetch it.
    ReturnToContainers,
    /// Surface the failure message.
    Report(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingConfirmation,
    Executing,
}

#[derive(Debug, Clone)]
struct Slot {
    id: ActionId,
    action: PendingAction,
    phase: Phase,
}

/// Holds at most one pending action and sequences it through
/// confirm → execute → follow-up.
///
/// A new request replaces an unconfirmed one. Requests are rejected while a
/// confirmed deletion is executing, so two deletions never run at once.
#[derive(Debug, Default)]
pub struct ActionGate {
    slot: Option<Slot>,
    next_id: u64,
}

impl ActionGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// The action waiting for confirmation or executing, if any.
    pub fn pending(&self) -> Option<&PendingAction> {
        self.slot.as_ref().map(|s| &s.action)
    }

    /// Id of the current action, if any.
    pub fn pending_id(&self) -> Option<ActionId> {
        self.slot.as_ref().map(|s| s.id)
    }

    /// Whether a confirmed action is executing.
    pub fn is_executing(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|s| s.phase == Phase::Executing)
    }

    /// Register an action that needs confirmation. Touches no remote state.
    pub fn request(&mut self, action: PendingAction) -> Result<ActionId, GateError> {
        if self.is_executing() {
            return Err(GateError::Busy);
        }

        self.next_id += 1;
        let id = ActionId(self.next_id);
        if let Some(replaced) = self.slot.take() {
            tracing::debug!(
                replaced = %replaced.id,
                kind = %replaced.action.kind(),
                "Replacing unconfirmed action"
            );
        }
        tracing::debug!(%id, kind = %action.kind(), entity = action.target_name(), "Action requested");
        self.slot = Some(Slot {
            id,
            action,
            phase: Phase::AwaitingConfirmation,
        });
        Ok(id)
    }

    fn check(&self, id: ActionId) -> Result<&Slot, GateError> {
        let slot = self.slot.as_ref().ok_or(GateError::NoPending)?;
        if slot.id != id {
            return Err(GateError::Superseded(id));
        }
        Ok(slot)
    }

    /// Confirm the pending action and get the remote call to make.
    pub fn confirm(&mut self, id: ActionId) -> Result<Dispatch, GateError> {
        if self.check(id)?.phase == Phase::Executing {
            return Err(GateError::AlreadyExecuting(id));
        }

        let slot = self.slot.as_mut().ok_or(GateError::NoPending)?;
        let dispatch = match &slot.action {
            PendingAction::DeleteFile { container, file } => Dispatch::DeleteFile {
                container: container.clone(),
                full_path: file.full_path.clone(),
            },
            PendingAction::DeleteFolder { container, folder } => Dispatch::DeleteFolder {
                container: container.clone(),
                full_path: folder.full_path.clone(),
            },
            PendingAction::DeleteBucket { container } => Dispatch::DeleteContainer {
                container: container.name.clone(),
            },
            PendingAction::Instance {
                instance_id,
                action,
                ..
            } => Dispatch::Instance {
                instance_id: instance_id.clone(),
                action: *action,
            },
        };

        if matches!(dispatch, Dispatch::Instance { .. }) {
            // The instance board tracks the in-flight call from here on.
            self.slot = None;
        } else {
            slot.phase = Phase::Executing;
        }
        tracing::debug!(%id, ?dispatch, "Action confirmed");
        Ok(dispatch)
    }

    /// Drop the pending action without any remote call.
    pub fn cancel(&mut self, id: ActionId) -> Result<PendingAction, GateError> {
        if self.check(id)?.phase == Phase::Executing {
            return Err(GateError::AlreadyExecuting(id));
        }
        let slot = self.slot.take().ok_or(GateError::NoPending)?;
        tracing::debug!(%id, "Action cancelled");
        Ok(slot.action)
    }

    /// Record the result of an executing action and clear the gate.
    ///
    /// Failures are never retried. A not-empty rejection for a folder or
    /// bucket is reported like any other error.
    pub fn complete(&mut self, id: ActionId, result: &GatewayResult<()>) -> Result<Followup, GateError> {
        if self.check(id)?.phase != Phase::Executing {
            return Err(GateError::NotConfirmed(id));
        }
        let slot = self.slot.take().ok_or(GateError::NoPending)?;

        let followup = match result {
            Ok(()) => {
                tracing::info!(%id, entity = slot.action.target_name(), kind = %slot.action.kind(), "Deleted");
                match slot.action {
                    PendingAction::DeleteBucket { .. } => Followup::ReturnToContainers,
                    _ => Followup::RefreshListing,
                }
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, reason = ?err.reason(), "Deletion failed");
                Followup::Report(err.to_string())
            }
        };
        Ok(followup)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cloudshelf_core::{Container, FileEntry, FolderEntry, GatewayError};

    use super::*;

    fn delete_readme() -> PendingAction {
        PendingAction::delete_file("logs", FileEntry::new("readme.txt", 1, Utc::now()))
    }

    #[test]
    fn test_request_confirm_complete() {
        let mut gate = ActionGate::new();
        let id = gate.request(delete_readme()).unwrap();
        assert!(gate.pending().is_some());

        let dispatch = gate.confirm(id).unwrap();
        assert_eq!(
            dispatch,
            Dispatch::DeleteFile {
                container: "logs".into(),
                full_path: "readme.txt".into()
            }
        );
        assert!(gate.is_executing());

        assert_eq!(gate.complete(id, &Ok(())).unwrap(), Followup::RefreshListing);
        assert!(gate.pending().is_none());
    }

    #[test]
    fn test_new_request_replaces_unconfirmed() {
        let mut gate = ActionGate::new();
        let first = gate.request(delete_readme()).unwrap();
        let second = gate
            .request(PendingAction::delete_folder("logs", FolderEntry::new("2024/")))
            .unwrap();

        assert_eq!(gate.confirm(first), Err(GateError::Superseded(first)));
        assert!(matches!(gate.confirm(second), Ok(Dispatch::DeleteFolder { .. })));
    }

    #[test]
    fn test_request_rejected_while_executing() {
        let mut gate = ActionGate::new();
        let id = gate.request(delete_readme()).unwrap();
        gate.confirm(id).unwrap();

        assert_eq!(gate.request(delete_readme()), Err(GateError::Busy));
        assert_eq!(gate.confirm(id), Err(GateError::AlreadyExecuting(id)));
        assert_eq!(gate.cancel(id), Err(GateError::AlreadyExecuting(id)));
    }

    #[test]
    fn test_cancel_clears() {
        let mut gate = ActionGate::new();
        let id = gate.request(delete_readme()).unwrap();
        let action = gate.cancel(id).unwrap();
        assert_eq!(action.target_name(), "readme.txt");
        assert!(gate.pending().is_none());
        assert_eq!(gate.cancel(id), Err(GateError::NoPending));
    }

    #[test]
    fn test_bucket_failure_reports_and_clears() {
        let mut gate = ActionGate::new();
        let bucket = Container::new("b1", "us-east-1", Utc::now());
        let id = gate.request(PendingAction::delete_bucket(bucket)).unwrap();
        assert_eq!(
            gate.confirm(id).unwrap(),
            Dispatch::DeleteContainer {
                container: "b1".into()
            }
        );

        let result = Err(GatewayError::api(400, "Cannot delete bucket: Bucket is not empty"));
        let followup = gate.complete(id, &result).unwrap();
        assert_eq!(
            followup,
            Followup::Report("Cannot delete bucket: Bucket is not empty".into())
        );
        assert!(gate.pending().is_none());
    }

    #[test]
    fn test_complete_requires_confirmation() {
        let mut gate = ActionGate::new();
        let id = gate.request(delete_readme()).unwrap();
        assert_eq!(gate.complete(id, &Ok(())), Err(GateError::NotConfirmed(id)));
        assert!(gate.pending().is_some());
    }

    #[test]
    fn test_instance_confirm_hands_off() {
        let mut gate = ActionGate::new();
        let id = gate
            .request(PendingAction::instance("i-2", "web", InstanceAction::Terminate))
            .unwrap();
        let dispatch = gate.confirm(id).unwrap();
        assert_eq!(
            dispatch,
            Dispatch::Instance {
                instance_id: "i-2".into(),
                action: InstanceAction::Terminate
            }
        );
        assert!(gate.pending().is_none());
        assert!(!gate.is_executing());
    }
}
