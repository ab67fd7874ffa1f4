//! Instance working set with per-instance busy flags.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use cloudshelf_core::{GatewayResult, Instance, InstanceAction, InstanceState};

use crate::lifecycle::LifecycleGuard;

/// An instance action attempted while the guards disallow it.
///
/// Callers are expected to disable the control instead of hitting this.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardViolation {
    #[error("Unknown instance {id}")]
    UnknownInstance { id: String },

    #[error("Instance {id} already has an action in flight")]
    Busy { id: String },

    #[error("Cannot {action} instance {id} while it is {state}")]
    NotPermitted {
        id: String,
        action: InstanceAction,
        state: InstanceState,
    },

    #[error("Instance {id} has no action in flight")]
    NotBusy { id: String },
}

/// Tag for a delayed instance re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefetchTicket {
    instance_id: String,
    seq: u64,
}

impl RefetchTicket {
    /// Instance whose action scheduled the re-fetch.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

/// What follows a finished instance action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceOutcome {
    /// Terminated; already dropped from the working set.
    Removed,
    /// Start/stop accepted; fetch the full set once the ticket is due.
    RefetchScheduled(RefetchTicket),
    /// Accepted, but the instance left the working set in the meantime.
    Untracked,
    /// The call failed; state unchanged.
    Failed(String),
}

/// The local working set of instances.
#[derive(Debug, Default)]
pub struct InstanceBoard {
    instances: Vec<Instance>,
    busy: HashSet<String>,
    scheduled: HashMap<String, u64>,
    next_seq: u64,
}

impl InstanceBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances in the working set.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Look up an instance.
    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Whether the instance has an action in flight.
    pub fn is_busy(&self, id: &str) -> bool {
        self.busy.contains(id)
    }

    /// Whether a re-fetch is scheduled on behalf of the instance.
    pub fn has_scheduled(&self, id: &str) -> bool {
        self.scheduled.contains_key(id)
    }

    /// Whether the control for `action` should be enabled.
    pub fn can_perform(&self, id: &str, action: InstanceAction) -> bool {
        self.get(id)
            .is_some_and(|i| !self.is_busy(id) && LifecycleGuard::permits(i.state, action))
    }

    /// Replace the working set with a fresh fetch.
    ///
    /// Terminated instances are dropped. Scheduled re-fetches of instances
    /// that disappeared are forgotten. Busy flags follow the calls in flight,
    /// not the working set, and are only cleared by [`InstanceBoard::finish`].
    pub fn replace(&mut self, instances: Vec<Instance>) {
        self.instances = instances
            .into_iter()
            .filter(|i| i.state != InstanceState::Terminated)
            .collect();

        let present: HashSet<&str> = self.instances.iter().map(|i| i.id.as_str()).collect();
        self.scheduled.retain(|id, _| present.contains(id.as_str()));
    }

    /// Check the guards for `action` without marking anything.
    pub fn check(&self, id: &str, action: InstanceAction) -> Result<&Instance, GuardViolation> {
        let instance = self.get(id).ok_or_else(|| GuardViolation::UnknownInstance {
            id: id.to_string(),
        })?;
        if self.busy.contains(id) {
            return Err(GuardViolation::Busy { id: id.to_string() });
        }
        if !LifecycleGuard::permits(instance.state, action) {
            return Err(GuardViolation::NotPermitted {
                id: id.to_string(),
                action,
                state: instance.state,
            });
        }
        Ok(instance)
    }

    /// Mark an action as in flight after checking the guards.
    pub fn begin(&mut self, id: &str, action: InstanceAction) -> Result<(), GuardViolation> {
        self.check(id, action)?;
        self.busy.insert(id.to_string());
        tracing::debug!(instance = id, %action, "Instance action in flight");
        Ok(())
    }

    /// Record the result of an in-flight action and clear the busy flag.
    pub fn finish(
        &mut self,
        id: &str,
        action: InstanceAction,
        result: &GatewayResult<()>,
    ) -> Result<InstanceOutcome, GuardViolation> {
        if !self.busy.remove(id) {
            return Err(GuardViolation::NotBusy { id: id.to_string() });
        }

        if let Err(err) = result {
            tracing::warn!(instance = id, %action, error = %err, "Instance action failed");
            return Ok(InstanceOutcome::Failed(err.to_string()));
        }

        tracing::info!(instance = id, %action, "Instance action accepted");
        if action == InstanceAction::Terminate {
            self.remove(id);
            return Ok(InstanceOutcome::Removed);
        }
        if self.get(id).is_none() {
            return Ok(InstanceOutcome::Untracked);
        }

        self.next_seq += 1;
        self.scheduled.insert(id.to_string(), self.next_seq);
        Ok(InstanceOutcome::RefetchScheduled(RefetchTicket {
            instance_id: id.to_string(),
            seq: self.next_seq,
        }))
    }

    /// Drop an instance and anything scheduled for it.
    pub fn remove(&mut self, id: &str) -> Option<Instance> {
        self.busy.remove(id);
        self.scheduled.remove(id);
        let index = self.instances.iter().position(|i| i.id == id)?;
        Some(self.instances.remove(index))
    }

    /// Consume a due re-fetch ticket.
    ///
    /// Returns `false` when the ticket was superseded by a later action or
    /// the instance is gone, in which case no fetch should be issued.
    pub fn take_due(&mut self, ticket: &RefetchTicket) -> bool {
        match self.scheduled.get(&ticket.instance_id) {
            Some(seq) if *seq == ticket.seq => {
                self.scheduled.remove(&ticket.instance_id);
                self.get(&ticket.instance_id).is_some()
            }
            _ => false,
        }
    }
}
