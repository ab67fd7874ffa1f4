//! The session: single owner of navigation, guard and instance state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cloudshelf_core::{ClientConfig, GatewayResult, InstanceAction, Vpc};
use cloudshelf_gateway::RemoteGateway;
use cloudshelf_nav::{ApplyOutcome, DirectoryView, ListingTicket, NavError, NavMode};
use cloudshelf_ops::{
    ActionGate, ActionId, Dispatch, Followup, InstanceBoard, InstanceOutcome, PendingAction,
    RefetchTicket,
};

use crate::constants::EVENT_CHANNEL_SIZE;
use crate::error::SessionError;
use crate::event::{SessionEvent, Update};

/// Log a rejected command and hand it back to the caller.
fn rejected<T>(err: impl Into<SessionError>) -> Result<T, SessionError> {
    let err = err.into();
    tracing::warn!(error = %err, "Command rejected");
    Err(err)
}

/// Runtime that executes the remote calls requested by the components.
///
/// Commands mutate local state synchronously and spawn the resulting gateway
/// calls on tokio tasks. Results come back through a bounded channel and are
/// applied one at a time by [`Session::handle`], so every state change
/// happens on the owner's side.
pub struct Session<G: RemoteGateway> {
    gateway: Arc<G>,
    config: ClientConfig,
    view: DirectoryView,
    gate: ActionGate,
    board: InstanceBoard,
    vpcs: Vec<Vpc>,
    banner: Option<String>,
    instances_generation: u64,
    in_flight: usize,
    timers: HashMap<RefetchTicket, JoinHandle<()>>,
    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
}

impl<G: RemoteGateway> Session<G> {
    /// Create a session over a gateway.
    pub fn new(gateway: G, config: ClientConfig) -> Self {
        Self::with_shared(Arc::new(gateway), config)
    }

    /// Create a session over a gateway shared with other owners.
    pub fn with_shared(gateway: Arc<G>, config: ClientConfig) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        Self {
            gateway,
            config,
            view: DirectoryView::new(),
            gate: ActionGate::new(),
            board: InstanceBoard::new(),
            vpcs: Vec::new(),
            banner: None,
            instances_generation: 0,
            in_flight: 0,
            timers: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Navigation state.
    pub fn view(&self) -> &DirectoryView {
        &self.view
    }

    /// Confirmation gate for destructive actions.
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    /// Instance working set.
    pub fn board(&self) -> &InstanceBoard {
        &self.board
    }

    pub fn vpcs(&self) -> &[Vpc] {
        &self.vpcs
    }

    /// VPCs whose name or id contains `term` (case-insensitive) or whose CIDR
    /// block contains it literally.
    pub fn vpcs_matching(&self, term: &str) -> Vec<&Vpc> {
        self.vpcs.iter().filter(|v| v.matches(term)).collect()
    }

    /// Last error reported by a remote call.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Number of gateway calls whose result has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of delayed instance re-fetches still waiting.
    pub fn scheduled_refetches(&self) -> usize {
        self.timers.len()
    }

    // Navigation

    /// Fetch the container list.
    pub fn load_containers(&mut self) {
        self.banner = None;
        self.fetch_containers();
    }

    /// Open a container from the current container list.
    pub fn open_container(&mut self, name: &str) -> Result<(), SessionError> {
        let Some(container) = self.view.find_container(name).cloned() else {
            return rejected(SessionError::UnknownContainer(name.to_string()));
        };
        self.banner = None;
        let ticket = self.view.select_container(container);
        self.fetch_listing(ticket);
        Ok(())
    }

    /// Descend into a folder of the current listing, by name.
    pub fn enter_folder(&mut self, name: &str) -> Result<(), SessionError> {
        let Some(folder) = self.view.find_folder(name).cloned() else {
            return rejected(SessionError::UnknownFolder(name.to_string()));
        };
        let ticket = match self.view.enter_folder(&folder) {
            Ok(ticket) => ticket,
            Err(err) => return rejected(err),
        };
        self.banner = None;
        self.fetch_listing(ticket);
        Ok(())
    }

    /// Jump to a breadcrumb path (`""` for the container root).
    pub fn jump_to(&mut self, path: &str) -> Result<(), SessionError> {
        match self.view.jump_to_breadcrumb(path) {
            Ok(Some(ticket)) => {
                self.banner = None;
                self.fetch_listing(ticket);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => rejected(err),
        }
    }

    /// Go one level up; at the container root, return to the container list.
    pub fn go_up(&mut self) -> Result<(), SessionError> {
        if self.view.mode() == NavMode::DirectoryListing && self.view.current_path().is_empty() {
            self.leave_container();
            return Ok(());
        }
        match self.view.go_up() {
            Ok(Some(ticket)) => {
                self.banner = None;
                self.fetch_listing(ticket);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => rejected(err),
        }
    }

    /// Return to the container list.
    pub fn leave_container(&mut self) {
        self.view.leave_container();
    }

    /// Re-fetch whatever is on screen.
    pub fn refresh(&mut self) {
        self.banner = None;
        match self.view.refresh() {
            Some(ticket) => self.fetch_listing(ticket),
            None => self.fetch_containers(),
        }
    }

    // Instances and networks

    /// Fetch the instance working set.
    pub fn load_instances(&mut self) {
        self.banner = None;
        self.fetch_instances();
    }

    /// Fetch the VPC list.
    pub fn load_vpcs(&mut self) {
        self.banner = None;
        let gateway = Arc::clone(&self.gateway);
        self.spawn_call(async move {
            let result = gateway.list_vpcs().await;
            SessionEvent::Vpcs { result }
        });
    }

    // Guarded actions

    /// Ask to delete a file of the current listing.
    pub fn request_delete_file(&mut self, name: &str) -> Result<ActionId, SessionError> {
        let Some(container) = self.view.selected().map(|c| c.name.clone()) else {
            return rejected(NavError::NoContainer);
        };
        let Some(file) = self.view.find_file(name).cloned() else {
            return rejected(SessionError::UnknownFile(name.to_string()));
        };
        if let Err(err) = self.view.ensure_target(&file.full_path) {
            return rejected(err);
        }
        self.request(PendingAction::delete_file(container, file))
    }

    /// Ask to delete a folder of the current listing.
    pub fn request_delete_folder(&mut self, name: &str) -> Result<ActionId, SessionError> {
        let Some(container) = self.view.selected().map(|c| c.name.clone()) else {
            return rejected(NavError::NoContainer);
        };
        let Some(folder) = self.view.find_folder(name).cloned() else {
            return rejected(SessionError::UnknownFolder(name.to_string()));
        };
        if let Err(err) = self.view.ensure_target(&folder.full_path) {
            return rejected(err);
        }
        self.request(PendingAction::delete_folder(container, folder))
    }

    /// Ask to delete a container from the container list.
    pub fn request_delete_bucket(&mut self, name: &str) -> Result<ActionId, SessionError> {
        let Some(container) = self.view.find_container(name).cloned() else {
            return rejected(SessionError::UnknownContainer(name.to_string()));
        };
        self.request(PendingAction::delete_bucket(container))
    }

    /// Ask to start, stop or terminate an instance.
    pub fn request_instance_action(
        &mut self,
        instance_id: &str,
        action: InstanceAction,
    ) -> Result<ActionId, SessionError> {
        let name = match self.board.check(instance_id, action) {
            Ok(instance) => instance.name.clone(),
            Err(violation) => return rejected(violation),
        };
        self.request(PendingAction::instance(instance_id, name, action))
    }

    fn request(&mut self, action: PendingAction) -> Result<ActionId, SessionError> {
        self.gate.request(action).or_else(rejected)
    }

    /// Confirm the pending action and dispatch its remote call.
    pub fn confirm(&mut self, id: ActionId) -> Result<(), SessionError> {
        let dispatch = self.gate.confirm(id).or_else(rejected)?;
        self.banner = None;
        let gateway = Arc::clone(&self.gateway);

        match dispatch {
            Dispatch::Instance {
                instance_id,
                action,
            } => {
                if let Err(violation) = self.board.begin(&instance_id, action) {
                    return rejected(violation);
                }
                self.spawn_call(async move {
                    let result = gateway.perform_instance_action(&instance_id, action).await;
                    SessionEvent::InstanceAction {
                        instance_id,
                        action,
                        result,
                    }
                });
            }
            Dispatch::DeleteFile {
                container,
                full_path,
            } => self.spawn_call(async move {
                let result = gateway.delete_file(&container, &full_path).await;
                SessionEvent::Deletion { id, result }
            }),
            Dispatch::DeleteFolder {
                container,
                full_path,
            } => self.spawn_call(async move {
                let result = gateway.delete_folder(&container, &full_path).await;
                SessionEvent::Deletion { id, result }
            }),
            Dispatch::DeleteContainer { container } => self.spawn_call(async move {
                let result = gateway.delete_container(&container).await;
                SessionEvent::Deletion { id, result }
            }),
        }
        Ok(())
    }

    /// Drop the pending action. Never touches the network.
    pub fn cancel(&mut self, id: ActionId) -> Result<PendingAction, SessionError> {
        self.gate.cancel(id).or_else(rejected)
    }

    // Event handling

    /// Wait for the next background result.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Apply a background result to the owning component.
    pub fn handle(&mut self, event: SessionEvent) -> Update {
        match event {
            SessionEvent::Containers { ticket, result } => {
                self.call_done();
                let outcome = self.view.apply_containers(ticket, result);
                self.applied(outcome, Update::Containers)
            }
            SessionEvent::Listing { ticket, result } => {
                self.call_done();
                let outcome = self.view.apply_listing(&ticket, result);
                self.applied(outcome, Update::Listing)
            }
            SessionEvent::Deletion { id, result } => {
                self.call_done();
                self.finish_deletion(id, &result)
            }
            SessionEvent::Instances { generation, result } => {
                self.call_done();
                if generation != self.instances_generation {
                    tracing::debug!(generation, "Discarding stale instance list");
                    return Update::Unchanged;
                }
                match result {
                    Ok(instances) => {
                        self.board.replace(instances);
                        let board = &self.board;
                        self.timers.retain(|ticket, handle| {
                            let keep = board.has_scheduled(ticket.instance_id());
                            if !keep {
                                handle.abort();
                            }
                            keep
                        });
                        Update::Instances
                    }
                    Err(err) => self.report(err.to_string()),
                }
            }
            SessionEvent::InstanceAction {
                instance_id,
                action,
                result,
            } => {
                self.call_done();
                self.finish_instance_action(&instance_id, action, &result)
            }
            SessionEvent::RefetchDue(ticket) => {
                self.timers.remove(&ticket);
                if self.board.take_due(&ticket) {
                    tracing::debug!(instance = ticket.instance_id(), "Re-fetching instances");
                    self.fetch_instances();
                }
                Update::Unchanged
            }
            SessionEvent::Vpcs { result } => {
                self.call_done();
                match result {
                    Ok(vpcs) => {
                        self.vpcs = vpcs;
                        Update::Vpcs
                    }
                    Err(err) => self.report(err.to_string()),
                }
            }
        }
    }

    /// Handle events until no gateway call is in flight.
    pub async fn settle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.in_flight > 0 {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            updates.push(self.handle(event));
        }
        updates
    }

    /// Like [`Session::settle`], but also waits out scheduled re-fetches.
    pub async fn settle_all(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.in_flight > 0 || !self.timers.is_empty() {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            updates.push(self.handle(event));
        }
        updates
    }

    /// Handle whatever results are already queued, without waiting.
    pub fn drain(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            updates.push(self.handle(event));
        }
        updates
    }

    fn finish_deletion(&mut self, id: ActionId, result: &GatewayResult<()>) -> Update {
        match self.gate.complete(id, result) {
            Ok(Followup::RefreshListing) => {
                if let Some(ticket) = self.view.refresh() {
                    self.fetch_listing(ticket);
                }
                Update::Deleted
            }
            Ok(Followup::ReturnToContainers) => {
                self.view.leave_container();
                self.fetch_containers();
                Update::Deleted
            }
            Ok(Followup::Report(message)) => self.report(message),
            Err(err) => {
                tracing::warn!(error = %err, "Deletion result did not match the gate");
                Update::Unchanged
            }
        }
    }

    fn finish_instance_action(
        &mut self,
        instance_id: &str,
        action: InstanceAction,
        result: &GatewayResult<()>,
    ) -> Update {
        match self.board.finish(instance_id, action, result) {
            Ok(InstanceOutcome::Removed) => {
                self.cancel_timers(instance_id);
                Update::Instances
            }
            Ok(InstanceOutcome::RefetchScheduled(ticket)) => {
                self.schedule_refetch(ticket);
                Update::Instances
            }
            Ok(InstanceOutcome::Untracked) => Update::Unchanged,
            Ok(InstanceOutcome::Failed(message)) => self.report(message),
            Err(violation) => {
                tracing::warn!(error = %violation, "Instance result did not match the board");
                match result {
                    Err(err) => self.report(err.to_string()),
                    Ok(()) => Update::Unchanged,
                }
            }
        }
    }

    fn applied(&mut self, outcome: ApplyOutcome, update: Update) -> Update {
        match outcome {
            ApplyOutcome::Applied => update,
            ApplyOutcome::Stale => Update::Unchanged,
            ApplyOutcome::Failed(message) => self.report(message),
        }
    }

    fn report(&mut self, message: String) -> Update {
        self.banner = Some(message.clone());
        Update::Failed(message)
    }

    fn call_done(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    // Dispatch

    fn spawn_call<F>(&mut self, call: F)
    where
        F: Future<Output = SessionEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(call.await).await;
        });
    }

    fn fetch_containers(&mut self) {
        let ticket = self.view.reload_containers();
        let gateway = Arc::clone(&self.gateway);
        self.spawn_call(async move {
            let result = gateway.list_containers().await;
            SessionEvent::Containers { ticket, result }
        });
    }

    fn fetch_listing(&mut self, ticket: ListingTicket) {
        tracing::debug!(%ticket, "Fetching listing");
        let gateway = Arc::clone(&self.gateway);
        self.spawn_call(async move {
            let result = gateway
                .list_entries(ticket.container(), ticket.prefix())
                .await;
            SessionEvent::Listing { ticket, result }
        });
    }

    fn fetch_instances(&mut self) {
        self.instances_generation += 1;
        let generation = self.instances_generation;
        let gateway = Arc::clone(&self.gateway);
        self.spawn_call(async move {
            let result = gateway.list_instances().await;
            SessionEvent::Instances { generation, result }
        });
    }

    fn schedule_refetch(&mut self, ticket: RefetchTicket) {
        self.cancel_timers(ticket.instance_id());
        let delay = self.config.refetch_delay();
        let tx = self.tx.clone();
        let key = ticket.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionEvent::RefetchDue(ticket)).await;
        });
        self.timers.insert(key, handle);
    }

    fn cancel_timers(&mut self, instance_id: &str) {
        self.timers.retain(|ticket, handle| {
            if ticket.instance_id() == instance_id {
                handle.abort();
                false
            } else {
                true
            }
        });
    }
}

impl<G: RemoteGateway> Drop for Session<G> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
