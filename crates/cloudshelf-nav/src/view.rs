//! Navigation state and transitions.

use thiserror::Error;

use cloudshelf_core::path::{self, breadcrumbs_of};
use cloudshelf_core::{Breadcrumb, Container, FileEntry, FolderEntry, GatewayResult, Listing};

use crate::ticket::{ContainersTicket, ListingTicket};

/// Which screen the navigation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    /// No container selected; the container list is shown.
    ContainerList,
    /// A container and prefix are selected.
    DirectoryListing,
}

/// A navigation request that is illegal in the current state.
///
/// These are contract failures of the caller (a control that should have
/// been disabled), not user-facing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavError {
    /// The transition needs a selected container.
    #[error("No container selected")]
    NoContainer,

    /// The target does not live under the current prefix.
    #[error("{path} is not under the current path {current:?}")]
    StaleTarget { path: String, current: String },

    /// The target is not a folder path.
    #[error("Not a folder: {path}")]
    NotAFolder { path: String },
}

/// What happened to a fetch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response replaced the current state.
    Applied,
    /// The response was for a navigation step that is no longer current.
    Stale,
    /// The fetch failed; prior state is kept.
    Failed(String),
}

/// Navigation state for browsing one object store.
#[derive(Debug, Clone, Default)]
pub struct DirectoryView {
    containers: Vec<Container>,
    containers_generation: u64,
    containers_loading: bool,
    selected: Option<Container>,
    current_path: String,
    breadcrumbs: Vec<Breadcrumb>,
    listing: Listing,
    listed_path: String,
    listing_seq: u64,
    loading: bool,
    error: Option<String>,
}

impl DirectoryView {
    /// Create a view on the (empty) container list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current navigation mode.
    pub fn mode(&self) -> NavMode {
        if self.selected.is_some() {
            NavMode::DirectoryListing
        } else {
            NavMode::ContainerList
        }
    }

    /// Known containers from the last successful container fetch.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// The selected container, if any.
    pub fn selected(&self) -> Option<&Container> {
        self.selected.as_ref()
    }

    fn selected_name(&self) -> Option<&str> {
        self.selected.as_ref().map(|c| c.name.as_str())
    }

    /// Current prefix (`""` for the container root).
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Breadcrumb trail for the current prefix.
    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    /// Last successfully applied listing.
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Whether a listing fetch for the current position is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a container list fetch is outstanding.
    pub fn is_loading_containers(&self) -> bool {
        self.containers_loading
    }

    /// Message of the last failed fetch, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Look up a container by name in the container list.
    pub fn find_container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Look up a folder in the current listing by name.
    pub fn find_folder(&self, name: &str) -> Option<&FolderEntry> {
        let name = name.trim_end_matches(path::DELIMITER);
        self.listing.folders.iter().find(|f| f.name == name)
    }

    /// Look up a file in the current listing by name.
    pub fn find_file(&self, name: &str) -> Option<&FileEntry> {
        self.listing.files.iter().find(|f| f.name == name)
    }

    /// Check that `full_path` is a direct child of the current path and that
    /// the listing on screen was fetched for the current path.
    ///
    /// Until the fetch for a newly entered folder succeeds, the listing still
    /// holds the previous folder's entries; destructive requests built from
    /// it are rejected.
    pub fn ensure_target(&self, full_path: &str) -> Result<(), NavError> {
        if self.selected.is_none() {
            return Err(NavError::NoContainer);
        }
        let listed_here = self.listed_path == self.current_path;
        if !listed_here || path::parent_of(full_path) != self.current_path {
            return Err(NavError::StaleTarget {
                path: full_path.to_string(),
                current: self.current_path.clone(),
            });
        }
        Ok(())
    }

    fn next_ticket(&mut self, container: String) -> ListingTicket {
        self.listing_seq += 1;
        ListingTicket::new(container, self.current_path.clone(), self.listing_seq)
    }

    fn set_path(&mut self, prefix: String) {
        self.breadcrumbs = breadcrumbs_of(&prefix);
        self.current_path = prefix;
    }

    fn issue_listing(&mut self) -> Option<ListingTicket> {
        let container = self.selected_name()?.to_string();
        self.loading = true;
        Some(self.next_ticket(container))
    }

    /// Start a container list fetch.
    pub fn reload_containers(&mut self) -> ContainersTicket {
        self.containers_generation += 1;
        self.containers_loading = true;
        ContainersTicket(self.containers_generation)
    }

    /// Apply a container list response.
    pub fn apply_containers(
        &mut self,
        ticket: ContainersTicket,
        result: GatewayResult<Vec<Container>>,
    ) -> ApplyOutcome {
        if ticket.0 != self.containers_generation {
            tracing::debug!(
                generation = ticket.0,
                current = self.containers_generation,
                "Discarding stale container list"
            );
            return ApplyOutcome::Stale;
        }

        self.containers_loading = false;
        match result {
            Ok(containers) => {
                self.containers = containers;
                self.error = None;
                ApplyOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                self.error = Some(message.clone());
                ApplyOutcome::Failed(message)
            }
        }
    }

    /// Open a container at its root.
    ///
    /// Any listing from a previously selected container is discarded.
    pub fn select_container(&mut self, container: Container) -> ListingTicket {
        tracing::debug!(container = %container.name, "Selecting container");
        self.listing = Listing::default();
        self.listed_path.clear();
        self.set_path(String::new());
        self.loading = true;
        let ticket = self.next_ticket(container.name.clone());
        self.selected = Some(container);
        ticket
    }

    /// Descend into a folder of the current listing.
    pub fn enter_folder(&mut self, folder: &FolderEntry) -> Result<ListingTicket, NavError> {
        if self.selected.is_none() {
            return Err(NavError::NoContainer);
        }
        if !path::is_folder_path(&folder.full_path) {
            return Err(NavError::NotAFolder {
                path: folder.full_path.clone(),
            });
        }
        if !folder.full_path.starts_with(&self.current_path) {
            return Err(NavError::StaleTarget {
                path: folder.full_path.clone(),
                current: self.current_path.clone(),
            });
        }

        self.set_path(folder.full_path.clone());
        self.issue_listing().ok_or(NavError::NoContainer)
    }

    /// Jump to a breadcrumb path (`""` for the container root).
    ///
    /// Returns `Ok(None)` when `path` is already the current path.
    pub fn jump_to_breadcrumb(&mut self, path: &str) -> Result<Option<ListingTicket>, NavError> {
        if self.selected.is_none() {
            return Err(NavError::NoContainer);
        }
        let path = path::normalize_prefix(path);
        if path == self.current_path {
            return Ok(None);
        }

        self.set_path(path);
        Ok(self.issue_listing())
    }

    /// Jump to the parent of the current prefix. `None` at the root.
    pub fn go_up(&mut self) -> Result<Option<ListingTicket>, NavError> {
        if self.selected.is_none() {
            return Err(NavError::NoContainer);
        }
        if self.current_path.is_empty() {
            return Ok(None);
        }
        let parent = path::parent_of(&self.current_path);
        self.jump_to_breadcrumb(&parent)
    }

    /// Return to the container list, discarding prefix and listing state.
    pub fn leave_container(&mut self) {
        self.selected = None;
        self.listing = Listing::default();
        self.listed_path.clear();
        self.set_path(String::new());
        self.loading = false;
    }

    /// Re-issue the fetch for the current position. `None` on the container
    /// list.
    pub fn refresh(&mut self) -> Option<ListingTicket> {
        self.issue_listing()
    }

    /// Apply a directory listing response.
    ///
    /// The response only touches state when its ticket is the latest one
    /// issued and matches the current `(container, prefix)`. On failure the
    /// previous listing stays visible.
    pub fn apply_listing(
        &mut self,
        ticket: &ListingTicket,
        result: GatewayResult<Listing>,
    ) -> ApplyOutcome {
        if ticket.seq() != self.listing_seq
            || !ticket.matches(self.selected_name(), &self.current_path)
        {
            tracing::debug!(%ticket, seq = ticket.seq(), "Discarding stale listing");
            return ApplyOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(listing) => {
                if listing.current_prefix != self.current_path {
                    tracing::warn!(
                        expected = %self.current_path,
                        got = %listing.current_prefix,
                        "Listing prefix differs from request"
                    );
                }
                self.listing = listing;
                self.listed_path.clone_from(&self.current_path);
                self.error = None;
                ApplyOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                self.error = Some(message.clone());
                ApplyOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cloudshelf_core::{FileEntry, GatewayError};

    use super::*;

    fn bucket(name: &str) -> Container {
        Container::new(name, "us-east-1", Utc::now())
    }

    fn listing(prefix: &str, folders: &[&str], files: &[&str]) -> Listing {
        Listing {
            folders: folders.iter().map(|f| FolderEntry::new(*f)).collect(),
            files: files
                .iter()
                .map(|f| FileEntry::new(*f, 1, Utc::now()))
                .collect(),
            current_prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_select_container_starts_at_root() {
        let mut view = DirectoryView::new();
        assert_eq!(view.mode(), NavMode::ContainerList);

        let ticket = view.select_container(bucket("logs"));
        assert_eq!(view.mode(), NavMode::DirectoryListing);
        assert_eq!(ticket.container(), "logs");
        assert_eq!(ticket.prefix(), "");
        assert!(view.breadcrumbs().is_empty());
        assert!(view.is_loading());
    }

    #[test]
    fn test_enter_folder_requires_container() {
        let mut view = DirectoryView::new();
        let err = view.enter_folder(&FolderEntry::new("a/")).unwrap_err();
        assert_eq!(err, NavError::NoContainer);
    }

    #[test]
    fn test_enter_folder_rejects_stale_target() {
        let mut view = DirectoryView::new();
        view.select_container(bucket("logs"));
        view.enter_folder(&FolderEntry::new("2024/")).unwrap();

        // A click target from the root listing after we moved on.
        let err = view.enter_folder(&FolderEntry::new("2023/")).unwrap_err();
        assert!(matches!(err, NavError::StaleTarget { .. }));
        assert_eq!(view.current_path(), "2024/");
    }

    #[test]
    fn test_breadcrumb_jump_noop_on_same_path() {
        let mut view = DirectoryView::new();
        view.select_container(bucket("logs"));
        view.enter_folder(&FolderEntry::new("2024/")).unwrap();

        assert_eq!(view.jump_to_breadcrumb("2024/").unwrap(), None);
        let ticket = view.jump_to_breadcrumb("").unwrap().unwrap();
        assert_eq!(ticket.prefix(), "");
        assert!(view.breadcrumbs().is_empty());
    }

    #[test]
    fn test_go_up() {
        let mut view = DirectoryView::new();
        view.select_container(bucket("logs"));
        assert_eq!(view.go_up().unwrap(), None);

        view.enter_folder(&FolderEntry::new("a/")).unwrap();
        view.enter_folder(&FolderEntry::new("a/b/")).unwrap();
        let ticket = view.go_up().unwrap().unwrap();
        assert_eq!(ticket.prefix(), "a/");
        assert_eq!(view.current_path(), "a/");
    }

    #[test]
    fn test_failed_fetch_keeps_listing() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &["2024/"], &["readme.txt"])));

        let ticket = view.refresh().unwrap();
        let outcome = view.apply_listing(&ticket, Err(GatewayError::network("timeout")));
        assert!(matches!(outcome, ApplyOutcome::Failed(_)));
        assert_eq!(view.listing().len(), 2);
        assert!(view.error().is_some());
        assert!(!view.is_loading());
    }

    #[test]
    fn test_leave_container_discards_everything() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &["2024/"], &[])));
        view.enter_folder(&FolderEntry::new("2024/")).unwrap();

        view.leave_container();
        assert_eq!(view.mode(), NavMode::ContainerList);
        assert_eq!(view.current_path(), "");
        assert!(view.breadcrumbs().is_empty());
        assert!(view.listing().is_empty());
        assert!(view.refresh().is_none());
    }

    #[test]
    fn test_stale_container_list_discarded() {
        let mut view = DirectoryView::new();
        let first = view.reload_containers();
        let second = view.reload_containers();

        assert_eq!(
            view.apply_containers(second, Ok(vec![bucket("new")])),
            ApplyOutcome::Applied
        );
        assert_eq!(
            view.apply_containers(first, Ok(vec![bucket("old")])),
            ApplyOutcome::Stale
        );
        assert_eq!(view.containers()[0].name, "new");
    }

    #[test]
    fn test_older_fetch_for_same_path_discarded() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &[], &["a.txt", "b.txt"])));

        let slow = view.refresh().unwrap();
        let fresh = view.refresh().unwrap();
        assert_eq!(
            view.apply_listing(&fresh, Ok(listing("", &[], &["b.txt"]))),
            ApplyOutcome::Applied
        );
        assert_eq!(
            view.apply_listing(&slow, Ok(listing("", &[], &["a.txt", "b.txt"]))),
            ApplyOutcome::Stale
        );
        assert_eq!(view.listing().len(), 1);
    }

    #[test]
    fn test_loading_stays_until_latest_fetch() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &[], &[])));

        let slow = view.refresh().unwrap();
        let _fresh = view.refresh().unwrap();
        view.apply_listing(&slow, Ok(listing("", &[], &[])));
        assert!(view.is_loading());
    }

    #[test]
    fn test_ensure_target_after_failed_enter() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &["2024/"], &["readme.txt"])));
        assert_eq!(view.ensure_target("readme.txt"), Ok(()));
        assert_eq!(view.ensure_target("2024/"), Ok(()));

        let ticket = view.enter_folder(&FolderEntry::new("2024/")).unwrap();
        view.apply_listing(&ticket, Err(GatewayError::network("timeout")));

        // The root listing is still on screen while the path says 2024/.
        assert!(view.find_file("readme.txt").is_some());
        assert!(matches!(
            view.ensure_target("readme.txt"),
            Err(NavError::StaleTarget { .. })
        ));
    }

    #[test]
    fn test_ensure_target_rejects_foreign_parent() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &[], &[])));
        assert!(view.ensure_target("2024/readme.txt").is_err());

        view.leave_container();
        assert_eq!(view.ensure_target("readme.txt"), Err(NavError::NoContainer));
    }

    #[test]
    fn test_find_helpers() {
        let mut view = DirectoryView::new();
        let ticket = view.select_container(bucket("logs"));
        view.apply_listing(&ticket, Ok(listing("", &["2024/"], &["readme.txt"])));

        assert!(view.find_folder("2024").is_some());
        assert!(view.find_folder("2024/").is_some());
        assert!(view.find_file("readme.txt").is_some());
        assert!(view.find_file("2024").is_none());
    }
}
