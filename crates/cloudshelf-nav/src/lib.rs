//! Virtual directory navigation for cloudshelf.
//!
//! [`DirectoryView`] owns the navigation state (selected container, current
//! prefix, breadcrumbs, last listing) and the transitions between states.
//! Transitions never perform I/O; they return tickets describing the fetch
//! the caller must issue, and responses are fed back through
//! [`DirectoryView::apply_listing`] and [`DirectoryView::apply_containers`],
//! which discard anything issued for a navigation step that is no longer
//! current.

mod ticket;
mod view;

pub use ticket::{ContainersTicket, ListingTicket};
pub use view::{ApplyOutcome, DirectoryView, NavError, NavMode};
