//! Core types and pure functions for cloudshelf.
//!
//! This crate provides the data structures shared by every other cloudshelf
//! crate: containers and their entries, compute instances, the path model
//! that turns key prefixes into breadcrumbs, the error taxonomy for remote
//! calls, and the client configuration.

mod config;
mod error;
mod instance;
mod model;
pub mod path;
mod size;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ErrorReason, GatewayError, GatewayResult};
pub use instance::{Instance, InstanceAction, InstanceState, Vpc};
pub use model::{Container, Entry, FileEntry, FolderEntry, Listing};
pub use path::{Breadcrumb, DELIMITER};
pub use size::{format_size, parse_size};
