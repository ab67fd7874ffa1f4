//! Runtime for cloudshelf.
//!
//! A [`Session`] owns the navigation view, the confirmation gate and the
//! instance board, and runs the gateway calls they ask for on tokio tasks.
//! Results are funnelled back through a channel as [`SessionEvent`]s.

mod constants;
mod error;
mod event;
mod session;
mod settings;

pub use error::SessionError;
pub use event::{SessionEvent, Update};
pub use session::Session;
pub use settings::{Settings, SettingsError};
