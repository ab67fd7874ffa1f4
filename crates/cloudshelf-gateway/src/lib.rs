//! Remote side of cloudshelf.
//!
//! [`RemoteGateway`] is the seam between the navigation/guard logic and the
//! network. [`HttpGateway`] implements it against the REST backend; tests
//! substitute their own implementations.

mod gateway;
mod http;
mod wire;

pub use gateway::RemoteGateway;
pub use http::HttpGateway;
pub use wire::Health;
