//! Fetch tags used to discard out-of-order responses.

use std::fmt;

/// Tag for a directory listing fetch: the `(container, prefix)` it was
/// issued for, plus a sequence number so that only the latest fetch for a
/// position is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingTicket {
    container: String,
    prefix: String,
    seq: u64,
}

impl ListingTicket {
    pub(crate) fn new(container: impl Into<String>, prefix: impl Into<String>, seq: u64) -> Self {
        Self {
            container: container.into(),
            prefix: prefix.into(),
            seq,
        }
    }

    /// Container the fetch targets.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Prefix the fetch targets (`""` for the container root).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issue order of the fetch.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether the ticket was issued for this navigation position.
    pub fn matches(&self, container: Option<&str>, prefix: &str) -> bool {
        container == Some(self.container.as_str()) && prefix == self.prefix
    }
}

impl fmt::Display for ListingTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.container, self.prefix)
    }
}

/// Tag for a container list fetch. Only the most recent generation is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainersTicket(pub(crate) u64);

impl ContainersTicket {
    /// Generation number of the fetch.
    pub fn generation(self) -> u64 {
        self.0
    }
}
