//! Messages flowing from background tasks back into the session.

use cloudshelf_core::{Container, GatewayResult, Instance, InstanceAction, Listing, Vpc};
use cloudshelf_nav::{ContainersTicket, ListingTicket};
use cloudshelf_ops::{ActionId, RefetchTicket};

/// Result of a background gateway call or timer.
#[derive(Debug)]
pub enum SessionEvent {
    /// Container list fetch finished.
    Containers {
        ticket: ContainersTicket,
        result: GatewayResult<Vec<Container>>,
    },
    /// Directory listing fetch finished.
    Listing {
        ticket: ListingTicket,
        result: GatewayResult<Listing>,
    },
    /// A confirmed deletion finished.
    Deletion {
        id: ActionId,
        result: GatewayResult<()>,
    },
    /// Instance list fetch finished.
    Instances {
        generation: u64,
        result: GatewayResult<Vec<Instance>>,
    },
    /// A start/stop/terminate call finished.
    InstanceAction {
        instance_id: String,
        action: InstanceAction,
        result: GatewayResult<()>,
    },
    /// The delay after a start/stop elapsed.
    RefetchDue(RefetchTicket),
    /// VPC list fetch finished.
    Vpcs { result: GatewayResult<Vec<Vpc>> },
}

/// What changed after handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Containers,
    Listing,
    /// A deletion went through; a follow-up fetch may be in flight.
    Deleted,
    Instances,
    Vpcs,
    /// A call failed; the message is now in the banner.
    Failed(String),
    /// Stale or superseded; nothing changed.
    Unchanged,
}
