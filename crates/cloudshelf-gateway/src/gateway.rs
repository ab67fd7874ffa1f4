//! The remote gateway interface.

use std::future::Future;

use cloudshelf_core::{Container, GatewayResult, Instance, InstanceAction, Listing, Vpc};

use crate::wire::Health;

/// Network operations consumed by cloudshelf.
///
/// Every call may fail with a network error or a structured API error.
/// Timeouts are the implementation's concern.
pub trait RemoteGateway: Send + Sync + 'static {
    /// Check that the backend is reachable.
    fn health(&self) -> impl Future<Output = GatewayResult<Health>> + Send;

    /// List all containers.
    fn list_containers(&self) -> impl Future<Output = GatewayResult<Vec<Container>>> + Send;

    /// List folders and files directly under `prefix`.
    fn list_entries(
        &self,
        container: &str,
        prefix: &str,
    ) -> impl Future<Output = GatewayResult<Listing>> + Send;

    /// Delete a single object.
    fn delete_file(
        &self,
        container: &str,
        full_path: &str,
    ) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Delete a folder prefix. The remote side refuses non-empty folders.
    fn delete_folder(
        &self,
        container: &str,
        full_path: &str,
    ) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Delete a container. The remote side refuses non-empty containers.
    fn delete_container(&self, container: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    /// List all compute instances.
    fn list_instances(&self) -> impl Future<Output = GatewayResult<Vec<Instance>>> + Send;

    /// Start, stop or terminate an instance.
    fn perform_instance_action(
        &self,
        instance_id: &str,
        action: InstanceAction,
    ) -> impl Future<Output = GatewayResult<()>> + Send;

    /// List virtual private networks.
    fn list_vpcs(&self) -> impl Future<Output = GatewayResult<Vec<Vpc>>> + Send;
}
