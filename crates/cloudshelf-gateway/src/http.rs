//! [`RemoteGateway`] over the REST backend.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use urlencoding::encode;

use cloudshelf_core::{
    ClientConfig, Container, GatewayError, GatewayResult, Instance, InstanceAction, Listing, Vpc,
};

use crate::gateway::RemoteGateway;
use crate::wire::{Ack, ErrorBody, Health, WireBucket, WireInstance, WireListing, WireVpc};

/// HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    root: String,
}

impl HttpGateway {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            root: config.api_root().to_string(),
        })
    }

    /// Base URL requests are issued against.
    pub fn root(&self) -> &str {
        &self.root
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> GatewayResult<T> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "Sending request");

        let response = self
            .client
            .request(method, &url)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            tracing::debug!(%url, status = status.as_u16(), error = %err, "Request rejected");
            return Err(err);
        }
        serde_json::from_slice(&body).map_err(|e| GatewayError::decode(e.to_string()))
    }

    async fn delete(&self, path: &str) -> GatewayResult<()> {
        let ack: Ack = self.request(Method::DELETE, path).await?;
        tracing::debug!(message = %ack.message, "Delete accepted");
        Ok(())
    }
}

/// Map a non-success response to a [`GatewayError`].
///
/// The backend reports failures as `{"error": "..."}`; anything else falls
/// back to the status line.
pub(crate) fn error_from_response(status: StatusCode, body: &[u8]) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    GatewayError::api(status.as_u16(), message)
}

impl RemoteGateway for HttpGateway {
    async fn health(&self) -> GatewayResult<Health> {
        self.request(Method::GET, "/health").await
    }

    async fn list_containers(&self) -> GatewayResult<Vec<Container>> {
        let wire: Vec<WireBucket> = self.request(Method::GET, "/s3/buckets").await?;
        wire.into_iter().map(Container::try_from).collect()
    }

    async fn list_entries(&self, container: &str, prefix: &str) -> GatewayResult<Listing> {
        let path = format!(
            "/s3/buckets/{}/objects?prefix={}",
            encode(container),
            encode(prefix)
        );
        let wire: WireListing = self.request(Method::GET, &path).await?;
        Listing::try_from(wire)
    }

    async fn delete_file(&self, container: &str, full_path: &str) -> GatewayResult<()> {
        let path = format!(
            "/s3/buckets/{}/objects/{}",
            encode(container),
            encode(full_path)
        );
        self.delete(&path).await
    }

    async fn delete_folder(&self, container: &str, full_path: &str) -> GatewayResult<()> {
        let path = format!(
            "/s3/buckets/{}/folders/{}",
            encode(container),
            encode(full_path)
        );
        self.delete(&path).await
    }

    async fn delete_container(&self, container: &str) -> GatewayResult<()> {
        self.delete(&format!("/s3/buckets/{}", encode(container)))
            .await
    }

    async fn list_instances(&self) -> GatewayResult<Vec<Instance>> {
        let wire: Vec<WireInstance> = self.request(Method::GET, "/ec2/instances").await?;
        wire.into_iter().map(Instance::try_from).collect()
    }

    async fn perform_instance_action(
        &self,
        instance_id: &str,
        action: InstanceAction,
    ) -> GatewayResult<()> {
        let path = format!("/ec2/{action}/{}", encode(instance_id));
        let ack: Ack = self.request(Method::POST, &path).await?;
        tracing::debug!(instance = instance_id, message = %ack.message, "Instance action accepted");
        Ok(())
    }

    async fn list_vpcs(&self) -> GatewayResult<Vec<Vpc>> {
        let wire: Vec<WireVpc> = self.request(Method::GET, "/vpc/vpcs").await?;
        Ok(wire.into_iter().map(Vpc::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use cloudshelf_core::ErrorReason;

    use super::*;

    #[test]
    fn test_error_body_is_surfaced() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            br#"{"error": "Cannot delete folder: Folder is not empty"}"#,
        );
        assert_eq!(err.to_string(), "Cannot delete folder: Folder is not empty");
        assert_eq!(err.reason(), ErrorReason::NotEmpty);
        assert!(matches!(err, GatewayError::Api { status: 400, .. }));
    }

    #[test]
    fn test_error_without_body_uses_status() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway");
        assert_eq!(err.reason(), ErrorReason::Other);
    }

    #[test]
    fn test_root_has_no_trailing_slash() {
        let config = ClientConfig::new("http://localhost:5000/api/");
        let gateway = HttpGateway::new(&config).unwrap();
        assert_eq!(gateway.root(), "http://localhost:5000/api");
        assert_eq!(gateway.url("/health"), "http://localhost:5000/api/health");
    }
}
