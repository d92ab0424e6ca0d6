//! HTTP-backed remote gateway.
//!
//! The actual HTTP client is abstracted behind a trait so embedders can plug
//! in whatever library their platform uses (reqwest, ureq, a webview fetch
//! bridge) without this crate pinning one.

use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use tillsync_protocol::{PullRequest, PullResponse, PushRequest, PushResponse};
use tillsync_store::{OutboxEntry, Record, Table};

/// HTTP client abstraction.
///
/// One method is enough: both gateway RPCs are POSTs of a JSON body to the
/// single configured endpoint.
pub trait HttpClient: Send + Sync {
    /// Sends a POST and returns the response body.
    ///
    /// Non-2xx statuses must be reported as `Err`.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;
}

/// A [`RemoteGateway`] speaking the JSON wire contract over HTTP.
pub struct HttpGateway<C: HttpClient> {
    endpoint: String,
    client: C,
}

impl<C: HttpClient> HttpGateway<C> {
    /// Creates a gateway posting to the given endpoint URL.
    pub fn new(endpoint: impl Into<String>, client: C) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post(&self, body: Vec<u8>) -> SyncResult<Vec<u8>> {
        self.client
            .post(&self.endpoint, body)
            .map_err(SyncError::transport_retryable)
    }
}

impl<C: HttpClient> RemoteGateway for HttpGateway<C> {
    fn push_outbox(&self, entries: &[OutboxEntry]) -> SyncResult<bool> {
        let request = PushRequest::new(entries.to_vec());
        let response_body = self.post(request.to_bytes()?)?;
        let response = PushResponse::from_bytes(&response_body)?;
        Ok(response.success)
    }

    fn fetch_updates(&self, table: Table, since: i64) -> SyncResult<Vec<Record>> {
        let request = PullRequest::new(table, since);
        let response_body = self.post(request.to_bytes()?)?;
        let response = PullResponse::from_bytes(&response_body)?;
        Ok(response.records())
    }
}

/// Routes requests straight to an in-process handler.
///
/// Lets integration tests exercise the full wire encode/decode path without
/// network overhead.
pub struct LoopbackClient<H: LoopbackHandler> {
    handler: H,
}

impl<H: LoopbackHandler> LoopbackClient<H> {
    /// Creates a loopback client over the given handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

/// An in-process request handler standing in for the remote backend.
pub trait LoopbackHandler: Send + Sync {
    /// Handles a POSTed body and returns the response body.
    fn handle(&self, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<H: LoopbackHandler + ?Sized> LoopbackHandler for std::sync::Arc<H> {
    fn handle(&self, body: &[u8]) -> Result<Vec<u8>, String> {
        (**self).handle(body)
    }
}

impl<H: LoopbackHandler> HttpClient for LoopbackClient<H> {
    fn post(&self, _url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        self.handler.handle(&body)
    }
}
