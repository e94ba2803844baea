//! The `where` side-call against the replica pool.

use std::time::Duration;
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Bound on the side-call round trip; expiry is a side-call failure.
pub const DEFAULT_SIDE_CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Extracts the `hostport` field from a `where` response body.
///
/// Contract: returns the value of the first `"hostport"` key whose
/// value is a quoted JSON string, or `None` when the key is absent,
/// the value is not a quoted string, or the value is empty. This is a
/// targeted field extraction, not schema validation; the side-call
/// contract only promises that the field is a quoted string.
pub fn extract_hostport(body: &str) -> Option<String> {
    let after_key = &body[body.find("\"hostport\"")? + "\"hostport\"".len()..];
    let value = after_key
        .trim_start()
        .strip_prefix(':')?
        .trim_start()
        .strip_prefix('"')?;
    let end = value.find('"')?;
    let value = &value[..end];
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Client for the pool-addressed `where` operation.
///
/// The pool URL may point at any member (or a load-balanced name for
/// all of them): the selection function is pure, so every member
/// computes the same answer.
pub struct WhereClient {
    pool_url: String,
    http: reqwest::Client,
}

impl WhereClient {
    pub fn new(pool_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Setup(e.to_string()))?;
        Ok(Self {
            pool_url: pool_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Asks the pool which instance owns `client_id`.
    ///
    /// Connection failure, timeout, a non-success status, and a body
    /// without an extractable `hostport` all collapse to
    /// [`DispatchError::SideCall`].
    pub async fn locate(&self, client_id: &str) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/where", self.pool_url))
            .query(&[("client_id", client_id)])
            .send()
            .await
            .map_err(|e| DispatchError::SideCall(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::SideCall(format!(
                "where returned status {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::SideCall(e.to_string()))?;

        let hostport = extract_hostport(&body).ok_or_else(|| {
            DispatchError::SideCall(format!("no hostport in where response: {}", body))
        })?;
        debug!("side-call: client_id={} located at {}", client_id, hostport);
        Ok(hostport)
    }
}
