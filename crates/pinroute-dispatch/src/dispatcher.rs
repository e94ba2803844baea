//! The per-request dispatch state machine.
//!
//! Two states per incoming request: routing, then forwarded
//! (terminal). Undistinguished requests skip straight to the pool;
//! the distinguished "join-like" class goes through the two-phase
//! protocol in [`Dispatcher::dispatch_join`].

use serde::Deserialize;
use tracing::info;

use crate::error::{DispatchError, Result};
use crate::resolver::ResolverCache;
use crate::side_call::{WhereClient, DEFAULT_SIDE_CALL_TIMEOUT};

/// Path prefix identifying the distinguished request class.
pub const PINNED_PATH_PREFIX: &str = "/join";

/// Classifies a request path. Paths under the pinned prefix must be
/// routed deterministically; everything else may go to any pool
/// member.
pub fn is_pinned_path(path: &str) -> bool {
    path.starts_with(PINNED_PATH_PREFIX)
}

/// The designated instance's `join` response.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinReceipt {
    pub status: String,
    pub client_id: String,
    /// Identity of the instance that actually handled the join.
    pub assigned: String,
}

/// Dispatcher for the distinguished request class.
pub struct Dispatcher {
    where_client: WhereClient,
    resolver: ResolverCache,
    http: reqwest::Client,
}

impl Dispatcher {
    /// Creates a dispatcher whose side-calls go to `pool_url` (any
    /// pool member, or a load-balanced name for the whole pool).
    pub fn new(pool_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            where_client: WhereClient::new(pool_url, DEFAULT_SIDE_CALL_TIMEOUT)?,
            resolver: ResolverCache::new(),
            http: reqwest::Client::builder()
                .build()
                .map_err(|e| DispatchError::Setup(e.to_string()))?,
        })
    }

    /// Runs the two-phase protocol for one join request.
    ///
    /// The awaits are strictly sequential: the side-call completes
    /// before the authority rewrite, the rewrite before resolution,
    /// resolution before the forward. Reordering any step would break
    /// the deterministic-routing guarantee.
    pub async fn dispatch_join(&self, client_id: &str) -> Result<JoinReceipt> {
        // Phase one: learn the designated instance from the pool.
        let authority = self.where_client.locate(client_id).await?;

        // Phase two: rewrite the destination authority and forward the
        // original request there.
        let addr = self.resolver.resolve(&authority).await?;
        info!(
            "dispatch: client_id={} rewritten to {} ({})",
            client_id, authority, addr
        );

        let response = self
            .http
            .get(format!("http://{}{}", addr, PINNED_PATH_PREFIX))
            .query(&[("client_id", client_id)])
            .send()
            .await
            .map_err(|e| DispatchError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Upstream(format!(
                "{} returned status {}",
                authority, status
            )));
        }

        response
            .json::<JoinReceipt>()
            .await
            .map_err(|e| DispatchError::Upstream(e.to_string()))
    }

    /// The dispatcher's resolution cache, shared across requests.
    pub fn resolver(&self) -> &ResolverCache {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_path_classification() {
        assert!(is_pinned_path("/join"));
        assert!(is_pinned_path("/join?client_id=1"));
        assert!(!is_pinned_path("/where"));
        assert!(!is_pinned_path("/health"));
        assert!(!is_pinned_path("/"));
    }

    #[tokio::test]
    async fn test_side_call_failure_when_pool_is_down() {
        // Nothing listens on this port by the time the call is made.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let dispatcher = Dispatcher::new(format!("http://{}", dead)).unwrap();
        let err = dispatcher.dispatch_join("123").await.unwrap_err();
        assert!(matches!(err, DispatchError::SideCall(_)));
        assert_eq!(err.gateway_status(), 502);
    }
}
