//! Cached name resolution for rewritten authorities.

use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::lookup_host;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Resolves `host:port` authorities to socket addresses, caching the
/// result so repeated requests for the same target skip the lookup.
///
/// This is the only shared mutable state in the dispatcher: reads take
/// the lock shared, a miss takes it exclusively just long enough to
/// insert, and an entry is usable by the populating request and every
/// later one. Entries never expire; refresh policy belongs to the
/// hosting gateway.
#[derive(Default)]
pub struct ResolverCache {
    entries: RwLock<HashMap<String, SocketAddr>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `authority`, consulting the cache first.
    ///
    /// Resolution failure is an upstream failure: the request that hit
    /// it is not forwarded and no other instance is tried.
    pub async fn resolve(&self, authority: &str) -> Result<SocketAddr> {
        if let Some(addr) = self.entries.read().await.get(authority) {
            return Ok(*addr);
        }

        let addr = lookup_host(authority)
            .await
            .map_err(|e| DispatchError::Upstream(format!("resolve {}: {}", authority, e)))?
            .next()
            .ok_or_else(|| {
                DispatchError::Upstream(format!("no addresses for {}", authority))
            })?;

        debug!("resolved {} -> {}", authority, addr);
        self.entries
            .write()
            .await
            .insert(authority.to_string(), addr);
        Ok(addr)
    }

    /// Returns the cached address for `authority`, if any.
    pub async fn cached(&self, authority: &str) -> Option<SocketAddr> {
        self.entries.read().await.get(authority).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_loopback() {
        let cache = ResolverCache::new();
        let addr = cache.resolve("127.0.0.1:8081").await.unwrap();
        assert_eq!(addr.port(), 8081);
        assert!(addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn test_resolve_populates_cache() {
        let cache = ResolverCache::new();
        assert!(cache.cached("localhost:9000").await.is_none());

        let addr = cache.resolve("localhost:9000").await.unwrap();
        assert_eq!(cache.cached("localhost:9000").await, Some(addr));

        // Second resolve returns the cached entry.
        assert_eq!(cache.resolve("localhost:9000").await.unwrap(), addr);
    }

    #[tokio::test]
    async fn test_resolve_failure_is_upstream_error() {
        let cache = ResolverCache::new();
        let err = cache
            .resolve("definitely-not-a-real-host.invalid:1")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_concurrent_resolution() {
        let cache = std::sync::Arc::new(ResolverCache::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.resolve("127.0.0.1:7000").await.unwrap() })
            })
            .collect();
        for task in tasks {
            let addr = task.await.unwrap();
            assert_eq!(addr.port(), 7000);
        }
    }
}
