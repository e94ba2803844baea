//! Process configuration for the routing components.
//!
//! All configuration is read exactly once at startup and passed by
//! reference into the handlers; nothing below performs ambient
//! environment lookups after construction.
//!
//! Environment keys:
//!
//! | Key              | Effect                                                  |
//! |------------------|---------------------------------------------------------|
//! | `PORT`           | Listen port, also reported in the process identity      |
//! | `SERVICE_PREFIX` | Enables templated scaled addressing                     |
//! | `SERVICE_SUFFIX` | Appended after the index in formatted addresses         |
//! | `REPLICAS`       | Replica count; non-positive/unparseable means 1         |
//! | `INDEX_MODE`     | `hash` (default) or `numeric`                           |
//! | `INDEX_BASE`     | Offset added to the computed remainder; default 1       |
//! | `SERVER_PEERS`   | Legacy peer list, used only when no prefix is set       |

use crate::selector::IndexMode;

/// Default listen port when `PORT` is unset or unparseable.
pub const DEFAULT_PORT: u16 = 8081;

/// How many replicas exist and how to index into them.
///
/// Immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaSet {
    /// Number of replicas. A non-positive configured value is stored as 1.
    pub replicas: u32,
    /// Offset added to the computed remainder (1 for Compose-style
    /// naming, 0 for StatefulSet-style naming).
    pub base: i64,
    /// Indexing mode.
    pub mode: IndexMode,
}

impl Default for ReplicaSet {
    fn default() -> Self {
        Self {
            replicas: 1,
            base: 1,
            mode: IndexMode::Hash,
        }
    }
}

/// Naming template for scaled replica addresses:
/// `{prefix}-{index}{suffix}:{port}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTemplate {
    pub prefix: String,
    /// Often empty; StatefulSet deployments use a headless-service
    /// suffix like `.server-headless.ns.svc.cluster.local`.
    pub suffix: String,
    pub port: u16,
}

/// The current process's own reachable identity, reported by `join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    pub hostname: String,
    pub port: u16,
}

impl SelfIdentity {
    /// Detects the identity from the runtime hostname. A hostname
    /// lookup failure falls back to `localhost` rather than failing:
    /// identity reporting must never take the process down.
    pub fn detect(port: u16) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());
        Self { hostname, port }
    }

    /// Formats the identity as `host:port`.
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Full routing configuration, constructed once at process start.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Scaled addressing template. `None` selects the fallback chain
    /// (peer list, then self).
    pub template: Option<AddressTemplate>,
    pub replica_set: ReplicaSet,
    /// Legacy comma-separated peer list, already trimmed and with
    /// empty entries dropped. Consulted only when `template` is `None`.
    pub peers: Vec<String>,
    pub identity: SelfIdentity,
}

impl RoutingConfig {
    /// Reads the configuration from the environment.
    ///
    /// Every key has a defined default; a missing or malformed value
    /// never produces an error, it cascades to the default instead.
    pub fn from_env() -> Self {
        let port = env_parse("PORT", DEFAULT_PORT);

        let template = std::env::var("SERVICE_PREFIX")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|prefix| AddressTemplate {
                prefix,
                suffix: std::env::var("SERVICE_SUFFIX").unwrap_or_default(),
                port,
            });

        let replicas: i64 = env_parse("REPLICAS", 1);
        let replica_set = ReplicaSet {
            replicas: if replicas > 0 { replicas as u32 } else { 1 },
            base: env_parse("INDEX_BASE", 1),
            mode: std::env::var("INDEX_MODE")
                .map(|m| IndexMode::parse(&m))
                .unwrap_or_default(),
        };

        Self {
            template,
            replica_set,
            peers: split_peers(&std::env::var("SERVER_PEERS").unwrap_or_default()),
            identity: SelfIdentity::detect(port),
        }
    }
}

/// Splits a comma-separated peer list, trimming whitespace and
/// dropping empty entries.
pub fn split_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_peers_trims_and_drops_empties() {
        assert_eq!(
            split_peers(" a:1 , b:2 ,, c:3,"),
            vec!["a:1".to_string(), "b:2".to_string(), "c:3".to_string()]
        );
    }

    #[test]
    fn test_split_peers_all_blank() {
        assert!(split_peers("").is_empty());
        assert!(split_peers(" , ,").is_empty());
    }

    #[test]
    fn test_self_identity_host_port() {
        let id = SelfIdentity {
            hostname: "server-1".to_string(),
            port: 8081,
        };
        assert_eq!(id.host_port(), "server-1:8081");
    }

    #[test]
    fn test_detect_never_fails() {
        let id = SelfIdentity::detect(9000);
        assert!(!id.hostname.is_empty());
        assert_eq!(id.port, 9000);
    }

    #[test]
    fn test_from_env_reads_all_keys() {
        // No other test in this binary touches these keys, so the
        // process-wide environment mutation cannot race.
        std::env::set_var("PORT", "9100");
        std::env::set_var("SERVICE_PREFIX", "poc-routing-server");
        std::env::set_var("SERVICE_SUFFIX", ".headless");
        std::env::set_var("REPLICAS", "4");
        std::env::set_var("INDEX_MODE", "numeric");
        std::env::set_var("INDEX_BASE", "0");
        std::env::set_var("SERVER_PEERS", "a:1, b:2");

        let config = RoutingConfig::from_env();
        let template = config.template.expect("prefix was set");
        assert_eq!(template.prefix, "poc-routing-server");
        assert_eq!(template.suffix, ".headless");
        assert_eq!(template.port, 9100);
        assert_eq!(config.replica_set.replicas, 4);
        assert_eq!(config.replica_set.mode, IndexMode::Numeric);
        assert_eq!(config.replica_set.base, 0);
        assert_eq!(config.peers, vec!["a:1".to_string(), "b:2".to_string()]);
        assert_eq!(config.identity.port, 9100);

        // Malformed numbers cascade to defaults, never error.
        std::env::set_var("REPLICAS", "-3");
        std::env::set_var("PORT", "not-a-port");
        let config = RoutingConfig::from_env();
        assert_eq!(config.replica_set.replicas, 1);
        assert_eq!(config.identity.port, DEFAULT_PORT);

        for key in [
            "PORT",
            "SERVICE_PREFIX",
            "SERVICE_SUFFIX",
            "REPLICAS",
            "INDEX_MODE",
            "INDEX_BASE",
            "SERVER_PEERS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_replica_set_default() {
        let rs = ReplicaSet::default();
        assert_eq!(rs.replicas, 1);
        assert_eq!(rs.base, 1);
        assert_eq!(rs.mode, IndexMode::Hash);
    }
}
