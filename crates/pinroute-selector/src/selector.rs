//! The instance selection algorithm.
//!
//! `compute_index` maps a client identifier onto a replica index in
//! `[base, base + replicas - 1]`; `format_address` turns that index
//! into a network address; `select_route` stitches the two together
//! with the three-tier deployment fallback.

use crate::config::{AddressTemplate, RoutingConfig};

/// How a client identifier is turned into a replica remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// FNV-1a over the identifier bytes (default).
    #[default]
    Hash,
    /// Parse the identifier as a signed integer and use its absolute
    /// value; falls back to [`IndexMode::Hash`] per call when the
    /// identifier does not parse.
    Numeric,
}

impl IndexMode {
    /// Parses a mode string, case-insensitively. Anything other than
    /// `numeric` selects [`IndexMode::Hash`].
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("numeric") {
            IndexMode::Numeric
        } else {
            IndexMode::Hash
        }
    }
}

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// 32-bit FNV-1a over `bytes`.
///
/// Non-cryptographic but well distributed; the standard offset basis
/// and prime keep the mapping identical to every other FNV-1a
/// implementation, so independently configured processes agree on it.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Computes the deterministic replica index for a client identifier.
///
/// A non-positive `replicas` is treated as 1, so the modulo can never
/// fault. In [`IndexMode::Numeric`], an identifier that fails to parse
/// as an integer silently falls back to hash mode for that call; the
/// selector favors availability over strict error signaling.
///
/// The result is always within `[base, base + replicas - 1]`.
pub fn compute_index(client_id: &str, replicas: u32, mode: IndexMode, base: i64) -> i64 {
    let replicas = replicas.max(1);

    let remainder = match mode {
        IndexMode::Numeric => match client_id.parse::<i64>() {
            Ok(n) => n.unsigned_abs() % u64::from(replicas),
            Err(_) => u64::from(fnv1a32(client_id.as_bytes()) % replicas),
        },
        IndexMode::Hash => u64::from(fnv1a32(client_id.as_bytes()) % replicas),
    };

    remainder as i64 + base
}

/// Formats a replica index into a network address:
/// `{prefix}-{index}{suffix}:{port}`.
///
/// Pure string formatting; reachability is not validated.
pub fn format_address(index: i64, template: &AddressTemplate) -> String {
    format!(
        "{}-{}{}:{}",
        template.prefix, index, template.suffix, template.port
    )
}

/// Resolves the target address for a client identifier through the
/// three-tier fallback chain:
///
/// 1. A configured [`AddressTemplate`] selects templated scaled
///    addressing via [`compute_index`] and [`format_address`].
/// 2. Otherwise a non-empty peer list hash-selects one peer.
/// 3. Otherwise the process's own identity is returned.
///
/// A configured template short-circuits the peer list ("prefix wins").
/// The chain lets one binary run unchanged under scaled, fixed-peer,
/// and single-instance topologies.
pub fn select_route(client_id: &str, config: &RoutingConfig) -> String {
    if let Some(template) = &config.template {
        let rs = &config.replica_set;
        let index = compute_index(client_id, rs.replicas, rs.mode, rs.base);
        return format_address(index, template);
    }

    if !config.peers.is_empty() {
        let idx = fnv1a32(client_id.as_bytes()) as usize % config.peers.len();
        return config.peers[idx].clone();
    }

    config.identity.host_port()
}
