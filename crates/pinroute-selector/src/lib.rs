//! Pure deterministic instance selection.
//!
//! This crate maps an opaque client identifier to exactly one backend
//! replica address. The mapping is a pure function of the identifier and
//! the process configuration: identical inputs produce the identical
//! address across processes and restarts, which is what lets any pool
//! member answer a `where` query on behalf of the whole deployment.
//!
//! No I/O happens here apart from reading the environment once in
//! [`RoutingConfig::from_env`]; everything else is string and integer
//! arithmetic.

pub mod config;
pub mod selector;

pub use config::{split_peers, AddressTemplate, ReplicaSet, RoutingConfig, SelfIdentity};
pub use selector::{compute_index, fnv1a32, format_address, select_route, IndexMode};
