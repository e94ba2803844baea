//! Directory Service
//!
//! One process per backend replica. Exposes three HTTP operations:
//!
//! - `GET /where?client_id=` runs the instance selector against the
//!   process configuration and returns the computed target address.
//!   Every pool member returns the same answer for the same identifier,
//!   so a gateway may ask any of them.
//! - `GET /join?client_id=` reports this process's own identity. It
//!   deliberately does not verify that it was the intended target;
//!   routing correctness belongs to the dispatcher.
//! - `GET /health` liveness probe.
//!
//! Handlers touch only per-call state and the read-only configuration
//! loaded at startup, so concurrent requests need no coordination.

pub mod error;
pub mod http_server;

pub use error::{DirectoryError, Result};
pub use http_server::{HttpServer, JoinResponse, WhereResponse};
