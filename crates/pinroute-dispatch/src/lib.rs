//! Request Dispatcher protocol.
//!
//! The gateway in front of the replica pool forwards most requests to
//! any pool member, but the distinguished "join-like" class must land
//! on the one instance a prior computation designated. This crate
//! implements that two-phase protocol as a library:
//!
//! 1. Side-call `GET /where` against the undifferentiated pool (any
//!    member computes the same answer) with a bounded timeout.
//! 2. Rewrite the outbound authority to the returned `hostport`,
//!    resolve it through a shared cache, and forward the original
//!    request there.
//!
//! The side-call must complete before the rewrite, and the rewrite
//! before the forward; the steps are sequential awaits so the ordering
//! cannot be violated. Side-call failures and downstream dial failures
//! both surface as 502-class errors and are never retried against a
//! different instance.

pub mod dispatcher;
pub mod error;
pub mod resolver;
pub mod side_call;

pub use dispatcher::{is_pinned_path, Dispatcher, JoinReceipt};
pub use error::{DispatchError, Result};
pub use resolver::ResolverCache;
pub use side_call::{extract_hostport, WhereClient, DEFAULT_SIDE_CALL_TIMEOUT};
