use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// The `where` side-call failed: connection error, timeout,
    /// non-success status, or a body without an extractable hostport.
    #[error("Side-call failure: {0}")]
    SideCall(String),

    /// Resolving or dialing the designated instance failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// The dispatcher itself could not be constructed.
    #[error("Dispatcher setup error: {0}")]
    Setup(String),
}

impl DispatchError {
    /// The HTTP status a hosting gateway reports for this failure.
    /// Both failure classes collapse to 502; the original request is
    /// never forwarded once either occurs.
    pub fn gateway_status(&self) -> u16 {
        502
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
