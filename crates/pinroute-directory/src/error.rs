use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
