use thiserror::Error;

/// All the ways an operation on the core can fail
///
/// `Validation` never reaches the network; `Transport` is the single
/// uniform failure for anything the remote services do wrong.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Remote request failed: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<pigeon_store::StoreError> for Error {
    fn from(err: pigeon_store::StoreError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<pigeon_api::ApiError> for Error {
    fn from(err: pigeon_api::ApiError) -> Self {
        Error::Transport(err.to_string())
    }
}
