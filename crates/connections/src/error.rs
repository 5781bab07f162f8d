use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectionError>;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Store error: {0}")]
    Store(#[from] wings_store::StoreError),

    #[error("Cannot connect item {0} to itself")]
    SelfConnection(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl ConnectionError {
    /// Stable machine-readable code for Command API envelopes
    pub const fn code(&self) -> &'static str {
        match self {
            ConnectionError::Store(_) => "store_error",
            ConnectionError::SelfConnection(_) => "self_connection",
            ConnectionError::InvalidArgument(_) => "invalid_argument",
            ConnectionError::ItemNotFound(_) => "not_found",
            ConnectionError::InvalidConfig(_) => "invalid_config",
            ConnectionError::Other(_) => "internal",
        }
    }
}
