use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Listener registration failed: {0}")]
    ListenerRegistration(String),

    #[error("Event emission failed: {0}")]
    EventEmission(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
