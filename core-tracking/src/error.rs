use bridge_traits::{BridgeError, SdkFailure};
use thiserror::Error;

/// Rejection delivered to a host caller through a pending completion.
///
/// Every variant maps to a stable [`code`](TrackingError::code) the host
/// layer passes to its promise rejection alongside the display message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("Missing token value")]
    MissingToken,

    #[error("Tracking api is not initialized")]
    NotInitialized,

    /// Failure reported by the SDK, forwarded verbatim.
    #[error("{message}")]
    Sdk { code: String, message: String },

    #[error("{operation} request superseded by a newer request")]
    Superseded { operation: String },

    /// A request of the same kind is still waiting on the SDK.
    #[error("{operation} request already in flight")]
    Busy { operation: String },

    #[error("{operation} request cancelled")]
    Cancelled { operation: String },

    #[error("{operation} completion dropped before it was resolved")]
    Dropped { operation: String },

    #[error("{operation} timed out waiting for the tracking SDK")]
    TimedOut { operation: String },

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl TrackingError {
    /// Error code handed to the host alongside the message.
    pub fn code(&self) -> &str {
        match self {
            TrackingError::MissingToken
            | TrackingError::NotInitialized
            | TrackingError::Bridge(_) => "Error",
            TrackingError::Sdk { code, .. } => code,
            TrackingError::Superseded { .. } => "Superseded",
            TrackingError::Busy { .. } => "Busy",
            TrackingError::Cancelled { .. } => "Cancelled",
            TrackingError::Dropped { .. } => "Dropped",
            TrackingError::TimedOut { .. } => "TimedOut",
        }
    }
}

impl From<SdkFailure> for TrackingError {
    fn from(failure: SdkFailure) -> Self {
        TrackingError::Sdk {
            code: failure.code,
            message: failure.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_codes_are_generic() {
        assert_eq!(TrackingError::MissingToken.code(), "Error");
        assert_eq!(TrackingError::MissingToken.to_string(), "Missing token value");
        assert_eq!(TrackingError::NotInitialized.code(), "Error");
        assert_eq!(
            TrackingError::NotInitialized.to_string(),
            "Tracking api is not initialized"
        );
    }

    #[test]
    fn test_sdk_failure_forwarded_verbatim() {
        let error = TrackingError::from(SdkFailure::new("TAG_INVALID", "Tag name is empty"));

        assert_eq!(error.code(), "TAG_INVALID");
        assert_eq!(error.to_string(), "Tag name is empty");
    }

    #[test]
    fn test_busy_names_the_operation() {
        let error = TrackingError::Busy {
            operation: "add_tag".to_string(),
        };
        assert_eq!(error.code(), "Busy");
        assert_eq!(error.to_string(), "add_tag request already in flight");
    }

    #[test]
    fn test_bridge_error_conversion() {
        let error: TrackingError = BridgeError::NotAvailable("no activity".to_string()).into();
        assert_eq!(error.code(), "Error");
        assert!(error.to_string().contains("no activity"));
    }
}
