use thiserror::Error;

/// Failure classes seen while relaying a single queue message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or service unavailable; the message stays queued
    TransientInfra,
    /// Body is not JSON or lacks the notification structure
    MalformedInput,
    /// Referenced object no longer exists
    NotFound,
}

/// Errors produced by the bridge and its collaborators
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed notification: {0}")]
    Malformed(String),

    #[error("Object {container}/{key} not found")]
    NotFound { container: String, key: String },

    #[error("Transient failure during {operation}: {message}")]
    Transient {
        operation: &'static str,
        message: String,
    },
}

impl BridgeError {
    pub fn transient(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transient {
            operation,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Malformed(_) => ErrorKind::MalformedInput,
            BridgeError::NotFound { .. } => ErrorKind::NotFound,
            BridgeError::Transient { .. } => ErrorKind::TransientInfra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BridgeError::Malformed("bad".to_string()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            BridgeError::NotFound {
                container: "b".to_string(),
                key: "k".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BridgeError::transient("publish", "broker down").kind(),
            ErrorKind::TransientInfra
        );
    }

    #[test]
    fn test_error_display() {
        let err = BridgeError::NotFound {
            container: "uploads".to_string(),
            key: "data/1.json".to_string(),
        };
        assert_eq!(err.to_string(), "Object uploads/data/1.json not found");
    }
}
