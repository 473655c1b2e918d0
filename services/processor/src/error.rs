use thiserror::Error;

/// Errors produced while processing a relayed record
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Invalid trigger envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid record payload: {0}")]
    InvalidPayload(String),

    #[error("{sink} sink failed: {message}")]
    Sink { sink: &'static str, message: String },
}

impl ProcessorError {
    pub fn sink(sink: &'static str, message: impl Into<String>) -> Self {
        Self::Sink {
            sink,
            message: message.into(),
        }
    }

    /// Whether the input itself was rejected, as opposed to a sink failing
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ProcessorError::InvalidEnvelope(_) | ProcessorError::InvalidPayload(_)
        )
    }
}
