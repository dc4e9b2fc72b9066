use thiserror::Error;

/// Result alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that abort a whole dispatch call.
///
/// These are only raised during validation, before any worker has been
/// started. Failures of individual jobs are never reported here: they are
/// the processor's own error type and go to the failure callback.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The supplied job collection was not a sequence.
    #[error("input is not a sequence")]
    InvalidInput,

    /// An element of a dynamic job sequence could not be decoded.
    #[error("job at position {position} could not be decoded: {source}")]
    JobDecode {
        /// Position of the offending element in the input sequence.
        position: usize,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The pool was configured with no workers.
    #[error("there must be at least one worker")]
    Configuration,
}

impl PoolError {
    /// Whether this error was caused by the shape of the job input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput | Self::JobDecode { .. })
    }

    /// Whether this error was caused by the pool configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(PoolError::InvalidInput.to_string(), "input is not a sequence");
        assert_eq!(
            PoolError::Configuration.to_string(),
            "there must be at least one worker"
        );
    }

    #[test]
    fn test_classification() {
        let decode = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = PoolError::JobDecode {
            position: 3,
            source: decode,
        };
        assert!(err.is_invalid_input());
        assert!(!err.is_configuration());
        assert!(err.to_string().starts_with("job at position 3"));
        assert!(PoolError::Configuration.is_configuration());
    }
}
