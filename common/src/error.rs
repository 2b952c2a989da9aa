//! Error handling for the decant-common crate.

use thiserror::Error;

/// Error type shared by the planning, materialization, and adaptation layers.
///
/// Every variant carries the offending value in its message so a failure is
/// actionable without re-running the query. All errors are terminal for the
/// `read` call that raised them: no partial result is returned and no retry
/// is attempted at this layer.
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid configuration: {message}")]
    ConfigurationError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Missing dependency: {library} is not registered for this output kind")]
    MissingDependencyError { library: String },

    #[error("Empty result: {message}")]
    EmptyResultError { message: String },

    #[error("Inconsistent block layout: {message}")]
    InconsistentBlockError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Unsupported dtype: {message}")]
    UnsupportedDtypeError { message: String },

    #[error("Column not found: {column}")]
    ColumnNotFoundError { column: String },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Result type alias for materialization operations.
pub type Result<T> = std::result::Result<T, CommonError>;

/// The stage of a `read` call at which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// Argument validation and partition planning, before any engine call.
    Planning,
    /// Reconstruction of the engine's columnar or block payload.
    Materialization,
    /// Post-hoc output adaptation (index assignment, wrapper selection).
    Adaptation,
    /// A fault at or behind the engine boundary.
    Boundary,
}

/// Trait for classifying errors by surfacing stage and fault origin.
pub trait Diagnose {
    /// Get the stage at which this error surfaces.
    fn stage(&self) -> ErrorStage;

    /// Whether the error is attributable to caller-supplied arguments
    /// rather than to the engine payload.
    fn is_caller_fault(&self) -> bool;
}

impl CommonError {
    /// Create a configuration error with a custom message.
    pub fn configuration_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with a custom message and source error.
    pub fn configuration_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a missing dependency error naming the absent library.
    pub fn missing_dependency<S: Into<String>>(library: S) -> Self {
        Self::MissingDependencyError {
            library: library.into(),
        }
    }

    /// Create an empty result error with a custom message.
    pub fn empty_result<S: Into<String>>(message: S) -> Self {
        Self::EmptyResultError {
            message: message.into(),
        }
    }

    /// Create an inconsistent block error with a custom message.
    pub fn inconsistent_block<S: Into<String>>(message: S) -> Self {
        Self::InconsistentBlockError {
            message: message.into(),
            source: None,
        }
    }

    /// Create an inconsistent block error with a custom message and source error.
    pub fn inconsistent_block_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::InconsistentBlockError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an unsupported dtype error with a custom message.
    pub fn unsupported_dtype<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedDtypeError {
            message: message.into(),
        }
    }

    /// Create a column not found error naming the absent column.
    pub fn column_not_found<S: Into<String>>(column: S) -> Self {
        Self::ColumnNotFoundError {
            column: column.into(),
        }
    }

    /// Create an internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with a custom message and source error.
    pub fn internal_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl Diagnose for CommonError {
    fn stage(&self) -> ErrorStage {
        match self {
            CommonError::ConfigurationError { .. } => ErrorStage::Planning,
            CommonError::MissingDependencyError { .. } => ErrorStage::Planning,
            CommonError::EmptyResultError { .. } => ErrorStage::Materialization,
            CommonError::InconsistentBlockError { .. } => ErrorStage::Materialization,
            CommonError::UnsupportedDtypeError { .. } => ErrorStage::Materialization,
            CommonError::ColumnNotFoundError { .. } => ErrorStage::Adaptation,
            CommonError::InternalError { .. } => ErrorStage::Boundary,
        }
    }

    fn is_caller_fault(&self) -> bool {
        match self {
            CommonError::ConfigurationError { .. } => true,
            CommonError::MissingDependencyError { .. } => true,
            CommonError::ColumnNotFoundError { .. } => true,
            CommonError::EmptyResultError { .. } => false,
            CommonError::InconsistentBlockError { .. } => false,
            CommonError::UnsupportedDtypeError { .. } => false,
            CommonError::InternalError { .. } => false,
        }
    }
}
