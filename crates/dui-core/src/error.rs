//! Error types for widget wiring, host DOM calls, and engine loading.

use thiserror::Error;

/// Primary error type for toolkit operations.
///
/// Errors are `Clone` so a single engine load failure can be observed by every
/// widget waiting on the shared load.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DuiError {
    /// A configured element or selector did not resolve to a node.
    #[error("element not found for selector '{selector}'")]
    Resolution {
        /// Selector (or description) that failed to resolve.
        selector: String,
    },
    /// The external positioning engine failed to load or initialise.
    #[error("positioning engine failed to load: {detail}")]
    DependencyLoad {
        /// Loader-provided failure detail.
        detail: String,
    },
    /// The positioning engine was requested before it became available.
    #[error("positioning engine unavailable")]
    EngineUnavailable,
    /// A host DOM call failed.
    #[error("dom operation '{operation}' failed: {detail}")]
    Dom {
        /// Host operation name.
        operation: &'static str,
        /// Host-provided failure detail.
        detail: String,
    },
    /// Toolkit or widget configuration was invalid.
    #[error("invalid value for '{field}': {message}")]
    InvalidConfig {
        /// Offending configuration field.
        field: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

impl DuiError {
    /// Build a resolution error for the given selector.
    #[must_use]
    pub fn resolution(selector: impl Into<String>) -> Self {
        Self::Resolution {
            selector: selector.into(),
        }
    }

    /// Build a host DOM failure.
    #[must_use]
    pub fn dom(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Dom {
            operation,
            detail: detail.into(),
        }
    }

    /// Machine-readable kind used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution",
            Self::DependencyLoad { .. } => "dependency_load",
            Self::EngineUnavailable => "engine_unavailable",
            Self::Dom { .. } => "dom",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// Result alias for toolkit operations.
pub type DuiResult<T> = Result<T, DuiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_selector() {
        let err = DuiError::resolution("#missing");
        assert_eq!(err.to_string(), "element not found for selector '#missing'");
        assert_eq!(err.kind(), "resolution");
    }

    #[test]
    fn dom_error_carries_operation() {
        let err = DuiError::dom("set_attribute", "readonly");
        assert_eq!(
            err.to_string(),
            "dom operation 'set_attribute' failed: readonly"
        );
        assert_eq!(err.kind(), "dom");
    }
}
