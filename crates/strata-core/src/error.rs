//! Error types for Strata.
//!
//! This module provides [`StackError`], the standard error type used
//! throughout the library, and [`Outcome`], the result every chain
//! execution produces.
//!
//! One variant deserves a note: [`StackError::ShortCircuited`] is not a
//! fault. It is the valid control-flow result of an element that chose to
//! answer the request without delegating inward (a denied authorization,
//! for example). It travels the failure path so that failure cleanup runs,
//! and is surfaced to the caller unchanged.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias used throughout Strata.
///
/// Exactly one of the success/failure cleanup passes fires per request,
/// matching which arm of the outcome the chain produced.
pub type Outcome<T> = Result<T, StackError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A required attribute was never set (programmer error).
    Attribute,
    /// An element answered the request without delegating inward.
    ShortCircuit,
    /// The innermost business logic failed.
    Body,
    /// An element's own processing failed.
    Element,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    ///
    /// Short-circuit outcomes carry their own status; this is the
    /// fallback used when none was supplied.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Attribute | Self::Body => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ShortCircuit => StatusCode::FORBIDDEN,
            Self::Element => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Standard error type for Strata.
///
/// # Example
///
/// ```
/// use strata_core::{Outcome, StackError};
///
/// fn require_positive(n: i64) -> Outcome<i64> {
///     if n <= 0 {
///         return Err(StackError::body("value must be positive"));
///     }
///     Ok(n)
/// }
/// ```
#[derive(Error, Debug)]
pub enum StackError {
    /// A required attribute was never set for this request.
    ///
    /// This is a programmer error (an element that publishes the value
    /// was not stacked, or a seed attribute was not supplied) and should
    /// fail fast rather than be defaulted.
    #[error("missing attribute '{key}'")]
    MissingAttribute {
        /// The diagnostic name of the key that was looked up.
        key: &'static str,
    },

    /// An element intentionally produced an outcome without delegating
    /// inward.
    #[error("short-circuited with status {status}: {reason}")]
    ShortCircuited {
        /// The HTTP-equivalent status of the produced outcome.
        status: StatusCode,
        /// Machine-readable code (e.g. `AUTHORIZATION_DENIED`).
        code: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The innermost business logic failed.
    #[error("body failed: {message}")]
    Body {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// An element's `proceed` or cleanup hook failed.
    #[error("element '{element}' failed: {message}")]
    Element {
        /// The name of the element that failed.
        element: &'static str,
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl StackError {
    /// Creates a missing-attribute error for the given key name.
    #[must_use]
    pub const fn missing_attribute(key: &'static str) -> Self {
        Self::MissingAttribute { key }
    }

    /// Creates a short-circuit outcome with an explicit status and code.
    #[must_use]
    pub fn short_circuit(
        status: StatusCode,
        code: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ShortCircuited {
            status,
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Creates a 403-equivalent short-circuit outcome.
    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::short_circuit(StatusCode::FORBIDDEN, "AUTHORIZATION_DENIED", reason)
    }

    /// Creates a body failure with a message.
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a body failure with a source error.
    pub fn body_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Body {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an element failure with a message.
    #[must_use]
    pub fn element(element: &'static str, message: impl Into<String>) -> Self {
        Self::Element {
            element,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an element failure with a source error.
    pub fn element_with_source(
        element: &'static str,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Element {
            element,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingAttribute { .. } => ErrorCategory::Attribute,
            Self::ShortCircuited { .. } => ErrorCategory::ShortCircuit,
            Self::Body { .. } => ErrorCategory::Body,
            Self::Element { .. } => ErrorCategory::Element,
        }
    }

    /// Returns the HTTP-equivalent status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ShortCircuited { status, .. } => *status,
            _ => self.category().default_status_code(),
        }
    }

    /// Returns `true` if this is an intentional short-circuit rather than
    /// a fault.
    #[must_use]
    pub const fn is_short_circuit(&self) -> bool {
        matches!(self, Self::ShortCircuited { .. })
    }
}
