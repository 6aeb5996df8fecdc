//! Error types for Ripple.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for Ripple operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Boxed source error carried by [`Error::QueryExecution`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error types for Ripple operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No type mapping is registered for the type, nor for any declared supertype.
    #[error("No type mapping registered for type {type_name}")]
    ResolverNotFound { type_name: String },

    /// The underlying store failed to execute a statement.
    #[error("Query execution failed: {message}")]
    QueryExecution {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed descriptor or builder input.
    #[error("Illegal argument: {message}")]
    IllegalArgument { message: String },

    /// A subscriber callback panicked while receiving a delivery.
    #[error("Subscriber callback panicked: {message}")]
    CallbackPanicked { message: String },
}

impl Error {
    /// Creates a resolver not found error.
    pub fn resolver_not_found(type_name: impl Into<String>) -> Self {
        Error::ResolverNotFound {
            type_name: type_name.into(),
        }
    }

    /// Creates a query execution error without an underlying source.
    pub fn query_execution(message: impl Into<String>) -> Self {
        Error::QueryExecution {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a query execution error wrapping a store failure.
    pub fn store<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::QueryExecution {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an illegal argument error.
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Error::IllegalArgument {
            message: message.into(),
        }
    }

    /// Creates a callback panicked error from a panic payload.
    pub fn callback_panicked(payload: &(dyn core::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Error::CallbackPanicked { message }
    }

    /// Returns true for errors raised by the store.
    #[inline]
    pub fn is_query_execution(&self) -> bool {
        matches!(self, Error::QueryExecution { .. })
    }
}
