use alloc::string::String;
use alloc::sync::Arc;

use thiserror::Error;

/// Error type returned by user supplied method and constructor bodies.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Failure to invoke a raw member.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvokeError {
    #[error("member `{member}` of `{owner}` is not accessible")]
    IllegalAccess { owner: Arc<str>, member: Arc<str> },

    #[error("field `{member}` of `{owner}` cannot be assigned")]
    Immutable { owner: Arc<str>, member: Arc<str> },

    #[error("`{member}` of `{owner}` is abstract")]
    Abstract { owner: Arc<str>, member: Arc<str> },

    #[error("illegal argument for `{member}` of `{owner}`: {reason}")]
    IllegalArgument {
        owner: Arc<str>,
        member: Arc<str>,
        reason: String,
    },

    #[error("`{owner}` has no constructor taking ({params})")]
    NoSuchConstructor { owner: Arc<str>, params: String },

    #[error("invoked member failed: {0}")]
    Target(Arc<dyn core::error::Error + Send + Sync>),
}

impl InvokeError {
    /// Wraps an error raised by the body of an invoked member.
    pub fn target(err: impl Into<BoxError>) -> Self {
        Self::Target(Arc::from(err.into()))
    }

    /// Returns `true` when a retry with forced visibility may succeed.
    #[inline]
    pub fn is_illegal_access(&self) -> bool {
        matches!(self, Self::IllegalAccess { .. })
    }
}
