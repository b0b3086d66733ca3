use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use mo_runtime::InvokeError;
use thiserror::Error;

/// Which half of a property was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Getter,
    Setter,
    DefaultConstructor,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Getter => "getter",
            Self::Setter => "setter",
            Self::DefaultConstructor => "default constructor",
        })
    }
}

/// Discriminant of a [`ReflectionError`], for matching without caring about
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    OutOfRange,
    Unsupported,
    Instantiation,
    InvalidPath,
    Invocation,
}

/// Errors raised while resolving or accessing properties.
///
/// Every variant names the property (or path) and the type involved.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ReflectionError {
    #[error("there is no {access} for property named `{property}` in `{ty}`")]
    NotFound {
        access: Access,
        property: String,
        ty: Arc<str>,
    },

    /// Recorded while describing the type, raised on first use.
    #[error("{message}")]
    Ambiguous {
        property: Arc<str>,
        ty: Arc<str>,
        message: Arc<str>,
    },

    #[error("index {index} is out of range for `{property}` of `{ty}` with length {len}")]
    OutOfRange {
        property: String,
        ty: Arc<str>,
        index: i64,
        len: usize,
    },

    #[error("`{operation}` is not supported by `{ty}`")]
    Unsupported {
        operation: String,
        ty: Arc<str>,
    },

    #[error("error instantiating `{ty}` with types ({arg_types}) and values ({arg_values}): {source}")]
    Instantiation {
        ty: Arc<str>,
        arg_types: String,
        arg_values: String,
        source: InvokeError,
    },

    /// `ty` is the type the path was applied to, when one was known.
    #[error("invalid property path `{path}`{}: {reason}", type_suffix(.ty.as_deref()))]
    InvalidPath {
        path: String,
        ty: Option<Arc<str>>,
        reason: &'static str,
    },

    /// The accessor was reached but refused the call or failed inside.
    #[error("could not access `{member}` of `{ty}`: {source}")]
    Invocation {
        member: Arc<str>,
        ty: Arc<str>,
        source: Arc<dyn core::error::Error + Send + Sync>,
    },
}

fn type_suffix(ty: Option<&str>) -> String {
    ty.map(|ty| alloc::format!(" on `{ty}`")).unwrap_or_default()
}

impl ReflectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Instantiation { .. } => ErrorKind::Instantiation,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::Invocation { .. } => ErrorKind::Invocation,
        }
    }

    pub(crate) fn not_found(access: Access, property: &str, ty: Arc<str>) -> Self {
        Self::NotFound {
            access,
            property: String::from(property),
            ty,
        }
    }

    pub(crate) fn unsupported(operation: &str, ty: Arc<str>) -> Self {
        Self::Unsupported {
            operation: String::from(operation),
            ty,
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: String::from(path),
            ty: None,
            reason,
        }
    }

    /// Names `owner` as the type a malformed path was applied to, unless a
    /// type is already recorded. Other variants are returned unchanged.
    pub(crate) fn on_type(mut self, owner: Arc<str>) -> Self {
        if let Self::InvalidPath { ty: ty @ None, .. } = &mut self {
            *ty = Some(owner);
        }
        self
    }

    /// Failure of an invoked member; a failing body is reported as itself.
    pub(crate) fn invocation(member: &str, ty: Arc<str>, err: InvokeError) -> Self {
        let source = match err {
            InvokeError::Target(cause) => cause,
            other => Arc::new(other),
        };
        Self::Invocation {
            member: Arc::from(member),
            ty,
            source,
        }
    }
}
