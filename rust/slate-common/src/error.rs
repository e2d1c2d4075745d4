use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Broad category of the failure, see [`ErrorClass`].
    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            ErrorKind::InvalidState { .. } => ErrorClass::State,
            ErrorKind::InvalidFormat { .. }
            | ErrorKind::OutOfBounds { .. }
            | ErrorKind::InvalidUtf8 { .. } => ErrorClass::Format,
            ErrorKind::InvalidArgument { .. } => ErrorClass::Argument,
            ErrorKind::BufferTooLarge { .. } => ErrorClass::Resource,
        }
    }

    /// Returns `true` if the builder construction protocol was violated.
    pub fn is_state_error(&self) -> bool {
        self.class() == ErrorClass::State
    }

    /// Returns `true` if a buffer presented for reading is malformed.
    pub fn is_format_error(&self) -> bool {
        self.class() == ErrorClass::Format
    }

    pub fn invalid_state(operation: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidState {
                operation: operation.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_bounds(
        element: impl Into<String>,
        offset: usize,
        size: usize,
        buffer_len: usize,
    ) -> Error {
        Error(
            ErrorKind::OutOfBounds {
                element: element.into(),
                offset,
                size,
                buffer_len,
            }
            .into(),
        )
    }

    pub fn invalid_utf8(element: impl Into<String>, source: std::str::Utf8Error) -> Error {
        Error(
            ErrorKind::InvalidUtf8 {
                element: element.into(),
                source,
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn buffer_too_large(requested: usize, limit: usize) -> Error {
        Error(ErrorKind::BufferTooLarge { requested, limit }.into())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid builder state in {operation}: {message}")]
    InvalidState { operation: String, message: String },

    #[error("invalid buffer format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error(
        "'{element}' at offset {offset} (size {size}) is out of bounds of a {buffer_len} byte buffer"
    )]
    OutOfBounds {
        element: String,
        offset: usize,
        size: usize,
        buffer_len: usize,
    },

    #[error("invalid UTF-8 in '{element}': {source}")]
    InvalidUtf8 {
        element: String,
        source: std::str::Utf8Error,
    },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("buffer of {requested} bytes exceeds the limit of {limit} bytes")]
    BufferTooLarge { requested: usize, limit: usize },
}

/// Coarse classification of [`ErrorKind`] values.
///
/// `State` errors are bugs in the calling (usually generated) code and are not
/// recoverable. `Format` errors mean the buffer should be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    State,
    Format,
    Argument,
    Resource,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
