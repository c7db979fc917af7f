//! Error types for wayfarer.
//!
//! Two layers: [`ProtocolError`] covers byte-level RESP faults (always fatal
//! to the connection), and [`Error`] covers everything a caller can observe,
//! including per-command server errors that leave the connection healthy.

use std::io;
use thiserror::Error;

/// Result type alias for wayfarer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wayfarer.
#[derive(Error, Debug)]
pub enum Error {
    /// RESP framing fault on the inbound stream. Fatal: every command still
    /// in flight fails, and the connection is unusable afterwards.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered this command with an error reply (`-` line).
    /// The connection itself remains healthy.
    #[error("server error: {0}")]
    Remote(String),

    /// The transport went away: peer close, network fault, or a local
    /// `disconnect`. Commands still in flight receive this in FIFO order.
    #[error("connection closed")]
    ConnectionClosed,

    /// A command was submitted while the connection is in subscriber mode,
    /// where only subscribe/unsubscribe traffic is valid.
    #[error("connection is in subscriber mode")]
    SubscriberMode,

    /// The reply variant did not match what the command helper declared.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        /// The variant the helper was written against.
        expected: &'static str,
        /// What actually arrived.
        got: &'static str,
    },

    /// I/O failure while connecting or writing a request.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Byte-level faults in the inbound RESP stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// First byte of a value was not one of `+ - : $ *`.
    #[error("invalid type marker: {0:?}")]
    InvalidTypeMarker(u8),

    /// A numeric field contained a byte outside `-` and `0-9`, was empty,
    /// or overflowed i64.
    #[error("invalid number in protocol stream")]
    InvalidNumber,

    /// A bulk or array length outside the valid range (only `-1` may be
    /// negative).
    #[error("invalid declared length: {0}")]
    InvalidLength(i64),

    /// Declared bulk length exceeds [`crate::MAX_BULK_SIZE`].
    #[error("bulk string too large: {len} bytes (max: {max})")]
    BulkTooLarge {
        /// Declared length in bytes.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Declared array length exceeds [`crate::MAX_ARRAY_ELEMENTS`].
    #[error("too many array elements: {count} (max: {max})")]
    TooManyElements {
        /// Declared element count.
        count: usize,
        /// Maximum accepted count.
        max: usize,
    },

    /// Array nesting exceeds [`crate::MAX_ARRAY_DEPTH`].
    #[error("array nesting too deep (max: {max})")]
    NestedTooDeep {
        /// Maximum accepted depth.
        max: usize,
    },

    /// A bulk string body was not terminated by CRLF.
    #[error("missing CRLF terminator")]
    MissingCrlf,

    /// A simple string or error line was not valid UTF-8.
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
}

impl Error {
    /// Returns true if the connection is unusable after this error.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_) | Error::ConnectionClosed | Error::Io(_)
        )
    }

    /// Returns true for a per-command server error reply.
    #[inline]
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Clones the error for fan-out to multiple waiters.
    ///
    /// Only fan-out-able kinds need this; `Io` collapses to
    /// `ConnectionClosed` since the original error is not `Clone`.
    pub(crate) fn duplicate(&self) -> Error {
        match self {
            Error::Protocol(e) => Error::Protocol(e.clone()),
            Error::Remote(msg) => Error::Remote(msg.clone()),
            Error::ConnectionClosed | Error::Io(_) => Error::ConnectionClosed,
            Error::SubscriberMode => Error::SubscriberMode,
            Error::UnexpectedReply { expected, got } => Error::UnexpectedReply {
                expected,
                got,
            },
        }
    }
}
