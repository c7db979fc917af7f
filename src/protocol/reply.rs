//! RESP reply model.
//!
//! One [`Reply`] is one complete parsed server reply. Null is a state of the
//! bulk-string and array variants (`$-1` / `*-1` on the wire), distinct from
//! empty: a server that answers `*0\r\n` sent an array with no elements,
//! not "no array".

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use super::itoa;
use super::markers;
use super::CRLF;

/// A parsed server reply.
///
/// Replies are immutable once constructed and cheap to clone (`Bulk`
/// payloads are refcounted `Bytes`).
#[derive(Clone, PartialEq)]
pub enum Reply {
    /// Simple string (`+...`). Never contains CR or LF.
    Simple(String),

    /// Error reply (`-...`). Semantically a per-command failure.
    Error(String),

    /// 64-bit signed integer (`:...`).
    Integer(i64),

    /// Bulk string (`$...`); `None` is the RESP null bulk.
    Bulk(Option<Bytes>),

    /// Array (`*...`); `None` is the RESP null array.
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Create a simple string reply.
    #[inline]
    pub fn simple(s: impl Into<String>) -> Self {
        Self::Simple(s.into())
    }

    /// Create an error reply.
    #[inline]
    pub fn error(s: impl Into<String>) -> Self {
        Self::Error(s.into())
    }

    /// Create a bulk string reply.
    #[inline]
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Self::Bulk(Some(data.into()))
    }

    /// Create a null bulk string reply.
    #[inline]
    pub const fn null_bulk() -> Self {
        Self::Bulk(None)
    }

    /// Create an array reply.
    #[inline]
    pub fn array(items: Vec<Reply>) -> Self {
        Self::Array(Some(items))
    }

    /// Create a null array reply.
    #[inline]
    pub const fn null_array() -> Self {
        Self::Array(None)
    }

    /// True for a null bulk or null array.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Bulk(None) | Self::Array(None))
    }

    /// True for an error reply.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The reply as a string slice, when it carries UTF-8 text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Simple(s) | Self::Error(s) => Some(s),
            Self::Bulk(Some(b)) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// The reply as raw bytes, when it carries any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Simple(s) => Some(s.as_bytes()),
            Self::Bulk(Some(b)) => Some(b),
            _ => None,
        }
    }

    /// The reply as an integer. No coercion: a bulk of digits is not an
    /// integer reply.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The reply as an array slice, when it is a non-null array.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Self::Array(Some(items)) => Some(items),
            _ => None,
        }
    }

    /// Variant name, for diagnostics and mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple string",
            Self::Error(_) => "error",
            Self::Integer(_) => "integer",
            Self::Bulk(_) => "bulk string",
            Self::Array(_) => "array",
        }
    }

    /// Serialize the reply back to wire form.
    ///
    /// The outbound path only ever sends arrays of bulks; this exists for
    /// the round-trip property tests and for mock servers in the test
    /// suite.
    pub fn serialize(&self, buf: &mut BytesMut) {
        match self {
            Self::Simple(s) => {
                buf.put_u8(markers::SIMPLE_STRING);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            Self::Error(s) => {
                buf.put_u8(markers::ERROR);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            Self::Integer(n) => {
                buf.put_u8(markers::INTEGER);
                itoa::write_i64_crlf(buf, *n);
            }
            Self::Bulk(None) => buf.put_slice(b"$-1\r\n"),
            Self::Bulk(Some(data)) => {
                buf.put_u8(markers::BULK_STRING);
                itoa::write_i64_crlf(buf, data.len() as i64);
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            Self::Array(None) => buf.put_slice(b"*-1\r\n"),
            Self::Array(Some(items)) => {
                buf.put_u8(markers::ARRAY);
                itoa::write_i64_crlf(buf, items.len() as i64);
                for item in items {
                    item.serialize(buf);
                }
            }
        }
    }

    /// Serialize to a fresh `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.serialize(&mut buf);
        buf.to_vec()
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "Simple({s:?})"),
            Self::Error(s) => write!(f, "Error({s:?})"),
            Self::Integer(n) => write!(f, "Integer({n})"),
            Self::Bulk(None) => write!(f, "Bulk(null)"),
            Self::Bulk(Some(b)) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    write!(f, "Bulk({s:?})")
                } else {
                    write!(f, "Bulk({b:?})")
                }
            }
            Self::Array(None) => write!(f, "Array(null)"),
            Self::Array(Some(items)) => {
                write!(f, "Array[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// Display mirrors redis-cli output conventions.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "{s}"),
            Self::Error(s) => write!(f, "(error) {s}"),
            Self::Integer(n) => write!(f, "(integer) {n}"),
            Self::Bulk(None) | Self::Array(None) => write!(f, "(nil)"),
            Self::Bulk(Some(b)) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => write!(f, "<{} bytes>", b.len()),
            },
            Self::Array(Some(items)) if items.is_empty() => {
                write!(f, "(empty array)")
            }
            Self::Array(Some(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {item}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_distinct_from_empty() {
        assert!(Reply::null_bulk().is_null());
        assert!(Reply::null_array().is_null());
        assert!(!Reply::bulk("").is_null());
        assert!(!Reply::array(vec![]).is_null());
        assert_ne!(Reply::null_array(), Reply::array(vec![]));
        assert_ne!(Reply::null_bulk(), Reply::bulk(""));
    }

    #[test]
    fn test_no_integer_coercion() {
        assert_eq!(Reply::Integer(42).as_integer(), Some(42));
        assert_eq!(Reply::bulk("42").as_integer(), None);
        assert_eq!(Reply::simple("42").as_integer(), None);
    }

    #[test]
    fn test_serialize_simple() {
        assert_eq!(Reply::simple("PONG").to_vec(), b"+PONG\r\n");
    }

    #[test]
    fn test_serialize_error() {
        assert_eq!(Reply::error("ERR nope").to_vec(), b"-ERR nope\r\n");
    }

    #[test]
    fn test_serialize_integers() {
        assert_eq!(Reply::Integer(42).to_vec(), b":42\r\n");
        assert_eq!(Reply::Integer(-1).to_vec(), b":-1\r\n");
    }

    #[test]
    fn test_serialize_bulk_forms() {
        assert_eq!(Reply::bulk("hello").to_vec(), b"$5\r\nhello\r\n");
        assert_eq!(Reply::bulk("").to_vec(), b"$0\r\n\r\n");
        assert_eq!(Reply::null_bulk().to_vec(), b"$-1\r\n");
    }

    #[test]
    fn test_serialize_array_forms() {
        assert_eq!(Reply::array(vec![]).to_vec(), b"*0\r\n");
        assert_eq!(Reply::null_array().to_vec(), b"*-1\r\n");

        let nested = Reply::array(vec![
            Reply::array(vec![Reply::Integer(1), Reply::Integer(2)]),
            Reply::null_bulk(),
        ]);
        assert_eq!(nested.to_vec(), b"*2\r\n*2\r\n:1\r\n:2\r\n$-1\r\n");
    }
}
