//! Typed command helpers.
//!
//! Each helper builds a request buffer (array header with the exact element
//! count, command token, argument bulks), submits it on the connection, and
//! projects the reply variant onto its declared return type. Optional
//! arguments that are omitted never reach the wire, and the array header
//! reflects that.
//!
//! Helpers are grouped by command family, one file per family, all as
//! `impl Client` blocks.

pub mod catalog;

mod connection;
mod hashes;
mod keys;
mod lists;
mod pubsub;
mod sets;
mod strings;

pub use keys::Ttl;

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::{encoder, Reply};
use catalog::{Cmd, Kw};

/// One outbound request being assembled.
///
/// The element count is fixed up front; helpers with optional arguments
/// pick the count per variant before writing anything.
pub(crate) struct Request {
    buf: BytesMut,
}

impl Request {
    /// Start a request of `arity` elements (command token included).
    pub(crate) fn new(arity: usize, cmd: Cmd) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        encoder::write_array_header(&mut buf, arity);
        encoder::write_bulk(&mut buf, cmd.bytes());
        Request { buf }
    }

    /// Append a byte-string argument.
    pub(crate) fn arg(mut self, data: &[u8]) -> Self {
        encoder::write_bulk(&mut self.buf, data);
        self
    }

    /// Append an integer argument (decimal ASCII inside a bulk).
    pub(crate) fn arg_i64(mut self, v: i64) -> Self {
        encoder::write_bulk_i64(&mut self.buf, v);
        self
    }

    /// Append a float argument.
    ///
    /// Rust's `Display` spells infinities `inf`/`-inf`, which the server
    /// accepts.
    pub(crate) fn arg_f64(mut self, v: f64) -> Self {
        encoder::write_bulk(&mut self.buf, v.to_string().as_bytes());
        self
    }

    /// Append a sub-block keyword token.
    pub(crate) fn kw(mut self, kw: Kw) -> Self {
        encoder::write_bulk(&mut self.buf, kw.bytes());
        self
    }

    /// Finish and take the wire bytes.
    pub(crate) fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reply projection
// ─────────────────────────────────────────────────────────────────────────────

fn mismatch(expected: &'static str, got: &Reply) -> Error {
    Error::UnexpectedReply {
        expected,
        got: got.kind(),
    }
}

/// SimpleString -> text, null bulk -> `None`.
pub(crate) fn expect_simple(reply: Reply) -> Result<Option<String>> {
    match reply {
        Reply::Simple(s) => Ok(Some(s)),
        Reply::Bulk(None) => Ok(None),
        other => Err(mismatch("simple string", &other)),
    }
}

/// Integer reply.
pub(crate) fn expect_integer(reply: Reply) -> Result<i64> {
    match reply {
        Reply::Integer(n) => Ok(n),
        other => Err(mismatch("integer", &other)),
    }
}

/// Integer reply projected to a flag (`0`/`1` answers).
pub(crate) fn expect_flag(reply: Reply) -> Result<bool> {
    Ok(expect_integer(reply)? != 0)
}

/// BulkString reply, null preserved.
pub(crate) fn expect_bulk(reply: Reply) -> Result<Option<Bytes>> {
    match reply {
        Reply::Bulk(data) => Ok(data),
        other => Err(mismatch("bulk string", &other)),
    }
}

/// Array reply, null preserved.
pub(crate) fn expect_array(reply: Reply) -> Result<Option<Vec<Reply>>> {
    match reply {
        Reply::Array(items) => Ok(items),
        other => Err(mismatch("array", &other)),
    }
}

/// Array of non-null bulks (KEYS, SMEMBERS, LRANGE, ...). A null array
/// projects to empty.
pub(crate) fn expect_bulk_array(reply: Reply) -> Result<Vec<Bytes>> {
    let items = expect_array(reply)?.unwrap_or_default();
    items
        .into_iter()
        .map(|item| match item {
            Reply::Bulk(Some(data)) => Ok(data),
            other => Err(mismatch("bulk string element", &other)),
        })
        .collect()
}

/// Bulk carrying a decimal float (ZSCORE, ZINCRBY), null preserved.
pub(crate) fn expect_float_bulk(reply: Reply) -> Result<Option<f64>> {
    match expect_bulk(reply)? {
        None => Ok(None),
        Some(data) => std::str::from_utf8(&data)
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Some)
            .ok_or(Error::UnexpectedReply {
                expected: "floating-point bulk",
                got: "bulk string",
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_form() {
        let req = Request::new(3, Cmd::Set).arg(b"key").arg(b"value");
        assert_eq!(
            &req.finish()[..],
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"
        );
    }

    #[test]
    fn test_request_with_keyword_and_integer() {
        let req = Request::new(5, Cmd::Set)
            .arg(b"key")
            .arg(b"value")
            .kw(Kw::Ex)
            .arg_i64(60);
        assert_eq!(
            &req.finish()[..],
            b"*5\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n$2\r\nex\r\n$2\r\n60\r\n"
        );
    }

    #[test]
    fn test_expect_simple() {
        assert_eq!(
            expect_simple(Reply::simple("OK")).unwrap(),
            Some("OK".to_string())
        );
        assert_eq!(expect_simple(Reply::null_bulk()).unwrap(), None);
        assert!(expect_simple(Reply::Integer(1)).is_err());
    }

    #[test]
    fn test_expect_integer_and_flag() {
        assert_eq!(expect_integer(Reply::Integer(7)).unwrap(), 7);
        assert!(expect_integer(Reply::bulk("7")).is_err());
        assert!(expect_flag(Reply::Integer(1)).unwrap());
        assert!(!expect_flag(Reply::Integer(0)).unwrap());
    }

    #[test]
    fn test_expect_bulk() {
        assert_eq!(
            expect_bulk(Reply::bulk("x")).unwrap(),
            Some(Bytes::from_static(b"x"))
        );
        assert_eq!(expect_bulk(Reply::null_bulk()).unwrap(), None);
        assert!(expect_bulk(Reply::simple("x")).is_err());
    }

    #[test]
    fn test_expect_bulk_array() {
        let reply = Reply::array(vec![Reply::bulk("a"), Reply::bulk("b")]);
        assert_eq!(
            expect_bulk_array(reply).unwrap(),
            vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]
        );
        assert_eq!(expect_bulk_array(Reply::null_array()).unwrap(), Vec::<Bytes>::new());
        assert!(expect_bulk_array(Reply::array(vec![Reply::Integer(1)])).is_err());
    }

    #[test]
    fn test_expect_float_bulk() {
        assert_eq!(expect_float_bulk(Reply::bulk("1.5")).unwrap(), Some(1.5));
        assert_eq!(expect_float_bulk(Reply::null_bulk()).unwrap(), None);
        assert!(expect_float_bulk(Reply::bulk("abc")).is_err());
    }
}
