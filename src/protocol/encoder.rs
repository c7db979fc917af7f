//! RESP command encoder.
//!
//! Every command a client sends is a top-level array of bulk strings: the
//! command name followed by its arguments. Two primitives cover that whole
//! surface; both append to a caller-provided buffer, which the connection
//! takes ownership of on submit.

use bytes::{BufMut, BytesMut};

use super::itoa;
use super::markers;
use super::CRLF;

/// Append an array header: `*<n>\r\n`.
#[inline]
pub fn write_array_header(buf: &mut BytesMut, n: usize) {
    buf.put_u8(markers::ARRAY);
    itoa::write_i64_crlf(buf, n as i64);
}

/// Append a bulk string: `$<len>\r\n<data>\r\n`.
///
/// The payload is copied verbatim; the encoder never inspects it, which is
/// what makes bulk framing binary-safe.
#[inline]
pub fn write_bulk(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u8(markers::BULK_STRING);
    itoa::write_i64_crlf(buf, data.len() as i64);
    buf.put_slice(data);
    buf.put_slice(CRLF);
}

/// Append an integer argument as a bulk string.
///
/// Commands never carry `:` integers outbound; numeric arguments travel as
/// their decimal ASCII form inside a bulk.
#[inline]
pub fn write_bulk_i64(buf: &mut BytesMut, v: i64) {
    let mut scratch = itoa::Buffer::new();
    write_bulk(buf, scratch.format(v));
}
