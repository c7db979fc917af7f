//! Incremental RESP decoder.
//!
//! The decoder is fed byte chunks of arbitrary size (the transport makes no
//! promise about segment boundaries) and emits complete top-level replies.
//! After any `decode` call it is either at a clean token boundary or holding
//! a strict prefix of one in-progress value: the unconsumed bytes stay in
//! the accumulator, the position inside the current token lives in
//! [`DecodeState`], and partially assembled arrays live on a frame stack.
//! No byte is lost or consumed twice, whichever way the stream fragments.
//!
//! Array assembly is iterative (a stack of frames, not recursion), so deeply
//! nested input cannot overflow the call stack; declared lengths are bounded
//! before any allocation sized by them.

use bytes::{Buf, Bytes, BytesMut};
use memchr::memchr;

use super::markers;
use super::Reply;
use super::CRLF;
use crate::error::ProtocolError;
use crate::{MAX_ARRAY_DEPTH, MAX_ARRAY_ELEMENTS, MAX_BULK_SIZE};

/// Position inside the value currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Expecting a type byte.
    Idle,
    /// Expecting a CRLF-terminated simple-string line.
    SimpleString,
    /// Expecting a CRLF-terminated error line.
    Error,
    /// Expecting a signed decimal line.
    Integer,
    /// Expecting the length line of a bulk string.
    BulkLen,
    /// Expecting exactly `len` body bytes plus the trailing CRLF.
    BulkBody { len: usize },
    /// Expecting the count line of an array.
    ArrayLen,
}

/// A partially filled array. The top of the stack is the innermost array
/// being assembled.
#[derive(Debug)]
struct ArrayFrame {
    declared: usize,
    items: Vec<Reply>,
}

/// Streaming RESP reply decoder.
///
/// # Usage
///
/// ```
/// use wayfarer::protocol::RespDecoder;
///
/// let mut decoder = RespDecoder::new();
/// decoder.extend(b"+PONG\r\n");
/// let reply = decoder.decode().unwrap().unwrap();
/// assert_eq!(reply.as_str(), Some("PONG"));
/// ```
///
/// `decode` returns `Ok(None)` when more bytes are needed; feeding the rest
/// of the stream later resumes exactly where parsing stopped, including in
/// the middle of a bulk body or a nested array.
#[derive(Debug)]
pub struct RespDecoder {
    buffer: BytesMut,
    state: DecodeState,
    stack: Vec<ArrayFrame>,
}

impl RespDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Create a decoder with a specific accumulator capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: DecodeState::Idle,
            stack: Vec::new(),
        }
    }

    /// Add inbound bytes to the accumulator.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered, not-yet-consumed bytes.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// True when the decoder sits at a clean token boundary with no value
    /// in progress.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::Idle && self.stack.is_empty()
    }

    /// Try to decode one complete top-level reply.
    ///
    /// Returns:
    /// - `Ok(Some(reply))` if a complete reply was assembled
    /// - `Ok(None)` if more data is needed
    /// - `Err(e)` if the stream is malformed; the decoder does not recover
    pub fn decode(&mut self) -> Result<Option<Reply>, ProtocolError> {
        loop {
            match self.state {
                DecodeState::Idle => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let marker = self.buffer[0];
                    self.buffer.advance(1);
                    self.state = match marker {
                        markers::SIMPLE_STRING => DecodeState::SimpleString,
                        markers::ERROR => DecodeState::Error,
                        markers::INTEGER => DecodeState::Integer,
                        markers::BULK_STRING => DecodeState::BulkLen,
                        markers::ARRAY => DecodeState::ArrayLen,
                        other => return Err(ProtocolError::InvalidTypeMarker(other)),
                    };
                }

                DecodeState::SimpleString => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    let text = into_utf8(line)?;
                    if let Some(reply) = self.complete(Reply::Simple(text)) {
                        return Ok(Some(reply));
                    }
                }

                DecodeState::Error => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    let text = into_utf8(line)?;
                    if let Some(reply) = self.complete(Reply::Error(text)) {
                        return Ok(Some(reply));
                    }
                }

                DecodeState::Integer => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    let n = parse_i64(&line)?;
                    if let Some(reply) = self.complete(Reply::Integer(n)) {
                        return Ok(Some(reply));
                    }
                }

                DecodeState::BulkLen => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    match parse_i64(&line)? {
                        -1 => {
                            if let Some(reply) = self.complete(Reply::Bulk(None)) {
                                return Ok(Some(reply));
                            }
                        }
                        n if n < -1 => return Err(ProtocolError::InvalidLength(n)),
                        n => {
                            let len = n as usize;
                            if len > MAX_BULK_SIZE {
                                return Err(ProtocolError::BulkTooLarge {
                                    len,
                                    max: MAX_BULK_SIZE,
                                });
                            }
                            self.state = DecodeState::BulkBody { len };
                        }
                    }
                }

                DecodeState::BulkBody { len } => {
                    // +2 covers the trailing CRLF, consumed and discarded
                    if self.buffer.len() < len + 2 {
                        return Ok(None);
                    }
                    let data = self.buffer.split_to(len).freeze();
                    if &self.buffer[..2] != CRLF {
                        return Err(ProtocolError::MissingCrlf);
                    }
                    self.buffer.advance(2);
                    if let Some(reply) = self.complete(Reply::Bulk(Some(data))) {
                        return Ok(Some(reply));
                    }
                }

                DecodeState::ArrayLen => {
                    let Some(line) = self.take_line() else {
                        return Ok(None);
                    };
                    match parse_i64(&line)? {
                        -1 => {
                            if let Some(reply) = self.complete(Reply::Array(None)) {
                                return Ok(Some(reply));
                            }
                        }
                        0 => {
                            if let Some(reply) = self.complete(Reply::Array(Some(Vec::new()))) {
                                return Ok(Some(reply));
                            }
                        }
                        n if n < -1 => return Err(ProtocolError::InvalidLength(n)),
                        n => {
                            let declared = n as usize;
                            if declared > MAX_ARRAY_ELEMENTS {
                                return Err(ProtocolError::TooManyElements {
                                    count: declared,
                                    max: MAX_ARRAY_ELEMENTS,
                                });
                            }
                            if self.stack.len() >= MAX_ARRAY_DEPTH {
                                return Err(ProtocolError::NestedTooDeep {
                                    max: MAX_ARRAY_DEPTH,
                                });
                            }
                            self.stack.push(ArrayFrame {
                                declared,
                                // bounded first allocation; grows as filled
                                items: Vec::with_capacity(declared.min(1024)),
                            });
                            self.state = DecodeState::Idle;
                        }
                    }
                }
            }
        }
    }

    /// Take one CRLF-terminated line off the accumulator, or `None` if the
    /// terminator is not visible yet.
    fn take_line(&mut self) -> Option<Bytes> {
        let pos = find_crlf(&self.buffer)?;
        let line = self.buffer.split_to(pos).freeze();
        self.buffer.advance(2);
        Some(line)
    }

    /// Fold a finished element into the innermost array frame, cascading
    /// pops as frames fill. Returns the element itself when no array is in
    /// progress, making it a complete top-level reply.
    fn complete(&mut self, mut reply: Reply) -> Option<Reply> {
        self.state = DecodeState::Idle;
        while let Some(frame) = self.stack.last_mut() {
            frame.items.push(reply);
            if frame.items.len() < frame.declared {
                return None;
            }
            let done = self.stack.pop()?;
            reply = Reply::Array(Some(done.items));
        }
        Some(reply)
    }
}

impl Default for RespDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Find CRLF in a byte slice.
///
/// memchr does the heavy lifting for `\r`; a lone `\r` at the end of the
/// buffer is not a terminator yet.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    let mut offset = 0;
    while offset + 1 < buf.len() {
        match memchr(b'\r', &buf[offset..]) {
            Some(pos) => {
                let abs = offset + pos;
                if abs + 1 < buf.len() && buf[abs + 1] == b'\n' {
                    return Some(abs);
                }
                offset = abs + 1;
            }
            None => return None,
        }
    }
    None
}

fn into_utf8(line: Bytes) -> Result<String, ProtocolError> {
    String::from_utf8(line.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Strict signed decimal parse: optional leading `-`, digits only,
/// non-empty, no overflow.
fn parse_i64(line: &[u8]) -> Result<i64, ProtocolError> {
    let (negative, digits) = match line.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, line),
    };
    if digits.is_empty() {
        return Err(ProtocolError::InvalidNumber);
    }

    // Accumulate negative so i64::MIN parses without overflow.
    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ProtocolError::InvalidNumber);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_sub(i64::from(b - b'0')))
            .ok_or(ProtocolError::InvalidNumber)?;
    }

    if negative {
        Ok(value)
    } else {
        value.checked_neg().ok_or(ProtocolError::InvalidNumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut RespDecoder) -> Vec<Reply> {
        let mut out = Vec::new();
        while let Some(reply) = decoder.decode().unwrap() {
            out.push(reply);
        }
        out
    }

    #[test]
    fn test_simple_string() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"+PONG\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        assert_eq!(reply, Reply::simple("PONG"));
        assert!(decoder.is_idle());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_error_reply() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"-ERR unknown command\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        assert_eq!(reply, Reply::error("ERR unknown command"));
    }

    #[test]
    fn test_integers() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b":42\r\n:-1\r\n:0\r\n");
        assert_eq!(
            decode_all(&mut decoder),
            vec![Reply::Integer(42), Reply::Integer(-1), Reply::Integer(0)]
        );
    }

    #[test]
    fn test_integer_extremes() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b":9223372036854775807\r\n:-9223372036854775808\r\n");
        assert_eq!(
            decode_all(&mut decoder),
            vec![Reply::Integer(i64::MAX), Reply::Integer(i64::MIN)]
        );
    }

    #[test]
    fn test_bulk_string() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$5\r\nhello\r\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::bulk("hello"));
    }

    #[test]
    fn test_null_bulk() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$-1\r\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::null_bulk());
    }

    #[test]
    fn test_empty_bulk_is_not_null() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$0\r\n\r\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::bulk(""));
    }

    #[test]
    fn test_empty_array_is_not_null() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"*0\r\n*-1\r\n");
        assert_eq!(
            decode_all(&mut decoder),
            vec![Reply::array(vec![]), Reply::null_array()]
        );
    }

    #[test]
    fn test_command_shaped_array() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        assert_eq!(
            reply,
            Reply::array(vec![
                Reply::bulk("SET"),
                Reply::bulk("key"),
                Reply::bulk("value"),
            ])
        );
    }

    #[test]
    fn test_nested_array_with_null() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"*2\r\n*2\r\n:1\r\n:2\r\n$-1\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        assert_eq!(
            reply,
            Reply::array(vec![
                Reply::array(vec![Reply::Integer(1), Reply::Integer(2)]),
                Reply::null_bulk(),
            ])
        );
    }

    #[test]
    fn test_deeply_nested_within_limit() {
        let mut decoder = RespDecoder::new();
        let depth = 64;
        for _ in 0..depth {
            decoder.extend(b"*1\r\n");
        }
        decoder.extend(b":7\r\n");

        let mut expected = Reply::Integer(7);
        for _ in 0..depth {
            expected = Reply::array(vec![expected]);
        }
        assert_eq!(decoder.decode().unwrap().unwrap(), expected);
    }

    #[test]
    fn test_fragment_across_bulk_body() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$5\r\nhel");
        assert_eq!(decoder.decode().unwrap(), None);
        decoder.extend(b"lo\r\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::bulk("hello"));
    }

    #[test]
    fn test_fragment_across_crlf() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"+PONG\r");
        assert_eq!(decoder.decode().unwrap(), None);
        decoder.extend(b"\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::simple("PONG"));
    }

    #[test]
    fn test_fragment_mid_array() {
        // suspension between elements of an open array must resume
        let mut decoder = RespDecoder::new();
        decoder.extend(b"*2\r\n");
        assert_eq!(decoder.decode().unwrap(), None);
        decoder.extend(b"$3\r\nfoo\r\n");
        assert_eq!(decoder.decode().unwrap(), None);
        decoder.extend(b"$3\r\nbar\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        assert_eq!(
            reply,
            Reply::array(vec![Reply::bulk("foo"), Reply::bulk("bar")])
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_byte_by_byte_feeding() {
        let stream: &[u8] = b"*2\r\n*2\r\n:1\r\n:2\r\n$-1\r\n+OK\r\n:42\r\n";
        let mut decoder = RespDecoder::new();
        let mut replies = Vec::new();
        for &b in stream {
            decoder.extend(&[b]);
            while let Some(reply) = decoder.decode().unwrap() {
                replies.push(reply);
            }
        }
        assert_eq!(
            replies,
            vec![
                Reply::array(vec![
                    Reply::array(vec![Reply::Integer(1), Reply::Integer(2)]),
                    Reply::null_bulk(),
                ]),
                Reply::simple("OK"),
                Reply::Integer(42),
            ]
        );
    }

    #[test]
    fn test_pipelined_replies_in_one_chunk() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"+A\r\n-ErrB\r\n:42\r\n");
        assert_eq!(
            decode_all(&mut decoder),
            vec![Reply::simple("A"), Reply::error("ErrB"), Reply::Integer(42)]
        );
    }

    #[test]
    fn test_unknown_marker_is_fatal() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"?what\r\n");
        assert_eq!(
            decoder.decode(),
            Err(ProtocolError::InvalidTypeMarker(b'?'))
        );
    }

    #[test]
    fn test_negative_length_other_than_null() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$-2\r\n");
        assert_eq!(decoder.decode(), Err(ProtocolError::InvalidLength(-2)));

        let mut decoder = RespDecoder::new();
        decoder.extend(b"*-3\r\n");
        assert_eq!(decoder.decode(), Err(ProtocolError::InvalidLength(-3)));
    }

    #[test]
    fn test_malformed_numbers() {
        for bad in [&b":12a\r\n"[..], b":\r\n", b":-\r\n", b"$5x\r\nhello\r\n"] {
            let mut decoder = RespDecoder::new();
            decoder.extend(bad);
            assert_eq!(
                decoder.decode(),
                Err(ProtocolError::InvalidNumber),
                "expected InvalidNumber for {bad:?}"
            );
        }
    }

    #[test]
    fn test_numeric_overflow() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b":92233720368547758080\r\n");
        assert_eq!(decoder.decode(), Err(ProtocolError::InvalidNumber));
    }

    #[test]
    fn test_bulk_body_missing_crlf() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"$5\r\nhelloXX");
        assert_eq!(decoder.decode(), Err(ProtocolError::MissingCrlf));
    }

    #[test]
    fn test_oversize_declarations() {
        let mut decoder = RespDecoder::new();
        decoder.extend(format!("${}\r\n", MAX_BULK_SIZE + 1).as_bytes());
        assert!(matches!(
            decoder.decode(),
            Err(ProtocolError::BulkTooLarge { .. })
        ));

        let mut decoder = RespDecoder::new();
        decoder.extend(format!("*{}\r\n", MAX_ARRAY_ELEMENTS + 1).as_bytes());
        assert!(matches!(
            decoder.decode(),
            Err(ProtocolError::TooManyElements { .. })
        ));
    }

    #[test]
    fn test_depth_bomb() {
        let mut decoder = RespDecoder::new();
        for _ in 0..(MAX_ARRAY_DEPTH + 1) {
            decoder.extend(b"*1\r\n");
        }
        assert!(matches!(
            decoder.decode(),
            Err(ProtocolError::NestedTooDeep { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_stay_buffered() {
        let mut decoder = RespDecoder::new();
        decoder.extend(b"+OK\r\n$5\r\nhe");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::simple("OK"));
        assert_eq!(decoder.decode().unwrap(), None);
        assert!(!decoder.is_idle());
        decoder.extend(b"llo\r\n");
        assert_eq!(decoder.decode().unwrap().unwrap(), Reply::bulk("hello"));
    }
}
