//! RESP (REdis Serialization Protocol) implementation.
//!
//! Outbound commands are serialized by [`encoder`]; inbound replies are
//! parsed by the incremental [`RespDecoder`], which resumes cleanly across
//! arbitrary TCP segment boundaries.

pub mod encoder;
pub mod itoa;

mod decoder;
mod reply;

pub use decoder::RespDecoder;
pub use reply::Reply;

/// CRLF terminator bytes.
pub const CRLF: &[u8] = b"\r\n";

/// Type markers for RESP.
pub mod markers {
    /// Simple string: +
    pub const SIMPLE_STRING: u8 = b'+';
    /// Error: -
    pub const ERROR: u8 = b'-';
    /// Integer: :
    pub const INTEGER: u8 = b':';
    /// Bulk string: $
    pub const BULK_STRING: u8 = b'$';
    /// Array: *
    pub const ARRAY: u8 = b'*';
}
