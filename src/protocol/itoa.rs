//! Decimal ASCII formatting for RESP length and integer fields.
//!
//! RESP spells every number (array counts, bulk lengths, integer replies)
//! as signed decimal ASCII. The hot cases are small: element counts, lengths
//! of short keys, and `-1`, the null marker for bulks and arrays. Those are
//! served from a table precomputed at compile time; anything else is
//! formatted into a fixed stack buffer.

use bytes::{BufMut, BytesMut};

use super::CRLF;

/// One cached number: digit bytes with CRLF appended, plus the digit count
/// so the plain (no terminator) form is a prefix slice of the same entry.
#[derive(Clone, Copy)]
struct Cached {
    bytes: [u8; 5],
    digits: u8,
}

const fn cached(n: u16) -> Cached {
    let mut bytes = [0u8; 5];
    let digits: u8 = if n >= 100 {
        bytes[0] = b'0' + (n / 100) as u8;
        bytes[1] = b'0' + (n / 10 % 10) as u8;
        bytes[2] = b'0' + (n % 10) as u8;
        3
    } else if n >= 10 {
        bytes[0] = b'0' + (n / 10) as u8;
        bytes[1] = b'0' + (n % 10) as u8;
        2
    } else {
        bytes[0] = b'0' + n as u8;
        1
    };
    bytes[digits as usize] = b'\r';
    bytes[digits as usize + 1] = b'\n';
    Cached { bytes, digits }
}

const fn build_small() -> [Cached; 256] {
    let mut table = [Cached { bytes: [0; 5], digits: 0 }; 256];
    let mut n = 0;
    while n < 256 {
        table[n] = cached(n as u16);
        n += 1;
    }
    table
}

/// Cached forms for `0..=255`.
static SMALL: [Cached; 256] = build_small();

/// Cached form for `-1`, RESP's null-length marker.
static NEG_ONE: Cached = Cached {
    bytes: *b"-1\r\n\0",
    digits: 2,
};

impl Cached {
    #[inline]
    fn plain(&self) -> &[u8] {
        &self.bytes[..self.digits as usize]
    }

    #[inline]
    fn with_crlf(&self) -> &[u8] {
        &self.bytes[..self.digits as usize + 2]
    }
}

#[inline]
fn lookup(v: i64) -> Option<&'static Cached> {
    if (0..=255).contains(&v) {
        Some(&SMALL[v as usize])
    } else if v == -1 {
        Some(&NEG_ONE)
    } else {
        None
    }
}

/// Append `v` as decimal ASCII.
#[inline]
pub fn write_i64(buf: &mut BytesMut, v: i64) {
    if let Some(c) = lookup(v) {
        buf.put_slice(c.plain());
    } else {
        buf.put_slice(Buffer::new().format(v));
    }
}

/// Append `v` as decimal ASCII followed by `\r\n`.
#[inline]
pub fn write_i64_crlf(buf: &mut BytesMut, v: i64) {
    if let Some(c) = lookup(v) {
        buf.put_slice(c.with_crlf());
    } else {
        buf.put_slice(Buffer::new().format(v));
        buf.put_slice(CRLF);
    }
}

/// Fixed-size formatting buffer for the uncached range.
///
/// 20 bytes exactly fits `i64::MIN` (`-9223372036854775808`).
pub struct Buffer {
    bytes: [u8; 20],
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { bytes: [0; 20] }
    }

    /// Format `n` and return the digit bytes.
    pub fn format(&mut self, n: i64) -> &[u8] {
        let negative = n < 0;
        // unsigned_abs avoids the i64::MIN negation overflow
        let mut magnitude = n.unsigned_abs();

        let mut i = self.bytes.len();
        loop {
            i -= 1;
            self.bytes[i] = b'0' + (magnitude % 10) as u8;
            magnitude /= 10;
            if magnitude == 0 {
                break;
            }
        }

        if negative {
            i -= 1;
            self.bytes[i] = b'-';
        }

        &self.bytes[i..]
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
