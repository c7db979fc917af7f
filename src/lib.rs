//! # Wayfarer
//!
//! An async client for Redis-compatible key/value servers.
//!
//! Wayfarer maintains a single pipelined TCP connection per [`Client`]:
//! commands are written without waiting for replies, and replies are matched
//! back to their callers strictly in submission order (RESP carries no
//! request identifiers, so FIFO correlation is the protocol's contract).
//! A connection can switch into subscriber mode, after which inbound traffic
//! consists of server-pushed messages delivered to per-channel receivers.
//!
//! ## Example
//!
//! ```no_run
//! use wayfarer::{Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::connect("127.0.0.1:6379").await?;
//!     client.set("greeting", b"hello").await?;
//!     let value = client.get("greeting").await?;
//!     assert_eq!(value.as_deref(), Some(&b"hello"[..]));
//!     Ok(())
//! }
//! ```
//!
//! ## Pipelining
//!
//! Every helper submits immediately and returns a future for its own reply;
//! issuing several commands before awaiting any of them pipelines them over
//! the wire. Replies resolve in submission order.

#![doc(html_root_url = "https://docs.rs/wayfarer/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_lifetimes,
    unused_qualifications
)]
#![allow(clippy::module_name_repetitions)]

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Typed command helpers and the command/keyword token catalog.
pub mod commands;
/// Connection handle, driver task and subscriber-mode plumbing.
pub mod connection;
/// Error types and result alias.
pub mod error;
/// RESP wire format: encoder, incremental decoder and reply model.
pub mod protocol;

// ─────────────────────────────────────────────────────────────────────────────
// Common Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use commands::Ttl;
pub use connection::{Client, Config, PushMessage, Subscription};
pub use error::{Error, ProtocolError, Result};
pub use protocol::{Reply, RespDecoder};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port.
pub const DEFAULT_PORT: u16 = 6379;

/// Maximum accepted bulk string length declared by the server (512 MiB).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum accepted array element count declared by the server.
pub const MAX_ARRAY_ELEMENTS: usize = 1_000_000;

/// Maximum array nesting depth accepted from the server.
pub const MAX_ARRAY_DEPTH: usize = 128;
