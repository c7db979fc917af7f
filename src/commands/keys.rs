//! Generic key commands.

use bytes::Bytes;
use std::time::Duration;

use super::catalog::Cmd;
use super::{expect_bulk_array, expect_flag, expect_integer, expect_simple, Request};
use crate::connection::Client;
use crate::error::{Error, Result};

/// Expiration state of a key, as reported by TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key does not exist.
    Missing,
    /// Key exists and never expires.
    NoExpiry,
    /// Key expires after this long.
    ExpiresIn(Duration),
}

impl Client {
    /// DEL a single key. True when the key existed.
    pub async fn del(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(2, Cmd::Del).arg(key.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// DEL several keys. Resolves to the number removed.
    pub async fn del_many<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<i64> {
        let mut req = Request::new(1 + keys.len(), Cmd::Del);
        for key in keys {
            req = req.arg(key.as_ref());
        }
        expect_integer(self.submit(req.finish()).await?)
    }

    /// EXISTS.
    pub async fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(2, Cmd::Exists).arg(key.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// EXPIRE. True when a timeout was set.
    pub async fn expire(&self, key: impl AsRef<[u8]>, ttl: Duration) -> Result<bool> {
        let req = Request::new(3, Cmd::Expire)
            .arg(key.as_ref())
            .arg_i64(ttl.as_secs() as i64);
        expect_flag(self.submit(req.finish()).await?)
    }

    /// TTL, decoded into its three observable states.
    pub async fn ttl(&self, key: impl AsRef<[u8]>) -> Result<Ttl> {
        let req = Request::new(2, Cmd::Ttl).arg(key.as_ref());
        match expect_integer(self.submit(req.finish()).await?)? {
            -2 => Ok(Ttl::Missing),
            -1 => Ok(Ttl::NoExpiry),
            secs if secs >= 0 => Ok(Ttl::ExpiresIn(Duration::from_secs(secs as u64))),
            _ => Err(Error::UnexpectedReply {
                expected: "ttl integer",
                got: "integer",
            }),
        }
    }

    /// PERSIST. True when a timeout was removed.
    pub async fn persist(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(2, Cmd::Persist).arg(key.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// RENAME. Errors remotely when the source key is missing.
    pub async fn rename(&self, key: impl AsRef<[u8]>, new_key: impl AsRef<[u8]>) -> Result<()> {
        let req = Request::new(3, Cmd::Rename)
            .arg(key.as_ref())
            .arg(new_key.as_ref());
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    /// TYPE. The type name, or `"none"` for a missing key.
    pub async fn key_type(&self, key: impl AsRef<[u8]>) -> Result<String> {
        let req = Request::new(2, Cmd::Type).arg(key.as_ref());
        expect_simple(self.submit(req.finish()).await?)?.ok_or(Error::UnexpectedReply {
            expected: "simple string",
            got: "null bulk",
        })
    }

    /// KEYS. Every key matching the glob pattern.
    pub async fn keys(&self, pattern: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(2, Cmd::Keys).arg(pattern.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }
}
