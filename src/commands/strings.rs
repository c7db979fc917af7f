//! String-family commands.

use bytes::Bytes;

use super::catalog::{Cmd, Kw};
use super::{expect_bulk, expect_integer, expect_simple, Request};
use crate::connection::Client;
use crate::error::Result;
use crate::protocol::Reply;

impl Client {
    /// GET. `None` when the key is missing.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let req = Request::new(2, Cmd::Get).arg(key.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// SET.
    pub async fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let req = Request::new(3, Cmd::Set).arg(key.as_ref()).arg(value.as_ref());
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    /// SET with an expiry in seconds (`EX`).
    pub async fn set_ex(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        seconds: u64,
    ) -> Result<()> {
        let req = Request::new(5, Cmd::Set)
            .arg(key.as_ref())
            .arg(value.as_ref())
            .kw(Kw::Ex)
            .arg_i64(seconds as i64);
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    /// SET with an expiry in milliseconds (`PX`).
    pub async fn set_px(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        millis: u64,
    ) -> Result<()> {
        let req = Request::new(5, Cmd::Set)
            .arg(key.as_ref())
            .arg(value.as_ref())
            .kw(Kw::Px)
            .arg_i64(millis as i64);
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    /// SET only if the key does not exist (`NX`). True when the value was
    /// set.
    pub async fn set_nx(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(4, Cmd::Set)
            .arg(key.as_ref())
            .arg(value.as_ref())
            .kw(Kw::Nx);
        Ok(expect_simple(self.submit(req.finish()).await?)?.is_some())
    }

    /// SET only if the key already exists (`XX`). True when the value was
    /// set.
    pub async fn set_xx(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(4, Cmd::Set)
            .arg(key.as_ref())
            .arg(value.as_ref())
            .kw(Kw::Xx);
        Ok(expect_simple(self.submit(req.finish()).await?)?.is_some())
    }

    /// GETSET: set and return the previous value.
    pub async fn getset(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>> {
        let req = Request::new(3, Cmd::Getset)
            .arg(key.as_ref())
            .arg(value.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// APPEND. Resolves to the new length.
    pub async fn append(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(3, Cmd::Append)
            .arg(key.as_ref())
            .arg(value.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// STRLEN.
    pub async fn strlen(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Strlen).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// INCR. Resolves to the value after the increment.
    pub async fn incr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Incr).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// DECR.
    pub async fn decr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Decr).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// INCRBY.
    pub async fn incr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        let req = Request::new(3, Cmd::Incrby).arg(key.as_ref()).arg_i64(delta);
        expect_integer(self.submit(req.finish()).await?)
    }

    /// DECRBY.
    pub async fn decr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        let req = Request::new(3, Cmd::Decrby).arg(key.as_ref()).arg_i64(delta);
        expect_integer(self.submit(req.finish()).await?)
    }

    /// MGET. One entry per requested key, missing keys as `None`.
    pub async fn mget<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Option<Bytes>>> {
        let mut req = Request::new(1 + keys.len(), Cmd::Mget);
        for key in keys {
            req = req.arg(key.as_ref());
        }
        let items = super::expect_array(self.submit(req.finish()).await?)?.unwrap_or_default();
        items
            .into_iter()
            .map(|item| match item {
                Reply::Bulk(data) => Ok(data),
                other => Err(crate::error::Error::UnexpectedReply {
                    expected: "bulk string element",
                    got: other.kind(),
                }),
            })
            .collect()
    }

    /// MSET.
    pub async fn mset<K: AsRef<[u8]>, V: AsRef<[u8]>>(&self, pairs: &[(K, V)]) -> Result<()> {
        let mut req = Request::new(1 + pairs.len() * 2, Cmd::Mset);
        for (key, value) in pairs {
            req = req.arg(key.as_ref()).arg(value.as_ref());
        }
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }
}
