//! Hash commands.

use bytes::Bytes;

use super::catalog::Cmd;
use super::{expect_array, expect_bulk, expect_bulk_array, expect_flag, expect_integer, Request};
use crate::connection::Client;
use crate::error::{Error, Result};
use crate::protocol::Reply;

impl Client {
    /// HSET one field. True when the field is new.
    pub async fn hset(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let req = Request::new(4, Cmd::Hset)
            .arg(key.as_ref())
            .arg(field.as_ref())
            .arg(value.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// HGET.
    pub async fn hget(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>> {
        let req = Request::new(3, Cmd::Hget)
            .arg(key.as_ref())
            .arg(field.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// HDEL one field. True when the field existed.
    pub async fn hdel(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(3, Cmd::Hdel)
            .arg(key.as_ref())
            .arg(field.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// HEXISTS.
    pub async fn hexists(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(3, Cmd::Hexists)
            .arg(key.as_ref())
            .arg(field.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// HLEN.
    pub async fn hlen(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Hlen).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// HKEYS.
    pub async fn hkeys(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(2, Cmd::Hkeys).arg(key.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// HVALS.
    pub async fn hvals(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(2, Cmd::Hvals).arg(key.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// HGETALL, paired up. The wire form is a flat field/value alternation.
    pub async fn hgetall(&self, key: impl AsRef<[u8]>) -> Result<Vec<(Bytes, Bytes)>> {
        let req = Request::new(2, Cmd::Hgetall).arg(key.as_ref());
        let items = expect_array(self.submit(req.finish()).await?)?.unwrap_or_default();

        if items.len() % 2 != 0 {
            return Err(Error::UnexpectedReply {
                expected: "field/value alternation",
                got: "array",
            });
        }

        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
            match (field, value) {
                (Reply::Bulk(Some(f)), Reply::Bulk(Some(v))) => pairs.push((f, v)),
                _ => {
                    return Err(Error::UnexpectedReply {
                        expected: "bulk string element",
                        got: "array",
                    })
                }
            }
        }
        Ok(pairs)
    }
}
