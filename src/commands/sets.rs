//! Set and sorted-set commands.

use bytes::Bytes;

use super::catalog::{Cmd, Kw};
use super::{
    expect_array, expect_bulk_array, expect_flag, expect_float_bulk, expect_integer, Request,
};
use crate::connection::Client;
use crate::error::{Error, Result};
use crate::protocol::Reply;

impl Client {
    /// SADD one member. True when the member is new.
    pub async fn sadd(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(3, Cmd::Sadd)
            .arg(key.as_ref())
            .arg(member.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// SADD several members. Resolves to the number added.
    pub async fn sadd_many<M: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> Result<i64> {
        let mut req = Request::new(2 + members.len(), Cmd::Sadd).arg(key.as_ref());
        for member in members {
            req = req.arg(member.as_ref());
        }
        expect_integer(self.submit(req.finish()).await?)
    }

    /// SREM one member. True when the member existed.
    pub async fn srem(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(3, Cmd::Srem)
            .arg(key.as_ref())
            .arg(member.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// SCARD.
    pub async fn scard(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Scard).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// SMEMBERS.
    pub async fn smembers(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(2, Cmd::Smembers).arg(key.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SISMEMBER.
    pub async fn sismember(
        &self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let req = Request::new(3, Cmd::Sismember)
            .arg(key.as_ref())
            .arg(member.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    // ── Sorted sets ─────────────────────────────────────────────────────

    /// ZADD one scored member. True when the member is new.
    pub async fn zadd(
        &self,
        key: impl AsRef<[u8]>,
        score: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let req = Request::new(4, Cmd::Zadd)
            .arg(key.as_ref())
            .arg_f64(score)
            .arg(member.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// ZSCORE. `None` when the member is missing.
    pub async fn zscore(
        &self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<f64>> {
        let req = Request::new(3, Cmd::Zscore)
            .arg(key.as_ref())
            .arg(member.as_ref());
        expect_float_bulk(self.submit(req.finish()).await?)
    }

    /// ZCARD.
    pub async fn zcard(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Zcard).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// ZINCRBY. Resolves to the new score.
    pub async fn zincrby(
        &self,
        key: impl AsRef<[u8]>,
        delta: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<f64> {
        let req = Request::new(4, Cmd::Zincrby)
            .arg(key.as_ref())
            .arg_f64(delta)
            .arg(member.as_ref());
        expect_float_bulk(self.submit(req.finish()).await?)?.ok_or(Error::UnexpectedReply {
            expected: "floating-point bulk",
            got: "null bulk",
        })
    }

    /// ZREM one member. True when the member existed.
    pub async fn zrem(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        let req = Request::new(3, Cmd::Zrem)
            .arg(key.as_ref())
            .arg(member.as_ref());
        expect_flag(self.submit(req.finish()).await?)
    }

    /// ZRANGE over an inclusive rank range.
    pub async fn zrange(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>> {
        let req = Request::new(4, Cmd::Zrange)
            .arg(key.as_ref())
            .arg_i64(start)
            .arg_i64(stop);
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// ZRANGE WITHSCORES, paired up. The wire form alternates member and
    /// score bulks.
    pub async fn zrange_withscores(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Bytes, f64)>> {
        let req = Request::new(5, Cmd::Zrange)
            .arg(key.as_ref())
            .arg_i64(start)
            .arg_i64(stop)
            .kw(Kw::Withscores);
        let items = expect_array(self.submit(req.finish()).await?)?.unwrap_or_default();

        if items.len() % 2 != 0 {
            return Err(Error::UnexpectedReply {
                expected: "member/score alternation",
                got: "array",
            });
        }

        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
            match (member, score) {
                (Reply::Bulk(Some(m)), Reply::Bulk(Some(s))) => {
                    let parsed = std::str::from_utf8(&s)
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .ok_or(Error::UnexpectedReply {
                            expected: "floating-point bulk",
                            got: "bulk string",
                        })?;
                    pairs.push((m, parsed));
                }
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
