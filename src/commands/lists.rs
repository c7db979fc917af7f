//! List commands, including the SORT sub-block variants.
//!
//! SORT's optional blocks (BY, LIMIT, STORE, ALPHA) combine; each useful
//! combination gets its own helper so the array header is always a fixed
//! arithmetic over the block sizes rather than a runtime count.

use bytes::Bytes;

use super::catalog::{Cmd, Kw};
use super::{expect_bulk, expect_bulk_array, expect_integer, expect_simple, Request};
use crate::connection::Client;
use crate::error::Result;

impl Client {
    /// LPUSH one value. Resolves to the list length afterwards.
    pub async fn lpush(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(3, Cmd::Lpush)
            .arg(key.as_ref())
            .arg(value.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// LPUSH several values in one round trip.
    pub async fn lpush_many<V: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> Result<i64> {
        let mut req = Request::new(2 + values.len(), Cmd::Lpush).arg(key.as_ref());
        for value in values {
            req = req.arg(value.as_ref());
        }
        expect_integer(self.submit(req.finish()).await?)
    }

    /// RPUSH one value.
    pub async fn rpush(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(3, Cmd::Rpush)
            .arg(key.as_ref())
            .arg(value.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// RPUSH several values in one round trip.
    pub async fn rpush_many<V: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> Result<i64> {
        let mut req = Request::new(2 + values.len(), Cmd::Rpush).arg(key.as_ref());
        for value in values {
            req = req.arg(value.as_ref());
        }
        expect_integer(self.submit(req.finish()).await?)
    }

    /// LPOP. `None` when the list is empty or missing.
    pub async fn lpop(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let req = Request::new(2, Cmd::Lpop).arg(key.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// RPOP.
    pub async fn rpop(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let req = Request::new(2, Cmd::Rpop).arg(key.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// LLEN.
    pub async fn llen(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        let req = Request::new(2, Cmd::Llen).arg(key.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// LRANGE over an inclusive index range; negative indexes count from
    /// the tail.
    pub async fn lrange(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>> {
        let req = Request::new(4, Cmd::Lrange)
            .arg(key.as_ref())
            .arg_i64(start)
            .arg_i64(stop);
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// LINDEX.
    pub async fn lindex(&self, key: impl AsRef<[u8]>, index: i64) -> Result<Option<Bytes>> {
        let req = Request::new(3, Cmd::Lindex).arg(key.as_ref()).arg_i64(index);
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// LSET.
    pub async fn lset(
        &self,
        key: impl AsRef<[u8]>,
        index: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        let req = Request::new(4, Cmd::Lset)
            .arg(key.as_ref())
            .arg_i64(index)
            .arg(value.as_ref());
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    /// LTRIM.
    pub async fn ltrim(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<()> {
        let req = Request::new(4, Cmd::Ltrim)
            .arg(key.as_ref())
            .arg_i64(start)
            .arg_i64(stop);
        expect_simple(self.submit(req.finish()).await?)?;
        Ok(())
    }

    // ── SORT ────────────────────────────────────────────────────────────

    /// SORT with numeric comparison.
    pub async fn sort(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(2, Cmd::Sort).arg(key.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SORT ALPHA: lexicographic comparison.
    pub async fn sort_alpha(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let req = Request::new(3, Cmd::Sort).arg(key.as_ref()).kw(Kw::Alpha);
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SORT BY an external-key weight pattern.
    pub async fn sort_by(
        &self,
        key: impl AsRef<[u8]>,
        pattern: impl AsRef<[u8]>,
    ) -> Result<Vec<Bytes>> {
        let req = Request::new(4, Cmd::Sort)
            .arg(key.as_ref())
            .kw(Kw::By)
            .arg(pattern.as_ref());
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SORT LIMIT offset count.
    pub async fn sort_limit(
        &self,
        key: impl AsRef<[u8]>,
        offset: i64,
        count: i64,
    ) -> Result<Vec<Bytes>> {
        let req = Request::new(5, Cmd::Sort)
            .arg(key.as_ref())
            .kw(Kw::Limit)
            .arg_i64(offset)
            .arg_i64(count);
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SORT BY pattern LIMIT offset count.
    pub async fn sort_by_limit(
        &self,
        key: impl AsRef<[u8]>,
        pattern: impl AsRef<[u8]>,
        offset: i64,
        count: i64,
    ) -> Result<Vec<Bytes>> {
        let req = Request::new(7, Cmd::Sort)
            .arg(key.as_ref())
            .kw(Kw::By)
            .arg(pattern.as_ref())
            .kw(Kw::Limit)
            .arg_i64(offset)
            .arg_i64(count);
        expect_bulk_array(self.submit(req.finish()).await?)
    }

    /// SORT ... STORE destination. Resolves to the stored length.
    pub async fn sort_store(
        &self,
        key: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let req = Request::new(4, Cmd::Sort)
            .arg(key.as_ref())
            .kw(Kw::Store)
            .arg(destination.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// SORT BY pattern LIMIT offset count STORE destination.
    pub async fn sort_by_limit_store(
        &self,
        key: impl AsRef<[u8]>,
        pattern: impl AsRef<[u8]>,
        offset: i64,
        count: i64,
        destination: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let req = Request::new(9, Cmd::Sort)
            .arg(key.as_ref())
            .kw(Kw::By)
            .arg(pattern.as_ref())
            .kw(Kw::Limit)
            .arg_i64(offset)
            .arg_i64(count)
            .kw(Kw::Store)
            .arg(destination.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }
}
