//! Connection-level commands: PING, ECHO, and the raw escape hatch.

use bytes::Bytes;

use super::catalog::Cmd;
use super::{expect_bulk, expect_simple, Request};
use crate::connection::Client;
use crate::error::{Error, Result};
use crate::protocol::{encoder, Reply};

impl Client {
    /// PING. Resolves to the server's `PONG`.
    pub async fn ping(&self) -> Result<String> {
        let reply = self.submit(Request::new(1, Cmd::Ping).finish()).await?;
        expect_simple(reply)?.ok_or(Error::UnexpectedReply {
            expected: "simple string",
            got: "null bulk",
        })
    }

    /// PING with a payload; the server echoes it as a bulk.
    pub async fn ping_message(&self, message: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let req = Request::new(2, Cmd::Ping).arg(message.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// ECHO.
    pub async fn echo(&self, message: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let req = Request::new(2, Cmd::Echo).arg(message.as_ref());
        expect_bulk(self.submit(req.finish()).await?)
    }

    /// Send an arbitrary command and get the raw reply.
    ///
    /// The first element is the command name; everything is framed as bulk
    /// strings, so any command the server understands can be spelled here,
    /// including ones without a typed helper.
    pub async fn command(&self, args: &[&[u8]]) -> Result<Reply> {
        let mut buf = bytes::BytesMut::with_capacity(64);
        encoder::write_array_header(&mut buf, args.len());
        for arg in args {
            encoder::write_bulk(&mut buf, arg);
        }
        self.submit(buf.freeze()).await
    }
}
