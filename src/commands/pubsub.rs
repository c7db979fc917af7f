//! Publish/subscribe commands.
//!
//! Subscribing flips the connection into subscriber mode: regular command
//! submission fails with [`Error::SubscriberMode`] until the last
//! subscription is acknowledged as gone, and inbound traffic is routed to
//! the per-subject [`Subscription`] receivers instead of the reply queue.
//! Subscribe/unsubscribe themselves do not occupy the reply queue; the
//! server's acknowledgements are consumed by the driver.
//!
//! [`Error::SubscriberMode`]: crate::error::Error::SubscriberMode

use bytes::Bytes;

use super::catalog::Cmd;
use super::{expect_integer, Request};
use crate::connection::{Client, Subscription};
use crate::error::Result;

impl Client {
    /// PUBLISH a payload to a channel. Resolves to the number of
    /// subscribers that received it.
    ///
    /// Publishing happens on a regular connection; it fails with
    /// `SubscriberMode` on a connection that has subscribed.
    pub async fn publish(
        &self,
        channel: impl AsRef<[u8]>,
        payload: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let req = Request::new(3, Cmd::Publish)
            .arg(channel.as_ref())
            .arg(payload.as_ref());
        expect_integer(self.submit(req.finish()).await?)
    }

    /// SUBSCRIBE to a channel. Messages published to it arrive on the
    /// returned receiver.
    pub fn subscribe(&self, channel: impl AsRef<[u8]>) -> Result<Subscription> {
        self.register_listener(Bytes::copy_from_slice(channel.as_ref()), false)
    }

    /// PSUBSCRIBE to a glob pattern. Messages on any matching channel
    /// arrive on the returned receiver.
    pub fn psubscribe(&self, pattern: impl AsRef<[u8]>) -> Result<Subscription> {
        self.register_listener(Bytes::copy_from_slice(pattern.as_ref()), true)
    }

    /// UNSUBSCRIBE from a channel.
    ///
    /// Once the server acknowledges that no subscriptions remain, the
    /// connection returns to normal mode and accepts commands again.
    pub fn unsubscribe(&self, channel: impl AsRef<[u8]>) -> Result<()> {
        self.remove_listener(Bytes::copy_from_slice(channel.as_ref()), false)
    }

    /// PUNSUBSCRIBE from a pattern.
    pub fn punsubscribe(&self, pattern: impl AsRef<[u8]>) -> Result<()> {
        self.remove_listener(Bytes::copy_from_slice(pattern.as_ref()), true)
    }
}
