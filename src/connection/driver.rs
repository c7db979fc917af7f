//! The connection driver task.
//!
//! All protocol state (the in-flight queue, the decoder, the listener map,
//! the mode flag) lives here, on one task. Handles reach it only through
//! the op channel, so every state transition happens on this task and the
//! FIFO between submission order and completion order cannot be violated
//! by scheduling.

use bytes::{Bytes, BytesMut};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use super::{Config, InFlightQueue, Op, PushMessage, Shared};
use crate::commands::catalog::Cmd;
use crate::error::{Error, ProtocolError};
use crate::protocol::{encoder, Reply, RespDecoder};

/// 32-bit FNV-1a over raw subject bytes. Listener lookup and push-kind
/// detection both go through this hash; lookups are by hash equality only.
pub(crate) const fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(0x0100_0193);
        i += 1;
    }
    hash
}

const MESSAGE_HASH: u32 = fnv1a32(b"message");
const PMESSAGE_HASH: u32 = fnv1a32(b"pmessage");
const SUBSCRIBE_HASH: u32 = fnv1a32(b"subscribe");
const PSUBSCRIBE_HASH: u32 = fnv1a32(b"psubscribe");
const UNSUBSCRIBE_HASH: u32 = fnv1a32(b"unsubscribe");
const PUNSUBSCRIBE_HASH: u32 = fnv1a32(b"punsubscribe");

/// Why the driver stopped.
#[derive(Debug)]
enum CloseReason {
    /// Every `Client` handle was dropped.
    HandlesDropped,
    /// `disconnect` was requested.
    Disconnected,
    /// The server closed the stream.
    PeerClosed,
    /// Read or write failure.
    Io(std::io::Error),
    /// Malformed inbound stream; unrecoverable.
    Protocol(ProtocolError),
}

pub(crate) fn spawn(
    stream: TcpStream,
    config: Config,
    shared: Arc<Shared>,
    ops: mpsc::UnboundedReceiver<Op>,
) {
    let driver = Driver {
        stream,
        ops,
        shared,
        decoder: RespDecoder::with_capacity(config.read_buffer_size),
        in_flight: InFlightQueue::new(),
        listeners: HashMap::new(),
        last_registered: None,
        subscriber_mode: false,
        config,
    };
    tokio::spawn(driver.run());
}

struct Driver {
    stream: TcpStream,
    ops: mpsc::UnboundedReceiver<Op>,
    shared: Arc<Shared>,
    decoder: RespDecoder,
    in_flight: InFlightQueue,
    /// Subject hash -> listener. Entries exist only in subscriber mode;
    /// first registration wins on a hash collision.
    listeners: HashMap<u32, mpsc::UnboundedSender<PushMessage>>,
    /// Fallback target for server errors that cannot be tied to a subject.
    last_registered: Option<u32>,
    /// Authoritative mode flag. The shared copy exists for handle-side
    /// fast-fail; this one is evaluated in op order.
    subscriber_mode: bool,
    config: Config,
}

impl Driver {
    async fn run(mut self) {
        let mut read_buf = vec![0u8; self.config.read_buffer_size];

        let reason = loop {
            tokio::select! {
                op = self.ops.recv() => {
                    match op {
                        None => break CloseReason::HandlesDropped,
                        Some(op) => match self.handle_ops(op).await {
                            ControlFlow::Continue(()) => {}
                            ControlFlow::Break(reason) => break reason,
                        },
                    }
                }
                result = self.stream.read(&mut read_buf) => {
                    match result {
                        Ok(0) => break CloseReason::PeerClosed,
                        Ok(n) => {
                            trace!(bytes = n, "read");
                            self.decoder.extend(&read_buf[..n]);
                            if let Err(e) = self.drain_replies() {
                                break CloseReason::Protocol(e);
                            }
                        }
                        Err(e) => break CloseReason::Io(e),
                    }
                }
            }
        };

        self.teardown(reason);
    }

    /// Process one op plus everything else already queued, then write the
    /// batch in a single syscall. Greedy batching keeps pipelined
    /// submissions in one segment where possible.
    async fn handle_ops(&mut self, first: Op) -> ControlFlow<CloseReason> {
        let mut write_buf = BytesMut::new();
        let mut op = Some(first);

        loop {
            match op.take() {
                Some(Op::Submit { buf, done }) => {
                    if self.subscriber_mode {
                        // Raced past the handle-side check before the mode
                        // flipped; same verdict, delivered here.
                        self.shared.forget_pending(1);
                        let _ = done.send(Err(Error::SubscriberMode));
                    } else {
                        write_buf.extend_from_slice(&buf);
                        self.in_flight.push_back(done);
                    }
                }

                Some(Op::Subscribe {
                    subject,
                    pattern,
                    listener,
                }) => {
                    self.enter_subscriber_mode();
                    let hash = fnv1a32(&subject);
                    match self.listeners.entry(hash) {
                        Entry::Occupied(_) => {
                            warn!(
                                subject = %String::from_utf8_lossy(&subject),
                                "listener already registered for this subject hash; keeping the first"
                            );
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(listener);
                            self.last_registered = Some(hash);
                        }
                    }
                    let cmd = if pattern { Cmd::Psubscribe } else { Cmd::Subscribe };
                    encoder::write_array_header(&mut write_buf, 2);
                    encoder::write_bulk(&mut write_buf, cmd.bytes());
                    encoder::write_bulk(&mut write_buf, &subject);
                }

                Some(Op::Unsubscribe { subject, pattern }) => {
                    let hash = fnv1a32(&subject);
                    if self.listeners.remove(&hash).is_none() {
                        debug!(
                            subject = %String::from_utf8_lossy(&subject),
                            "unsubscribe for unregistered subject"
                        );
                    }
                    if self.last_registered == Some(hash) {
                        self.last_registered = None;
                    }
                    let cmd = if pattern {
                        Cmd::Punsubscribe
                    } else {
                        Cmd::Unsubscribe
                    };
                    encoder::write_array_header(&mut write_buf, 2);
                    encoder::write_bulk(&mut write_buf, cmd.bytes());
                    encoder::write_bulk(&mut write_buf, &subject);
                }

                Some(Op::Disconnect) => return ControlFlow::Break(CloseReason::Disconnected),

                None => {}
            }

            match self.ops.try_recv() {
                Ok(next) => op = Some(next),
                Err(_) => break,
            }
        }

        if !write_buf.is_empty() {
            if let Err(e) = self.stream.write_all(&write_buf).await {
                return ControlFlow::Break(CloseReason::Io(e));
            }
        }
        ControlFlow::Continue(())
    }

    fn enter_subscriber_mode(&mut self) {
        if !self.subscriber_mode {
            debug!("entering subscriber mode");
        }
        self.subscriber_mode = true;
        self.shared.set_subscriber_mode(true);
    }

    fn leave_subscriber_mode(&mut self) {
        debug!("leaving subscriber mode");
        self.subscriber_mode = false;
        self.shared.set_subscriber_mode(false);
    }

    /// Pull every complete reply out of the decoder and dispatch it.
    fn drain_replies(&mut self) -> Result<(), ProtocolError> {
        while let Some(reply) = self.decoder.decode()? {
            self.dispatch(reply);
        }
        Ok(())
    }

    /// Route one top-level reply: push traffic to listeners while in
    /// subscriber mode, everything else to the head of the in-flight
    /// queue.
    fn dispatch(&mut self, reply: Reply) {
        let reply = if self.subscriber_mode {
            match self.dispatch_push(reply) {
                None => return,
                // Not push-shaped: a reply to a command pipelined before
                // the mode switch; the queue still owns it.
                Some(reply) => reply,
            }
        } else {
            reply
        };

        match self.in_flight.pop_front() {
            Some(done) => {
                self.shared.note_reply();
                let result = match reply {
                    Reply::Error(text) => Err(Error::Remote(text)),
                    other => Ok(other),
                };
                if done.send(result).is_err() {
                    debug!("caller dropped before its reply arrived");
                }
            }
            None => {
                error!(?reply, "unsolicited reply with no completion waiting");
            }
        }
    }

    /// Try to consume a reply as subscriber-mode push traffic. Returns the
    /// reply back when it is not push-shaped.
    fn dispatch_push(&mut self, reply: Reply) -> Option<Reply> {
        if reply.is_error() && self.in_flight.is_empty() {
            if let Reply::Error(text) = reply {
                self.push_error(text);
            }
            return None;
        }

        let mut items = match reply {
            Reply::Array(Some(items)) => items,
            other => return Some(other),
        };
        let kind_hash = match items.first().and_then(Reply::as_bytes) {
            Some(kind) => fnv1a32(kind),
            None => return Some(Reply::Array(Some(items))),
        };

        match kind_hash {
            // ["message", channel, payload]
            MESSAGE_HASH if items.len() == 3 => {
                let subject = items.get(1).and_then(Reply::as_bytes).map(fnv1a32);
                match (subject, items.pop()) {
                    (Some(hash), Some(Reply::Bulk(Some(payload)))) => {
                        self.deliver(hash, payload);
                    }
                    _ => warn!("malformed message push"),
                }
                None
            }

            // ["pmessage", pattern, channel, payload]; routed by pattern,
            // the subject the subscription was registered under
            PMESSAGE_HASH if items.len() == 4 => {
                let subject = items.get(1).and_then(Reply::as_bytes).map(fnv1a32);
                match (subject, items.pop()) {
                    (Some(hash), Some(Reply::Bulk(Some(payload)))) => {
                        self.deliver(hash, payload);
                    }
                    _ => warn!("malformed pmessage push"),
                }
                None
            }

            SUBSCRIBE_HASH | PSUBSCRIBE_HASH => {
                trace!("subscription acknowledged");
                None
            }

            UNSUBSCRIBE_HASH | PUNSUBSCRIBE_HASH => {
                // Remaining-subscription count of zero with nothing left
                // registered locally: the connection is plain again.
                let remaining = items.get(2).and_then(Reply::as_integer);
                if remaining == Some(0) && self.listeners.is_empty() {
                    self.leave_subscriber_mode();
                }
                None
            }

            _ => Some(Reply::Array(Some(items))),
        }
    }

    fn deliver(&mut self, subject_hash: u32, payload: Bytes) {
        match self.listeners.get(&subject_hash) {
            Some(listener) => {
                if listener.send(Ok(payload)).is_err() {
                    warn!("subscription receiver dropped; message discarded");
                }
            }
            None => warn!(hash = subject_hash, "push for a subject with no listener"),
        }
    }

    /// A server error arrived while only push traffic was expected. The
    /// subject cannot be recovered from the error line, so it goes to the
    /// most recently registered listener.
    fn push_error(&mut self, text: String) {
        let target = self
            .last_registered
            .and_then(|hash| self.listeners.get(&hash));
        match target {
            Some(listener) => {
                if listener.send(Err(Error::Remote(text))).is_err() {
                    warn!("subscription receiver dropped; error discarded");
                }
            }
            None => error!(%text, "server error in subscriber mode with no listener"),
        }
    }

    /// Fail every in-flight completion in FIFO order and mark the
    /// connection closed. Listener receivers see end-of-stream when the
    /// map drops with the driver.
    fn teardown(mut self, reason: CloseReason) {
        match &reason {
            CloseReason::Io(e) => error!(error = %e, "connection failed"),
            CloseReason::Protocol(e) => error!(error = %e, "protocol fault, closing connection"),
            _ => debug!(?reason, "closing connection"),
        }

        self.shared.mark_closed();
        self.shared.set_subscriber_mode(false);

        let err = match reason {
            CloseReason::Protocol(e) => Error::Protocol(e),
            _ => Error::ConnectionClosed,
        };
        let abandoned = self.in_flight.len();
        for done in self.in_flight.drain(..) {
            let _ = done.send(Err(err.duplicate()));
        }
        self.shared.forget_pending(abandoned);
    }
}
