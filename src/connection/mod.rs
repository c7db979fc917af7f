//! Connection management.
//!
//! One [`Client`] owns one pipelined TCP connection, run by a driver task.
//! The handle side is cheap to clone and thread-safe; all
//! connection state lives on the driver task, and handles reach it purely
//! by message passing. Completions come back over oneshot channels, so a
//! caller that submits from any task gets its reply without the driver ever
//! running user code.

mod driver;

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::Reply;

/// Buffer size for reading from the socket.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// One server-pushed delivery on a subscribed subject: the message payload,
/// or an error the server raised while the connection was in subscriber
/// mode.
pub type PushMessage = Result<Bytes>;

/// Receiving side of one subscription.
///
/// Messages published to the subscribed channel (or matching the subscribed
/// pattern) arrive here. Dropping the subscription does not unsubscribe;
/// further messages for it are discarded with a log line until
/// [`Client::unsubscribe`] is called.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<PushMessage>,
}

impl Subscription {
    /// Wait for the next pushed message. `None` means the connection is
    /// gone.
    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.rx.recv().await
    }
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
    /// Socket read buffer size in bytes.
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodelay: true,
            read_buffer_size: READ_BUFFER_SIZE,
        }
    }
}

/// Operations sent from handles to the driver task.
pub(crate) enum Op {
    /// Write a serialized command and append its completion to the
    /// in-flight queue.
    Submit {
        buf: Bytes,
        done: oneshot::Sender<Result<Reply>>,
    },
    /// Enter subscriber mode (idempotent), register a listener under the
    /// subject hash and write the (P)SUBSCRIBE command.
    Subscribe {
        subject: Bytes,
        pattern: bool,
        listener: mpsc::UnboundedSender<PushMessage>,
    },
    /// Drop the listener for a subject and write the (P)UNSUBSCRIBE
    /// command.
    Unsubscribe { subject: Bytes, pattern: bool },
    /// Fail all in-flight completions and close the transport.
    Disconnect,
}

/// State shared between handles and the driver.
///
/// Everything here is informational or a fast-fail gate; the driver task
/// remains the single authority over protocol state.
pub(crate) struct Shared {
    /// Connection is (or is eagerly becoming) in subscriber mode.
    subscriber_mode: AtomicBool,
    /// Transport gone or disconnect requested.
    closed: AtomicBool,
    /// Commands submitted whose replies have not been delivered.
    pending: AtomicUsize,
    times: Mutex<Timestamps>,
}

struct Timestamps {
    last_submit: Instant,
    last_reply: Instant,
}

impl Shared {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            subscriber_mode: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            times: Mutex::new(Timestamps {
                last_submit: now,
                last_reply: now,
            }),
        }
    }

    pub(crate) fn set_subscriber_mode(&self, on: bool) {
        self.subscriber_mode.store(on, Ordering::Release);
    }

    pub(crate) fn in_subscriber_mode(&self) -> bool {
        self.subscriber_mode.load(Ordering::Acquire)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn note_submit(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.times.lock().last_submit = Instant::now();
    }

    pub(crate) fn note_reply(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.times.lock().last_reply = Instant::now();
    }

    pub(crate) fn forget_pending(&self, n: usize) {
        self.pending.fetch_sub(n, Ordering::AcqRel);
    }
}

/// Handle to one pipelined connection.
///
/// Clones share the connection. All command helpers in [`crate::commands`]
/// are defined on this type.
#[derive(Clone)]
pub struct Client {
    ops: mpsc::UnboundedSender<Op>,
    shared: Arc<Shared>,
}

impl Client {
    /// Connect to a server with default configuration.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::connect_with(addr, Config::default()).await
    }

    /// Connect to a server.
    pub async fn connect_with(addr: impl ToSocketAddrs, config: Config) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        if config.nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(Self::from_stream_with(stream, config))
    }

    /// Wrap an already-established stream with default configuration.
    ///
    /// Useful for tests and custom transports (e.g. a proxied stream).
    pub fn from_stream(stream: TcpStream) -> Self {
        Self::from_stream_with(stream, Config::default())
    }

    /// Wrap an already-established stream.
    pub fn from_stream_with(stream: TcpStream, config: Config) -> Self {
        let shared = Arc::new(Shared::new());
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        driver::spawn(stream, config, Arc::clone(&shared), ops_rx);
        debug!("connection established");
        Self {
            ops: ops_tx,
            shared,
        }
    }

    /// Submit one serialized command and wait for its reply.
    ///
    /// The write is handed to the driver immediately; the future resolves
    /// when the reply has been parsed, strictly in submission order
    /// relative to other submits on this connection.
    pub(crate) async fn submit(&self, buf: Bytes) -> Result<Reply> {
        if self.shared.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        if self.shared.in_subscriber_mode() {
            return Err(Error::SubscriberMode);
        }

        let (done, wait) = oneshot::channel();
        self.shared.note_submit();
        if self.ops.send(Op::Submit { buf, done }).is_err() {
            self.shared.forget_pending(1);
            return Err(Error::ConnectionClosed);
        }

        // A dropped driver means the connection died before the reply.
        match wait.await {
            Ok(result) => result,
            Err(_) => {
                self.shared.forget_pending(1);
                Err(Error::ConnectionClosed)
            }
        }
    }

    /// Register a subscription listener. Used by the pub/sub helpers.
    pub(crate) fn register_listener(
        &self,
        subject: Bytes,
        pattern: bool,
    ) -> Result<Subscription> {
        if self.shared.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        // Eager flip: submits racing with this subscribe fail fast.
        self.shared.set_subscriber_mode(true);
        let (listener, rx) = mpsc::unbounded_channel();
        self.ops
            .send(Op::Subscribe {
                subject,
                pattern,
                listener,
            })
            .map_err(|_| Error::ConnectionClosed)?;
        Ok(Subscription { rx })
    }

    /// Remove a subscription listener. Used by the pub/sub helpers.
    pub(crate) fn remove_listener(&self, subject: Bytes, pattern: bool) -> Result<()> {
        if self.shared.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.ops
            .send(Op::Unsubscribe { subject, pattern })
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Close the connection.
    ///
    /// Every command still in flight fails with
    /// [`Error::ConnectionClosed`], in submission order. Idempotent;
    /// subsequent submits fail immediately.
    pub fn disconnect(&self) {
        self.shared.mark_closed();
        // Driver may already be gone; that is the idempotent case.
        let _ = self.ops.send(Op::Disconnect);
    }

    /// True once the transport is gone or `disconnect` was called.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// True while the connection is in subscriber mode.
    pub fn in_subscriber_mode(&self) -> bool {
        self.shared.in_subscriber_mode()
    }

    /// Number of commands whose replies have not yet been delivered.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// How long the connection has been idle: time since the last reply
    /// completed, or zero while commands are in flight.
    pub fn idle_time(&self) -> Duration {
        if self.pending() == 0 {
            self.shared.times.lock().last_reply.elapsed()
        } else {
            Duration::ZERO
        }
    }

    /// How long the connection has been busy: time since the last reply
    /// completed while commands are in flight, or zero when idle.
    pub fn busy_time(&self) -> Duration {
        if self.pending() > 0 {
            self.shared.times.lock().last_reply.elapsed()
        } else {
            Duration::ZERO
        }
    }

    /// Time since the most recent command submission.
    pub fn time_since_last_submit(&self) -> Duration {
        self.shared.times.lock().last_submit.elapsed()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("closed", &self.is_closed())
            .field("subscriber_mode", &self.in_subscriber_mode())
            .field("pending", &self.pending())
            .finish()
    }
}

/// FIFO of completions awaiting their reply.
pub(crate) type InFlightQueue = VecDeque<oneshot::Sender<Result<Reply>>>;
