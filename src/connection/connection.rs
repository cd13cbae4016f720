use std::collections::HashMap;
use std::mem;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{Error, ErrorKind, RemoteError, Result};
use crate::org_freedesktop_dbus;
use crate::proto::{Flags, MessageType};
use crate::sasl::{Authenticated, Guid};
use crate::{Message, MessageKind, Value};

use super::{ConnectionBuilder, RecvBuf, Reply, SendBuf};

/// Callback invoked with every received signal.
pub(crate) type SignalHandler = Arc<dyn Fn(Message) + Send + Sync>;

/// Callback invoked with every received method call. A returned message is
/// sent back as the reply.
pub(crate) type MethodCallHandler = Arc<dyn Fn(Message) -> Option<Message> + Send + Sync>;

#[derive(Default, Clone)]
pub(crate) struct Handlers {
    pub(crate) on_signal: Option<SignalHandler>,
    pub(crate) on_method_call: Option<MethodCallHandler>,
}

type PendingReply = oneshot::Sender<Result<Message>>;

/// The write side of the connection.
struct Outgoing {
    stream: Box<dyn AsyncWrite + Send + Unpin>,
    send: SendBuf,
}

impl Outgoing {
    /// Flush the send buffer into the stream.
    async fn flush(&mut self) -> Result<()> {
        let result = self.stream.write_all(self.send.get()).await;
        self.send.clear();
        result?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Calls waiting for their reply, keyed by serial.
#[derive(Default)]
struct Pending {
    calls: HashMap<u32, PendingReply>,
    closed: bool,
}

struct Shared {
    outgoing: Mutex<Outgoing>,
    pending: Mutex<Pending>,
}

impl Shared {
    async fn send(&self, message: &Message) -> Result<NonZeroU32> {
        let mut outgoing = self.outgoing.lock().await;

        if self.pending.lock().await.closed {
            return Err(Error::new(ErrorKind::ConnectionClosed));
        }

        let serial = outgoing.send.write_message(message)?;
        outgoing.flush().await?;
        Ok(serial)
    }

    /// Mark the connection as closed, failing every pending call and shutting
    /// down the transport.
    async fn close(&self) {
        let calls = {
            let mut pending = self.pending.lock().await;
            pending.closed = true;
            mem::take(&mut pending.calls)
        };

        for (_, reply) in calls {
            _ = reply.send(Err(Error::new(ErrorKind::ConnectionClosed)));
        }

        let mut outgoing = self.outgoing.lock().await;
        _ = outgoing.stream.shutdown().await;
    }
}

/// An asynchronous D-Bus connection.
///
/// Messages are received by a background task which routes replies to the
/// calls waiting for them, so any number of calls may be in flight at once.
/// Signals and method calls are passed to the handlers configured through
/// [`ConnectionBuilder`].
pub struct Connection {
    shared: Arc<Shared>,
    reader: JoinHandle<()>,
    guid: Guid,
    unique_name: Option<Box<str>>,
    timeout: Option<Duration>,
}

impl Connection {
    /// Shorthand for connecting to the session bus using the default
    /// configuration.
    #[cfg(unix)]
    #[inline]
    pub async fn session_bus() -> Result<Self> {
        ConnectionBuilder::new().session_bus().connect().await
    }

    /// Shorthand for connecting to the system bus using the default
    /// configuration.
    #[cfg(unix)]
    #[inline]
    pub async fn system_bus() -> Result<Self> {
        ConnectionBuilder::new().system_bus().connect().await
    }

    /// Construct a connection over an authenticated stream and spawn its
    /// reader task.
    pub(crate) fn new<S>(
        stream: S,
        authenticated: Authenticated,
        handlers: Handlers,
        timeout: Option<Duration>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);

        let shared = Arc::new(Shared {
            outgoing: Mutex::new(Outgoing {
                stream: Box::new(writer),
                send: SendBuf::new(),
            }),
            pending: Mutex::new(Pending::default()),
        });

        let mut recv = RecvBuf::new();
        recv.extend_from_slice(&authenticated.leftover);

        let reader = tokio::spawn(read_loop(shared.clone(), reader, recv, handlers));

        Self {
            shared,
            reader,
            guid: authenticated.guid,
            unique_name: None,
            timeout,
        }
    }

    /// The GUID reported by the server during authentication.
    #[inline]
    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    /// The unique name assigned by the bus in response to `Hello()`.
    #[inline]
    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    /// Send a message without waiting for a reply, returning the serial it
    /// was assigned.
    pub async fn send(&self, message: &Message) -> Result<NonZeroU32> {
        self.shared.send(message).await
    }

    /// Call a method and wait for its reply, using the default timeout of the
    /// connection if one is configured.
    ///
    /// Messages which aren't method calls, or which carry
    /// [`Flags::NO_REPLY_EXPECTED`], are sent and [`Reply::Empty`] is returned
    /// immediately.
    ///
    /// An error reply is returned as an error whose [`Error::as_remote`] is
    /// set.
    pub async fn call(&self, message: &Message) -> Result<Reply> {
        self.call_inner(message, self.timeout).await
    }

    /// Call a method and wait at most `timeout` for its reply.
    ///
    /// A reply arriving after the timeout is dropped.
    pub async fn call_with_timeout(&self, message: &Message, timeout: Duration) -> Result<Reply> {
        self.call_inner(message, Some(timeout)).await
    }

    async fn call_inner(&self, message: &Message, timeout: Option<Duration>) -> Result<Reply> {
        if message.message_type() != MessageType::METHOD_CALL
            || message.flags() & Flags::NO_REPLY_EXPECTED
        {
            self.shared.send(message).await?;
            return Ok(Reply::Empty);
        }

        let (tx, rx) = oneshot::channel();

        let serial = {
            let mut outgoing = self.shared.outgoing.lock().await;
            let serial = outgoing.send.write_message(message)?;

            {
                let mut pending = self.shared.pending.lock().await;

                if pending.closed {
                    outgoing.send.clear();
                    return Err(Error::new(ErrorKind::ConnectionClosed));
                }

                pending.calls.insert(serial.get(), tx);
            }

            if let Err(error) = outgoing.flush().await {
                self.forget(serial).await;
                return Err(error);
            }

            serial
        };

        let reply = match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                Ok(reply) => reply,
                Err(..) => {
                    self.forget(serial).await;
                    return Err(Error::new(ErrorKind::Timeout));
                }
            },
            None => rx.await,
        };

        let message = reply.map_err(|_| Error::new(ErrorKind::ConnectionClosed))??;
        into_reply(message)
    }

    async fn forget(&self, serial: NonZeroU32) {
        self.shared.pending.lock().await.calls.remove(&serial.get());
    }

    /// Register with the bus through `org.freedesktop.DBus.Hello`, storing
    /// the unique name it assigns.
    pub(crate) async fn hello(&mut self) -> Result<()> {
        let message = Message::method_call(org_freedesktop_dbus::PATH, "Hello")?
            .with_interface(org_freedesktop_dbus::INTERFACE)?
            .with_destination(org_freedesktop_dbus::DESTINATION)?;

        match self.call(&message).await? {
            Reply::Single(Value::Str(name)) => {
                debug!(name = name.as_str(), "registered with bus");
                self.unique_name = Some(name.into());
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::ValueMismatch {
                expected: "s".into(),
            })),
        }
    }

    /// Close the connection.
    ///
    /// Every call still waiting for a reply fails with a connection closed
    /// error.
    pub async fn close(&self) {
        self.reader.abort();
        self.shared.close().await;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn into_reply(message: Message) -> Result<Reply> {
    if let MessageKind::Error { error_name, .. } = message.kind() {
        let name = error_name.clone();
        let error = RemoteError::new(&name, message.into_body());
        return Err(Error::new(ErrorKind::Remote(error)));
    }

    let signature = message.signature().clone();
    Ok(Reply::from_body(&signature, message.into_body()))
}

async fn read_loop<S>(shared: Arc<Shared>, reader: ReadHalf<S>, recv: RecvBuf, handlers: Handlers)
where
    S: AsyncRead,
{
    match pump(&shared, reader, recv, &handlers).await {
        Err(error) if error.is_connection_closed() => {
            debug!("connection closed by peer");
        }
        Err(error) => {
            error!(%error, "closing connection");
        }
        Ok(()) => {}
    }

    shared.close().await;
}

/// Read and dispatch messages until the stream ends or fails.
async fn pump<S>(
    shared: &Shared,
    mut reader: ReadHalf<S>,
    mut recv: RecvBuf,
    handlers: &Handlers,
) -> Result<()>
where
    S: AsyncRead,
{
    let mut buf = vec![0; 4096];

    loop {
        while let Some(message) = recv.next_message()? {
            dispatch(shared, handlers, message).await;
        }

        let n = reader.read(&mut buf).await?;

        if n == 0 {
            return Err(Error::new(ErrorKind::ConnectionClosed));
        }

        recv.extend_from_slice(&buf[..n]);
    }
}

async fn dispatch(shared: &Shared, handlers: &Handlers, message: Message) {
    match message.kind() {
        MessageKind::MethodReturn { reply_serial } | MessageKind::Error { reply_serial, .. } => {
            let reply_serial = reply_serial.get();
            let pending = shared.pending.lock().await.calls.remove(&reply_serial);

            match pending {
                Some(pending) => {
                    _ = pending.send(Ok(message));
                }
                None => {
                    debug!(reply_serial, "dropping reply without a pending call");
                }
            }
        }
        MessageKind::Signal { .. } => match &handlers.on_signal {
            Some(handler) => {
                if panic::catch_unwind(AssertUnwindSafe(|| handler(message))).is_err() {
                    error!("signal handler panicked");
                }
            }
            None => {
                debug!(member = message.member(), "dropping signal");
            }
        },
        MessageKind::MethodCall { .. } => {
            let reply = match &handlers.on_method_call {
                Some(handler) => match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
                    Ok(reply) => reply,
                    Err(..) => {
                        error!("method call handler panicked");
                        None
                    }
                },
                None => {
                    warn!(
                        member = message.member(),
                        sender = message.sender(),
                        "unhandled method call"
                    );

                    unknown_method(&message)
                }
            };

            if let Some(reply) = reply {
                if let Err(error) = shared.send(&reply).await {
                    warn!(%error, "failed to send reply");
                }
            }
        }
    }
}

/// The error reply to a method call nobody handles, unless the caller asked
/// for no reply.
fn unknown_method(call: &Message) -> Option<Message> {
    if call.flags() & Flags::NO_REPLY_EXPECTED {
        return None;
    }

    let text = format!("Unknown method `{}`", call.member().unwrap_or_default());

    call.error(org_freedesktop_dbus::ERROR_UNKNOWN_METHOD)
        .and_then(|error| error.with_body("s", vec![Value::from(text.as_str())]))
        .ok()
}
