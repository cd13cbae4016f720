use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::Result;
use crate::sasl::{Authenticator, Mechanism};
use crate::Message;

use super::connection::Handlers;
use super::handshake::authenticate;
use super::{Address, Connection};

enum BusKind {
    Session,
    System,
    Address(Box<str>),
}

/// Builder of a [`Connection`].
pub struct ConnectionBuilder {
    bus: BusKind,
    mechanisms: Vec<Mechanism>,
    uid: Option<u32>,
    username: Option<String>,
    keyring_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    hello: bool,
    handlers: Handlers,
}

impl ConnectionBuilder {
    /// Construct a new connection builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::ConnectionBuilder;
    ///
    /// let c = ConnectionBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            bus: BusKind::Session,
            mechanisms: Mechanism::DEFAULT.to_vec(),
            uid: None,
            username: None,
            keyring_dir: None,
            timeout: None,
            hello: true,
            handlers: Handlers::default(),
        }
    }

    /// Connect to the session bus (default).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dbus_engine::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> dbus_engine::Result<()> {
    /// let c = ConnectionBuilder::new().session_bus().connect().await?;
    /// # Ok(()) }
    /// ```
    pub fn session_bus(&mut self) -> &mut Self {
        self.bus = BusKind::Session;
        self
    }

    /// Connect to the system bus.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dbus_engine::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> dbus_engine::Result<()> {
    /// let c = ConnectionBuilder::new().system_bus().connect().await?;
    /// # Ok(()) }
    /// ```
    pub fn system_bus(&mut self) -> &mut Self {
        self.bus = BusKind::System;
        self
    }

    /// Connect to an explicit bus address, like
    /// `unix:path=/run/user/1000/bus`.
    pub fn address(&mut self, address: &str) -> &mut Self {
        self.bus = BusKind::Address(address.into());
        self
    }

    /// Set the authentication mechanisms to try, in order of preference.
    pub fn mechanisms(&mut self, mechanisms: &[Mechanism]) -> &mut Self {
        self.mechanisms = mechanisms.to_vec();
        self
    }

    /// Override the user id used to authenticate.
    pub fn uid(&mut self, uid: u32) -> &mut Self {
        self.uid = Some(uid);
        self
    }

    /// Override the user name sent with `DBUS_COOKIE_SHA1`.
    pub fn username(&mut self, username: &str) -> &mut Self {
        self.username = Some(username.to_owned());
        self
    }

    /// Override the directory `DBUS_COOKIE_SHA1` reads cookies from.
    pub fn keyring_dir(&mut self, keyring_dir: impl Into<PathBuf>) -> &mut Self {
        self.keyring_dir = Some(keyring_dir.into());
        self
    }

    /// Set the default timeout of [`Connection::call`].
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether to call `org.freedesktop.DBus.Hello` after authenticating.
    /// Enabled by default, disable it for peer-to-peer connections.
    pub fn hello(&mut self, hello: bool) -> &mut Self {
        self.hello = hello;
        self
    }

    /// Set the handler called with every received signal.
    pub fn on_signal<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.handlers.on_signal = Some(Arc::new(handler));
        self
    }

    /// Set the handler called with every received method call. If it returns
    /// a message, that message is sent as the reply.
    pub fn on_method_call<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Message) -> Option<Message> + Send + Sync + 'static,
    {
        self.handlers.on_method_call = Some(Arc::new(handler));
        self
    }

    /// Construct and connect a [`Connection`] with the current configuration.
    #[cfg(unix)]
    pub async fn connect(&self) -> Result<Connection> {
        let address = match &self.bus {
            BusKind::Session => Address::session_bus()?,
            BusKind::System => Address::system_bus()?,
            BusKind::Address(address) => Address::parse(address)?,
        };

        debug!(path = %address.path().display(), "connecting");
        let stream = tokio::net::UnixStream::connect(address.path()).await?;
        self.setup(stream, address.guid()).await
    }

    /// Authenticate and set up a [`Connection`] over an already connected
    /// stream.
    ///
    /// The bus selected through the builder is ignored.
    pub async fn connect_with<S>(&self, stream: S) -> Result<Connection>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.setup(stream, None).await
    }

    async fn setup<S>(&self, mut stream: S, expected_guid: Option<&str>) -> Result<Connection>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut auth = self.authenticator(expected_guid);
        let authenticated = authenticate(&mut stream, &mut auth).await?;

        debug!(guid = %authenticated.guid, "authenticated");

        let mut c = Connection::new(stream, authenticated, self.handlers.clone(), self.timeout);

        if self.hello {
            c.hello().await?;
        }

        Ok(c)
    }

    fn authenticator(&self, expected_guid: Option<&str>) -> Authenticator {
        // Streams are read as plain bytes, so descriptors can't be received.
        let mut auth = Authenticator::new(&self.mechanisms).with_unix_fds(false);

        if let Some(uid) = self.uid {
            auth = auth.with_uid(uid);
        }

        if let Some(username) = &self.username {
            auth = auth.with_username(username);
        }

        if let Some(keyring_dir) = &self.keyring_dir {
            auth = auth.with_keyring_dir(keyring_dir.clone());
        }

        if let Some(guid) = expected_guid {
            auth = auth.with_expected_guid(guid);
        }

        auth
    }
}

impl Default for ConnectionBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
