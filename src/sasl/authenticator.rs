use std::fmt;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::sys;

use super::{cookie, external_initial_response, Command, Guid, Mechanism, MAX_LINE_LENGTH};

/// Trace string sent as the initial response of `ANONYMOUS`.
const ANONYMOUS_TRACE: &str = "dbus-engine";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing has been sent yet.
    Idle,
    /// `AUTH` has been sent for the given mechanism.
    MechanismInFlight(Mechanism),
    /// `NEGOTIATE_UNIX_FD` has been sent.
    NegotiatingUnixFd,
    /// `BEGIN` has been sent.
    Authenticated,
    /// Authentication failed.
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => write!(f, "idle"),
            State::MechanismInFlight(mechanism) => write!(f, "auth ({mechanism})"),
            State::NegotiatingUnixFd => write!(f, "negotiating unix fds"),
            State::Authenticated => write!(f, "authenticated"),
            State::Failed => write!(f, "failed"),
        }
    }
}

/// The outcome of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Authenticated {
    /// The GUID of the server.
    pub guid: Guid,
    /// Whether the server agreed to pass unix fds.
    pub unix_fds: bool,
    /// Bytes received after the final handshake line, which belong to the
    /// binary message stream.
    pub leftover: Vec<u8>,
}

/// Client side of the SASL handshake.
///
/// The authenticator doesn't perform any IO. Bytes written to `out` must be
/// sent to the server, and everything the server sends must be passed to
/// [`Authenticator::feed`] until it reports completion.
///
/// # Examples
///
/// ```
/// use dbus_engine::sasl::{Authenticator, Mechanism};
///
/// let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(1000);
///
/// let mut out = Vec::new();
/// auth.start(&mut out)?;
/// assert_eq!(out, b"\0AUTH EXTERNAL 31303030\r\n");
///
/// out.clear();
/// let done = auth.feed(b"OK 1234deadbeef\r\n", &mut out)?.expect("authenticated");
/// assert_eq!(out, b"BEGIN\r\n");
/// assert_eq!(done.guid.as_str(), "1234deadbeef");
/// # Ok::<_, dbus_engine::Error>(())
/// ```
pub struct Authenticator {
    state: State,
    /// Mechanisms left to try, least preferred first.
    mechanisms: Vec<Mechanism>,
    uid: Option<u32>,
    username: Option<String>,
    keyring_dir: Option<PathBuf>,
    unix_fds: bool,
    expected_guid: Option<Box<str>>,
    guid: Option<Guid>,
    /// Partially received line.
    line: Vec<u8>,
}

impl Authenticator {
    /// Construct an authenticator trying `mechanisms` in order of
    /// preference.
    ///
    /// The user id, user name and keyring directory default to those of the
    /// current process.
    pub fn new(mechanisms: &[Mechanism]) -> Self {
        let uid = sys::geteuid();

        Self {
            state: State::Idle,
            mechanisms: mechanisms.iter().rev().copied().collect(),
            uid,
            username: None,
            keyring_dir: None,
            unix_fds: false,
            expected_guid: None,
            guid: None,
            line: Vec::new(),
        }
    }

    /// Set the user id sent with `EXTERNAL`, and used to verify ownership of
    /// the keyring directory.
    #[must_use]
    pub fn with_uid(self, uid: u32) -> Self {
        Self {
            uid: Some(uid),
            ..self
        }
    }

    /// Set the user name sent with `DBUS_COOKIE_SHA1`.
    #[must_use]
    pub fn with_username(self, username: &str) -> Self {
        Self {
            username: Some(username.to_owned()),
            ..self
        }
    }

    /// Set the directory cookies are read from.
    #[must_use]
    pub fn with_keyring_dir(self, keyring_dir: impl Into<PathBuf>) -> Self {
        Self {
            keyring_dir: Some(keyring_dir.into()),
            ..self
        }
    }

    /// Negotiate unix fd passing after authenticating.
    #[must_use]
    pub fn with_unix_fds(self, unix_fds: bool) -> Self {
        Self { unix_fds, ..self }
    }

    /// Require the server to report the given GUID.
    #[must_use]
    pub fn with_expected_guid(self, guid: &str) -> Self {
        Self {
            expected_guid: Some(guid.into()),
            ..self
        }
    }

    /// The GUID of the server, once it's known.
    pub fn guid(&self) -> Option<&Guid> {
        self.guid.as_ref()
    }

    /// Test if authentication has completed.
    pub fn is_authenticated(&self) -> bool {
        self.state == State::Authenticated
    }

    /// Begin the handshake, writing the leading nul byte and the first
    /// `AUTH` command.
    pub fn start(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.state != State::Idle {
            return Err(self.unexpected("start"));
        }

        if self.username.is_none() {
            self.username = sys::username(self.uid);
        }

        if self.keyring_dir.is_none() {
            self.keyring_dir = cookie::default_keyring_dir(self.uid);
        }

        out.push(0);
        self.guard(|this| this.next_mechanism(out))
    }

    /// Feed bytes received from the server.
    ///
    /// Returns the outcome once the handshake has completed, after which the
    /// authenticator must not be fed again.
    pub fn feed(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<Option<Authenticated>> {
        self.guard(|this| {
            this.line.extend_from_slice(data);

            loop {
                let Some(end) = this.line.iter().position(|&b| b == b'\n') else {
                    // A trailing `\r` may belong to a terminator split across reads.
                    let len = this.line.len() - usize::from(this.line.last() == Some(&b'\r'));

                    if len > MAX_LINE_LENGTH {
                        return Err(Error::new(ErrorKind::AuthLineTooLong(len)));
                    }

                    return Ok(None);
                };

                let mut line = &this.line[..end];

                if let [head @ .., b'\r'] = line {
                    line = head;
                }

                if line.len() > MAX_LINE_LENGTH {
                    return Err(Error::new(ErrorKind::AuthLineTooLong(line.len())));
                }

                let line = line.to_vec();
                this.line.drain(..=end);

                let command = Command::parse(&line)?;

                if this.handle(command, out)? {
                    this.state = State::Authenticated;

                    let Some(guid) = this.guid.clone() else {
                        return Err(Error::new(ErrorKind::MissingGuid));
                    };

                    return Ok(Some(Authenticated {
                        guid,
                        unix_fds: matches!(command, Command::AgreeUnixFd),
                        leftover: std::mem::take(&mut this.line),
                    }));
                }
            }
        })
    }

    /// Run `f`, moving into the failed state if it errors.
    fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.state == State::Failed {
            return Err(Error::new(ErrorKind::AuthenticationFailed(
                "authentication already failed".into(),
            )));
        }

        let result = f(self);

        if result.is_err() {
            self.state = State::Failed;
        }

        result
    }

    /// Handle a single command, returning `true` once `BEGIN` has been sent.
    fn handle(&mut self, command: Command<'_>, out: &mut Vec<u8>) -> Result<bool> {
        debug!(state = %self.state, ?command, "auth");

        match (self.state, command) {
            (State::MechanismInFlight(..), Command::Ok(guid)) => {
                let guid = Guid::new(guid)?;

                if let Some(expected) = &self.expected_guid {
                    if **expected != *guid.as_str() {
                        return Err(Error::new(ErrorKind::GuidMismatch));
                    }
                }

                self.guid = Some(guid);

                if self.unix_fds {
                    out.extend_from_slice(b"NEGOTIATE_UNIX_FD\r\n");
                    self.state = State::NegotiatingUnixFd;
                    return Ok(false);
                }

                out.extend_from_slice(b"BEGIN\r\n");
                Ok(true)
            }
            (State::MechanismInFlight(..), Command::Rejected(..)) => {
                self.next_mechanism(out)?;
                Ok(false)
            }
            (State::MechanismInFlight(mechanism), Command::Error(reason)) => {
                warn!(%mechanism, reason, "server reported error during authentication");
                self.next_mechanism(out)?;
                Ok(false)
            }
            (State::MechanismInFlight(mechanism), Command::Data(data)) => {
                self.data(mechanism, data, out);
                Ok(false)
            }
            (State::NegotiatingUnixFd, Command::AgreeUnixFd) => {
                out.extend_from_slice(b"BEGIN\r\n");
                Ok(true)
            }
            (State::NegotiatingUnixFd, Command::Error(reason)) => {
                debug!(reason, "server refused unix fd passing");
                out.extend_from_slice(b"BEGIN\r\n");
                Ok(true)
            }
            (_, Command::AgreeUnixFd) => Err(Error::new(ErrorKind::UnexpectedAgreeUnixFd)),
            (_, command) => Err(self.unexpected(&format!("{command:?}"))),
        }
    }

    /// Respond to a `DATA` challenge.
    fn data(&mut self, mechanism: Mechanism, data: &str, out: &mut Vec<u8>) {
        match mechanism {
            Mechanism::External => {
                out.extend_from_slice(b"DATA\r\n");
            }
            Mechanism::CookieSha1 => {
                let result = match &self.keyring_dir {
                    Some(dir) => cookie::respond(dir, self.uid, data),
                    None => Err(Error::new(ErrorKind::AuthenticationFailed(
                        "no keyring directory".into(),
                    ))),
                };

                match result {
                    Ok(response) => {
                        out.extend_from_slice(format!("DATA {response}\r\n").as_bytes());
                    }
                    Err(error) => {
                        warn!(%error, "DBUS_COOKIE_SHA1 challenge failed");
                        out.extend_from_slice(format!("ERROR {error}\r\n").as_bytes());
                    }
                }
            }
            Mechanism::Anonymous => {
                out.extend_from_slice(b"ERROR ANONYMOUS takes no challenge\r\n");
            }
        }
    }

    /// Send `AUTH` for the next mechanism which can be attempted.
    fn next_mechanism(&mut self, out: &mut Vec<u8>) -> Result<()> {
        while let Some(mechanism) = self.mechanisms.pop() {
            let initial = match mechanism {
                Mechanism::External => self.uid.map(external_initial_response),
                Mechanism::CookieSha1 => self.username.as_ref().map(hex::encode),
                Mechanism::Anonymous => Some(hex::encode(ANONYMOUS_TRACE)),
            };

            let Some(initial) = initial else {
                debug!(%mechanism, "skipping mechanism without credentials");
                continue;
            };

            out.extend_from_slice(format!("AUTH {mechanism} {initial}\r\n").as_bytes());
            self.state = State::MechanismInFlight(mechanism);
            return Ok(());
        }

        Err(Error::new(ErrorKind::AuthenticationFailed(
            "all mechanisms were rejected".into(),
        )))
    }

    fn unexpected(&self, what: &str) -> Error {
        Error::new(ErrorKind::AuthenticationFailed(
            format!("unexpected {what} in state {}", self.state).into(),
        ))
    }
}
