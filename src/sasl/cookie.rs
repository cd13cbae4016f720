//! The `DBUS_COOKIE_SHA1` mechanism.
//!
//! Cookies live in `~/.dbus-keyrings/<context>`, one per line as
//! `<id> <timestamp> <secret>`. The keyring directory is only trusted if it
//! is owned by the current user and not writable by anyone else.

use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use sha1::{Digest, Sha1};

use crate::error::{Error, ErrorKind, Result};
use crate::sys;

/// The keyring directory relative to the home directory.
const KEYRING_DIR: &str = ".dbus-keyrings";

/// The keyring directory of the user.
pub(crate) fn default_keyring_dir(uid: Option<u32>) -> Option<PathBuf> {
    sys::home_dir(uid).map(|home| home.join(KEYRING_DIR))
}

/// Respond to the hex-encoded `DATA` challenge of the server with a random
/// client challenge.
pub(crate) fn respond(keyring_dir: &Path, uid: Option<u32>, data: &str) -> Result<String> {
    let mut random = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut random);
    let client_challenge = hex::encode(Sha1::digest(random));
    respond_with_challenge(keyring_dir, uid, data, &client_challenge)
}

/// Respond to the hex-encoded `DATA` challenge of the server.
///
/// The challenge decodes to `<context> <id> <server challenge>`, and the
/// response is the hex encoding of `<client challenge> <sha1 hex>`.
pub(crate) fn respond_with_challenge(
    keyring_dir: &Path,
    uid: Option<u32>,
    data: &str,
    client_challenge: &str,
) -> Result<String> {
    let data = hex::decode(data).map_err(|_| failed("cookie challenge is not valid hex"))?;
    let data = String::from_utf8(data).map_err(|_| failed("cookie challenge is not UTF-8"))?;

    let mut parts = data.split(' ');

    let (Some(context), Some(id), Some(server_challenge), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(failed("malformed cookie challenge"));
    };

    validate_context(context)?;
    check_keyring_dir(keyring_dir, uid)?;

    let secret = read_cookie(&keyring_dir.join(context), id)?;
    let response = cookie_response(server_challenge, client_challenge, &secret);
    Ok(hex::encode(format!("{client_challenge} {response}")))
}

/// Compute `sha1(<server challenge>:<client challenge>:<secret>)` as hex.
pub(crate) fn cookie_response(server_challenge: &str, client_challenge: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_challenge.as_bytes());
    hasher.update(b":");
    hasher.update(client_challenge.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// A context names a file inside of the keyring directory.
fn validate_context(context: &str) -> Result<()> {
    if context.is_empty() || context.starts_with('.') || context.contains(['/', '\\']) {
        return Err(failed(format!("invalid cookie context `{context}`")));
    }

    Ok(())
}

#[cfg(unix)]
pub(crate) fn check_keyring_dir(dir: &Path, uid: Option<u32>) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let metadata = fs::metadata(dir)
        .map_err(|error| failed(format!("cannot access keyring {}: {error}", dir.display())))?;

    let Some(uid) = uid else {
        return Err(failed("cannot verify keyring owner without a user id"));
    };

    if metadata.uid() != uid {
        return Err(failed(format!(
            "keyring {} is not owned by the current user",
            dir.display()
        )));
    }

    if metadata.mode() & 0o022 != 0 {
        return Err(failed(format!(
            "keyring {} is writable by group or others",
            dir.display()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn check_keyring_dir(dir: &Path, _: Option<u32>) -> Result<()> {
    Err(failed(format!(
        "permissions of keyring {} cannot be verified on this platform",
        dir.display()
    )))
}

fn read_cookie(path: &Path, id: &str) -> Result<String> {
    let keyring = fs::read_to_string(path)
        .map_err(|error| failed(format!("cannot read keyring {}: {error}", path.display())))?;

    for line in keyring.lines() {
        let mut parts = line.split_whitespace();

        if let (Some(cookie_id), Some(_timestamp), Some(secret)) =
            (parts.next(), parts.next(), parts.next())
        {
            if cookie_id == id {
                return Ok(secret.to_owned());
            }
        }
    }

    Err(failed(format!("no cookie {id} in {}", path.display())))
}

fn failed(reason: impl Into<Box<str>>) -> Error {
    Error::new(ErrorKind::AuthenticationFailed(reason.into()))
}
