use crate::error::ErrorKind;

use super::cookie::{cookie_response, respond_with_challenge};
use super::{external_initial_response, Authenticator, Command, Mechanism, MAX_LINE_LENGTH};

const GUID: &str = "ae2f9b29b0e1e4c5dc8d5cbd65a5b5a0";
const SECRET: &str = "3f2a7c1e9b4d6e8f0a1b2c3d4e5f60718293a4b5c6d7e8f9";
const SERVER_CHALLENGE: &str = "5e31a8d0c9b47f26";
const CLIENT_CHALLENGE: &str = "7a9c0d2e4f6b8a1c3e5d7f9b0a2c4e6d8f1a3b5c";
/// `hex("org_example 1 5e31a8d0c9b47f26")`.
const COOKIE_DATA: &str = "6f72675f6578616d706c6520312035653331613864306339623437663236";

fn feed(auth: &mut Authenticator, data: &str) -> crate::Result<(String, bool)> {
    let mut out = Vec::new();
    let done = auth.feed(data.as_bytes(), &mut out)?;
    Ok((String::from_utf8(out).unwrap(), done.is_some()))
}

#[test]
fn external_from_uid() {
    assert_eq!(external_initial_response(1000), "31303030");
    assert_eq!(external_initial_response(u32::MAX), "34323934393637323935");
    assert_eq!(external_initial_response(0), "30");
}

#[test]
fn parse_commands() {
    assert_eq!(Command::parse(b"OK 1234").unwrap(), Command::Ok("1234"));
    assert_eq!(
        Command::parse(b"REJECTED EXTERNAL ANONYMOUS").unwrap(),
        Command::Rejected("EXTERNAL ANONYMOUS")
    );
    assert_eq!(Command::parse(b"DATA").unwrap(), Command::Data(""));
    assert_eq!(Command::parse(b"AGREE_UNIX_FD").unwrap(), Command::AgreeUnixFd);
    assert_eq!(
        Command::parse(b"ERROR \"nope\"").unwrap(),
        Command::Error("\"nope\"")
    );

    let error = Command::parse(b"BOGUS 1").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidAuthCommand(line) if &**line == "BOGUS 1"));
    assert!(error.is_authentication_failed());
}

#[test]
fn cookie_response_hash() {
    assert_eq!(
        cookie_response(SERVER_CHALLENGE, CLIENT_CHALLENGE, SECRET),
        "5c9bc8411859dd05a454531289d5e1d46db2987d"
    );
}

#[test]
fn external_then_begin() {
    let mut auth = Authenticator::new(&Mechanism::DEFAULT).with_uid(1000);

    let mut out = Vec::new();
    auth.start(&mut out).unwrap();
    assert_eq!(out, b"\0AUTH EXTERNAL 31303030\r\n");

    let (out, done) = feed(&mut auth, "DATA\r\n").unwrap();
    assert_eq!(out, "DATA\r\n");
    assert!(!done);

    let (out, done) = feed(&mut auth, &format!("OK {GUID}\r\n")).unwrap();
    assert_eq!(out, "BEGIN\r\n");
    assert!(done);
    assert!(auth.is_authenticated());
    assert_eq!(auth.guid().map(|g| g.as_str()), Some(GUID));
}

#[test]
fn lines_may_be_split() {
    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(0);
    auth.start(&mut Vec::new()).unwrap();

    assert_eq!(feed(&mut auth, "O").unwrap(), (String::new(), false));
    assert_eq!(feed(&mut auth, "K ae2f").unwrap(), (String::new(), false));

    let mut out = Vec::new();
    let done = auth.feed(b"9b29\r\nl\x01\x00\x01", &mut out).unwrap().unwrap();
    assert_eq!(out, b"BEGIN\r\n");
    assert_eq!(done.guid.as_str(), "ae2f9b29");
    assert_eq!(done.leftover, b"l\x01\x00\x01");
    assert!(!done.unix_fds);
}

#[test]
fn all_mechanisms_rejected() {
    let mut auth = Authenticator::new(&[Mechanism::External, Mechanism::Anonymous]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let (out, _) = feed(&mut auth, "REJECTED ANONYMOUS\r\n").unwrap();
    assert_eq!(out, "AUTH ANONYMOUS 646275732d656e67696e65\r\n");

    let (out, _) = feed(&mut auth, "DATA 00\r\n").unwrap();
    assert!(out.starts_with("ERROR "));

    let error = feed(&mut auth, "REJECTED\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthenticationFailed(..)));

    // Once failed, the authenticator stays failed.
    assert!(feed(&mut auth, &format!("OK {GUID}\r\n")).is_err());
}

#[test]
fn error_advances_mechanism() {
    let mut auth = Authenticator::new(&[Mechanism::External, Mechanism::Anonymous]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let (out, _) = feed(&mut auth, "ERROR \"bad uid\"\r\n").unwrap();
    assert!(out.starts_with("AUTH ANONYMOUS "));
}

#[test]
fn oversized_line() {
    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let error = feed(&mut auth, &"A".repeat(MAX_LINE_LENGTH + 1)).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthLineTooLong(..)));
    assert!(error.is_authentication_failed());

    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let line = format!("ERROR {}\r\n", "x".repeat(MAX_LINE_LENGTH));
    let error = feed(&mut auth, &line).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthLineTooLong(..)));
}

#[test]
fn line_at_limit_with_split_terminator() {
    let mut auth = Authenticator::new(&[Mechanism::External, Mechanism::Anonymous]).with_uid(0);
    auth.start(&mut Vec::new()).unwrap();

    let mut line = String::from("ERROR ");
    line.extend(std::iter::repeat('x').take(MAX_LINE_LENGTH - line.len()));
    line.push('\r');

    let (out, done) = feed(&mut auth, &line).unwrap();
    assert_eq!(out, "");
    assert!(!done);

    let (out, done) = feed(&mut auth, "\n").unwrap();
    assert_eq!(out, "AUTH ANONYMOUS 646275732d656e67696e65\r\n");
    assert!(!done);

    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(0);
    auth.start(&mut Vec::new()).unwrap();

    let mut line = "x".repeat(MAX_LINE_LENGTH + 1);
    line.push('\r');

    let error = feed(&mut auth, &line).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::AuthLineTooLong(len) if *len == MAX_LINE_LENGTH + 1
    ));
}

#[test]
fn negotiate_unix_fds() {
    let mut auth = Authenticator::new(&[Mechanism::External])
        .with_uid(1)
        .with_unix_fds(true);
    auth.start(&mut Vec::new()).unwrap();

    let (out, done) = feed(&mut auth, &format!("OK {GUID}\r\n")).unwrap();
    assert_eq!(out, "NEGOTIATE_UNIX_FD\r\n");
    assert!(!done);

    let mut out = Vec::new();
    let done = auth.feed(b"AGREE_UNIX_FD\r\n", &mut out).unwrap().unwrap();
    assert_eq!(out, b"BEGIN\r\n");
    assert!(done.unix_fds);
}

#[test]
fn unix_fds_refused() {
    let mut auth = Authenticator::new(&[Mechanism::External])
        .with_uid(1)
        .with_unix_fds(true);
    auth.start(&mut Vec::new()).unwrap();
    feed(&mut auth, &format!("OK {GUID}\r\n")).unwrap();

    let mut out = Vec::new();
    let done = auth.feed(b"ERROR\r\n", &mut out).unwrap().unwrap();
    assert_eq!(out, b"BEGIN\r\n");
    assert!(!done.unix_fds);
}

#[test]
fn unexpected_agree_unix_fd() {
    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let error = feed(&mut auth, "AGREE_UNIX_FD\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnexpectedAgreeUnixFd));
}

#[test]
fn guid_is_checked() {
    let mut auth = Authenticator::new(&[Mechanism::External])
        .with_uid(1)
        .with_expected_guid("00ff");
    auth.start(&mut Vec::new()).unwrap();

    let error = feed(&mut auth, &format!("OK {GUID}\r\n")).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::GuidMismatch));

    let mut auth = Authenticator::new(&[Mechanism::External]).with_uid(1);
    auth.start(&mut Vec::new()).unwrap();

    let error = feed(&mut auth, "OK\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MissingGuid));
}

#[cfg(unix)]
mod keyring {
    use std::fs;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    use tempfile::TempDir;

    use super::*;

    fn keyring() -> (TempDir, u32) {
        let dir = tempfile::tempdir().unwrap();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700)).unwrap();
        fs::write(
            dir.path().join("org_example"),
            format!("0 1700000000 ffff\n1 1700000000 {SECRET}\n"),
        )
        .unwrap();

        let uid = fs::metadata(dir.path()).unwrap().uid();
        (dir, uid)
    }

    #[test]
    fn fixed_cookie_response() {
        let (dir, uid) = keyring();

        let response =
            respond_with_challenge(dir.path(), Some(uid), COOKIE_DATA, CLIENT_CHALLENGE).unwrap();

        assert_eq!(
            response,
            hex::encode(format!(
                "{CLIENT_CHALLENGE} 5c9bc8411859dd05a454531289d5e1d46db2987d"
            ))
        );
    }

    #[test]
    fn external_rejected_then_cookie() {
        let (dir, uid) = keyring();

        let mut auth = Authenticator::new(&Mechanism::DEFAULT)
            .with_uid(uid)
            .with_username("alice")
            .with_keyring_dir(dir.path());

        let mut out = Vec::new();
        auth.start(&mut out).unwrap();

        let expected = format!("\0AUTH EXTERNAL {}\r\n", hex::encode(uid.to_string()));
        assert_eq!(out, expected.as_bytes());

        let (out, _) = feed(&mut auth, "REJECTED DBUS_COOKIE_SHA1 ANONYMOUS\r\n").unwrap();
        assert_eq!(out, "AUTH DBUS_COOKIE_SHA1 616c696365\r\n");

        let (out, _) = feed(&mut auth, &format!("DATA {COOKIE_DATA}\r\n")).unwrap();
        let data = out
            .strip_prefix("DATA ")
            .and_then(|data| data.strip_suffix("\r\n"))
            .unwrap();

        let data = String::from_utf8(hex::decode(data).unwrap()).unwrap();
        let (client_challenge, response) = data.split_once(' ').unwrap();
        assert_eq!(client_challenge.len(), 40);
        assert_eq!(
            response,
            cookie_response(SERVER_CHALLENGE, client_challenge, SECRET)
        );

        let (out, done) = feed(&mut auth, &format!("OK {GUID}\r\n")).unwrap();
        assert_eq!(out, "BEGIN\r\n");
        assert!(done);
    }

    #[test]
    fn unsafe_keyring() {
        let (dir, uid) = keyring();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o777)).unwrap();

        let error =
            respond_with_challenge(dir.path(), Some(uid), COOKIE_DATA, CLIENT_CHALLENGE).unwrap_err();
        assert!(error.is_authentication_failed());

        let error = respond_with_challenge(
            dir.path(),
            Some(uid.wrapping_add(1)),
            COOKIE_DATA,
            CLIENT_CHALLENGE,
        )
        .unwrap_err();
        assert!(error.is_authentication_failed());

        // The mechanism fails softly and the next one is attempted.
        let mut auth = Authenticator::new(&[Mechanism::CookieSha1, Mechanism::Anonymous])
            .with_uid(uid)
            .with_username("alice")
            .with_keyring_dir(dir.path());
        auth.start(&mut Vec::new()).unwrap();

        let (out, _) = feed(&mut auth, &format!("DATA {COOKIE_DATA}\r\n")).unwrap();
        assert!(out.starts_with("ERROR "));

        let (out, _) = feed(&mut auth, "REJECTED ANONYMOUS\r\n").unwrap();
        assert!(out.starts_with("AUTH ANONYMOUS "));
    }

    #[test]
    fn invalid_context() {
        let (dir, uid) = keyring();

        // hex("../evil 1 abc")
        let error = respond_with_challenge(
            dir.path(),
            Some(uid),
            "2e2e2f6576696c203120616263",
            CLIENT_CHALLENGE,
        )
        .unwrap_err();
        assert!(error.is_authentication_failed());
    }

    #[test]
    fn missing_cookie() {
        let (dir, uid) = keyring();

        // hex("org_example 2 5e31a8d0c9b47f26")
        let data = hex::encode("org_example 2 5e31a8d0c9b47f26");
        let error = respond_with_challenge(dir.path(), Some(uid), &data, CLIENT_CHALLENGE).unwrap_err();
        assert!(error.is_authentication_failed());
    }
}
