//! Queries about the current user.

use std::env;
use std::path::PathBuf;

/// The effective user id of the process.
#[cfg(all(unix, feature = "libc"))]
pub(crate) fn geteuid() -> Option<u32> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    Some(unsafe { libc::geteuid() })
}

/// The effective user id of the process.
#[cfg(not(all(unix, feature = "libc")))]
pub(crate) fn geteuid() -> Option<u32> {
    None
}

/// The name of the user with the given id, falling back to the environment.
pub(crate) fn username(uid: Option<u32>) -> Option<String> {
    if let Some(passwd) = uid.and_then(passwd) {
        return Some(passwd.name);
    }

    ["USER", "LOGNAME"]
        .into_iter()
        .find_map(|key| env::var(key).ok())
        .filter(|name| !name.is_empty())
}

/// The home directory of the current user.
pub(crate) fn home_dir(uid: Option<u32>) -> Option<PathBuf> {
    if let Some(home) = env::var_os("HOME").filter(|home| !home.is_empty()) {
        return Some(PathBuf::from(home));
    }

    uid.and_then(passwd).map(|passwd| passwd.dir)
}

#[cfg_attr(not(all(unix, feature = "libc")), allow(dead_code))]
struct Passwd {
    name: String,
    dir: PathBuf,
}

#[cfg(all(unix, feature = "libc"))]
fn passwd(uid: u32) -> Option<Passwd> {
    use std::ffi::{CStr, OsStr};
    use std::os::unix::ffi::OsStrExt;
    use std::ptr;

    let mut buf = vec![0 as libc::c_char; 1024];

    loop {
        // SAFETY: passwd is a plain C struct for which all zeroes is valid.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = ptr::null_mut();

        // SAFETY: Every pointer refers to live storage of the given size.
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if rc == libc::ERANGE && buf.len() < 1 << 16 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }

        if rc != 0 || result.is_null() {
            return None;
        }

        // SAFETY: On success the strings point into `buf` and are nul
        // terminated.
        let (name, dir) = unsafe { (CStr::from_ptr(pwd.pw_name), CStr::from_ptr(pwd.pw_dir)) };

        return Some(Passwd {
            name: name.to_str().ok()?.to_owned(),
            dir: PathBuf::from(OsStr::from_bytes(dir.to_bytes())),
        });
    }
}

#[cfg(not(all(unix, feature = "libc")))]
fn passwd(_: u32) -> Option<Passwd> {
    None
}
