//! Validated D-Bus object paths.


pub use self::iter::Iter;
mod iter;

pub use self::object_path::ObjectPath;
mod object_path;

pub use self::object_path_error::ObjectPathError;
mod object_path_error;

use self::validation::validate;
mod validation;

/// The reserved local path. Messages must never be sent with this path.
pub const LOCAL_PATH: &str = "/org/freedesktop/DBus/Local";
