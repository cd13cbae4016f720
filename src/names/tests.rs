use crate::error::ErrorKind;

use super::{validate_bus_name, validate_interface, validate_member, NameKind};

#[test]
fn interfaces() {
    assert!(validate_interface("org.freedesktop.DBus").is_ok());
    assert!(validate_interface("org.freedesktop.systemd1.Manager").is_ok());
    assert!(validate_interface("_a._b").is_ok());
    assert!(validate_interface("org").is_err());
    assert!(validate_interface("org.").is_err());
    assert!(validate_interface(".org.a").is_err());
    assert!(validate_interface("org.1freedesktop").is_err());
    assert!(validate_interface("org.free-desktop").is_err());
    assert!(validate_interface(&format!("a.{}", "b".repeat(254))).is_err());
}

#[test]
fn members() {
    assert!(validate_member("Hello").is_ok());
    assert!(validate_member("Get_Processes2").is_ok());
    assert!(validate_member("").is_err());
    assert!(validate_member("1Hello").is_err());
    assert!(validate_member("Hello.World").is_err());
    assert!(validate_member("Hello-World").is_err());
}

#[test]
fn bus_names() {
    assert!(validate_bus_name("org.freedesktop.DBus").is_ok());
    assert!(validate_bus_name("org.free-desktop.DBus").is_ok());
    assert!(validate_bus_name(":1.131").is_ok());
    assert!(validate_bus_name(":1").is_err());
    assert!(validate_bus_name("org.1freedesktop").is_err());
    assert!(validate_bus_name("org").is_err());
    assert!(validate_bus_name("").is_err());
}

#[test]
fn error_kind_is_reported() {
    let error = validate_member("a.b").unwrap_err();

    assert!(matches!(
        error.kind(),
        ErrorKind::InvalidName(NameKind::Member, name) if &**name == "a.b"
    ));
    assert!(error.is_marshalling());
}
