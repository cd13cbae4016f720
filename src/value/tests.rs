use crate::error::ErrorKind;
use crate::{ObjectPath, Signature};

use super::{Array, Value};

#[test]
fn signatures() {
    assert_eq!(Value::from(1u8).signature(), "y");
    assert_eq!(Value::from("a").signature(), "s");
    assert_eq!(Value::from(ObjectPath::root()).signature(), "o");
    assert_eq!(Value::variant(1u32).signature(), "v");
    assert_eq!(
        Value::Struct(vec![Value::from(1i64), Value::variant(true)]).signature(),
        "(xv)"
    );

    let array = Array::new(Signature::new("ai").unwrap()).unwrap();
    assert_eq!(Value::from(array).signature(), "aai");
}

#[test]
fn dicts() {
    let dict = Value::dict(
        "s",
        "v",
        [
            (Value::from("a"), Value::variant(1u32)),
            (Value::from("b"), Value::variant("two")),
        ],
    )
    .unwrap();

    assert_eq!(dict.signature(), "a{sv}");
    assert_eq!(dict.as_array().map(Array::len), Some(2));

    let error = Value::dict("s", "v", [(Value::from(1u32), Value::variant(1u32))]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { expected } if &**expected == "{sv}"));

    let error = Value::dict("v", "s", []).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Signature(..)));
}

#[test]
fn arrays_check_their_items() {
    let mut array = Array::new(Signature::new("u").unwrap()).unwrap();
    array.push(Value::from(1u32)).unwrap();
    assert!(array.push(Value::from(1i32)).is_err());
    assert_eq!(array.items(), [Value::from(1u32)]);

    assert!(Array::new(Signature::new("uu").unwrap()).is_err());
    assert!(Array::from_items("{sv}", vec![]).is_ok());
    assert!(Array::from_items("{s}", vec![]).is_err());
}

#[test]
fn accessors() {
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert_eq!(Value::from(1u32).as_str(), None);
    assert_eq!(Value::from(1u32).as_u32(), Some(1));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(
        Value::variant(3u32).as_variant().and_then(Value::as_u32),
        Some(3)
    );
}
