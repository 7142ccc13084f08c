//! A trait-based entry point that skips the [`crate::Value`] tree for call
//! sites that already know their shape at compile time, mirroring how
//! `bb_transfer`'s `MessageRead`/`MessageWrite` traits let generated code
//! avoid an intermediate representation. Both paths produce the same wire
//! bytes; `ToValue`/`FromValue` are implemented in terms of the same
//! primitives `Value::encode`/`decode` use internally.

use crate::{
  error::DecodeError,
  value::{Shape, Value},
};
use std::collections::HashMap;

/// Converts a concrete Rust value into its [`Value`] representation.
pub trait ToValue {
  fn to_value(&self) -> Value;
}

/// Builds a concrete Rust value back out of a decoded [`Value`], and
/// describes the [`Shape`] a decoder needs to produce that `Value`.
pub trait FromValue: Sized {
  fn shape() -> Shape;
  fn from_value(value: Value) -> Result<Self, DecodeError>;
}

macro_rules! impl_int {
  ($t:ty, $via:ident, $shape:ident) => {
    impl ToValue for $t {
      fn to_value(&self) -> Value { Value::$via(*self as _) }
    }
    impl FromValue for $t {
      fn shape() -> Shape { Shape::$shape }
      fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
          Value::$via(n) => Ok(n as $t),
          _ => Err(DecodeError::TypeMismatch(concat!("expected ", stringify!($t)).into())),
        }
      }
    }
  };
}

impl_int!(i8, Int, Int);
impl_int!(i16, Int, Int);
impl_int!(i32, Int, Int);
impl_int!(i64, Int, Int);
impl_int!(u8, Unsigned, Unsigned);
impl_int!(u16, Unsigned, Unsigned);
impl_int!(u32, Unsigned, Unsigned);
impl_int!(u64, Unsigned, Unsigned);

impl ToValue for bool {
  fn to_value(&self) -> Value { Value::Bool(*self) }
}
impl FromValue for bool {
  fn shape() -> Shape { Shape::Bool }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Bool(b) => Ok(b),
      _ => Err(DecodeError::TypeMismatch("expected bool".into())),
    }
  }
}

impl ToValue for f32 {
  fn to_value(&self) -> Value { Value::Float(*self) }
}
impl FromValue for f32 {
  fn shape() -> Shape { Shape::Float }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Float(f) => Ok(f),
      _ => Err(DecodeError::TypeMismatch("expected f32".into())),
    }
  }
}

impl ToValue for f64 {
  fn to_value(&self) -> Value { Value::Double(*self) }
}
impl FromValue for f64 {
  fn shape() -> Shape { Shape::Double }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Double(d) => Ok(d),
      _ => Err(DecodeError::TypeMismatch("expected f64".into())),
    }
  }
}

impl ToValue for String {
  fn to_value(&self) -> Value { Value::String(self.clone()) }
}
impl FromValue for String {
  fn shape() -> Shape { Shape::String }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::String(s) => Ok(s),
      _ => Err(DecodeError::TypeMismatch("expected string".into())),
    }
  }
}

impl ToValue for Vec<u8> {
  fn to_value(&self) -> Value { Value::Bytes(self.clone()) }
}
impl FromValue for Vec<u8> {
  fn shape() -> Shape { Shape::Bytes }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Bytes(b) => Ok(b),
      _ => Err(DecodeError::TypeMismatch("expected bytes".into())),
    }
  }
}

impl<const N: usize> ToValue for [u8; N] {
  fn to_value(&self) -> Value { Value::Fixed(self.to_vec()) }
}
impl<const N: usize> FromValue for [u8; N] {
  fn shape() -> Shape { Shape::Fixed(N) }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Fixed(b) if b.len() == N => {
        let mut out = [0u8; N];
        out.copy_from_slice(&b);
        Ok(out)
      }
      Value::Fixed(b) => Err(DecodeError::TypeMismatch(format!(
        "fixed length mismatch: wire had {}, wanted {N}",
        b.len()
      ))),
      _ => Err(DecodeError::TypeMismatch("expected fixed".into())),
    }
  }
}

impl<T: ToValue> ToValue for Vec<T> {
  fn to_value(&self) -> Value { Value::Array(self.iter().map(ToValue::to_value).collect()) }
}
impl<T: FromValue> FromValue for Vec<T> {
  fn shape() -> Shape { Shape::Array(Box::new(T::shape())) }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Array(items) => items.into_iter().map(T::from_value).collect(),
      _ => Err(DecodeError::TypeMismatch("expected array".into())),
    }
  }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
  fn to_value(&self) -> Value {
    Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
  }
}
impl<T: FromValue> FromValue for HashMap<String, T> {
  fn shape() -> Shape { Shape::Map(Box::new(T::shape())) }
  fn from_value(value: Value) -> Result<Self, DecodeError> {
    match value {
      Value::Map(entries) => entries.into_iter().map(|(k, v)| Ok((k, T::from_value(v)?))).collect(),
      _ => Err(DecodeError::TypeMismatch("expected map".into())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{decode::from_slice, encode::to_vec};
  use std::collections::HashMap;

  fn round_trip<T: ToValue + FromValue + PartialEq + std::fmt::Debug>(v: T) {
    let bytes = to_vec(&v.to_value()).unwrap();
    let decoded = from_slice(&bytes, &T::shape()).unwrap();
    assert_eq!(T::from_value(decoded).unwrap(), v);
  }

  #[test]
  fn primitives() {
    round_trip(true);
    round_trip(-1i32);
    round_trip(42u64);
    round_trip(3.5f32);
    round_trip(2.25f64);
    round_trip("hello".to_string());
    round_trip(vec![1u8, 2, 3]);
    round_trip([1u8, 2, 3]);
  }

  #[test]
  fn collections() {
    round_trip(vec![1i32, -2, 3]);
    let mut m = HashMap::new();
    m.insert("a".to_string(), 1i32);
    round_trip(m);
  }
}
