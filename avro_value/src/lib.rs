//! Avro-compatible binary value codec.
//!
//! This crate encodes and decodes the Avro primitive and complex types to
//! and from their canonical binary form: variable-length zig-zag integers,
//! big-endian floats/doubles, length-prefixed bytes/strings, length-free
//! fixed arrays, blocked arrays/maps, records, and discriminated unions.
//!
//! Schema parsing and resolution are out of scope -- callers supply the
//! shape of what they want decoded via [`Shape`], the way a caller of the
//! encoder supplies the shape implicitly by constructing a [`Value`].

mod decode;
mod encode;
mod error;
mod primitive;
mod value;
pub mod varint;
pub mod zigzag;

pub use decode::{from_slice, Decoder};
pub use encode::{to_vec, Encoder};
pub use error::{DecodeError, EncodeError};
pub use primitive::{FromValue, ToValue};
pub use value::{Field, FieldShape, Shape, Union, Value};
