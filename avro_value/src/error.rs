use std::{fmt, io, string::FromUtf8Error};

/// An error while encoding a value.
///
/// On any of these, the caller's staging buffer has already been discarded
/// (see [`crate::Encoder::encode`]) — nothing partial reaches the sink.
#[derive(Debug)]
pub enum EncodeError {
  /// The value's runtime shape does not match what the target Avro kind
  /// requires (a non-byte fixed element, a non-string map key, ...).
  TypeMismatch(String),
  /// A [`crate::Union`]'s `idx` was outside `0..branches.len()`.
  UnionIndex { idx: usize, len: usize },
  /// Writing the encoded bytes to the sink failed.
  Io(io::Error),
}

/// An error while decoding a value.
#[derive(Debug)]
pub enum DecodeError {
  /// The source ended before a value could be fully read.
  Truncated,
  /// A varint carried more than 10 continuation bytes.
  Overflow,
  /// A string's bytes were not valid UTF-8.
  InvalidUtf8(FromUtf8Error),
  /// The decode target's shape does not match what was on the wire, or the
  /// caller asked for something the codec cannot produce (e.g. a `Fixed`
  /// shape whose declared length doesn't match the caller's buffer).
  TypeMismatch(String),
  /// A union's `idx` was `>= branches.len()`.
  UnionIndex { idx: usize, len: usize },
  /// Reading from the source failed for a reason other than EOF.
  Io(io::Error),
}

impl fmt::Display for EncodeError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::TypeMismatch(msg) => write!(f, "type mismatch while encoding: {msg}"),
      Self::UnionIndex { idx, len } => {
        write!(f, "union index {idx} out of range (have {len} branches)")
      }
      Self::Io(e) => write!(f, "{e}"),
    }
  }
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Truncated => write!(f, "truncated: source ended mid-value"),
      Self::Overflow => write!(f, "varint used more than 10 continuation bytes"),
      Self::InvalidUtf8(e) => write!(f, "invalid utf8: {e}"),
      Self::TypeMismatch(msg) => write!(f, "type mismatch while decoding: {msg}"),
      Self::UnionIndex { idx, len } => {
        write!(f, "union index {idx} out of range (have {len} branches)")
      }
      Self::Io(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for EncodeError {}
impl std::error::Error for DecodeError {}

impl From<io::Error> for EncodeError {
  fn from(e: io::Error) -> Self { EncodeError::Io(e) }
}
impl From<io::Error> for DecodeError {
  fn from(e: io::Error) -> Self {
    if e.kind() == io::ErrorKind::UnexpectedEof {
      DecodeError::Truncated
    } else {
      DecodeError::Io(e)
    }
  }
}
impl From<FromUtf8Error> for DecodeError {
  fn from(e: FromUtf8Error) -> Self { DecodeError::InvalidUtf8(e) }
}
