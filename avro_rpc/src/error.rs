use std::{fmt, io};

/// An error from the framing, handshake, or envelope layer.
///
/// Wraps the lower [`avro_value`] codec errors so a caller driving the RPC
/// loop only has one error type to match on, mirroring how `bb_proxy::Error`
/// folds `bb_transfer`'s read/write errors into its own enum.
#[derive(Debug)]
pub enum RpcError {
  Io(io::Error),
  Encode(avro_value::EncodeError),
  Decode(avro_value::DecodeError),
  /// The transport ended cleanly at a frame boundary -- no bytes of a new
  /// frame's header had been read yet. A normal "the peer hung up" signal,
  /// not a framing error.
  Eof,
  /// A frame header claimed a negative block count or block size, or the
  /// stream ended partway through a frame that had already started.
  MalformedFrame,
  /// The peer's handshake response carried a `match` code other than
  /// `BOTH`/`CLIENT`, or a field the handshake shapes couldn't make sense
  /// of.
  HandshakeRejected,
  /// A request named a method the server has no handler for. The
  /// connection's byte position is now undefined -- the payload bytes for
  /// that method were never decoded, so the caller should close it.
  UnknownMethod(String),
}

impl fmt::Display for RpcError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "{e}"),
      Self::Encode(e) => write!(f, "{e}"),
      Self::Decode(e) => write!(f, "{e}"),
      Self::Eof => write!(f, "connection closed"),
      Self::MalformedFrame => write!(f, "malformed frame header"),
      Self::HandshakeRejected => write!(f, "handshake rejected by peer"),
      Self::UnknownMethod(m) => write!(f, "no handler registered for method {m:?}"),
    }
  }
}

impl std::error::Error for RpcError {}

impl From<io::Error> for RpcError {
  fn from(e: io::Error) -> Self { RpcError::Io(e) }
}
impl From<avro_value::EncodeError> for RpcError {
  fn from(e: avro_value::EncodeError) -> Self { RpcError::Encode(e) }
}
impl From<avro_value::DecodeError> for RpcError {
  fn from(e: avro_value::DecodeError) -> Self { RpcError::Decode(e) }
}
