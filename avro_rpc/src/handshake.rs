//! The one-shot handshake that precedes the first call on a connection.
//!
//! Both sides hash their own copy of the protocol description (opaque bytes
//! the caller supplies -- this crate never parses a schema) with MD5 and
//! compare. The client always sends both hashes as its own; the server
//! answers with a match code and, on mismatch, its own protocol bytes so the
//! client can decide whether to retry.

use crate::error::RpcError;
use avro_value::{Field, FieldShape, Shape, Union, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCode {
  /// Client and server hashes agree.
  Both,
  /// Hashes disagree; the server has sent its own protocol bytes back so
  /// the client can decide whether to proceed anyway.
  ClientOnly,
  /// The server refuses to serve this client's protocol at all. Unused by
  /// this crate's own server (it has no schema registry to refuse with),
  /// but a value a peer's response may legally carry.
  NoMatch,
}

impl MatchCode {
  fn from_i64(n: i64) -> Option<Self> {
    match n {
      0 => Some(MatchCode::Both),
      1 => Some(MatchCode::ClientOnly),
      2 => Some(MatchCode::NoMatch),
      _ => None,
    }
  }

  fn to_i64(self) -> i64 {
    match self {
      MatchCode::Both => 0,
      MatchCode::ClientOnly => 1,
      MatchCode::NoMatch => 2,
    }
  }
}

pub fn request_shape() -> Shape {
  Shape::Record(vec![
    FieldShape::new("client_hash", Shape::Fixed(16)),
    FieldShape::new("client_protocol", Shape::Union(vec![Shape::Null, Shape::String])),
    FieldShape::new("server_hash", Shape::Fixed(16)),
    FieldShape::new("meta", Shape::Union(vec![Shape::Null, Shape::Map(Box::new(Shape::String))])),
  ])
}

pub fn response_shape() -> Shape {
  Shape::Record(vec![
    FieldShape::new("match", Shape::Int),
    FieldShape::new("server_protocol", Shape::Union(vec![Shape::Null, Shape::String])),
    FieldShape::new("server_hash", Shape::Union(vec![Shape::Null, Shape::Fixed(16)])),
    FieldShape::new("meta", Shape::Union(vec![Shape::Null, Shape::Map(Box::new(Shape::String))])),
  ])
}

fn hash_of(protocol: &[u8]) -> Vec<u8> { md5::compute(protocol).0.to_vec() }

/// Builds the handshake request value for `protocol`. Both hash fields carry
/// the client's own hash; this crate never has a different "server hash it
/// last saw" to offer, since it does no schema caching across connections.
pub fn request_value(protocol: &[u8]) -> Value {
  let hash = hash_of(protocol);
  Value::Record(vec![
    Field::new("client_hash", Value::Fixed(hash.clone())),
    Field::new(
      "client_protocol",
      Value::Union(Box::new(Union::new(0, vec![Value::Null, Value::String(String::new())]))),
    ),
    Field::new("server_hash", Value::Fixed(hash)),
    Field::new("meta", Value::Union(Box::new(Union::new(0, vec![Value::Null, Value::Map(vec![])])))),
  ])
}

pub fn response_value(code: MatchCode, protocol: &[u8]) -> Value {
  let hash = hash_of(protocol);
  Value::Record(vec![
    Field::new("match", Value::Int(code.to_i64())),
    Field::new(
      "server_protocol",
      Value::Union(Box::new(Union::new(0, vec![Value::Null, Value::String(String::new())]))),
    ),
    Field::new("server_hash", Value::Union(Box::new(Union::new(0, vec![Value::Null, Value::Fixed(hash)])))),
    Field::new("meta", Value::Union(Box::new(Union::new(0, vec![Value::Null, Value::Map(vec![])])))),
  ])
}

/// Pulls the MD5 hash out of a decoded handshake request's `client_hash`
/// field.
pub fn client_hash_of(request: &Value) -> Result<&[u8], RpcError> {
  field(request, 0).and_then(|v| match v {
    Value::Fixed(bytes) => Ok(bytes.as_slice()),
    _ => Err(RpcError::HandshakeRejected),
  })
}

/// Pulls the match code out of a decoded handshake response's `match` field.
pub fn match_code_of(response: &Value) -> Result<MatchCode, RpcError> {
  match field(response, 0)? {
    Value::Int(n) => MatchCode::from_i64(*n).ok_or(RpcError::HandshakeRejected),
    _ => Err(RpcError::HandshakeRejected),
  }
}

fn field(record: &Value, index: usize) -> Result<&Value, RpcError> {
  match record {
    Value::Record(fields) => fields.get(index).map(|f| &f.value).ok_or(RpcError::HandshakeRejected),
    _ => Err(RpcError::HandshakeRejected),
  }
}
