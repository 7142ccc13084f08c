use crate::{
  error::RpcError,
  frame::Frame,
  handshake::{self, MatchCode},
};
use avro_value::{Decoder, Encoder, Field, Shape, Union, Value};
use log::{debug, trace};
use parking_lot::Mutex;
use std::{
  io::{Read, Write},
  net::TcpStream,
  sync::atomic::{AtomicBool, Ordering},
};

struct WriteSide<W> {
  writer: W,
  out_frame: Frame,
}

/// The client half of the RPC codec: `writeRequest` / `readResponseHeader` /
/// `readResponseBody`, plus `close`.
///
/// Writes and reads use independent state on purpose -- `writer` is guarded
/// by its own mutex so multiple callers can have requests in flight at once,
/// while reads are expected to be serialized by a single dedicated reader the
/// way `bb_proxy`'s connection loop owns the read half of its stream.
/// `handshake_done` is shared between both halves without a lock: it's only
/// ever flipped from false to true, once, by whichever of write or read
/// reaches the first message first.
pub struct ClientCodec<R, W> {
  reader: R,
  in_frame: Frame,
  write: Mutex<WriteSide<W>>,
  handshake_done: AtomicBool,
  protocol: Vec<u8>,
}

impl<R: Read, W: Write> ClientCodec<R, W> {
  pub fn new(reader: R, writer: W, protocol: Vec<u8>) -> Self {
    ClientCodec {
      reader,
      in_frame: Frame::new(),
      write: Mutex::new(WriteSide { writer, out_frame: Frame::new() }),
      handshake_done: AtomicBool::new(false),
      protocol,
    }
  }

  /// Encodes and flushes one request as a single frame. On the connection's
  /// first call, the handshake request is encoded into the same frame ahead
  /// of the request envelope.
  pub fn write_request(&self, xid: i32, method: &str, params: &Value) -> Result<(), RpcError> {
    let mut side = self.write.lock();
    if !self.handshake_done.load(Ordering::SeqCst) {
      trace!("bundling handshake request with first call to {method}");
      let request = handshake::request_value(&self.protocol);
      Encoder::new(&mut side.out_frame).encode(&request)?;
    }
    let envelope = Value::Record(vec![
      Field::new("meta", Value::Map(vec![])),
      Field::new("method", Value::String(method.to_string())),
      Field::new("payload", params.clone()),
    ]);
    Encoder::new(&mut side.out_frame).encode(&envelope)?;
    side.out_frame.set_xid(xid);
    side.out_frame.send(&mut side.writer)?;
    Ok(())
  }

  /// Reads one frame and returns its transaction id. On the first response,
  /// also decodes and checks the bundled handshake response.
  pub fn read_response_header(&mut self) -> Result<i32, RpcError> {
    self.in_frame.recv(&mut self.reader)?;
    if !self.handshake_done.load(Ordering::SeqCst) {
      let response = Decoder::new(&mut self.in_frame).decode(&handshake::response_shape())?;
      let code = handshake::match_code_of(&response)?;
      self.handshake_done.store(true, Ordering::SeqCst);
      debug!("handshake resolved: {code:?}");
      if code == MatchCode::NoMatch {
        return Err(RpcError::HandshakeRejected);
      }
    }
    Ok(self.in_frame.xid())
  }

  /// Decodes the response envelope out of the frame `read_response_header`
  /// already filled. `branches` gives the success and error shapes, in that
  /// order; the returned [`Union`] selects whichever one was sent.
  pub fn read_response_body(&mut self, branches: [Shape; 2]) -> Result<Union, RpcError> {
    let mut dec = Decoder::new(&mut self.in_frame);
    let _meta = dec.decode(&Shape::Map(Box::new(Shape::String)))?;
    let is_error = matches!(dec.decode(&Shape::Bool)?, Value::Bool(true));
    let idx = if is_error { 1 } else { 0 };
    let [success, error] = branches;
    let body = dec.decode(if is_error { &error } else { &success })?;
    let mut branches = vec![Value::Null, Value::Null];
    branches[idx] = body;
    Ok(Union::new(idx, branches))
  }
}

impl<W: Write> ClientCodec<TcpStream, W> {
  pub fn close(&self) -> std::io::Result<()> { self.reader.shutdown(std::net::Shutdown::Both) }
}

/// Connects to `addr` and returns a client codec bound to the connection,
/// using independent clones of the socket for the read and write halves so
/// a response can be read while a request is being written.
pub fn dial(addr: impl std::net::ToSocketAddrs, protocol: Vec<u8>) -> std::io::Result<ClientCodec<TcpStream, TcpStream>> {
  let writer = TcpStream::connect(addr)?;
  let reader = writer.try_clone()?;
  Ok(ClientCodec::new(reader, writer, protocol))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn write_request_bundles_handshake_on_first_call() {
    let mut outbound = Vec::new();
    let codec = ClientCodec::new(Cursor::new(Vec::new()), &mut outbound, b"proto".to_vec());
    codec.write_request(1, "ping", &Value::Null).unwrap();
    assert!(!outbound.is_empty());
    // xid, block count, one block size, then the block itself.
    let xid = i32::from_be_bytes(outbound[0..4].try_into().unwrap());
    assert_eq!(xid, 1);
    let block_count = i32::from_be_bytes(outbound[4..8].try_into().unwrap());
    assert_eq!(block_count, 1);
  }

  #[test]
  fn second_call_does_not_repeat_the_handshake() {
    let mut outbound = Vec::new();
    let codec = ClientCodec::new(Cursor::new(Vec::new()), &mut outbound, b"proto".to_vec());
    codec.write_request(1, "ping", &Value::Null).unwrap();
    let first_len = outbound.len();
    outbound.clear();
    codec.handshake_done.store(true, Ordering::SeqCst);
    codec.write_request(2, "ping", &Value::Null).unwrap();
    assert!(outbound.len() < first_len);
  }
}
