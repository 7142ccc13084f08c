use crate::{
  error::RpcError,
  frame::Frame,
  handshake::{self, MatchCode},
};
use avro_value::{Decoder, Encoder, Field, Shape, Value};
use log::{debug, trace, warn};
use std::{
  collections::HashMap,
  io::{Read, Write},
  net::{TcpListener, TcpStream},
  thread,
};

/// One registered RPC method.
///
/// `params_shape` tells [`ServerCodec::read_request`] how to decode the
/// request payload before `call` ever sees it -- the server-side equivalent
/// of the argument type a generated client/server pair would agree on ahead
/// of time.
pub trait Handler: Send + Sync {
  fn params_shape(&self) -> Shape;
  fn call(&self, params: Value) -> Result<Value, Value>;
}

pub type HandlerTable = HashMap<String, Box<dyn Handler>>;

/// A decoded request, ready to be dispatched to its handler.
pub struct Request {
  pub xid: i32,
  pub method: String,
  pub params: Value,
}

/// The server half of the RPC codec.
///
/// `handshake_seen`/`handshake_sent` track, independently, whether this
/// connection's handshake request has been decoded and whether its response
/// has been written -- they stay out of step for exactly the duration of one
/// `read_request`/`write_response` pair, since the response is written after
/// the handler runs.
pub struct ServerCodec<R, W> {
  reader: R,
  writer: W,
  in_frame: Frame,
  out_frame: Frame,
  protocol: Vec<u8>,
  handshake_seen: bool,
  handshake_sent: bool,
  peer_hash: Vec<u8>,
}

impl<R: Read, W: Write> ServerCodec<R, W> {
  pub fn new(reader: R, writer: W, protocol: Vec<u8>) -> Self {
    ServerCodec {
      reader,
      writer,
      in_frame: Frame::new(),
      out_frame: Frame::new(),
      protocol,
      handshake_seen: false,
      handshake_sent: false,
      peer_hash: Vec::new(),
    }
  }

  /// Reads one frame, decodes a handshake request from its front on the
  /// connection's first call, and returns the request envelope decoded from
  /// whatever remains.
  pub fn read_request(&mut self, table: &HandlerTable) -> Result<Request, RpcError> {
    self.in_frame.recv(&mut self.reader)?;
    if !self.handshake_seen {
      let request = Decoder::new(&mut self.in_frame).decode(&handshake::request_shape())?;
      self.peer_hash = handshake::client_hash_of(&request)?.to_vec();
      self.handshake_seen = true;
      trace!("decoded handshake request on new connection");
    }

    let mut dec = Decoder::new(&mut self.in_frame);
    let _meta = dec.decode(&Shape::Map(Box::new(Shape::String)))?;
    let method = match dec.decode(&Shape::String)? {
      Value::String(s) => s,
      _ => unreachable!("String shape always decodes to Value::String"),
    };
    let handler = table.get(&method).ok_or_else(|| RpcError::UnknownMethod(method.clone()))?;
    let params = dec.decode(&handler.params_shape())?;
    Ok(Request { xid: self.in_frame.xid(), method, params })
  }

  /// Encodes and flushes one response as a single frame. On the
  /// connection's first response, the handshake response is encoded into
  /// the same frame ahead of the response envelope, mirroring the client
  /// bundling its handshake request with its first call.
  pub fn write_response(&mut self, xid: i32, result: Result<Value, Value>) -> Result<(), RpcError> {
    if !self.handshake_sent {
      let own_hash = md5::compute(&self.protocol).0.to_vec();
      let code = if self.peer_hash == own_hash { MatchCode::Both } else { MatchCode::ClientOnly };
      debug!("handshake resolved: {code:?}");
      let response = handshake::response_value(code, &self.protocol);
      Encoder::new(&mut self.out_frame).encode(&response)?;
      self.handshake_sent = true;
    }

    let (is_error, body) = match result {
      Ok(v) => (false, v),
      Err(v) => (true, v),
    };
    let union_idx = if is_error { 1 } else { 0 };
    let mut branches = vec![Value::Null, Value::Null];
    branches[union_idx] = body;
    let envelope = Value::Record(vec![
      Field::new("meta", Value::Map(vec![])),
      Field::new("error", Value::Bool(is_error)),
      Field::new("body", Value::Union(Box::new(avro_value::Union::new(union_idx, branches)))),
    ]);
    Encoder::new(&mut self.out_frame).encode(&envelope)?;
    self.out_frame.set_xid(xid);
    self.out_frame.send(&mut self.writer)?;
    Ok(())
  }

  /// Reads one request, dispatches it to its handler, and writes the
  /// response -- the whole call/response cycle for one frame pair.
  pub fn serve_one(&mut self, table: &HandlerTable) -> Result<(), RpcError> {
    let request = self.read_request(table)?;
    let handler = table.get(&request.method).expect("read_request already validated the method");
    let result = handler.call(request.params);
    self.write_response(request.xid, result)
  }
}

/// Accepts connections on `listener` and serves each on its own thread until
/// a handler call or framing error ends it, logging and moving on rather
/// than taking the listener down.
pub fn serve(listener: TcpListener, protocol: Vec<u8>, table: std::sync::Arc<HandlerTable>) -> std::io::Result<()> {
  for stream in listener.incoming() {
    let stream = stream?;
    let protocol = protocol.clone();
    let table = table.clone();
    thread::spawn(move || serve_connection(stream, protocol, &table));
  }
  Ok(())
}

fn serve_connection(stream: TcpStream, protocol: Vec<u8>, table: &HandlerTable) {
  let peer = stream.peer_addr().ok();
  let writer = match stream.try_clone() {
    Ok(w) => w,
    Err(e) => {
      warn!("failed to clone connection from {peer:?}: {e}");
      return;
    }
  };
  let mut codec = ServerCodec::new(stream, writer, protocol);
  loop {
    match codec.serve_one(table) {
      Ok(()) => {}
      Err(RpcError::Eof) => {
        trace!("connection from {peer:?} closed");
        break;
      }
      Err(e) => {
        warn!("closing connection from {peer:?}: {e}");
        break;
      }
    }
  }
}
