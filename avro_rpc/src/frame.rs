use crate::error::RpcError;
use std::{
  collections::VecDeque,
  io::{self, Read, Write},
};

/// One framed message: a 32-bit transaction id, followed by one or more
/// length-prefixed blocks whose bytes are logically concatenated.
///
/// A `Frame` is reused across calls. [`Frame::recv`] fills it from a
/// transport; the value codec then reads the accumulated bytes back out
/// through `Frame`'s own [`Read`] impl, which drains them as they're
/// consumed -- the same "frame as byte source" role the Avro IPC spec gives
/// the wire frame, letting a handshake value and the call envelope that
/// follows it be decoded from one `Frame` with two separate `Decoder::decode`
/// calls. [`Frame::send`] is the write-side mirror: the codec writes into the
/// frame (via its [`Write`] impl) to stage one block, then `send` flushes it
/// as a single-block frame and clears the staging buffer.
pub struct Frame {
  xid: i32,
  buf: VecDeque<u8>,
}

impl Frame {
  pub fn new() -> Self { Frame { xid: 0, buf: VecDeque::new() } }

  pub fn xid(&self) -> i32 { self.xid }

  pub fn set_xid(&mut self, xid: i32) { self.xid = xid; }

  /// Reads one frame's header and blocks off `transport`, replacing any
  /// bytes left over from a previous frame.
  ///
  /// Returns [`RpcError::Eof`] if the transport ended before any byte of the
  /// `xid` field arrived -- the ordinary way a peer closing the connection
  /// between calls looks, not a framing error. Once a frame has started,
  /// running out of bytes is [`RpcError::MalformedFrame`] instead.
  pub fn recv(&mut self, transport: &mut impl Read) -> Result<(), RpcError> {
    self.buf.clear();
    let mut xid_buf = [0u8; 4];
    if !fill_tolerating_leading_eof(transport, &mut xid_buf)? {
      return Err(RpcError::Eof);
    }
    self.xid = i32::from_be_bytes(xid_buf);
    let block_count = read_i32(transport)?;
    if block_count < 0 {
      return Err(RpcError::MalformedFrame);
    }
    for _ in 0..block_count {
      let block_size = read_i32(transport)?;
      if block_size < 0 {
        return Err(RpcError::MalformedFrame);
      }
      let mut block = vec![0u8; block_size as usize];
      read_exact(transport, &mut block)?;
      self.buf.extend(block);
    }
    Ok(())
  }

  /// Flushes the frame's current `xid` and staged bytes to `transport` as a
  /// single block, then clears the staging buffer.
  pub fn send(&mut self, transport: &mut impl Write) -> io::Result<()> {
    let body: Vec<u8> = self.buf.drain(..).collect();
    transport.write_all(&self.xid.to_be_bytes())?;
    transport.write_all(&1i32.to_be_bytes())?;
    transport.write_all(&(body.len() as i32).to_be_bytes())?;
    transport.write_all(&body)?;
    transport.flush()
  }
}

impl Default for Frame {
  fn default() -> Self { Frame::new() }
}

impl Read for Frame {
  fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
    let n = out.len().min(self.buf.len());
    for slot in out.iter_mut().take(n) {
      *slot = self.buf.pop_front().expect("checked len above");
    }
    Ok(n)
  }
}

impl Write for Frame {
  fn write(&mut self, data: &[u8]) -> io::Result<usize> {
    self.buf.extend(data);
    Ok(data.len())
  }
  fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<(), RpcError> {
  match r.read_exact(buf) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(RpcError::MalformedFrame),
    Err(e) => Err(e.into()),
  }
}

/// Fills `buf` from `r`, except that a stream which ends before delivering
/// even one byte is reported as `Ok(false)` rather than an error -- the
/// caller's cue that this was a clean boundary, not a truncation. Once a
/// single byte has arrived, running out is unambiguously a mid-frame
/// truncation and propagates as an error instead.
fn fill_tolerating_leading_eof(r: &mut impl Read, buf: &mut [u8]) -> Result<bool, RpcError> {
  let mut filled = 0;
  while filled < buf.len() {
    match r.read(&mut buf[filled..]) {
      Ok(0) if filled == 0 => return Ok(false),
      Ok(0) => return Err(RpcError::MalformedFrame),
      Ok(n) => filled += n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e.into()),
    }
  }
  Ok(true)
}

fn read_i32(r: &mut impl Read) -> Result<i32, RpcError> {
  let mut buf = [0u8; 4];
  read_exact(r, &mut buf)?;
  Ok(i32::from_be_bytes(buf))
}
