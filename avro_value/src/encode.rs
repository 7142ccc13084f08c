use crate::{error::EncodeError, value::Value, varint};
use std::io::Write;

/// Encodes [`Value`]s into the canonical Avro binary form.
///
/// The encoder stages a complete top-level value into an internal buffer
/// before writing it to the sink in one call, so the sink never observes a
/// half-encoded value. On error the staging buffer is discarded and nothing
/// is flushed.
pub struct Encoder<W> {
  w: W,
  buf: Vec<u8>,
  scratch: [u8; varint::MAX_BYTES],
}

impl<W: Write> Encoder<W> {
  pub fn new(w: W) -> Self { Encoder { w, buf: Vec::new(), scratch: [0; varint::MAX_BYTES] } }

  /// Encodes `value` and flushes it to the sink as a single write.
  pub fn encode(&mut self, value: &Value) -> Result<(), EncodeError> {
    self.buf.clear();
    match write_value(&mut self.buf, &mut self.scratch, value) {
      Ok(()) => {
        let result = self.w.write_all(&self.buf).map_err(EncodeError::from);
        self.buf.clear();
        result
      }
      Err(e) => {
        self.buf.clear();
        Err(e)
      }
    }
  }

  /// Returns the underlying sink, consuming the encoder.
  pub fn into_inner(self) -> W { self.w }
}

/// Encodes `value` into a freshly allocated buffer.
pub fn to_vec(value: &Value) -> Result<Vec<u8>, EncodeError> {
  let mut enc = Encoder::new(Vec::new());
  enc.encode(value)?;
  Ok(enc.into_inner())
}

fn write_long(buf: &mut Vec<u8>, scratch: &mut [u8; varint::MAX_BYTES], n: i64) {
  let u = crate::zigzag::encode(n);
  let len = varint::write(u, scratch);
  buf.extend_from_slice(&scratch[..len]);
}

fn write_value(
  buf: &mut Vec<u8>,
  scratch: &mut [u8; varint::MAX_BYTES],
  value: &Value,
) -> Result<(), EncodeError> {
  match value {
    Value::Null => {}
    Value::Bool(b) => buf.push(if *b { 1 } else { 0 }),
    Value::Int(n) => write_long(buf, scratch, *n),
    // Reuses the signed zig-zag path: see the crate docs on Unsigned.
    Value::Unsigned(n) => write_long(buf, scratch, *n as i64),
    Value::Float(f) => buf.extend_from_slice(&f.to_be_bytes()),
    Value::Double(d) => buf.extend_from_slice(&d.to_be_bytes()),
    Value::Bytes(b) => {
      write_long(buf, scratch, b.len() as i64);
      buf.extend_from_slice(b);
    }
    Value::String(s) => {
      write_long(buf, scratch, s.len() as i64);
      buf.extend_from_slice(s.as_bytes());
    }
    Value::Fixed(b) => buf.extend_from_slice(b),
    Value::Array(items) => {
      if !items.is_empty() {
        write_long(buf, scratch, items.len() as i64);
        for item in items {
          write_value(buf, scratch, item)?;
        }
      }
      write_long(buf, scratch, 0);
    }
    Value::Map(entries) => {
      if !entries.is_empty() {
        write_long(buf, scratch, entries.len() as i64);
        for (k, v) in entries {
          write_value(buf, scratch, &Value::String(k.clone()))?;
          write_value(buf, scratch, v)?;
        }
      }
      write_long(buf, scratch, 0);
    }
    Value::Record(fields) => {
      for field in fields {
        if field.transparent {
          continue;
        }
        write_value(buf, scratch, &field.value)?;
      }
    }
    Value::Union(u) => {
      if u.idx >= u.branches.len() {
        return Err(EncodeError::UnionIndex { idx: u.idx, len: u.branches.len() });
      }
      write_long(buf, scratch, u.idx as i64);
      write_value(buf, scratch, &u.branches[u.idx])?;
    }
  }
  Ok(())
}
