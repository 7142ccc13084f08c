use crate::{
  error::DecodeError,
  value::{Field, Shape, Union, Value},
  varint,
};
use std::io::{BufReader, Read};

/// Decodes [`Value`]s out of the canonical Avro binary form.
///
/// The decoder is stateless between calls except for its internal buffer;
/// it reads exactly as many bytes as `shape` says the value should take.
pub struct Decoder<R> {
  r: BufReader<R>,
}

impl<R: Read> Decoder<R> {
  pub fn new(r: R) -> Self { Decoder { r: BufReader::new(r) } }

  pub fn decode(&mut self, shape: &Shape) -> Result<Value, DecodeError> { read_value(&mut self.r, shape) }
}

/// Decodes a single value out of `bytes` according to `shape`.
pub fn from_slice(bytes: &[u8], shape: &Shape) -> Result<Value, DecodeError> {
  let mut dec = Decoder::new(bytes);
  dec.decode(shape)
}

fn read_exact(r: &mut impl Read, n: usize) -> Result<Vec<u8>, DecodeError> {
  let mut buf = vec![0u8; n];
  match r.read_exact(&mut buf) {
    Ok(()) => Ok(buf),
    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(DecodeError::Truncated),
    Err(e) => Err(e.into()),
  }
}

fn read_long(r: &mut impl Read) -> Result<i64, DecodeError> {
  Ok(crate::zigzag::decode(varint::read(r)?))
}

fn read_bytes(r: &mut impl Read) -> Result<Vec<u8>, DecodeError> {
  let len = read_long(r)?;
  if len < 0 {
    return Err(DecodeError::TypeMismatch("negative byte-sequence length".into()));
  }
  read_exact(r, len as usize)
}

/// Reads one blocked container's worth of items, invoking `read_item` for
/// each. Handles the negative-count ("absolute count follows as long")
/// form and stops at the first zero-count block.
fn read_blocks(
  r: &mut impl Read,
  mut read_item: impl FnMut(&mut dyn Read) -> Result<(), DecodeError>,
) -> Result<(), DecodeError> {
  loop {
    let mut count = read_long(r)?;
    if count == 0 {
      return Ok(());
    }
    if count < 0 {
      count = -count;
      let _byte_size_hint = read_long(r)?;
    }
    for _ in 0..count {
      read_item(r)?;
    }
  }
}

fn read_value(r: &mut impl Read, shape: &Shape) -> Result<Value, DecodeError> {
  Ok(match shape {
    Shape::Null => Value::Null,
    Shape::Bool => {
      let b = read_exact(r, 1)?;
      Value::Bool(b[0] != 0)
    }
    Shape::Int => Value::Int(read_long(r)?),
    Shape::Unsigned => Value::Unsigned(read_long(r)? as u64),
    Shape::Float => {
      let b = read_exact(r, 4)?;
      Value::Float(f32::from_be_bytes(b.try_into().unwrap()))
    }
    Shape::Double => {
      let b = read_exact(r, 8)?;
      Value::Double(f64::from_be_bytes(b.try_into().unwrap()))
    }
    Shape::Bytes => Value::Bytes(read_bytes(r)?),
    Shape::String => Value::String(String::from_utf8(read_bytes(r)?)?),
    Shape::Fixed(n) => Value::Fixed(read_exact(r, *n)?),
    Shape::Array(elem) => {
      let mut items = Vec::new();
      read_blocks(r, |r| {
        items.push(read_value(r, elem)?);
        Ok(())
      })?;
      Value::Array(items)
    }
    Shape::Map(elem) => {
      let mut entries = Vec::new();
      read_blocks(r, |r| {
        let key = String::from_utf8(read_bytes(r)?)?;
        let value = read_value(r, elem)?;
        entries.push((key, value));
        Ok(())
      })?;
      Value::Map(entries)
    }
    Shape::Record(field_shapes) => {
      let mut fields = Vec::with_capacity(field_shapes.len());
      for fs in field_shapes {
        if fs.transparent {
          fields.push(Field::transparent(fs.name.clone(), Value::Null));
          continue;
        }
        fields.push(Field::new(fs.name.clone(), read_value(r, &fs.shape)?));
      }
      Value::Record(fields)
    }
    Shape::Union(branch_shapes) => {
      let idx = read_long(r)?;
      if idx < 0 || idx as usize >= branch_shapes.len() {
        return Err(DecodeError::UnionIndex {
          idx: idx.max(0) as usize,
          len: branch_shapes.len(),
        });
      }
      let idx = idx as usize;
      let mut branches: Vec<Value> = branch_shapes.iter().map(|_| Value::Null).collect();
      branches[idx] = read_value(r, &branch_shapes[idx])?;
      Value::Union(Box::new(Union { idx, branches }))
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::encode::to_vec;
  use crate::value::FieldShape;

  fn round_trip(value: Value, shape: &Shape) {
    let bytes = to_vec(&value).unwrap();
    assert_eq!(from_slice(&bytes, shape).unwrap(), value);
  }

  #[test]
  fn primitives_round_trip() {
    round_trip(Value::Null, &Shape::Null);
    round_trip(Value::Bool(true), &Shape::Bool);
    round_trip(Value::Bool(false), &Shape::Bool);
    round_trip(Value::Int(-12345), &Shape::Int);
    round_trip(Value::Unsigned(999), &Shape::Unsigned);
    round_trip(Value::Float(3.25), &Shape::Float);
    round_trip(Value::Double(-2.5), &Shape::Double);
    round_trip(Value::Bytes(vec![1, 2, 3]), &Shape::Bytes);
    round_trip(Value::String("hello".into()), &Shape::String);
    round_trip(Value::Fixed(vec![9, 8, 7]), &Shape::Fixed(3));
  }

  #[test]
  fn array_and_map_round_trip() {
    round_trip(
      Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(2)]),
      &Shape::Array(Box::new(Shape::Int)),
    );
    round_trip(Value::Array(vec![]), &Shape::Array(Box::new(Shape::Int)));
    round_trip(
      Value::Map(vec![("a".into(), Value::String("b".into()))]),
      &Shape::Map(Box::new(Shape::String)),
    );
  }

  #[test]
  fn decoder_accepts_non_canonical_multi_block_arrays() {
    // count=1, item 0, count=1, item 1, count=0 -- same logical array as
    // [0, 1] encoded in a single block, just produced by a chattier encoder.
    let mut bytes = Vec::new();
    bytes.extend(to_vec(&Value::Int(1)).unwrap()); // block count 1
    bytes.extend(to_vec(&Value::Int(0)).unwrap()); // item 0
    bytes.extend(to_vec(&Value::Int(1)).unwrap()); // block count 1
    bytes.extend(to_vec(&Value::Int(1)).unwrap()); // item 1
    bytes.extend(to_vec(&Value::Int(0)).unwrap()); // terminator
    let got = from_slice(&bytes, &Shape::Array(Box::new(Shape::Int))).unwrap();
    assert_eq!(got, Value::Array(vec![Value::Int(0), Value::Int(1)]));
  }

  #[test]
  fn decoder_accepts_negative_block_count() {
    // -2 items, byte-size hint (ignored), then 2 items, then terminator.
    let mut bytes = Vec::new();
    bytes.extend(to_vec(&Value::Int(-2)).unwrap());
    bytes.extend(to_vec(&Value::Int(7)).unwrap()); // byte-size hint, discarded
    bytes.extend(to_vec(&Value::Int(10)).unwrap());
    bytes.extend(to_vec(&Value::Int(20)).unwrap());
    bytes.extend(to_vec(&Value::Int(0)).unwrap());
    let got = from_slice(&bytes, &Shape::Array(Box::new(Shape::Int))).unwrap();
    assert_eq!(got, Value::Array(vec![Value::Int(10), Value::Int(20)]));
  }

  #[test]
  fn record_and_union_round_trip() {
    let shape = Shape::Record(vec![
      FieldShape::new("a", Shape::Int),
      FieldShape::transparent("skip", Shape::Int),
      FieldShape::new("u", Shape::Union(vec![Shape::Null, Shape::String])),
    ]);
    let value = Value::Record(vec![
      Field::new("a", Value::Int(5)),
      Field::transparent("skip", Value::Int(0)),
      Field::new("u", Value::Union(Box::new(Union::new(1, vec![Value::Null, Value::String("hi".into())])))),
    ]);
    let bytes = to_vec(&value).unwrap();
    let got = from_slice(&bytes, &shape).unwrap();
    // transparent field round-trips as Null on the decode side, since no
    // bytes were ever written for it -- that's the asymmetric contract.
    let Value::Record(fields) = got else { panic!("expected record") };
    assert_eq!(fields[0].value, Value::Int(5));
    assert_eq!(
      fields[2].value,
      Value::Union(Box::new(Union::new(1, vec![Value::Null, Value::String("hi".into())])))
    );
  }

  #[test]
  fn union_index_out_of_range_fails() {
    let bytes = to_vec(&Value::Int(5)).unwrap(); // idx=5 as a bare long
    let err = from_slice(&bytes, &Shape::Union(vec![Shape::Null])).unwrap_err();
    assert!(matches!(err, DecodeError::UnionIndex { idx: 5, len: 1 }));
  }

  #[test]
  fn truncated_input_fails() {
    let err = from_slice(&[0x06, 0x66], &Shape::String).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated));
  }

  #[test]
  fn invalid_utf8_fails() {
    let mut bytes = to_vec(&Value::Bytes(vec![0xff, 0xfe])).unwrap();
    // Bytes and String share a wire form; reinterpret as a string.
    let err = from_slice(&mut bytes, &Shape::String).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidUtf8(_)));
  }
}
