//! The value universe the codec knows how to encode and decode, and the
//! [`Shape`] descriptors that tell the decoder what to build.

/// A decoded or to-be-encoded Avro value.
///
/// This is the tagged-sum side of the type-directed dispatch described in
/// the codec's design notes: a value always carries, or is paired with (via
/// [`Shape`] on decode), enough information to pick exactly one row of the
/// wire-format table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  /// Wire-compatible with `Int`: encoded/decoded through the same zig-zag
  /// signed path, then reinterpreted as unsigned. Values above `i64::MAX`
  /// do not round-trip losslessly — see the crate docs.
  Unsigned(u64),
  Float(f32),
  Double(f64),
  Bytes(Vec<u8>),
  String(String),
  /// A byte array of statically known length. The length is not on the
  /// wire; both sides must already agree on it via [`Shape::Fixed`].
  Fixed(Vec<u8>),
  Array(Vec<Value>),
  /// String-keyed associative array. Kept as an ordered `Vec` rather than a
  /// `HashMap` so that callers that want deterministic wire output (e.g.
  /// tests asserting literal bytes) control key order; decode preserves the
  /// order blocks were read in.
  Map(Vec<(String, Value)>),
  Record(Vec<Field>),
  Union(Box<Union>),
}

/// One field of a [`Value::Record`].
///
/// `transparent` fields are skipped on both encode and decode — the
/// caller's contract, not something the codec auto-detects (see the design
/// notes on why this replaces the source's field-visibility check).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
  pub name: String,
  pub value: Value,
  pub transparent: bool,
}

impl Field {
  pub fn new(name: impl Into<String>, value: Value) -> Self {
    Field { name: name.into(), value, transparent: false }
  }

  pub fn transparent(name: impl Into<String>, value: Value) -> Self {
    Field { name: name.into(), value, transparent: true }
  }
}

/// A discriminated choice: `idx` selects which of `branches` holds the live
/// value. Both sides must supply the same ordered branch list; it is never
/// negotiated on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
  pub idx: usize,
  pub branches: Vec<Value>,
}

impl Union {
  pub fn new(idx: usize, branches: Vec<Value>) -> Self { Union { idx, branches } }

  /// The currently-selected branch value, if `idx` is in range.
  pub fn selected(&self) -> Option<&Value> { self.branches.get(self.idx) }
}

/// A type-only descriptor mirroring [`Value`]'s shape, supplied by the
/// caller at decode time in place of the runtime reflection the source
/// relies on.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
  Null,
  Bool,
  Int,
  Unsigned,
  Float,
  Double,
  Bytes,
  String,
  /// Fixed-length byte array; the length is part of the shape, not the wire.
  Fixed(usize),
  Array(Box<Shape>),
  Map(Box<Shape>),
  Record(Vec<FieldShape>),
  Union(Vec<Shape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
  pub name: String,
  pub shape: Shape,
  pub transparent: bool,
}

impl FieldShape {
  pub fn new(name: impl Into<String>, shape: Shape) -> Self {
    FieldShape { name: name.into(), shape, transparent: false }
  }

  pub fn transparent(name: impl Into<String>, shape: Shape) -> Self {
    FieldShape { name: name.into(), shape, transparent: true }
  }
}
