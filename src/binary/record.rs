use super::{ByteReader, ByteWriter};
use crate::{Error, ErrorKind, Windows1252Encoding};
use std::{borrow::Cow, fmt};

/// One byte type tag that precedes every record value
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct TypeTag(pub u8);

impl TypeTag {
    pub const INT32: TypeTag = TypeTag::new(0x01);
    pub const INT64: TypeTag = TypeTag::new(0x02);
    pub const FLOAT32: TypeTag = TypeTag::new(0x03);
    pub const FLOAT64: TypeTag = TypeTag::new(0x04);
    pub const BOOLEAN: TypeTag = TypeTag::new(0x05);
    pub const UTF16_STRING: TypeTag = TypeTag::new(0x06);
    pub const BYTE_BLOB: TypeTag = TypeTag::new(0x07);

    #[inline]
    pub const fn new(x: u8) -> Self {
        TypeTag(x)
    }

    /// Tags at or above 0x80 are reserved for later format revisions and
    /// always carry a u32 byte count, so they can be skipped and preserved
    /// without understanding them
    #[inline]
    pub const fn is_extension(&self) -> bool {
        self.0 >= 0x80
    }
}

/// Raw record key as stored in the file (Windows-1252 bytes)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<u8>);

impl Key {
    /// Creates a key from text. Characters without a Windows-1252
    /// representation are replaced with `?`.
    pub fn new(name: &str) -> Self {
        match Windows1252Encoding::encode(name) {
            Some(x) => Key(x.into_owned()),
            None => Key(name
                .chars()
                .map(|c| crate::data::windows_1252_byte(c).unwrap_or(b'?'))
                .collect()),
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Key(data)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_utf8(&self) -> Cow<str> {
        Windows1252Encoding::decode(&self.0)
    }

    /// Compare against an ascii key name without allocating
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name.as_bytes()
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::new(name)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Key({:?})", self.to_utf8())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_utf8())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_utf8())
    }
}

/// UTF-16 text kept as its raw code units so unpaired surrogates survive a
/// round trip
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct WideString(Vec<u16>);

impl WideString {
    pub fn new(text: &str) -> Self {
        WideString(text.encode_utf16().collect())
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        WideString(units)
    }

    #[inline]
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }

    /// Compare against text without allocating
    pub fn eq_str(&self, text: &str) -> bool {
        self.0.iter().copied().eq(text.encode_utf16())
    }
}

impl From<&str> for WideString {
    fn from(text: &str) -> Self {
        WideString::new(text)
    }
}

impl fmt::Debug for WideString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for WideString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for WideString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// A decoded record value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    String(WideString),
    Bytes(Vec<u8>),

    /// A value under an extension tag, carried through untouched
    Extension { tag: TypeTag, data: Vec<u8> },
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Int32(_) => TypeTag::INT32,
            Value::Int64(_) => TypeTag::INT64,
            Value::Float32(_) => TypeTag::FLOAT32,
            Value::Float64(_) => TypeTag::FLOAT64,
            Value::Boolean(_) => TypeTag::BOOLEAN,
            Value::String(_) => TypeTag::UTF16_STRING,
            Value::Bytes(_) => TypeTag::BYTE_BLOB,
            Value::Extension { tag, .. } => *tag,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_wide(&self) -> Option<&WideString> {
        match self {
            Value::String(x) => Some(x),
            _ => None,
        }
    }

    /// Number of bytes the value occupies after its type tag
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Int32(_) | Value::Float32(_) => 4,
            Value::Int64(_) | Value::Float64(_) => 8,
            Value::Boolean(_) => 1,
            Value::String(x) => 4 + x.units().len() * 2,
            Value::Bytes(x) => 4 + x.len(),
            Value::Extension { data, .. } => 4 + data.len(),
        }
    }
}

/// A single typed key/value pair
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Record {
    pub key: Key,
    pub value: Value,
}

impl Record {
    pub fn new(key: impl Into<Key>, value: Value) -> Self {
        Record {
            key: key.into(),
            value,
        }
    }

    /// Number of bytes the record occupies in the file
    pub fn encoded_len(&self) -> usize {
        4 + self.key.as_bytes().len() + 1 + self.value.encoded_len()
    }
}

/// Decode a record at the reader's position: key, type tag, then value
pub(crate) fn read_record(reader: &mut ByteReader) -> Result<Record, Error> {
    let key = Key::from_bytes(reader.read_prefixed_bytes()?.to_vec());
    let tag_offset = reader.position();
    let tag = TypeTag::new(reader.read_u8()?);
    let value = read_value(reader, tag, tag_offset)?;
    Ok(Record { key, value })
}

fn read_value(reader: &mut ByteReader, tag: TypeTag, tag_offset: usize) -> Result<Value, Error> {
    match tag {
        TypeTag::INT32 => reader.read_i32().map(Value::Int32),
        TypeTag::INT64 => reader.read_i64().map(Value::Int64),
        TypeTag::FLOAT32 => reader.read_f32().map(Value::Float32),
        TypeTag::FLOAT64 => reader.read_f64().map(Value::Float64),
        TypeTag::BOOLEAN => {
            let offset = reader.position();
            match reader.read_u8()? {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                value => Err(Error::new(ErrorKind::InvalidBoolean { offset, value })),
            }
        }
        TypeTag::UTF16_STRING => reader
            .read_utf16()
            .map(|x| Value::String(WideString::from_units(x))),
        TypeTag::BYTE_BLOB => reader
            .read_prefixed_bytes()
            .map(|x| Value::Bytes(x.to_vec())),
        tag if tag.is_extension() => reader.read_prefixed_bytes().map(|x| Value::Extension {
            tag,
            data: x.to_vec(),
        }),
        TypeTag(tag) => Err(Error::new(ErrorKind::UnknownRecordType {
            offset: tag_offset,
            tag,
        })),
    }
}

/// Encode a record from its parts so callers with typed fields need not
/// allocate a `Record`
pub(crate) fn write_field(writer: &mut ByteWriter, key: &[u8], value: &Value) {
    writer.write_prefixed_bytes(key);
    writer.write_u8(value.tag().0);
    match value {
        Value::Int32(x) => writer.write_i32(*x),
        Value::Int64(x) => writer.write_i64(*x),
        Value::Float32(x) => writer.write_f32(*x),
        Value::Float64(x) => writer.write_f64(*x),
        Value::Boolean(x) => writer.write_bool(*x),
        Value::String(x) => writer.write_utf16(x.units()),
        Value::Bytes(x) => writer.write_prefixed_bytes(x),
        Value::Extension { data, .. } => writer.write_prefixed_bytes(data),
    }
}

pub(crate) fn write_record(writer: &mut ByteWriter, record: &Record) {
    write_field(writer, record.key.as_bytes(), &record.value)
}
