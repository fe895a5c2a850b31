//! Tensor value model shared between the session layer and engines.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Element type of a tensor. Conversions between host and native values
/// preserve width and signedness exactly; there is no implicit narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    /// Element-wise UTF-8 strings, length-prefixed in the native buffer.
    Str,
}

impl ElementType {
    /// Size of one element in bytes. Strings are variable-length and have
    /// no fixed element size.
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 | Self::Bool => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::F32 | Self::I32 | Self::U32 => Some(4),
            Self::F64 | Self::I64 | Self::U64 => Some(8),
            Self::Str => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bool => "bool",
            Self::Str => "str",
        };
        f.write_str(s)
    }
}

/// One axis of a declared tensor shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    /// Concrete, non-negative extent.
    Size(i64),
    /// Named placeholder resolved only at run time (e.g. "batch").
    Symbolic(String),
}

/// Declared kind of a model input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Tensor {
        element_type: ElementType,
        shape: Vec<Dim>,
    },
    /// Opaque sequence type; carries no shape.
    Sequence,
    /// Opaque map type; carries no shape.
    Map,
}

/// Schema entry for one model input or output. Names are unique within
/// their list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoDesc {
    pub name: String,
    pub kind: ValueKind,
}

impl IoDesc {
    pub fn is_tensor(&self) -> bool {
        matches!(self.kind, ValueKind::Tensor { .. })
    }
}

/// Memory space a tensor buffer lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryLocation {
    /// Default host memory.
    Cpu,
    /// Named device buffer space (e.g. "gpu-buffer").
    DeviceBuffer(String),
}

impl MemoryLocation {
    /// Parses a location token: `"cpu"` is host memory, anything else
    /// names a device buffer space.
    pub fn parse(token: &str) -> Self {
        if token == "cpu" {
            Self::Cpu
        } else {
            Self::DeviceBuffer(token.to_string())
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Cpu)
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::DeviceBuffer(space) => f.write_str(space),
        }
    }
}

/// Who releases the buffer behind a [`TensorValue`]. A buffer is freed
/// only by its owner; the session never releases caller or device-pool
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Caller,
    Session,
    DevicePool,
}

/// A typed, shaped, contiguous native tensor value.
///
/// Numeric buffers are little-endian element bytes; string tensors hold
/// each element as a u32-LE length prefix followed by UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorValue {
    pub element_type: ElementType,
    pub shape: Vec<i64>,
    pub data: Bytes,
    pub location: MemoryLocation,
    pub ownership: Ownership,
}

/// Returns the element count for a shape, rejecting negative or
/// overflowing dimensions.
pub fn element_count(shape: &[i64]) -> Result<usize, Error> {
    let mut count: usize = 1;
    for &d in shape {
        if d < 0 {
            return Err(Error::UnsupportedShape(format!(
                "negative dimension {d} in {shape:?}"
            )));
        }
        count = count
            .checked_mul(d as usize)
            .ok_or_else(|| Error::UnsupportedShape(format!("shape {shape:?} overflows")))?;
    }
    Ok(count)
}

impl TensorValue {
    /// Encodes UTF-8 strings into the length-prefixed native form.
    pub fn from_strings(
        shape: Vec<i64>,
        values: &[String],
        ownership: Ownership,
    ) -> Result<Self, Error> {
        let count = element_count(&shape)?;
        if values.len() != count {
            return Err(Error::SizeMismatch(format!(
                "got {} strings, shape {shape:?} needs {count}",
                values.len()
            )));
        }
        let mut buf = BytesMut::new();
        for v in values {
            buf.put_u32_le(v.len() as u32);
            buf.put_slice(v.as_bytes());
        }
        Ok(Self {
            element_type: ElementType::Str,
            shape,
            data: buf.freeze(),
            location: MemoryLocation::Cpu,
            ownership,
        })
    }

    /// Decodes the length-prefixed native form back into strings.
    pub fn strings(&self) -> Result<Vec<String>, Error> {
        if self.element_type != ElementType::Str {
            return Err(Error::TypeMismatch(format!(
                "expected str tensor, got {}",
                self.element_type
            )));
        }
        let count = element_count(&self.shape)?;
        let mut out = Vec::with_capacity(count);
        let mut rest: &[u8] = &self.data;
        for _ in 0..count {
            if rest.len() < 4 {
                return Err(Error::SizeMismatch("truncated string tensor".into()));
            }
            let len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
            rest = &rest[4..];
            if rest.len() < len {
                return Err(Error::SizeMismatch("truncated string tensor".into()));
            }
            let s = std::str::from_utf8(&rest[..len])
                .map_err(|e| Error::TypeMismatch(format!("invalid utf-8 in string tensor: {e}")))?;
            out.push(s.to_string());
            rest = &rest[len..];
        }
        Ok(out)
    }

    /// Checks that the buffer length matches the shape and element type.
    /// Strings are variable-length and skip the check.
    pub fn validate(&self) -> Result<(), Error> {
        let count = element_count(&self.shape)?;
        if let Some(width) = self.element_type.byte_size() {
            let expected = count * width;
            if self.data.len() != expected {
                return Err(Error::SizeMismatch(format!(
                    "buffer is {} bytes, shape {:?} of {} needs {expected}",
                    self.data.len(),
                    self.shape,
                    self.element_type
                )));
            }
        }
        Ok(())
    }
}

/// A native value crossing the engine boundary. Non-tensor results
/// (sequences, maps) convert structurally, element-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Tensor(TensorValue),
    Sequence(Vec<NativeValue>),
    Map(Vec<(NativeValue, NativeValue)>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_rejects_negative() {
        assert!(element_count(&[1, -1, 3]).is_err());
        assert_eq!(element_count(&[2, 3]).unwrap(), 6);
        assert_eq!(element_count(&[]).unwrap(), 1);
    }

    #[test]
    fn string_tensor_round_trip() {
        let values = vec!["a".to_string(), "".to_string(), "héllo".to_string()];
        let t = TensorValue::from_strings(vec![3], &values, Ownership::Session).unwrap();
        assert_eq!(t.strings().unwrap(), values);
    }

    #[test]
    fn string_tensor_count_mismatch() {
        let values = vec!["a".to_string()];
        assert!(matches!(
            TensorValue::from_strings(vec![2], &values, Ownership::Session),
            Err(Error::SizeMismatch(_))
        ));
    }

    #[test]
    fn location_token_parse() {
        assert_eq!(MemoryLocation::parse("cpu"), MemoryLocation::Cpu);
        assert_eq!(
            MemoryLocation::parse("gpu-buffer"),
            MemoryLocation::DeviceBuffer("gpu-buffer".to_string())
        );
    }
}
