//! Host-side values fed to and fetched from a session.

use bytes::{BufMut, Bytes, BytesMut};
use inferlink_engine::{ElementType, Error, MemoryLocation, element_count};

/// A typed, shaped host array with its backing bytes and the memory
/// space they live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTensor {
    pub element_type: ElementType,
    pub shape: Vec<i64>,
    /// Contiguous little-endian element bytes.
    pub data: Bytes,
    pub location: MemoryLocation,
}

macro_rules! typed_accessors {
    ($from:ident, $as:ident, $ty:ty, $elem:expr) => {
        pub fn $from(shape: Vec<i64>, data: &[$ty]) -> Result<Self, Error> {
            let count = element_count(&shape)?;
            if data.len() != count {
                return Err(Error::SizeMismatch(format!(
                    "got {} elements, shape {shape:?} needs {count}",
                    data.len()
                )));
            }
            let mut buf = BytesMut::with_capacity(data.len() * size_of::<$ty>());
            for v in data {
                buf.put_slice(&v.to_le_bytes());
            }
            Ok(Self {
                element_type: $elem,
                shape,
                data: buf.freeze(),
                location: MemoryLocation::Cpu,
            })
        }

        pub fn $as(&self) -> Result<Vec<$ty>, Error> {
            if self.element_type != $elem {
                return Err(Error::TypeMismatch(format!(
                    "expected {} tensor, got {}",
                    $elem, self.element_type
                )));
            }
            Ok(self
                .data
                .chunks_exact(size_of::<$ty>())
                .map(|b| <$ty>::from_le_bytes(b.try_into().unwrap()))
                .collect())
        }
    };
}

impl HostTensor {
    typed_accessors!(from_f32, as_f32, f32, ElementType::F32);
    typed_accessors!(from_f64, as_f64, f64, ElementType::F64);
    typed_accessors!(from_i8, as_i8, i8, ElementType::I8);
    typed_accessors!(from_i16, as_i16, i16, ElementType::I16);
    typed_accessors!(from_i32, as_i32, i32, ElementType::I32);
    typed_accessors!(from_i64, as_i64, i64, ElementType::I64);
    typed_accessors!(from_u8, as_u8, u8, ElementType::U8);
    typed_accessors!(from_u16, as_u16, u16, ElementType::U16);
    typed_accessors!(from_u32, as_u32, u32, ElementType::U32);
    typed_accessors!(from_u64, as_u64, u64, ElementType::U64);

    pub fn from_bool(shape: Vec<i64>, data: &[bool]) -> Result<Self, Error> {
        let count = element_count(&shape)?;
        if data.len() != count {
            return Err(Error::SizeMismatch(format!(
                "got {} elements, shape {shape:?} needs {count}",
                data.len()
            )));
        }
        let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
        Ok(Self {
            element_type: ElementType::Bool,
            shape,
            data: Bytes::from(bytes),
            location: MemoryLocation::Cpu,
        })
    }

    pub fn as_bool(&self) -> Result<Vec<bool>, Error> {
        if self.element_type != ElementType::Bool {
            return Err(Error::TypeMismatch(format!(
                "expected bool tensor, got {}",
                self.element_type
            )));
        }
        Ok(self.data.iter().map(|&b| b != 0).collect())
    }

    /// Wraps a buffer already resident in a device buffer space. The
    /// bytes are a handle into that space, owned by its allocator.
    pub fn from_device(
        element_type: ElementType,
        shape: Vec<i64>,
        data: Bytes,
        space: &str,
    ) -> Self {
        Self {
            element_type,
            shape,
            data,
            location: MemoryLocation::DeviceBuffer(space.to_string()),
        }
    }
}

/// A value crossing the host side of the session boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostValue {
    Tensor(HostTensor),
    /// Element-wise UTF-8 string tensor.
    Strings { shape: Vec<i64>, values: Vec<String> },
    Sequence(Vec<HostValue>),
    Map(Vec<(HostValue, HostValue)>),
}

impl HostValue {
    pub fn from_f32(shape: Vec<i64>, data: &[f32]) -> Result<Self, Error> {
        Ok(Self::Tensor(HostTensor::from_f32(shape, data)?))
    }

    pub fn as_f32(&self) -> Result<Vec<f32>, Error> {
        match self {
            Self::Tensor(t) => t.as_f32(),
            _ => Err(Error::TypeMismatch("expected f32 tensor".into())),
        }
    }

    /// The memory space this value lives in. Non-tensor values are
    /// always host-side.
    pub fn location(&self) -> MemoryLocation {
        match self {
            Self::Tensor(t) => t.location.clone(),
            _ => MemoryLocation::Cpu,
        }
    }
}

impl From<HostTensor> for HostValue {
    fn from(t: HostTensor) -> Self {
        Self::Tensor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_accessor_round_trip() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = HostTensor::from_f32(vec![2, 3], &data).unwrap();
        assert_eq!(t.shape, vec![2, 3]);
        assert_eq!(t.as_f32().unwrap(), data);
    }

    #[test]
    fn i64_width_preserved() {
        let data = vec![i64::MIN, -1, 0, i64::MAX];
        let t = HostTensor::from_i64(vec![4], &data).unwrap();
        assert_eq!(t.data.len(), 32);
        assert_eq!(t.as_i64().unwrap(), data);
    }

    #[test]
    fn count_mismatch_rejected() {
        assert!(matches!(
            HostTensor::from_f32(vec![2, 2], &[1.0, 2.0]),
            Err(Error::SizeMismatch(_))
        ));
    }

    #[test]
    fn accessor_type_mismatch() {
        let t = HostTensor::from_i32(vec![1], &[7]).unwrap();
        assert!(matches!(t.as_f32(), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn bool_round_trip() {
        let data = vec![true, false, true];
        let t = HostTensor::from_bool(vec![3], &data).unwrap();
        assert_eq!(t.as_bool().unwrap(), data);
    }
}
