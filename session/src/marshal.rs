//! Bidirectional conversion between host values and native tensor
//! values crossing the CPU/device memory boundary.

use inferlink_engine::{
    ElementType, Error, MemoryLocation, NativeValue, Ownership, TensorValue, ValueKind,
    element_count,
};

use crate::host::{HostTensor, HostValue};

/// Converts a host value into a native value for the given target
/// memory space.
///
/// CPU targets alias the host buffer directly (zero-copy); device
/// targets require the value to already reference a buffer in that
/// space — this layer never copies host memory to a device.
pub fn to_native(
    value: &HostValue,
    declared: Option<&ValueKind>,
    target: &MemoryLocation,
) -> Result<NativeValue, Error> {
    match value {
        HostValue::Tensor(t) => Ok(NativeValue::Tensor(tensor_to_native(t, declared, target)?)),
        HostValue::Strings { shape, values } => {
            if let Some(ValueKind::Tensor { element_type, .. }) = declared {
                if *element_type != ElementType::Str {
                    return Err(Error::TypeMismatch(format!(
                        "got str tensor, declared {element_type}"
                    )));
                }
            }
            if !target.is_default() {
                return Err(Error::TypeMismatch(
                    "string tensors cannot target a device buffer space".into(),
                ));
            }
            Ok(NativeValue::Tensor(TensorValue::from_strings(
                shape.clone(),
                values,
                Ownership::Session,
            )?))
        }
        HostValue::Sequence(items) => {
            if matches!(declared, Some(ValueKind::Tensor { .. }) | Some(ValueKind::Map)) {
                return Err(Error::TypeMismatch("got sequence, declared otherwise".into()));
            }
            let items = items
                .iter()
                .map(|v| to_native(v, None, &MemoryLocation::Cpu))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(NativeValue::Sequence(items))
        }
        HostValue::Map(entries) => {
            if matches!(declared, Some(ValueKind::Tensor { .. }) | Some(ValueKind::Sequence)) {
                return Err(Error::TypeMismatch("got map, declared otherwise".into()));
            }
            let entries = entries
                .iter()
                .map(|(k, v)| {
                    Ok((
                        to_native(k, None, &MemoryLocation::Cpu)?,
                        to_native(v, None, &MemoryLocation::Cpu)?,
                    ))
                })
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(NativeValue::Map(entries))
        }
    }
}

fn tensor_to_native(
    tensor: &HostTensor,
    declared: Option<&ValueKind>,
    target: &MemoryLocation,
) -> Result<TensorValue, Error> {
    match declared {
        Some(ValueKind::Tensor { element_type, .. }) => {
            if *element_type != tensor.element_type {
                return Err(Error::TypeMismatch(format!(
                    "got {} tensor, declared {element_type}",
                    tensor.element_type
                )));
            }
        }
        Some(ValueKind::Sequence) | Some(ValueKind::Map) => {
            return Err(Error::TypeMismatch("got tensor, declared non-tensor".into()));
        }
        None => {}
    }

    let count = element_count(&tensor.shape)?;
    if let Some(width) = tensor.element_type.byte_size() {
        let expected = count * width;
        if tensor.data.len() != expected {
            return Err(Error::SizeMismatch(format!(
                "buffer is {} bytes, shape {:?} of {} needs {expected}",
                tensor.data.len(),
                tensor.shape,
                tensor.element_type
            )));
        }
    }

    let ownership = match target {
        MemoryLocation::Cpu => {
            if !tensor.location.is_default() {
                return Err(Error::TypeMismatch(format!(
                    "value lives in {}, conversion targets cpu",
                    tensor.location
                )));
            }
            Ownership::Caller
        }
        MemoryLocation::DeviceBuffer(space) => {
            if tensor.location != MemoryLocation::DeviceBuffer(space.clone()) {
                return Err(Error::TypeMismatch(format!(
                    "value lives in {}, conversion targets {space}; host-to-device copies are not implicit",
                    tensor.location
                )));
            }
            Ownership::DevicePool
        }
    };

    // Bytes clone is a refcount bump; the host buffer is aliased, not
    // copied.
    Ok(TensorValue {
        element_type: tensor.element_type,
        shape: tensor.shape.clone(),
        data: tensor.data.clone(),
        location: tensor.location.clone(),
        ownership,
    })
}

/// Converts a native value back to a host value, transferring buffer
/// ownership to the result. Non-tensor values convert structurally,
/// element-wise.
pub fn to_host(value: NativeValue) -> Result<HostValue, Error> {
    match value {
        NativeValue::Tensor(t) => {
            if t.element_type == ElementType::Str {
                let values = t.strings()?;
                Ok(HostValue::Strings {
                    shape: t.shape,
                    values,
                })
            } else {
                t.validate()?;
                Ok(HostValue::Tensor(HostTensor {
                    element_type: t.element_type,
                    shape: t.shape,
                    data: t.data,
                    location: t.location,
                }))
            }
        }
        NativeValue::Sequence(items) => Ok(HostValue::Sequence(
            items.into_iter().map(to_host).collect::<Result<_, _>>()?,
        )),
        NativeValue::Map(entries) => Ok(HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((to_host(k)?, to_host(v)?)))
                .collect::<Result<_, Error>>()?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferlink_engine::Dim;

    fn f32_kind() -> ValueKind {
        ValueKind::Tensor {
            element_type: ElementType::F32,
            shape: vec![Dim::Size(2), Dim::Size(2)],
        }
    }

    #[test]
    fn cpu_round_trip_preserves_everything() {
        let host = HostValue::from_f32(vec![2, 2], &[1.0, -2.5, 3.25, 0.0]).unwrap();
        let native = to_native(&host, Some(&f32_kind()), &MemoryLocation::Cpu).unwrap();
        let back = to_host(native).unwrap();
        assert_eq!(back, host);
    }

    #[test]
    fn cpu_conversion_aliases_buffer() {
        let host = HostTensor::from_f32(vec![3], &[1.0, 2.0, 3.0]).unwrap();
        let native = to_native(&HostValue::Tensor(host.clone()), None, &MemoryLocation::Cpu).unwrap();
        let NativeValue::Tensor(t) = native else {
            panic!("expected tensor")
        };
        assert_eq!(t.ownership, Ownership::Caller);
        // Same allocation, not a copy.
        assert_eq!(t.data.as_ptr(), host.data.as_ptr());
    }

    #[test]
    fn declared_type_mismatch() {
        let host = HostValue::Tensor(HostTensor::from_i32(vec![4], &[1, 2, 3, 4]).unwrap());
        assert!(matches!(
            to_native(&host, Some(&f32_kind()), &MemoryLocation::Cpu),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn device_target_requires_device_value() {
        let host = HostValue::from_f32(vec![2], &[1.0, 2.0]).unwrap();
        let target = MemoryLocation::DeviceBuffer("gpu-buffer".to_string());
        assert!(matches!(
            to_native(&host, None, &target),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn device_value_passes_through_for_its_space() {
        let host = HostValue::Tensor(HostTensor::from_device(
            ElementType::F32,
            vec![2],
            bytes::Bytes::from_static(&[0, 0, 128, 63, 0, 0, 0, 64]),
            "gpu-buffer",
        ));
        let target = MemoryLocation::DeviceBuffer("gpu-buffer".to_string());
        let NativeValue::Tensor(t) = to_native(&host, None, &target).unwrap() else {
            panic!("expected tensor")
        };
        assert_eq!(t.ownership, Ownership::DevicePool);
        assert_eq!(t.location, target);
    }

    #[test]
    fn string_round_trip() {
        let host = HostValue::Strings {
            shape: vec![2],
            values: vec!["alpha".to_string(), "β".to_string()],
        };
        let native = to_native(&host, None, &MemoryLocation::Cpu).unwrap();
        assert_eq!(to_host(native).unwrap(), host);
    }

    #[test]
    fn sequence_converts_element_wise() {
        let host = HostValue::Sequence(vec![
            HostValue::from_f32(vec![1], &[1.0]).unwrap(),
            HostValue::from_f32(vec![1], &[2.0]).unwrap(),
        ]);
        let back = to_host(to_native(&host, None, &MemoryLocation::Cpu).unwrap()).unwrap();
        assert_eq!(back, host);
    }

    #[test]
    fn size_mismatch_detected() {
        let bad = HostValue::Tensor(HostTensor {
            element_type: ElementType::F32,
            shape: vec![4],
            data: bytes::Bytes::from_static(&[0u8; 8]),
            location: MemoryLocation::Cpu,
        });
        assert!(matches!(
            to_native(&bad, None, &MemoryLocation::Cpu),
            Err(Error::SizeMismatch(_))
        ));
    }
}
