//! Typed result buffers retrieved from the Graph Engine

use std::fmt;

use bytemuck::{Pod, Zeroable};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Point position as laid out by the backend (12 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Per-point field selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// `Vec3f`
    Xyz,
    /// `f32`, meters
    Distance,
    /// `i32`
    RingId,
    /// `f64`, milliseconds since scan start
    TimeStamp,
    /// `i32`, 1 for hits
    IsHit,
}

impl Field {
    /// Element size in bytes
    pub fn element_size(&self) -> usize {
        match self {
            Field::Xyz => std::mem::size_of::<Vec3f>(),
            Field::Distance => std::mem::size_of::<f32>(),
            Field::RingId | Field::IsHit => std::mem::size_of::<i32>(),
            Field::TimeStamp => std::mem::size_of::<f64>(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Raw field buffer
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBuffer {
    pub field: Field,
    pub count: usize,
    pub data: Bytes,
}

impl ResultBuffer {
    /// Wrap raw bytes, checking that the length fits the field layout
    pub fn new(field: Field, data: Bytes) -> Result<Self, ContractError> {
        let size = field.element_size();
        if data.len() % size != 0 {
            return Err(ContractError::ResultLayout {
                field: field.to_string(),
                message: format!("{} bytes is not a multiple of {}", data.len(), size),
            });
        }
        Ok(Self {
            field,
            count: data.len() / size,
            data,
        })
    }

    /// Encode a typed slice
    pub fn from_slice<T: Pod>(field: Field, values: &[T]) -> Self {
        let data = Bytes::copy_from_slice(bytemuck::cast_slice(values));
        Self {
            field,
            count: values.len(),
            data,
        }
    }

    /// Decode into typed elements
    ///
    /// Copies, since `Bytes` gives no alignment guarantee.
    pub fn decode<T: Pod>(&self) -> Result<Vec<T>, ContractError> {
        if std::mem::size_of::<T>() != self.field.element_size() {
            return Err(ContractError::ResultLayout {
                field: self.field.to_string(),
                message: format!(
                    "element size {} does not match requested type size {}",
                    self.field.element_size(),
                    std::mem::size_of::<T>()
                ),
            });
        }
        Ok(bytemuck::pod_collect_to_vec::<u8, T>(&self.data))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_decode() {
        let points = [Vec3f::new(1.0, 2.0, 3.0), Vec3f::new(-1.0, 0.5, 9.0)];
        let buffer = ResultBuffer::from_slice(Field::Xyz, &points);
        assert_eq!(buffer.count, 2);
        assert_eq!(buffer.data.len(), 24);

        let decoded: Vec<Vec3f> = buffer.decode().unwrap();
        assert_eq!(decoded, points);
    }

    #[test]
    fn test_time_stamps_decode_from_unaligned_bytes() {
        let mut raw = vec![0u8];
        raw.extend_from_slice(bytemuck::cast_slice(&[1.5f64, 2.5]));
        let bytes = Bytes::from(raw).slice(1..);

        let buffer = ResultBuffer::new(Field::TimeStamp, bytes).unwrap();
        let decoded: Vec<f64> = buffer.decode().unwrap();
        assert_eq!(decoded, vec![1.5, 2.5]);
    }

    #[test]
    fn test_length_mismatch() {
        let result = ResultBuffer::new(Field::Distance, Bytes::from_static(&[0, 1, 2]));
        assert!(matches!(result, Err(ContractError::ResultLayout { .. })));
    }

    #[test]
    fn test_type_mismatch() {
        let buffer = ResultBuffer::from_slice(Field::RingId, &[1i32, 2, 3]);
        assert!(buffer.decode::<f64>().is_err());
        assert_eq!(buffer.decode::<i32>().unwrap(), vec![1, 2, 3]);
    }
}
