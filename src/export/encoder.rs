//! Append-only buffer/view/accessor encoding.
//!
//! Every numeric block the assembler emits goes through [`StreamEncoder`]:
//! one push appends one buffer (bytes embedded as a base64 data URI), one
//! view bound to it, and one accessor bound to the view, and returns the
//! accessor's index. Indices are assigned at append time and never
//! recomputed, so higher-level records can store them as they go.

use base64::{prelude::BASE64_STANDARD, Engine as _};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;

use crate::error::{ConvertError, Result};

/// Element shape of an encoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
}

impl ElementShape {
    /// Components per element.
    pub fn component_count(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
        }
    }

    fn accessor_type(self) -> json::accessor::Type {
        match self {
            ElementShape::Scalar => json::accessor::Type::Scalar,
            ElementShape::Vec2 => json::accessor::Type::Vec2,
            ElementShape::Vec3 => json::accessor::Type::Vec3,
        }
    }
}

/// Append-only encoder for one conversion's binary blocks.
///
/// An instance must not be reused across unrelated conversions: indices
/// are only unique for the lifetime of one encoding session.
#[derive(Debug, Default)]
pub struct StreamEncoder {
    buffers: Vec<json::Buffer>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl StreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accessors appended so far.
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    /// Append a block of 32-bit floats; returns the new accessor index.
    ///
    /// With `minmax`, per-component bounds are computed column-wise and
    /// stored on the accessor.
    pub fn push_f32(
        &mut self,
        values: &[f32],
        shape: ElementShape,
        target: Option<json::buffer::Target>,
        minmax: bool,
    ) -> Result<u32> {
        let components = check_shape(values.len(), shape)?;
        let bounds = (minmax && !values.is_empty()).then(|| {
            let (min, max) = f32_bounds(values, components);
            (json::Value::from(min), json::Value::from(max))
        });
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(self.push_block(
            bytes,
            values.len() / components,
            json::accessor::ComponentType::F32,
            shape,
            target,
            bounds,
        ))
    }

    /// Append a block of unsigned 32-bit integers; returns the new
    /// accessor index.
    pub fn push_u32(
        &mut self,
        values: &[u32],
        shape: ElementShape,
        target: Option<json::buffer::Target>,
        minmax: bool,
    ) -> Result<u32> {
        let components = check_shape(values.len(), shape)?;
        let bounds = (minmax && !values.is_empty()).then(|| {
            let (min, max) = u32_bounds(values, components);
            (json::Value::from(min), json::Value::from(max))
        });
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(self.push_block(
            bytes,
            values.len() / components,
            json::accessor::ComponentType::U32,
            shape,
            target,
            bounds,
        ))
    }

    fn push_block(
        &mut self,
        bytes: Vec<u8>,
        count: usize,
        component_type: json::accessor::ComponentType,
        shape: ElementShape,
        target: Option<json::buffer::Target>,
        bounds: Option<(json::Value, json::Value)>,
    ) -> u32 {
        let byte_length = USize64(bytes.len() as u64);

        let buffer_index = self.buffers.len() as u32;
        self.buffers.push(json::Buffer {
            byte_length,
            extensions: Default::default(),
            extras: Default::default(),
            uri: Some(binary_data_uri(&bytes)),
        });

        let view_index = self.views.len() as u32;
        self.views.push(json::buffer::View {
            buffer: json::Index::new(buffer_index),
            byte_length,
            byte_offset: None,
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            target: target.map(Valid),
        });

        let (min, max) = match bounds {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };

        let accessor_index = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(view_index)),
            byte_offset: Some(USize64(0)),
            count: USize64(count as u64),
            component_type: Valid(json::accessor::GenericComponentType(component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(shape.accessor_type()),
            min,
            max,
            normalized: false,
            sparse: None,
        });
        accessor_index
    }

    /// Consume the encoder, yielding the accumulated tables.
    pub fn into_parts(
        self,
    ) -> (
        Vec<json::Buffer>,
        Vec<json::buffer::View>,
        Vec<json::Accessor>,
    ) {
        (self.buffers, self.views, self.accessors)
    }
}

fn check_shape(len: usize, shape: ElementShape) -> Result<usize> {
    let components = shape.component_count();
    if len % components != 0 {
        return Err(ConvertError::Precondition(format!(
            "block of {len} values is not divisible by {components} components"
        )));
    }
    Ok(components)
}

fn f32_bounds(values: &[f32], components: usize) -> (Vec<f32>, Vec<f32>) {
    let mut min = vec![f32::MAX; components];
    let mut max = vec![f32::MIN; components];
    for element in values.chunks_exact(components) {
        for (column, &value) in element.iter().enumerate() {
            min[column] = min[column].min(value);
            max[column] = max[column].max(value);
        }
    }
    (min, max)
}

fn u32_bounds(values: &[u32], components: usize) -> (Vec<u32>, Vec<u32>) {
    let mut min = vec![u32::MAX; components];
    let mut max = vec![u32::MIN; components];
    for element in values.chunks_exact(components) {
        for (column, &value) in element.iter().enumerate() {
            min[column] = min[column].min(value);
            max[column] = max[column].max(value);
        }
    }
    (min, max)
}

/// Embed bytes as a self-describing data URI.
fn binary_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:application/octet-stream;base64,{}",
        BASE64_STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_monotonic() {
        let mut encoder = StreamEncoder::new();
        let a = encoder
            .push_f32(&[1.0, 2.0, 3.0], ElementShape::Vec3, None, true)
            .unwrap();
        let b = encoder
            .push_u32(&[0, 1, 2], ElementShape::Scalar, None, false)
            .unwrap();
        let c = encoder
            .push_f32(&[0.5, 0.5], ElementShape::Vec2, None, false)
            .unwrap();
        assert_eq!((a, b, c), (0, 1, 2));

        let (buffers, views, accessors) = encoder.into_parts();
        assert_eq!(buffers.len(), 3);
        assert_eq!(views.len(), 3);
        assert_eq!(accessors.len(), 3);
        // Each view binds the buffer appended alongside it.
        for (i, view) in views.iter().enumerate() {
            assert_eq!(view.buffer.value(), i);
        }
        for (i, accessor) in accessors.iter().enumerate() {
            assert_eq!(accessor.buffer_view.unwrap().value(), i);
        }
    }

    #[test]
    fn test_element_counts_follow_shape() {
        let mut encoder = StreamEncoder::new();
        encoder
            .push_f32(
                &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                ElementShape::Vec3,
                None,
                false,
            )
            .unwrap();
        encoder
            .push_f32(&[0.0, 0.0, 1.0, 1.0], ElementShape::Vec2, None, false)
            .unwrap();
        encoder
            .push_u32(&[0, 1, 2], ElementShape::Scalar, None, false)
            .unwrap();

        let (_, _, accessors) = encoder.into_parts();
        assert_eq!(accessors[0].count.0, 2);
        assert_eq!(accessors[1].count.0, 2);
        assert_eq!(accessors[2].count.0, 3);
    }

    #[test]
    fn test_column_wise_bounds() {
        let mut encoder = StreamEncoder::new();
        encoder
            .push_f32(
                &[0.0, 5.0, -1.0, 3.0, -2.0, 4.0],
                ElementShape::Vec3,
                None,
                true,
            )
            .unwrap();

        let (_, _, accessors) = encoder.into_parts();
        let min = accessors[0].min.as_ref().unwrap();
        let max = accessors[0].max.as_ref().unwrap();
        assert_eq!(min, &json::Value::from(vec![0.0f32, -2.0, -1.0]));
        assert_eq!(max, &json::Value::from(vec![3.0f32, 5.0, 4.0]));
    }

    #[test]
    fn test_scalar_bounds_single_pair() {
        let mut encoder = StreamEncoder::new();
        encoder
            .push_f32(&[0.0, 0.5, 1.2], ElementShape::Scalar, None, true)
            .unwrap();

        let (_, _, accessors) = encoder.into_parts();
        assert_eq!(
            accessors[0].min.as_ref().unwrap(),
            &json::Value::from(vec![0.0f32])
        );
        assert_eq!(
            accessors[0].max.as_ref().unwrap(),
            &json::Value::from(vec![1.2f32])
        );
    }

    #[test]
    fn test_bytes_are_little_endian_base64() {
        let mut encoder = StreamEncoder::new();
        encoder
            .push_u32(&[1], ElementShape::Scalar, None, false)
            .unwrap();

        let (buffers, _, _) = encoder.into_parts();
        let uri = buffers[0].uri.as_ref().unwrap();
        let payload = uri
            .strip_prefix("data:application/octet-stream;base64,")
            .unwrap();
        let bytes = BASE64_STANDARD.decode(payload).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0]);
        assert_eq!(buffers[0].byte_length.0, 4);
    }

    #[test]
    fn test_shape_mismatch_aborts() {
        let mut encoder = StreamEncoder::new();
        let err = encoder
            .push_f32(&[1.0, 2.0], ElementShape::Vec3, None, false)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Precondition(_)));
    }

    #[test]
    fn test_view_targets() {
        let mut encoder = StreamEncoder::new();
        encoder
            .push_u32(
                &[0],
                ElementShape::Scalar,
                Some(json::buffer::Target::ElementArrayBuffer),
                false,
            )
            .unwrap();
        encoder
            .push_f32(
                &[0.0, 0.0, 0.0],
                ElementShape::Vec3,
                Some(json::buffer::Target::ArrayBuffer),
                false,
            )
            .unwrap();
        encoder
            .push_f32(&[0.0], ElementShape::Scalar, None, false)
            .unwrap();

        let (_, views, _) = encoder.into_parts();
        assert_eq!(
            views[0].target,
            Some(Valid(json::buffer::Target::ElementArrayBuffer))
        );
        assert_eq!(views[1].target, Some(Valid(json::buffer::Target::ArrayBuffer)));
        assert_eq!(views[2].target, None);
    }
}
