// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vertex scalar types, attribute descriptions, and the declaration layout
//! builder.

use crate::error::ResourceError;

/// The maximum number of streams a single vertex declaration may hold.
pub const MAX_VERTEX_STREAM_COUNT: usize = 8;

/// The scalar type of one component of a vertex attribute or of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 8-bit integer.
    Byte,
    /// Unsigned 8-bit integer.
    UnsignedByte,
    /// Signed 16-bit integer.
    Short,
    /// Unsigned 16-bit integer.
    UnsignedShort,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UnsignedInt,
    /// 32-bit IEEE float.
    Float,
}

impl DataType {
    /// The size of one scalar of this type, in bytes.
    pub const fn byte_size(&self) -> u32 {
        match self {
            DataType::Byte | DataType::UnsignedByte => 1,
            DataType::Short | DataType::UnsignedShort => 2,
            DataType::Int | DataType::UnsignedInt | DataType::Float => 4,
        }
    }
}

/// The semantic meaning of a vertex attribute.
///
/// Semantics are opaque to the device layer; they exist so higher-level
/// systems can match declaration streams against program inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexUsage {
    /// Object-space position.
    Position,
    /// Surface normal.
    Normal,
    /// Vertex color.
    Color,
    /// Texture coordinate set.
    TexCoord,
    /// Tangent vector.
    Tangent,
    /// Binormal vector.
    Binormal,
    /// Skinning blend weights.
    BlendWeight,
    /// Skinning blend indices.
    BlendIndices,
}

/// One attribute of an interleaved vertex layout, as supplied by the caller.
///
/// Byte offsets and the total stride are *not* part of this record; they are
/// derived by [`VertexDeclaration::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexElement {
    /// The number of scalar components (e.g. 3 for a position).
    pub size: u32,
    /// The semantic usage of the attribute.
    pub usage: VertexUsage,
    /// Distinguishes multiple attributes with the same usage (e.g. several
    /// texture coordinate sets).
    pub usage_index: u32,
    /// The scalar type of each component.
    pub data_type: DataType,
}

/// One attribute's placement within a computed vertex declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexStream {
    /// The attribute slot this stream activates.
    pub index: u32,
    /// The number of scalar components.
    pub size: u32,
    /// The semantic usage of the attribute.
    pub usage: VertexUsage,
    /// Distinguishes multiple attributes with the same usage.
    pub usage_index: u32,
    /// The scalar type of each component.
    pub data_type: DataType,
    /// The byte offset of this attribute from the start of a vertex.
    pub offset: u32,
}

/// An interleaved attribute layout describing how to interpret a vertex
/// buffer's bytes.
///
/// Offsets and stride are derived once at construction and are immutable
/// thereafter. A declaration holds no reference to any particular buffer; it
/// is reusable across every buffer that shares the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexDeclaration {
    streams: Vec<VertexStream>,
    stride: u32,
}

impl VertexDeclaration {
    /// Computes the interleaved layout for an ordered list of elements.
    ///
    /// `offset[i]` is the running sum of the byte sizes of the preceding
    /// elements, and the stride is the total byte size of one vertex — no
    /// gaps, no padding.
    ///
    /// # Errors
    ///
    /// [`ResourceError::StreamCapacityExceeded`] if more than
    /// [`MAX_VERTEX_STREAM_COUNT`] elements are supplied.
    pub fn new(elements: &[VertexElement]) -> Result<Self, ResourceError> {
        if elements.len() > MAX_VERTEX_STREAM_COUNT {
            return Err(ResourceError::StreamCapacityExceeded {
                requested: elements.len(),
                capacity: MAX_VERTEX_STREAM_COUNT,
            });
        }

        let mut streams = Vec::with_capacity(elements.len());
        let mut stride = 0u32;
        for (i, element) in elements.iter().enumerate() {
            streams.push(VertexStream {
                index: i as u32,
                size: element.size,
                usage: element.usage,
                usage_index: element.usage_index,
                data_type: element.data_type,
                offset: stride,
            });
            stride += element.size * element.data_type.byte_size();
        }

        Ok(Self { streams, stride })
    }

    /// The streams of this declaration, in declaration order.
    pub fn streams(&self) -> &[VertexStream] {
        &self.streams
    }

    /// The number of streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// The byte size of one interleaved vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

/// An opaque handle to a device-registered [`VertexDeclaration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexDeclarationId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    fn float_element(size: u32, usage: VertexUsage, usage_index: u32) -> VertexElement {
        VertexElement {
            size,
            usage,
            usage_index,
            data_type: DataType::Float,
        }
    }

    #[test]
    fn scalar_byte_sizes() {
        assert_eq!(DataType::Byte.byte_size(), 1);
        assert_eq!(DataType::UnsignedByte.byte_size(), 1);
        assert_eq!(DataType::Short.byte_size(), 2);
        assert_eq!(DataType::UnsignedShort.byte_size(), 2);
        assert_eq!(DataType::Int.byte_size(), 4);
        assert_eq!(DataType::UnsignedInt.byte_size(), 4);
        assert_eq!(DataType::Float.byte_size(), 4);
    }

    #[test]
    fn position_normal_uv_layout() {
        let declaration = VertexDeclaration::new(&[
            float_element(3, VertexUsage::Position, 0),
            float_element(3, VertexUsage::Normal, 0),
            float_element(2, VertexUsage::TexCoord, 0),
        ])
        .unwrap();

        assert_eq!(declaration.stride(), 32);
        let offsets: Vec<u32> = declaration.streams().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let indices: Vec<u32> = declaration.streams().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn mixed_scalar_types_accumulate_correctly() {
        let declaration = VertexDeclaration::new(&[
            float_element(3, VertexUsage::Position, 0),
            VertexElement {
                size: 4,
                usage: VertexUsage::Color,
                usage_index: 0,
                data_type: DataType::UnsignedByte,
            },
            VertexElement {
                size: 2,
                usage: VertexUsage::TexCoord,
                usage_index: 0,
                data_type: DataType::Short,
            },
        ])
        .unwrap();

        // 12 bytes of position, 4 bytes of color, 4 bytes of texcoord.
        assert_eq!(declaration.stride(), 20);
        let offsets: Vec<u32> = declaration.streams().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 12, 16]);
    }

    #[test]
    fn empty_declaration_has_zero_stride() {
        let declaration = VertexDeclaration::new(&[]).unwrap();
        assert_eq!(declaration.stream_count(), 0);
        assert_eq!(declaration.stride(), 0);
    }

    #[test]
    fn over_capacity_is_rejected() {
        let elements = vec![float_element(1, VertexUsage::TexCoord, 0); MAX_VERTEX_STREAM_COUNT + 1];
        let err = VertexDeclaration::new(&elements).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::StreamCapacityExceeded {
                requested: 9,
                capacity: MAX_VERTEX_STREAM_COUNT,
            }
        ));
    }

    #[test]
    fn at_capacity_is_accepted() {
        let elements = vec![float_element(1, VertexUsage::TexCoord, 0); MAX_VERTEX_STREAM_COUNT];
        let declaration = VertexDeclaration::new(&elements).unwrap();
        assert_eq!(declaration.stream_count(), MAX_VERTEX_STREAM_COUNT);
        assert_eq!(declaration.stride(), 4 * MAX_VERTEX_STREAM_COUNT as u32);
    }
}
