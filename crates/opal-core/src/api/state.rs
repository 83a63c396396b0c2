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

//! Primitive topology, fixed-function pipeline state, and clear flags.

/// The topology a draw call assembles vertices into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// One primitive per vertex.
    Points,
    /// One primitive per vertex pair.
    Lines,
    /// A connected strip of lines.
    LineStrip,
    /// One primitive per vertex triple.
    Triangles,
    /// A connected strip of triangles.
    TriangleStrip,
    /// A fan of triangles sharing the first vertex.
    TriangleFan,
}

impl PrimitiveType {
    /// The number of indices consumed by `primitive_count` primitives of this
    /// topology.
    ///
    /// Indexed range draws take a primitive count and derive the index count
    /// from the topology, so non-triangle topologies draw the correct number
    /// of indices. The result is widened to `u64` so the derivation cannot
    /// overflow for any `u32` primitive count; range validation against the
    /// source buffer happens at the draw call.
    pub const fn index_count(&self, primitive_count: u32) -> u64 {
        let n = primitive_count as u64;
        match self {
            PrimitiveType::Points => n,
            PrimitiveType::Lines => n * 2,
            PrimitiveType::LineStrip => {
                if n == 0 {
                    0
                } else {
                    n + 1
                }
            }
            PrimitiveType::Triangles => n * 3,
            PrimitiveType::TriangleStrip | PrimitiveType::TriangleFan => {
                if n == 0 {
                    0
                } else {
                    n + 2
                }
            }
        }
    }
}

/// A fixed-function capability that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// Framebuffer blending.
    Blend,
    /// Depth testing.
    DepthTest,
    /// Stencil testing.
    StencilTest,
    /// Back/front face culling.
    CullFace,
    /// Alpha testing.
    AlphaTest,
    /// Scissor testing.
    ScissorTest,
    /// Depth offset for filled polygons.
    PolygonOffsetFill,
}

/// A blend equation operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source color.
    SrcColor,
    /// One minus source color.
    OneMinusSrcColor,
    /// Destination color.
    DstColor,
    /// One minus destination color.
    OneMinusDstColor,
    /// Source alpha.
    SrcAlpha,
    /// One minus source alpha.
    OneMinusSrcAlpha,
    /// Destination alpha.
    DstAlpha,
    /// One minus destination alpha.
    OneMinusDstAlpha,
    /// Minimum of source alpha and one minus destination alpha.
    SrcAlphaSaturate,
}

/// The face set affected by culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceType {
    /// Front-facing polygons.
    Front,
    /// Back-facing polygons.
    Back,
    /// All polygons.
    FrontAndBack,
}

/// Flags naming which buffers a clear affects.
///
/// Multiple buffers can be combined with bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    /// No buffers.
    pub const NONE: Self = Self { bits: 0 };
    /// The color buffer.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// The depth buffer.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// The stencil buffer.
    pub const STENCIL: Self = Self { bits: 1 << 2 };
    /// All buffers.
    pub const ALL: Self = Self {
        bits: Self::COLOR.bits | Self::DEPTH.bits | Self::STENCIL.bits,
    };

    /// Creates a set of clear flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if these flags contain every flag in `other`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if these flags are empty (no buffers).
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ClearFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_counts_follow_topology() {
        assert_eq!(PrimitiveType::Points.index_count(7), 7);
        assert_eq!(PrimitiveType::Lines.index_count(4), 8);
        assert_eq!(PrimitiveType::LineStrip.index_count(4), 5);
        assert_eq!(PrimitiveType::Triangles.index_count(2), 6);
        assert_eq!(PrimitiveType::TriangleStrip.index_count(2), 4);
        assert_eq!(PrimitiveType::TriangleFan.index_count(3), 5);
    }

    #[test]
    fn index_count_is_exact_for_the_largest_primitive_count() {
        assert_eq!(
            PrimitiveType::Triangles.index_count(u32::MAX),
            u64::from(u32::MAX) * 3
        );
        assert_eq!(
            PrimitiveType::Lines.index_count(u32::MAX),
            u64::from(u32::MAX) * 2
        );
        assert_eq!(
            PrimitiveType::TriangleStrip.index_count(u32::MAX),
            u64::from(u32::MAX) + 2
        );
    }

    #[test]
    fn zero_primitives_need_zero_indices() {
        for topology in [
            PrimitiveType::Points,
            PrimitiveType::Lines,
            PrimitiveType::LineStrip,
            PrimitiveType::Triangles,
            PrimitiveType::TriangleStrip,
            PrimitiveType::TriangleFan,
        ] {
            assert_eq!(topology.index_count(0), 0);
        }
    }

    #[test]
    fn clear_flag_operations() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::COLOR));
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!flags.contains(ClearFlags::STENCIL));
        assert!(ClearFlags::ALL.contains(flags));
        assert!(ClearFlags::NONE.is_empty());
        assert_eq!(ClearFlags::from_bits(flags.bits()), flags);
    }
}
