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

//! Conversion tables from the portable API enums to raw driver constants.

use opal_core::{
    AttachmentSlot, BlendFactor, BufferAccess, BufferUsage, ClearFlags, CompletenessStatus,
    DataType, FaceType, PrimitiveType, RenderState, TextureFilter, TextureFormat, TextureWrap,
};

use super::raw;

/// Maps a portable API enum onto the matching raw driver constant.
pub trait IntoRaw {
    /// Returns the raw constant for this value.
    fn into_raw(self) -> u32;
}

impl IntoRaw for BufferUsage {
    fn into_raw(self) -> u32 {
        match self {
            BufferUsage::Static => raw::STATIC_DRAW,
            BufferUsage::Dynamic => raw::DYNAMIC_DRAW,
            BufferUsage::Stream => raw::STREAM_DRAW,
        }
    }
}

impl IntoRaw for BufferAccess {
    fn into_raw(self) -> u32 {
        match self {
            BufferAccess::ReadOnly => raw::READ_ONLY,
            BufferAccess::WriteOnly => raw::WRITE_ONLY,
            BufferAccess::ReadWrite => raw::READ_WRITE,
        }
    }
}

impl IntoRaw for DataType {
    fn into_raw(self) -> u32 {
        match self {
            DataType::Byte => raw::BYTE,
            DataType::UnsignedByte => raw::UNSIGNED_BYTE,
            DataType::Short => raw::SHORT,
            DataType::UnsignedShort => raw::UNSIGNED_SHORT,
            DataType::Int => raw::INT,
            DataType::UnsignedInt => raw::UNSIGNED_INT,
            DataType::Float => raw::FLOAT,
        }
    }
}

impl IntoRaw for TextureFormat {
    fn into_raw(self) -> u32 {
        match self {
            TextureFormat::Luminance => raw::LUMINANCE,
            TextureFormat::Rgb => raw::RGB,
            TextureFormat::Rgba => raw::RGBA,
            TextureFormat::RgbDxt1 => raw::COMPRESSED_RGB_DXT1,
            TextureFormat::RgbaDxt1 => raw::COMPRESSED_RGBA_DXT1,
            TextureFormat::RgbaDxt3 => raw::COMPRESSED_RGBA_DXT3,
            TextureFormat::RgbaDxt5 => raw::COMPRESSED_RGBA_DXT5,
            TextureFormat::Depth => raw::DEPTH_COMPONENT,
        }
    }
}

impl IntoRaw for TextureFilter {
    fn into_raw(self) -> u32 {
        match self {
            TextureFilter::Nearest => raw::NEAREST,
            TextureFilter::Linear => raw::LINEAR,
            TextureFilter::NearestMipmapNearest => raw::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => raw::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => raw::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => raw::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl IntoRaw for TextureWrap {
    fn into_raw(self) -> u32 {
        match self {
            TextureWrap::Repeat => raw::REPEAT,
            TextureWrap::ClampToEdge => raw::CLAMP_TO_EDGE,
            TextureWrap::MirroredRepeat => raw::MIRRORED_REPEAT,
            TextureWrap::ClampToBorder => raw::CLAMP_TO_BORDER,
        }
    }
}

impl IntoRaw for PrimitiveType {
    fn into_raw(self) -> u32 {
        match self {
            PrimitiveType::Points => raw::POINTS,
            PrimitiveType::Lines => raw::LINES,
            PrimitiveType::LineStrip => raw::LINE_STRIP,
            PrimitiveType::Triangles => raw::TRIANGLES,
            PrimitiveType::TriangleStrip => raw::TRIANGLE_STRIP,
            PrimitiveType::TriangleFan => raw::TRIANGLE_FAN,
        }
    }
}

impl IntoRaw for RenderState {
    fn into_raw(self) -> u32 {
        match self {
            RenderState::Blend => raw::BLEND,
            RenderState::DepthTest => raw::DEPTH_TEST,
            RenderState::StencilTest => raw::STENCIL_TEST,
            RenderState::CullFace => raw::CULL_FACE,
            RenderState::AlphaTest => raw::ALPHA_TEST,
            RenderState::ScissorTest => raw::SCISSOR_TEST,
            RenderState::PolygonOffsetFill => raw::POLYGON_OFFSET_FILL,
        }
    }
}

impl IntoRaw for BlendFactor {
    fn into_raw(self) -> u32 {
        match self {
            BlendFactor::Zero => raw::BLEND_ZERO,
            BlendFactor::One => raw::BLEND_ONE,
            BlendFactor::SrcColor => raw::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => raw::ONE_MINUS_SRC_COLOR,
            BlendFactor::SrcAlpha => raw::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => raw::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => raw::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => raw::ONE_MINUS_DST_ALPHA,
            BlendFactor::DstColor => raw::DST_COLOR,
            BlendFactor::OneMinusDstColor => raw::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlphaSaturate => raw::SRC_ALPHA_SATURATE,
        }
    }
}

impl IntoRaw for FaceType {
    fn into_raw(self) -> u32 {
        match self {
            FaceType::Front => raw::FRONT,
            FaceType::Back => raw::BACK,
            FaceType::FrontAndBack => raw::FRONT_AND_BACK,
        }
    }
}

impl IntoRaw for AttachmentSlot {
    fn into_raw(self) -> u32 {
        match self {
            AttachmentSlot::Color => raw::COLOR_ATTACHMENT0,
            AttachmentSlot::Depth => raw::DEPTH_ATTACHMENT,
            AttachmentSlot::Stencil => raw::STENCIL_ATTACHMENT,
        }
    }
}

impl IntoRaw for ClearFlags {
    fn into_raw(self) -> u32 {
        let mut mask = 0;
        if self.contains(ClearFlags::COLOR) {
            mask |= raw::COLOR_BUFFER_BIT;
        }
        if self.contains(ClearFlags::DEPTH) {
            mask |= raw::DEPTH_BUFFER_BIT;
        }
        if self.contains(ClearFlags::STENCIL) {
            mask |= raw::STENCIL_BUFFER_BIT;
        }
        mask
    }
}

/// Maps a raw framebuffer status constant onto the portable completeness
/// category. An unrecognized status maps to [`CompletenessStatus::Undefined`].
pub fn completeness_from_raw(status: u32) -> CompletenessStatus {
    match status {
        raw::FRAMEBUFFER_UNDEFINED => CompletenessStatus::Undefined,
        raw::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => CompletenessStatus::IncompleteAttachment,
        raw::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => CompletenessStatus::MissingAttachment,
        raw::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => CompletenessStatus::IncompleteDrawBuffer,
        raw::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => CompletenessStatus::IncompleteReadBuffer,
        raw::FRAMEBUFFER_UNSUPPORTED => CompletenessStatus::Unsupported,
        raw::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => CompletenessStatus::IncompleteMultisample,
        raw::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => CompletenessStatus::IncompleteLayerTargets,
        _ => CompletenessStatus::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_usage_table() {
        assert_eq!(BufferUsage::Static.into_raw(), raw::STATIC_DRAW);
        assert_eq!(BufferUsage::Stream.into_raw(), raw::STREAM_DRAW);
    }

    #[test]
    fn compressed_formats_map_to_dxt_constants() {
        assert_eq!(TextureFormat::RgbDxt1.into_raw(), raw::COMPRESSED_RGB_DXT1);
        assert_eq!(TextureFormat::RgbaDxt5.into_raw(), raw::COMPRESSED_RGBA_DXT5);
    }

    #[test]
    fn primitive_table_matches_driver_modes() {
        assert_eq!(PrimitiveType::Triangles.into_raw(), raw::TRIANGLES);
        assert_eq!(PrimitiveType::TriangleFan.into_raw(), raw::TRIANGLE_FAN);
    }

    #[test]
    fn clear_flags_combine_into_a_raw_mask() {
        let mask = (ClearFlags::COLOR | ClearFlags::DEPTH).into_raw();
        assert_eq!(mask, raw::COLOR_BUFFER_BIT | raw::DEPTH_BUFFER_BIT);
        assert_eq!(ClearFlags::NONE.into_raw(), 0);
    }

    #[test]
    fn completeness_table_covers_every_category() {
        assert_eq!(
            completeness_from_raw(raw::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT),
            CompletenessStatus::MissingAttachment
        );
        assert_eq!(
            completeness_from_raw(raw::FRAMEBUFFER_UNSUPPORTED),
            CompletenessStatus::Unsupported
        );
        assert_eq!(completeness_from_raw(0), CompletenessStatus::Undefined);
    }
}
