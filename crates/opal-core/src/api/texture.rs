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

//! Defines data structures related to GPU texture resources.

/// The number of texture units a context exposes.
pub const MAX_TEXTURE_UNIT_COUNT: u32 = 32;

/// The texel format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single-channel luminance, 8 bits per texel.
    Luminance,
    /// Three-channel color, 8 bits per channel.
    Rgb,
    /// Four-channel color, 8 bits per channel.
    Rgba,
    /// Block-compressed RGB (DXT1).
    RgbDxt1,
    /// Block-compressed RGBA with 1-bit alpha (DXT1).
    RgbaDxt1,
    /// Block-compressed RGBA with explicit alpha (DXT3).
    RgbaDxt3,
    /// Block-compressed RGBA with interpolated alpha (DXT5).
    RgbaDxt5,
    /// Single-channel depth, stored as floating point.
    Depth,
}

impl TextureFormat {
    /// Returns `true` for block-compressed formats, whose payloads are
    /// fixed-size texel blocks rather than raw samples.
    pub const fn is_compressed(&self) -> bool {
        matches!(
            self,
            TextureFormat::RgbDxt1
                | TextureFormat::RgbaDxt1
                | TextureFormat::RgbaDxt3
                | TextureFormat::RgbaDxt5
        )
    }

    /// The storage size of one texel in bytes, or `None` for block-compressed
    /// formats (their size is defined by the supplied payload, not per texel).
    pub const fn bytes_per_texel(&self) -> Option<u32> {
        match self {
            TextureFormat::Luminance => Some(1),
            TextureFormat::Rgb => Some(3),
            TextureFormat::Rgba => Some(4),
            TextureFormat::Depth => Some(4),
            TextureFormat::RgbDxt1
            | TextureFormat::RgbaDxt1
            | TextureFormat::RgbaDxt3
            | TextureFormat::RgbaDxt5 => None,
        }
    }
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation between the nearest texels.
    Linear,
    /// Nearest texel from the nearest mip level.
    NearestMipmapNearest,
    /// Linear filtering within the nearest mip level.
    LinearMipmapNearest,
    /// Nearest texel, blended between the two nearest mip levels.
    NearestMipmapLinear,
    /// Linear filtering, blended between the two nearest mip levels.
    LinearMipmapLinear,
}

/// Defines how texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirroredRepeat,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// A descriptor used to create or re-upload a texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureParams<'a> {
    /// The width of the image in texels.
    pub width: u32,
    /// The height of the image in texels.
    pub height: u32,
    /// The texel format.
    pub format: TextureFormat,
    /// The mip level this upload targets.
    pub mip_level: u32,
    /// The minification filter.
    pub min_filter: TextureFilter,
    /// The magnification filter.
    pub mag_filter: TextureFilter,
    /// Wrapping along the horizontal texture axis.
    pub u_wrap: TextureWrap,
    /// Wrapping along the vertical texture axis.
    pub v_wrap: TextureWrap,
    /// The texel payload. `None` (or an empty slice for a block-compressed
    /// format) reserves storage without uploading content.
    pub data: Option<&'a [u8]>,
}

impl Default for TextureParams<'_> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: TextureFormat::Rgba,
            mip_level: 0,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            u_wrap: TextureWrap::Repeat,
            v_wrap: TextureWrap::Repeat,
            data: None,
        }
    }
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_formats_have_no_per_texel_size() {
        for format in [
            TextureFormat::RgbDxt1,
            TextureFormat::RgbaDxt1,
            TextureFormat::RgbaDxt3,
            TextureFormat::RgbaDxt5,
        ] {
            assert!(format.is_compressed());
            assert_eq!(format.bytes_per_texel(), None);
        }
    }

    #[test]
    fn uncompressed_texel_sizes() {
        assert_eq!(TextureFormat::Luminance.bytes_per_texel(), Some(1));
        assert_eq!(TextureFormat::Rgb.bytes_per_texel(), Some(3));
        assert_eq!(TextureFormat::Rgba.bytes_per_texel(), Some(4));
        assert_eq!(TextureFormat::Depth.bytes_per_texel(), Some(4));
        assert!(!TextureFormat::Depth.is_compressed());
    }
}
