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

//! Defines data structures related to off-screen render targets.

use crate::api::texture::TextureParams;

/// One attachment slot of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    /// The color attachment.
    Color,
    /// The depth attachment.
    Depth,
    /// The stencil attachment.
    Stencil,
}

impl AttachmentSlot {
    /// Every attachment slot, in attachment order.
    pub const ALL: [AttachmentSlot; 3] = [
        AttachmentSlot::Color,
        AttachmentSlot::Depth,
        AttachmentSlot::Stencil,
    ];
}

/// A descriptor used to create a render target.
///
/// Each populated slot causes the device to create an *owned* texture with
/// the given parameters and attach it. A target with no color attachment is
/// a legal write-only depth/stencil target; the device disables its color
/// draw buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderTargetDescriptor<'a> {
    /// Parameters for the owned color attachment texture, if any.
    pub color: Option<TextureParams<'a>>,
    /// Parameters for the owned depth attachment texture, if any.
    pub depth: Option<TextureParams<'a>>,
    /// Parameters for the owned stencil attachment texture, if any.
    pub stencil: Option<TextureParams<'a>>,
}

impl<'a> RenderTargetDescriptor<'a> {
    /// The parameters for a given slot, if that slot is populated.
    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&TextureParams<'a>> {
        match slot {
            AttachmentSlot::Color => self.color.as_ref(),
            AttachmentSlot::Depth => self.depth.as_ref(),
            AttachmentSlot::Stencil => self.stencil.as_ref(),
        }
    }

    /// Returns `true` if no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.depth.is_none() && self.stencil.is_none()
    }
}

/// The reason a render target's attachment combination is unusable.
///
/// The completeness query distinguishes these categories because they tell
/// the caller *which* part of the configuration to change; they are
/// recoverable configuration failures, not programmer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletenessStatus {
    /// The target does not exist or the default surface is gone.
    Undefined,
    /// An attachment is unusable: wrong format for its slot, zero-sized, or
    /// mismatched with the other attachments' dimensions.
    IncompleteAttachment,
    /// The target has no attachments at all.
    MissingAttachment,
    /// A draw buffer references an absent attachment.
    IncompleteDrawBuffer,
    /// A read buffer references an absent attachment.
    IncompleteReadBuffer,
    /// The combination of attachment formats is not supported.
    Unsupported,
    /// Attachments disagree on sample counts.
    IncompleteMultisample,
    /// Attachments disagree on layering.
    IncompleteLayerTargets,
}

/// An opaque handle to a render target and its owned attachment textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::texture::TextureFormat;

    #[test]
    fn descriptor_slot_lookup() {
        let descriptor = RenderTargetDescriptor {
            depth: Some(TextureParams {
                width: 16,
                height: 16,
                format: TextureFormat::Depth,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(descriptor.attachment(AttachmentSlot::Color).is_none());
        assert!(descriptor.attachment(AttachmentSlot::Depth).is_some());
        assert!(descriptor.attachment(AttachmentSlot::Stencil).is_none());
        assert!(!descriptor.is_empty());
        assert!(RenderTargetDescriptor::default().is_empty());
    }
}
