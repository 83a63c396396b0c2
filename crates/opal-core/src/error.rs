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

//! Defines the hierarchy of error types for the graphics device layer.
//!
//! Three classes of failure are kept distinct: device creation failures are
//! recoverable by the caller ([`DeviceError`]), render target completeness
//! failures are recoverable configuration errors carrying a specific category
//! ([`TargetError`]), and everything else is a resource or backend failure
//! ([`ResourceError`]). Programmer-error preconditions are additionally
//! checked with `debug_assert!` at the call site before the typed error is
//! returned.

use crate::api::target::CompletenessStatus;
use std::fmt;

/// An error during device/surface creation.
///
/// This is the one failure the contract defines as non-fatal: the caller may
/// retry with different parameters. Partial backend initialization is unwound
/// before the error is returned.
#[derive(Debug)]
pub enum DeviceError {
    /// The drawable surface could not be created with the requested
    /// parameters.
    SurfaceCreationFailed(String),
    /// Another device is still live; exactly one device may exist at a time.
    DeviceAlreadyLive,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::SurfaceCreationFailed(msg) => {
                write!(f, "Failed to create drawable surface: {msg}")
            }
            DeviceError::DeviceAlreadyLive => {
                write!(f, "A graphics device is already live in this process.")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// The handle used to reference a resource is invalid or was deleted.
    InvalidHandle,
    /// A byte range falls outside a buffer's current allocation.
    OutOfBounds {
        /// The first byte of the requested range.
        offset: u64,
        /// The length of the requested range in bytes.
        len: u64,
        /// The buffer's current allocation in bytes.
        capacity: u64,
    },
    /// A vertex declaration was supplied more streams than the fixed
    /// capacity.
    StreamCapacityExceeded {
        /// The number of streams requested.
        requested: usize,
        /// The fixed stream capacity.
        capacity: usize,
    },
    /// The buffer is already mapped; map/unmap must be paired.
    AlreadyMapped,
    /// The mapping token handed to unmap was opened over a different buffer.
    /// Nothing is committed; the mapping the token was opened over is closed
    /// and its pending writes are discarded.
    MappingMismatch,
    /// A texture unit index is outside the context's unit table.
    InvalidTextureUnit {
        /// The requested unit.
        unit: u32,
    },
    /// An error reported by the underlying backend, with the operation name
    /// and the backend's code for diagnosis. Backend error state is sticky,
    /// so these are treated as fatal to the operation that detected them.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfBounds {
                offset,
                len,
                capacity,
            } => {
                write!(
                    f,
                    "Byte range [{offset}, {}) exceeds buffer capacity {capacity}.",
                    offset.saturating_add(*len)
                )
            }
            ResourceError::StreamCapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "Vertex declaration with {requested} streams exceeds capacity {capacity}."
                )
            }
            ResourceError::AlreadyMapped => {
                write!(f, "Buffer is already mapped for CPU access.")
            }
            ResourceError::MappingMismatch => {
                write!(f, "Mapping token belongs to a different buffer.")
            }
            ResourceError::InvalidTextureUnit { unit } => {
                write!(f, "Texture unit {unit} is out of range.")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error related to the creation or use of a render target.
#[derive(Debug)]
pub enum TargetError {
    /// The target's attachment combination failed the completeness check,
    /// with the category indicating which part of the configuration is
    /// unusable.
    Incomplete(CompletenessStatus),
    /// A resource error occurred while building or using the target (e.g.
    /// creating an owned attachment texture failed).
    Resource(ResourceError),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::Incomplete(status) => {
                write!(f, "Render target incomplete: {status:?}")
            }
            TargetError::Resource(err) => {
                write!(f, "Render target resource error: {err}")
            }
        }
    }
}

impl std::error::Error for TargetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TargetError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for TargetError {
    fn from(err: ResourceError) -> Self {
        TargetError::Resource(err)
    }
}

/// A high-level error that can occur within the graphics device layer.
#[derive(Debug)]
pub enum RenderError {
    /// Device/surface creation failed.
    Device(DeviceError),
    /// A GPU resource operation failed.
    Resource(ResourceError),
    /// A render target operation failed.
    Target(TargetError),
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Device(err) => write!(f, "Graphics device error: {err}"),
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Target(err) => {
                write!(f, "Render target operation failed: {err}")
            }
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Device(err) => Some(err),
            RenderError::Resource(err) => Some(err),
            RenderError::Target(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        RenderError::Device(err)
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<TargetError> for RenderError {
    fn from(err: TargetError) -> Self {
        RenderError::Target(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn device_error_display() {
        let err = DeviceError::SurfaceCreationFailed("zero-sized surface".to_string());
        assert_eq!(
            format!("{err}"),
            "Failed to create drawable surface: zero-sized surface"
        );
        assert_eq!(
            format!("{}", DeviceError::DeviceAlreadyLive),
            "A graphics device is already live in this process."
        );
    }

    #[test]
    fn resource_error_display() {
        let err = ResourceError::OutOfBounds {
            offset: 60,
            len: 8,
            capacity: 64,
        };
        assert_eq!(format!("{err}"), "Byte range [60, 68) exceeds buffer capacity 64.");

        let err = ResourceError::StreamCapacityExceeded {
            requested: 9,
            capacity: 8,
        };
        assert_eq!(
            format!("{err}"),
            "Vertex declaration with 9 streams exceeds capacity 8."
        );

        assert_eq!(
            format!("{}", ResourceError::MappingMismatch),
            "Mapping token belongs to a different buffer."
        );
    }

    #[test]
    fn out_of_bounds_display_saturates_the_range_end() {
        let err = ResourceError::OutOfBounds {
            offset: u64::MAX - 1,
            len: 8,
            capacity: 64,
        };
        assert_eq!(
            format!("{err}"),
            format!("Byte range [{}, {}) exceeds buffer capacity 64.", u64::MAX - 1, u64::MAX)
        );
    }

    #[test]
    fn target_error_display_and_source() {
        let err = TargetError::Incomplete(CompletenessStatus::IncompleteAttachment);
        assert_eq!(
            format!("{err}"),
            "Render target incomplete: IncompleteAttachment"
        );
        assert!(err.source().is_none());

        let err: TargetError = ResourceError::InvalidHandle.into();
        assert!(err.source().is_some());
    }

    #[test]
    fn render_error_wrapping_chain() {
        let target_err: TargetError = ResourceError::InvalidHandle.into();
        let render_err: RenderError = target_err.into();
        assert_eq!(
            format!("{render_err}"),
            "Render target operation failed: Render target resource error: Invalid resource handle or ID."
        );
        assert!(render_err.source().is_some());
        assert!(render_err.source().unwrap().source().is_some());
    }
}
