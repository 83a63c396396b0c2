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

//! Defines data structures related to GPU buffer resources.

/// A hint describing how often a buffer's contents will be rewritten.
///
/// The backend uses this to place the allocation in the most appropriate
/// memory type. It is a hint, not a constraint: any buffer may be rewritten
/// with [`GraphicsDevice::set_vertex_buffer_data`] regardless of its hint.
///
/// [`GraphicsDevice::set_vertex_buffer_data`]: crate::traits::GraphicsDevice::set_vertex_buffer_data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    Static,
    /// Rewritten occasionally, drawn many times between rewrites.
    Dynamic,
    /// Rewritten roughly every frame.
    Stream,
}

/// The CPU access mode requested when mapping a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    /// The mapped bytes may only be read.
    ReadOnly,
    /// The mapped bytes may only be written; their initial contents are the
    /// buffer's current contents.
    WriteOnly,
    /// The mapped bytes may be read and written.
    ReadWrite,
}

impl BufferAccess {
    /// Returns `true` if this access mode allows writing through the mapping.
    pub const fn is_writable(&self) -> bool {
        matches!(self, BufferAccess::WriteOnly | BufferAccess::ReadWrite)
    }
}

/// An opaque handle to a GPU-resident vertex buffer.
///
/// Returned by [`GraphicsDevice::create_vertex_buffer`] and used to reference
/// the buffer in all subsequent operations.
///
/// [`GraphicsDevice::create_vertex_buffer`]: crate::traits::GraphicsDevice::create_vertex_buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub usize);

/// An opaque handle to a GPU-resident index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(pub usize);

/// The buffer a mapping token was opened over.
///
/// Carried inside [`MappedBuffer`] so the unmap call can verify the token is
/// handed back to the buffer it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedBufferSource {
    /// The mapping covers a vertex buffer.
    Vertex(VertexBufferId),
    /// The mapping covers an index buffer.
    Index(IndexBufferId),
}

/// A scoped CPU view of a buffer's bytes, produced by a map operation.
///
/// The token is consumed by the matching unmap call, which commits writable
/// bytes back to the buffer. Because the token is an owned value, the
/// unmap-without-map and use-after-unmap misuses of a raw pointer contract
/// are unrepresentable: the only way to end the access window is to hand the
/// token back to the device. The token also remembers which buffer it was
/// opened over, so unmapping it against a different buffer is rejected.
#[derive(Debug)]
pub struct MappedBuffer {
    source: MappedBufferSource,
    data: Vec<u8>,
    access: BufferAccess,
}

impl MappedBuffer {
    /// Creates a mapping token over a snapshot of the buffer's bytes.
    ///
    /// This is called by backend implementations; callers receive the token
    /// from [`GraphicsDevice::map_vertex_buffer`] or
    /// [`GraphicsDevice::map_index_buffer`].
    ///
    /// [`GraphicsDevice::map_vertex_buffer`]: crate::traits::GraphicsDevice::map_vertex_buffer
    /// [`GraphicsDevice::map_index_buffer`]: crate::traits::GraphicsDevice::map_index_buffer
    pub fn new(source: MappedBufferSource, data: Vec<u8>, access: BufferAccess) -> Self {
        Self {
            source,
            data,
            access,
        }
    }

    /// The buffer this mapping was opened over.
    pub fn source(&self) -> MappedBufferSource {
        self.source
    }

    /// The access mode this mapping was created with.
    pub fn access(&self) -> BufferAccess {
        self.access
    }

    /// The length of the mapped region in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the mapped region is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The mapped bytes, mutably.
    ///
    /// Writing through a `ReadOnly` mapping is a precondition violation; the
    /// bytes written are discarded at unmap.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        debug_assert!(
            self.access.is_writable(),
            "writing through a read-only buffer mapping"
        );
        &mut self.data
    }

    /// Decomposes the token into its bytes and access mode.
    ///
    /// Used by backends when committing the mapping at unmap.
    pub fn into_parts(self) -> (Vec<u8>, BufferAccess) {
        (self.data, self.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_writability() {
        assert!(!BufferAccess::ReadOnly.is_writable());
        assert!(BufferAccess::WriteOnly.is_writable());
        assert!(BufferAccess::ReadWrite.is_writable());
    }

    #[test]
    fn mapped_buffer_round_trips_bytes() {
        let source = MappedBufferSource::Vertex(VertexBufferId(7));
        let mut mapping = MappedBuffer::new(source, vec![1, 2, 3, 4], BufferAccess::ReadWrite);
        assert_eq!(mapping.source(), source);
        mapping.as_mut_slice()[0] = 9;
        let (bytes, access) = mapping.into_parts();
        assert_eq!(bytes, vec![9, 2, 3, 4]);
        assert_eq!(access, BufferAccess::ReadWrite);
    }
}
