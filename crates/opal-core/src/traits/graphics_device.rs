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

use crate::api::*;
use crate::error::{RenderError, ResourceError, TargetError};
use std::fmt::Debug;

/// The uniform, backend-agnostic contract of the graphics device layer.
///
/// A value implementing this trait owns the single logical rendering context,
/// so the device reference takes the role of the explicitly-passed context
/// handle: no operation reaches for global state. All operations are defined
/// to run on the thread of execution that owns the context; callers feeding
/// the device from worker threads must serialize their submissions before
/// this boundary. Every call completes its state mutation before returning;
/// the underlying command stream may lag, with [`flip`] as the only
/// synchronization point.
///
/// The underlying native API is bind-then-operate: operating on a resource
/// implicitly requires binding it to a slot of global context state.
/// Implementations must scope every such bind and restore the slot to the
/// neutral binding ("no resource bound") on every exit path, so callers never
/// observe a dangling bind from an unrelated call.
///
/// [`flip`]: GraphicsDevice::flip
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    // --- Device/Context Operations ---

    /// Returns the last-configured surface width. Pure read, no side effects.
    fn window_width(&self) -> u32;

    /// Returns the last-configured surface height. Pure read, no side effects.
    fn window_height(&self) -> u32;

    // --- Vertex Buffer Operations ---

    /// Creates a vertex buffer of `size` bytes, optionally filled with
    /// `data`.
    ///
    /// ## Arguments
    /// * `size` - The allocation size in bytes.
    /// * `data` - Initial contents; when `Some`, its length must equal
    ///   `size`. `None` leaves the contents undefined.
    /// * `usage` - A rewrite-frequency hint for the backend's allocator.
    ///
    /// ## Returns
    /// A `Result` containing the handle of the created buffer, unique among
    /// live vertex buffers until destroyed.
    fn create_vertex_buffer(
        &self,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<VertexBufferId, ResourceError>;

    /// Replaces a vertex buffer's contents, reallocating its storage to
    /// `size` bytes.
    ///
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `id` does not name a live buffer.
    fn set_vertex_buffer_data(
        &self,
        id: VertexBufferId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<(), ResourceError>;

    /// Overwrites `[offset, offset + data.len())` within a vertex buffer.
    ///
    /// The range must lie inside the current allocation; storage is never
    /// grown by a partial write.
    ///
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the range exceeds the allocation.
    fn set_vertex_buffer_sub_data(
        &self,
        id: VertexBufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Opens a scoped CPU access window over a vertex buffer's bytes.
    ///
    /// While mapped, the buffer must not be used as a draw source. The
    /// returned token must be handed back via
    /// [`unmap_vertex_buffer`](GraphicsDevice::unmap_vertex_buffer) before
    /// any draw referencing the buffer.
    ///
    /// ## Errors
    /// * `ResourceError::AlreadyMapped` - If a mapping is already open.
    fn map_vertex_buffer(
        &self,
        id: VertexBufferId,
        access: BufferAccess,
    ) -> Result<MappedBuffer, ResourceError>;

    /// Closes a mapping, committing writable bytes back to the buffer.
    ///
    /// ## Returns
    /// `Ok(true)` on success. `Ok(false)` if the backend detected that the
    /// mapped region was invalidated while open (e.g. by a context loss); the
    /// caller must then treat the buffer contents as undefined and re-upload.
    ///
    /// ## Errors
    /// * `ResourceError::MappingMismatch` - If the token was opened over a
    ///   different buffer than `id`. Nothing is committed; the token's own
    ///   mapping is closed with its writes discarded.
    fn unmap_vertex_buffer(
        &self,
        id: VertexBufferId,
        mapping: MappedBuffer,
    ) -> Result<bool, ResourceError>;

    /// Destroys a vertex buffer. Its handle may be reused for a future
    /// resource but never aliases a still-live one.
    fn destroy_vertex_buffer(&self, id: VertexBufferId) -> Result<(), ResourceError>;

    // --- Index Buffer Operations ---

    /// Creates an index buffer of `size` bytes, optionally filled with
    /// `data`. See
    /// [`create_vertex_buffer`](GraphicsDevice::create_vertex_buffer).
    fn create_index_buffer(
        &self,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<IndexBufferId, ResourceError>;

    /// Replaces an index buffer's contents, reallocating its storage.
    fn set_index_buffer_data(
        &self,
        id: IndexBufferId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<(), ResourceError>;

    /// Overwrites `[offset, offset + data.len())` within an index buffer.
    ///
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the range exceeds the allocation.
    fn set_index_buffer_sub_data(
        &self,
        id: IndexBufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Opens a scoped CPU access window over an index buffer's bytes. See
    /// [`map_vertex_buffer`](GraphicsDevice::map_vertex_buffer).
    fn map_index_buffer(
        &self,
        id: IndexBufferId,
        access: BufferAccess,
    ) -> Result<MappedBuffer, ResourceError>;

    /// Closes an index buffer mapping. See
    /// [`unmap_vertex_buffer`](GraphicsDevice::unmap_vertex_buffer).
    fn unmap_index_buffer(
        &self,
        id: IndexBufferId,
        mapping: MappedBuffer,
    ) -> Result<bool, ResourceError>;

    /// Destroys an index buffer.
    fn destroy_index_buffer(&self, id: IndexBufferId) -> Result<(), ResourceError>;

    // --- Vertex Declaration Operations ---

    /// Registers a vertex declaration computed from `elements` in order.
    ///
    /// Offsets and the total stride are derived deterministically; see
    /// [`VertexDeclaration::new`].
    ///
    /// ## Errors
    /// * `ResourceError::StreamCapacityExceeded` - If `elements` exceeds the
    ///   fixed stream capacity.
    fn create_vertex_declaration(
        &self,
        elements: &[VertexElement],
    ) -> Result<VertexDeclarationId, ResourceError>;

    /// Returns a copy of a registered declaration's computed layout.
    fn vertex_declaration(
        &self,
        id: VertexDeclarationId,
    ) -> Result<VertexDeclaration, ResourceError>;

    /// Binds `buffer` and activates every stream of `declaration` with its
    /// computed size/type/stride/offset.
    ///
    /// The declaration holds no reference to the buffer; it may be enabled
    /// over any buffer sharing the layout.
    fn enable_vertex_declaration(
        &self,
        declaration: VertexDeclarationId,
        buffer: VertexBufferId,
    ) -> Result<(), ResourceError>;

    /// Deactivates every attribute slot used by `declaration` and resets both
    /// vertex and index bindings to none.
    fn disable_vertex_declaration(
        &self,
        declaration: VertexDeclarationId,
    ) -> Result<(), ResourceError>;

    /// Destroys a registered vertex declaration.
    fn destroy_vertex_declaration(&self, id: VertexDeclarationId) -> Result<(), ResourceError>;

    /// Activates a single attribute slot directly, outside any declaration.
    ///
    /// ## Arguments
    /// * `stream` - The attribute slot to activate.
    /// * `size` - Scalar components per attribute.
    /// * `data_type` - The scalar type of each component.
    /// * `stride` - Byte distance between consecutive attributes.
    /// * `buffer` - The vertex buffer supplying the data.
    /// * `offset` - Byte offset of the first attribute within the buffer.
    fn set_vertex_stream(
        &self,
        stream: u32,
        size: u32,
        data_type: DataType,
        stride: u32,
        buffer: VertexBufferId,
        offset: u64,
    ) -> Result<(), ResourceError>;

    /// Deactivates a single attribute slot.
    fn disable_vertex_stream(&self, stream: u32) -> Result<(), ResourceError>;

    // --- Texture Operations ---

    /// Allocates a texture object and uploads it per `params`, as
    /// [`set_texture`](GraphicsDevice::set_texture) would.
    fn create_texture(&self, params: &TextureParams) -> Result<TextureId, ResourceError>;

    /// Re-configures and re-uploads a texture.
    ///
    /// Sampling filters and wrap modes are taken from `params`, then the
    /// payload is uploaded along a format-dependent path: uncompressed
    /// formats upload the full image at the given mip level (depth is stored
    /// as floating point); block-compressed formats upload only when a
    /// non-empty payload is supplied — an absent payload reserves storage
    /// without defining its content and is not an error.
    fn set_texture(&self, id: TextureId, params: &TextureParams) -> Result<(), ResourceError>;

    /// Activates texture unit `unit` and binds `texture` to it, or binds
    /// nothing when `texture` is `None` — the mechanism for temporarily
    /// disabling a texture stage.
    ///
    /// ## Errors
    /// * `ResourceError::InvalidTextureUnit` - If `unit` is outside the unit
    ///   table.
    fn set_texture_unit(&self, unit: u32, texture: Option<TextureId>)
        -> Result<(), ResourceError>;

    /// Destroys a texture.
    ///
    /// Destroying a texture still bound to a unit or target leaves that
    /// binding dangling; unbind first.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    // --- Program Operations ---

    /// Creates a vertex program stage from an opaque precompiled blob.
    fn create_vertex_program(&self, blob: &[u8]) -> Result<VertexProgramId, ResourceError>;

    /// Creates a fragment program stage from an opaque precompiled blob.
    fn create_fragment_program(&self, blob: &[u8]) -> Result<FragmentProgramId, ResourceError>;

    /// Activates a vertex program stage. Stages are independent; only one
    /// program per stage is active, and activating a new one replaces the
    /// previous.
    fn set_vertex_program(&self, id: VertexProgramId) -> Result<(), ResourceError>;

    /// Activates a fragment program stage.
    fn set_fragment_program(&self, id: FragmentProgramId) -> Result<(), ResourceError>;

    /// Loads `vectors` into consecutive vertex-stage constant registers
    /// starting at `base_register`.
    fn set_vertex_constant_block(
        &self,
        base_register: u32,
        vectors: &[[f32; 4]],
    ) -> Result<(), ResourceError>;

    /// Loads one vector into a fragment-stage constant register.
    fn set_fragment_constant(
        &self,
        base_register: u32,
        vector: [f32; 4],
    ) -> Result<(), ResourceError>;

    /// Loads `vectors` into consecutive fragment-stage constant registers.
    fn set_fragment_constant_block(
        &self,
        base_register: u32,
        vectors: &[[f32; 4]],
    ) -> Result<(), ResourceError>;

    /// Destroys a vertex program stage.
    fn destroy_vertex_program(&self, id: VertexProgramId) -> Result<(), ResourceError>;

    /// Destroys a fragment program stage.
    fn destroy_fragment_program(&self, id: FragmentProgramId) -> Result<(), ResourceError>;

    // --- Render Target Operations ---

    /// Creates an off-screen target, creating and attaching one owned
    /// texture per populated slot of `descriptor`.
    ///
    /// If the color slot is absent, the target's color draw buffer is
    /// disabled (a write-only depth/stencil target). Completeness is
    /// validated after attaching.
    ///
    /// ## Errors
    /// * `TargetError::Incomplete` - With the specific completeness category
    ///   when the attachment combination is unusable.
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, TargetError>;

    /// Switches the active draw destination to `target`, then re-checks its
    /// completeness.
    fn enable_render_target(&self, target: RenderTargetId) -> Result<(), TargetError>;

    /// Switches the active draw destination back to the default surface.
    fn disable_render_target(&self) -> Result<(), TargetError>;

    /// Returns the owned attachment texture for `slot`. Read-only accessor.
    ///
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If the target is not live or the
    ///   slot has no attachment.
    fn render_target_texture(
        &self,
        target: RenderTargetId,
        slot: AttachmentSlot,
    ) -> Result<TextureId, ResourceError>;

    /// Destroys a render target and every attachment texture it owns.
    fn destroy_render_target(&self, target: RenderTargetId) -> Result<(), ResourceError>;

    // --- State/Draw Operations ---

    /// Clears the buffers named in `flags`.
    ///
    /// The 8-bit color channels are normalized to the backend's floating
    /// point range before clearing.
    #[allow(clippy::too_many_arguments)]
    fn clear(
        &self,
        flags: ClearFlags,
        red: u8,
        green: u8,
        blue: u8,
        alpha: u8,
        depth: f32,
        stencil: u32,
    ) -> Result<(), RenderError>;

    /// Issues a non-indexed draw of `count` vertices starting at `first`.
    fn draw(&self, primitive: PrimitiveType, first: u32, count: u32) -> Result<(), RenderError>;

    /// Issues an indexed draw of `count` indices taken from `indices`.
    fn draw_elements(
        &self,
        primitive: PrimitiveType,
        count: u32,
        index_type: DataType,
        indices: &[u8],
    ) -> Result<(), RenderError>;

    /// Issues an indexed draw of `primitive_count` primitives over the index
    /// range `[start, start + n)` of a bound index buffer, where `n` is
    /// derived from the topology via [`PrimitiveType::index_count`].
    ///
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the derived index range falls
    ///   outside the index buffer's allocation.
    fn draw_range_elements(
        &self,
        primitive: PrimitiveType,
        start: u32,
        primitive_count: u32,
        index_type: DataType,
        index_buffer: IndexBufferId,
    ) -> Result<(), RenderError>;

    /// Sets the destination rectangle to `(0, 0, width, height)`.
    fn set_viewport(&self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Switches a fixed-function capability on.
    fn enable_state(&self, state: RenderState) -> Result<(), RenderError>;

    /// Switches a fixed-function capability off.
    fn disable_state(&self, state: RenderState) -> Result<(), RenderError>;

    /// Sets the blend equation operands for all subsequent draws.
    fn set_blend_func(
        &self,
        source: BlendFactor,
        destination: BlendFactor,
    ) -> Result<(), RenderError>;

    /// Sets the per-channel color write mask.
    fn set_color_mask(
        &self,
        red: bool,
        green: bool,
        blue: bool,
        alpha: bool,
    ) -> Result<(), RenderError>;

    /// Sets the depth write mask.
    fn set_depth_mask(&self, mask: bool) -> Result<(), RenderError>;

    /// Sets the stencil write mask.
    fn set_stencil_mask(&self, mask: u32) -> Result<(), RenderError>;

    /// Sets the color-index write mask.
    fn set_index_mask(&self, mask: u32) -> Result<(), RenderError>;

    /// Selects which face set culling removes.
    fn set_cull_face(&self, face: FaceType) -> Result<(), RenderError>;

    /// Sets the depth offset applied to filled polygons.
    fn set_polygon_offset(&self, factor: f32, units: f32) -> Result<(), RenderError>;

    /// Presents the completed frame to the display.
    ///
    /// This is the sole synchronization point with the display's refresh
    /// cadence and may block to honor the configured swap interval.
    fn flip(&self) -> Result<(), RenderError>;
}
