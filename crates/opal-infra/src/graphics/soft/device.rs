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

//! The software implementation of the [`GraphicsDevice`] trait.
//!
//! `SoftDevice` maps the portable handle-based contract onto the raw
//! bind-then-operate driver: every operation resolves its handle to a raw
//! object name, binds it to the relevant slot, operates, restores the slot,
//! and drains the raw error register into a typed error. Resource metadata
//! lives in per-kind tables keyed by the opaque handles, with the handle
//! counters never reusing a live value.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, trace, warn};
use opal_core::{
    AttachmentSlot, BlendFactor, BufferAccess, BufferUsage, ClearFlags, DataType,
    DeviceDescriptor, DeviceError, FaceType, FragmentProgramId, GraphicsDevice, IndexBufferId,
    MappedBuffer, MappedBufferSource, PrimitiveType, RenderError, RenderState,
    RenderTargetDescriptor, RenderTargetId,
    ResourceError, TargetError, TextureId, TextureParams, VertexBufferId, VertexDeclaration,
    VertexDeclarationId, VertexElement, VertexProgramId, MAX_TEXTURE_UNIT_COUNT,
};

use super::context::SoftGraphicsContext;
use super::conversions::{completeness_from_raw, IntoRaw};
use super::raw::{self, BindingSnapshot, RawContext};

#[derive(Debug)]
struct BufferEntry {
    raw_name: u32,
    size: u64, // To track device memory accurately on destruction
}

#[derive(Debug)]
struct TextureEntry {
    raw_name: u32,
    data_size: u64, // To track device memory accurately on destruction
}

#[derive(Debug)]
struct ProgramEntry {
    raw_name: u32,
}

#[derive(Debug)]
struct RenderTargetEntry {
    raw_name: u32,
    /// The owned attachment textures, indexed by [`AttachmentSlot::ALL`]
    /// order. Destroyed together with the target.
    attachments: [Option<TextureId>; 3],
}

#[derive(Debug)]
struct SoftDeviceInternal {
    context: Mutex<SoftGraphicsContext>,

    vertex_buffers: Mutex<HashMap<VertexBufferId, BufferEntry>>,
    index_buffers: Mutex<HashMap<IndexBufferId, BufferEntry>>,
    vertex_declarations: Mutex<HashMap<VertexDeclarationId, VertexDeclaration>>,
    textures: Mutex<HashMap<TextureId, TextureEntry>>,
    vertex_programs: Mutex<HashMap<VertexProgramId, ProgramEntry>>,
    fragment_programs: Mutex<HashMap<FragmentProgramId, ProgramEntry>>,
    render_targets: Mutex<HashMap<RenderTargetId, RenderTargetEntry>>,

    next_vertex_buffer_id: AtomicUsize,
    next_index_buffer_id: AtomicUsize,
    next_declaration_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_vertex_program_id: AtomicUsize,
    next_fragment_program_id: AtomicUsize,
    next_render_target_id: AtomicUsize,

    // Device memory tracking
    memory_allocated_bytes: AtomicUsize,
    memory_peak_bytes: AtomicU64,
}

/// The software graphics device.
///
/// Cloning is cheap and shares the underlying context and resource tables.
#[derive(Debug, Clone)]
pub struct SoftDevice {
    internal: Arc<SoftDeviceInternal>,
}

/// Drains the raw error register, mapping a latched code to a typed error
/// carrying the failed operation's name.
fn check_raw(raw: &mut RawContext, operation: &str) -> Result<(), ResourceError> {
    let code = raw.get_error();
    if code == raw::NO_ERROR {
        Ok(())
    } else {
        Err(ResourceError::BackendError(format!(
            "{operation}: {} (0x{code:04X})",
            raw::error_name(code)
        )))
    }
}

fn validate_initial_data(size: u64, data: Option<&[u8]>) -> Result<(), ResourceError> {
    match data {
        Some(bytes) if bytes.len() as u64 != size => Err(ResourceError::OutOfBounds {
            offset: 0,
            len: bytes.len() as u64,
            capacity: size,
        }),
        _ => Ok(()),
    }
}

/// The device-memory footprint of an upload described by `params`.
fn texture_storage_size(params: &TextureParams) -> u64 {
    match params.format.bytes_per_texel() {
        Some(bytes_per_texel) => {
            params.width as u64 * params.height as u64 * bytes_per_texel as u64
        }
        // Block-compressed formats are sized by their payload.
        None => params.data.map(|bytes| bytes.len() as u64).unwrap_or(0),
    }
}

fn validate_texture_payload(params: &TextureParams) -> Result<(), ResourceError> {
    if let (Some(bytes), Some(bytes_per_texel)) = (params.data, params.format.bytes_per_texel()) {
        let expected = params.width as u64 * params.height as u64 * bytes_per_texel as u64;
        if bytes.len() as u64 != expected {
            return Err(ResourceError::OutOfBounds {
                offset: 0,
                len: bytes.len() as u64,
                capacity: expected,
            });
        }
    }
    Ok(())
}

/// Configures sampling and uploads the payload for `name`, restoring the unit
/// 0 binding afterwards.
///
/// Uncompressed formats upload the full image at the requested mip level.
/// Block-compressed formats upload only a non-empty payload; an absent or
/// empty payload reserves storage without defining its content.
fn upload_texture(
    raw: &mut RawContext,
    name: u32,
    params: &TextureParams,
) -> Result<(), ResourceError> {
    raw.active_texture(0);
    raw.bind_texture(name);
    raw.tex_parameter(raw::TEXTURE_MIN_FILTER, params.min_filter.into_raw());
    raw.tex_parameter(raw::TEXTURE_MAG_FILTER, params.mag_filter.into_raw());
    raw.tex_parameter(raw::TEXTURE_WRAP_S, params.u_wrap.into_raw());
    raw.tex_parameter(raw::TEXTURE_WRAP_T, params.v_wrap.into_raw());

    let format = params.format.into_raw();
    if params.format.is_compressed() {
        match params.data {
            Some(bytes) if !bytes.is_empty() => {
                raw.compressed_tex_image_2d(params.mip_level, format, params.width, params.height, bytes);
            }
            _ => raw.reserve_compressed_storage(format, params.width, params.height),
        }
    } else {
        raw.tex_image_2d(params.mip_level, format, params.width, params.height, params.data);
    }

    raw.bind_texture(0);
    check_raw(raw, "upload_texture")
}

fn slot_index(slot: AttachmentSlot) -> usize {
    match slot {
        AttachmentSlot::Color => 0,
        AttachmentSlot::Depth => 1,
        AttachmentSlot::Stencil => 2,
    }
}

impl SoftDevice {
    /// Creates the device and its logical context.
    ///
    /// ## Errors
    /// See [`SoftGraphicsContext::new`]; creation failures are recoverable
    /// and leave no device live.
    pub fn new(descriptor: &DeviceDescriptor) -> Result<Self, DeviceError> {
        let context = SoftGraphicsContext::new(descriptor)?;
        info!(
            "SoftDevice created: surface {}x{}",
            context.display_width(),
            context.display_height()
        );
        Ok(Self {
            internal: Arc::new(SoftDeviceInternal {
                context: Mutex::new(context),
                vertex_buffers: Mutex::new(HashMap::new()),
                index_buffers: Mutex::new(HashMap::new()),
                vertex_declarations: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                vertex_programs: Mutex::new(HashMap::new()),
                fragment_programs: Mutex::new(HashMap::new()),
                render_targets: Mutex::new(HashMap::new()),
                next_vertex_buffer_id: AtomicUsize::new(1),
                next_index_buffer_id: AtomicUsize::new(1),
                next_declaration_id: AtomicUsize::new(1),
                next_texture_id: AtomicUsize::new(1),
                next_vertex_program_id: AtomicUsize::new(1),
                next_fragment_program_id: AtomicUsize::new(1),
                next_render_target_id: AtomicUsize::new(1),
                memory_allocated_bytes: AtomicUsize::new(0),
                memory_peak_bytes: AtomicU64::new(0),
            }),
        })
    }

    fn lock_context(&self) -> Result<MutexGuard<'_, SoftGraphicsContext>, ResourceError> {
        self.internal
            .context
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (context): {e}")))
    }

    fn track_allocation(&self, bytes: u64) {
        self.internal
            .memory_allocated_bytes
            .fetch_add(bytes as usize, Ordering::Relaxed);
        let current = self.internal.memory_allocated_bytes.load(Ordering::Relaxed) as u64;
        self.internal
            .memory_peak_bytes
            .fetch_max(current, Ordering::Relaxed);
    }

    fn track_release(&self, bytes: u64) {
        self.internal
            .memory_allocated_bytes
            .fetch_sub(bytes as usize, Ordering::Relaxed);
    }

    fn vertex_buffer_name(&self, id: VertexBufferId) -> Result<u32, ResourceError> {
        let buffers = self.internal.vertex_buffers.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (vertex_buffers): {e}"))
        })?;
        buffers
            .get(&id)
            .map(|entry| entry.raw_name)
            .ok_or(ResourceError::InvalidHandle)
    }

    fn index_buffer_name(&self, id: IndexBufferId) -> Result<u32, ResourceError> {
        let buffers = self.internal.index_buffers.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
        })?;
        buffers
            .get(&id)
            .map(|entry| entry.raw_name)
            .ok_or(ResourceError::InvalidHandle)
    }

    fn texture_name(&self, id: TextureId) -> Result<u32, ResourceError> {
        let textures = self
            .internal
            .textures
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (textures): {e}")))?;
        textures
            .get(&id)
            .map(|entry| entry.raw_name)
            .ok_or(ResourceError::InvalidHandle)
    }

    /// Creates and fills a raw buffer object, leaving the target unbound.
    fn create_buffer_object(
        &self,
        target: u32,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<BufferEntry, ResourceError> {
        validate_initial_data(size, data)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        let name = raw.gen_buffer();
        raw.bind_buffer(target, name);
        raw.buffer_data(target, size, data, usage.into_raw());
        raw.bind_buffer(target, 0);
        check_raw(raw, "buffer_data")?;
        drop(ctx);
        self.track_allocation(size);
        Ok(BufferEntry {
            raw_name: name,
            size,
        })
    }

    /// Reallocates a raw buffer object's storage.
    fn update_buffer_object(
        &self,
        target: u32,
        name: u32,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        validate_initial_data(size, data)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_buffer(target, name);
        raw.buffer_data(target, size, data, usage.into_raw());
        raw.bind_buffer(target, 0);
        check_raw(raw, "buffer_data")
    }

    /// Overwrites a sub-range of a raw buffer object.
    fn update_buffer_sub_range(
        &self,
        target: u32,
        name: u32,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_buffer(target, name);
        raw.buffer_sub_data(target, offset, data);
        raw.bind_buffer(target, 0);
        check_raw(raw, "buffer_sub_data")
    }

    /// Resolves a mapping token's source to its raw target and object name.
    fn resolve_mapping_source(
        &self,
        source: MappedBufferSource,
    ) -> Result<(u32, u32), ResourceError> {
        match source {
            MappedBufferSource::Vertex(id) => {
                Ok((raw::ARRAY_BUFFER, self.vertex_buffer_name(id)?))
            }
            MappedBufferSource::Index(id) => {
                Ok((raw::ELEMENT_ARRAY_BUFFER, self.index_buffer_name(id)?))
            }
        }
    }

    /// Opens a mapping over a raw buffer object.
    fn map_buffer_object(
        &self,
        source: MappedBufferSource,
        target: u32,
        name: u32,
        access: BufferAccess,
    ) -> Result<MappedBuffer, ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        if raw.buffer_is_mapped(name) {
            return Err(ResourceError::AlreadyMapped);
        }
        raw.bind_buffer(target, name);
        let snapshot = raw.map_buffer(target, access.into_raw());
        raw.bind_buffer(target, 0);
        check_raw(raw, "map_buffer")?;
        let bytes = snapshot.ok_or_else(|| {
            ResourceError::BackendError("map_buffer returned no data".to_string())
        })?;
        Ok(MappedBuffer::new(source, bytes, access))
    }

    /// Closes a mapping over a raw buffer object and commits writable bytes.
    ///
    /// The token must have been opened over `expected`. A token from another
    /// buffer commits nothing; its own mapping is closed with the pending
    /// writes discarded, so the source buffer does not stay mapped with no
    /// token left to close it.
    fn unmap_buffer_object(
        &self,
        expected: MappedBufferSource,
        mapping: MappedBuffer,
    ) -> Result<bool, ResourceError> {
        let source = mapping.source();
        if source != expected {
            warn!(
                "Unmap called with a mapping token from a different buffer \
                 (token: {source:?}, unmapping: {expected:?})"
            );
            if let Ok((target, name)) = self.resolve_mapping_source(source) {
                let mut ctx = self.lock_context()?;
                let raw = ctx.raw_mut();
                raw.bind_buffer(target, name);
                raw.unmap_buffer(target, None);
                raw.bind_buffer(target, 0);
                check_raw(raw, "unmap_buffer")?;
            }
            return Err(ResourceError::MappingMismatch);
        }
        let (target, name) = self.resolve_mapping_source(source)?;
        let (bytes, access) = mapping.into_parts();
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_buffer(target, name);
        let write_back = access.is_writable().then_some(bytes.as_slice());
        let committed = raw.unmap_buffer(target, write_back);
        raw.bind_buffer(target, 0);
        check_raw(raw, "unmap_buffer")?;
        if !committed {
            warn!("Buffer mapping was invalidated while open; contents are undefined");
        }
        Ok(committed)
    }

    fn create_program_object(&self, target: u32, blob: &[u8]) -> Result<u32, ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        let name = raw.gen_program(target);
        raw.bind_program(target, name);
        raw.program_string(target, blob);
        raw.bind_program(target, 0);
        check_raw(raw, "program_string")?;
        Ok(name)
    }

    fn destroy_program_object(&self, name: u32) -> Result<(), ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.delete_program(name);
        check_raw(raw, "delete_program")
    }

    fn load_constants(
        &self,
        target: u32,
        base_register: u32,
        vectors: &[[f32; 4]],
    ) -> Result<(), ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        for (i, vector) in vectors.iter().enumerate() {
            raw.program_local_parameter(target, base_register + i as u32, *vector);
        }
        check_raw(raw, "program_local_parameter")
    }

    fn destroy_attachments(&self, attachments: &[Option<TextureId>; 3]) {
        for id in attachments.iter().flatten() {
            if let Err(err) = self.destroy_texture(*id) {
                warn!("Failed to destroy render target attachment {id:?}: {err}");
            }
        }
    }

    // --- Introspection ---

    /// A snapshot of every raw bind point, for asserting binding neutrality.
    pub fn binding_snapshot(&self) -> BindingSnapshot {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.raw().binding_snapshot())
            .unwrap_or(BindingSnapshot {
                array_buffer: 0,
                element_array_buffer: 0,
                framebuffer: 0,
                active_texture_unit: 0,
                texture_unit_0: 0,
            })
    }

    /// The number of frames presented by [`GraphicsDevice::flip`].
    pub fn frames_presented(&self) -> u64 {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.raw().frames_presented())
            .unwrap_or(0)
    }

    /// The number of draw calls issued so far.
    pub fn draw_call_count(&self) -> u64 {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.raw().draw_calls())
            .unwrap_or(0)
    }

    /// The device memory currently attributed to live resources, in bytes.
    pub fn memory_in_use(&self) -> u64 {
        self.internal.memory_allocated_bytes.load(Ordering::Relaxed) as u64
    }

    /// The high-water mark of [`memory_in_use`](SoftDevice::memory_in_use).
    pub fn memory_peak(&self) -> u64 {
        self.internal.memory_peak_bytes.load(Ordering::Relaxed)
    }

    /// The clear color most recently latched by [`GraphicsDevice::clear`],
    /// in the backend's normalized floating point range.
    pub fn clear_color(&self) -> [f32; 4] {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.raw().clear_color_value())
            .unwrap_or([0.0; 4])
    }

    /// The number of live textures, including render-target-owned ones.
    pub fn live_texture_count(&self) -> usize {
        self.internal
            .textures
            .lock()
            .map(|textures| textures.len())
            .unwrap_or(0)
    }

    /// Marks every open buffer mapping as invalidated, as a context loss
    /// would. The matching unmap then reports `Ok(false)`.
    pub fn simulate_context_loss(&self) {
        if let Ok(mut ctx) = self.internal.context.lock() {
            ctx.raw_mut().invalidate_open_mappings();
        }
    }
}

impl GraphicsDevice for SoftDevice {
    // --- Device/Context Operations ---

    fn window_width(&self) -> u32 {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.display_width())
            .unwrap_or(0)
    }

    fn window_height(&self) -> u32 {
        self.internal
            .context
            .lock()
            .map(|ctx| ctx.display_height())
            .unwrap_or(0)
    }

    // --- Vertex Buffer Operations ---

    fn create_vertex_buffer(
        &self,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<VertexBufferId, ResourceError> {
        let entry = self.create_buffer_object(raw::ARRAY_BUFFER, size, data, usage)?;
        let id = VertexBufferId(
            self.internal
                .next_vertex_buffer_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .vertex_buffers
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_buffers): {e}"))
            })?
            .insert(id, entry);
        debug!("SoftDevice: Created vertex buffer {id:?} ({size} bytes, {usage:?})");
        Ok(id)
    }

    fn set_vertex_buffer_data(
        &self,
        id: VertexBufferId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        let name = self.vertex_buffer_name(id)?;
        self.update_buffer_object(raw::ARRAY_BUFFER, name, size, data, usage)?;
        let mut buffers = self.internal.vertex_buffers.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (vertex_buffers): {e}"))
        })?;
        if let Some(entry) = buffers.get_mut(&id) {
            let old_size = entry.size;
            entry.size = size;
            drop(buffers);
            self.track_release(old_size);
            self.track_allocation(size);
        }
        Ok(())
    }

    fn set_vertex_buffer_sub_data(
        &self,
        id: VertexBufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let (name, capacity) = {
            let buffers = self.internal.vertex_buffers.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_buffers): {e}"))
            })?;
            let entry = buffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
            (entry.raw_name, entry.size)
        };
        // checked_add so an offset near u64::MAX reports out of bounds
        // instead of wrapping past the capacity check.
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > capacity) {
            return Err(ResourceError::OutOfBounds {
                offset,
                len: data.len() as u64,
                capacity,
            });
        }
        self.update_buffer_sub_range(raw::ARRAY_BUFFER, name, offset, data)
    }

    fn map_vertex_buffer(
        &self,
        id: VertexBufferId,
        access: BufferAccess,
    ) -> Result<MappedBuffer, ResourceError> {
        let name = self.vertex_buffer_name(id)?;
        self.map_buffer_object(MappedBufferSource::Vertex(id), raw::ARRAY_BUFFER, name, access)
    }

    fn unmap_vertex_buffer(
        &self,
        id: VertexBufferId,
        mapping: MappedBuffer,
    ) -> Result<bool, ResourceError> {
        self.vertex_buffer_name(id)?;
        self.unmap_buffer_object(MappedBufferSource::Vertex(id), mapping)
    }

    fn destroy_vertex_buffer(&self, id: VertexBufferId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .vertex_buffers
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_buffers): {e}"))
            })?
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.delete_buffer(entry.raw_name);
        check_raw(raw, "delete_buffer")?;
        drop(ctx);
        self.track_release(entry.size);
        debug!("SoftDevice: Destroyed vertex buffer {id:?}");
        Ok(())
    }

    // --- Index Buffer Operations ---

    fn create_index_buffer(
        &self,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<IndexBufferId, ResourceError> {
        let entry = self.create_buffer_object(raw::ELEMENT_ARRAY_BUFFER, size, data, usage)?;
        let id = IndexBufferId(
            self.internal
                .next_index_buffer_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .index_buffers
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
            })?
            .insert(id, entry);
        debug!("SoftDevice: Created index buffer {id:?} ({size} bytes, {usage:?})");
        Ok(id)
    }

    fn set_index_buffer_data(
        &self,
        id: IndexBufferId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        let name = self.index_buffer_name(id)?;
        self.update_buffer_object(raw::ELEMENT_ARRAY_BUFFER, name, size, data, usage)?;
        let mut buffers = self.internal.index_buffers.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
        })?;
        if let Some(entry) = buffers.get_mut(&id) {
            let old_size = entry.size;
            entry.size = size;
            drop(buffers);
            self.track_release(old_size);
            self.track_allocation(size);
        }
        Ok(())
    }

    fn set_index_buffer_sub_data(
        &self,
        id: IndexBufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let (name, capacity) = {
            let buffers = self.internal.index_buffers.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
            })?;
            let entry = buffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
            (entry.raw_name, entry.size)
        };
        // checked_add so an offset near u64::MAX reports out of bounds
        // instead of wrapping past the capacity check.
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > capacity) {
            return Err(ResourceError::OutOfBounds {
                offset,
                len: data.len() as u64,
                capacity,
            });
        }
        self.update_buffer_sub_range(raw::ELEMENT_ARRAY_BUFFER, name, offset, data)
    }

    fn map_index_buffer(
        &self,
        id: IndexBufferId,
        access: BufferAccess,
    ) -> Result<MappedBuffer, ResourceError> {
        let name = self.index_buffer_name(id)?;
        self.map_buffer_object(
            MappedBufferSource::Index(id),
            raw::ELEMENT_ARRAY_BUFFER,
            name,
            access,
        )
    }

    fn unmap_index_buffer(
        &self,
        id: IndexBufferId,
        mapping: MappedBuffer,
    ) -> Result<bool, ResourceError> {
        self.index_buffer_name(id)?;
        self.unmap_buffer_object(MappedBufferSource::Index(id), mapping)
    }

    fn destroy_index_buffer(&self, id: IndexBufferId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .index_buffers
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
            })?
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.delete_buffer(entry.raw_name);
        check_raw(raw, "delete_buffer")?;
        drop(ctx);
        self.track_release(entry.size);
        debug!("SoftDevice: Destroyed index buffer {id:?}");
        Ok(())
    }

    // --- Vertex Declaration Operations ---

    fn create_vertex_declaration(
        &self,
        elements: &[VertexElement],
    ) -> Result<VertexDeclarationId, ResourceError> {
        let declaration = VertexDeclaration::new(elements)?;
        let id = VertexDeclarationId(
            self.internal
                .next_declaration_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .vertex_declarations
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_declarations): {e}"))
            })?
            .insert(id, declaration);
        debug!(
            "SoftDevice: Created vertex declaration {id:?} ({} streams)",
            elements.len()
        );
        Ok(id)
    }

    fn vertex_declaration(
        &self,
        id: VertexDeclarationId,
    ) -> Result<VertexDeclaration, ResourceError> {
        let declarations = self.internal.vertex_declarations.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (vertex_declarations): {e}"))
        })?;
        declarations
            .get(&id)
            .cloned()
            .ok_or(ResourceError::InvalidHandle)
    }

    fn enable_vertex_declaration(
        &self,
        declaration: VertexDeclarationId,
        buffer: VertexBufferId,
    ) -> Result<(), ResourceError> {
        let layout = self.vertex_declaration(declaration)?;
        let name = self.vertex_buffer_name(buffer)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        // The buffer stays bound while the declaration is enabled; the
        // matching disable restores both bindings to none.
        raw.bind_buffer(raw::ARRAY_BUFFER, name);
        for stream in layout.streams() {
            raw.enable_vertex_attrib_array(stream.index);
            raw.vertex_attrib_pointer(
                stream.index,
                stream.size,
                stream.data_type.into_raw(),
                layout.stride(),
                stream.offset as u64,
            );
        }
        if let Err(err) = check_raw(raw, "enable_vertex_declaration") {
            raw.bind_buffer(raw::ARRAY_BUFFER, 0);
            return Err(err);
        }
        Ok(())
    }

    fn disable_vertex_declaration(
        &self,
        declaration: VertexDeclarationId,
    ) -> Result<(), ResourceError> {
        let layout = self.vertex_declaration(declaration)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        for stream in layout.streams() {
            raw.disable_vertex_attrib_array(stream.index);
        }
        raw.bind_buffer(raw::ARRAY_BUFFER, 0);
        raw.bind_buffer(raw::ELEMENT_ARRAY_BUFFER, 0);
        check_raw(raw, "disable_vertex_declaration")
    }

    fn destroy_vertex_declaration(&self, id: VertexDeclarationId) -> Result<(), ResourceError> {
        self.internal
            .vertex_declarations
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_declarations): {e}"))
            })?
            .remove(&id)
            .map(|_| debug!("SoftDevice: Destroyed vertex declaration {id:?}"))
            .ok_or(ResourceError::InvalidHandle)
    }

    fn set_vertex_stream(
        &self,
        stream: u32,
        size: u32,
        data_type: DataType,
        stride: u32,
        buffer: VertexBufferId,
        offset: u64,
    ) -> Result<(), ResourceError> {
        let name = self.vertex_buffer_name(buffer)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_buffer(raw::ARRAY_BUFFER, name);
        raw.enable_vertex_attrib_array(stream);
        raw.vertex_attrib_pointer(stream, size, data_type.into_raw(), stride, offset);
        raw.bind_buffer(raw::ARRAY_BUFFER, 0);
        check_raw(raw, "set_vertex_stream")
    }

    fn disable_vertex_stream(&self, stream: u32) -> Result<(), ResourceError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.disable_vertex_attrib_array(stream);
        check_raw(raw, "disable_vertex_stream")
    }

    // --- Texture Operations ---

    fn create_texture(&self, params: &TextureParams) -> Result<TextureId, ResourceError> {
        validate_texture_payload(params)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        let name = raw.gen_texture();
        if let Err(err) = upload_texture(raw, name, params) {
            raw.delete_texture(name);
            let _ = raw.get_error();
            return Err(err);
        }
        drop(ctx);

        let data_size = texture_storage_size(params);
        let id = TextureId(self.internal.next_texture_id.fetch_add(1, Ordering::Relaxed));
        self.internal
            .textures
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (textures): {e}")))?
            .insert(
                id,
                TextureEntry {
                    raw_name: name,
                    data_size,
                },
            );
        self.track_allocation(data_size);
        debug!(
            "SoftDevice: Created texture {id:?} ({}x{}, {:?})",
            params.width, params.height, params.format
        );
        Ok(id)
    }

    fn set_texture(&self, id: TextureId, params: &TextureParams) -> Result<(), ResourceError> {
        validate_texture_payload(params)?;
        let name = self.texture_name(id)?;
        let mut ctx = self.lock_context()?;
        upload_texture(ctx.raw_mut(), name, params)?;
        drop(ctx);

        let new_size = texture_storage_size(params);
        let mut textures = self
            .internal
            .textures
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (textures): {e}")))?;
        if let Some(entry) = textures.get_mut(&id) {
            let old_size = entry.data_size;
            entry.data_size = new_size;
            drop(textures);
            self.track_release(old_size);
            self.track_allocation(new_size);
        }
        Ok(())
    }

    fn set_texture_unit(
        &self,
        unit: u32,
        texture: Option<TextureId>,
    ) -> Result<(), ResourceError> {
        if unit >= MAX_TEXTURE_UNIT_COUNT {
            return Err(ResourceError::InvalidTextureUnit { unit });
        }
        let name = match texture {
            Some(id) => self.texture_name(id)?,
            None => 0,
        };
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.active_texture(unit);
        raw.bind_texture(name);
        raw.active_texture(0);
        check_raw(raw, "set_texture_unit")
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .textures
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (textures): {e}")))?
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.delete_texture(entry.raw_name);
        check_raw(raw, "delete_texture")?;
        drop(ctx);
        self.track_release(entry.data_size);
        debug!("SoftDevice: Destroyed texture {id:?}");
        Ok(())
    }

    // --- Program Operations ---

    fn create_vertex_program(&self, blob: &[u8]) -> Result<VertexProgramId, ResourceError> {
        let name = self.create_program_object(raw::VERTEX_PROGRAM, blob)?;
        let id = VertexProgramId(
            self.internal
                .next_vertex_program_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .vertex_programs
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_programs): {e}"))
            })?
            .insert(id, ProgramEntry { raw_name: name });
        debug!(
            "SoftDevice: Created vertex program {id:?} ({} bytes)",
            blob.len()
        );
        Ok(id)
    }

    fn create_fragment_program(&self, blob: &[u8]) -> Result<FragmentProgramId, ResourceError> {
        let name = self.create_program_object(raw::FRAGMENT_PROGRAM, blob)?;
        let id = FragmentProgramId(
            self.internal
                .next_fragment_program_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .fragment_programs
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (fragment_programs): {e}"))
            })?
            .insert(id, ProgramEntry { raw_name: name });
        debug!(
            "SoftDevice: Created fragment program {id:?} ({} bytes)",
            blob.len()
        );
        Ok(id)
    }

    fn set_vertex_program(&self, id: VertexProgramId) -> Result<(), ResourceError> {
        let name = {
            let programs = self.internal.vertex_programs.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_programs): {e}"))
            })?;
            programs
                .get(&id)
                .map(|entry| entry.raw_name)
                .ok_or(ResourceError::InvalidHandle)?
        };
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        // The program stays active until the next activation replaces it.
        raw.bind_program(raw::VERTEX_PROGRAM, name);
        check_raw(raw, "set_vertex_program")
    }

    fn set_fragment_program(&self, id: FragmentProgramId) -> Result<(), ResourceError> {
        let name = {
            let programs = self.internal.fragment_programs.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (fragment_programs): {e}"))
            })?;
            programs
                .get(&id)
                .map(|entry| entry.raw_name)
                .ok_or(ResourceError::InvalidHandle)?
        };
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_program(raw::FRAGMENT_PROGRAM, name);
        check_raw(raw, "set_fragment_program")
    }

    fn set_vertex_constant_block(
        &self,
        base_register: u32,
        vectors: &[[f32; 4]],
    ) -> Result<(), ResourceError> {
        self.load_constants(raw::VERTEX_PROGRAM, base_register, vectors)
    }

    fn set_fragment_constant(
        &self,
        base_register: u32,
        vector: [f32; 4],
    ) -> Result<(), ResourceError> {
        self.load_constants(raw::FRAGMENT_PROGRAM, base_register, &[vector])
    }

    fn set_fragment_constant_block(
        &self,
        base_register: u32,
        vectors: &[[f32; 4]],
    ) -> Result<(), ResourceError> {
        self.load_constants(raw::FRAGMENT_PROGRAM, base_register, vectors)
    }

    fn destroy_vertex_program(&self, id: VertexProgramId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .vertex_programs
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (vertex_programs): {e}"))
            })?
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        self.destroy_program_object(entry.raw_name)?;
        debug!("SoftDevice: Destroyed vertex program {id:?}");
        Ok(())
    }

    fn destroy_fragment_program(&self, id: FragmentProgramId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .fragment_programs
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (fragment_programs): {e}"))
            })?
            .remove(&id)
            .ok_or(ResourceError::InvalidHandle)?;
        self.destroy_program_object(entry.raw_name)?;
        debug!("SoftDevice: Destroyed fragment program {id:?}");
        Ok(())
    }

    // --- Render Target Operations ---

    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, TargetError> {
        // Create the owned attachment textures first; unwind them if any
        // later step fails.
        let mut attachments: [Option<TextureId>; 3] = [None; 3];
        for slot in AttachmentSlot::ALL {
            if let Some(params) = descriptor.attachment(slot) {
                match self.create_texture(params) {
                    Ok(id) => attachments[slot_index(slot)] = Some(id),
                    Err(err) => {
                        self.destroy_attachments(&attachments);
                        return Err(TargetError::Resource(err));
                    }
                }
            }
        }

        let mut names = [0u32; 3];
        {
            let textures = self.internal.textures.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (textures): {e}"))
            })?;
            for (name, id) in names.iter_mut().zip(attachments.iter()) {
                if let Some(id) = id {
                    *name = textures.get(id).map(|entry| entry.raw_name).unwrap_or(0);
                }
            }
        }

        let fb = {
            let mut ctx = match self.lock_context() {
                Ok(ctx) => ctx,
                Err(err) => {
                    self.destroy_attachments(&attachments);
                    return Err(err.into());
                }
            };
            let raw = ctx.raw_mut();
            let fb = raw.gen_framebuffer();
            raw.bind_framebuffer(fb);
            for (slot, name) in AttachmentSlot::ALL.into_iter().zip(names) {
                if name != 0 {
                    raw.framebuffer_texture_2d(slot.into_raw(), name);
                }
            }
            // No color attachment makes this a write-only depth/stencil
            // target.
            if attachments[0].is_none() {
                raw.draw_buffer_none();
            }
            let status = raw.check_framebuffer_status();
            raw.bind_framebuffer(0);

            if let Err(err) = check_raw(raw, "create_render_target") {
                raw.delete_framebuffer(fb);
                let _ = raw.get_error();
                drop(ctx);
                self.destroy_attachments(&attachments);
                return Err(err.into());
            }
            if status != raw::FRAMEBUFFER_COMPLETE {
                raw.delete_framebuffer(fb);
                drop(ctx);
                self.destroy_attachments(&attachments);
                return Err(TargetError::Incomplete(completeness_from_raw(status)));
            }
            fb
        };

        let id = RenderTargetId(
            self.internal
                .next_render_target_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.internal
            .render_targets
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (render_targets): {e}"))
            })?
            .insert(
                id,
                RenderTargetEntry {
                    raw_name: fb,
                    attachments,
                },
            );
        info!(
            "SoftDevice: Created render target {id:?} (color: {}, depth: {}, stencil: {})",
            attachments[0].is_some(),
            attachments[1].is_some(),
            attachments[2].is_some()
        );
        Ok(id)
    }

    fn enable_render_target(&self, target: RenderTargetId) -> Result<(), TargetError> {
        let name = {
            let targets = self.internal.render_targets.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (render_targets): {e}"))
            })?;
            targets
                .get(&target)
                .map(|entry| entry.raw_name)
                .ok_or(ResourceError::InvalidHandle)?
        };
        let mut ctx = self.lock_context().map_err(TargetError::Resource)?;
        let raw = ctx.raw_mut();
        raw.bind_framebuffer(name);
        let status = raw.check_framebuffer_status();
        if status != raw::FRAMEBUFFER_COMPLETE {
            // Restore the default surface rather than leaving an unusable
            // destination bound.
            raw.bind_framebuffer(0);
            return Err(TargetError::Incomplete(completeness_from_raw(status)));
        }
        check_raw(raw, "enable_render_target").map_err(TargetError::Resource)
    }

    fn disable_render_target(&self) -> Result<(), TargetError> {
        let mut ctx = self.lock_context().map_err(TargetError::Resource)?;
        let raw = ctx.raw_mut();
        raw.bind_framebuffer(0);
        check_raw(raw, "disable_render_target").map_err(TargetError::Resource)
    }

    fn render_target_texture(
        &self,
        target: RenderTargetId,
        slot: AttachmentSlot,
    ) -> Result<TextureId, ResourceError> {
        let targets = self.internal.render_targets.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned (render_targets): {e}"))
        })?;
        targets
            .get(&target)
            .and_then(|entry| entry.attachments[slot_index(slot)])
            .ok_or(ResourceError::InvalidHandle)
    }

    fn destroy_render_target(&self, target: RenderTargetId) -> Result<(), ResourceError> {
        let entry = self
            .internal
            .render_targets
            .lock()
            .map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (render_targets): {e}"))
            })?
            .remove(&target)
            .ok_or(ResourceError::InvalidHandle)?;
        {
            let mut ctx = self.lock_context()?;
            let raw = ctx.raw_mut();
            raw.delete_framebuffer(entry.raw_name);
            check_raw(raw, "delete_framebuffer")?;
        }
        self.destroy_attachments(&entry.attachments);
        debug!("SoftDevice: Destroyed render target {target:?}");
        Ok(())
    }

    // --- State/Draw Operations ---

    fn clear(
        &self,
        flags: ClearFlags,
        red: u8,
        green: u8,
        blue: u8,
        alpha: u8,
        depth: f32,
        stencil: u32,
    ) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.clear_color(
            f32::from(red) / 255.0,
            f32::from(green) / 255.0,
            f32::from(blue) / 255.0,
            f32::from(alpha) / 255.0,
        );
        raw.clear_depth(depth);
        raw.clear_stencil(stencil);
        raw.clear(flags.into_raw());
        check_raw(raw, "clear")?;
        Ok(())
    }

    fn draw(&self, primitive: PrimitiveType, first: u32, count: u32) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.draw_arrays(primitive.into_raw(), first, count);
        check_raw(raw, "draw_arrays")?;
        Ok(())
    }

    fn draw_elements(
        &self,
        primitive: PrimitiveType,
        count: u32,
        index_type: DataType,
        indices: &[u8],
    ) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.draw_elements(primitive.into_raw(), count, index_type.into_raw(), indices);
        check_raw(raw, "draw_elements")?;
        Ok(())
    }

    fn draw_range_elements(
        &self,
        primitive: PrimitiveType,
        start: u32,
        primitive_count: u32,
        index_type: DataType,
        index_buffer: IndexBufferId,
    ) -> Result<(), RenderError> {
        let (name, capacity) = {
            let buffers = self.internal.index_buffers.lock().map_err(|e| {
                ResourceError::BackendError(format!("Mutex poisoned (index_buffers): {e}"))
            })?;
            let entry = buffers
                .get(&index_buffer)
                .ok_or(ResourceError::InvalidHandle)?;
            (entry.raw_name, entry.size)
        };
        // The index count follows the topology, not a fixed triangle factor.
        // It is derived in u64 so even a u32::MAX primitive count yields a
        // range that can be validated instead of wrapping.
        let index_count = primitive.index_count(primitive_count);
        let type_size = raw::type_byte_size(index_type.into_raw());
        let offset = u64::from(start) * type_size;
        let len = index_count * type_size;
        if index_count > u64::from(u32::MAX) || offset.saturating_add(len) > capacity {
            return Err(ResourceError::OutOfBounds {
                offset,
                len,
                capacity,
            }
            .into());
        }
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.bind_buffer(raw::ELEMENT_ARRAY_BUFFER, name);
        raw.draw_range_elements(
            primitive.into_raw(),
            start,
            index_count as u32,
            index_type.into_raw(),
        );
        raw.bind_buffer(raw::ELEMENT_ARRAY_BUFFER, 0);
        check_raw(raw, "draw_range_elements")?;
        Ok(())
    }

    fn set_viewport(&self, width: u32, height: u32) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.viewport(width, height);
        check_raw(raw, "viewport")?;
        Ok(())
    }

    fn enable_state(&self, state: RenderState) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.enable(state.into_raw());
        check_raw(raw, "enable")?;
        Ok(())
    }

    fn disable_state(&self, state: RenderState) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.disable(state.into_raw());
        check_raw(raw, "disable")?;
        Ok(())
    }

    fn set_blend_func(
        &self,
        source: BlendFactor,
        destination: BlendFactor,
    ) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.blend_func(source.into_raw(), destination.into_raw());
        check_raw(raw, "blend_func")?;
        Ok(())
    }

    fn set_color_mask(
        &self,
        red: bool,
        green: bool,
        blue: bool,
        alpha: bool,
    ) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        ctx.raw_mut().color_mask(red, green, blue, alpha);
        Ok(())
    }

    fn set_depth_mask(&self, mask: bool) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        ctx.raw_mut().depth_mask(mask);
        Ok(())
    }

    fn set_stencil_mask(&self, mask: u32) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        ctx.raw_mut().stencil_mask(mask);
        Ok(())
    }

    fn set_index_mask(&self, mask: u32) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        ctx.raw_mut().index_mask(mask);
        Ok(())
    }

    fn set_cull_face(&self, face: FaceType) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let raw = ctx.raw_mut();
        raw.cull_face(face.into_raw());
        check_raw(raw, "cull_face")?;
        Ok(())
    }

    fn set_polygon_offset(&self, factor: f32, units: f32) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        ctx.raw_mut().polygon_offset(factor, units);
        Ok(())
    }

    fn flip(&self) -> Result<(), RenderError> {
        let mut ctx = self.lock_context()?;
        let interval = ctx.swap_interval();
        ctx.raw_mut().swap_buffers();
        trace!("SoftDevice: Presented frame (swap_interval={interval})");
        Ok(())
    }
}
