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

//! The raw layer of the software backend.
//!
//! This module emulates a bind-then-operate native driver in process memory:
//! objects are referenced by non-zero `u32` names, operations implicitly
//! target whatever is bound to the relevant bind point, the first failure is
//! latched in a sticky error register until read with [`RawContext::get_error`],
//! and framebuffer usability is a queryable status. Name `0` always means
//! "nothing bound".
//!
//! The layer above never lets raw errors accumulate: it reads the error
//! register after every mutating call.

use std::collections::HashMap;

// Bind targets.
pub const ARRAY_BUFFER: u32 = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

// Buffer usage hints.
pub const STREAM_DRAW: u32 = 0x88E0;
pub const STATIC_DRAW: u32 = 0x88E4;
pub const DYNAMIC_DRAW: u32 = 0x88E8;

// Map access modes.
pub const READ_ONLY: u32 = 0x88B8;
pub const WRITE_ONLY: u32 = 0x88B9;
pub const READ_WRITE: u32 = 0x88BA;

// Error register values.
pub const NO_ERROR: u32 = 0;
pub const INVALID_ENUM: u32 = 0x0500;
pub const INVALID_VALUE: u32 = 0x0501;
pub const INVALID_OPERATION: u32 = 0x0502;

// Scalar types.
pub const BYTE: u32 = 0x1400;
pub const UNSIGNED_BYTE: u32 = 0x1401;
pub const SHORT: u32 = 0x1402;
pub const UNSIGNED_SHORT: u32 = 0x1403;
pub const INT: u32 = 0x1404;
pub const UNSIGNED_INT: u32 = 0x1405;
pub const FLOAT: u32 = 0x1406;

// Texel formats.
pub const LUMINANCE: u32 = 0x1909;
pub const RGB: u32 = 0x1907;
pub const RGBA: u32 = 0x1908;
pub const DEPTH_COMPONENT: u32 = 0x1902;
pub const COMPRESSED_RGB_DXT1: u32 = 0x83F0;
pub const COMPRESSED_RGBA_DXT1: u32 = 0x83F1;
pub const COMPRESSED_RGBA_DXT3: u32 = 0x83F2;
pub const COMPRESSED_RGBA_DXT5: u32 = 0x83F3;

// Texture parameters.
pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
pub const TEXTURE_WRAP_S: u32 = 0x2802;
pub const TEXTURE_WRAP_T: u32 = 0x2803;

// Filter values.
pub const NEAREST: u32 = 0x2600;
pub const LINEAR: u32 = 0x2601;
pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;

// Wrap values.
pub const REPEAT: u32 = 0x2901;
pub const CLAMP_TO_EDGE: u32 = 0x812F;
pub const MIRRORED_REPEAT: u32 = 0x8370;
pub const CLAMP_TO_BORDER: u32 = 0x812D;

// Primitive modes.
pub const POINTS: u32 = 0x0000;
pub const LINES: u32 = 0x0001;
pub const LINE_STRIP: u32 = 0x0003;
pub const TRIANGLES: u32 = 0x0004;
pub const TRIANGLE_STRIP: u32 = 0x0005;
pub const TRIANGLE_FAN: u32 = 0x0006;

// Blend factors.
pub const BLEND_ZERO: u32 = 0;
pub const BLEND_ONE: u32 = 1;
pub const SRC_COLOR: u32 = 0x0300;
pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
pub const SRC_ALPHA: u32 = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
pub const DST_ALPHA: u32 = 0x0304;
pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
pub const DST_COLOR: u32 = 0x0306;
pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
pub const SRC_ALPHA_SATURATE: u32 = 0x0308;

// Capabilities.
pub const BLEND: u32 = 0x0BE2;
pub const DEPTH_TEST: u32 = 0x0B71;
pub const STENCIL_TEST: u32 = 0x0B90;
pub const CULL_FACE: u32 = 0x0B44;
pub const ALPHA_TEST: u32 = 0x0BC0;
pub const SCISSOR_TEST: u32 = 0x0C11;
pub const POLYGON_OFFSET_FILL: u32 = 0x8037;

// Face sets.
pub const FRONT: u32 = 0x0404;
pub const BACK: u32 = 0x0405;
pub const FRONT_AND_BACK: u32 = 0x0408;

// Clear mask bits.
pub const DEPTH_BUFFER_BIT: u32 = 0x0100;
pub const STENCIL_BUFFER_BIT: u32 = 0x0400;
pub const COLOR_BUFFER_BIT: u32 = 0x4000;

// Program stage targets.
pub const VERTEX_PROGRAM: u32 = 0x8620;
pub const FRAGMENT_PROGRAM: u32 = 0x8804;

// Framebuffer attachment points.
pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;
pub const DEPTH_ATTACHMENT: u32 = 0x8D00;
pub const STENCIL_ATTACHMENT: u32 = 0x8D20;

// Framebuffer status values.
pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
pub const FRAMEBUFFER_UNDEFINED: u32 = 0x8219;
pub const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
pub const FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;
pub const FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER: u32 = 0x8CDB;
pub const FRAMEBUFFER_INCOMPLETE_READ_BUFFER: u32 = 0x8CDC;
pub const FRAMEBUFFER_UNSUPPORTED: u32 = 0x8CDD;
pub const FRAMEBUFFER_INCOMPLETE_MULTISAMPLE: u32 = 0x8D56;
pub const FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS: u32 = 0x8DA8;

/// The number of texture units.
pub const TEXTURE_UNIT_COUNT: usize = 32;

/// The number of vertex attribute slots.
pub const VERTEX_ATTRIB_COUNT: usize = 16;

/// Returns a diagnostic name for an error register value.
pub fn error_name(code: u32) -> &'static str {
    match code {
        NO_ERROR => "NO_ERROR",
        INVALID_ENUM => "INVALID_ENUM",
        INVALID_VALUE => "INVALID_VALUE",
        INVALID_OPERATION => "INVALID_OPERATION",
        _ => "UNKNOWN",
    }
}

/// The byte size of one scalar of a raw type constant, or 0 for an unknown
/// constant.
pub fn type_byte_size(type_: u32) -> u64 {
    match type_ {
        BYTE | UNSIGNED_BYTE => 1,
        SHORT | UNSIGNED_SHORT => 2,
        INT | UNSIGNED_INT | FLOAT => 4,
        _ => 0,
    }
}

#[derive(Debug)]
struct RawBuffer {
    data: Vec<u8>,
    usage: u32,
    /// Access mode of the open mapping, if one exists.
    mapped_access: Option<u32>,
    /// Set when the open mapping was invalidated (context loss).
    mapping_invalidated: bool,
}

#[derive(Debug, Default)]
struct RawTexture {
    width: u32,
    height: u32,
    internal_format: u32,
    min_filter: u32,
    mag_filter: u32,
    wrap_s: u32,
    wrap_t: u32,
    /// Uploaded payload bytes per mip level. A reserved-but-unuploaded
    /// compressed texture has storage but no level payload.
    levels: HashMap<u32, Vec<u8>>,
    has_storage: bool,
}

#[derive(Debug)]
struct RawProgram {
    target: u32,
    source: Vec<u8>,
}

#[derive(Debug, Default)]
struct RawFramebuffer {
    color: Option<u32>,
    depth: Option<u32>,
    stencil: Option<u32>,
    /// Set when the color draw buffer has been explicitly disabled.
    draw_buffer_disabled: bool,
}

/// One enabled vertex attribute slot's pointer configuration.
#[derive(Debug, Clone, Copy)]
struct RawAttribPointer {
    buffer: u32,
    size: u32,
    type_: u32,
    stride: u32,
    offset: u64,
}

/// A read-only snapshot of every bind point, for asserting that operations
/// leave the context in the neutral state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSnapshot {
    /// The buffer bound to the vertex-data target.
    pub array_buffer: u32,
    /// The buffer bound to the index-data target.
    pub element_array_buffer: u32,
    /// The bound framebuffer.
    pub framebuffer: u32,
    /// The active texture unit.
    pub active_texture_unit: u32,
    /// The texture bound to unit 0.
    pub texture_unit_0: u32,
}

impl BindingSnapshot {
    /// Returns `true` if nothing is bound anywhere.
    pub fn is_neutral(&self) -> bool {
        self.array_buffer == 0
            && self.element_array_buffer == 0
            && self.framebuffer == 0
            && self.active_texture_unit == 0
            && self.texture_unit_0 == 0
    }
}

/// A read-only snapshot of the latched fixed-function pipeline state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSnapshot {
    /// The latched clear depth.
    pub clear_depth: f32,
    /// The latched clear stencil value.
    pub clear_stencil: u32,
    /// The per-channel color write mask.
    pub color_mask: [bool; 4],
    /// The depth write mask.
    pub depth_mask: bool,
    /// The stencil write mask.
    pub stencil_mask: u32,
    /// The color-index write mask.
    pub index_mask: u32,
    /// The culled face set.
    pub cull_face_mode: u32,
    /// The polygon depth offset as `(factor, units)`.
    pub polygon_offset: (f32, f32),
}

/// The emulated native context: object tables, bind points, pipeline state,
/// and the sticky error register.
#[derive(Debug)]
pub struct RawContext {
    error: u32,

    next_name: u32,
    buffers: HashMap<u32, RawBuffer>,
    textures: HashMap<u32, RawTexture>,
    programs: HashMap<u32, RawProgram>,
    framebuffers: HashMap<u32, RawFramebuffer>,

    array_buffer_binding: u32,
    element_array_buffer_binding: u32,
    framebuffer_binding: u32,
    active_texture_unit: u32,
    texture_unit_bindings: [u32; TEXTURE_UNIT_COUNT],
    vertex_program_binding: u32,
    fragment_program_binding: u32,
    attributes: [Option<RawAttribPointer>; VERTEX_ATTRIB_COUNT],
    enabled_caps: Vec<u32>,

    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: u32,
    blend_func: (u32, u32),
    color_mask: [bool; 4],
    depth_mask: bool,
    stencil_mask: u32,
    index_mask: u32,
    cull_face_mode: u32,
    polygon_offset: (f32, f32),
    viewport: (u32, u32),
    program_constants: HashMap<(u32, u32), [f32; 4]>,

    swap_interval: u32,
    frames_presented: u64,
    draw_calls: u64,
}

impl RawContext {
    /// Creates a context whose viewport covers a surface of the given size.
    pub fn new(surface_width: u32, surface_height: u32) -> Self {
        Self {
            error: NO_ERROR,
            next_name: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            framebuffers: HashMap::new(),
            array_buffer_binding: 0,
            element_array_buffer_binding: 0,
            framebuffer_binding: 0,
            active_texture_unit: 0,
            texture_unit_bindings: [0; TEXTURE_UNIT_COUNT],
            vertex_program_binding: 0,
            fragment_program_binding: 0,
            attributes: [None; VERTEX_ATTRIB_COUNT],
            enabled_caps: Vec::new(),
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            blend_func: (BLEND_ONE, BLEND_ZERO),
            color_mask: [true; 4],
            depth_mask: true,
            stencil_mask: !0,
            index_mask: !0,
            cull_face_mode: BACK,
            polygon_offset: (0.0, 0.0),
            viewport: (surface_width, surface_height),
            program_constants: HashMap::new(),
            swap_interval: 0,
            frames_presented: 0,
            draw_calls: 0,
        }
    }

    fn set_error(&mut self, code: u32) {
        // First failure wins; the register is sticky until read.
        if self.error == NO_ERROR {
            self.error = code;
        }
    }

    /// Returns the latched error and clears the register.
    pub fn get_error(&mut self) -> u32 {
        std::mem::replace(&mut self.error, NO_ERROR)
    }

    fn fresh_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    /// Captures the current bind points.
    pub fn binding_snapshot(&self) -> BindingSnapshot {
        BindingSnapshot {
            array_buffer: self.array_buffer_binding,
            element_array_buffer: self.element_array_buffer_binding,
            framebuffer: self.framebuffer_binding,
            active_texture_unit: self.active_texture_unit,
            texture_unit_0: self.texture_unit_bindings[0],
        }
    }

    // --- Buffer objects ---

    /// Allocates a fresh buffer name.
    pub fn gen_buffer(&mut self) -> u32 {
        let name = self.fresh_name();
        self.buffers.insert(
            name,
            RawBuffer {
                data: Vec::new(),
                usage: STATIC_DRAW,
                mapped_access: None,
                mapping_invalidated: false,
            },
        );
        name
    }

    /// Deletes a buffer name. Bind points referencing it reset to 0.
    pub fn delete_buffer(&mut self, name: u32) {
        if self.buffers.remove(&name).is_none() {
            self.set_error(INVALID_VALUE);
            return;
        }
        if self.array_buffer_binding == name {
            self.array_buffer_binding = 0;
        }
        if self.element_array_buffer_binding == name {
            self.element_array_buffer_binding = 0;
        }
    }

    /// Binds `name` (or 0 for nothing) to a buffer target. The target enum is
    /// validated before the name, matching native error precedence.
    pub fn bind_buffer(&mut self, target: u32, name: u32) {
        if !matches!(target, ARRAY_BUFFER | ELEMENT_ARRAY_BUFFER) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if name != 0 && !self.buffers.contains_key(&name) {
            self.set_error(INVALID_OPERATION);
            return;
        }
        if target == ARRAY_BUFFER {
            self.array_buffer_binding = name;
        } else {
            self.element_array_buffer_binding = name;
        }
    }

    fn buffer_binding(&self, target: u32) -> Option<u32> {
        match target {
            ARRAY_BUFFER => Some(self.array_buffer_binding),
            ELEMENT_ARRAY_BUFFER => Some(self.element_array_buffer_binding),
            _ => None,
        }
    }

    fn bound_buffer_mut(&mut self, target: u32) -> Option<&mut RawBuffer> {
        let name = match self.buffer_binding(target) {
            Some(name) => name,
            None => {
                self.set_error(INVALID_ENUM);
                return None;
            }
        };
        if name == 0 {
            self.set_error(INVALID_OPERATION);
            return None;
        }
        self.buffers.get_mut(&name)
    }

    /// (Re)allocates the bound buffer's storage to `size` bytes, optionally
    /// filling it.
    pub fn buffer_data(&mut self, target: u32, size: u64, data: Option<&[u8]>, usage: u32) {
        if !matches!(usage, STREAM_DRAW | STATIC_DRAW | DYNAMIC_DRAW) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if let Some(bytes) = data {
            if bytes.len() as u64 != size {
                self.set_error(INVALID_VALUE);
                return;
            }
        }
        let Some(buffer) = self.bound_buffer_mut(target) else {
            return;
        };
        if buffer.mapped_access.is_some() {
            self.set_error(INVALID_OPERATION);
            return;
        }
        buffer.usage = usage;
        buffer.data = match data {
            Some(bytes) => bytes.to_vec(),
            None => vec![0; size as usize],
        };
    }

    /// Overwrites a sub-range of the bound buffer.
    pub fn buffer_sub_data(&mut self, target: u32, offset: u64, data: &[u8]) {
        let Some(buffer) = self.bound_buffer_mut(target) else {
            return;
        };
        if buffer.mapped_access.is_some() {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let end = match offset.checked_add(data.len() as u64) {
            Some(end) if end <= buffer.data.len() as u64 => end,
            _ => {
                self.set_error(INVALID_VALUE);
                return;
            }
        };
        buffer.data[offset as usize..end as usize].copy_from_slice(data);
    }

    /// The current allocation size of the bound buffer, in bytes.
    pub fn buffer_size(&mut self, target: u32) -> u64 {
        match self.bound_buffer_mut(target) {
            Some(buffer) => buffer.data.len() as u64,
            None => 0,
        }
    }

    /// Returns `true` if `name` has an open mapping.
    pub fn buffer_is_mapped(&self, name: u32) -> bool {
        self.buffers
            .get(&name)
            .is_some_and(|buffer| buffer.mapped_access.is_some())
    }

    /// The usage hint a buffer was last allocated with.
    pub fn buffer_usage(&self, name: u32) -> Option<u32> {
        self.buffers.get(&name).map(|buffer| buffer.usage)
    }

    /// Opens a CPU access window over the bound buffer, returning a snapshot
    /// of its bytes. Fails (latching `INVALID_OPERATION`) if a mapping is
    /// already open.
    pub fn map_buffer(&mut self, target: u32, access: u32) -> Option<Vec<u8>> {
        if !matches!(access, READ_ONLY | WRITE_ONLY | READ_WRITE) {
            self.set_error(INVALID_ENUM);
            return None;
        }
        let Some(buffer) = self.bound_buffer_mut(target) else {
            return None;
        };
        if buffer.mapped_access.is_some() {
            self.set_error(INVALID_OPERATION);
            return None;
        }
        buffer.mapped_access = Some(access);
        buffer.mapping_invalidated = false;
        Some(buffer.data.clone())
    }

    /// Closes the bound buffer's mapping, committing `write_back` when given.
    ///
    /// Returns `false` when the mapping was invalidated while open; the
    /// buffer's contents are then undefined and nothing is committed.
    pub fn unmap_buffer(&mut self, target: u32, write_back: Option<&[u8]>) -> bool {
        let Some(buffer) = self.bound_buffer_mut(target) else {
            return false;
        };
        if buffer.mapped_access.is_none() {
            self.set_error(INVALID_OPERATION);
            return false;
        }
        buffer.mapped_access = None;
        if buffer.mapping_invalidated {
            buffer.mapping_invalidated = false;
            return false;
        }
        if let Some(bytes) = write_back {
            if bytes.len() == buffer.data.len() {
                buffer.data.copy_from_slice(bytes);
            } else {
                self.set_error(INVALID_VALUE);
            }
        }
        true
    }

    /// Marks every open mapping as invalidated, as a context loss would.
    pub fn invalidate_open_mappings(&mut self) {
        for buffer in self.buffers.values_mut() {
            if buffer.mapped_access.is_some() {
                buffer.mapping_invalidated = true;
            }
        }
    }

    // --- Texture objects ---

    /// Allocates a fresh texture name.
    pub fn gen_texture(&mut self) -> u32 {
        let name = self.fresh_name();
        self.textures.insert(name, RawTexture::default());
        name
    }

    /// Deletes a texture name. Unit bindings referencing it reset to 0;
    /// framebuffer attachments referencing it are left dangling.
    pub fn delete_texture(&mut self, name: u32) {
        if self.textures.remove(&name).is_none() {
            self.set_error(INVALID_VALUE);
            return;
        }
        for binding in self.texture_unit_bindings.iter_mut() {
            if *binding == name {
                *binding = 0;
            }
        }
    }

    /// Selects the active texture unit.
    pub fn active_texture(&mut self, unit: u32) {
        if (unit as usize) < TEXTURE_UNIT_COUNT {
            self.active_texture_unit = unit;
        } else {
            self.set_error(INVALID_ENUM);
        }
    }

    /// Binds `name` (or 0) to the active texture unit.
    pub fn bind_texture(&mut self, name: u32) {
        if name != 0 && !self.textures.contains_key(&name) {
            self.set_error(INVALID_OPERATION);
            return;
        }
        self.texture_unit_bindings[self.active_texture_unit as usize] = name;
    }

    fn bound_texture_mut(&mut self) -> Option<&mut RawTexture> {
        let name = self.texture_unit_bindings[self.active_texture_unit as usize];
        if name == 0 {
            self.set_error(INVALID_OPERATION);
            return None;
        }
        self.textures.get_mut(&name)
    }

    /// Sets a sampling parameter on the texture bound to the active unit.
    pub fn tex_parameter(&mut self, pname: u32, value: u32) {
        let Some(texture) = self.bound_texture_mut() else {
            return;
        };
        match pname {
            TEXTURE_MIN_FILTER => texture.min_filter = value,
            TEXTURE_MAG_FILTER => texture.mag_filter = value,
            TEXTURE_WRAP_S => texture.wrap_s = value,
            TEXTURE_WRAP_T => texture.wrap_t = value,
            _ => self.set_error(INVALID_ENUM),
        }
    }

    /// Uploads an uncompressed image to the bound texture.
    ///
    /// When `data` is given its length must match the image's storage size
    /// for the format; `None` allocates content-undefined storage.
    pub fn tex_image_2d(
        &mut self,
        level: u32,
        internal_format: u32,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) {
        let texel_size = match internal_format {
            LUMINANCE => 1u64,
            RGB => 3,
            RGBA => 4,
            DEPTH_COMPONENT => 4,
            _ => {
                self.set_error(INVALID_ENUM);
                return;
            }
        };
        if let Some(bytes) = data {
            if bytes.len() as u64 != width as u64 * height as u64 * texel_size {
                self.set_error(INVALID_VALUE);
                return;
            }
        }
        let Some(texture) = self.bound_texture_mut() else {
            return;
        };
        texture.width = width;
        texture.height = height;
        texture.internal_format = internal_format;
        texture.has_storage = true;
        match data {
            Some(bytes) => {
                texture.levels.insert(level, bytes.to_vec());
            }
            None => {
                texture.levels.remove(&level);
            }
        }
    }

    /// Uploads a block-compressed image to the bound texture.
    pub fn compressed_tex_image_2d(
        &mut self,
        level: u32,
        internal_format: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) {
        if !matches!(
            internal_format,
            COMPRESSED_RGB_DXT1 | COMPRESSED_RGBA_DXT1 | COMPRESSED_RGBA_DXT3 | COMPRESSED_RGBA_DXT5
        ) {
            self.set_error(INVALID_ENUM);
            return;
        }
        let Some(texture) = self.bound_texture_mut() else {
            return;
        };
        texture.width = width;
        texture.height = height;
        texture.internal_format = internal_format;
        texture.has_storage = true;
        texture.levels.insert(level, data.to_vec());
    }

    /// Declares a block-compressed texture's shape without uploading content.
    pub fn reserve_compressed_storage(&mut self, internal_format: u32, width: u32, height: u32) {
        let Some(texture) = self.bound_texture_mut() else {
            return;
        };
        texture.width = width;
        texture.height = height;
        texture.internal_format = internal_format;
        texture.has_storage = true;
    }

    /// The uploaded payload for a mip level of a texture, if any.
    pub fn texture_level_data(&self, name: u32, level: u32) -> Option<&[u8]> {
        self.textures
            .get(&name)?
            .levels
            .get(&level)
            .map(Vec::as_slice)
    }

    /// Returns `true` if `name` is a live texture.
    pub fn texture_exists(&self, name: u32) -> bool {
        self.textures.contains_key(&name)
    }

    /// The current value of a sampling parameter on a texture.
    pub fn texture_parameter_value(&self, name: u32, pname: u32) -> Option<u32> {
        let texture = self.textures.get(&name)?;
        match pname {
            TEXTURE_MIN_FILTER => Some(texture.min_filter),
            TEXTURE_MAG_FILTER => Some(texture.mag_filter),
            TEXTURE_WRAP_S => Some(texture.wrap_s),
            TEXTURE_WRAP_T => Some(texture.wrap_t),
            _ => None,
        }
    }

    // --- Program objects ---

    /// Allocates a fresh program name for a stage target.
    pub fn gen_program(&mut self, target: u32) -> u32 {
        if !matches!(target, VERTEX_PROGRAM | FRAGMENT_PROGRAM) {
            self.set_error(INVALID_ENUM);
            return 0;
        }
        let name = self.fresh_name();
        self.programs.insert(
            name,
            RawProgram {
                target,
                source: Vec::new(),
            },
        );
        name
    }

    /// Binds `name` (or 0) as the active program for a stage.
    pub fn bind_program(&mut self, target: u32, name: u32) {
        if name != 0 {
            match self.programs.get(&name) {
                Some(program) if program.target == target => {}
                _ => {
                    self.set_error(INVALID_OPERATION);
                    return;
                }
            }
        }
        match target {
            VERTEX_PROGRAM => self.vertex_program_binding = name,
            FRAGMENT_PROGRAM => self.fragment_program_binding = name,
            _ => self.set_error(INVALID_ENUM),
        }
    }

    /// Loads opaque program text/binary into the stage's bound program.
    pub fn program_string(&mut self, target: u32, blob: &[u8]) {
        let name = match target {
            VERTEX_PROGRAM => self.vertex_program_binding,
            FRAGMENT_PROGRAM => self.fragment_program_binding,
            _ => {
                self.set_error(INVALID_ENUM);
                return;
            }
        };
        if name == 0 {
            self.set_error(INVALID_OPERATION);
            return;
        }
        if let Some(program) = self.programs.get_mut(&name) {
            program.source = blob.to_vec();
        }
    }

    /// Deletes a program name. Stage bindings referencing it reset to 0.
    pub fn delete_program(&mut self, name: u32) {
        if self.programs.remove(&name).is_none() {
            self.set_error(INVALID_VALUE);
            return;
        }
        if self.vertex_program_binding == name {
            self.vertex_program_binding = 0;
        }
        if self.fragment_program_binding == name {
            self.fragment_program_binding = 0;
        }
    }

    /// Loads one constant register of a program stage.
    pub fn program_local_parameter(&mut self, target: u32, register: u32, value: [f32; 4]) {
        if !matches!(target, VERTEX_PROGRAM | FRAGMENT_PROGRAM) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.program_constants.insert((target, register), value);
    }

    /// The last-loaded value of a stage constant register.
    pub fn program_constant(&self, target: u32, register: u32) -> Option<[f32; 4]> {
        self.program_constants.get(&(target, register)).copied()
    }

    /// The blob last loaded into a program object.
    pub fn program_source(&self, name: u32) -> Option<&[u8]> {
        self.programs.get(&name).map(|program| program.source.as_slice())
    }

    // --- Framebuffer objects ---

    /// Allocates a fresh framebuffer name.
    pub fn gen_framebuffer(&mut self) -> u32 {
        let name = self.fresh_name();
        self.framebuffers.insert(name, RawFramebuffer::default());
        name
    }

    /// Binds `name` (or 0 for the default surface) as the draw destination.
    pub fn bind_framebuffer(&mut self, name: u32) {
        if name != 0 && !self.framebuffers.contains_key(&name) {
            self.set_error(INVALID_OPERATION);
            return;
        }
        self.framebuffer_binding = name;
    }

    fn bound_framebuffer_mut(&mut self) -> Option<&mut RawFramebuffer> {
        if self.framebuffer_binding == 0 {
            self.set_error(INVALID_OPERATION);
            return None;
        }
        self.framebuffers.get_mut(&self.framebuffer_binding)
    }

    /// Attaches a texture to an attachment point of the bound framebuffer.
    pub fn framebuffer_texture_2d(&mut self, attachment: u32, texture: u32) {
        if texture != 0 && !self.textures.contains_key(&texture) {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let Some(framebuffer) = self.bound_framebuffer_mut() else {
            return;
        };
        let slot = match attachment {
            COLOR_ATTACHMENT0 => &mut framebuffer.color,
            DEPTH_ATTACHMENT => &mut framebuffer.depth,
            STENCIL_ATTACHMENT => &mut framebuffer.stencil,
            _ => {
                self.set_error(INVALID_ENUM);
                return;
            }
        };
        *slot = if texture == 0 { None } else { Some(texture) };
    }

    /// Disables the color draw buffer of the bound framebuffer.
    pub fn draw_buffer_none(&mut self) {
        if let Some(framebuffer) = self.bound_framebuffer_mut() {
            framebuffer.draw_buffer_disabled = true;
        }
    }

    /// Deletes a framebuffer name. The draw destination resets to the
    /// default surface if it referenced the name.
    pub fn delete_framebuffer(&mut self, name: u32) {
        if self.framebuffers.remove(&name).is_none() {
            self.set_error(INVALID_VALUE);
            return;
        }
        if self.framebuffer_binding == name {
            self.framebuffer_binding = 0;
        }
    }

    /// Queries the usability of the bound draw destination.
    ///
    /// The default surface is always complete. For a framebuffer object the
    /// categories are, in checking order: no attachments at all; an
    /// attachment that is deleted, zero-sized, or dimension-mismatched; a
    /// format that does not suit its attachment point; a missing color
    /// attachment whose draw buffer was not disabled.
    pub fn check_framebuffer_status(&self) -> u32 {
        if self.framebuffer_binding == 0 {
            return FRAMEBUFFER_COMPLETE;
        }
        let Some(framebuffer) = self.framebuffers.get(&self.framebuffer_binding) else {
            return FRAMEBUFFER_UNDEFINED;
        };

        let slots = [
            (framebuffer.color, COLOR_ATTACHMENT0),
            (framebuffer.depth, DEPTH_ATTACHMENT),
            (framebuffer.stencil, STENCIL_ATTACHMENT),
        ];
        if slots.iter().all(|(texture, _)| texture.is_none()) {
            return FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }

        let mut dimensions: Option<(u32, u32)> = None;
        for (texture, attachment) in slots.iter().flat_map(|(t, a)| t.map(|t| (t, *a))) {
            let Some(texture) = self.textures.get(&texture) else {
                return FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            };
            if !texture.has_storage || texture.width == 0 || texture.height == 0 {
                return FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            }
            match dimensions {
                None => dimensions = Some((texture.width, texture.height)),
                Some(existing) if existing != (texture.width, texture.height) => {
                    return FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
                }
                Some(_) => {}
            }
            let format_suits_slot = match attachment {
                COLOR_ATTACHMENT0 => texture.internal_format != DEPTH_COMPONENT,
                DEPTH_ATTACHMENT | STENCIL_ATTACHMENT => {
                    texture.internal_format == DEPTH_COMPONENT
                }
                _ => false,
            };
            if !format_suits_slot {
                return FRAMEBUFFER_UNSUPPORTED;
            }
        }

        if framebuffer.color.is_none() && !framebuffer.draw_buffer_disabled {
            return FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER;
        }

        FRAMEBUFFER_COMPLETE
    }

    // --- Vertex attributes ---

    /// Enables a vertex attribute slot.
    pub fn enable_vertex_attrib_array(&mut self, index: u32) {
        if index as usize >= VERTEX_ATTRIB_COUNT {
            self.set_error(INVALID_VALUE);
            return;
        }
        if self.attributes[index as usize].is_none() {
            self.attributes[index as usize] = Some(RawAttribPointer {
                buffer: 0,
                size: 0,
                type_: FLOAT,
                stride: 0,
                offset: 0,
            });
        }
    }

    /// Disables a vertex attribute slot.
    pub fn disable_vertex_attrib_array(&mut self, index: u32) {
        if index as usize >= VERTEX_ATTRIB_COUNT {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.attributes[index as usize] = None;
    }

    /// Points an enabled attribute slot into the bound vertex buffer.
    pub fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: u32,
        type_: u32,
        stride: u32,
        offset: u64,
    ) {
        if index as usize >= VERTEX_ATTRIB_COUNT {
            self.set_error(INVALID_VALUE);
            return;
        }
        if type_byte_size(type_) == 0 {
            self.set_error(INVALID_ENUM);
            return;
        }
        if self.array_buffer_binding == 0 {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let buffer = self.array_buffer_binding;
        match &mut self.attributes[index as usize] {
            Some(pointer) => {
                *pointer = RawAttribPointer {
                    buffer,
                    size,
                    type_,
                    stride,
                    offset,
                };
            }
            None => self.set_error(INVALID_OPERATION),
        }
    }

    /// Returns `true` if an attribute slot is enabled.
    pub fn vertex_attrib_enabled(&self, index: u32) -> bool {
        (index as usize) < VERTEX_ATTRIB_COUNT && self.attributes[index as usize].is_some()
    }

    // --- Capabilities and pipeline state ---

    fn is_cap(cap: u32) -> bool {
        matches!(
            cap,
            BLEND | DEPTH_TEST | STENCIL_TEST | CULL_FACE | ALPHA_TEST | SCISSOR_TEST
                | POLYGON_OFFSET_FILL
        )
    }

    /// Switches a capability on.
    pub fn enable(&mut self, cap: u32) {
        if !Self::is_cap(cap) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if !self.enabled_caps.contains(&cap) {
            self.enabled_caps.push(cap);
        }
    }

    /// Switches a capability off.
    pub fn disable(&mut self, cap: u32) {
        if !Self::is_cap(cap) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.enabled_caps.retain(|&c| c != cap);
    }

    /// Returns `true` if a capability is on.
    pub fn is_enabled(&self, cap: u32) -> bool {
        self.enabled_caps.contains(&cap)
    }

    /// Sets the clear color.
    pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = [r, g, b, a];
    }

    /// Sets the clear depth.
    pub fn clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    /// Sets the clear stencil value.
    pub fn clear_stencil(&mut self, stencil: u32) {
        self.clear_stencil = stencil;
    }

    /// Clears the buffers named in `mask` of the bound draw destination.
    pub fn clear(&mut self, mask: u32) {
        if mask & !(COLOR_BUFFER_BIT | DEPTH_BUFFER_BIT | STENCIL_BUFFER_BIT) != 0 {
            self.set_error(INVALID_VALUE);
        }
        // State-only emulation: the latched clear values are the observable
        // effect.
    }

    /// The most recently set clear color.
    pub fn clear_color_value(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Sets the blend equation operands.
    pub fn blend_func(&mut self, source: u32, destination: u32) {
        self.blend_func = (source, destination);
    }

    /// The current blend operands.
    pub fn blend_func_value(&self) -> (u32, u32) {
        self.blend_func
    }

    /// Sets the per-channel color write mask.
    pub fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.color_mask = [r, g, b, a];
    }

    /// Sets the depth write mask.
    pub fn depth_mask(&mut self, mask: bool) {
        self.depth_mask = mask;
    }

    /// Sets the stencil write mask.
    pub fn stencil_mask(&mut self, mask: u32) {
        self.stencil_mask = mask;
    }

    /// Sets the color-index write mask.
    pub fn index_mask(&mut self, mask: u32) {
        self.index_mask = mask;
    }

    /// Selects the culled face set.
    pub fn cull_face(&mut self, mode: u32) {
        if !matches!(mode, FRONT | BACK | FRONT_AND_BACK) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.cull_face_mode = mode;
    }

    /// Sets the polygon depth offset.
    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.polygon_offset = (factor, units);
    }

    /// Sets the destination rectangle to `(0, 0, width, height)`.
    pub fn viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// The current destination rectangle extent.
    pub fn viewport_value(&self) -> (u32, u32) {
        self.viewport
    }

    /// Captures the latched fixed-function pipeline state.
    pub fn pipeline_snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            clear_depth: self.clear_depth,
            clear_stencil: self.clear_stencil,
            color_mask: self.color_mask,
            depth_mask: self.depth_mask,
            stencil_mask: self.stencil_mask,
            index_mask: self.index_mask,
            cull_face_mode: self.cull_face_mode,
            polygon_offset: self.polygon_offset,
        }
    }

    // --- Draws and presentation ---

    fn is_primitive_mode(mode: u32) -> bool {
        matches!(
            mode,
            POINTS | LINES | LINE_STRIP | TRIANGLES | TRIANGLE_STRIP | TRIANGLE_FAN
        )
    }

    fn draw_source_usable(&mut self) -> bool {
        let sources: Vec<u32> = self
            .attributes
            .iter()
            .flatten()
            .map(|pointer| pointer.buffer)
            .filter(|&name| name != 0)
            .collect();
        for name in sources {
            match self.buffers.get(&name) {
                Some(buffer) if buffer.mapped_access.is_none() => {}
                // Deleted or currently mapped: not usable as a draw source.
                _ => {
                    self.set_error(INVALID_OPERATION);
                    return false;
                }
            }
        }
        true
    }

    /// Issues a non-indexed draw.
    pub fn draw_arrays(&mut self, mode: u32, _first: u32, _count: u32) {
        if !Self::is_primitive_mode(mode) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if !self.draw_source_usable() {
            return;
        }
        self.draw_calls += 1;
    }

    /// Issues an indexed draw from explicit index data.
    pub fn draw_elements(&mut self, mode: u32, count: u32, type_: u32, indices: &[u8]) {
        if !Self::is_primitive_mode(mode) || type_byte_size(type_) == 0 {
            self.set_error(INVALID_ENUM);
            return;
        }
        if (indices.len() as u64) < count as u64 * type_byte_size(type_) {
            self.set_error(INVALID_VALUE);
            return;
        }
        if !self.draw_source_usable() {
            return;
        }
        self.draw_calls += 1;
    }

    /// Issues an indexed draw over `index_count` indices of the bound index
    /// buffer, starting at index `start`.
    pub fn draw_range_elements(&mut self, mode: u32, start: u32, index_count: u32, type_: u32) {
        if !Self::is_primitive_mode(mode) || type_byte_size(type_) == 0 {
            self.set_error(INVALID_ENUM);
            return;
        }
        let name = self.element_array_buffer_binding;
        if name == 0 {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let Some(buffer) = self.buffers.get(&name) else {
            self.set_error(INVALID_OPERATION);
            return;
        };
        if buffer.mapped_access.is_some() {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let bytes_needed = (start as u64 + index_count as u64) * type_byte_size(type_);
        if bytes_needed > buffer.data.len() as u64 {
            self.set_error(INVALID_VALUE);
            return;
        }
        if !self.draw_source_usable() {
            return;
        }
        self.draw_calls += 1;
    }

    /// Sets the presentation swap interval.
    pub fn swap_interval(&mut self, interval: u32) {
        self.swap_interval = interval;
    }

    /// Presents the frame. The emulation's observable effect is the frame
    /// counter.
    pub fn swap_buffers(&mut self) {
        self.frames_presented += 1;
    }

    /// The number of frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// The number of draw calls issued so far.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_register_is_sticky_and_clears_on_read() {
        let mut raw = RawContext::new(64, 64);
        raw.bind_buffer(0xDEAD, 1);
        raw.bind_buffer(ARRAY_BUFFER, 42); // would latch INVALID_OPERATION
        assert_eq!(raw.get_error(), INVALID_ENUM); // first failure wins
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn sub_data_with_a_wrapping_offset_is_invalid() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, name);
        raw.buffer_data(ARRAY_BUFFER, 16, None, STATIC_DRAW);
        raw.buffer_sub_data(ARRAY_BUFFER, u64::MAX - 1, &[1, 2, 3, 4]);
        assert_eq!(raw.get_error(), INVALID_VALUE);
    }

    #[test]
    fn bad_target_outranks_bad_name_on_bind() {
        let mut raw = RawContext::new(64, 64);
        // Neither the target nor the name is valid; the enum check wins.
        raw.bind_buffer(0xDEAD, 9999);
        assert_eq!(raw.get_error(), INVALID_ENUM);
        // A valid target with an unknown name is an operation error.
        raw.bind_buffer(ELEMENT_ARRAY_BUFFER, 9999);
        assert_eq!(raw.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn buffer_data_requires_a_binding() {
        let mut raw = RawContext::new(64, 64);
        raw.buffer_data(ARRAY_BUFFER, 16, None, STATIC_DRAW);
        assert_eq!(raw.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn sub_data_out_of_range_is_rejected() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, name);
        raw.buffer_data(ARRAY_BUFFER, 8, None, STATIC_DRAW);
        raw.buffer_sub_data(ARRAY_BUFFER, 6, &[1, 2, 3]);
        assert_eq!(raw.get_error(), INVALID_VALUE);
        // The in-range prefix was not partially written.
        let snapshot = raw.map_buffer(ARRAY_BUFFER, READ_ONLY).unwrap();
        assert_eq!(&snapshot[..], &[0; 8]);
    }

    #[test]
    fn double_map_is_an_error() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, name);
        raw.buffer_data(ARRAY_BUFFER, 4, None, DYNAMIC_DRAW);
        assert!(raw.map_buffer(ARRAY_BUFFER, READ_WRITE).is_some());
        assert!(raw.map_buffer(ARRAY_BUFFER, READ_WRITE).is_none());
        assert_eq!(raw.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn invalidated_mapping_fails_unmap() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, name);
        raw.buffer_data(ARRAY_BUFFER, 4, Some(&[1, 2, 3, 4]), DYNAMIC_DRAW);
        let mut snapshot = raw.map_buffer(ARRAY_BUFFER, READ_WRITE).unwrap();
        snapshot.copy_from_slice(&[9, 9, 9, 9]);
        raw.invalidate_open_mappings();
        assert!(!raw.unmap_buffer(ARRAY_BUFFER, Some(&snapshot)));
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn deleting_a_bound_buffer_resets_the_binding() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ELEMENT_ARRAY_BUFFER, name);
        raw.delete_buffer(name);
        assert_eq!(raw.binding_snapshot().element_array_buffer, 0);
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn completeness_default_surface_is_complete() {
        let raw = RawContext::new(64, 64);
        assert_eq!(raw.check_framebuffer_status(), FRAMEBUFFER_COMPLETE);
    }

    #[test]
    fn completeness_distinguishes_missing_and_mismatched() {
        let mut raw = RawContext::new(64, 64);
        let fb = raw.gen_framebuffer();
        raw.bind_framebuffer(fb);
        assert_eq!(
            raw.check_framebuffer_status(),
            FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        );

        let color = raw.gen_texture();
        raw.bind_texture(color);
        raw.tex_image_2d(0, RGBA, 32, 32, None);
        raw.bind_texture(0);
        let depth = raw.gen_texture();
        raw.bind_texture(depth);
        raw.tex_image_2d(0, DEPTH_COMPONENT, 16, 16, None);
        raw.bind_texture(0);

        raw.framebuffer_texture_2d(COLOR_ATTACHMENT0, color);
        raw.framebuffer_texture_2d(DEPTH_ATTACHMENT, depth);
        assert_eq!(
            raw.check_framebuffer_status(),
            FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        );
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn completeness_rejects_color_format_in_depth_slot() {
        let mut raw = RawContext::new(64, 64);
        let fb = raw.gen_framebuffer();
        raw.bind_framebuffer(fb);
        let tex = raw.gen_texture();
        raw.bind_texture(tex);
        raw.tex_image_2d(0, RGBA, 32, 32, None);
        raw.bind_texture(0);
        raw.framebuffer_texture_2d(DEPTH_ATTACHMENT, tex);
        assert_eq!(raw.check_framebuffer_status(), FRAMEBUFFER_UNSUPPORTED);
    }

    #[test]
    fn depth_only_framebuffer_needs_disabled_draw_buffer() {
        let mut raw = RawContext::new(64, 64);
        let fb = raw.gen_framebuffer();
        raw.bind_framebuffer(fb);
        let depth = raw.gen_texture();
        raw.bind_texture(depth);
        raw.tex_image_2d(0, DEPTH_COMPONENT, 32, 32, None);
        raw.bind_texture(0);
        raw.framebuffer_texture_2d(DEPTH_ATTACHMENT, depth);
        assert_eq!(
            raw.check_framebuffer_status(),
            FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER
        );
        raw.draw_buffer_none();
        assert_eq!(raw.check_framebuffer_status(), FRAMEBUFFER_COMPLETE);
    }

    #[test]
    fn draw_with_mapped_source_is_rejected() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, name);
        raw.buffer_data(ARRAY_BUFFER, 24, None, STATIC_DRAW);
        raw.enable_vertex_attrib_array(0);
        raw.vertex_attrib_pointer(0, 3, FLOAT, 12, 0);
        let snapshot = raw.map_buffer(ARRAY_BUFFER, WRITE_ONLY).unwrap();
        raw.draw_arrays(TRIANGLES, 0, 2);
        assert_eq!(raw.get_error(), INVALID_OPERATION);
        assert_eq!(raw.draw_calls(), 0);
        assert!(raw.unmap_buffer(ARRAY_BUFFER, Some(&snapshot)));
        raw.draw_arrays(TRIANGLES, 0, 2);
        assert_eq!(raw.get_error(), NO_ERROR);
        assert_eq!(raw.draw_calls(), 1);
    }

    #[test]
    fn texture_parameters_are_latched_per_object() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_texture();
        raw.bind_texture(name);
        raw.tex_parameter(TEXTURE_MIN_FILTER, NEAREST);
        raw.tex_parameter(TEXTURE_WRAP_S, CLAMP_TO_EDGE);
        raw.bind_texture(0);
        assert_eq!(raw.texture_parameter_value(name, TEXTURE_MIN_FILTER), Some(NEAREST));
        assert_eq!(raw.texture_parameter_value(name, TEXTURE_WRAP_S), Some(CLAMP_TO_EDGE));
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn program_blob_loads_into_the_bound_stage() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_program(FRAGMENT_PROGRAM);
        raw.bind_program(FRAGMENT_PROGRAM, name);
        raw.program_string(FRAGMENT_PROGRAM, b"fp");
        raw.bind_program(FRAGMENT_PROGRAM, 0);
        assert_eq!(raw.program_source(name), Some(&b"fp"[..]));
        // A vertex-stage program cannot be bound to the fragment stage.
        let vp = raw.gen_program(VERTEX_PROGRAM);
        raw.bind_program(FRAGMENT_PROGRAM, vp);
        assert_eq!(raw.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn pipeline_state_is_latched() {
        let mut raw = RawContext::new(64, 64);
        let buffer = raw.gen_buffer();
        raw.bind_buffer(ARRAY_BUFFER, buffer);
        raw.buffer_data(ARRAY_BUFFER, 4, None, DYNAMIC_DRAW);
        raw.bind_buffer(ARRAY_BUFFER, 0);
        assert_eq!(raw.buffer_usage(buffer), Some(DYNAMIC_DRAW));

        raw.clear_depth(0.5);
        raw.clear_stencil(3);
        raw.color_mask(true, false, true, false);
        raw.depth_mask(false);
        raw.stencil_mask(0xFF);
        raw.index_mask(0x0F);
        raw.cull_face(FRONT);
        raw.polygon_offset(1.0, 2.0);
        let state = raw.pipeline_snapshot();
        assert_eq!(state.clear_depth, 0.5);
        assert_eq!(state.clear_stencil, 3);
        assert_eq!(state.color_mask, [true, false, true, false]);
        assert!(!state.depth_mask);
        assert_eq!(state.stencil_mask, 0xFF);
        assert_eq!(state.index_mask, 0x0F);
        assert_eq!(state.cull_face_mode, FRONT);
        assert_eq!(state.polygon_offset, (1.0, 2.0));
        assert_eq!(raw.get_error(), NO_ERROR);
    }

    #[test]
    fn range_draw_validates_the_index_range() {
        let mut raw = RawContext::new(64, 64);
        let name = raw.gen_buffer();
        raw.bind_buffer(ELEMENT_ARRAY_BUFFER, name);
        // 6 u16 indices.
        raw.buffer_data(ELEMENT_ARRAY_BUFFER, 12, None, STATIC_DRAW);
        raw.draw_range_elements(TRIANGLES, 0, 6, UNSIGNED_SHORT);
        assert_eq!(raw.get_error(), NO_ERROR);
        raw.draw_range_elements(TRIANGLES, 4, 6, UNSIGNED_SHORT);
        assert_eq!(raw.get_error(), INVALID_VALUE);
    }
}
