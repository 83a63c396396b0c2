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

//! End-to-end tests of the software graphics device against the
//! `GraphicsDevice` contract.

use std::sync::{Mutex, PoisonError};

use approx::assert_relative_eq;
use opal_core::{
    AttachmentSlot, BlendFactor, BufferAccess, BufferUsage, ClearFlags, CompletenessStatus,
    DataType, DeviceDescriptor, DeviceError, GraphicsDevice, PrimitiveType, RenderError,
    RenderState, RenderTargetDescriptor, ResourceError, TargetError, TextureFormat, TextureParams,
    VertexElement, VertexUsage,
};
use opal_infra::SoftDevice;

/// Exactly one device may be live per process, so tests that create one
/// serialize on this gate. The guard outlives the device it protects.
static DEVICE_GATE: Mutex<()> = Mutex::new(());

fn with_device<F: FnOnce(&SoftDevice)>(f: F) {
    let _gate = DEVICE_GATE.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = env_logger::builder().is_test(true).try_init();
    let device = SoftDevice::new(&DeviceDescriptor {
        display_width: 800,
        display_height: 600,
        ..Default::default()
    })
    .expect("device creation should succeed");
    f(&device);
}

fn float_element(size: u32, usage: VertexUsage) -> VertexElement {
    VertexElement {
        size,
        usage,
        usage_index: 0,
        data_type: DataType::Float,
    }
}

#[test]
fn device_reports_surface_dimensions() {
    with_device(|device| {
        assert_eq!(device.window_width(), 800);
        assert_eq!(device.window_height(), 600);
    });
}

#[test]
fn second_device_is_rejected_while_first_is_live() {
    with_device(|_device| {
        let err = SoftDevice::new(&DeviceDescriptor::default())
            .expect_err("a second live device must be rejected");
        assert!(matches!(err, DeviceError::DeviceAlreadyLive));
    });

    // The first device has been dropped; creation works again.
    with_device(|device| {
        assert_eq!(device.window_width(), 800);
    });
}

#[test]
fn zero_sized_surface_failure_is_recoverable() {
    let _gate = DEVICE_GATE.lock().unwrap_or_else(PoisonError::into_inner);
    let err = SoftDevice::new(&DeviceDescriptor {
        display_width: 800,
        display_height: 0,
        ..Default::default()
    })
    .expect_err("a zero-sized surface is not drawable");
    assert!(matches!(err, DeviceError::SurfaceCreationFailed(_)));

    // The failed creation released the liveness guard.
    let device = SoftDevice::new(&DeviceDescriptor::default())
        .expect("retrying with valid parameters should succeed");
    assert_eq!(device.window_width(), 960);
}

#[test]
fn static_vertex_buffer_lifecycle() {
    with_device(|device| {
        // --- 1. ARRANGE ---
        let id = device
            .create_vertex_buffer(64, None, BufferUsage::Static)
            .expect("buffer creation");
        assert_eq!(device.memory_in_use(), 64);

        // --- 2. ACT ---
        device
            .set_vertex_buffer_sub_data(id, 0, &[1, 2, 3, 4])
            .expect("in-range partial write");

        // --- 3. ASSERT ---
        let mapping = device
            .map_vertex_buffer(id, BufferAccess::ReadOnly)
            .expect("read-only mapping");
        assert_eq!(mapping.len(), 64);
        assert_eq!(&mapping.as_slice()[..4], &[1, 2, 3, 4]);
        let committed = device
            .unmap_vertex_buffer(id, mapping)
            .expect("unmap of a live mapping");
        assert!(committed);

        device.destroy_vertex_buffer(id).expect("buffer destruction");
        assert_eq!(device.memory_in_use(), 0);
        assert!(matches!(
            device.destroy_vertex_buffer(id),
            Err(ResourceError::InvalidHandle)
        ));
    });
}

#[test]
fn mapping_commits_writes_and_must_be_paired() {
    with_device(|device| {
        let id = device
            .create_vertex_buffer(8, Some(&[0; 8]), BufferUsage::Dynamic)
            .expect("buffer creation");

        let mut mapping = device
            .map_vertex_buffer(id, BufferAccess::ReadWrite)
            .expect("read-write mapping");
        mapping.as_mut_slice()[..3].copy_from_slice(&[7, 8, 9]);

        // A second mapping while one is open is a pairing violation.
        assert!(matches!(
            device.map_vertex_buffer(id, BufferAccess::ReadOnly),
            Err(ResourceError::AlreadyMapped)
        ));

        assert!(device.unmap_vertex_buffer(id, mapping).expect("unmap"));

        // Map again after unmapping; the committed bytes are visible.
        let mapping = device
            .map_vertex_buffer(id, BufferAccess::ReadOnly)
            .expect("remap after unmap");
        assert_eq!(&mapping.as_slice()[..3], &[7, 8, 9]);
        assert!(device.unmap_vertex_buffer(id, mapping).expect("unmap"));

        device.destroy_vertex_buffer(id).expect("buffer destruction");
    });
}

#[test]
fn unmapping_against_the_wrong_buffer_commits_nothing() {
    with_device(|device| {
        let a = device
            .create_vertex_buffer(4, Some(&[1, 1, 1, 1]), BufferUsage::Dynamic)
            .expect("first buffer creation");
        let b = device
            .create_vertex_buffer(4, Some(&[2, 2, 2, 2]), BufferUsage::Dynamic)
            .expect("second buffer creation");

        let mut mapping_a = device
            .map_vertex_buffer(a, BufferAccess::ReadWrite)
            .expect("mapping the first buffer");
        mapping_a.as_mut_slice().copy_from_slice(&[9, 9, 9, 9]);
        let mapping_b = device
            .map_vertex_buffer(b, BufferAccess::ReadWrite)
            .expect("mapping the second buffer");

        // Handing the first buffer's token to the second buffer's unmap is
        // rejected and must not leak the token's bytes into the wrong buffer.
        assert!(matches!(
            device.unmap_vertex_buffer(b, mapping_a),
            Err(ResourceError::MappingMismatch)
        ));
        assert!(device.unmap_vertex_buffer(b, mapping_b).expect("unmap"));

        let mapping = device
            .map_vertex_buffer(b, BufferAccess::ReadOnly)
            .expect("remap of the second buffer");
        assert_eq!(mapping.as_slice(), &[2, 2, 2, 2]);
        assert!(device.unmap_vertex_buffer(b, mapping).expect("unmap"));

        // The rejected token's own mapping was closed with its writes
        // discarded, so the first buffer is mappable again and unchanged.
        let mapping = device
            .map_vertex_buffer(a, BufferAccess::ReadOnly)
            .expect("remap of the first buffer");
        assert_eq!(mapping.as_slice(), &[1, 1, 1, 1]);
        assert!(device.unmap_vertex_buffer(a, mapping).expect("unmap"));

        // A vertex buffer token cannot close an index buffer mapping either.
        let index = device
            .create_index_buffer(4, None, BufferUsage::Static)
            .expect("index buffer creation");
        let mapping = device
            .map_vertex_buffer(a, BufferAccess::ReadOnly)
            .expect("mapping");
        assert!(matches!(
            device.unmap_index_buffer(index, mapping),
            Err(ResourceError::MappingMismatch)
        ));

        device.destroy_index_buffer(index).expect("buffer destruction");
        device.destroy_vertex_buffer(a).expect("buffer destruction");
        device.destroy_vertex_buffer(b).expect("buffer destruction");
    });
}

#[test]
fn partial_write_outside_the_allocation_is_rejected() {
    with_device(|device| {
        let id = device
            .create_index_buffer(16, None, BufferUsage::Static)
            .expect("buffer creation");

        let err = device
            .set_index_buffer_sub_data(id, 12, &[0; 8])
            .expect_err("a range past the allocation must be rejected");
        assert!(matches!(
            err,
            ResourceError::OutOfBounds {
                offset: 12,
                len: 8,
                capacity: 16,
            }
        ));

        // Storage was not grown by the failed write.
        let mapping = device
            .map_index_buffer(id, BufferAccess::ReadOnly)
            .expect("mapping");
        assert_eq!(mapping.len(), 16);
        assert!(device.unmap_index_buffer(id, mapping).expect("unmap"));

        device.destroy_index_buffer(id).expect("buffer destruction");
    });
}

#[test]
fn partial_write_with_a_wrapping_offset_is_rejected() {
    with_device(|device| {
        let id = device
            .create_vertex_buffer(16, None, BufferUsage::Static)
            .expect("buffer creation");

        // An offset near u64::MAX must report out of bounds, not wrap the
        // end-of-range computation back inside the allocation.
        let err = device
            .set_vertex_buffer_sub_data(id, u64::MAX - 1, &[1, 2, 3, 4])
            .expect_err("a wrapping range must be rejected");
        assert!(matches!(
            err,
            ResourceError::OutOfBounds {
                offset,
                len: 4,
                capacity: 16,
            } if offset == u64::MAX - 1
        ));
        // Rendering the error must not overflow either.
        assert!(format!("{err}").contains("exceeds buffer capacity 16"));

        device.destroy_vertex_buffer(id).expect("buffer destruction");
    });
}

#[test]
fn invalidated_mapping_reports_undefined_contents() {
    with_device(|device| {
        let id = device
            .create_vertex_buffer(4, Some(&[1, 2, 3, 4]), BufferUsage::Stream)
            .expect("buffer creation");

        let mut mapping = device
            .map_vertex_buffer(id, BufferAccess::ReadWrite)
            .expect("mapping");
        mapping.as_mut_slice().copy_from_slice(&[9, 9, 9, 9]);

        device.simulate_context_loss();

        let committed = device
            .unmap_vertex_buffer(id, mapping)
            .expect("unmap after invalidation is not an error");
        assert!(!committed, "an invalidated mapping must not commit");

        device.destroy_vertex_buffer(id).expect("buffer destruction");
    });
}

#[test]
fn vertex_declaration_layout_is_derived_in_order() {
    with_device(|device| {
        let id = device
            .create_vertex_declaration(&[
                float_element(3, VertexUsage::Position),
                float_element(3, VertexUsage::Normal),
                float_element(2, VertexUsage::TexCoord),
            ])
            .expect("declaration creation");

        let layout = device.vertex_declaration(id).expect("layout readback");
        assert_eq!(layout.stride(), 32);
        let offsets: Vec<u32> = layout.streams().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);

        device
            .destroy_vertex_declaration(id)
            .expect("declaration destruction");
    });
}

#[test]
fn declaration_capacity_is_enforced() {
    with_device(|device| {
        let elements = vec![float_element(1, VertexUsage::TexCoord); 9];
        let err = device
            .create_vertex_declaration(&elements)
            .expect_err("nine streams exceed the capacity of eight");
        assert!(matches!(
            err,
            ResourceError::StreamCapacityExceeded {
                requested: 9,
                capacity: 8,
            }
        ));
    });
}

#[test]
fn enabled_declaration_holds_the_binding_until_disabled() {
    with_device(|device| {
        // Two interleaved vertices of position + texcoord.
        let vertices: [f32; 10] = [
            0.0, 0.0, 0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 1.0, 0.0, //
        ];
        let buffer = device
            .create_vertex_buffer(40, Some(bytemuck::cast_slice(&vertices)), BufferUsage::Static)
            .expect("buffer creation");
        let declaration = device
            .create_vertex_declaration(&[
                float_element(3, VertexUsage::Position),
                float_element(2, VertexUsage::TexCoord),
            ])
            .expect("declaration creation");

        device
            .enable_vertex_declaration(declaration, buffer)
            .expect("enable over a matching buffer");
        assert!(
            !device.binding_snapshot().is_neutral(),
            "the vertex binding stays active while the declaration is enabled"
        );

        device.draw(PrimitiveType::Lines, 0, 2).expect("draw");
        assert_eq!(device.draw_call_count(), 1);

        device
            .disable_vertex_declaration(declaration)
            .expect("disable");
        assert!(
            device.binding_snapshot().is_neutral(),
            "disable must restore both bindings to none"
        );

        device
            .destroy_vertex_declaration(declaration)
            .expect("declaration destruction");
        device.destroy_vertex_buffer(buffer).expect("buffer destruction");
    });
}

#[test]
fn draw_from_a_mapped_buffer_is_rejected() {
    with_device(|device| {
        let buffer = device
            .create_vertex_buffer(24, Some(&[0; 24]), BufferUsage::Dynamic)
            .expect("buffer creation");
        let declaration = device
            .create_vertex_declaration(&[float_element(3, VertexUsage::Position)])
            .expect("declaration creation");
        device
            .enable_vertex_declaration(declaration, buffer)
            .expect("enable");

        let mapping = device
            .map_vertex_buffer(buffer, BufferAccess::WriteOnly)
            .expect("mapping");
        assert!(
            device.draw(PrimitiveType::Triangles, 0, 2).is_err(),
            "a mapped buffer must not be used as a draw source"
        );
        assert_eq!(device.draw_call_count(), 0);

        assert!(device.unmap_vertex_buffer(buffer, mapping).expect("unmap"));
        device.draw(PrimitiveType::Triangles, 0, 2).expect("draw after unmap");
        assert_eq!(device.draw_call_count(), 1);

        device
            .disable_vertex_declaration(declaration)
            .expect("disable");
        device
            .destroy_vertex_declaration(declaration)
            .expect("declaration destruction");
        device.destroy_vertex_buffer(buffer).expect("buffer destruction");
    });
}

#[test]
fn compressed_texture_accepts_an_empty_payload() {
    with_device(|device| {
        let reserved = device
            .create_texture(&TextureParams {
                width: 64,
                height: 64,
                format: TextureFormat::RgbaDxt5,
                data: Some(&[]),
                ..Default::default()
            })
            .expect("an empty compressed payload reserves storage");

        let uploaded = device
            .create_texture(&TextureParams {
                width: 4,
                height: 4,
                format: TextureFormat::RgbDxt1,
                data: Some(&[0u8; 8]),
                ..Default::default()
            })
            .expect("a non-empty compressed payload uploads");

        device.destroy_texture(reserved).expect("texture destruction");
        device.destroy_texture(uploaded).expect("texture destruction");
    });
}

#[test]
fn uncompressed_payload_must_match_the_image_size() {
    with_device(|device| {
        let err = device
            .create_texture(&TextureParams {
                width: 4,
                height: 4,
                format: TextureFormat::Rgba,
                data: Some(&[0u8; 3]),
                ..Default::default()
            })
            .expect_err("a short payload must be rejected");
        assert!(matches!(err, ResourceError::OutOfBounds { .. }));
        assert_eq!(device.live_texture_count(), 0);
    });
}

#[test]
fn texture_unit_table_bounds_are_enforced() {
    with_device(|device| {
        let texture = device
            .create_texture(&TextureParams {
                width: 2,
                height: 2,
                format: TextureFormat::Rgba,
                data: None,
                ..Default::default()
            })
            .expect("texture creation");

        device
            .set_texture_unit(31, Some(texture))
            .expect("the last unit is addressable");
        device
            .set_texture_unit(31, None)
            .expect("binding nothing disables the stage");
        assert!(matches!(
            device.set_texture_unit(32, None),
            Err(ResourceError::InvalidTextureUnit { unit: 32 })
        ));
        assert!(
            device.binding_snapshot().is_neutral(),
            "unit selection must restore the active unit"
        );

        device.destroy_texture(texture).expect("texture destruction");
    });
}

#[test]
fn depth_only_render_target_owns_one_texture() {
    with_device(|device| {
        let target = device
            .create_render_target(&RenderTargetDescriptor {
                depth: Some(TextureParams {
                    width: 128,
                    height: 128,
                    format: TextureFormat::Depth,
                    ..Default::default()
                }),
                ..Default::default()
            })
            .expect("a color-less target is legal with its draw buffer disabled");
        assert_eq!(device.live_texture_count(), 1);

        let depth_texture = device
            .render_target_texture(target, AttachmentSlot::Depth)
            .expect("the owned depth attachment is readable");
        device
            .set_texture_unit(0, Some(depth_texture))
            .expect("sampling an owned attachment");
        device.set_texture_unit(0, None).expect("unbind");
        assert!(matches!(
            device.render_target_texture(target, AttachmentSlot::Color),
            Err(ResourceError::InvalidHandle)
        ));

        device.enable_render_target(target).expect("enable");
        device
            .clear(ClearFlags::DEPTH, 0, 0, 0, 0, 1.0, 0)
            .expect("clearing the depth-only target");
        device.disable_render_target().expect("disable");
        assert!(device.binding_snapshot().is_neutral());

        device
            .destroy_render_target(target)
            .expect("target destruction");
        assert_eq!(
            device.live_texture_count(),
            0,
            "destroying the target destroys its owned attachments"
        );
    });
}

#[test]
fn mismatched_attachment_dimensions_are_incomplete() {
    with_device(|device| {
        let err = device
            .create_render_target(&RenderTargetDescriptor {
                color: Some(TextureParams {
                    width: 32,
                    height: 32,
                    format: TextureFormat::Rgba,
                    ..Default::default()
                }),
                depth: Some(TextureParams {
                    width: 16,
                    height: 16,
                    format: TextureFormat::Depth,
                    ..Default::default()
                }),
                ..Default::default()
            })
            .expect_err("mismatched attachment dimensions are unusable");
        assert!(matches!(
            err,
            TargetError::Incomplete(CompletenessStatus::IncompleteAttachment)
        ));
        assert_eq!(
            device.live_texture_count(),
            0,
            "a failed target creation must unwind its owned textures"
        );
    });
}

#[test]
fn empty_render_target_descriptor_is_missing_attachments() {
    with_device(|device| {
        let err = device
            .create_render_target(&RenderTargetDescriptor::default())
            .expect_err("a target needs at least one attachment");
        assert!(matches!(
            err,
            TargetError::Incomplete(CompletenessStatus::MissingAttachment)
        ));
    });
}

#[test]
fn clear_normalizes_color_channels() {
    with_device(|device| {
        device
            .clear(ClearFlags::ALL, 255, 128, 0, 255, 1.0, 0)
            .expect("clear");
        let color = device.clear_color();
        assert_relative_eq!(color[0], 1.0);
        assert_relative_eq!(color[1], 128.0 / 255.0);
        assert_relative_eq!(color[2], 0.0);
        assert_relative_eq!(color[3], 1.0);
    });
}

#[test]
fn range_draw_derives_index_count_from_topology() {
    with_device(|device| {
        // Four u16 indices.
        let indices: [u16; 4] = [0, 1, 2, 3];
        let buffer = device
            .create_index_buffer(8, Some(bytemuck::cast_slice(&indices)), BufferUsage::Static)
            .expect("index buffer creation");

        // A two-primitive strip consumes exactly the four indices.
        device
            .draw_range_elements(
                PrimitiveType::TriangleStrip,
                0,
                2,
                DataType::UnsignedShort,
                buffer,
            )
            .expect("strip draw within the buffer");
        assert_eq!(device.draw_call_count(), 1);

        // Two triangle-list primitives would consume six; the buffer holds
        // four.
        assert!(
            device
                .draw_range_elements(
                    PrimitiveType::Triangles,
                    0,
                    2,
                    DataType::UnsignedShort,
                    buffer,
                )
                .is_err(),
            "a triangle list of two primitives needs six indices"
        );
        assert_eq!(device.draw_call_count(), 1);
        assert!(device.binding_snapshot().is_neutral());

        device.destroy_index_buffer(buffer).expect("buffer destruction");
    });
}

#[test]
fn oversized_primitive_count_is_out_of_bounds() {
    with_device(|device| {
        let indices: [u16; 4] = [0, 1, 2, 3];
        let buffer = device
            .create_index_buffer(8, Some(bytemuck::cast_slice(&indices)), BufferUsage::Static)
            .expect("index buffer creation");

        // The derived index count for u32::MAX triangles exceeds u32; the
        // draw must report out of bounds instead of wrapping the count.
        let err = device
            .draw_range_elements(
                PrimitiveType::Triangles,
                0,
                u32::MAX,
                DataType::UnsignedShort,
                buffer,
            )
            .expect_err("an oversized primitive count must be rejected");
        assert!(matches!(
            err,
            RenderError::Resource(ResourceError::OutOfBounds { capacity: 8, .. })
        ));
        assert_eq!(device.draw_call_count(), 0);
        assert!(device.binding_snapshot().is_neutral());

        device.destroy_index_buffer(buffer).expect("buffer destruction");
    });
}

#[test]
fn full_frame_smoke() {
    with_device(|device| {
        let vertex_program = device
            .create_vertex_program(b"vp-blob")
            .expect("vertex program creation");
        let fragment_program = device
            .create_fragment_program(b"fp-blob")
            .expect("fragment program creation");

        device.set_vertex_program(vertex_program).expect("set vp");
        device.set_fragment_program(fragment_program).expect("set fp");
        device
            .set_vertex_constant_block(0, &[[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]])
            .expect("vertex constants");
        device
            .set_fragment_constant(0, [0.5, 0.5, 0.5, 1.0])
            .expect("fragment constant");

        device.set_viewport(800, 600).expect("viewport");
        device.enable_state(RenderState::DepthTest).expect("enable depth");
        device.enable_state(RenderState::Blend).expect("enable blend");
        device
            .set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
            .expect("blend func");
        device
            .clear(ClearFlags::COLOR | ClearFlags::DEPTH, 0, 0, 0, 255, 1.0, 0)
            .expect("clear");
        device.draw(PrimitiveType::Triangles, 0, 3).expect("draw");
        device.disable_state(RenderState::Blend).expect("disable blend");
        device.flip().expect("present");

        assert_eq!(device.frames_presented(), 1);
        assert_eq!(device.draw_call_count(), 1);

        device
            .destroy_vertex_program(vertex_program)
            .expect("vp destruction");
        device
            .destroy_fragment_program(fragment_program)
            .expect("fp destruction");
    });
}
