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

//! A small headless walkthrough of the device layer: allocate one resource of
//! each kind, render a few frames, tear down. Run with `RUST_LOG=debug` to
//! watch the device's own log output.

use std::borrow::Cow;

use log::info;
use opal_core::{
    BlendFactor, BufferUsage, ClearFlags, DataType, DeviceDescriptor, GraphicsDevice,
    PrimitiveType, RenderError, RenderState, RenderTargetDescriptor, TextureFormat, TextureParams,
    VertexElement, VertexUsage,
};
use opal_infra::SoftDevice;

fn run() -> Result<(), RenderError> {
    let device = SoftDevice::new(&DeviceDescriptor {
        display_width: 1280,
        display_height: 720,
        app_title: Cow::Borrowed("opal sandbox"),
        swap_interval: 1,
        print_device_info: true,
    })?;

    // A quad of interleaved position + texcoord vertices.
    #[rustfmt::skip]
    let vertices: [f32; 20] = [
        -1.0, -1.0, 0.0,   0.0, 0.0,
         1.0, -1.0, 0.0,   1.0, 0.0,
         1.0,  1.0, 0.0,   1.0, 1.0,
        -1.0,  1.0, 0.0,   0.0, 1.0,
    ];
    let vertex_bytes: Vec<u8> = vertices.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let vertex_buffer = device.create_vertex_buffer(
        vertex_bytes.len() as u64,
        Some(&vertex_bytes),
        BufferUsage::Static,
    )?;

    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
    let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_ne_bytes()).collect();
    let index_buffer = device.create_index_buffer(
        index_bytes.len() as u64,
        Some(&index_bytes),
        BufferUsage::Static,
    )?;

    let declaration = device.create_vertex_declaration(&[
        VertexElement {
            size: 3,
            usage: VertexUsage::Position,
            usage_index: 0,
            data_type: DataType::Float,
        },
        VertexElement {
            size: 2,
            usage: VertexUsage::TexCoord,
            usage_index: 0,
            data_type: DataType::Float,
        },
    ])?;
    let layout = device.vertex_declaration(declaration)?;
    info!(
        "Quad layout: {} streams, stride {} bytes",
        layout.stream_count(),
        layout.stride()
    );

    let checker: Vec<u8> = (0..16)
        .flat_map(|i| {
            if (i / 4 + i % 4) % 2 == 0 {
                [255u8, 255, 255, 255]
            } else {
                [32, 32, 32, 255]
            }
        })
        .collect();
    let texture = device.create_texture(&TextureParams {
        width: 4,
        height: 4,
        format: TextureFormat::Rgba,
        data: Some(&checker),
        ..Default::default()
    })?;

    let vertex_program = device.create_vertex_program(b"!!sandbox vertex program")?;
    let fragment_program = device.create_fragment_program(b"!!sandbox fragment program")?;

    let shadow_target = device.create_render_target(&RenderTargetDescriptor {
        depth: Some(TextureParams {
            width: 512,
            height: 512,
            format: TextureFormat::Depth,
            ..Default::default()
        }),
        ..Default::default()
    })?;

    for frame in 0..3u32 {
        // Depth pre-pass into the off-screen target.
        device.enable_render_target(shadow_target)?;
        device.set_viewport(512, 512)?;
        device.clear(ClearFlags::DEPTH, 0, 0, 0, 0, 1.0, 0)?;
        device.enable_vertex_declaration(declaration, vertex_buffer)?;
        device.draw_range_elements(
            PrimitiveType::Triangles,
            0,
            2,
            DataType::UnsignedShort,
            index_buffer,
        )?;
        device.disable_vertex_declaration(declaration)?;
        device.disable_render_target()?;

        // Main pass to the default surface.
        device.set_viewport(device.window_width(), device.window_height())?;
        device.clear(
            ClearFlags::COLOR | ClearFlags::DEPTH,
            30,
            30,
            46,
            255,
            1.0,
            0,
        )?;
        device.set_vertex_program(vertex_program)?;
        device.set_fragment_program(fragment_program)?;
        device.set_vertex_constant_block(
            0,
            &[
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        )?;
        device.set_fragment_constant(0, [1.0, 1.0, 1.0, 1.0])?;
        device.set_texture_unit(0, Some(texture))?;
        device.enable_state(RenderState::DepthTest)?;
        device.enable_state(RenderState::Blend)?;
        device.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)?;
        device.enable_vertex_declaration(declaration, vertex_buffer)?;
        device.draw_range_elements(
            PrimitiveType::Triangles,
            0,
            2,
            DataType::UnsignedShort,
            index_buffer,
        )?;
        device.disable_vertex_declaration(declaration)?;
        device.set_texture_unit(0, None)?;
        device.flip()?;

        info!("Frame {frame} presented");
    }

    info!(
        "Stats: {} frames, {} draw calls, {} bytes in use (peak {})",
        device.frames_presented(),
        device.draw_call_count(),
        device.memory_in_use(),
        device.memory_peak()
    );

    device.destroy_render_target(shadow_target)?;
    device.destroy_fragment_program(fragment_program)?;
    device.destroy_vertex_program(vertex_program)?;
    device.destroy_texture(texture)?;
    device.destroy_vertex_declaration(declaration)?;
    device.destroy_index_buffer(index_buffer)?;
    device.destroy_vertex_buffer(vertex_buffer)?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("sandbox failed: {err}");
        std::process::exit(1);
    }
}
