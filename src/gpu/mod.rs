//! Device-side resources for drawing a packed particle pool.
//!
//! One vertex buffer per attribute, an index buffer and two uniform blocks.
//! [`GpuParticleBuffers::sync`] uploads only the attributes the packer
//! flagged dirty and recreates a device buffer when its size changed.

use std::mem;

use wgpu::util::DeviceExt;

use crate::buffers::{Attribute, VertexBuffers};
use crate::shader::{MaterialState, ShaderSource, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::uniforms::{ParticleUniforms, ViewUniforms};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

static VERTEX_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 5] = [
    wgpu::vertex_attr_array![0 => Float32x3],
    wgpu::vertex_attr_array![1 => Float32x2],
    wgpu::vertex_attr_array![2 => Float32x4],
    wgpu::vertex_attr_array![3 => Float32x3],
    wgpu::vertex_attr_array![4 => Float32x3],
];

/// One non-interleaved layout per attribute, in shader-location order.
pub fn vertex_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 5] {
    Attribute::ALL.map(|attribute| wgpu::VertexBufferLayout {
        array_stride: (attribute.components() * mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES[attribute.shader_location() as usize],
    })
}

pub fn blend_state(state: &MaterialState) -> Option<wgpu::BlendState> {
    state.blending.then_some(wgpu::BlendState::ALPHA_BLENDING)
}

/// Depth state; writes are off whenever the depth test is off.
pub fn depth_stencil_state(state: &MaterialState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: state.depth_test && state.depth_write,
        depth_compare: if state.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Triangle list, no culling.
pub fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// Bind group layouts shared by every particle pipeline.
pub struct ParticleLayouts {
    /// Group 0: particle uniforms (binding 0) and view uniforms (binding 1).
    pub uniforms: wgpu::BindGroupLayout,
    /// Group 1: particle texture (binding 0) and sampler (binding 1).
    pub texture: wgpu::BindGroupLayout,
}

impl ParticleLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Uniform Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::VERTEX),
            ],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self { uniforms, texture }
    }
}

/// Build the render pipeline for a generated shader and material state.
pub fn create_pipeline(
    device: &wgpu::Device,
    layouts: &ParticleLayouts,
    source: &ShaderSource,
    state: &MaterialState,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Particle Shader"),
        source: wgpu::ShaderSource::Wgsl(source.wgsl.as_str().into()),
    });

    let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = if source.variant.textured {
        vec![&layouts.uniforms, &layouts.texture]
    } else {
        vec![&layouts.uniforms]
    };
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Pipeline Layout"),
        bind_group_layouts: &bind_group_layouts,
        push_constant_ranges: &[],
    });

    let vertex_layouts = vertex_buffer_layouts();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Particle Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: blend_state(state),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: primitive_state(),
        depth_stencil: Some(depth_stencil_state(state)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Device copies of one pool's packed buffers.
pub struct GpuParticleBuffers {
    vertex: Vec<wgpu::Buffer>,
    index: wgpu::Buffer,
    index_count: u32,
    particle_uniforms: wgpu::Buffer,
    view_uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuParticleBuffers {
    /// Upload everything and clear the dirty flags.
    pub fn new(device: &wgpu::Device, layouts: &ParticleLayouts, buffers: &mut VertexBuffers) -> Self {
        let packed: &VertexBuffers = buffers;
        let vertex = Attribute::ALL
            .iter()
            .map(|&attribute| create_vertex_buffer(device, attribute, packed))
            .collect();
        let index = create_index_buffer(device, packed);

        let particle_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::bytes_of(&ParticleUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let view_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle View Buffer"),
            contents: bytemuck::bytes_of(&ViewUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Uniform Bind Group"),
            layout: &layouts.uniforms,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: view_uniforms.as_entire_binding(),
                },
            ],
        });

        buffers.clear_all_dirty();
        Self {
            vertex,
            index,
            index_count: buffers.index_count() as u32,
            particle_uniforms,
            view_uniforms,
            bind_group,
        }
    }

    /// Upload dirty attributes. Returns how many device buffers were written.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, buffers: &mut VertexBuffers) -> usize {
        let dirty: Vec<Attribute> = buffers.dirty_attributes().collect();
        let mut written = 0;

        for attribute in dirty {
            let slot = attribute.shader_location() as usize;
            let bytes = buffers.bytes(attribute);
            if self.vertex[slot].size() == bytes.len() as wgpu::BufferAddress {
                queue.write_buffer(&self.vertex[slot], 0, bytes);
            } else {
                self.vertex[slot] = create_vertex_buffer(device, attribute, buffers);
            }
            buffers.clear_dirty(attribute);
            written += 1;
        }

        if buffers.indices_dirty() {
            let bytes = buffers.index_bytes();
            if self.index.size() == bytes.len() as wgpu::BufferAddress {
                queue.write_buffer(&self.index, 0, bytes);
            } else {
                self.index = create_index_buffer(device, buffers);
            }
            self.index_count = buffers.index_count() as u32;
            written += 1;
        }

        buffers.clear_all_dirty();
        written
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, particle: &ParticleUniforms, view: &ViewUniforms) {
        queue.write_buffer(&self.particle_uniforms, 0, bytemuck::bytes_of(particle));
        queue.write_buffer(&self.view_uniforms, 0, bytemuck::bytes_of(view));
    }

    /// Bind and draw the whole pool in one indexed call.
    ///
    /// A textured pipeline also needs group 1 bound by the caller.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        for (slot, buffer) in self.vertex.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, attribute: Attribute, buffers: &VertexBuffers) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(attribute.name()),
        contents: buffers.bytes(attribute),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

fn create_index_buffer(device: &wgpu::Device, buffers: &VertexBuffers) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Particle Index Buffer"),
        contents: buffers.index_bytes(),
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
    })
}
