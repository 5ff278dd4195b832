//! wgpu plumbing for the shading pipeline: bind group layouts, the shared
//! light buffer and per-draw uniform bind groups.

use std::mem::size_of;

use bytemuck::bytes_of;
use log::debug;
use wgpu::util::DeviceExt;

use crate::bindings::{BufferIndex, TextureIndex, BASE_COLOR_SAMPLER_BINDING};
use crate::frame::DrawUniforms;
use crate::light::{GpuLight, LightArray, MAX_LIGHTS};
use crate::shader::{shader_source, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::texture::Texture;
use crate::uniforms::{FragmentUniforms, TransformUniforms};
use crate::vertex::MeshVertex;

pub const LIGHT_BUFFER_SIZE: u64 = (size_of::<GpuLight>() * MAX_LIGHTS) as u64;

fn uniform_entry(
    index: BufferIndex,
    visibility: wgpu::ShaderStages,
    size: u64,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: index.index(),
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}

/// Entries of the bind group at [`UNIFORM_GROUP`](crate::bindings::UNIFORM_GROUP).
pub fn uniform_layout_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        uniform_entry(
            BufferIndex::Uniforms,
            wgpu::ShaderStages::VERTEX,
            size_of::<TransformUniforms>() as u64,
        ),
        uniform_entry(
            BufferIndex::Lights,
            wgpu::ShaderStages::FRAGMENT,
            LIGHT_BUFFER_SIZE,
        ),
        uniform_entry(
            BufferIndex::FragmentUniforms,
            wgpu::ShaderStages::FRAGMENT,
            size_of::<FragmentUniforms>() as u64,
        ),
    ]
}

/// Entries of the bind group at [`MATERIAL_GROUP`](crate::bindings::MATERIAL_GROUP).
pub fn material_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: TextureIndex::BaseColor.index(),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: BASE_COLOR_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

/// Repeat addressing on both axes, nearest filtering.
pub fn sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("base-color-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Long-lived GPU objects shared by every draw of a frame.
pub struct FrameResources {
    pub shader: wgpu::ShaderModule,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
    pub sampler: wgpu::Sampler,
    light_buffer: wgpu::Buffer,
}

impl FrameResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let source = shader_source();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shading-shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-layout"),
            entries: &uniform_layout_entries(),
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material-bind-layout"),
            entries: &material_layout_entries(),
        });

        // Order follows UNIFORM_GROUP, MATERIAL_GROUP.
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shading-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(BufferIndex::Lights.label()),
            size: LIGHT_BUFFER_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&sampler_descriptor());

        Self {
            shader,
            uniform_layout,
            material_layout,
            pipeline_layout,
            sampler,
            light_buffer,
        }
    }

    /// Writes every slot of the light array, unused ones included.
    pub fn upload_lights(&self, queue: &wgpu::Queue, lights: &LightArray) {
        debug!("uploading {} light(s)", lights.len());
        queue.write_buffer(&self.light_buffer, 0, lights.as_bytes());
    }

    /// Builds the uniform bind group for one draw. Buffers are created with
    /// their contents so that draws recorded into the same pass keep
    /// independent values.
    pub fn draw_bind_group(&self, device: &wgpu::Device, draw: &DrawUniforms) -> wgpu::BindGroup {
        let transform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(BufferIndex::Uniforms.label()),
            contents: bytes_of(&draw.transform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let fragment = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(BufferIndex::FragmentUniforms.label()),
            contents: bytes_of(&draw.fragment),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout: &self.uniform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: BufferIndex::Uniforms.index(),
                    resource: transform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: BufferIndex::Lights.index(),
                    resource: self.light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: BufferIndex::FragmentUniforms.index(),
                    resource: fragment.as_entire_binding(),
                },
            ],
        })
    }

    /// Uploads a base-color texture and binds it with the shared sampler.
    pub fn material_bind_group(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &Texture,
        label: &str,
    ) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: texture.width(),
            height: texture.height(),
            depth_or_array_layers: 1,
        };
        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * texture.width()),
                rows_per_image: Some(texture.height()),
            },
            size,
        );
        let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material-bind-group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TextureIndex::BaseColor.index(),
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: BASE_COLOR_SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shading-pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_size(entry: &wgpu::BindGroupLayoutEntry) -> Option<u64> {
        match entry.ty {
            wgpu::BindingType::Buffer {
                min_binding_size, ..
            } => min_binding_size.map(|size| size.get()),
            _ => None,
        }
    }

    #[test]
    fn uniform_entries_use_registry_slots() {
        let entries = uniform_layout_entries();
        let bindings: Vec<u32> = entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![1, 2, 3]);
        assert_eq!(entries[0].visibility, wgpu::ShaderStages::VERTEX);
        assert_eq!(entries[1].visibility, wgpu::ShaderStages::FRAGMENT);
        assert_eq!(entries[2].visibility, wgpu::ShaderStages::FRAGMENT);
    }

    #[test]
    fn uniform_entries_bind_whole_structs() {
        let entries = uniform_layout_entries();
        assert_eq!(min_size(&entries[0]), Some(240));
        assert_eq!(min_size(&entries[1]), Some(96 * 16));
        assert_eq!(min_size(&entries[2]), Some(32));
    }

    #[test]
    fn material_entries_pair_texture_with_sampler() {
        let entries = material_layout_entries();
        assert_eq!(entries[0].binding, 0);
        assert!(matches!(entries[0].ty, wgpu::BindingType::Texture { .. }));
        assert_eq!(entries[1].binding, 1);
        assert!(matches!(
            entries[1].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
        ));
    }

    #[test]
    fn sampler_repeats_with_nearest_filtering() {
        let descriptor = sampler_descriptor();
        assert_eq!(descriptor.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(descriptor.address_mode_v, wgpu::AddressMode::Repeat);
        assert_eq!(descriptor.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(descriptor.min_filter, wgpu::FilterMode::Nearest);
    }
}
