use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::bindings::Attribute;
use crate::layout::{field_layout, FieldLayout, GpuLayout};

/// Interleaved vertex produced by the extrusion mesher.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<MeshVertex>() == 32);

impl MeshVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: std::mem::offset_of!(MeshVertex, position) as wgpu::BufferAddress,
            shader_location: Attribute::Position.location(),
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: std::mem::offset_of!(MeshVertex, normal) as wgpu::BufferAddress,
            shader_location: Attribute::Normal.location(),
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: std::mem::offset_of!(MeshVertex, uv) as wgpu::BufferAddress,
            shader_location: Attribute::Uv.location(),
        },
    ];

    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl GpuLayout for MeshVertex {
    const WGSL_NAME: &'static str = "VertexIn";

    fn fields() -> Vec<FieldLayout> {
        vec![
            field_layout!(MeshVertex, position),
            field_layout!(MeshVertex, normal),
            field_layout!(MeshVertex, uv),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_follow_registry() {
        let layout = MeshVertex::layout();
        assert_eq!(layout.array_stride, 32);
        let locations: Vec<(u32, u64)> = layout
            .attributes
            .iter()
            .map(|a| (a.shader_location, a.offset))
            .collect();
        assert_eq!(locations, vec![(0, 0), (1, 12), (2, 24)]);
    }

    #[test]
    fn vertex_bytes_are_interleaved() {
        let vertex = MeshVertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::new(0.5, 0.25));
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&vertex));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 0.5, 0.25]);
    }
}
