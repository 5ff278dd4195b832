//! Binding slots shared by the host and the shading stage.
//!
//! Every value here is part of the contract with the WGSL in
//! [`crate::shader`]: changing one is a breaking change for both sides.

/// Buffer slots. `Vertices` is a vertex-buffer slot, the others are bindings
/// inside [`UNIFORM_GROUP`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferIndex {
    Vertices = 0,
    Uniforms = 1,
    Lights = 2,
    FragmentUniforms = 3,
}

impl BufferIndex {
    pub const ALL: [BufferIndex; 4] = [
        BufferIndex::Vertices,
        BufferIndex::Uniforms,
        BufferIndex::Lights,
        BufferIndex::FragmentUniforms,
    ];

    pub const fn index(self) -> u32 {
        self as u32
    }

    pub const fn label(self) -> &'static str {
        match self {
            BufferIndex::Vertices => "vertices",
            BufferIndex::Uniforms => "uniforms",
            BufferIndex::Lights => "lights",
            BufferIndex::FragmentUniforms => "fragment-uniforms",
        }
    }
}

/// Vertex attribute locations.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position = 0,
    Normal = 1,
    Uv = 2,
}

impl Attribute {
    pub const fn location(self) -> u32 {
        self as u32
    }
}

/// Texture bindings inside [`MATERIAL_GROUP`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureIndex {
    BaseColor = 0,
}

impl TextureIndex {
    pub const ALL: [TextureIndex; 1] = [TextureIndex::BaseColor];

    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Bind group holding the transform, light and fragment blocks.
pub const UNIFORM_GROUP: u32 = 0;

/// Bind group holding the base-color texture and its sampler.
pub const MATERIAL_GROUP: u32 = 1;

/// Samplers share the binding namespace with textures, so the base-color
/// sampler sits right after the last texture slot.
pub const BASE_COLOR_SAMPLER_BINDING: u32 = TextureIndex::ALL.len() as u32;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_values_are_stable() {
        assert_eq!(BufferIndex::Vertices.index(), 0);
        assert_eq!(BufferIndex::Uniforms.index(), 1);
        assert_eq!(BufferIndex::Lights.index(), 2);
        assert_eq!(BufferIndex::FragmentUniforms.index(), 3);
        assert_eq!(Attribute::Position.location(), 0);
        assert_eq!(Attribute::Normal.location(), 1);
        assert_eq!(Attribute::Uv.location(), 2);
        assert_eq!(TextureIndex::BaseColor.index(), 0);
    }

    #[test]
    fn material_bindings_do_not_collide() {
        let textures: HashSet<u32> = TextureIndex::ALL.iter().map(|t| t.index()).collect();
        assert!(!textures.contains(&BASE_COLOR_SAMPLER_BINDING));
    }

    #[test]
    fn buffer_slots_are_unique() {
        let slots: HashSet<u32> = BufferIndex::ALL.iter().map(|b| b.index()).collect();
        assert_eq!(slots.len(), BufferIndex::ALL.len());
    }
}
