//! Multi-light forward shading for extruded text and SVG models.
//!
//! The crate owns the data the shading stage reads: the binding slots, the
//! per-draw transform block, the fixed-capacity light array and the fragment
//! block. Every uploaded struct is `#[repr(C)]` and mirrored field for field
//! by the WGSL in [`shader`]. [`lighting`] runs the same accumulation on the
//! host so the uploaded data can be checked without a GPU.

pub mod bindings;
pub mod frame;
pub mod gpu;
pub mod layout;
pub mod light;
pub mod lighting;
pub mod scene;
pub mod shader;
pub mod state;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use bindings::{Attribute, BufferIndex, TextureIndex};
pub use frame::{DrawUniforms, Frame};
pub use gpu::FrameResources;
pub use layout::{GpuLayout, LayoutReport};
pub use light::{GpuLight, Light, LightArray, LightArrayError, LightKind, MAX_LIGHTS};
pub use lighting::{shade, Material, Radiance, SurfacePoint};
pub use scene::{Camera, Model, Scene};
pub use state::SceneState;
pub use texture::{BaseColorSource, SolidColor, Texture, TextureError};
pub use uniforms::{normal_matrix, FragmentUniforms, TransformUniforms};
pub use vertex::MeshVertex;
