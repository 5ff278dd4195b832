use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{field_layout, FieldLayout, GpuLayout};

/// Number of light slots uploaded each frame.
pub const MAX_LIGHTS: usize = 16;

/// Behavioral kind of a light. The discriminants are the tags written to
/// [`GpuLight::light_type`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    #[default]
    Unused = 0,
    Sunlight = 1,
    Spotlight = 2,
    Pointlight = 3,
    Ambientlight = 4,
}

impl LightKind {
    pub const ALL: [LightKind; 5] = [
        LightKind::Unused,
        LightKind::Sunlight,
        LightKind::Spotlight,
        LightKind::Pointlight,
        LightKind::Ambientlight,
    ];

    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Decodes a tag read back from a light record.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == raw)
    }

    pub fn name(self) -> &'static str {
        match self {
            LightKind::Unused => "unused",
            LightKind::Sunlight => "sunlight",
            LightKind::Spotlight => "spotlight",
            LightKind::Pointlight => "pointlight",
            LightKind::Ambientlight => "ambientlight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "unused" => Some(LightKind::Unused),
            "sun" | "sunlight" | "directional" => Some(LightKind::Sunlight),
            "spot" | "spotlight" => Some(LightKind::Spotlight),
            "point" | "pointlight" => Some(LightKind::Pointlight),
            "ambient" | "ambientlight" => Some(LightKind::Ambientlight),
            _ => None,
        }
    }
}

/// Host-side description of a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Vec3,
    pub specular_color: Vec3,
    pub intensity: f32,
    /// Constant, linear and quadratic distance coefficients.
    pub attenuation: Vec3,
    /// Half-angle of the cone in radians.
    pub cone_angle: f32,
    pub cone_direction: Vec3,
    /// Exponent shaping the edge of the cone.
    pub cone_attenuation: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Sunlight,
            position: Vec3::ZERO,
            color: Vec3::ONE,
            specular_color: Vec3::splat(0.6),
            intensity: 1.0,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            cone_angle: 0.0,
            cone_direction: Vec3::new(0.0, 0.0, -1.0),
            cone_attenuation: 0.0,
        }
    }
}

impl Light {
    /// Directional light shining from `position` towards the origin.
    pub fn sun(position: Vec3) -> Self {
        Self {
            kind: LightKind::Sunlight,
            position,
            ..Self::default()
        }
    }

    pub fn point(position: Vec3, color: Vec3, attenuation: Vec3) -> Self {
        Self {
            kind: LightKind::Pointlight,
            position,
            color,
            attenuation,
            ..Self::default()
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, cone_angle: f32, cone_attenuation: f32) -> Self {
        Self {
            kind: LightKind::Spotlight,
            position,
            cone_direction: direction,
            cone_angle,
            cone_attenuation,
            ..Self::default()
        }
    }

    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambientlight,
            color,
            intensity,
            ..Self::default()
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn to_gpu(&self) -> GpuLight {
        GpuLight {
            position: self.position.to_array(),
            color: self.color.to_array(),
            specular_color: self.specular_color.to_array(),
            intensity: self.intensity.max(0.0),
            attenuation: self.attenuation.to_array(),
            light_type: self.kind.tag(),
            cone_angle: self.cone_angle,
            cone_direction: self.cone_direction.to_array(),
            cone_attenuation: self.cone_attenuation,
            ..GpuLight::zeroed()
        }
    }
}

/// One light record as laid out in the uploaded light array.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
    pub specular_color: [f32; 3],
    pub intensity: f32,
    pub attenuation: [f32; 3],
    pub light_type: u32,
    pub cone_angle: f32,
    pub _pad2: f32,
    pub _pad3: f32,
    pub _pad4: f32,
    pub cone_direction: [f32; 3],
    pub cone_attenuation: f32,
}

const _: () = assert!(std::mem::size_of::<GpuLight>() == 96);
const _: () = assert!(std::mem::size_of::<GpuLight>() % 16 == 0);

impl GpuLight {
    pub fn kind(&self) -> Option<LightKind> {
        LightKind::from_raw(self.light_type)
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }

    pub fn specular_color(&self) -> Vec3 {
        Vec3::from_array(self.specular_color)
    }

    pub fn attenuation(&self) -> Vec3 {
        Vec3::from_array(self.attenuation)
    }

    pub fn cone_direction(&self) -> Vec3 {
        Vec3::from_array(self.cone_direction)
    }
}

impl GpuLayout for GpuLight {
    const WGSL_NAME: &'static str = "Light";

    fn fields() -> Vec<FieldLayout> {
        vec![
            field_layout!(GpuLight, position),
            field_layout!(GpuLight, _pad0),
            field_layout!(GpuLight, color),
            field_layout!(GpuLight, _pad1),
            field_layout!(GpuLight, specular_color),
            field_layout!(GpuLight, intensity),
            field_layout!(GpuLight, attenuation),
            field_layout!(GpuLight, light_type),
            field_layout!(GpuLight, cone_angle),
            field_layout!(GpuLight, _pad2),
            field_layout!(GpuLight, _pad3),
            field_layout!(GpuLight, _pad4),
            field_layout!(GpuLight, cone_direction),
            field_layout!(GpuLight, cone_attenuation),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LightArrayError {
    #[error("light array is full ({capacity} slots)")]
    Full { capacity: usize },
    #[error("light slot {index} is not active ({len} lights in use)")]
    OutOfRange { index: usize, len: usize },
}

/// Fixed-capacity light array with a separate count of active entries.
///
/// The whole array is uploaded; inactive slots are kept zeroed, which reads
/// back as [`LightKind::Unused`].
#[derive(Debug, Clone, PartialEq)]
pub struct LightArray {
    slots: [GpuLight; MAX_LIGHTS],
    len: usize,
}

impl Default for LightArray {
    fn default() -> Self {
        Self::new()
    }
}

impl LightArray {
    pub fn new() -> Self {
        Self {
            slots: [GpuLight::zeroed(); MAX_LIGHTS],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        MAX_LIGHTS
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value to write into [`crate::FragmentUniforms::light_count`].
    pub fn light_count(&self) -> u32 {
        self.len as u32
    }

    /// Appends a light and returns its slot.
    pub fn push(&mut self, light: &Light) -> Result<usize, LightArrayError> {
        if self.len == MAX_LIGHTS {
            return Err(LightArrayError::Full {
                capacity: MAX_LIGHTS,
            });
        }
        let index = self.len;
        self.slots[index] = light.to_gpu();
        self.len += 1;
        Ok(index)
    }

    /// Overwrites an active slot in place.
    pub fn set(&mut self, index: usize, light: &Light) -> Result<(), LightArrayError> {
        if index >= self.len {
            return Err(LightArrayError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.slots[index] = light.to_gpu();
        Ok(())
    }

    /// Resets the array for reuse by the next frame.
    pub fn clear(&mut self) {
        self.slots = [GpuLight::zeroed(); MAX_LIGHTS];
        self.len = 0;
    }

    /// The active records, in upload order.
    pub fn active(&self) -> &[GpuLight] {
        &self.slots[..self.len]
    }

    /// Every slot, active or not.
    pub fn slots(&self) -> &[GpuLight; MAX_LIGHTS] {
        &self.slots
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }
}
