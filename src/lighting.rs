//! Forward multi-light accumulation.
//!
//! This is the host-side rendition of the fragment stage in
//! [`crate::shader`]. It reads the same [`GpuLight`] records and
//! [`FragmentUniforms`] block the GPU reads, so it can be used to check the
//! uploaded data without a device.
//!
//! Diffuse, specular and ambient terms are accumulated separately across the
//! active lights and only combined with the base color at the end:
//!
//! ```text
//! color = clamp(base * (diffuse + ambient) + specular, 0, 1)
//! ```

use std::ops::Add;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::light::{GpuLight, LightKind};
use crate::texture::BaseColorSource;
use crate::uniforms::FragmentUniforms;

/// Smallest distance-attenuation denominator. Keeps a light sitting on the
/// surface finite.
pub const MIN_ATTENUATION_DENOMINATOR: f32 = 1e-4;

/// Below this, `1 - cos(coneAngle)` is treated as a zero-width cone.
pub const MIN_CONE_SPAN: f32 = 1e-6;

pub const DEFAULT_SHININESS: f32 = 32.0;

/// Surface response parameters that are not part of the uploaded blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shininess: DEFAULT_SHININESS,
        }
    }
}

/// World-space point being shaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl SurfacePoint {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            uv: Vec2::ZERO,
        }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv;
        self
    }
}

/// Separately accumulated lighting terms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Radiance {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub ambient: Vec3,
}

impl Radiance {
    pub const ZERO: Radiance = Radiance {
        diffuse: Vec3::ZERO,
        specular: Vec3::ZERO,
        ambient: Vec3::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Combines the terms with the sampled base color and clamps to [0, 1].
    pub fn resolve(&self, base_color: Vec3) -> Vec3 {
        let color = base_color * (self.diffuse + self.ambient) + self.specular;
        color.clamp(Vec3::ZERO, Vec3::ONE)
    }

    fn scaled(self, factor: f32) -> Self {
        Self {
            diffuse: self.diffuse * factor,
            specular: self.specular * factor,
            ambient: self.ambient * factor,
        }
    }
}

impl Add for Radiance {
    type Output = Radiance;

    fn add(self, rhs: Radiance) -> Radiance {
        Radiance {
            diffuse: self.diffuse + rhs.diffuse,
            specular: self.specular + rhs.specular,
            ambient: self.ambient + rhs.ambient,
        }
    }
}

/// Shades one surface point: accumulates the active lights and modulates the
/// result with the base color sampled at `uv * tiling`.
pub fn shade<B>(
    surface: &SurfacePoint,
    lights: &[GpuLight],
    fragment: &FragmentUniforms,
    material: &Material,
    base_color: &B,
) -> Vec3
where
    B: BaseColorSource + ?Sized,
{
    let radiance = accumulate(surface, lights, fragment, material);
    let uv = surface.uv * fragment.tiling as f32;
    radiance.resolve(base_color.sample(uv))
}

/// Sums the contribution of the first `light_count` records.
///
/// The declared count is clamped to the slice length, so a count larger than
/// the array never reads past it.
pub fn accumulate(
    surface: &SurfacePoint,
    lights: &[GpuLight],
    fragment: &FragmentUniforms,
    material: &Material,
) -> Radiance {
    let active = (fragment.light_count as usize).min(lights.len());
    let normal = surface.normal.normalize_or_zero();
    let view_direction = (fragment.camera_position() - surface.position).normalize_or_zero();

    lights[..active]
        .iter()
        .map(|light| light_contribution(light, surface.position, normal, view_direction, material))
        .fold(Radiance::ZERO, Add::add)
}

/// Radiance from a single light record. `normal` and `view_direction` are
/// expected to be unit length (or zero).
pub fn light_contribution(
    light: &GpuLight,
    position: Vec3,
    normal: Vec3,
    view_direction: Vec3,
    material: &Material,
) -> Radiance {
    // Tags outside the known set are treated like empty slots.
    let Some(kind) = light.kind() else {
        return Radiance::ZERO;
    };
    let intensity = light.intensity.max(0.0);

    match kind {
        LightKind::Unused => Radiance::ZERO,
        LightKind::Ambientlight => Radiance {
            ambient: light.color() * intensity,
            ..Radiance::ZERO
        },
        LightKind::Sunlight => {
            let direction = (-light.position()).normalize_or_zero();
            directional_terms(light, direction, normal, view_direction, material).scaled(intensity)
        }
        LightKind::Pointlight => {
            let offset = position - light.position();
            let direction = offset.normalize_or_zero();
            let factor = attenuation_factor(light.attenuation(), offset.length());
            directional_terms(light, direction, normal, view_direction, material)
                .scaled(intensity * factor)
        }
        LightKind::Spotlight => {
            let offset = position - light.position();
            let direction = offset.normalize_or_zero();
            let axis = light.cone_direction().normalize_or_zero();
            let falloff = spot_falloff(axis.dot(direction), light.cone_angle, light.cone_attenuation);
            if falloff <= 0.0 {
                return Radiance::ZERO;
            }
            let factor = attenuation_factor(light.attenuation(), offset.length());
            directional_terms(light, direction, normal, view_direction, material)
                .scaled(intensity * factor * falloff)
        }
    }
}

/// Lambert diffuse plus Phong specular for light travelling along
/// `direction`, before intensity or attenuation.
fn directional_terms(
    light: &GpuLight,
    direction: Vec3,
    normal: Vec3,
    view_direction: Vec3,
    material: &Material,
) -> Radiance {
    let diffuse_intensity = normal.dot(-direction).max(0.0);
    if diffuse_intensity <= 0.0 {
        return Radiance::ZERO;
    }
    let reflection = reflect(direction, normal);
    let specular_intensity = reflection
        .dot(view_direction)
        .max(0.0)
        .powf(material.shininess.max(0.0));
    Radiance {
        diffuse: light.color() * diffuse_intensity,
        specular: light.specular_color() * specular_intensity,
        ambient: Vec3::ZERO,
    }
}

/// `1 / (c + l*d + q*d^2)` with negative coefficients treated as zero and
/// the denominator kept above [`MIN_ATTENUATION_DENOMINATOR`].
pub fn attenuation_factor(coefficients: Vec3, distance: f32) -> f32 {
    let coefficients = coefficients.max(Vec3::ZERO);
    let distance = distance.max(0.0);
    let denominator =
        coefficients.x + coefficients.y * distance + coefficients.z * distance * distance;
    1.0 / denominator.max(MIN_ATTENUATION_DENOMINATOR)
}

/// Angular falloff of a spotlight.
///
/// `cos_angle` is the cosine between the cone axis and the direction from
/// the light to the surface. Returns 1 on the axis, 0 at and beyond
/// `cone_angle`, shaped in between by `exponent`.
pub fn spot_falloff(cos_angle: f32, cone_angle: f32, exponent: f32) -> f32 {
    let cos_cone = cone_angle.clamp(0.0, std::f32::consts::PI).cos();
    let span = 1.0 - cos_cone;
    if span <= MIN_CONE_SPAN {
        return 0.0;
    }
    let t = ((cos_angle - cos_cone) / span).clamp(0.0, 1.0);
    if t <= 0.0 {
        return 0.0;
    }
    t.powf(exponent.max(0.0))
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}
