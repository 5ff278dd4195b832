//! WGSL rendition of the shading stage.
//!
//! The source is generated from a template so the light capacity, binding
//! numbers, attribute locations and light-kind tags come from the same Rust
//! constants the host uses.

use crate::bindings::{
    Attribute, BufferIndex, TextureIndex, BASE_COLOR_SAMPLER_BINDING, MATERIAL_GROUP, UNIFORM_GROUP,
};
use crate::light::{LightKind, MAX_LIGHTS};
use crate::lighting::{DEFAULT_SHININESS, MIN_ATTENUATION_DENOMINATOR, MIN_CONE_SPAN};

pub const VERTEX_ENTRY: &str = "vertex_main";
pub const FRAGMENT_ENTRY: &str = "fragment_main";

const SHADER_TEMPLATE: &str = r#"
const MAX_LIGHTS: u32 = {{MAX_LIGHTS}}u;

const LIGHT_UNUSED: u32 = {{LIGHT_UNUSED}}u;
const LIGHT_SUNLIGHT: u32 = {{LIGHT_SUNLIGHT}}u;
const LIGHT_SPOTLIGHT: u32 = {{LIGHT_SPOTLIGHT}}u;
const LIGHT_POINTLIGHT: u32 = {{LIGHT_POINTLIGHT}}u;
const LIGHT_AMBIENTLIGHT: u32 = {{LIGHT_AMBIENTLIGHT}}u;

const MIN_ATTENUATION_DENOMINATOR: f32 = {{MIN_ATTENUATION_DENOMINATOR}};
const MIN_CONE_SPAN: f32 = {{MIN_CONE_SPAN}};
const SHININESS: f32 = {{SHININESS}};
const PI: f32 = 3.14159265;

struct Uniforms {
    model_matrix: mat4x4<f32>,
    view_matrix: mat4x4<f32>,
    projection_matrix: mat4x4<f32>,
    normal_matrix: mat3x3<f32>,
}

struct Light {
    position: vec3<f32>,
    _pad0: f32,
    color: vec3<f32>,
    _pad1: f32,
    specular_color: vec3<f32>,
    intensity: f32,
    attenuation: vec3<f32>,
    light_type: u32,
    cone_angle: f32,
    _pad2: f32,
    _pad3: f32,
    _pad4: f32,
    cone_direction: vec3<f32>,
    cone_attenuation: f32,
}

struct FragmentUniforms {
    light_count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    camera_position: vec3<f32>,
    tiling: u32,
}

struct VertexIn {
    @location({{LOCATION_POSITION}}) position: vec3<f32>,
    @location({{LOCATION_NORMAL}}) normal: vec3<f32>,
    @location({{LOCATION_UV}}) uv: vec2<f32>,
}

struct VertexOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct Radiance {
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    ambient: vec3<f32>,
}

@group({{UNIFORM_GROUP}}) @binding({{BINDING_UNIFORMS}})
var<uniform> uniforms: Uniforms;

@group({{UNIFORM_GROUP}}) @binding({{BINDING_LIGHTS}})
var<uniform> lights: array<Light, {{MAX_LIGHTS}}>;

@group({{UNIFORM_GROUP}}) @binding({{BINDING_FRAGMENT_UNIFORMS}})
var<uniform> fragment_uniforms: FragmentUniforms;

@group({{MATERIAL_GROUP}}) @binding({{BINDING_BASE_COLOR}})
var base_color_texture: texture_2d<f32>;

@group({{MATERIAL_GROUP}}) @binding({{BINDING_BASE_COLOR_SAMPLER}})
var base_color_sampler: sampler;

@vertex
fn vertex_main(input: VertexIn) -> VertexOut {
    var output: VertexOut;
    let world = uniforms.model_matrix * vec4<f32>(input.position, 1.0);
    output.clip_position = uniforms.projection_matrix * uniforms.view_matrix * world;
    output.world_position = world.xyz;
    output.world_normal = uniforms.normal_matrix * input.normal;
    output.uv = input.uv;
    return output;
}

fn safe_normalize(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len > 0.0) {
        return v / len;
    }
    return vec3<f32>(0.0);
}

fn scaled(terms: Radiance, factor: f32) -> Radiance {
    var output: Radiance;
    output.diffuse = terms.diffuse * factor;
    output.specular = terms.specular * factor;
    output.ambient = terms.ambient * factor;
    return output;
}

fn attenuation_factor(coefficients: vec3<f32>, dist: f32) -> f32 {
    let c = max(coefficients, vec3<f32>(0.0));
    let d = max(dist, 0.0);
    return 1.0 / max(c.x + c.y * d + c.z * d * d, MIN_ATTENUATION_DENOMINATOR);
}

fn spot_falloff(cos_angle: f32, cone_angle: f32, exponent: f32) -> f32 {
    let cos_cone = cos(clamp(cone_angle, 0.0, PI));
    let span = 1.0 - cos_cone;
    if (span <= MIN_CONE_SPAN) {
        return 0.0;
    }
    let t = clamp((cos_angle - cos_cone) / span, 0.0, 1.0);
    if (t <= 0.0) {
        return 0.0;
    }
    return pow(t, max(exponent, 0.0));
}

fn directional_terms(light: Light, direction: vec3<f32>, normal: vec3<f32>, view_direction: vec3<f32>) -> Radiance {
    var terms: Radiance;
    let diffuse_intensity = max(dot(normal, -direction), 0.0);
    if (diffuse_intensity <= 0.0) {
        return terms;
    }
    let reflection = reflect(direction, normal);
    let specular_intensity = pow(max(dot(reflection, view_direction), 0.0), SHININESS);
    terms.diffuse = light.color * diffuse_intensity;
    terms.specular = light.specular_color * specular_intensity;
    return terms;
}

fn light_contribution(light: Light, position: vec3<f32>, normal: vec3<f32>, view_direction: vec3<f32>) -> Radiance {
    var result: Radiance;
    let intensity = max(light.intensity, 0.0);
    switch light.light_type {
        case LIGHT_SUNLIGHT: {
            let direction = safe_normalize(-light.position);
            result = scaled(directional_terms(light, direction, normal, view_direction), intensity);
        }
        case LIGHT_POINTLIGHT: {
            let offset = position - light.position;
            let direction = safe_normalize(offset);
            let factor = attenuation_factor(light.attenuation, length(offset));
            result = scaled(directional_terms(light, direction, normal, view_direction), intensity * factor);
        }
        case LIGHT_SPOTLIGHT: {
            let offset = position - light.position;
            let direction = safe_normalize(offset);
            let axis = safe_normalize(light.cone_direction);
            let falloff = spot_falloff(dot(axis, direction), light.cone_angle, light.cone_attenuation);
            if (falloff > 0.0) {
                let factor = attenuation_factor(light.attenuation, length(offset));
                result = scaled(directional_terms(light, direction, normal, view_direction), intensity * factor * falloff);
            }
        }
        case LIGHT_AMBIENTLIGHT: {
            result.ambient = light.color * intensity;
        }
        case LIGHT_UNUSED, default: {}
    }
    return result;
}

@fragment
fn fragment_main(input: VertexOut) -> @location(0) vec4<f32> {
    let normal = safe_normalize(input.world_normal);
    let view_direction = safe_normalize(fragment_uniforms.camera_position - input.world_position);
    let count = min(fragment_uniforms.light_count, MAX_LIGHTS);

    var total: Radiance;
    for (var i: u32 = 0u; i < count; i = i + 1u) {
        let contribution = light_contribution(lights[i], input.world_position, normal, view_direction);
        total.diffuse = total.diffuse + contribution.diffuse;
        total.specular = total.specular + contribution.specular;
        total.ambient = total.ambient + contribution.ambient;
    }

    let uv = input.uv * f32(fragment_uniforms.tiling);
    let base_color = textureSample(base_color_texture, base_color_sampler, uv).rgb;
    let color = base_color * (total.diffuse + total.ambient) + total.specular;
    return vec4<f32>(clamp(color, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

/// Returns the WGSL source with every shared constant substituted.
pub fn shader_source() -> String {
    let substitutions: [(&str, String); 19] = [
        ("MAX_LIGHTS", MAX_LIGHTS.to_string()),
        ("LIGHT_UNUSED", LightKind::Unused.tag().to_string()),
        ("LIGHT_SUNLIGHT", LightKind::Sunlight.tag().to_string()),
        ("LIGHT_SPOTLIGHT", LightKind::Spotlight.tag().to_string()),
        ("LIGHT_POINTLIGHT", LightKind::Pointlight.tag().to_string()),
        ("LIGHT_AMBIENTLIGHT", LightKind::Ambientlight.tag().to_string()),
        ("MIN_ATTENUATION_DENOMINATOR", wgsl_float(MIN_ATTENUATION_DENOMINATOR)),
        ("MIN_CONE_SPAN", wgsl_float(MIN_CONE_SPAN)),
        ("SHININESS", wgsl_float(DEFAULT_SHININESS)),
        ("LOCATION_POSITION", Attribute::Position.location().to_string()),
        ("LOCATION_NORMAL", Attribute::Normal.location().to_string()),
        ("LOCATION_UV", Attribute::Uv.location().to_string()),
        ("UNIFORM_GROUP", UNIFORM_GROUP.to_string()),
        ("MATERIAL_GROUP", MATERIAL_GROUP.to_string()),
        ("BINDING_UNIFORMS", BufferIndex::Uniforms.index().to_string()),
        ("BINDING_LIGHTS", BufferIndex::Lights.index().to_string()),
        (
            "BINDING_FRAGMENT_UNIFORMS",
            BufferIndex::FragmentUniforms.index().to_string(),
        ),
        ("BINDING_BASE_COLOR", TextureIndex::BaseColor.index().to_string()),
        (
            "BINDING_BASE_COLOR_SAMPLER",
            BASE_COLOR_SAMPLER_BINDING.to_string(),
        ),
    ];

    let mut source = SHADER_TEMPLATE.to_string();
    for (key, value) in &substitutions {
        source = source.replace(&format!("{{{{{key}}}}}"), value);
    }
    source
}

fn wgsl_float(value: f32) -> String {
    format!("{value:.8}")
}
