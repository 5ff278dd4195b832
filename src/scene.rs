use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec2, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::light::{Light, LightKind};

/// Scene description: one camera, the models to draw and the lights shading
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub camera: Camera,
    pub models: Vec<Model>,
    pub lights: Vec<Light>,
}

impl Scene {
    /// Parses a scene XML document. Angles are given in degrees.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;

        let camera = match document.descendants().find(|n| n.has_tag_name("camera")) {
            Some(node) => parse_camera(&node).context("invalid <camera>")?,
            None => Camera::default(),
        };

        let mut models = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("model")) {
            let model = parse_model(&node)
                .with_context(|| format!("invalid <model> #{}", models.len() + 1))?;
            models.push(model);
        }

        let mut lights = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("light")) {
            let light = parse_light(&node)
                .with_context(|| format!("invalid <light> #{}", lights.len() + 1))?;
            lights.push(light);
        }

        Ok(Self {
            camera,
            models,
            lights,
        })
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|model| model.name == name)
    }
}

/// Perspective camera. `rotation` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.2, -40.0),
            rotation: Vec3::ZERO,
            fov_degrees: 50.0,
            aspect: 1.0,
            near: 0.001,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Left-handed perspective with depth mapped to `0..1`.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.position) * rotation_matrix(self.rotation)
    }

    pub fn zoom(&mut self, delta: f32, sensitivity: f32) {
        self.position.z += delta * sensitivity;
    }

    pub fn rotate(&mut self, translation: Vec2, sensitivity: f32) {
        self.rotation.x += translation.y * sensitivity;
        self.rotation.y -= translation.x * sensitivity;
    }

    pub fn translate(&mut self, translation: Vec2, sensitivity: f32) {
        self.position.x += translation.x * sensitivity;
        self.position.y += translation.y * sensitivity;
    }
}

/// Drawable node. `rotation` is in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// UV repeat count across the model's surface.
    #[serde(default = "default_tiling")]
    pub tiling: u32,
    #[serde(default = "default_color")]
    pub base_color: Vec3,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            tiling: default_tiling(),
            base_color: default_color(),
        }
    }
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * rotation_matrix(self.rotation)
            * Mat4::from_scale(self.scale)
    }
}

/// Euler rotation applied X, then Y, then Z.
pub fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_z(rotation.z) * Mat4::from_rotation_y(rotation.y) * Mat4::from_rotation_x(rotation.x)
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_tiling() -> u32 {
    1
}

fn parse_camera(node: &Node<'_, '_>) -> Result<Camera> {
    let defaults = Camera::default();
    let camera = Camera {
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        rotation: parse_degrees3(optional_text(node, "rotation"), defaults.rotation)?,
        fov_degrees: parse_f32(optional_text(node, "fov"), defaults.fov_degrees)?,
        aspect: parse_f32(optional_text(node, "aspect"), defaults.aspect)?,
        near: parse_f32(optional_text(node, "near"), defaults.near)?,
        far: parse_f32(optional_text(node, "far"), defaults.far)?,
    };
    if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
        bail!("fov must be between 0 and 180 degrees, got {}", camera.fov_degrees);
    }
    if camera.aspect <= 0.0 {
        bail!("aspect must be positive, got {}", camera.aspect);
    }
    if camera.near <= 0.0 || camera.far <= camera.near {
        bail!(
            "clip planes must satisfy 0 < near < far, got near {} far {}",
            camera.near,
            camera.far
        );
    }
    Ok(camera)
}

fn parse_model(node: &Node<'_, '_>) -> Result<Model> {
    let defaults = Model::default();
    let tiling = match optional_text(node, "tiling") {
        Some(text) => text
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse tiling: {err}"))?,
        None => defaults.tiling,
    };
    if tiling == 0 {
        bail!("tiling must be at least 1");
    }
    Ok(Model {
        name: required_text(node, "name")?,
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        rotation: parse_degrees3(optional_text(node, "rotation"), defaults.rotation)?,
        scale: parse_vec3(optional_text(node, "scale"), defaults.scale)?,
        tiling,
        base_color: parse_color(optional_text(node, "color"), defaults.base_color)?,
    })
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let defaults = Light::default();
    let kind = match optional_text(node, "type") {
        Some(name) => {
            LightKind::from_name(&name).ok_or_else(|| anyhow!("unknown light type {name:?}"))?
        }
        None => defaults.kind,
    };
    Ok(Light {
        kind,
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        color: parse_color(optional_text(node, "color"), defaults.color)?,
        specular_color: parse_color(optional_text(node, "specular"), defaults.specular_color)?,
        intensity: parse_f32(optional_text(node, "intensity"), defaults.intensity)?,
        attenuation: parse_vec3(optional_text(node, "attenuation"), defaults.attenuation)?,
        cone_angle: parse_f32(
            optional_text(node, "cone-angle"),
            defaults.cone_angle.to_degrees(),
        )?
        .to_radians(),
        cone_direction: parse_vec3(
            optional_text(node, "cone-direction"),
            defaults.cone_direction,
        )?,
        cone_attenuation: parse_f32(
            optional_text(node, "cone-attenuation"),
            defaults.cone_attenuation,
        )?,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("{what} component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "{what} needs 3 components, got {}",
            numbers.len()
        )),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_components(&value, "vector"),
        None => Ok(default),
    }
}

fn parse_degrees3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => {
            let degrees = parse_components(&value, "rotation")?;
            Ok(Vec3::new(
                degrees.x.to_radians(),
                degrees.y.to_radians(),
                degrees.z.to_radians(),
            ))
        }
        None => Ok(default),
    }
}

/// Colors are written as 0-255 channels.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(parse_components(&value, "color")? / 255.0),
        None => Ok(default),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <camera>
            <position>0 0 -10</position>
            <fov>60</fov>
            <aspect>1.5</aspect>
        </camera>
        <model>
            <name>Title</name>
            <position>0 2 0</position>
            <rotation>0 90 0</rotation>
            <scale>2 2 2</scale>
            <tiling>4</tiling>
            <color>255 0 0</color>
        </model>
        <model>
            <name>Logo</name>
        </model>
        <light>
            <type>sun</type>
            <position>1 2 -2</position>
        </light>
        <light>
            <type>spot</type>
            <position>0 5 0</position>
            <cone-angle>30</cone-angle>
            <cone-direction>0 -1 0</cone-direction>
            <cone-attenuation>4</cone-attenuation>
            <attenuation>1 0.1 0.01</attenuation>
        </light>
        <light>
            <type>ambient</type>
            <color>51 51 51</color>
            <intensity>0.5</intensity>
        </light>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_models_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.models.len(), 2);
        assert_eq!(scene.lights.len(), 3);
        assert_eq!(scene.camera.position, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(scene.camera.fov_degrees, 60.0);
        assert_eq!(scene.camera.near, 0.001);

        let title = scene.model("Title").unwrap();
        assert_eq!(title.tiling, 4);
        assert_eq!(title.base_color, Vec3::new(1.0, 0.0, 0.0));
        assert!((title.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let logo = scene.model("Logo").unwrap();
        assert_eq!(logo.tiling, 1);
        assert_eq!(logo.scale, Vec3::ONE);
    }

    #[test]
    fn light_values_are_converted() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.lights[0].kind, LightKind::Sunlight);
        assert_eq!(scene.lights[0].intensity, 1.0);

        let spot = &scene.lights[1];
        assert_eq!(spot.kind, LightKind::Spotlight);
        assert!((spot.cone_angle - 30f32.to_radians()).abs() < 1e-6);
        assert_eq!(spot.cone_direction, Vec3::NEG_Y);
        assert_eq!(spot.attenuation, Vec3::new(1.0, 0.1, 0.01));

        let ambient = &scene.lights[2];
        assert_eq!(ambient.kind, LightKind::Ambientlight);
        assert!((ambient.color.x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let scene = Scene::from_xml("<scene/>").unwrap();
        assert_eq!(scene.camera, Camera::default());
        assert!(scene.models.is_empty());
        assert!(scene.lights.is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        let err = Scene::from_xml("<scene><light><type>laser</type></light></scene>").unwrap_err();
        assert!(format!("{err:#}").contains("unknown light type"));

        let err = Scene::from_xml("<scene><model><tiling>2</tiling></model></scene>").unwrap_err();
        assert!(format!("{err:#}").contains("<name> tag is missing"));

        let err = Scene::from_xml("<scene><model><name>a</name><tiling>0</tiling></model></scene>")
            .unwrap_err();
        assert!(format!("{err:#}").contains("tiling"));

        let err = Scene::from_xml("<scene><camera><near>5</near><far>1</far></camera></scene>")
            .unwrap_err();
        assert!(format!("{err:#}").contains("clip planes"));

        assert!(Scene::from_xml("<scene><model><name>a</name><position>1 2</position></model></scene>").is_err());
    }

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let mut model = Model::new("box");
        model.position = Vec3::new(0.0, 0.0, 5.0);
        model.rotation = Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2);
        model.scale = Vec3::splat(2.0);
        let p = model.model_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn view_moves_camera_to_origin() {
        let camera = Camera::default();
        let p = camera.view_matrix().transform_point3(camera.position);
        assert!(p.length() < 1e-5);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let camera = Camera::default();
        let clip = camera.projection_matrix() * Vec3::new(0.0, 0.0, camera.near).extend(1.0);
        assert!((clip.z / clip.w).abs() < 1e-4);
        let clip = camera.projection_matrix() * Vec3::new(0.0, 0.0, camera.far).extend(1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn gestures_move_camera() {
        let mut camera = Camera::default();
        camera.zoom(2.0, 0.5);
        assert_eq!(camera.position.z, -39.0);
        camera.rotate(Vec2::new(1.0, 2.0), 0.1);
        assert!((camera.rotation.x - 0.2).abs() < 1e-6);
        assert!((camera.rotation.y + 0.1).abs() < 1e-6);
        camera.translate(Vec2::new(3.0, -1.0), 1.0);
        assert_eq!(camera.position.x, 3.0);
        assert!((camera.position.y - 0.2).abs() < 1e-6);
    }
}
