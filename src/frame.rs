//! Per-frame assembly of the uploaded blocks.

use glam::{Vec2, Vec3};
use log::{debug, warn};

use crate::light::{LightArray, MAX_LIGHTS};
use crate::lighting::{shade, Material, SurfacePoint};
use crate::scene::Scene;
use crate::texture::BaseColorSource;
use crate::uniforms::{FragmentUniforms, TransformUniforms};

/// Blocks bound for a single model's draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawUniforms {
    pub model: String,
    pub transform: TransformUniforms,
    pub fragment: FragmentUniforms,
    pub base_color: Vec3,
}

/// Everything the GPU reads for one frame. Built as an owned value so a
/// frame in flight never shares buffers with the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub lights: LightArray,
    pub camera_position: Vec3,
    pub draws: Vec<DrawUniforms>,
    /// Lights that did not fit in the array.
    pub dropped_lights: usize,
}

impl Frame {
    pub fn build(scene: &Scene) -> Self {
        let mut lights = LightArray::new();
        let mut dropped_lights = 0;
        for light in &scene.lights {
            if lights.push(light).is_err() {
                dropped_lights += 1;
            }
        }
        if dropped_lights > 0 {
            warn!(
                "scene declares {} lights; only the first {MAX_LIGHTS} are uploaded",
                scene.lights.len()
            );
        }

        let camera_position = scene.camera.position;
        let view = scene.camera.view_matrix();
        let projection = scene.camera.projection_matrix();
        let fragment = FragmentUniforms::new(lights.light_count(), camera_position, 1);

        let draws: Vec<DrawUniforms> = scene
            .models
            .iter()
            .map(|model| DrawUniforms {
                model: model.name.clone(),
                transform: TransformUniforms::new(model.model_matrix(), view, projection),
                fragment: fragment.with_tiling(model.tiling),
                base_color: model.base_color,
            })
            .collect();

        debug!(
            "built frame with {} draw(s) and {} light(s)",
            draws.len(),
            lights.len()
        );

        Self {
            lights,
            camera_position,
            draws,
            dropped_lights,
        }
    }

    pub fn draw(&self, model: &str) -> Option<&DrawUniforms> {
        self.draws.iter().find(|draw| draw.model == model)
    }

    /// Shades a point given in the model's local space, transforming it the
    /// way the vertex stage does.
    pub fn shade_local<B>(
        &self,
        draw: &DrawUniforms,
        position: Vec3,
        normal: Vec3,
        uv: Vec2,
        material: &Material,
        base_color: &B,
    ) -> Vec3
    where
        B: BaseColorSource + ?Sized,
    {
        let world_position = draw.transform.model().transform_point3(position);
        let world_normal = draw.transform.normal() * normal;
        let surface = SurfacePoint::new(world_position, world_normal).with_uv(uv);
        shade(
            &surface,
            self.lights.slots(),
            &draw.fragment,
            material,
            base_color,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use crate::scene::Model;
    use crate::texture::SolidColor;

    fn scene_with_lights(count: usize) -> Scene {
        let mut scene = Scene::default();
        scene.models.push(Model::new("a"));
        let mut tiled = Model::new("b");
        tiled.tiling = 3;
        tiled.position = Vec3::new(1.0, 0.0, 0.0);
        scene.models.push(tiled);
        scene.lights = (0..count)
            .map(|i| Light::sun(Vec3::new(0.0, 1.0 + i as f32, 0.0)))
            .collect();
        scene
    }

    #[test]
    fn every_draw_sees_the_frame_light_count() {
        let frame = Frame::build(&scene_with_lights(3));
        assert_eq!(frame.lights.len(), 3);
        assert_eq!(frame.draws.len(), 2);
        for draw in &frame.draws {
            assert_eq!(draw.fragment.light_count, 3);
            assert_eq!(draw.fragment.camera_position(), frame.camera_position);
        }
    }

    #[test]
    fn tiling_is_per_model() {
        let frame = Frame::build(&scene_with_lights(1));
        assert_eq!(frame.draw("a").unwrap().fragment.tiling, 1);
        assert_eq!(frame.draw("b").unwrap().fragment.tiling, 3);
    }

    #[test]
    fn lights_past_capacity_are_dropped() {
        let frame = Frame::build(&scene_with_lights(MAX_LIGHTS + 4));
        assert_eq!(frame.lights.len(), MAX_LIGHTS);
        assert_eq!(frame.dropped_lights, 4);
        assert_eq!(frame.draws[0].fragment.light_count, MAX_LIGHTS as u32);
    }

    #[test]
    fn draws_carry_model_and_camera_matrices() {
        let scene = scene_with_lights(0);
        let frame = Frame::build(&scene);
        let draw = frame.draw("b").unwrap();
        assert_eq!(draw.transform.model(), scene.models[1].model_matrix());
        assert_eq!(draw.transform.view(), scene.camera.view_matrix());
        assert_eq!(draw.transform.projection(), scene.camera.projection_matrix());
    }

    #[test]
    fn shade_local_applies_model_transform() {
        let mut scene = Scene::default();
        let mut model = Model::new("flipped");
        // Rotated half a turn about X: local +Y faces world -Y.
        model.rotation = Vec3::new(std::f32::consts::PI, 0.0, 0.0);
        scene.models.push(model);
        scene.lights.push(Light::sun(Vec3::new(0.0, -1.0, 0.0)));
        scene.camera.position = Vec3::new(0.0, -5.0, 0.0);
        let frame = Frame::build(&scene);
        let draw = &frame.draws[0];

        let lit = frame.shade_local(
            draw,
            Vec3::ZERO,
            Vec3::Y,
            Vec2::ZERO,
            &Material::default(),
            &SolidColor(Vec3::splat(0.5)),
        );
        assert!(lit.x > 0.49, "{lit}");

        let unlit = frame.shade_local(
            draw,
            Vec3::ZERO,
            Vec3::NEG_Y,
            Vec2::ZERO,
            &Material::default(),
            &SolidColor(Vec3::splat(0.5)),
        );
        assert_eq!(unlit, Vec3::ZERO);
    }
}
