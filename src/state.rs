use std::sync::Arc;

use glam::{Vec2, Vec3};
use parking_lot::RwLock;

use crate::frame::Frame;
use crate::light::{Light, LightArrayError, MAX_LIGHTS};
use crate::scene::{Camera, Model, Scene};

/// Thread-safe handle on the scene that writers mutate between frames.
///
/// Clones share the same scene. Each call to [`SceneState::frame`] produces an
/// owned [`Frame`], so edits made while a frame is in flight only show up in
/// the next one.
#[derive(Debug, Default)]
pub struct SceneState {
    scene: Arc<RwLock<Scene>>,
}

impl Clone for SceneState {
    fn clone(&self) -> Self {
        Self {
            scene: Arc::clone(&self.scene),
        }
    }
}

impl SceneState {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene: Arc::new(RwLock::new(scene)),
        }
    }

    /// Returns a copy of the current scene.
    pub fn snapshot(&self) -> Scene {
        self.scene.read().clone()
    }

    pub fn frame(&self) -> Frame {
        Frame::build(&self.scene.read())
    }

    pub fn camera(&self) -> Camera {
        self.scene.read().camera
    }

    pub fn set_aspect(&self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.scene.write().camera.aspect = width / height;
        }
    }

    pub fn zoom_camera(&self, delta: f32, sensitivity: f32) {
        self.scene.write().camera.zoom(delta, sensitivity);
    }

    pub fn rotate_camera(&self, translation: Vec2, sensitivity: f32) {
        self.scene.write().camera.rotate(translation, sensitivity);
    }

    pub fn translate_camera(&self, translation: Vec2, sensitivity: f32) {
        self.scene.write().camera.translate(translation, sensitivity);
    }

    /// Adds a light, refusing once the uploaded array would overflow.
    pub fn push_light(&self, light: Light) -> Result<usize, LightArrayError> {
        let mut scene = self.scene.write();
        if scene.lights.len() >= MAX_LIGHTS {
            return Err(LightArrayError::Full {
                capacity: MAX_LIGHTS,
            });
        }
        scene.lights.push(light);
        Ok(scene.lights.len() - 1)
    }

    pub fn set_light(&self, index: usize, light: Light) -> Result<(), LightArrayError> {
        let mut scene = self.scene.write();
        let len = scene.lights.len();
        let slot = scene
            .lights
            .get_mut(index)
            .ok_or(LightArrayError::OutOfRange { index, len })?;
        *slot = light;
        Ok(())
    }

    pub fn clear_lights(&self) {
        self.scene.write().lights.clear();
    }

    /// Applies a mutation to the named model.
    pub fn update_model<F, R>(&self, name: &str, updater: F) -> Option<R>
    where
        F: FnOnce(&mut Model) -> R,
    {
        let mut scene = self.scene.write();
        scene.model_mut(name).map(updater)
    }

    pub fn set_position(&self, name: &str, position: Vec3) -> bool {
        self.update_model(name, |model| model.position = position)
            .is_some()
    }

    pub fn set_rotation(&self, name: &str, rotation: Vec3) -> bool {
        self.update_model(name, |model| model.rotation = rotation)
            .is_some()
    }

    pub fn set_scale(&self, name: &str, scale: Vec3) -> bool {
        self.update_model(name, |model| model.scale = scale).is_some()
    }

    /// Zero is raised to 1.
    pub fn set_tiling(&self, name: &str, tiling: u32) -> bool {
        self.update_model(name, |model| model.tiling = tiling.max(1))
            .is_some()
    }
}
