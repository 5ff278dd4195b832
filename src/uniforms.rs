use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::warn;

use crate::layout::{field_layout, FieldLayout, GpuLayout};

/// Per-draw transform block read by the vertex stage.
///
/// Matrices are column-major. The normal matrix is derived from the model
/// matrix every time it is set, so the two can never drift apart.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TransformUniforms {
    model_matrix: [[f32; 4]; 4],
    view_matrix: [[f32; 4]; 4],
    projection_matrix: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 3],
}

const _: () = assert!(std::mem::size_of::<TransformUniforms>() == 240);

impl TransformUniforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.set_view(view);
        uniforms.set_projection(projection);
        uniforms.set_model(model);
        uniforms
    }

    /// Replaces the model matrix and recomputes the normal matrix.
    pub fn set_model(&mut self, model: Mat4) {
        self.model_matrix = model.to_cols_array_2d();
        self.normal_matrix = mat3_to_3x4(normal_matrix(model));
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view_matrix = view.to_cols_array_2d();
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection_matrix = projection.to_cols_array_2d();
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model_matrix)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_matrix)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection_matrix)
    }

    pub fn normal(&self) -> Mat3 {
        let cols = &self.normal_matrix;
        Mat3::from_cols(
            Vec3::new(cols[0][0], cols[0][1], cols[0][2]),
            Vec3::new(cols[1][0], cols[1][1], cols[1][2]),
            Vec3::new(cols[2][0], cols[2][1], cols[2][2]),
        )
    }

    /// `projection * view * model`, as applied to positions by the vertex stage.
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection() * self.view() * self.model()
    }
}

impl GpuLayout for TransformUniforms {
    const WGSL_NAME: &'static str = "Uniforms";

    fn fields() -> Vec<FieldLayout> {
        vec![
            field_layout!(TransformUniforms, model_matrix),
            field_layout!(TransformUniforms, view_matrix),
            field_layout!(TransformUniforms, projection_matrix),
            field_layout!(TransformUniforms, normal_matrix),
        ]
    }
}

/// Inverse-transpose of the upper-left 3x3 of `model`.
///
/// A model matrix that collapses an axis has no inverse; normals are left
/// untouched in that case. Singularity is judged relative to the column
/// lengths, so uniformly tiny scales still invert.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(model);
    let determinant = linear.determinant();
    let volume =
        linear.x_axis.length() * linear.y_axis.length() * linear.z_axis.length();
    if !determinant.is_finite() || determinant.abs() <= f32::EPSILON * volume {
        warn!("model matrix is singular (det = {determinant}); using identity normal matrix");
        return Mat3::IDENTITY;
    }
    let inverse = linear.inverse();
    if !inverse.is_finite() {
        warn!("model matrix inverse is not finite; using identity normal matrix");
        return Mat3::IDENTITY;
    }
    inverse.transpose()
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

/// Per-frame block read by the fragment stage alongside the light array.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FragmentUniforms {
    pub light_count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
    pub camera_position: [f32; 3],
    pub tiling: u32,
}

const _: () = assert!(std::mem::size_of::<FragmentUniforms>() == 32);

impl FragmentUniforms {
    pub fn new(light_count: u32, camera_position: Vec3, tiling: u32) -> Self {
        Self {
            light_count,
            camera_position: camera_position.to_array(),
            tiling,
            ..Self::zeroed()
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from_array(self.camera_position)
    }

    /// Returns a copy carrying another model's tiling.
    pub fn with_tiling(mut self, tiling: u32) -> Self {
        self.tiling = tiling;
        self
    }
}

impl Default for FragmentUniforms {
    fn default() -> Self {
        Self::new(0, Vec3::ZERO, 1)
    }
}

impl GpuLayout for FragmentUniforms {
    const WGSL_NAME: &'static str = "FragmentUniforms";

    fn fields() -> Vec<FieldLayout> {
        vec![
            field_layout!(FragmentUniforms, light_count),
            field_layout!(FragmentUniforms, _pad0),
            field_layout!(FragmentUniforms, _pad1),
            field_layout!(FragmentUniforms, _pad2),
            field_layout!(FragmentUniforms, camera_position),
            field_layout!(FragmentUniforms, tiling),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutReport;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn transform_offsets_match_wgsl() {
        let offsets: Vec<usize> = TransformUniforms::fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128, 192]);
        assert!(LayoutReport::of::<TransformUniforms>().is_dense());
    }

    #[test]
    fn fragment_offsets_match_wgsl() {
        let report = LayoutReport::of::<FragmentUniforms>();
        let camera = report
            .fields
            .iter()
            .find(|f| f.name == "camera_position")
            .unwrap();
        assert_eq!(camera.offset, 16);
        assert_eq!(report.fields.last().unwrap().offset, 28);
        assert!(report.is_dense());
    }

    #[test]
    fn normal_matrix_uses_inverse_transpose_under_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniforms = TransformUniforms::new(model, Mat4::IDENTITY, Mat4::IDENTITY);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();

        let transformed = (uniforms.normal() * normal).normalize();
        // The plane x + y = 0 becomes x + 2y = 0 after stretching x by two.
        let expected = Vec3::new(1.0, 2.0, 0.0).normalize();
        assert!(approx(transformed, expected));

        let naive = (Mat3::from_mat4(model) * normal).normalize();
        assert!(!approx(naive, expected));
    }

    #[test]
    fn normal_matrix_follows_model_updates() {
        let mut uniforms = TransformUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(uniforms.normal(), Mat3::IDENTITY);
        uniforms.set_model(Mat4::from_scale(Vec3::new(1.0, 4.0, 1.0)));
        let n = uniforms.normal() * Vec3::Y;
        assert!(approx(n, Vec3::new(0.0, 0.25, 0.0)));
    }

    #[test]
    fn rotation_and_translation_leave_normals_rigid() {
        let model = Mat4::from_translation(Vec3::new(5.0, -3.0, 2.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let normal = normal_matrix(model) * Vec3::X;
        assert!(approx(normal, Mat3::from_mat4(model) * Vec3::X));
    }

    #[test]
    fn singular_model_falls_back_to_identity() {
        let model = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(model), Mat3::IDENTITY);
    }

    #[test]
    fn tiny_uniform_scale_keeps_rotation() {
        // Glyph outlines are often scaled down hard and flipped about X.
        for scale in [0.004, 0.05, 0.08] {
            let model = Mat4::from_rotation_x(std::f32::consts::PI) * Mat4::from_scale(Vec3::splat(scale));
            let normal = (normal_matrix(model) * Vec3::Y).normalize();
            assert!(approx(normal, Vec3::NEG_Y), "scale {scale}: {normal}");
        }
    }

    #[test]
    fn flattened_model_is_singular_at_any_scale() {
        let model = Mat4::from_scale(Vec3::new(1000.0, 0.0, 1000.0));
        assert_eq!(normal_matrix(model), Mat3::IDENTITY);
    }

    #[test]
    fn model_view_projection_composes_right_to_left() {
        let model = Mat4::from_translation(Vec3::X);
        let view = Mat4::from_translation(Vec3::Y);
        let projection = Mat4::from_scale(Vec3::splat(2.0));
        let uniforms = TransformUniforms::new(model, view, projection);
        let clip = uniforms.model_view_projection().transform_point3(Vec3::ZERO);
        assert!(approx(clip, Vec3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn fragment_uniform_bytes_land_at_wgsl_offsets() {
        let uniforms = FragmentUniforms::new(3, Vec3::new(0.0, 1.2, -40.0), 4);
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(&bytes[0..4], &3u32.to_ne_bytes());
        assert_eq!(&bytes[28..32], &4u32.to_ne_bytes());
        assert_eq!(uniforms.camera_position(), Vec3::new(0.0, 1.2, -40.0));
    }
}
