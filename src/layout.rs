//! Byte-layout descriptions of the structures uploaded to the GPU.

use std::fmt;

/// Offset and size of one field inside an uploaded structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

impl FieldLayout {
    pub const fn new(name: &'static str, offset: usize, size: usize) -> Self {
        Self { name, offset, size }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Structures with a fixed layout shared with the shading stage.
pub trait GpuLayout: bytemuck::Pod {
    /// Name of the matching WGSL struct.
    const WGSL_NAME: &'static str;

    /// Fields in declaration order, padding included.
    fn fields() -> Vec<FieldLayout>;

    fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    fn align() -> usize {
        std::mem::align_of::<Self>()
    }
}

/// Layout of one structure, printable for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutReport {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: Vec<FieldLayout>,
}

impl LayoutReport {
    pub fn of<T: GpuLayout>() -> Self {
        Self {
            name: T::WGSL_NAME,
            size: T::size(),
            align: T::align(),
            fields: T::fields(),
        }
    }

    /// Returns true when the fields tile the structure with no hidden gaps.
    pub fn is_dense(&self) -> bool {
        let mut cursor = 0;
        for field in &self.fields {
            if field.offset != cursor {
                return false;
            }
            cursor = field.end();
        }
        cursor == self.size
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} bytes (align {})", self.name, self.size, self.align)?;
        for field in &self.fields {
            writeln!(
                f,
                "  {:>4} {:<18} {} bytes",
                field.offset, field.name, field.size
            )?;
        }
        Ok(())
    }
}

/// Builds a [`FieldLayout`] from a struct field.
macro_rules! field_layout {
    ($ty:ty, $field:ident) => {{
        let zeroed: $ty = ::bytemuck::Zeroable::zeroed();
        $crate::layout::FieldLayout::new(
            stringify!($field),
            ::std::mem::offset_of!($ty, $field),
            ::std::mem::size_of_val(&zeroed.$field),
        )
    }};
}

pub(crate) use field_layout;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::GpuLight;
    use crate::uniforms::{FragmentUniforms, TransformUniforms};
    use crate::vertex::MeshVertex;

    #[test]
    fn uploaded_structs_have_no_hidden_padding() {
        assert!(LayoutReport::of::<TransformUniforms>().is_dense());
        assert!(LayoutReport::of::<FragmentUniforms>().is_dense());
        assert!(LayoutReport::of::<GpuLight>().is_dense());
        assert!(LayoutReport::of::<MeshVertex>().is_dense());
    }

    #[test]
    fn gap_is_reported() {
        let report = LayoutReport {
            name: "Gappy",
            size: 16,
            align: 4,
            fields: vec![FieldLayout::new("a", 0, 4), FieldLayout::new("b", 8, 8)],
        };
        assert!(!report.is_dense());
    }

    #[test]
    fn report_lists_fields() {
        let text = LayoutReport::of::<FragmentUniforms>().to_string();
        assert!(text.starts_with("FragmentUniforms: 32 bytes (align 4)"));
        assert!(text.contains("16 camera_position"));
        assert!(text.contains("28 tiling"));
    }
}
