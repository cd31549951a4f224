use crate::error::{RenderError, Result};

use super::{ParamKind, ParamValue};

/// One member of a program's uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: ParamKind,
    /// Byte offset inside the block, as computed by the WGSL layout rules.
    pub offset: u32,
}

/// Reflected layout of a program's uniform block.
///
/// An empty layout (no fields, size 0) means the program declares no uniforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    pub fields: Vec<UniformField>,
    /// Total block size in bytes, including trailing padding.
    pub size: u32,
}

impl UniformLayout {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the slot and field declared under `name`.
    pub fn find(&self, name: &str) -> Option<(usize, &UniformField)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// CPU-side copy of a program's uniform block.
///
/// Backends keep one per program; writes land here and are uploaded when the
/// program is next drawn.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.size as usize];
        Self { layout, bytes }
    }

    #[inline]
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes `value` into the field at `slot`.
    pub fn write(&mut self, slot: usize, value: &ParamValue) -> Result<()> {
        let Some(field) = self.layout.fields.get(slot) else {
            return Err(RenderError::InvalidHandle(format!(
                "slot {slot} does not exist (program has {} parameters)",
                self.layout.fields.len()
            )));
        };

        if field.kind != value.kind() {
            return Err(RenderError::ParamTypeMismatch {
                name: field.name.clone(),
                expected: field.kind,
                found: value.kind(),
            });
        }

        let start = field.offset as usize;
        let src = value.as_bytes();
        let Some(dst) = self.bytes.get_mut(start..start + src.len()) else {
            return Err(RenderError::InvalidHandle(format!(
                "field `{}` at offset {start} exceeds the {}-byte block",
                field.name,
                self.bytes.len()
            )));
        };
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Reads back the current value of the field called `name`.
    pub fn read(&self, name: &str) -> Option<ParamValue> {
        let (_, field) = self.layout.find(name)?;
        let start = field.offset as usize;
        let bytes = self.bytes.get(start..start + field.kind.size())?;
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Some(match field.kind {
            ParamKind::Float => ParamValue::Float(floats[0]),
            ParamKind::Vec2 => ParamValue::Vec2(glam::Vec2::from_slice(&floats)),
            ParamKind::Vec3 => ParamValue::Vec3(glam::Vec3::from_slice(&floats)),
            ParamKind::Vec4 => ParamValue::Vec4(glam::Vec4::from_slice(&floats)),
            ParamKind::Mat4 => ParamValue::Mat4(glam::Mat4::from_cols_slice(&floats)),
        })
    }

    /// Writes `value` into the field called `name` if it exists with the same type.
    ///
    /// Returns whether anything was written. Used for context-provided values
    /// (e.g. the projection matrix) that programs may or may not declare.
    pub fn write_if_declared(&mut self, name: &str, value: &ParamValue) -> bool {
        match self.layout.find(name) {
            Some((slot, field)) if field.kind == value.kind() => self.write(slot, value).is_ok(),
            _ => false,
        }
    }
}
