use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Backend-independent program identity.
///
/// Allocated by backends when a program is created; never reused within a process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(u32);

impl ProgramId {
    pub fn allocate() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Handle to one uniform parameter of one program.
///
/// `slot` indexes the program's [`UniformLayout`](super::UniformLayout) fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ParamHandle {
    program: ProgramId,
    slot: u32,
}

impl ParamHandle {
    #[inline]
    pub const fn new(program: ProgramId, slot: u32) -> Self {
        Self { program, slot }
    }

    #[inline]
    pub fn program(self) -> ProgramId {
        self.program
    }

    #[inline]
    pub fn slot(self) -> usize {
        self.slot as usize
    }
}

/// Type of a uniform parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ParamKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl ParamKind {
    /// Size of the value in bytes (not including trailing alignment padding).
    pub const fn size(self) -> usize {
        match self {
            ParamKind::Float => 4,
            ParamKind::Vec2 => 8,
            ParamKind::Vec3 => 12,
            ParamKind::Vec4 => 16,
            ParamKind::Mat4 => 64,
        }
    }

    /// WGSL spelling, used in diagnostics.
    pub const fn wgsl_name(self) -> &'static str {
        match self {
            ParamKind::Float => "f32",
            ParamKind::Vec2 => "vec2<f32>",
            ParamKind::Vec3 => "vec3<f32>",
            ParamKind::Vec4 => "vec4<f32>",
            ParamKind::Mat4 => "mat4x4<f32>",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

/// Value written to a uniform parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Vec2(_) => ParamKind::Vec2,
            ParamValue::Vec3(_) => ParamKind::Vec3,
            ParamValue::Vec4(_) => ParamKind::Vec4,
            ParamValue::Mat4(_) => ParamKind::Mat4,
        }
    }

    /// Raw little-endian bytes as laid out in a WGSL uniform block.
    ///
    /// Matrices are column-major, matching `mat4x4<f32>`.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ParamValue::Float(v) => bytemuck::bytes_of(v),
            ParamValue::Vec2(v) => bytemuck::bytes_of(v),
            ParamValue::Vec3(v) => bytemuck::bytes_of(v),
            ParamValue::Vec4(v) => bytemuck::bytes_of(v),
            ParamValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Vec2> for ParamValue {
    fn from(v: Vec2) -> Self {
        ParamValue::Vec2(v)
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        ParamValue::Vec3(v)
    }
}

impl From<Vec4> for ParamValue {
    fn from(v: Vec4) -> Self {
        ParamValue::Vec4(v)
    }
}

impl From<Mat4> for ParamValue {
    fn from(v: Mat4) -> Self {
        ParamValue::Mat4(v)
    }
}
