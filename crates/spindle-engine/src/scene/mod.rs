//! Scene descriptions consumed by the frame controller.
//!
//! A scene is plain data: named meshes, named programs, the (mesh, program)
//! pairs drawn each frame, a clear color and projection parameters. Nothing
//! here touches a backend; [`FrameController::init`](crate::frame::FrameController::init)
//! turns it into GPU state.

use std::path::Path;

use crate::color::Color;
use crate::error::Result;
use crate::mesh::shapes;
use crate::projection::ProjectionConfig;
use crate::shader::ShaderSource;

const SPIN_VERT: &str = include_str!("shaders/spin.vert.wgsl");
const GRADIENT_FRAG: &str = include_str!("shaders/gradient.frag.wgsl");
const ORBIT_VERT: &str = include_str!("shaders/orbit.vert.wgsl");
const GLOW_FRAG: &str = include_str!("shaders/glow.frag.wgsl");

/// Background of both built-in scenes, in display values (the default
/// surface is non-sRGB, so this is what appears on screen).
pub const DEFAULT_CLEAR_COLOR: Color = Color::new(0.1, 0.3, 0.2, 1.0);

/// Flat mesh description; validated when the scene is initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDesc {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl MeshDesc {
    pub fn new(
        name: impl Into<String>,
        positions: impl Into<Vec<[f32; 3]>>,
        indices: impl Into<Vec<u16>>,
    ) -> Self {
        Self {
            name: name.into(),
            positions: positions.into(),
            indices: indices.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub name: String,
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

/// One draw per frame of `mesh` with `program`, both referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawDesc {
    pub mesh: String,
    pub program: String,
}

impl DrawDesc {
    pub fn new(mesh: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            program: program.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneDesc {
    pub name: String,
    pub meshes: Vec<MeshDesc>,
    pub programs: Vec<ProgramDesc>,
    /// Issued in this order every frame.
    pub draws: Vec<DrawDesc>,
    pub clear_color: Color,
    pub projection: ProjectionConfig,
}

impl SceneDesc {
    /// The rotating house with a pointer-following gradient.
    ///
    /// Shader files in `shader_dir` override the embedded ones by name.
    pub fn house(shader_dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            name: "house".into(),
            meshes: vec![MeshDesc::new(
                "house",
                shapes::HOUSE_POSITIONS,
                shapes::HOUSE_INDICES,
            )],
            programs: vec![ProgramDesc {
                name: "gradient".into(),
                vertex: ShaderSource::load_or_default(shader_dir, "spin.vert.wgsl", SPIN_VERT)?,
                fragment: ShaderSource::load_or_default(
                    shader_dir,
                    "gradient.frag.wgsl",
                    GRADIENT_FRAG,
                )?,
            }],
            draws: vec![DrawDesc::new("house", "gradient")],
            clear_color: DEFAULT_CLEAR_COLOR,
            projection: ProjectionConfig::default(),
        })
    }

    /// The house plus a small pyramid orbiting it under a second program.
    pub fn house_and_pyramid(shader_dir: Option<&Path>) -> Result<Self> {
        let mut scene = Self::house(shader_dir)?;

        scene.name = "house_and_pyramid".into();
        scene.meshes.push(MeshDesc::new(
            "pyramid",
            shapes::TETRAHEDRON_POSITIONS,
            shapes::TETRAHEDRON_INDICES,
        ));
        scene.programs.push(ProgramDesc {
            name: "glow".into(),
            vertex: ShaderSource::load_or_default(shader_dir, "orbit.vert.wgsl", ORBIT_VERT)?,
            fragment: ShaderSource::load_or_default(shader_dir, "glow.frag.wgsl", GLOW_FRAG)?,
        });
        scene.draws.push(DrawDesc::new("pyramid", "glow"));
        scene.projection = ProjectionConfig::with_far(2_000.0);

        Ok(scene)
    }
}
