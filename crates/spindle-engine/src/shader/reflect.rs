//! WGSL front-end checks and uniform reflection.
//!
//! Rules:
//! - the vertex source must declare exactly one `@vertex` entry point, the
//!   fragment source exactly one `@fragment` entry point
//! - uniform parameters are the members of the struct declared as
//!   `@group(0) @binding(0) var<uniform>`; other bindings are ignored
//! - supported member types: `f32`, `vec2/3/4<f32>`, `mat4x4<f32>`
//! - when both stages declare the block, their layouts must be identical
//! - every fragment `@location` input must be written by the vertex stage
//!   with the same type and interpolation
//!
//! Both the headless and the wgpu backend run these checks, so a program that
//! compiles in tests is reflected identically on the GPU.

use naga::{
    AddressSpace, Binding, Interpolation, Module, Sampling, ScalarKind, TypeInner, VectorSize,
};

use crate::error::{RenderError, Result, ShaderStage};

use super::{ParamKind, UniformField, UniformLayout};

/// Result of checking and reflecting a vertex + fragment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramReflection {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub layout: UniformLayout,
}

/// Parses, validates and links a program, returning its entry points and uniform layout.
pub fn reflect_program(vertex_src: &str, fragment_src: &str) -> Result<ProgramReflection> {
    let vertex = compile_stage(vertex_src, ShaderStage::Vertex)?;
    let fragment = compile_stage(fragment_src, ShaderStage::Fragment)?;

    let vertex_entry = single_entry(&vertex, naga::ShaderStage::Vertex, ShaderStage::Vertex)?;
    let fragment_entry =
        single_entry(&fragment, naga::ShaderStage::Fragment, ShaderStage::Fragment)?;

    let vertex_block = uniform_block(&vertex, ShaderStage::Vertex)?;
    let fragment_block = uniform_block(&fragment, ShaderStage::Fragment)?;

    let layout = match (vertex_block, fragment_block) {
        (Some(v), Some(f)) if v != f => {
            return Err(RenderError::compile(
                ShaderStage::Link,
                "uniform block @group(0) @binding(0) differs between the vertex and fragment stages",
            ));
        }
        (Some(v), _) => v,
        (None, Some(f)) => f,
        (None, None) => UniformLayout::default(),
    };

    let outputs = entry_outputs(&vertex, vertex_entry);
    for input in entry_inputs(&fragment, fragment_entry) {
        let location = input.location;
        let Some(output) = outputs.iter().find(|o| o.location == location) else {
            return Err(RenderError::compile(
                ShaderStage::Link,
                format!("fragment input @location({location}) is not written by the vertex stage"),
            ));
        };
        if output.ty != input.ty {
            return Err(RenderError::compile(
                ShaderStage::Link,
                format!(
                    "@location({location}) is {:?} in the vertex stage but {:?} in the fragment stage",
                    output.ty, input.ty
                ),
            ));
        }
        if output.qualifiers() != input.qualifiers() {
            return Err(RenderError::compile(
                ShaderStage::Link,
                format!("@location({location}) interpolation differs between stages"),
            ));
        }
    }

    Ok(ProgramReflection {
        vertex_entry: vertex.entry_points[vertex_entry].name.clone(),
        fragment_entry: fragment.entry_points[fragment_entry].name.clone(),
        layout,
    })
}

fn compile_stage(source: &str, stage: ShaderStage) -> Result<Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| RenderError::compile(stage, e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| RenderError::compile(stage, e.emit_to_string(source)))?;

    Ok(module)
}

fn single_entry(module: &Module, wanted: naga::ShaderStage, stage: ShaderStage) -> Result<usize> {
    let mut matching = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == wanted)
        .map(|(i, _)| i);

    match (matching.next(), matching.next()) {
        (Some(i), None) => Ok(i),
        (None, _) => Err(RenderError::compile(
            stage,
            format!("no @{stage} entry point declared"),
        )),
        (Some(_), Some(_)) => Err(RenderError::compile(
            stage,
            format!("more than one @{stage} entry point declared"),
        )),
    }
}

fn uniform_block(module: &Module, stage: ShaderStage) -> Result<Option<UniformLayout>> {
    let Some((_, var)) = module.global_variables.iter().find(|(_, var)| {
        var.space == AddressSpace::Uniform
            && var.binding.as_ref().is_some_and(|b| b.group == 0 && b.binding == 0)
    }) else {
        return Ok(None);
    };

    let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
        return Err(RenderError::compile(
            stage,
            "uniform @group(0) @binding(0) must be a struct",
        ));
    };

    let mut fields = Vec::with_capacity(members.len());
    for member in members {
        let name = member.name.clone().unwrap_or_default();
        let kind = param_kind(&module.types[member.ty].inner).ok_or_else(|| {
            RenderError::compile(
                stage,
                format!("uniform member `{name}` has an unsupported type"),
            )
        })?;
        fields.push(UniformField {
            name,
            kind,
            offset: member.offset,
        });
    }

    Ok(Some(UniformLayout {
        fields,
        size: *span,
    }))
}

fn param_kind(inner: &TypeInner) -> Option<ParamKind> {
    let is_f32 = |s: &naga::Scalar| s.kind == ScalarKind::Float && s.width == 4;

    match inner {
        TypeInner::Scalar(s) if is_f32(s) => Some(ParamKind::Float),
        TypeInner::Vector { size, scalar } if is_f32(scalar) => Some(match size {
            VectorSize::Bi => ParamKind::Vec2,
            VectorSize::Tri => ParamKind::Vec3,
            VectorSize::Quad => ParamKind::Vec4,
        }),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if is_f32(scalar) => Some(ParamKind::Mat4),
        _ => None,
    }
}

/// A user-defined inter-stage value.
#[derive(Debug, Clone, PartialEq)]
struct Varying {
    location: u32,
    ty: TypeInner,
    interpolation: Option<Interpolation>,
    sampling: Option<Sampling>,
}

impl Varying {
    /// Interpolation and sampling with WGSL defaults filled in.
    fn qualifiers(&self) -> (Interpolation, Sampling) {
        let interpolation = self.interpolation.unwrap_or(Interpolation::Perspective);
        let sampling = self.sampling.unwrap_or(match interpolation {
            Interpolation::Flat => Sampling::First,
            _ => Sampling::Center,
        });
        (interpolation, sampling)
    }
}

fn entry_inputs(module: &Module, entry: usize) -> Vec<Varying> {
    let mut varyings = Vec::new();
    for arg in &module.entry_points[entry].function.arguments {
        collect_varyings(module, arg.ty, arg.binding.as_ref(), &mut varyings);
    }
    varyings
}

fn entry_outputs(module: &Module, entry: usize) -> Vec<Varying> {
    let mut varyings = Vec::new();
    if let Some(result) = &module.entry_points[entry].function.result {
        collect_varyings(module, result.ty, result.binding.as_ref(), &mut varyings);
    }
    varyings
}

fn collect_varyings(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => out.push(Varying {
            location: *location,
            ty: module.types[ty].inner.clone(),
            interpolation: *interpolation,
            sampling: *sampling,
        }),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_varyings(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &str = "
        struct Params {
            alpha: f32,
            beta: f32,
            mouse: vec2<f32>,
            projection: mat4x4<f32>,
        }
        @group(0) @binding(0) var<uniform> params: Params;
    ";

    fn vertex() -> String {
        format!(
            "{PARAMS}
            struct VsOut {{
                @builtin(position) clip: vec4<f32>,
                @location(0) color: vec3<f32>,
            }}
            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> VsOut {{
                var out: VsOut;
                out.clip = params.projection * vec4<f32>(position * params.alpha, 1.0);
                out.color = vec3<f32>(params.beta);
                return out;
            }}"
        )
    }

    const FRAGMENT_NO_UNIFORMS: &str = "
        @fragment
        fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(color, 1.0);
        }
    ";

    #[test]
    fn reflects_vertex_block() {
        let r = reflect_program(&vertex(), FRAGMENT_NO_UNIFORMS).unwrap();
        assert_eq!(r.vertex_entry, "vs_main");
        assert_eq!(r.fragment_entry, "fs_main");

        let names: Vec<_> = r.layout.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "mouse", "projection"]);

        let offsets: Vec<_> = r.layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 4, 8, 16]);
        assert_eq!(r.layout.size, 80);
        assert_eq!(r.layout.fields[3].kind, ParamKind::Mat4);
    }

    #[test]
    fn syntax_error_reports_stage() {
        let err = reflect_program("fn vs_main( {", FRAGMENT_NO_UNIFORMS).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderCompile { stage: ShaderStage::Vertex, .. }
        ));
    }

    #[test]
    fn missing_fragment_entry_point() {
        let err = reflect_program(&vertex(), &vertex()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }
        ));
    }

    #[test]
    fn mismatched_blocks_fail_to_link() {
        let fragment = "
            struct Other { tint: vec4<f32> }
            @group(0) @binding(0) var<uniform> other: Other;
            @fragment
            fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 1.0) * other.tint;
            }
        ";
        let err = reflect_program(&vertex(), fragment).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Link, .. }));
    }

    #[test]
    fn unmatched_varying_fails_to_link() {
        let fragment = "
            @fragment
            fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
        ";
        let err = reflect_program(&vertex(), fragment).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Link, .. }));
    }

    #[test]
    fn varying_type_mismatch_fails_to_link() {
        let fragment = "
            @fragment
            fn fs_main(@location(0) color: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 0.0, 1.0);
            }
        ";
        let err = reflect_program(&vertex(), fragment).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Link, .. }));
    }

    #[test]
    fn varying_interpolation_mismatch_fails_to_link() {
        let fragment = "
            @fragment
            fn fs_main(@location(0) @interpolate(flat) color: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 1.0);
            }
        ";
        let err = reflect_program(&vertex(), fragment).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Link, .. }));
    }

    #[test]
    fn unsupported_member_type() {
        let vertex = "
            struct Params { count: u32 }
            @group(0) @binding(0) var<uniform> params: Params;
            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, f32(params.count));
            }
        ";
        let fragment = "
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
        ";
        let err = reflect_program(vertex, fragment).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn program_without_uniforms_has_empty_layout() {
        let vertex = "
            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, 1.0);
            }
        ";
        let fragment = "
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
        ";
        let r = reflect_program(vertex, fragment).unwrap();
        assert!(r.layout.is_empty());
    }
}
