//! Frame loop driven end to end through the headless backend.

use glam::{Mat4, Vec2};

use spindle_engine::backend::{BackendCall, ClearFlags, HeadlessBackend};
use spindle_engine::error::{RenderError, ShaderStage};
use spindle_engine::frame::{FrameController, FrameState};
use spindle_engine::input::{
    InputEvent, InputSample, InputState, Key, KeyState, MouseButton, MouseButtonState,
};
use spindle_engine::scene::{DrawDesc, ProgramDesc, SceneDesc};
use spindle_engine::shader::{ParamValue, ShaderSource};

fn house() -> FrameController<HeadlessBackend> {
    let mut c = FrameController::new(HeadlessBackend::new(), SceneDesc::house(None).unwrap());
    c.init().unwrap();
    c
}

fn moved(input: &mut InputState, x: f32, y: f32) {
    input.apply_event(InputEvent::PointerMoved { x, y });
}

// ── init ─────────────────────────────────────────────────────────────────

#[test]
fn house_scene_has_eight_triangles() {
    let c = house();
    assert_eq!(c.state(), FrameState::Ready);
    assert_eq!(c.meshes().len(), 1);
    assert_eq!(c.meshes().by_name("house").map(|m| m.triangle_count()), Some(8));
}

#[test]
fn init_compiles_then_sets_clear_color() {
    let c = house();
    let calls = c.backend().calls();
    assert!(matches!(calls[0], BackendCall::CreateShader(_)));
    assert!(matches!(calls[1], BackendCall::SetClearColor(color) if color.to_array() == [0.1, 0.3, 0.2, 1.0]));
}

#[test]
fn broken_shader_override_terminates_init() {
    let dir = std::env::temp_dir().join(format!("spindle-broken-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("gradient.frag.wgsl"), "@fragment fn fs_main( {").unwrap();

    let scene = SceneDesc::house(Some(&dir)).unwrap();
    let mut c = FrameController::new(HeadlessBackend::new(), scene);
    let err = c.init().unwrap_err();

    assert!(matches!(
        err,
        RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }
    ));
    assert_eq!(c.state(), FrameState::Terminated);
    std::fs::remove_dir_all(&dir).ok();
}

// ── frame sequence ───────────────────────────────────────────────────────

#[test]
fn idle_frame_runs_clear_update_draw_present() {
    let mut c = house();
    c.backend_mut().take_calls();

    c.render_frame(&InputState::new()).unwrap();

    let calls = c.backend().calls();
    let kinds: Vec<&str> = calls
        .iter()
        .map(|call| match call {
            BackendCall::Clear(_) => "clear",
            BackendCall::SetParam { .. } => "param",
            BackendCall::SetShader(_) => "shader",
            BackendCall::Render { .. } => "render",
            BackendCall::Present => "present",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        ["clear", "param", "param", "param", "shader", "render", "present"]
    );
    assert_eq!(calls[0], BackendCall::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));

    assert_eq!(c.animation().alpha, 0.0);
    assert_eq!(c.animation().beta, 0.0);
    assert_eq!(c.state(), FrameState::Ready);
    assert_eq!(c.backend().frames_presented(), 1);
}

#[test]
fn mesh_is_uploaded_once_across_frames() {
    let mut c = house();
    for _ in 0..5 {
        c.render_frame(&InputState::new()).unwrap();
    }
    assert_eq!(c.backend().uploaded_meshes(), 1);
    assert_eq!(c.frame_index(), 5);
}

#[test]
fn draw_snapshot_carries_animation_and_projection() {
    let mut c = house();
    c.on_resize(800, 600).unwrap();

    let mut input = InputState::new();
    input.apply_event(InputEvent::Key {
        key: Key::ArrowUp,
        state: KeyState::Pressed,
        repeat: false,
    });
    c.render_frame(&input).unwrap();

    let draw = &c.backend().draws()[0];
    assert_eq!(draw.uniforms.read("beta"), Some(ParamValue::Float(0.4)));
    assert_eq!(
        draw.uniforms.read("projection"),
        c.viewport().map(|v| ParamValue::Mat4(v.projection))
    );
}

// ── resize ───────────────────────────────────────────────────────────────

#[test]
fn resize_800_by_600() {
    let mut c = house();
    c.on_resize(800, 600).unwrap();
    let first = *c.viewport().unwrap();
    c.on_resize(800, 600).unwrap();
    let second = *c.viewport().unwrap();

    assert_eq!(first.aspect(), 800.0 / 600.0);
    assert_eq!(first, second);
    assert_eq!(
        first.projection,
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 800.0 / 600.0, 1.0, 20_000.0)
    );
}

#[test]
fn zero_height_is_invalid_viewport() {
    let mut c = house();
    let err = c.on_resize(800, 0).unwrap_err();
    assert!(matches!(err, RenderError::InvalidViewport { width: 800, height: 0 }));
}

#[test]
fn resize_before_init_is_allowed() {
    let mut c = FrameController::new(HeadlessBackend::new(), SceneDesc::house(None).unwrap());
    c.on_resize(1024, 768).unwrap();
    c.init().unwrap();
    assert_eq!(c.viewport().map(|v| v.width), Some(1024));
}

// ── input ────────────────────────────────────────────────────────────────

#[test]
fn keyboard_right_adds_point_four() {
    let mut c = house();
    let mut input = InputState::new();
    input.apply_event(InputEvent::Key {
        key: Key::ArrowRight,
        state: KeyState::Pressed,
        repeat: false,
    });

    c.render_frame(&input).unwrap();
    assert_eq!(c.animation().alpha, 0.4);
    assert_eq!(c.animation().beta, 0.0);
}

#[test]
fn pointer_center_and_corner_normalize() {
    let mut c = house();
    c.on_resize(800, 600).unwrap();
    let mut input = InputState::new();

    moved(&mut input, 400.0, 300.0);
    c.render_frame(&input).unwrap();
    assert_eq!(c.animation().pointer, Vec2::ZERO);

    moved(&mut input, 0.0, 0.0);
    c.render_frame(&input).unwrap();
    assert_eq!(c.animation().pointer, Vec2::new(-1.0, 1.0));
}

#[test]
fn pointer_without_viewport_keeps_initial_value() {
    let mut c = house();
    let mut input = InputState::new();
    moved(&mut input, 123.0, 45.0);

    c.render_frame(&input).unwrap();
    assert_eq!(c.animation().pointer, Vec2::ONE);
}

#[test]
fn drag_rotates_by_horizontal_velocity() {
    let mut c = house();
    let mut input = InputState::new();
    moved(&mut input, 100.0, 100.0);
    input.end_frame();

    input.apply_event(InputEvent::PointerButton {
        button: MouseButton::Left,
        state: MouseButtonState::Pressed,
    });
    moved(&mut input, 1100.0, 50.0);

    c.render_frame(&input).unwrap();
    assert!((c.animation().alpha - 0.1).abs() < 1e-6);
    assert!((c.animation().beta - 0.1).abs() < 1e-6);
}

#[test]
fn pointer_reentering_while_held_does_not_rotate() {
    let mut c = house();
    let mut input = InputState::new();
    input.apply_event(InputEvent::PointerButton {
        button: MouseButton::Left,
        state: MouseButtonState::Pressed,
    });
    moved(&mut input, 900.0, 500.0);
    c.render_frame(&input).unwrap();
    input.end_frame();

    input.apply_event(InputEvent::PointerLeft);
    moved(&mut input, 10.0, 500.0);
    c.render_frame(&input).unwrap();

    assert_eq!(c.animation().alpha, 0.0);
    assert_eq!(c.animation().beta, 0.0);
}

// ── parameters ───────────────────────────────────────────────────────────

#[test]
fn unknown_parameter_lookup_fails() {
    let c = house();
    let program = c.program("gradient").unwrap();
    assert!(matches!(
        program.parameter("gamma"),
        Err(RenderError::UnknownParameter { name }) if name == "gamma"
    ));
}

#[test]
fn repeated_lookup_yields_usable_handles() {
    let mut c = house();
    let program = c.program("gradient").unwrap().clone();

    let first = program.parameter("alpha").unwrap();
    let second = program.parameter("alpha").unwrap();
    program.set_parameter(c.backend_mut(), first, 1.5f32).unwrap();
    program.set_parameter(c.backend_mut(), second, 2.5f32).unwrap();
}

#[test]
fn wrong_kind_is_rejected() {
    let mut c = house();
    let program = c.program("gradient").unwrap().clone();
    let mouse = program.parameter("mouse").unwrap();

    let err = program.set_parameter(c.backend_mut(), mouse, 1.0f32).unwrap_err();
    assert!(matches!(err, RenderError::ParamTypeMismatch { .. }));
}

#[test]
fn program_without_mouse_skips_it() {
    const VERTEX: &str = "
        struct Params { alpha: f32, beta: f32, projection: mat4x4<f32> }
        @group(0) @binding(0) var<uniform> params: Params;
        @vertex
        fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
            return params.projection * vec4<f32>(p.x + params.alpha, p.y + params.beta, p.z - 3.0, 1.0);
        }
    ";
    const FRAGMENT: &str = "
        @fragment
        fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
    ";

    let mut scene = SceneDesc::house(None).unwrap();
    scene.programs = vec![ProgramDesc {
        name: "flat".into(),
        vertex: ShaderSource::embedded("flat.vert.wgsl", VERTEX),
        fragment: ShaderSource::embedded("flat.frag.wgsl", FRAGMENT),
    }];
    scene.draws = vec![DrawDesc::new("house", "flat")];

    let mut c = FrameController::new(HeadlessBackend::new(), scene);
    c.init().unwrap();
    c.backend_mut().take_calls();
    c.render_frame(&InputSample::default()).unwrap();

    let params = c
        .backend()
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::SetParam { .. }))
        .count();
    assert_eq!(params, 2);
}

// ── dual scene ───────────────────────────────────────────────────────────

#[test]
fn dual_scene_draws_both_meshes_with_their_programs() {
    let mut c =
        FrameController::new(HeadlessBackend::new(), SceneDesc::house_and_pyramid(None).unwrap());
    c.init().unwrap();
    c.on_resize(640, 480).unwrap();
    c.render_frame(&InputSample::default()).unwrap();

    let draws = c.backend().draws();
    assert_eq!(draws.len(), 2);
    assert_ne!(draws[0].program, draws[1].program);
    assert_ne!(draws[0].mesh, draws[1].mesh);
    assert_eq!(c.meshes().by_name("pyramid").map(|m| m.triangle_count()), Some(4));

    let expected = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 640.0 / 480.0, 1.0, 2_000.0);
    assert_eq!(draws[1].uniforms.read("projection"), Some(ParamValue::Mat4(expected)));
}

#[test]
fn handle_from_another_program_is_rejected() {
    let mut c =
        FrameController::new(HeadlessBackend::new(), SceneDesc::house_and_pyramid(None).unwrap());
    c.init().unwrap();

    let alpha = c.program("gradient").unwrap().parameter("alpha").unwrap();
    let glow = c.program("glow").unwrap().clone();
    c.backend_mut().take_calls();

    let err = glow.set_parameter(c.backend_mut(), alpha, 1.0f32).unwrap_err();
    assert!(matches!(err, RenderError::InvalidHandle(_)));
    assert!(c.backend().calls().is_empty());
}

// ── failure ──────────────────────────────────────────────────────────────

#[test]
fn backend_failure_terminates() {
    let mut c = house();
    c.render_frame(&InputSample::default()).unwrap();

    c.backend_mut().fail_next_render("device lost");
    let err = c.render_frame(&InputSample::default()).unwrap_err();
    assert!(matches!(err, RenderError::Backend(_)));
    assert_eq!(c.state(), FrameState::Terminated);
    assert_eq!(c.frame_index(), 1);

    let err = c.render_frame(&InputSample::default()).unwrap_err();
    assert!(matches!(err, RenderError::InvalidState { .. }));
}
