//! GTAO Tests
//!
//! Tests for:
//! - JitterSequence: 24-frame period, purity
//! - TemporalFilter: history clipping and blending
//! - AoProjection: reconstruction terms
//! - GtaoPass: recorded pass sequence, history invalidation, debug views

mod common;

use common::{RecordingBackend, inputs};
use pulse_fx::errors::PostFxError;
use pulse_fx::renderer::graph::{CameraKind, PassOp, PostProcessStack};
use pulse_fx::resources::PostProcessVolume;
use pulse_fx::resources::gtao::{
    AoDebugView, AoProjection, GtaoSettings, GtaoUniforms, JITTER_OFFSETS, JITTER_ROTATIONS,
    JitterSequence, TemporalFilter,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn gtao_volume() -> PostProcessVolume {
    let mut volume = PostProcessVolume::default();
    volume.gtao.enabled.set(true);
    volume
}

const GTAO_PASSES: [&str; 8] = [
    "GTAO Copy Scene Color",
    "Resolve GTAO",
    "Spatial Filter - XBlur",
    "Spatial Filter - YBlur",
    "Temporal Filter",
    "Combine Scene Color",
    "Copy Current To History",
    "Post Process Resolve",
];

// ============================================================================
// Jitter Tests
// ============================================================================

#[test]
fn jitter_period_is_exactly_24() {
    for s in 0..240_u64 {
        assert_eq!(JitterSequence::sample_at(s), JitterSequence::sample_at(s + 24));
    }

    let first_cycle: Vec<_> = (0..24).map(JitterSequence::sample_at).collect();
    for (i, a) in first_cycle.iter().enumerate() {
        for b in &first_cycle[i + 1..] {
            assert_ne!(a, b, "period shorter than 24");
        }
    }
}

#[test]
fn jitter_sample_matches_tables() {
    for s in 0..48_u64 {
        let sample = JitterSequence::sample_at(s);
        assert_eq!(sample.rotation_degrees, JITTER_ROTATIONS[(s % 6) as usize]);
        assert_eq!(sample.offset, JITTER_OFFSETS[((s / 6) % 4) as usize]);
    }
}

#[test]
fn jitter_advance_is_pure_function_of_steps() {
    let mut a = JitterSequence::new();
    let mut b = JitterSequence::new();
    for _ in 0..30 {
        a.advance();
    }
    for _ in 0..6 {
        b.advance();
    }
    assert_eq!(a, b);
    assert_eq!(a.current(), JitterSequence::sample_at(6));
    assert_eq!(a.step(), 6);
}

#[test]
fn jitter_direction_is_turn_fraction() {
    let sample = JitterSequence::sample_at(0);
    assert!(approx(sample.direction(), 60.0 / 360.0));
}

// ============================================================================
// Temporal Filter Tests
// ============================================================================

#[test]
fn temporal_blend_is_idempotent_on_static_scene() {
    let filter = TemporalFilter {
        response: 1.0,
        scale: 1.0,
    };
    for value in [0.0, 0.25, 0.5, 1.0] {
        let out = filter.resolve(value, value, value, 0.1);
        assert!(approx(out, value));
    }
}

#[test]
fn temporal_blend_keeps_unchanged_pixel_outside_neighborhood() {
    let filter = TemporalFilter {
        response: 1.0,
        scale: 1.0,
    };
    // Current lies outside mean ± std_dev; matching history is kept.
    for (value, mean) in [(0.5, 0.2), (0.1, 0.8), (0.9, 0.0)] {
        let out = filter.resolve(value, value, mean, 0.1);
        assert!(approx(out, value), "{value} around {mean} -> {out}");
    }
    // History beyond current on the far side is pulled back to current.
    assert!(approx(filter.resolve(0.5, 0.7, 0.2, 0.1), 0.5));
}

#[test]
fn temporal_blend_clips_outlying_history() {
    let filter = TemporalFilter {
        response: 1.0,
        scale: 1.0,
    };
    // History far outside mean ± std_dev is pulled to the box edge.
    assert!(approx(filter.resolve(0.5, 0.0, 0.5, 0.1), 0.4));
    assert!(approx(filter.resolve(0.5, 1.0, 0.5, 0.1), 0.6));
}

#[test]
fn temporal_blend_zero_response_ignores_history() {
    let filter = TemporalFilter {
        response: 0.0,
        scale: 5.0,
    };
    assert!(approx(filter.resolve(0.3, 0.9, 0.5, 1.0), 0.3));
}

#[test]
fn invalid_history_disables_temporal_response() {
    let mut settings = GtaoSettings::default();
    settings.set_temporal(2.0, 0.8);
    assert!(approx(settings.temporal_filter(true).response, 0.8));
    assert!(approx(settings.temporal_filter(false).response, 0.0));
    assert!(approx(settings.temporal_filter(false).scale, 2.0));
}

// ============================================================================
// Projection Tests
// ============================================================================

#[test]
fn projection_terms_scale_with_aspect() {
    let p = AoProjection::from_camera(90f32.to_radians(), 1024, 512);
    // tan(45°) = 1 → fy = 1, fx = h / w.
    assert!((p.uv_to_view.x - 4.0).abs() < 1e-4);
    assert!((p.uv_to_view.y - 2.0).abs() < 1e-4);
    assert!((p.uv_to_view.z + 2.0).abs() < 1e-4);
    assert!((p.half_proj_scale - 128.0).abs() < 1e-3);
    assert_eq!(p.texel_size.z, 1024.0);
    assert_eq!(p.texel_size.w, 512.0);
}

// ============================================================================
// Pass Recording Tests
// ============================================================================

#[test]
fn gtao_records_full_sequence() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();

    let report = stack
        .render_frame(&mut backend, &gtao_volume(), &inputs(640, 360))
        .unwrap();

    assert!(report.was_executed("GTAO"));
    assert_eq!(backend.last_pass_names(), GTAO_PASSES);
    assert_eq!(stack.resident_resources(), 7);
}

#[test]
fn debug_view_changes_only_combine_pass_index() {
    let mut baseline = None;

    for view in [
        AoDebugView::Combined,
        AoDebugView::RawAo,
        AoDebugView::Spatial,
        AoDebugView::BentNormal,
    ] {
        let mut backend = RecordingBackend::new();
        let mut stack = PostProcessStack::new();
        let mut volume = gtao_volume();
        volume.gtao.set_debug_view(view);

        stack
            .render_frame(&mut backend, &volume, &inputs(320, 240))
            .unwrap();

        let names = backend.last_pass_names();
        let combine = backend
            .last_graph()
            .passes()
            .iter()
            .find(|p| p.name == "Combine Scene Color")
            .unwrap();
        match combine.op {
            PassOp::Blit { pass_index, .. } => assert_eq!(pass_index, view.pass_index()),
            _ => panic!("combine is a blit"),
        }

        match &baseline {
            None => baseline = Some(names),
            Some(expected) => assert_eq!(&names, expected),
        }
    }
}

#[test]
fn first_frame_disables_temporal_response() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();
    let mut volume = gtao_volume();
    volume.gtao.set_temporal(1.0, 0.9);
    let frame = inputs(320, 240);

    let response = |backend: &RecordingBackend| {
        let temporal = backend
            .last_graph()
            .passes()
            .iter()
            .find(|p| p.name == "Temporal Filter")
            .unwrap();
        temporal.params.read::<GtaoUniforms>().unwrap().temporal_response
    };

    stack.render_frame(&mut backend, &volume, &frame).unwrap();
    assert!(approx(response(&backend), 0.0));

    stack.render_frame(&mut backend, &volume, &frame).unwrap();
    assert!(approx(response(&backend), 0.9));

    // Resize reallocates the history.
    stack
        .render_frame(&mut backend, &volume, &inputs(640, 480))
        .unwrap();
    assert!(approx(response(&backend), 0.0));
}

#[test]
fn jitter_advances_once_per_recorded_frame() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();
    let volume = gtao_volume();

    for frame in 0..5_u32 {
        assert_eq!(stack.gtao_state().jitter.step(), frame);
        stack
            .render_frame(&mut backend, &volume, &inputs(64, 64))
            .unwrap();
    }

    // Disabled frames do not move the sequence.
    stack
        .render_frame(&mut backend, &PostProcessVolume::default(), &inputs(64, 64))
        .unwrap();
    assert_eq!(stack.gtao_state().jitter.step(), 5);
}

#[test]
fn gtao_without_depth_is_skipped() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();
    let mut frame = inputs(64, 64);
    frame.depth = None;

    let report = stack.render_frame(&mut backend, &gtao_volume(), &frame).unwrap();

    assert!(matches!(
        report.failure("GTAO"),
        Some(PostFxError::MissingInput { input: "depth", .. })
    ));
    assert!(backend.last_graph().is_empty());
    assert_eq!(stack.gtao_state().jitter.step(), 0);
}

#[test]
fn gtao_hidden_in_scene_view() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();
    let mut volume = gtao_volume();
    volume.gtao.hide_in_scene_view.set(true);
    let mut frame = inputs(64, 64);
    frame.camera.kind = CameraKind::SceneView;

    let report = stack.render_frame(&mut backend, &volume, &frame).unwrap();

    assert!(!report.was_executed("GTAO"));
    assert!(report.inactive.contains(&"GTAO"));
    assert!(backend.last_graph().is_empty());
    assert_eq!(backend.live_count(), 0);
    assert_eq!(stack.gtao_state().jitter.step(), 0);
}

#[test]
fn gtao_uniforms_pack_settings() {
    let mut backend = RecordingBackend::new();
    let mut stack = PostProcessStack::new();
    let mut volume = gtao_volume();
    volume.gtao.set_radius(3.0);
    volume.gtao.set_samplers(9, 9);

    stack
        .render_frame(&mut backend, &volume, &inputs(128, 128))
        .unwrap();

    let resolve = &backend.last_graph().passes()[1];
    let uniforms = resolve.params.read::<GtaoUniforms>().unwrap();
    assert!(approx(uniforms.radius, 3.0));
    assert_eq!(uniforms.dir_samples, 4);
    assert_eq!(uniforms.slice_samples, 8);
    assert!(approx(uniforms.direction, 60.0 / 360.0));
}
