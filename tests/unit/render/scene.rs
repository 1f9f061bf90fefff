use super::*;
use crate::scene::config::ResolutionPreset;

fn cfg(bg: BackgroundStyle, title: &str, subtitle: &str) -> RenderConfig {
    RenderConfig::new(title, subtitle, bg, ResolutionPreset::P720)
}

fn text_centers(plan: &ScenePlan) -> Vec<(String, Point, f64)> {
    plan.ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text {
                text,
                center,
                font_size,
                ..
            } => Some((text.clone(), *center, *font_size)),
            _ => None,
        })
        .collect()
}

#[test]
fn same_inputs_produce_identical_plans() {
    for bg in BackgroundStyle::ALL {
        let c = cfg(bg, "Hello", "world");
        for t in [0.0, 16.7, 1234.5, 5000.0, 1.0e9] {
            assert_eq!(compose_scene(t, &c), compose_scene(t, &c), "{bg} @ {t}");
        }
    }
}

#[test]
fn background_ops_follow_style() {
    let plan = compose_scene(100.0, &cfg(BackgroundStyle::Aurora, "a", ""));
    assert!(matches!(plan.ops[0], DrawOp::LinearGradient { .. }));

    let plan = compose_scene(100.0, &cfg(BackgroundStyle::Waves, "a", ""));
    assert!(matches!(plan.ops[0], DrawOp::RadialGradient { .. }));

    let plan = compose_scene(100.0, &cfg(BackgroundStyle::Particles, "a", ""));
    assert!(matches!(plan.ops[0], DrawOp::Fill { .. }));
    let DrawOp::Particles { particles, .. } = &plan.ops[1] else {
        panic!("expected particles op");
    };
    assert_eq!(particles.len(), PARTICLE_COUNT);
    for p in particles {
        assert!((0.0..=1280.0).contains(&p.center.x));
        assert!((0.0..=720.0).contains(&p.center.y));
        assert!((0.0..=1.0).contains(&p.opacity));
    }
}

#[test]
fn aurora_colors_change_over_time() {
    let c = cfg(BackgroundStyle::Aurora, "a", "");
    assert_ne!(compose_scene(0.0, &c).ops[0], compose_scene(2500.0, &c).ops[0]);
}

#[test]
fn particles_drift_without_state() {
    let c = cfg(BackgroundStyle::Particles, "a", "");
    let a = compose_scene(0.0, &c);
    let b = compose_scene(1000.0, &c);
    assert_ne!(a.ops[1], b.ops[1]);
    // Recomputing an earlier time after a later one gives the earlier positions back.
    assert_eq!(compose_scene(0.0, &c).ops[1], a.ops[1]);
}

#[test]
fn title_scales_with_shorter_side_and_wobbles() {
    let plan = compose_scene(0.0, &cfg(BackgroundStyle::Aurora, "Hello", ""));
    let texts = text_centers(&plan);
    assert_eq!(texts.len(), 1);
    let (text, center, size) = &texts[0];
    assert_eq!(text, "Hello");
    assert_eq!(*size, (720.0f64 * 0.07).round());
    assert_eq!(center.x, 640.0);
    assert_eq!(center.y, 360.0);

    let t = std::f64::consts::FRAC_PI_2 / WOBBLE_FREQUENCY;
    let plan = compose_scene(t, &cfg(BackgroundStyle::Aurora, "Hello", ""));
    let (_, center, _) = &text_centers(&plan)[0];
    assert!((center.y - (360.0 + WOBBLE_AMPLITUDE_PX)).abs() < 1e-9);
}

#[test]
fn subtitle_wobble_is_half_of_title() {
    let c = cfg(BackgroundStyle::Waves, "Hello", "Sub");
    let base = text_centers(&compose_scene(0.0, &c));
    let t = std::f64::consts::FRAC_PI_2 / WOBBLE_FREQUENCY;
    let moved = text_centers(&compose_scene(t, &c));
    assert_eq!(base.len(), 2);
    assert_eq!(moved[1].0, "Sub");
    assert_eq!(moved[1].2, (720.0f64 * 0.03).round());

    let title_dy = moved[0].1.y - base[0].1.y;
    let sub_dy = moved[1].1.y - base[1].1.y;
    assert!((title_dy - WOBBLE_AMPLITUDE_PX).abs() < 1e-9);
    assert!((sub_dy - WOBBLE_AMPLITUDE_PX / 2.0).abs() < 1e-9);
}

#[test]
fn blank_title_uses_placeholder_and_subtitle_is_omitted() {
    let plan = compose_scene(0.0, &cfg(BackgroundStyle::Aurora, "  ", ""));
    let texts = text_centers(&plan);
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, crate::scene::config::PLACEHOLDER_TITLE);
}

#[test]
fn border_is_inset_and_last() {
    let plan = compose_scene(0.0, &cfg(BackgroundStyle::Aurora, "a", ""));
    let Some(DrawOp::StrokeRect {
        rect, line_width, ..
    }) = plan.ops.last()
    else {
        panic!("border must be the last op");
    };
    assert_eq!(*rect, Rect::new(12.0, 12.0, 1268.0, 708.0));
    assert_eq!(*line_width, 1.0);
}

#[test]
fn non_finite_time_is_tolerated() {
    let c = cfg(BackgroundStyle::Particles, "a", "b");
    assert_eq!(compose_scene(f64::NAN, &c), compose_scene(0.0, &c));
}

#[test]
fn subtitle_adds_second_text_op() {
    let with_sub = compose_scene(0.0, &cfg(BackgroundStyle::Aurora, "A", "B"));
    let without = compose_scene(0.0, &cfg(BackgroundStyle::Aurora, "A", ""));
    assert_eq!(with_sub.text_ops().count(), 2);
    assert_eq!(without.text_ops().count(), 1);
}
