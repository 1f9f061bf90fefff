use super::*;
use crate::foundation::core::Rect;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

fn px(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
    let data = surface.data().unwrap();
    let i = ((y * surface.width() + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

fn plan(c: Canvas, ops: Vec<DrawOp>) -> ScenePlan {
    ScenePlan { canvas: c, ops }
}

#[test]
fn fill_covers_every_pixel() {
    let c = canvas(8, 4);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::Fill {
                color: Rgba8::rgb(6, 8, 20),
            }],
        ),
        &mut surface,
    )
    .unwrap();

    assert!(
        surface
            .data()
            .unwrap()
            .chunks_exact(4)
            .all(|p| p == [6, 8, 20, 255])
    );
    assert_eq!(surface.generation(), 1);
}

#[test]
fn sample_stops_hits_endpoints_and_clamps() {
    let stops = [
        GradientStop {
            offset: 0.0,
            color: Rgba8::rgb(0, 0, 0),
        },
        GradientStop {
            offset: 1.0,
            color: Rgba8::rgb(200, 100, 50),
        },
    ];
    assert_eq!(sample_stops(&stops, 0.0), [0, 0, 0, 255]);
    assert_eq!(sample_stops(&stops, 1.0), [200, 100, 50, 255]);
    assert_eq!(sample_stops(&stops, -3.0), [0, 0, 0, 255]);
    assert_eq!(sample_stops(&stops, 7.0), [200, 100, 50, 255]);
    assert_eq!(sample_stops(&stops, 0.5), [100, 50, 25, 255]);
}

#[test]
fn linear_gradient_runs_from_start_to_end() {
    let c = canvas(64, 16);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    let stops = [
        GradientStop {
            offset: 0.0,
            color: Rgba8::rgb(0, 0, 0),
        },
        GradientStop {
            offset: 1.0,
            color: Rgba8::rgb(255, 255, 255),
        },
    ];
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::LinearGradient {
                start: Point::new(0.0, 0.0),
                end: Point::new(64.0, 0.0),
                stops,
            }],
        ),
        &mut surface,
    )
    .unwrap();

    let left = px(&surface, 0, 8);
    let right = px(&surface, 63, 8);
    assert!(left[0] < 10);
    assert!(right[0] > 245);
    assert_eq!(left[3], 255);
    let mut prev = 0u8;
    for x in 0..64 {
        let v = px(&surface, x, 3)[0];
        assert!(v >= prev);
        prev = v;
    }
}

#[test]
fn radial_gradient_is_darkest_at_center() {
    let c = canvas(32, 32);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    let stops = [
        GradientStop {
            offset: 0.0,
            color: Rgba8::rgb(0, 0, 0),
        },
        GradientStop {
            offset: 1.0,
            color: Rgba8::rgb(255, 0, 0),
        },
    ];
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::RadialGradient {
                center: Point::new(16.0, 16.0),
                radius: 16.0,
                stops,
            }],
        ),
        &mut surface,
    )
    .unwrap();
    assert!(px(&surface, 16, 16)[0] < 20);
    assert_eq!(px(&surface, 0, 0)[0], 255);
}

#[test]
fn particles_draw_filled_circles() {
    let c = canvas(40, 40);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::Particles {
                color: Rgba8::rgb(255, 255, 255),
                particles: vec![
                    Particle {
                        center: Point::new(20.0, 20.0),
                        radius: 6.0,
                        opacity: 1.0,
                    },
                    Particle {
                        center: Point::new(5.0, 5.0),
                        radius: 3.0,
                        opacity: 0.0,
                    },
                ],
            }],
        ),
        &mut surface,
    )
    .unwrap();

    assert_eq!(px(&surface, 20, 20), [255, 255, 255, 255]);
    assert_eq!(px(&surface, 35, 35)[3], 0);
    assert_eq!(px(&surface, 5, 5)[3], 0);
}

#[test]
fn stroke_rect_only_touches_the_outline() {
    let c = canvas(64, 48);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::StrokeRect {
                rect: Rect::new(12.0, 12.0, 52.0, 36.0),
                line_width: 2.0,
                color: Rgba8::rgb(255, 255, 255),
            }],
        ),
        &mut surface,
    )
    .unwrap();

    assert!(px(&surface, 30, 11)[3] > 0);
    assert!(px(&surface, 11, 24)[3] > 0);
    assert!(px(&surface, 51, 24)[3] > 0);
    assert!(px(&surface, 30, 35)[3] > 0);
    assert_eq!(px(&surface, 30, 24)[3], 0);
    assert_eq!(px(&surface, 2, 2)[3], 0);
}

#[test]
fn ops_paint_in_order() {
    let c = canvas(4, 4);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    r.rasterize(
        &plan(
            c,
            vec![
                DrawOp::Fill {
                    color: Rgba8::rgb(255, 0, 0),
                },
                DrawOp::Fill {
                    color: Rgba8::rgb(0, 0, 255),
                },
            ],
        ),
        &mut surface,
    )
    .unwrap();
    assert_eq!(px(&surface, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn blank_text_draws_nothing() {
    let c = canvas(16, 16);
    let mut surface = Surface::new(c).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    r.rasterize(
        &plan(
            c,
            vec![DrawOp::Text {
                text: "   ".to_owned(),
                center: Point::new(8.0, 8.0),
                font_size: 10.0,
                font_weight: 700,
                color: Rgba8::rgb(255, 255, 255),
                shadow: None,
            }],
        ),
        &mut surface,
    )
    .unwrap();
    assert!(surface.data().unwrap().iter().all(|&b| b == 0));
}

#[test]
fn mismatched_canvas_is_rejected() {
    let mut surface = Surface::new(canvas(8, 8)).unwrap();
    let mut r = CpuRasterizer::new(&[]);
    let err = r
        .rasterize(&plan(canvas(4, 4), Vec::new()), &mut surface)
        .unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
}

#[test]
fn released_surface_reports_unavailable() {
    let c = canvas(8, 8);
    let mut surface = Surface::new(c).unwrap();
    surface.release();
    let mut r = CpuRasterizer::new(&[]);
    let err = r.rasterize(&plan(c, Vec::new()), &mut surface).unwrap_err();
    assert!(err.is_surface_loss());
    assert_eq!(surface.generation(), 0);
}
