use image::{Rgba, RgbaImage};
use std::time::{Duration, Instant};

use lookout::overlay::{PALETTE, color_for, compose};
use lookout::{Detection, FrameSize, LabelTable, Overlay, Parameters, SessionState, render_box};

fn labels() -> LabelTable {
    LabelTable::from_names(["person", "bicycle", "car"])
}

#[test]
fn box_is_mapped_to_percentages() {
    let detection = Detection::from_row([10.0, 10.0, 60.0, 60.0, 0.9, 0.0]);
    let marker = render_box(&detection, FrameSize::new(100, 100), 0.25, &labels()).unwrap();
    assert_eq!(marker.left, 10.0);
    assert_eq!(marker.top, 10.0);
    assert_eq!(marker.width, 50.0);
    assert_eq!(marker.height, 50.0);
    assert_eq!(marker.label, "person (90.00%)");
    assert_eq!(marker.color, PALETTE[0]);
}

#[test]
fn non_square_frames_scale_each_axis() {
    let detection = Detection::from_row([32.0, 24.0, 96.0, 72.0, 0.5, 1.0]);
    let marker = render_box(&detection, FrameSize::new(128, 96), 0.25, &labels()).unwrap();
    assert_eq!(marker.left, 25.0);
    assert_eq!(marker.top, 25.0);
    assert_eq!(marker.width, 50.0);
    assert_eq!(marker.height, 50.0);
}

#[test]
fn scores_below_threshold_are_skipped() {
    let low = Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.20, 0.0]);
    let high = Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.30, 0.0]);
    let frame = FrameSize::new(10, 10);
    assert!(render_box(&low, frame, 0.25, &labels()).is_none());
    assert!(render_box(&high, frame, 0.25, &labels()).is_some());
}

#[test]
fn nan_scores_are_skipped() {
    let detection = Detection::from_row([0.0, 0.0, 1.0, 1.0, f32::NAN, 0.0]);
    assert!(render_box(&detection, FrameSize::new(10, 10), 0.25, &labels()).is_none());
    assert!(render_box(&detection, FrameSize::new(10, 10), 0.0, &labels()).is_none());
}

#[test]
fn empty_frame_renders_nothing() {
    let detection = Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.9, 0.0]);
    assert!(render_box(&detection, FrameSize::new(0, 10), 0.25, &labels()).is_none());
}

#[test]
fn colors_are_stable_per_class() {
    assert_eq!(color_for(3), color_for(3));
    assert_eq!(color_for(PALETTE.len()), color_for(0));
    assert_eq!(color_for(PALETTE.len() + 7), color_for(7));

    let frame = FrameSize::new(100, 100);
    let a = Detection::from_row([0.0, 0.0, 10.0, 10.0, 0.9, 2.0]);
    let b = Detection::from_row([50.0, 50.0, 90.0, 90.0, 0.4, 2.0]);
    let first = render_box(&a, frame, 0.25, &labels()).unwrap();
    let second = render_box(&b, frame, 0.25, &labels()).unwrap();
    assert_eq!(first.color, second.color);
    assert_eq!(first.color.hex(), "#059669");
}

#[test]
fn unknown_classes_fall_back_to_the_id() {
    let detection = Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.5, 42.0]);
    let marker = render_box(&detection, FrameSize::new(10, 10), 0.25, &labels()).unwrap();
    assert_eq!(marker.label, "42 (50.00%)");
    assert_eq!(marker.color, PALETTE[42 % PALETTE.len()]);
}

#[test]
fn render_batch_clears_previous_markers() {
    let frame = FrameSize::new(100, 100);
    let mut overlay = Overlay::new();
    let first = [
        Detection::from_row([0.0, 0.0, 10.0, 10.0, 0.9, 0.0]),
        Detection::from_row([0.0, 0.0, 10.0, 10.0, 0.8, 1.0]),
    ];
    assert_eq!(overlay.render_batch(&first, frame, 0.25, &labels()), 2);

    let second = [Detection::from_row([0.0, 0.0, 10.0, 10.0, 0.1, 1.0])];
    assert_eq!(overlay.render_batch(&second, frame, 0.25, &labels()), 0);
    assert!(overlay.is_empty());
    assert_eq!(overlay.batch(), 2);
}

#[test]
fn session_updates_fps_between_batches() {
    let mut session = SessionState::new(Parameters::default());
    let frame = FrameSize::new(100, 100);
    let detections = [Detection::from_row([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])];
    let start = Instant::now();

    let first = session.complete_batch(&detections, frame, &labels(), start);
    assert_eq!(first.rendered, 1);
    assert!(session.fps.is_empty());

    let second = session.complete_batch(
        &detections,
        frame,
        &labels(),
        start + Duration::from_millis(100),
    );
    assert_eq!(second.batch, 2);
    assert!((second.mean_fps - 10.0).abs() < 1e-9);
    assert_eq!(session.completed, 2);
}

#[test]
fn compose_draws_at_container_size() {
    let surface = RgbaImage::from_pixel(32, 24, Rgba([0, 0, 0, 255]));
    let mut overlay = Overlay::new();
    overlay.render_batch(
        &[Detection::from_row([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])],
        FrameSize::new(100, 100),
        0.25,
        &labels(),
    );

    let composed = compose(&surface, &overlay, (540, 405)).to_rgba8();
    assert_eq!(composed.dimensions(), (540, 405));

    // 标注框左边缘位于容器宽度的 10%
    let edge = composed.get_pixel(54, 200);
    assert!(edge.0[0].abs_diff(PALETTE[0].r) <= 2, "{edge:?}");
    assert!(edge.0[1].abs_diff(PALETTE[0].g) <= 2, "{edge:?}");

    let background = composed.get_pixel(500, 380);
    assert_eq!(background.0, [0, 0, 0, 255]);
}
