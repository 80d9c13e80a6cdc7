mod common;

use common::synthetic_image::{disk_scene, stack_scene, uniform_scene};
use stack_counter::{detect, DetectParams, StackDetector};

#[test]
fn counts_well_separated_blobs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let scene = disk_scene(
        640,
        480,
        &[(120, 120, 50), (360, 120, 50), (120, 340, 50), (420, 340, 50)],
    );
    let report = detect(&scene, DetectParams::default()).expect("detect");
    assert_eq!(
        report.result.count, 4,
        "expected one region per disk, trace: {:?}",
        report.trace
    );
    assert_eq!(report.result.boxes.len(), 4);
}

#[test]
fn uniform_image_counts_zero() {
    for color in [[0u8, 0, 0], [128, 128, 128], [255, 255, 255]] {
        let scene = uniform_scene(320, 240, color);
        let report = detect(&scene, DetectParams::default()).expect("detect");
        assert_eq!(report.result.count, 0, "color={color:?}");
        assert!(report.result.boxes.is_empty());
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let scene = disk_scene(400, 300, &[(100, 150, 45), (290, 150, 45)]);
    let detector = StackDetector::new(DetectParams::default());
    let a = detector.process(&scene).expect("first run");
    let b = detector.process(&scene).expect("second run");
    assert_eq!(a.result.count, b.result.count);
    assert_eq!(a.result.boxes, b.result.boxes);
    assert_eq!(a.processed_mask.data, b.processed_mask.data);
    assert_eq!(a.annotated.data, b.annotated.data);
}

#[test]
fn boxes_stay_within_image_bounds() {
    let scene = disk_scene(500, 400, &[(60, 60, 55), (440, 340, 55), (250, 200, 55)]);
    let report = detect(&scene, DetectParams::default()).expect("detect");
    let (w, h) = (report.annotated.w as i32, report.annotated.h as i32);
    assert!(report.result.count > 0);
    for rect in &report.result.boxes {
        assert!(rect.x >= 0 && rect.y >= 0, "rect {rect:?}");
        assert!(rect.x + rect.w as i32 <= w, "rect {rect:?} exceeds width {w}");
        assert!(rect.y + rect.h as i32 <= h, "rect {rect:?} exceeds height {h}");
    }
}

#[test]
fn count_never_exceeds_region_label_count() {
    let scene = disk_scene(640, 480, &[(160, 160, 48), (480, 160, 48), (320, 360, 48)]);
    let report = detect(&scene, DetectParams::default()).expect("detect");
    let labels = report
        .trace
        .watershed
        .as_ref()
        .expect("watershed ran")
        .region_labels;
    assert!(report.result.count <= labels);
}

#[test]
fn oversized_input_is_resized_preserving_aspect() {
    let scene = disk_scene(1800, 1200, &[(600, 600, 150), (1300, 600, 150)]);
    let report = detect(&scene, DetectParams::default()).expect("detect");
    let pre = report.trace.preprocess.as_ref().expect("preprocess ran");
    assert_eq!(pre.working_width, 900);
    // 3:2 aspect preserved within one pixel.
    assert!((pre.working_height as i64 - 600).abs() <= 1);
    assert_eq!(report.annotated.w, pre.working_width);
    assert_eq!(report.annotated.h, pre.working_height);
}

#[test]
fn roi_mode_scopes_detection_to_the_salient_stack() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (scene, stack) = stack_scene(
        640,
        480,
        (120, 100, 400, 280),
        &[(220, 240, 45), (420, 240, 45)],
    );
    let mut params = DetectParams::default();
    params.use_roi_selection = true;
    let report = detect(&scene, params).expect("detect");

    let roi = report.result.roi.expect("roi selected");
    // The ROI must enclose at least 95% of the true stack pixels.
    let (sx, sy, sw, sh) = stack;
    let x0 = roi.x.max(sx as i32);
    let y0 = roi.y.max(sy as i32);
    let x1 = (roi.x + roi.w as i32).min((sx + sw) as i32);
    let y1 = (roi.y + roi.h as i32).min((sy + sh) as i32);
    let covered = ((x1 - x0).max(0) as i64) * ((y1 - y0).max(0) as i64);
    let total = (sw * sh) as i64;
    assert!(
        covered * 100 >= total * 95,
        "roi {roi:?} covers only {covered}/{total} of the stack"
    );

    assert_eq!(report.result.count, 2, "trace: {:?}", report.trace);
    for rect in &report.result.boxes {
        assert!(rect.x >= 0 && rect.y >= 0);
        assert!(rect.x + (rect.w as i32) <= report.annotated.w as i32);
        assert!(rect.y + (rect.h as i32) <= report.annotated.h as i32);
    }
}

#[test]
fn roi_mode_on_neutral_scene_short_circuits() {
    let scene = uniform_scene(320, 240, [128, 128, 128]);
    let mut params = DetectParams::default();
    params.use_roi_selection = true;
    let report = detect(&scene, params).expect("detect");
    assert_eq!(report.result.count, 0);
    assert_eq!(report.trace.short_circuit, Some("roi"));
}

#[test]
fn zero_dimension_input_fails_fast() {
    let scene = stack_counter::image::ImageRgb8::new(0, 0);
    let err = detect(&scene, DetectParams::default()).unwrap_err();
    assert!(matches!(
        err,
        stack_counter::DetectError::InvalidImage { .. }
    ));
}

#[test]
fn invalid_config_is_rejected_before_processing() {
    let scene = disk_scene(100, 100, &[(50, 50, 20)]);
    let mut params = DetectParams::default();
    params.preprocess.blur_kernel = 6;
    let err = detect(&scene, params).unwrap_err();
    assert!(matches!(
        err,
        stack_counter::DetectError::InvalidConfig { .. }
    ));
}
