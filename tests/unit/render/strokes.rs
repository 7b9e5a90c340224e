use super::*;
use crate::assets::glyph::GlyphRecord;

fn two_strokes() -> GlyphData {
    let record: GlyphRecord = serde_json::from_str(
        r#"{
            "strokes": ["M 100 400 L 900 400 L 900 500 L 100 500 Z", "M 450 800 L 550 800 L 550 0 L 450 0 Z"],
            "medians": [[[100, 450], [500, 450], [900, 450]], [[500, 800], [500, 0]]]
        }"#,
    )
    .unwrap();
    GlyphData::from_record("十", &record).unwrap()
}

#[test]
fn durations_follow_length_and_speed() {
    assert!((stroke_duration_ms(300.0, 1.0) - 300.0).abs() < 1e-9);
    assert!((stroke_duration_ms(900.0, 0.5) - 1000.0).abs() < 1e-9);

    let g = two_strokes();
    let tl = StrokeTimeline::new(&g, 1.0, 250.0);
    let segs = tl.segments();
    assert!((segs[0].duration_ms - (800.0 + 600.0) / 3.0).abs() < 1e-9);
    assert!((segs[1].start_ms - (segs[0].end_ms() + 250.0)).abs() < 1e-9);
    assert!((tl.total_ms() - segs[1].end_ms()).abs() < 1e-9);
}

#[test]
fn frames_progress_in_order() {
    let g = two_strokes();
    let tl = StrokeTimeline::new(&g, 1.0, 0.0);
    let mid_first = tl.segments()[0].duration_ms / 2.0;

    let f = tl.frame_at(0.0);
    assert_eq!(f, StrokeFrame::hidden(2));

    let f = tl.frame_at(mid_first);
    assert!((f.progress(0) - 0.5).abs() < 1e-9);
    assert_eq!(f.progress(1), 0.0);

    let f = tl.frame_at(tl.total_ms());
    assert!(f.is_complete());
    assert_eq!(f, StrokeFrame::complete(2));
}

#[test]
fn reveal_path_starts_behind_the_median() {
    let median = [Point::new(100.0, 450.0), Point::new(900.0, 450.0)];
    let full = reveal_path(&median, 1.0);
    let els = full.elements();
    assert_eq!(els.len(), 2);
    assert_eq!(els[0], kurbo::PathEl::MoveTo(Point::new(0.0, 450.0)));
    assert_eq!(els[1], kurbo::PathEl::LineTo(Point::new(900.0, 450.0)));

    // extended length 900, half of it ends at x = 450
    let half = reveal_path(&median, 0.5);
    assert_eq!(
        half.elements().last(),
        Some(&kurbo::PathEl::LineTo(Point::new(450.0, 450.0)))
    );
}

#[test]
fn white_strokes_are_replaced() {
    let style = WriterStyle {
        stroke_color: Rgba8::WHITE,
        speed: -1.0,
        ..WriterStyle::default()
    }
    .sanitized();
    assert_eq!(style.stroke_color, WHITE_STROKE_REPLACEMENT);
    assert_eq!(style.speed, WriterStyle::default().speed);
    assert_eq!(style.radical_color, Rgba8::opaque(0x16, 0x8f, 0x16));
}

#[test]
fn first_n_marks_cumulative_steps() {
    let f = StrokeFrame::first_n(4, 2);
    assert_eq!(f.progress(1), 1.0);
    assert_eq!(f.progress(2), 0.0);
    assert_eq!(f.progress(9), 0.0);
    assert!(!f.is_complete());
}
