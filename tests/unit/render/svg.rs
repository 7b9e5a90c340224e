use super::*;
use crate::assets::glyph::GlyphRecord;
use crate::geometry::grid::GridMode;

fn three_strokes() -> GlyphData {
    let record: GlyphRecord = serde_json::from_str(
        r#"{
            "strokes": [
                "M 100 700 L 900 700 L 900 650 L 100 650 Z",
                "M 100 400 L 900 400 L 900 350 L 100 350 Z",
                "M 100 100 L 900 100 L 900 50 L 100 50 Z"
            ],
            "radStrokes": [2]
        }"#,
    )
    .unwrap();
    GlyphData::from_record("三", &record).unwrap()
}

fn parse(svg: &str) -> usvg::Tree {
    usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default()).expect(svg)
}

#[test]
fn cell_svg_is_valid_and_sized() {
    let svg = cell_svg(&three_strokes(), 84.0, &GridSpec::default(), Rgba8::BLACK, None);
    let tree = parse(&svg);
    assert_eq!(tree.size().width(), 84.0);
    assert_eq!(svg.matches("<path").count(), 3);
    assert!(svg.contains("stroke-dasharray"));
}

#[test]
fn grid_elements_follow_primitives() {
    let spec = GridSpec {
        subdivide: false,
        ..GridSpec::default().with_mode(GridMode::Ninefold)
    };
    let svg = grid_elements(90.0, &spec);
    assert_eq!(svg.matches("<line").count(), 4);
    // background + border
    assert_eq!(svg.matches("<rect").count(), 2);
    assert!(svg.contains(r#"x1="30""#));
    assert!(svg.contains(r#"x1="60""#));
}

#[test]
fn step_sheet_accumulates_strokes() {
    let g = three_strokes();
    let svg = step_sheet_svg(&g, 60.0, 2, 6.0, &GridSpec::default(), Rgba8::BLACK);
    let tree = parse(&svg);
    // two columns, two rows
    assert_eq!(tree.size().width(), 126.0);
    assert_eq!(tree.size().height(), 126.0);
    assert_eq!(svg.matches("<path").count(), 1 + 2 + 3);
}

#[test]
fn radical_color_is_applied_per_stroke() {
    let g = three_strokes();
    let svg = glyph_group(
        &g,
        Affine::IDENTITY,
        Rgba8::BLACK,
        Some(Rgba8::opaque(0x16, 0x8f, 0x16)),
        None,
    );
    assert_eq!(svg.matches("#168f16").count(), 1);
    assert_eq!(svg.matches("#000000").count(), 2);
}
