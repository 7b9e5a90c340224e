use super::*;
use crate::assets::glyph::GlyphRecord;

fn block_glyph() -> GlyphData {
    // one square stroke centred on the native box
    let record: GlyphRecord = serde_json::from_str(
        r#"{
            "strokes": ["M 112 -12 L 912 -12 L 912 788 L 112 788 Z"],
            "medians": [[[112, 388], [912, 388]]]
        }"#,
    )
    .unwrap();
    GlyphData::from_record("口", &record).unwrap()
}

fn near(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
}

#[test]
fn surface_rejects_bad_sizes() {
    assert!(CpuSurface::new(0, 10).is_err());
    assert!(CpuSurface::new(70_000, 10).is_err());
    assert_eq!(CpuSurface::square(32).unwrap().width(), 32);
}

#[test]
fn grid_paints_background_inside_rounded_border() {
    let frame = render_cell(
        None,
        90,
        &GridSpec::default(),
        &GlyphPaint::solid(Rgba8::BLACK),
        &StrokeFrame::hidden(0),
    )
    .unwrap();
    assert_eq!(frame.pixel(11, 11), Some([255, 255, 255, 255]));
    // outside the rounded corner
    assert_eq!(frame.pixel(0, 0).map(|p| p[3]), Some(0));
}

#[test]
fn full_glyph_covers_the_center() {
    let g = block_glyph();
    let frame = rasterize_glyph(&g, 100, None, Rgba8::opaque(0x11, 0x11, 0x11)).unwrap();
    let center = frame.pixel(50, 50).unwrap();
    assert!(near(center, [0x11, 0x11, 0x11, 255]), "{center:?}");
    // padding stays transparent
    assert_eq!(frame.pixel(1, 1).map(|p| p[3]), Some(0));
}

#[test]
fn hidden_strokes_draw_nothing_without_outline() {
    let g = block_glyph();
    let mut surface = CpuSurface::square(64).unwrap();
    let t = glyph_transform(64.0);
    let data = surface
        .draw(|ctx| {
            paint_glyph(
                ctx,
                &g,
                t,
                &GlyphPaint::solid(Rgba8::BLACK),
                &StrokeFrame::hidden(1),
            );
            Ok(())
        })
        .unwrap();
    assert!(data.iter().all(|&b| b == 0));
}

#[test]
fn radical_strokes_use_their_own_color() {
    let mut g = block_glyph();
    g.radical_strokes = vec![0];
    let paint = GlyphPaint {
        stroke_color: Rgba8::BLACK,
        radical_color: Some(Rgba8::opaque(0, 200, 0)),
        outline_color: Rgba8::TRANSPARENT,
        show_outline: false,
    };
    let frame = render_cell(
        Some(&g),
        100,
        &GridSpec {
            enabled: false,
            ..GridSpec::default()
        },
        &paint,
        &StrokeFrame::complete(1),
    )
    .unwrap();
    let center = frame.pixel(50, 50).unwrap();
    assert!(near(center, [0, 200, 0, 255]), "{center:?}");
}

#[test]
fn png_encoding_produces_a_png() {
    let frame = FrameRGBA::transparent(4, 4);
    let png = frame.encode_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}
