use super::*;
use crate::geometry::grid::GridMode;

fn inflate(bytes: &[u8]) -> String {
    let raw = miniz_oxide::inflate::decompress_to_vec_zlib(bytes).unwrap();
    String::from_utf8(raw).unwrap()
}

fn plain(mode: GridMode) -> GridSpec {
    GridSpec {
        subdivide: false,
        ..GridSpec::print().with_mode(mode)
    }
}

#[test]
fn grid_lines_are_flipped_into_page_space() {
    let mut canvas = PageCanvas::new();
    canvas.grid_cell(10.0, 20.0, 90.0, &plain(GridMode::Ninefold));
    let ops = inflate(&canvas.finish());

    assert!(ops.contains("40 110 m"), "{ops}");
    assert!(ops.contains("40 20 l"), "{ops}");
    // horizontal major line one third down the cell
    assert!(ops.contains("10 80 m"), "{ops}");
    assert!(ops.contains("1 1 1 rg"), "{ops}");
}

#[test]
fn dashed_minor_pen_sets_a_dash_pattern() {
    let spec = GridSpec {
        minor_dash: Some([2.0, 6.0]),
        ..GridSpec::print()
    };
    let mut canvas = PageCanvas::new();
    canvas.grid_cell(0.0, 0.0, 90.0, &spec);
    let ops = inflate(&canvas.finish());
    assert!(ops.contains("[2 6] 0 d"), "{ops}");

    let mut canvas = PageCanvas::new();
    canvas.grid_cell(0.0, 0.0, 90.0, &GridSpec::print());
    assert!(!inflate(&canvas.finish()).contains(" d\n"));
}

#[test]
fn rounded_border_uses_curves() {
    let spec = GridSpec {
        corner_radius: 10.0,
        ..plain(GridMode::InscribedSquare)
    };
    let mut canvas = PageCanvas::new();
    canvas.grid_cell(0.0, 0.0, 90.0, &spec);
    assert!(inflate(&canvas.finish()).contains(" c\n"));
}

#[test]
fn images_are_placed_with_a_matrix() {
    let mut canvas = PageCanvas::new();
    canvas.image("Im1", 5.0, 6.0, 30.0, 30.0, Some("Gs1"));
    let ops = inflate(&canvas.finish());
    assert!(ops.contains("/Gs1 gs"), "{ops}");
    assert!(ops.contains("30 0 0 30 5 6 cm"), "{ops}");
    assert!(ops.contains("/Im1 Do"), "{ops}");
}

#[test]
fn image_splits_color_and_mask() {
    let mut frame = FrameRGBA::transparent(2, 1);
    frame.data = vec![255, 0, 0, 255, 0, 0, 0, 0];
    let img = PdfImage::from_frame(&frame).unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    assert_eq!(
        miniz_oxide::inflate::decompress_to_vec_zlib(&img.rgb).unwrap(),
        vec![255, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        miniz_oxide::inflate::decompress_to_vec_zlib(&img.alpha).unwrap(),
        vec![255, 0]
    );
}

#[test]
fn ref_alloc_counts_up_from_one() {
    let mut refs = RefAlloc::default();
    assert_eq!(refs.bump(), Ref::new(1));
    assert_eq!(refs.bump(), Ref::new(2));
}
