use super::*;

fn a4(columns: u32, guide: Option<usize>) -> PdfLayoutPlan {
    PdfLayoutPlan::compute(
        PageSize::A4,
        Orientation::Portrait,
        12.0,
        columns,
        guide,
        DEFAULT_GUIDE_STEP_PT,
        DEFAULT_GUIDE_GAP_PT,
    )
    .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn a4_six_columns_twelve_mm() {
    let plan = a4(6, None);
    assert!(close(plan.margin_pt, 12.0 * 72.0 / 25.4));
    assert_eq!(plan.cell_size_pt, 87.0);
    assert_eq!(plan.rows_per_page, 8);
    assert_eq!(plan.rows_first_page, 8);
    assert!(plan.guide.is_none());
}

#[test]
fn landscape_swaps_the_page_box() {
    assert_eq!(page_box(PageSize::Letter, Orientation::Landscape), (792.0, 612.0));
    assert_eq!(page_box(PageSize::A4, Orientation::Portrait), (595.28, 841.89));
}

#[test]
fn columns_are_clamped() {
    assert_eq!(a4(1, None).columns, 2);
    assert_eq!(a4(40, None).columns, 12);
}

#[test]
fn tiny_cells_are_rejected() {
    let err = PdfLayoutPlan::compute(
        PageSize::A4,
        Orientation::Portrait,
        60.0,
        12,
        None,
        DEFAULT_GUIDE_STEP_PT,
        DEFAULT_GUIDE_GAP_PT,
    )
    .unwrap_err();
    assert!(matches!(err, StudioError::CellTooSmall { columns: 12, .. }));
}

#[test]
fn grid_that_cannot_fit_a_row_is_rejected() {
    let err = PdfLayoutPlan::compute(
        PageSize::A4,
        Orientation::Landscape,
        65.0,
        2,
        None,
        DEFAULT_GUIDE_STEP_PT,
        DEFAULT_GUIDE_GAP_PT,
    )
    .unwrap_err();
    assert!(matches!(err, StudioError::NotEnoughSpaceForGrid { .. }));
}

#[test]
fn oversized_guide_leaves_no_room_on_the_first_page() {
    let err = PdfLayoutPlan::compute(
        PageSize::A4,
        Orientation::Portrait,
        12.0,
        2,
        Some(210),
        DEFAULT_GUIDE_STEP_PT,
        DEFAULT_GUIDE_GAP_PT,
    )
    .unwrap_err();
    assert!(matches!(err, StudioError::NotEnoughSpaceForGrid { .. }));
}

#[test]
fn guide_wraps_at_usable_width() {
    let plan = a4(6, Some(20));
    let guide = plan.guide.unwrap();
    assert_eq!(guide.per_row, 14);
    assert_eq!(guide.rows, 2);
    assert_eq!(guide.area_height, 66.0);
    assert_eq!(plan.rows_first_page, 8);

    let (x, y) = guide.step_origin(15, plan.page_height, plan.margin_pt);
    assert!(close(x, plan.margin_pt + 36.0));
    assert!(close(y, plan.page_height - plan.margin_pt - 60.0 - 6.0));
}

#[test]
fn cell_origins_shift_below_the_guide_on_page_one_only() {
    let plan = a4(6, Some(5));
    let m = plan.margin_pt;
    let (x, y) = plan.cell_origin(0, 0);
    assert!(close(x, m));
    assert!(close(y, 841.89 - (m + 30.0 + 87.0)));

    let (x, y) = plan.cell_origin(1, 7);
    assert!(close(x, m + 87.0));
    assert!(close(y, 841.89 - (m + 87.0 + 87.0)));
}

#[test]
fn pagination_counts() {
    let plan = a4(6, Some(5));
    assert_eq!(plan.cells_first_page(), 48);
    assert_eq!(plan.pages_for(1), 1);
    assert_eq!(plan.pages_for(48), 1);
    assert_eq!(plan.pages_for(49), 2);
    assert_eq!(plan.pages_for(97), 3);
}
