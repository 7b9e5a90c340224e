use super::*;

const ALL_MODES: [GridMode; 5] = [
    GridMode::Ninefold,
    GridMode::Fourfold,
    GridMode::DiagonalCross,
    GridMode::CenteredSquare,
    GridMode::InscribedSquare,
];

fn count(prims: &[GridPrimitive], role: LineRole) -> usize {
    prims
        .iter()
        .filter(|p| matches!(p, GridPrimitive::Line { role: r, .. } if *r == role))
        .count()
}

#[test]
fn ninefold_subdivided_counts() {
    let prims = compute_grid_primitives(300.0, &GridSpec::default());
    // background + border
    assert!(matches!(
        prims[0],
        GridPrimitive::Rect {
            fill: Some(FillRole::Background),
            ..
        }
    ));
    assert_eq!(prims[1].line_role(), Some(LineRole::Border));
    assert_eq!(count(&prims, LineRole::Major), 4);
    assert_eq!(count(&prims, LineRole::Minor), 9 * 6);
}

#[test]
fn fourfold_with_diagonals_and_no_subdivision() {
    let spec = GridSpec {
        subdivide: false,
        include_diagonals: true,
        ..GridSpec::default().with_mode(GridMode::Fourfold)
    };
    let prims = compute_grid_primitives(200.0, &spec);
    assert_eq!(count(&prims, LineRole::Major), 2);
    assert_eq!(count(&prims, LineRole::Minor), 2);
    // diagonals come last
    assert_eq!(
        prims.last().copied(),
        Some(GridPrimitive::line(200.0, 0.0, 0.0, 200.0, LineRole::Minor))
    );
}

#[test]
fn mi_ignores_subdivision() {
    let prims = compute_grid_primitives(
        120.0,
        &GridSpec::default().with_mode(GridMode::DiagonalCross),
    );
    assert_eq!(count(&prims, LineRole::Major), 4);
    assert_eq!(count(&prims, LineRole::Minor), 0);
}

#[test]
fn zhong_and_hui_clamp_their_ratios() {
    let spec = GridSpec {
        inner_ratio: 2.0,
        ..GridSpec::default().with_mode(GridMode::CenteredSquare)
    };
    let prims = compute_grid_primitives(100.0, &spec);
    let inner = prims.last().copied().unwrap();
    assert_eq!(
        inner,
        GridPrimitive::stroked_rect(10.0, 10.0, 80.0, 80.0, 0.0, LineRole::Minor)
    );

    let spec = GridSpec {
        inner_margin: 0.01,
        ..GridSpec::default().with_mode(GridMode::InscribedSquare)
    };
    let prims = compute_grid_primitives(100.0, &spec);
    assert_eq!(
        prims.last().copied().unwrap(),
        GridPrimitive::stroked_rect(10.0, 10.0, 80.0, 80.0, 0.0, LineRole::Major)
    );
}

#[test]
fn disabled_grid_is_background_and_border_only() {
    let spec = GridSpec {
        enabled: false,
        ..GridSpec::default()
    };
    let prims = compute_grid_primitives(420.0, &spec);
    assert_eq!(prims.len(), 2);
}

#[test]
fn primitives_stay_inside_the_cell() {
    for mode in ALL_MODES {
        for size in [1.0, 24.0, 97.3, 420.0, 1260.0] {
            let spec = GridSpec {
                include_diagonals: true,
                ..GridSpec::default().with_mode(mode)
            };
            for p in compute_grid_primitives(size, &spec) {
                for (x, y) in p.extent_points() {
                    assert!((0.0..=size).contains(&x), "{mode:?} {size} {p:?}");
                    assert!((0.0..=size).contains(&y), "{mode:?} {size} {p:?}");
                }
            }
        }
    }
}

#[test]
fn output_is_deterministic() {
    let spec = GridSpec::print().with_mode(GridMode::Fourfold);
    assert_eq!(
        compute_grid_primitives(77.0, &spec),
        compute_grid_primitives(77.0, &spec)
    );
}

#[test]
fn mode_strings_are_lenient() {
    for (s, m) in [
        ("3x3", GridMode::Ninefold),
        ("ninefold", GridMode::Ninefold),
        ("2x2", GridMode::Fourfold),
        ("mi", GridMode::DiagonalCross),
        ("centered-square", GridMode::CenteredSquare),
        ("HUI", GridMode::InscribedSquare),
        ("hexagonal", GridMode::Ninefold),
    ] {
        let got: GridMode = serde_json::from_value(serde_json::json!(s)).unwrap();
        assert_eq!(got, m, "{s}");
    }
}

#[test]
fn spec_deserializes_partial_json() {
    let spec: GridSpec = serde_json::from_str(
        r##"{"mode": "zhong", "colors": {"major": "#000000"}, "minor_dash": null}"##,
    )
    .unwrap();
    assert_eq!(spec.mode, GridMode::CenteredSquare);
    assert_eq!(spec.colors.major, Rgba8::BLACK);
    assert_eq!(spec.colors.minor, GridColors::default().minor);
    assert_eq!(spec.minor_dash, None);
    assert!(spec.subdivide);
}

#[test]
fn screen_and_print_pens() {
    let spec = GridSpec::default();
    let pens = Pens::screen(1260.0, &spec);
    assert_eq!(pens.major.width, 4.0);
    assert_eq!(pens.minor.width, 3.0);
    assert_eq!(pens.minor.dash, Some([8.0, 24.0]));
    assert_eq!(Pens::screen(100.0, &spec).minor.width, 1.0);

    let print = Pens::print(60.0, &GridSpec::print());
    assert_eq!(print.major.width, 1.5);
    assert!((print.minor.width - 0.6).abs() < 1e-12);
    assert_eq!(print.minor.dash, None);

    let same = GridSpec {
        same_thickness: true,
        ..GridSpec::default()
    };
    assert_eq!(Pens::screen(720.0, &same).minor.width, 2.0);
}

#[test]
fn dash_segments_cover_the_line() {
    let segs = dash_segments((0.0, 0.0), (20.0, 0.0), [2.0, 6.0]);
    assert_eq!(segs.len(), 3);
    assert_eq!(segs[0], ((0.0, 0.0), (2.0, 0.0)));
    assert_eq!(segs[2], ((16.0, 0.0), (18.0, 0.0)));
    assert!(dash_segments((1.0, 1.0), (1.0, 1.0), [2.0, 6.0]).is_empty());
}
