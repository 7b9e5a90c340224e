use std::fmt::Write as _;

use crate::assets::glyph::GlyphData;
use crate::foundation::core::{Affine, Rgba8};
use crate::geometry::grid::{GridPrimitive, GridSpec, Pen, Pens, compute_grid_primitives};
use crate::geometry::transform::{TransformSpec, fmt_num, glyph_transform};

fn paint_attr(name: &str, c: Rgba8) -> String {
    if c.a == 255 {
        format!(r#"{name}="{}""#, c.to_hex_rgb())
    } else {
        format!(
            r#"{name}="{}" {name}-opacity="{}""#,
            c.to_hex_rgb(),
            fmt_num(f64::from(c.a) / 255.0)
        )
    }
}

fn pen_attrs(pen: Pen) -> String {
    let mut s = format!(
        r#"fill="none" {} stroke-width="{}""#,
        paint_attr("stroke", pen.color),
        fmt_num(pen.width)
    );
    if let Some([on, off]) = pen.dash {
        let _ = write!(s, r#" stroke-dasharray="{} {}""#, fmt_num(on), fmt_num(off));
    }
    s
}

/// Grid primitives as SVG elements for a `size` square at the origin.
pub fn grid_elements(size: f64, spec: &GridSpec) -> String {
    let pens = Pens::screen(size, spec);
    let mut out = String::new();
    for prim in compute_grid_primitives(size, spec) {
        match prim {
            GridPrimitive::Line {
                x1,
                y1,
                x2,
                y2,
                role,
            } => {
                let _ = writeln!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
                    fmt_num(x1),
                    fmt_num(y1),
                    fmt_num(x2),
                    fmt_num(y2),
                    pen_attrs(pens.pen(role))
                );
            }
            GridPrimitive::Rect {
                x,
                y,
                w,
                h,
                corner_radius,
                stroke,
                fill,
            } => {
                let geom = format!(
                    r#"x="{}" y="{}" width="{}" height="{}" rx="{}""#,
                    fmt_num(x),
                    fmt_num(y),
                    fmt_num(w),
                    fmt_num(h),
                    fmt_num(corner_radius)
                );
                if fill.is_some() {
                    let _ = writeln!(
                        out,
                        r#"<rect {geom} {}/>"#,
                        paint_attr("fill", pens.background)
                    );
                }
                if let Some(role) = stroke {
                    let _ = writeln!(out, r#"<rect {geom} {}/>"#, pen_attrs(pens.pen(role)));
                }
            }
        }
    }
    out
}

/// Strokes `0..=upto` (all when `None`) as a transformed `<g>`.
pub fn glyph_group(
    glyph: &GlyphData,
    transform: Affine,
    color: Rgba8,
    radical_color: Option<Rgba8>,
    upto: Option<usize>,
) -> String {
    let c = transform.as_coeffs();
    let spec = TransformSpec::Matrix(c);
    let last = upto.unwrap_or(usize::MAX);
    let mut out = format!(r#"<g transform="{}">"#, spec.to_svg());
    out.push('\n');
    for (i, d) in glyph.stroke_paths.iter().enumerate().take_while(|(i, _)| *i <= last) {
        let fill = match radical_color {
            Some(rc) if glyph.is_radical(i) => rc,
            _ => color,
        };
        let _ = writeln!(out, r#"<path d="{}" {}/>"#, escape_attr(d), paint_attr("fill", fill));
    }
    out.push_str("</g>\n");
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Standalone SVG of one practice cell with the glyph drawn through stroke `upto`.
pub fn cell_svg(
    glyph: &GlyphData,
    size: f64,
    grid: &GridSpec,
    color: Rgba8,
    upto: Option<usize>,
) -> String {
    let mut out = svg_open(size, size);
    out.push_str(&grid_elements(size, grid));
    out.push_str(&glyph_group(glyph, glyph_transform(size), color, None, upto));
    out.push_str("</svg>\n");
    out
}

/// Sheet of cumulative stroke-order thumbnails (strokes `0..=i` in cell `i`), wrapping after
/// `per_row` cells.
pub fn step_sheet_svg(
    glyph: &GlyphData,
    thumb: f64,
    per_row: usize,
    gap: f64,
    grid: &GridSpec,
    color: Rgba8,
) -> String {
    let n = glyph.stroke_count();
    let per_row = per_row.max(1);
    let rows = n.div_ceil(per_row).max(1);
    let cols = n.clamp(1, per_row);
    let width = cols as f64 * thumb + (cols as f64 - 1.0) * gap;
    let height = rows as f64 * thumb + (rows as f64 - 1.0) * gap;

    let mut out = svg_open(width, height);
    let cell_grid = grid_elements(thumb, grid);
    let transform = glyph_transform(thumb);
    for i in 0..n {
        let (row, col) = (i / per_row, i % per_row);
        let x = col as f64 * (thumb + gap);
        let y = row as f64 * (thumb + gap);
        let _ = writeln!(
            out,
            r#"<g transform="translate({} {})">"#,
            fmt_num(x),
            fmt_num(y)
        );
        out.push_str(&cell_grid);
        out.push_str(&glyph_group(glyph, transform, color, None, Some(i)));
        out.push_str("</g>\n");
    }
    out.push_str("</svg>\n");
    out
}

fn svg_open(w: f64, h: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = fmt_num(w),
        h = fmt_num(h)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
