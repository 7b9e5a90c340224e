use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{StudioError, StudioResult};

/// Fraction of the cell edge covered by the visible glyph box.
///
/// Shared by the stage, video frames, step thumbnails and PDF faint glyphs so they all line up.
pub const CHAR_BOX_SCALE: f64 = 0.9;

/// Padding in pixels for a glyph drawn at `CHAR_BOX_SCALE` inside a cell of `size`.
pub fn glyph_padding(size: f64) -> f64 {
    (size * (1.0 - CHAR_BOX_SCALE) / 2.0).round()
}

/// Axis-aligned glyph coordinate box in its native, Y-up space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NativeBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl NativeBox {
    /// The hanzi-writer-data em box: 1024 units wide, baseline offset by 124.
    pub const HANZI_WRITER: Self = Self {
        x0: 0.0,
        y0: -124.0,
        x1: 1024.0,
        y1: 900.0,
    };

    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Glyph placement as supplied by an upstream layout.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpec {
    /// SVG/canvas matrix `[a, b, c, d, e, f]`.
    Matrix([f64; 6]),
    TranslateScale { tx: f64, ty: f64, sx: f64, sy: f64 },
    /// Origin at `(x, y)`, uniform `scale` with a Y flip.
    PointScale { x: f64, y: f64, scale: f64 },
}

impl TransformSpec {
    pub fn to_affine(&self) -> Affine {
        match *self {
            Self::Matrix(m) => Affine::new(m),
            Self::TranslateScale { tx, ty, sx, sy } => {
                Affine::translate((tx, ty)) * Affine::scale_non_uniform(sx, sy)
            }
            Self::PointScale { x, y, scale } => {
                Affine::translate((x, y)) * Affine::scale_non_uniform(scale, -scale)
            }
        }
    }

    /// Parses `matrix(a b c d e f)` or `translate(tx, ty) scale(sx, sy)`.
    pub fn parse_svg(s: &str) -> StudioResult<Self> {
        let funcs = parse_transform_list(s)?;
        match funcs.as_slice() {
            [(name, args)] if name == "matrix" => {
                let m: [f64; 6] = args.as_slice().try_into().map_err(|_| {
                    StudioError::validation(format!("matrix() needs 6 values: \"{s}\""))
                })?;
                Ok(Self::Matrix(m))
            }
            [(t, targs), (sc, sargs)] if t == "translate" && sc == "scale" => {
                let (tx, ty) = match targs.as_slice() {
                    [tx] => (*tx, 0.0),
                    [tx, ty] => (*tx, *ty),
                    _ => {
                        return Err(StudioError::validation(format!(
                            "translate() needs 1 or 2 values: \"{s}\""
                        )));
                    }
                };
                let (sx, sy) = match sargs.as_slice() {
                    [k] => (*k, *k),
                    [sx, sy] => (*sx, *sy),
                    _ => {
                        return Err(StudioError::validation(format!(
                            "scale() needs 1 or 2 values: \"{s}\""
                        )));
                    }
                };
                Ok(Self::TranslateScale { tx, ty, sx, sy })
            }
            [(t, targs)] if t == "translate" => match targs.as_slice() {
                [tx, ty] => Ok(Self::TranslateScale {
                    tx: *tx,
                    ty: *ty,
                    sx: 1.0,
                    sy: 1.0,
                }),
                _ => Err(StudioError::validation(format!(
                    "translate() needs 2 values: \"{s}\""
                ))),
            },
            _ => Err(StudioError::validation(format!(
                "unsupported transform \"{s}\""
            ))),
        }
    }

    pub fn to_svg(&self) -> String {
        let c = self.to_affine().as_coeffs();
        format!(
            "matrix({} {} {} {} {} {})",
            fmt_num(c[0]),
            fmt_num(c[1]),
            fmt_num(c[2]),
            fmt_num(c[3]),
            fmt_num(c[4]),
            fmt_num(c[5])
        )
    }
}

pub(crate) fn fmt_num(v: f64) -> String {
    let r = (v * 1e6).round() / 1e6;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

fn parse_transform_list(s: &str) -> StudioResult<Vec<(String, Vec<f64>)>> {
    let mut out = Vec::new();
    let mut rest = s.trim();
    while !rest.is_empty() {
        let open = rest
            .find('(')
            .ok_or_else(|| StudioError::validation(format!("malformed transform \"{s}\"")))?;
        let close = rest[open..]
            .find(')')
            .map(|i| open + i)
            .ok_or_else(|| StudioError::validation(format!("unclosed transform \"{s}\"")))?;
        let name = rest[..open].trim().to_ascii_lowercase();
        let args = rest[open + 1..close]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    StudioError::validation(format!("bad number \"{t}\" in transform \"{s}\""))
                })
            })
            .collect::<StudioResult<Vec<_>>>()?;
        out.push((name, args));
        rest = rest[close + 1..].trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }
    Ok(out)
}

/// Affine placing `native` into a `target_size` square with `padding_px` on every side.
///
/// An upstream transform wins when given; otherwise the box is scaled uniformly to fit,
/// centered, and flipped to Y-down.
pub fn resolve_transform(
    native: NativeBox,
    target_size: f64,
    padding_px: f64,
    upstream: Option<&TransformSpec>,
) -> Affine {
    if let Some(spec) = upstream {
        return spec.to_affine();
    }

    let inner = (target_size - 2.0 * padding_px).max(0.0);
    let (w, h) = (native.width(), native.height());
    let scale = if w > 0.0 && h > 0.0 {
        (inner / w).min(inner / h)
    } else {
        0.0
    };
    let x_offset = -native.x0 * scale + padding_px + (inner - w * scale) / 2.0;
    let y_offset = -native.y0 * scale + padding_px + (inner - h * scale) / 2.0;

    Affine::translate((x_offset, target_size - y_offset)) * Affine::scale_non_uniform(scale, -scale)
}

/// Default hanzi-writer glyph placement for a cell of `size` pixels.
pub fn glyph_transform(size: f64) -> Affine {
    resolve_transform(NativeBox::HANZI_WRITER, size, glyph_padding(size), None)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
