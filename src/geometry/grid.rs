use crate::foundation::core::Rgba8;

/// Practice-grid style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GridMode {
    /// 3×3 (`ninefold` / `3x3`).
    #[default]
    Ninefold,
    /// 2×2 (`fourfold` / `2x2`).
    Fourfold,
    /// 米字格 (`diagonal-cross` / `mi`).
    DiagonalCross,
    /// 中宫格 (`centered-square` / `zhong`).
    CenteredSquare,
    /// 回宫格 (`inscribed-square` / `hui`).
    InscribedSquare,
}

impl GridMode {
    /// Parses any accepted spelling; unknown strings fall back to [`GridMode::Ninefold`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "fourfold" | "2x2" => Self::Fourfold,
            "diagonal-cross" | "mi" => Self::DiagonalCross,
            "centered-square" | "zhong" => Self::CenteredSquare,
            "inscribed-square" | "hui" => Self::InscribedSquare,
            _ => Self::Ninefold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ninefold => "3x3",
            Self::Fourfold => "2x2",
            Self::DiagonalCross => "mi",
            Self::CenteredSquare => "zhong",
            Self::InscribedSquare => "hui",
        }
    }

    /// Modes that support the 4×4 per-cell subdivision and optional diagonals.
    pub fn is_subdividable(self) -> bool {
        matches!(self, Self::Ninefold | Self::Fourfold)
    }
}

impl serde::Serialize for GridMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for GridMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridColors {
    pub background: Rgba8,
    pub major: Rgba8,
    pub minor: Rgba8,
    pub border: Rgba8,
}

impl Default for GridColors {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            major: Rgba8::opaque(0xBF, 0xCA, 0xE4),
            minor: Rgba8::opaque(0xD5, 0xDD, 0xEF),
            border: Rgba8::opaque(0xBF, 0xCA, 0xE4),
        }
    }
}

pub const INNER_RATIO_RANGE: (f64, f64) = (0.25, 0.8);
pub const INNER_MARGIN_RANGE: (f64, f64) = (0.1, 0.3);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub enabled: bool,
    pub mode: GridMode,
    /// 4×4 minor grid inside every major cell (ninefold/fourfold only).
    pub subdivide: bool,
    /// Corner-to-corner diagonals (ninefold/fourfold only).
    pub include_diagonals: bool,
    /// Zhong inner square side as a fraction of the cell.
    pub inner_ratio: f64,
    /// Hui inset as a fraction of the cell.
    pub inner_margin: f64,
    pub colors: GridColors,
    /// Minor-line dash `[on, off]` in units of the major line width.
    pub minor_dash: Option<[f64; 2]>,
    pub corner_radius: f64,
    /// Draw minor lines at major width.
    pub same_thickness: bool,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: GridMode::Ninefold,
            subdivide: true,
            include_diagonals: false,
            inner_ratio: 0.5,
            inner_margin: 0.16,
            colors: GridColors::default(),
            minor_dash: Some([2.0, 6.0]),
            corner_radius: 14.0,
            same_thickness: false,
        }
    }
}

impl GridSpec {
    /// Print preset: darker lines, solid minor lines, square corners.
    pub fn print() -> Self {
        Self {
            colors: GridColors {
                background: Rgba8::WHITE,
                major: Rgba8::from_unit(0.5, 0.55, 0.72, 1.0),
                minor: Rgba8::from_unit(0.68, 0.73, 0.86, 1.0),
                border: Rgba8::from_unit(0.5, 0.55, 0.72, 1.0),
            },
            minor_dash: None,
            corner_radius: 0.0,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: GridMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn clamped_inner_ratio(&self) -> f64 {
        clamp_finite(self.inner_ratio, INNER_RATIO_RANGE, 0.5)
    }

    pub fn clamped_inner_margin(&self) -> f64 {
        clamp_finite(self.inner_margin, INNER_MARGIN_RANGE, 0.16)
    }
}

fn clamp_finite(v: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineRole {
    Border,
    Major,
    Minor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FillRole {
    Background,
}

/// A surface-independent grid element in top-left-origin, Y-down coordinates of a square cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridPrimitive {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        role: LineRole,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        corner_radius: f64,
        stroke: Option<LineRole>,
        fill: Option<FillRole>,
    },
}

impl GridPrimitive {
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, role: LineRole) -> Self {
        Self::Line {
            x1,
            y1,
            x2,
            y2,
            role,
        }
    }

    pub fn stroked_rect(x: f64, y: f64, w: f64, h: f64, radius: f64, role: LineRole) -> Self {
        Self::Rect {
            x,
            y,
            w,
            h,
            corner_radius: radius,
            stroke: Some(role),
            fill: None,
        }
    }

    /// Role of the stroke, if this primitive is stroked.
    pub fn line_role(&self) -> Option<LineRole> {
        match *self {
            Self::Line { role, .. } => Some(role),
            Self::Rect { stroke, .. } => stroke,
        }
    }

    /// Every coordinate this primitive touches, as `(x, y)` pairs.
    pub fn extent_points(&self) -> [(f64, f64); 2] {
        match *self {
            Self::Line { x1, y1, x2, y2, .. } => [(x1, y1), (x2, y2)],
            Self::Rect { x, y, w, h, .. } => [(x, y), (x + w, y + h)],
        }
    }
}

/// Grid primitives for a square of side `size`, in draw order:
/// background, border, major lines, minor lines, diagonals.
pub fn compute_grid_primitives(size: f64, spec: &GridSpec) -> Vec<GridPrimitive> {
    let s = if size.is_finite() { size.max(0.0) } else { 0.0 };
    let radius = spec.corner_radius.clamp(0.0, s / 2.0);
    let mut out = vec![
        GridPrimitive::Rect {
            x: 0.0,
            y: 0.0,
            w: s,
            h: s,
            corner_radius: radius,
            stroke: None,
            fill: Some(FillRole::Background),
        },
        GridPrimitive::stroked_rect(0.0, 0.0, s, s, radius, LineRole::Border),
    ];
    if !spec.enabled || s == 0.0 {
        return out;
    }

    let mid = s / 2.0;
    let cross = |out: &mut Vec<GridPrimitive>, role: LineRole| {
        out.push(GridPrimitive::line(mid, 0.0, mid, s, role));
        out.push(GridPrimitive::line(0.0, mid, s, mid, role));
    };
    let diagonals = |out: &mut Vec<GridPrimitive>, role: LineRole| {
        out.push(GridPrimitive::line(0.0, 0.0, s, s, role));
        out.push(GridPrimitive::line(s, 0.0, 0.0, s, role));
    };

    match spec.mode {
        GridMode::Ninefold | GridMode::Fourfold => {
            let n = if spec.mode == GridMode::Ninefold { 3 } else { 2 };
            let cell = s / f64::from(n);
            for i in 1..n {
                let x = cell * f64::from(i);
                out.push(GridPrimitive::line(x, 0.0, x, s, LineRole::Major));
            }
            for i in 1..n {
                let y = cell * f64::from(i);
                out.push(GridPrimitive::line(0.0, y, s, y, LineRole::Major));
            }
            if spec.subdivide {
                for r in 0..n {
                    for c in 0..n {
                        subdivide_4x4(&mut out, cell * f64::from(c), cell * f64::from(r), cell);
                    }
                }
            }
            if spec.include_diagonals {
                diagonals(&mut out, LineRole::Minor);
            }
        }
        GridMode::DiagonalCross => {
            cross(&mut out, LineRole::Major);
            diagonals(&mut out, LineRole::Major);
        }
        GridMode::CenteredSquare => {
            cross(&mut out, LineRole::Major);
            let inner = s * spec.clamped_inner_ratio();
            let o = (s - inner) / 2.0;
            out.push(GridPrimitive::stroked_rect(
                o,
                o,
                inner,
                inner,
                0.0,
                LineRole::Minor,
            ));
        }
        GridMode::InscribedSquare => {
            let m = s * spec.clamped_inner_margin();
            out.push(GridPrimitive::stroked_rect(
                m,
                m,
                s - 2.0 * m,
                s - 2.0 * m,
                0.0,
                LineRole::Major,
            ));
        }
    }
    out
}

fn subdivide_4x4(out: &mut Vec<GridPrimitive>, x0: f64, y0: f64, side: f64) {
    let step = side / 4.0;
    for q in 1..=3 {
        let x = x0 + step * f64::from(q);
        let y = y0 + step * f64::from(q);
        out.push(GridPrimitive::line(x, y0, x, y0 + side, LineRole::Minor));
        out.push(GridPrimitive::line(x0, y, x0 + side, y, LineRole::Minor));
    }
}

/// Resolved stroke style for one line role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub color: Rgba8,
    pub width: f64,
    /// `[on, off]` lengths in surface units.
    pub dash: Option<[f64; 2]>,
}

/// Per-surface styling of grid roles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pens {
    pub background: Rgba8,
    pub border: Pen,
    pub major: Pen,
    pub minor: Pen,
}

impl Pens {
    /// Screen styling (raster and SVG): widths snap to whole pixels.
    pub fn screen(size: f64, spec: &GridSpec) -> Self {
        let major_w = (size / 360.0).round().max(1.0);
        let minor_w = if spec.same_thickness {
            major_w
        } else {
            (major_w * 0.9).floor().max(1.0)
        };
        let dash = spec
            .minor_dash
            .map(|[on, off]| [on * major_w, off * major_w]);
        Self::build(spec, major_w, minor_w, dash)
    }

    /// Print styling (PDF points).
    pub fn print(size: f64, spec: &GridSpec) -> Self {
        let major_w = (size / 120.0).max(1.5);
        let minor_w = if spec.same_thickness {
            major_w
        } else {
            (major_w * 0.4).max(0.6)
        };
        Self::build(spec, major_w, minor_w, spec.minor_dash)
    }

    fn build(spec: &GridSpec, major_w: f64, minor_w: f64, dash: Option<[f64; 2]>) -> Self {
        let c = &spec.colors;
        Self {
            background: c.background,
            border: Pen {
                color: c.border,
                width: major_w,
                dash: None,
            },
            major: Pen {
                color: c.major,
                width: major_w,
                dash: None,
            },
            minor: Pen {
                color: c.minor,
                width: minor_w,
                dash: dash.filter(|[on, off]| *on > 0.0 && *off >= 0.0),
            },
        }
    }

    pub fn pen(&self, role: LineRole) -> Pen {
        match role {
            LineRole::Border => self.border,
            LineRole::Major => self.major,
            LineRole::Minor => self.minor,
        }
    }
}

/// Splits a straight segment into its dash pieces.
pub(crate) fn dash_segments(
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    [on, off]: [f64; 2],
) -> Vec<((f64, f64), (f64, f64))> {
    let len = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
    if len == 0.0 || on <= 0.0 {
        return Vec::new();
    }
    let (ux, uy) = ((x2 - x1) / len, (y2 - y1) / len);
    let period = on + off.max(0.0);
    let mut out = Vec::new();
    let mut t = 0.0;
    while t < len {
        let end = (t + on).min(len);
        out.push(((x1 + ux * t, y1 + uy * t), (x1 + ux * end, y1 + uy * end)));
        t += period;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/grid.rs"]
mod tests;
