//! Stroke-order animation engine.
//!
//! Each stroke is revealed along its median: the outline is clipped to a wide pen swept over the
//! first `progress × length` of the median, with the start pushed back by half the pen width so
//! the stroke's blunt end is covered from the first frame.

use crate::assets::glyph::{GlyphData, polyline_length};
use crate::foundation::core::{BezPath, Point, Rgba8};

/// Reveal pen width in native glyph units.
pub const STROKE_MASK_WIDTH: f64 = 200.0;

/// Median length added to every stroke when computing its duration.
const STROKE_DURATION_BASE: f64 = 600.0;

/// Pure white strokes would vanish on a white cell; they are drawn in this instead.
pub const WHITE_STROKE_REPLACEMENT: Rgba8 = Rgba8::opaque(0x11, 0x11, 0x11);

/// Writer appearance and pacing.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WriterStyle {
    pub stroke_color: Rgba8,
    pub radical_color: Rgba8,
    pub outline_color: Rgba8,
    /// Animation speed multiplier; larger is faster.
    pub speed: f64,
    pub delay_between_strokes_ms: f64,
    pub delay_between_loops_ms: f64,
    pub show_outline: bool,
    /// Show the finished character while not animating.
    pub show_character: bool,
}

impl Default for WriterStyle {
    fn default() -> Self {
        Self {
            stroke_color: Rgba8::opaque(0x11, 0x11, 0x11),
            radical_color: Rgba8::opaque(0x16, 0x8F, 0x16),
            outline_color: Rgba8::opaque(0xDD, 0xDD, 0xDD),
            speed: 0.2,
            delay_between_strokes_ms: 0.0,
            delay_between_loops_ms: 2000.0,
            show_outline: true,
            show_character: false,
        }
    }
}

impl WriterStyle {
    /// Copy with white stroke colors replaced and pacing values made finite and positive.
    pub fn sanitized(mut self) -> Self {
        if self.stroke_color.is_white() {
            self.stroke_color = WHITE_STROKE_REPLACEMENT;
        }
        if self.radical_color.is_white() {
            self.radical_color = WHITE_STROKE_REPLACEMENT;
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            self.speed = Self::default().speed;
        }
        self.delay_between_strokes_ms = finite_non_negative(self.delay_between_strokes_ms);
        self.delay_between_loops_ms = finite_non_negative(self.delay_between_loops_ms);
        self
    }

    /// `true` when only pacing or visibility differ.
    pub fn same_look(&self, other: &Self) -> bool {
        self.stroke_color == other.stroke_color
            && self.radical_color == other.radical_color
            && self.outline_color == other.outline_color
    }
}

fn finite_non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Duration of one stroke of median length `length` at `speed`.
pub fn stroke_duration_ms(length: f64, speed: f64) -> f64 {
    (length + STROKE_DURATION_BASE) / (3.0 * speed)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeSegment {
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl StrokeSegment {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }
}

/// When each stroke of one full animation plays.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeTimeline {
    segments: Vec<StrokeSegment>,
    total_ms: f64,
}

impl StrokeTimeline {
    pub fn new(glyph: &GlyphData, speed: f64, delay_between_strokes_ms: f64) -> Self {
        let delay = finite_non_negative(delay_between_strokes_ms);
        let mut segments = Vec::with_capacity(glyph.stroke_count());
        let mut t = 0.0;
        for i in 0..glyph.stroke_count() {
            if i > 0 {
                t += delay;
            }
            let duration_ms = stroke_duration_ms(glyph.median_length(i), speed);
            segments.push(StrokeSegment {
                start_ms: t,
                duration_ms,
            });
            t += duration_ms;
        }
        Self {
            segments,
            total_ms: t,
        }
    }

    pub fn segments(&self) -> &[StrokeSegment] {
        &self.segments
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn frame_at(&self, t_ms: f64) -> StrokeFrame {
        let progress = self
            .segments
            .iter()
            .map(|s| {
                if t_ms >= s.end_ms() {
                    1.0
                } else if t_ms <= s.start_ms {
                    0.0
                } else {
                    (t_ms - s.start_ms) / s.duration_ms
                }
            })
            .collect();
        StrokeFrame { progress }
    }
}

/// Per-stroke reveal fraction in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeFrame {
    progress: Vec<f64>,
}

impl StrokeFrame {
    pub fn hidden(strokes: usize) -> Self {
        Self {
            progress: vec![0.0; strokes],
        }
    }

    pub fn complete(strokes: usize) -> Self {
        Self {
            progress: vec![1.0; strokes],
        }
    }

    /// The first `n` strokes fully drawn, the rest hidden.
    pub fn first_n(strokes: usize, n: usize) -> Self {
        Self {
            progress: (0..strokes)
                .map(|i| if i < n { 1.0 } else { 0.0 })
                .collect(),
        }
    }

    pub fn progress(&self, stroke: usize) -> f64 {
        self.progress.get(stroke).copied().unwrap_or(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress.iter().all(|&p| p >= 1.0)
    }

    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }
}

/// Moves the first median point back by `by` along the first segment.
fn extend_start(median: &[Point], by: f64) -> Vec<Point> {
    let mut pts = median.to_vec();
    if pts.len() >= 2 {
        let d = pts[0] - pts[1];
        let len = d.hypot();
        if len > 0.0 {
            pts[0] += d * (by / len);
        }
    }
    pts
}

/// Median prefix of length `progress × (extended length)` as an open polyline.
pub fn reveal_path(median: &[Point], progress: f64) -> BezPath {
    let pts = extend_start(median, STROKE_MASK_WIDTH / 2.0);
    let mut path = BezPath::new();
    let Some(&first) = pts.first() else {
        return path;
    };
    path.move_to(first);

    let mut remaining = polyline_length(&pts) * progress.clamp(0.0, 1.0);
    for w in pts.windows(2) {
        let seg = w[0].distance(w[1]);
        if remaining >= seg {
            path.line_to(w[1]);
            remaining -= seg;
        } else {
            if seg > 0.0 {
                path.line_to(w[0].lerp(w[1], remaining / seg));
            }
            break;
        }
    }
    path
}

#[cfg(test)]
#[path = "../../tests/unit/render/strokes.rs"]
mod tests;
