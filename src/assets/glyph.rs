use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::{StudioError, StudioResult};
use kurbo::{PathEl, Shape};

/// Stroke geometry for one character, in the 1024-unit Y-up native box.
#[derive(Clone, Debug)]
pub struct GlyphData {
    pub character: String,
    /// Filled stroke outlines, in stroke order.
    pub strokes: Vec<BezPath>,
    /// Source path strings, kept for SVG output.
    pub stroke_paths: Vec<String>,
    /// One skeleton polyline per stroke, drawn from its start.
    pub medians: Vec<Vec<Point>>,
    /// Indices of strokes that belong to the radical.
    pub radical_strokes: Vec<usize>,
}

/// On-disk glyph record, in the hanzi-writer-data layout.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct GlyphRecord {
    pub strokes: Vec<String>,
    #[serde(default)]
    pub medians: Vec<MedianRepr>,
    #[serde(default, rename = "radStrokes")]
    pub rad_strokes: Vec<usize>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum MedianRepr {
    Points(Vec<[f64; 2]>),
    Path(String),
}

impl GlyphData {
    pub fn from_record(character: impl Into<String>, record: &GlyphRecord) -> StudioResult<Self> {
        let character = character.into();
        if record.strokes.is_empty() {
            return Err(StudioError::glyph_not_found(
                &character,
                "glyph record has no strokes",
            ));
        }

        let mut strokes = Vec::with_capacity(record.strokes.len());
        for (i, d) in record.strokes.iter().enumerate() {
            let path = BezPath::from_svg(d).map_err(|e| {
                StudioError::glyph_not_found(
                    &character,
                    format!("stroke {i} has an invalid path: {e}"),
                )
            })?;
            strokes.push(path);
        }

        let mut medians = Vec::with_capacity(strokes.len());
        for (i, stroke) in strokes.iter().enumerate() {
            let median = match record.medians.get(i) {
                Some(MedianRepr::Points(pts)) if pts.len() >= 2 => {
                    pts.iter().map(|p| Point::new(p[0], p[1])).collect()
                }
                Some(MedianRepr::Path(d)) => {
                    let path = BezPath::from_svg(d).map_err(|e| {
                        StudioError::glyph_not_found(
                            &character,
                            format!("median {i} has an invalid path: {e}"),
                        )
                    })?;
                    on_curve_points(&path)
                }
                _ => Vec::new(),
            };
            medians.push(if median.len() >= 2 {
                median
            } else {
                fallback_median(stroke)
            });
        }

        let radical_strokes = record
            .rad_strokes
            .iter()
            .copied()
            .filter(|&i| i < strokes.len())
            .collect();

        Ok(Self {
            character,
            strokes,
            stroke_paths: record.strokes.clone(),
            medians,
            radical_strokes,
        })
    }

    pub fn from_json_slice(character: impl Into<String>, bytes: &[u8]) -> StudioResult<Self> {
        let record: GlyphRecord = serde_json::from_slice(bytes)
            .map_err(|e| StudioError::serde(format!("glyph json parse failed: {e}")))?;
        Self::from_record(character, &record)
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_radical(&self, stroke: usize) -> bool {
        self.radical_strokes.contains(&stroke)
    }

    /// Polyline length of a stroke's median, in native units.
    pub fn median_length(&self, stroke: usize) -> f64 {
        self.medians
            .get(stroke)
            .map(|m| polyline_length(m))
            .unwrap_or(0.0)
    }
}

pub(crate) fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

fn on_curve_points(path: &BezPath) -> Vec<Point> {
    path.elements()
        .iter()
        .filter_map(|el| match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p),
            PathEl::QuadTo(_, p) => Some(p),
            PathEl::CurveTo(_, _, p) => Some(p),
            PathEl::ClosePath => None,
        })
        .collect()
}

// Records without medians get a straight skeleton along the stroke's longer bbox axis.
fn fallback_median(stroke: &BezPath) -> Vec<Point> {
    let bb = stroke.bounding_box();
    let c = bb.center();
    if bb.width() >= bb.height() {
        vec![Point::new(bb.x0, c.y), Point::new(bb.x1, c.y)]
    } else {
        vec![Point::new(c.x, bb.y1), Point::new(c.x, bb.y0)]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/glyph.rs"]
mod tests;
