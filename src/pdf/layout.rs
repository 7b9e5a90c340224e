use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::math::mm_to_pt;

/// Smallest printable practice cell.
pub const MIN_CELL_PT: f64 = 24.0;
pub const COLUMN_RANGE: (u32, u32) = (2, 12);

pub const DEFAULT_GUIDE_STEP_PT: f64 = 30.0;
pub const DEFAULT_GUIDE_GAP_PT: f64 = 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Portrait width and height in points.
    pub fn dimensions_pt(self) -> (f64, f64) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Page box in points for `size` turned to `orientation`.
pub fn page_box(size: PageSize, orientation: Orientation) -> (f64, f64) {
    let (w, h) = size.dimensions_pt();
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

/// Row(s) of cumulative stroke thumbnails above the grid on the first page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuidePlan {
    pub steps: usize,
    pub per_row: usize,
    pub rows: usize,
    pub step_pt: f64,
    pub gap_pt: f64,
    pub area_height: f64,
}

impl GuidePlan {
    pub fn new(steps: usize, usable_width: f64, step_pt: f64, gap_pt: f64) -> Self {
        let gap = gap_pt.max(0.0);
        let per_row = ((usable_width + gap) / (step_pt + gap)).floor().max(1.0) as usize;
        let rows = steps.div_ceil(per_row);
        let area_height = if rows == 0 {
            0.0
        } else {
            rows as f64 * step_pt + (rows as f64 - 1.0) * gap
        };
        Self {
            steps,
            per_row,
            rows,
            step_pt,
            gap_pt: gap,
            area_height,
        }
    }

    /// Bottom-left corner (PDF space) of thumbnail `i`.
    pub fn step_origin(&self, i: usize, page_height: f64, margin: f64) -> (f64, f64) {
        let (row, col) = (i / self.per_row, i % self.per_row);
        let x = margin + col as f64 * (self.step_pt + self.gap_pt);
        let y = page_height
            - margin
            - (row as f64 + 1.0) * self.step_pt
            - row as f64 * self.gap_pt;
        (x, y)
    }
}

/// Cell grid geometry for one worksheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PdfLayoutPlan {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_pt: f64,
    pub columns: u32,
    pub cell_size_pt: f64,
    pub rows_first_page: u32,
    pub rows_per_page: u32,
    pub guide: Option<GuidePlan>,
}

/// Clamped column count and `floor(usable_width / columns)`.
pub fn cell_size(
    page_width: f64,
    margin_pt: f64,
    columns: u32,
) -> StudioResult<(u32, f64)> {
    let columns = columns.clamp(COLUMN_RANGE.0, COLUMN_RANGE.1);
    let usable = page_width - 2.0 * margin_pt;
    let cell = (usable / f64::from(columns)).floor();
    if !(cell >= MIN_CELL_PT) {
        return Err(StudioError::CellTooSmall {
            cell_pt: cell,
            min_pt: MIN_CELL_PT,
            columns,
        });
    }
    Ok((columns, cell))
}

impl PdfLayoutPlan {
    /// Lays out the page; `guide_steps` reserves a stroke guide on the first page.
    pub fn compute(
        page: PageSize,
        orientation: Orientation,
        margin_mm: f64,
        columns: u32,
        guide_steps: Option<usize>,
        guide_step_pt: f64,
        guide_gap_pt: f64,
    ) -> StudioResult<Self> {
        let (page_width, page_height) = page_box(page, orientation);
        let margin_pt = mm_to_pt(margin_mm.max(0.0));
        let (columns, cell) = cell_size(page_width, margin_pt, columns)?;

        let guide = guide_steps
            .filter(|&n| n > 0)
            .map(|n| GuidePlan::new(n, page_width - 2.0 * margin_pt, guide_step_pt, guide_gap_pt));
        let guide_h = guide.map_or(0.0, |g| g.area_height);

        let full = page_height - 2.0 * margin_pt;
        let rows_per_page = (full / cell).floor();
        if rows_per_page < 1.0 {
            return Err(StudioError::NotEnoughSpaceForGrid {
                available_pt: full,
                cell_pt: cell,
            });
        }
        let first = full - guide_h;
        let rows_first_page = (first / cell).floor();
        if rows_first_page < 1.0 {
            return Err(StudioError::NotEnoughSpaceForGrid {
                available_pt: first,
                cell_pt: cell,
            });
        }

        Ok(Self {
            page_width,
            page_height,
            margin_pt,
            columns,
            cell_size_pt: cell,
            rows_first_page: rows_first_page as u32,
            rows_per_page: rows_per_page as u32,
            guide,
        })
    }

    pub fn cells_first_page(&self) -> usize {
        (self.rows_first_page * self.columns) as usize
    }

    pub fn cells_per_page(&self) -> usize {
        (self.rows_per_page * self.columns) as usize
    }

    /// Pages needed to place `cells` cells in order.
    pub fn pages_for(&self, cells: usize) -> usize {
        let first = self.cells_first_page();
        if cells <= first {
            1
        } else {
            1 + (cells - first).div_ceil(self.cells_per_page())
        }
    }

    /// Cells on page `page` (0-based).
    pub fn cells_on_page(&self, page: usize) -> usize {
        if page == 0 {
            self.cells_first_page()
        } else {
            self.cells_per_page()
        }
    }

    /// Bottom-left corner (PDF space) of cell `slot` in row-major order on page `page`.
    pub fn cell_origin(&self, page: usize, slot: usize) -> (f64, f64) {
        let cols = self.columns as usize;
        let (r, c) = (slot / cols, slot % cols);
        let start_top = if page == 0 {
            self.margin_pt + self.guide.map_or(0.0, |g| g.area_height)
        } else {
            self.margin_pt
        };
        let x = self.margin_pt + c as f64 * self.cell_size_pt;
        let y_top = start_top + r as f64 * self.cell_size_pt;
        (x, self.page_height - (y_top + self.cell_size_pt))
    }

    /// Footer baseline origin.
    pub fn footer_origin(&self) -> (f64, f64) {
        (self.margin_pt, self.margin_pt / 2.2)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/layout.rs"]
mod tests;
