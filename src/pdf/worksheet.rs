use std::sync::Arc;

use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use rayon::prelude::*;

use crate::assets::glyph::GlyphData;
use crate::assets::source::GlyphDataSource;
use crate::export::archive::{ArchiveEntry, build_zip};
use crate::export::naming::{
    combined_worksheet_filename, index_prefix, sanitize_file_name, worksheet_filename,
    worksheet_index_width, worksheet_zip_name,
};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{StudioError, StudioResult};
use crate::geometry::grid::GridSpec;
use crate::render::cpu::rasterize_glyph;

use super::font::FooterFont;
use super::layout::{
    DEFAULT_GUIDE_GAP_PT, DEFAULT_GUIDE_STEP_PT, Orientation, PageSize, PdfLayoutPlan, cell_size,
    page_box,
};
use super::page::{PageCanvas, PdfImage, RefAlloc};

pub const DEFAULT_TITLE: &str = "Practice sheet";
pub const DEFAULT_FAINT_ALPHA: f64 = 0.18;
/// Raster size of one stroke-guide thumbnail.
pub const GUIDE_RASTER_PX: u32 = 240;

const INK: Rgba8 = Rgba8::opaque(0x11, 0x11, 0x11);
const FOOTER_SIZE_PT: f64 = 9.0;
const FAINT_GS: &str = "GsFaint";
const FOOTER_FONT: &str = "F1";

/// Where the cell characters come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// The first character fills every cell of one page.
    #[default]
    Selected,
    /// Characters in input order, one per cell, over as many pages as needed.
    Sequence,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub columns: u32,
    pub margin_mm: f64,
    pub source_mode: SourceMode,
    pub grid: GridSpec,
    pub show_faint: bool,
    pub faint_alpha: f64,
    pub show_guide: bool,
    pub guide_step_pt: f64,
    pub guide_gap_pt: f64,
    /// Footer title; empty or missing uses [`DEFAULT_TITLE`].
    pub title: Option<String>,
    /// Footer date; missing uses today's local date.
    pub date: Option<String>,
    /// Font file for non-Latin footer text.
    pub font_path: Option<std::path::PathBuf>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            columns: 6,
            margin_mm: 12.0,
            source_mode: SourceMode::Selected,
            grid: GridSpec::print(),
            show_faint: true,
            faint_alpha: DEFAULT_FAINT_ALPHA,
            show_guide: true,
            guide_step_pt: DEFAULT_GUIDE_STEP_PT,
            guide_gap_pt: DEFAULT_GUIDE_GAP_PT,
            title: None,
            date: None,
            font_path: None,
        }
    }
}

impl PdfOptions {
    fn footer_text(&self) -> String {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let date = match &self.date {
            Some(d) => d.clone(),
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };
        format!("{title} • {date}")
    }
}

#[derive(Clone, Debug, Default)]
pub struct PdfRequest {
    pub characters: Vec<String>,
    pub options: PdfOptions,
    /// Raw font file used for the footer when it parses.
    pub font_bytes: Option<Vec<u8>>,
}

impl PdfRequest {
    pub fn new(characters: Vec<String>, options: PdfOptions) -> Self {
        Self {
            characters,
            options,
            font_bytes: None,
        }
    }

    /// Every non-whitespace character of `text`, duplicates kept.
    pub fn from_text(text: &str, options: PdfOptions) -> Self {
        let characters = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect();
        Self::new(characters, options)
    }

    pub fn with_font_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.font_bytes = Some(bytes);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PdfOutput {
    pub document_bytes: Vec<u8>,
    pub page_count: usize,
    pub info: String,
    pub warnings: Vec<String>,
    pub filename: String,
}

/// Result of the per-character variants.
#[derive(Clone, Debug, PartialEq)]
pub struct PdfBundle {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Sheets (combined) or zip entries, in order.
    pub entries: Vec<String>,
    /// Characters without glyph data.
    pub skipped: Vec<String>,
}

/// Validated characters, layout and rasters for one sheet.
struct PreparedSheet {
    plan: PdfLayoutPlan,
    mode: SourceMode,
    /// Index into `faint` (and the unique glyph list) per sequence entry.
    cells: Vec<usize>,
    faint: Vec<PdfImage>,
    guide: Vec<PdfImage>,
    invalid: Vec<String>,
}

impl PreparedSheet {
    fn page_count(&self) -> usize {
        match self.mode {
            SourceMode::Selected => 1,
            SourceMode::Sequence => self.plan.pages_for(self.cells.len()),
        }
    }

    fn info(&self, grid: &GridSpec) -> String {
        let cell = self.plan.cell_size_pt;
        let sub = if grid.subdivide && grid.mode.is_subdividable() {
            " + 4×4 sub-cells"
        } else {
            ""
        };
        format!(
            "{} columns • grid={}{sub} • cell ~{}pt ({}mm) • {} pages",
            self.plan.columns,
            grid.mode.as_str(),
            cell.round(),
            (cell * 0.3528).round(),
            self.page_count()
        )
    }

    fn warnings(&self) -> Vec<String> {
        if self.invalid.is_empty() {
            Vec::new()
        } else {
            vec![format!(
                "Skipped characters without data: {}",
                self.invalid.join(" ")
            )]
        }
    }
}

/// Faint glyph raster size for a cell, capped lower for large character sets.
pub fn faint_raster_px(cell_pt: f64, unique_characters: usize) -> u32 {
    let cap = if unique_characters > 24 { 600.0 } else { 900.0 };
    let base = (cell_pt * 2.4).max(480.0).round().max(360.0);
    base.min(cap) as u32
}

fn prepare_sheet(
    characters: &[String],
    opts: &PdfOptions,
    source: &mut GlyphDataSource,
) -> StudioResult<PreparedSheet> {
    let (page_w, _) = page_box(opts.page_size, opts.orientation);
    cell_size(
        page_w,
        crate::foundation::math::mm_to_pt(opts.margin_mm.max(0.0)),
        opts.columns,
    )?;

    let requested: &[String] = match opts.source_mode {
        SourceMode::Selected => characters.get(..1).unwrap_or(&[]),
        SourceMode::Sequence => characters,
    };

    let mut valid: Vec<Arc<GlyphData>> = Vec::with_capacity(requested.len());
    let mut invalid = Vec::new();
    for ch in requested {
        match source.fetch_glyph(ch) {
            Ok(glyph) => valid.push(glyph),
            Err(StudioError::GlyphNotFound { reason, .. }) => {
                tracing::warn!(character = %ch, %reason, "no glyph data, skipping");
                invalid.push(ch.clone());
            }
            Err(err) => return Err(err),
        }
    }
    let Some(first) = valid.first().cloned() else {
        return Err(StudioError::NoValidCharacters { rejected: invalid });
    };

    let guide_steps = opts.show_guide.then(|| first.stroke_count());
    let plan = PdfLayoutPlan::compute(
        opts.page_size,
        opts.orientation,
        opts.margin_mm,
        opts.columns,
        guide_steps,
        opts.guide_step_pt,
        opts.guide_gap_pt,
    )?;

    let mut unique: Vec<Arc<GlyphData>> = Vec::new();
    let mut cells = Vec::with_capacity(valid.len());
    for glyph in &valid {
        let idx = match unique.iter().position(|u| u.character == glyph.character) {
            Some(i) => i,
            None => {
                unique.push(Arc::clone(glyph));
                unique.len() - 1
            }
        };
        cells.push(idx);
    }

    let faint = if opts.show_faint {
        let px = faint_raster_px(plan.cell_size_pt, unique.len());
        unique
            .par_iter()
            .map(|g| rasterize_glyph(g, px, None, INK).and_then(|f| PdfImage::from_frame(&f)))
            .collect::<StudioResult<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let guide = match plan.guide {
        Some(g) => (0..g.steps)
            .into_par_iter()
            .map(|i| {
                rasterize_glyph(&first, GUIDE_RASTER_PX, Some(i), INK)
                    .and_then(|f| PdfImage::from_frame(&f))
            })
            .collect::<StudioResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    tracing::debug!(
        valid = valid.len(),
        unique = unique.len(),
        invalid = invalid.len(),
        cell_pt = plan.cell_size_pt,
        "worksheet prepared"
    );
    Ok(PreparedSheet {
        plan,
        mode: opts.source_mode,
        cells,
        faint,
        guide,
        invalid,
    })
}

/// One PDF document that sheets are appended to.
struct DocumentBuilder<'a> {
    pdf: Pdf,
    refs: RefAlloc,
    catalog_id: Ref,
    tree_id: Ref,
    pages: Vec<Ref>,
    font_bytes: Option<&'a [u8]>,
    footer_font: Option<(Ref, FooterFont)>,
    faint_gs: Option<Ref>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(font_bytes: Option<&'a [u8]>) -> Self {
        let mut refs = RefAlloc::default();
        let catalog_id = refs.bump();
        let tree_id = refs.bump();
        Self {
            pdf: Pdf::new(),
            refs,
            catalog_id,
            tree_id,
            pages: Vec::new(),
            font_bytes,
            footer_font: None,
            faint_gs: None,
        }
    }

    fn faint_state(&mut self, alpha: f64) -> Ref {
        if let Some(id) = self.faint_gs {
            return id;
        }
        let id = self.refs.bump();
        self.pdf
            .ext_graphics(id)
            .non_stroking_alpha(alpha.clamp(0.0, 1.0) as f32);
        self.faint_gs = Some(id);
        id
    }

    /// Footer font id and the encoded footer bytes.
    fn footer(&mut self, text: &str) -> (Ref, Vec<u8>) {
        let (pdf, refs, font_bytes) = (&mut self.pdf, &mut self.refs, self.font_bytes);
        let (id, font) = self.footer_font.get_or_insert_with(|| {
            let (font, _) = FooterFont::select(font_bytes, text);
            let id = font.write(pdf, refs);
            (id, font)
        });
        (*id, font.encode(text))
    }

    /// Appends the pages of `sheet`; returns how many were added.
    fn add_sheet(&mut self, sheet: &PreparedSheet, opts: &PdfOptions) -> usize {
        let plan = &sheet.plan;
        let cell = plan.cell_size_pt;
        let pages = sheet.page_count();

        let faint_ids: Vec<Ref> = sheet
            .faint
            .iter()
            .map(|img| img.write(&mut self.pdf, &mut self.refs))
            .collect();
        let guide_ids: Vec<Ref> = sheet
            .guide
            .iter()
            .map(|img| img.write(&mut self.pdf, &mut self.refs))
            .collect();
        let gs = (!faint_ids.is_empty()).then(|| self.faint_state(opts.faint_alpha));

        let mut next = 0usize;
        for page in 0..pages {
            let mut canvas = PageCanvas::new();
            let mut xobjects: Vec<(String, Ref)> = Vec::new();

            if page == 0 {
                if let Some(g) = plan.guide {
                    for (i, id) in guide_ids.iter().enumerate() {
                        let name = format!("Step{i}");
                        let (x, y) = g.step_origin(i, plan.page_height, plan.margin_pt);
                        canvas.image(&name, x, y, g.step_pt, g.step_pt, None);
                        xobjects.push((name, *id));
                    }
                }
            }

            let mut used = vec![false; faint_ids.len()];
            for slot in 0..plan.cells_on_page(page) {
                let (x, y) = plan.cell_origin(page, slot);
                canvas.grid_cell(x, y, cell, &opts.grid);
                let glyph = match sheet.mode {
                    SourceMode::Selected => Some(0),
                    SourceMode::Sequence => {
                        next += 1;
                        sheet.cells.get(next - 1).copied()
                    }
                };
                if let Some(i) = glyph.filter(|&i| i < faint_ids.len()) {
                    canvas.image(&format!("Faint{i}"), x, y, cell, cell, Some(FAINT_GS));
                    used[i] = true;
                }
            }
            for (i, id) in faint_ids.iter().enumerate() {
                if used[i] {
                    xobjects.push((format!("Faint{i}"), *id));
                }
            }

            let font = if page + 1 == pages {
                let text = opts.footer_text();
                let (font_id, encoded) = self.footer(&text);
                let (x, y) = plan.footer_origin();
                canvas.text(
                    FOOTER_FONT,
                    FOOTER_SIZE_PT,
                    x,
                    y,
                    Rgba8::from_unit(0.45, 0.47, 0.5, 1.0),
                    &encoded,
                );
                Some(font_id)
            } else {
                None
            };

            self.write_page(plan, canvas, &xobjects, gs, font);
        }
        pages
    }

    fn write_page(
        &mut self,
        plan: &PdfLayoutPlan,
        canvas: PageCanvas,
        xobjects: &[(String, Ref)],
        gs: Option<Ref>,
        font: Option<Ref>,
    ) {
        let page_id = self.refs.bump();
        let content_id = self.refs.bump();

        let mut page = self.pdf.page(page_id);
        page.media_box(Rect::new(
            0.0,
            0.0,
            plan.page_width as f32,
            plan.page_height as f32,
        ));
        page.parent(self.tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        {
            let mut dict = resources.x_objects();
            for (name, id) in xobjects {
                dict.pair(Name(name.as_bytes()), *id);
            }
        }
        if let Some(gs) = gs {
            resources.ext_g_states().pair(Name(FAINT_GS.as_bytes()), gs);
        }
        if let Some(font) = font {
            resources.fonts().pair(Name(FOOTER_FONT.as_bytes()), font);
        }
        resources.finish();
        page.finish();

        let data = canvas.finish();
        self.pdf.stream(content_id, &data).filter(Filter::FlateDecode);
        self.pages.push(page_id);
    }

    fn finish(mut self, title: &str) -> Vec<u8> {
        self.pdf.catalog(self.catalog_id).pages(self.tree_id);
        self.pdf
            .pages(self.tree_id)
            .kids(self.pages.iter().copied())
            .count(self.pages.len() as i32);
        let info_id = self.refs.bump();
        self.pdf
            .document_info(info_id)
            .title(TextStr(title))
            .producer(TextStr("hanzi-studio"));
        self.pdf.finish()
    }
}

fn document_title(opts: &PdfOptions) -> &str {
    opts.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
}

/// Lays out and writes one practice worksheet.
#[tracing::instrument(skip_all, fields(characters = req.characters.len(), mode = ?req.options.source_mode))]
pub fn generate_worksheet(
    req: &PdfRequest,
    source: &mut GlyphDataSource,
) -> StudioResult<PdfOutput> {
    let opts = &req.options;
    let sheet = prepare_sheet(&req.characters, opts, source)?;

    let mut doc = DocumentBuilder::new(req.font_bytes.as_deref());
    let page_count = doc.add_sheet(&sheet, opts);
    let document_bytes = doc.finish(document_title(opts));

    let out = PdfOutput {
        document_bytes,
        page_count,
        info: sheet.info(&opts.grid),
        warnings: sheet.warnings(),
        filename: worksheet_filename(opts.page_size.as_str(), opts.orientation.as_str()),
    };
    tracing::info!(pages = out.page_count, bytes = out.document_bytes.len(), "{}", out.info);
    Ok(out)
}

/// Prepares one `Selected` sheet per character; characters without data land in `skipped`.
fn per_character_sheets(
    req: &PdfRequest,
    source: &mut GlyphDataSource,
) -> StudioResult<(Vec<(usize, PreparedSheet)>, Vec<String>, PdfOptions)> {
    let opts = PdfOptions {
        source_mode: SourceMode::Selected,
        ..req.options.clone()
    };
    let mut sheets = Vec::new();
    let mut skipped = Vec::new();
    for (i, ch) in req.characters.iter().enumerate() {
        match prepare_sheet(std::slice::from_ref(ch), &opts, source) {
            Ok(sheet) => sheets.push((i, sheet)),
            Err(StudioError::NoValidCharacters { .. }) => skipped.push(ch.clone()),
            Err(err) => return Err(err),
        }
    }
    if sheets.is_empty() {
        return Err(StudioError::NoValidCharacters { rejected: skipped });
    }
    Ok((sheets, skipped, opts))
}

/// One single-character sheet per character, all in one document.
#[tracing::instrument(skip_all, fields(characters = req.characters.len()))]
pub fn generate_combined_worksheet(
    req: &PdfRequest,
    source: &mut GlyphDataSource,
) -> StudioResult<PdfBundle> {
    let (sheets, skipped, opts) = per_character_sheets(req, source)?;

    let mut doc = DocumentBuilder::new(req.font_bytes.as_deref());
    let mut entries = Vec::with_capacity(sheets.len());
    for (i, sheet) in &sheets {
        doc.add_sheet(sheet, &opts);
        entries.push(req.characters[*i].clone());
    }
    let bytes = doc.finish(document_title(&opts));
    tracing::info!(sheets = entries.len(), skipped = skipped.len(), "combined worksheet written");

    Ok(PdfBundle {
        bytes,
        filename: combined_worksheet_filename(&entries),
        entries,
        skipped,
    })
}

/// One single-character PDF per character, zipped.
#[tracing::instrument(skip_all, fields(characters = req.characters.len()))]
pub fn generate_worksheet_zip(
    req: &PdfRequest,
    source: &mut GlyphDataSource,
) -> StudioResult<PdfBundle> {
    let (sheets, skipped, opts) = per_character_sheets(req, source)?;
    let width = worksheet_index_width(req.characters.len());

    let mut files = Vec::with_capacity(sheets.len());
    for (i, sheet) in &sheets {
        let ch = &req.characters[*i];
        let mut doc = DocumentBuilder::new(req.font_bytes.as_deref());
        doc.add_sheet(sheet, &opts);
        files.push(ArchiveEntry {
            name: format!(
                "{}_{}.pdf",
                index_prefix(i + 1, width),
                sanitize_file_name(ch, ch)
            ),
            bytes: doc.finish(document_title(&opts)),
        });
    }
    let bytes = build_zip(&files, &mut |_| {})?;
    tracing::info!(entries = files.len(), skipped = skipped.len(), "worksheet zip written");

    Ok(PdfBundle {
        bytes,
        filename: worksheet_zip_name(chrono::Utc::now()),
        entries: files.into_iter().map(|f| f.name).collect(),
        skipped,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/worksheet.rs"]
mod tests;
