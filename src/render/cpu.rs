use crate::assets::glyph::GlyphData;
use crate::foundation::core::{Affine, BezPath, Point, Rgba8};
use crate::foundation::error::{StudioError, StudioResult};
use crate::geometry::grid::{GridPrimitive, GridSpec, Pen, Pens, compute_grid_primitives, dash_segments};
use crate::geometry::transform::glyph_transform;
use crate::render::composite::unpremultiply_in_place;
use crate::render::strokes::{STROKE_MASK_WIDTH, StrokeFrame, reveal_path};
use kurbo::Shape;

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// Tightly packed, row-major.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            premultiplied: true,
        }
    }

    /// Pixel at `(x, y)` as stored.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy, suitable for PNG/GIF encoders.
    pub fn to_straight(&self) -> Self {
        let mut out = self.clone();
        if out.premultiplied {
            unpremultiply_in_place(&mut out.data);
            out.premultiplied = false;
        }
        out
    }

    pub fn to_rgba_image(&self) -> StudioResult<image::RgbaImage> {
        let straight = self.to_straight();
        image::RgbaImage::from_raw(straight.width, straight.height, straight.data)
            .ok_or_else(|| StudioError::render("frame byte length does not match its size"))
    }

    pub fn encode_png(&self) -> StudioResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| StudioError::encode(format!("png encode failed: {e}")))?;
        Ok(out.into_inner())
    }
}

/// A reusable `vello_cpu` render target.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> StudioResult<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::render("surface width/height must be non-zero"));
        }
        let w: u16 = width
            .try_into()
            .map_err(|_| StudioError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StudioError::render("surface height exceeds u16"))?;
        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::new(w, h),
            ctx: None,
        })
    }

    pub fn square(size: u32) -> StudioResult<Self> {
        Self::new(size, size)
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Clears to transparent, runs `f` against a fresh context and rasterizes the result.
    pub fn draw(
        &mut self,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> StudioResult<()>,
    ) -> StudioResult<&[u8]> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        f(&mut ctx)?;
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx = Some(ctx);
        Ok(self.pixmap.data_as_u8_slice())
    }

    /// Premultiplied RGBA8 bytes of the last draw.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_path(x: f64, y: f64, w: f64, h: f64, radius: f64) -> BezPath {
    if radius > 0.0 {
        kurbo::RoundedRect::new(x, y, x + w, y + h, radius).to_path(0.1)
    } else {
        kurbo::Rect::new(x, y, x + w, y + h).to_path(0.1)
    }
}

fn line_path(a: (f64, f64), b: (f64, f64)) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(a);
    p.line_to(b);
    p
}

fn stroke_with_pen(
    ctx: &mut vello_cpu::RenderContext,
    segments: impl IntoIterator<Item = ((f64, f64), (f64, f64))>,
    pen: Pen,
) {
    ctx.set_paint(color_to_cpu(pen.color));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(pen.width));
    for (a, b) in segments {
        match pen.dash {
            Some(dash) => {
                for (da, db) in dash_segments(a, b, dash) {
                    ctx.stroke_path(&bezpath_to_cpu(&line_path(da, db)));
                }
            }
            None => ctx.stroke_path(&bezpath_to_cpu(&line_path(a, b))),
        }
    }
}

/// Paints background and grid for a square of `size` pixels at `origin`.
pub fn paint_grid(
    ctx: &mut vello_cpu::RenderContext,
    size: f64,
    spec: &GridSpec,
    origin: Affine,
) {
    let pens = Pens::screen(size, spec);
    ctx.set_transform(affine_to_cpu(origin));
    for prim in compute_grid_primitives(size, spec) {
        match prim {
            GridPrimitive::Line {
                x1,
                y1,
                x2,
                y2,
                role,
            } => stroke_with_pen(ctx, [((x1, y1), (x2, y2))], pens.pen(role)),
            GridPrimitive::Rect {
                x,
                y,
                w,
                h,
                corner_radius,
                stroke,
                fill,
            } => {
                if fill.is_some() {
                    ctx.set_paint(color_to_cpu(pens.background));
                    ctx.fill_path(&bezpath_to_cpu(&rect_path(x, y, w, h, corner_radius)));
                }
                if let Some(role) = stroke {
                    let pen = pens.pen(role);
                    if pen.dash.is_some() && corner_radius == 0.0 {
                        let (x1, y1) = (x + w, y + h);
                        let edges = [
                            ((x, y), (x1, y)),
                            ((x1, y), (x1, y1)),
                            ((x1, y1), (x, y1)),
                            ((x, y1), (x, y)),
                        ];
                        stroke_with_pen(ctx, edges, pen);
                    } else {
                        ctx.set_paint(color_to_cpu(pen.color));
                        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(pen.width));
                        ctx.stroke_path(&bezpath_to_cpu(&rect_path(
                            x,
                            y,
                            w,
                            h,
                            corner_radius,
                        )));
                    }
                }
            }
        }
    }
}

/// Colors and flags for drawing a glyph state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPaint {
    pub stroke_color: Rgba8,
    pub radical_color: Option<Rgba8>,
    pub outline_color: Rgba8,
    pub show_outline: bool,
}

impl GlyphPaint {
    pub fn solid(color: Rgba8) -> Self {
        Self {
            stroke_color: color,
            radical_color: None,
            outline_color: Rgba8::TRANSPARENT,
            show_outline: false,
        }
    }

    fn color_for(&self, glyph: &GlyphData, stroke: usize) -> Rgba8 {
        match self.radical_color {
            Some(c) if glyph.is_radical(stroke) => c,
            _ => self.stroke_color,
        }
    }
}

/// Paints `glyph` under `transform` with each stroke revealed to `frame.progress[i]`.
pub fn paint_glyph(
    ctx: &mut vello_cpu::RenderContext,
    glyph: &GlyphData,
    transform: Affine,
    paint: &GlyphPaint,
    frame: &StrokeFrame,
) {
    ctx.set_transform(affine_to_cpu(transform));

    if paint.show_outline && paint.outline_color.a > 0 {
        ctx.set_paint(color_to_cpu(paint.outline_color));
        for stroke in &glyph.strokes {
            ctx.fill_path(&bezpath_to_cpu(stroke));
        }
    }

    for (i, stroke) in glyph.strokes.iter().enumerate() {
        let progress = frame.progress(i);
        if progress <= 0.0 {
            continue;
        }
        ctx.set_paint(color_to_cpu(paint.color_for(glyph, i)));
        let outline = bezpath_to_cpu(stroke);
        if progress >= 1.0 {
            ctx.fill_path(&outline);
            continue;
        }
        let Some(median) = glyph.medians.get(i) else {
            continue;
        };
        let reveal = reveal_path(median, progress);
        ctx.push_clip_layer(&outline);
        ctx.set_stroke(
            vello_cpu::kurbo::Stroke::new(STROKE_MASK_WIDTH)
                .with_caps(vello_cpu::kurbo::Cap::Round)
                .with_join(vello_cpu::kurbo::Join::Round),
        );
        ctx.stroke_path(&bezpath_to_cpu(&reveal));
        ctx.pop_layer();
    }
}

/// Rasterizes strokes `0..=upto` (all when `None`) into a transparent `size`² frame at the
/// default glyph placement.
pub fn rasterize_glyph(
    glyph: &GlyphData,
    size: u32,
    upto: Option<usize>,
    color: Rgba8,
) -> StudioResult<FrameRGBA> {
    let mut surface = CpuSurface::square(size)?;
    let frame = match upto {
        Some(i) => StrokeFrame::first_n(glyph.stroke_count(), i + 1),
        None => StrokeFrame::complete(glyph.stroke_count()),
    };
    let transform = glyph_transform(f64::from(size));
    surface.draw(|ctx| {
        paint_glyph(ctx, glyph, transform, &GlyphPaint::solid(color), &frame);
        Ok(())
    })?;
    Ok(surface.to_frame())
}

/// Rasterizes grid plus glyph state in one pass, e.g. for a PNG snapshot.
pub fn render_cell(
    glyph: Option<&GlyphData>,
    size: u32,
    grid: &GridSpec,
    paint: &GlyphPaint,
    frame: &StrokeFrame,
) -> StudioResult<FrameRGBA> {
    let mut surface = CpuSurface::square(size)?;
    let transform = glyph_transform(f64::from(size));
    surface.draw(|ctx| {
        paint_grid(ctx, f64::from(size), grid, Affine::IDENTITY);
        if let Some(glyph) = glyph {
            paint_glyph(ctx, glyph, transform, paint, frame);
        }
        Ok(())
    })?;
    Ok(surface.to_frame())
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
