use crate::foundation::core::Rgba8;
use crate::foundation::error::{StudioError, StudioResult};
use crate::geometry::grid::{GridPrimitive, GridSpec, Pen, Pens, compute_grid_primitives};
use crate::render::cpu::FrameRGBA;
use kurbo::{PathEl, Shape};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Ref, Str};

/// Hands out consecutive indirect object ids.
#[derive(Debug)]
pub struct RefAlloc {
    next: i32,
}

impl Default for RefAlloc {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RefAlloc {
    pub fn bump(&mut self) -> Ref {
        let r = Ref::new(self.next);
        self.next += 1;
        r
    }
}

/// Zlib-compressed stream payload for `/FlateDecode`.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
}

/// An RGB image with a separate soft mask, both Flate-compressed.
#[derive(Clone, Debug)]
pub struct PdfImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Vec<u8>,
}

impl PdfImage {
    pub fn from_frame(frame: &FrameRGBA) -> StudioResult<Self> {
        let px = frame.width as usize * frame.height as usize;
        if frame.data.len() != px * 4 {
            return Err(StudioError::render("frame byte length does not match its size"));
        }
        let straight = frame.to_straight();
        let mut rgb = Vec::with_capacity(px * 3);
        let mut alpha = Vec::with_capacity(px);
        for p in straight.data.chunks_exact(4) {
            rgb.extend_from_slice(&p[..3]);
            alpha.push(p[3]);
        }
        Ok(Self {
            width: frame.width,
            height: frame.height,
            rgb: deflate(&rgb),
            alpha: deflate(&alpha),
        })
    }

    /// Writes the image and its mask; returns the image id.
    pub fn write(&self, pdf: &mut Pdf, refs: &mut RefAlloc) -> Ref {
        let image_id = refs.bump();
        let mask_id = refs.bump();

        let mut image = pdf.image_xobject(image_id, &self.rgb);
        image.filter(Filter::FlateDecode);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.s_mask(mask_id);
        image.finish();

        let mut mask = pdf.image_xobject(mask_id, &self.alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(self.width as i32);
        mask.height(self.height as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask.finish();

        image_id
    }
}

/// Content stream of one page, addressed in PDF space (origin bottom-left, Y up).
pub struct PageCanvas {
    content: Content,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            content: Content::new(),
        }
    }

    /// Draws the grid of a `size`-point cell whose bottom-left corner is `(x, y)`.
    pub fn grid_cell(&mut self, x: f64, y: f64, size: f64, spec: &GridSpec) {
        let pens = Pens::print(size, spec);
        // cell space is Y-down from the top-left corner
        let map = |px: f64, py: f64| ((x + px) as f32, (y + size - py) as f32);

        for prim in compute_grid_primitives(size, spec) {
            match prim {
                GridPrimitive::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    role,
                } => {
                    let (ax, ay) = map(x1, y1);
                    let (bx, by) = map(x2, y2);
                    self.content.save_state();
                    self.apply_pen(pens.pen(role));
                    self.content.move_to(ax, ay);
                    self.content.line_to(bx, by);
                    self.content.stroke();
                    self.content.restore_state();
                }
                GridPrimitive::Rect {
                    x: rx,
                    y: ry,
                    w,
                    h,
                    corner_radius,
                    stroke,
                    fill,
                } => {
                    let shape = kurbo::RoundedRect::new(rx, ry, rx + w, ry + h, corner_radius);
                    if fill.is_some() {
                        self.content.save_state();
                        self.set_fill(pens.background);
                        self.path(&shape, &map);
                        self.content.fill_nonzero();
                        self.content.restore_state();
                    }
                    if let Some(role) = stroke {
                        self.content.save_state();
                        self.apply_pen(pens.pen(role));
                        self.path(&shape, &map);
                        self.content.stroke();
                        self.content.restore_state();
                    }
                }
            }
        }
    }

    /// Paints image XObject `name` into the box `(x, y, w, h)`, optionally under graphics state `gs`.
    pub fn image(&mut self, name: &str, x: f64, y: f64, w: f64, h: f64, gs: Option<&str>) {
        self.content.save_state();
        if let Some(gs) = gs {
            self.content.set_parameters(Name(gs.as_bytes()));
        }
        self.content
            .transform([w as f32, 0.0, 0.0, h as f32, x as f32, y as f32]);
        self.content.x_object(Name(name.as_bytes()));
        self.content.restore_state();
    }

    /// Shows pre-encoded `text` with font resource `font` at baseline `(x, y)`.
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, color: Rgba8, text: &[u8]) {
        self.content.save_state();
        self.set_fill(color);
        self.content.begin_text();
        self.content.set_font(Name(font.as_bytes()), size as f32);
        self.content.next_line(x as f32, y as f32);
        self.content.show(Str(text));
        self.content.end_text();
        self.content.restore_state();
    }

    /// Compressed content bytes.
    pub fn finish(self) -> Vec<u8> {
        let raw = self.content.finish();
        deflate(&raw)
    }

    fn set_fill(&mut self, color: Rgba8) {
        let [r, g, b, _] = color.to_unit();
        self.content.set_fill_rgb(r, g, b);
    }

    fn apply_pen(&mut self, pen: Pen) {
        let [r, g, b, _] = pen.color.to_unit();
        self.content.set_stroke_rgb(r, g, b);
        self.content.set_line_width(pen.width as f32);
        if let Some([on, off]) = pen.dash {
            self.content.set_dash_pattern([on as f32, off as f32], 0.0);
        }
    }

    fn path(&mut self, shape: &impl Shape, map: &impl Fn(f64, f64) -> (f32, f32)) {
        let mut last = (0.0f32, 0.0f32);
        for el in shape.path_elements(0.1) {
            match el {
                PathEl::MoveTo(p) => {
                    last = map(p.x, p.y);
                    self.content.move_to(last.0, last.1);
                }
                PathEl::LineTo(p) => {
                    last = map(p.x, p.y);
                    self.content.line_to(last.0, last.1);
                }
                PathEl::QuadTo(c, p) => {
                    let (cx, cy) = map(c.x, c.y);
                    let end = map(p.x, p.y);
                    // degree elevation
                    let c1 = (last.0 + 2.0 / 3.0 * (cx - last.0), last.1 + 2.0 / 3.0 * (cy - last.1));
                    let c2 = (end.0 + 2.0 / 3.0 * (cx - end.0), end.1 + 2.0 / 3.0 * (cy - end.1));
                    self.content.cubic_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
                    last = end;
                }
                PathEl::CurveTo(a, b, p) => {
                    let (ax, ay) = map(a.x, a.y);
                    let (bx, by) = map(b.x, b.y);
                    last = map(p.x, p.y);
                    self.content.cubic_to(ax, ay, bx, by, last.0, last.1);
                }
                PathEl::ClosePath => {
                    self.content.close_path();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/page.rs"]
mod tests;
