/// Practice-grid primitives shared by raster, SVG and PDF output.
pub mod grid;
/// Glyph placement inside a cell.
pub mod transform;
