/// Color parsing for configuration files.
pub mod color;
/// Glyph stroke data model.
pub mod glyph;
/// Cached, tiered glyph lookup.
pub mod source;
