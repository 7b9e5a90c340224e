use crate::foundation::error::{StudioError, StudioResult};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref, Str};
use skrifa::instance::{LocationRef, Size};
use skrifa::raw::types::Tag;
use skrifa::{FontRef, MetadataProvider};
use std::collections::BTreeMap;

use super::page::{RefAlloc, deflate};

const BASE_FONT: &[u8] = b"HanziStudioFooter";

/// `true` when `text` has anything outside 7-bit ASCII.
pub fn has_non_ascii(text: &str) -> bool {
    !text.is_ascii()
}

/// Keeps printable ASCII only.
pub fn ascii_only(text: &str) -> String {
    text.chars().filter(|c| (' '..='~').contains(c)).collect()
}

/// The font a footer is set in, together with the text it can actually show.
#[derive(Debug)]
pub enum FooterFont {
    /// Standard 14 Helvetica, WinAnsi encoded.
    Helvetica,
    Embedded(EmbeddedFont),
}

impl FooterFont {
    /// Picks the embedded font when `font_bytes` parse, else Helvetica.
    ///
    /// Returns the font and the text to draw with it: Helvetica drops non-ASCII characters.
    pub fn select(font_bytes: Option<&[u8]>, text: &str) -> (Self, String) {
        if let Some(bytes) = font_bytes {
            match EmbeddedFont::parse(bytes, text) {
                Ok(font) => return (Self::Embedded(font), text.to_string()),
                Err(err) => tracing::warn!(error = %err, "footer font rejected, using Helvetica"),
            }
        }
        let shown = if has_non_ascii(text) {
            ascii_only(text)
        } else {
            text.to_string()
        };
        (Self::Helvetica, shown)
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Bytes for a `Tj` operand.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Helvetica => ascii_only(text).into_bytes(),
            Self::Embedded(font) => font.encode(text),
        }
    }

    /// Writes the font objects; returns the id of the font dictionary.
    pub fn write(&self, pdf: &mut Pdf, refs: &mut RefAlloc) -> Ref {
        match self {
            Self::Helvetica => {
                let id = refs.bump();
                pdf.type1_font(id)
                    .base_font(Name(b"Helvetica"))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                id
            }
            Self::Embedded(font) => font.write(pdf, refs),
        }
    }
}

/// A whole TrueType/OpenType font embedded as a CID font with Identity-H encoding.
#[derive(Debug)]
pub struct EmbeddedFont {
    data: Vec<u8>,
    cff: bool,
    units_per_em: f32,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    bbox: [f32; 4],
    /// Characters of the footer that the font maps, with glyph id and advance (1/1000 em).
    glyphs: BTreeMap<char, (u16, f32)>,
}

impl EmbeddedFont {
    /// Parses `bytes` (first face of a collection) and resolves the glyphs `text` needs.
    pub fn parse(bytes: &[u8], text: &str) -> StudioResult<Self> {
        let font = FontRef::from_index(bytes, 0)
            .map_err(|e| StudioError::render(format!("font parse failed: {e}")))?;
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let upem = f32::from(metrics.units_per_em.max(1));
        let scale = 1000.0 / upem;
        let advances = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let charmap = font.charmap();

        let mut glyphs = BTreeMap::new();
        for ch in text.chars() {
            if glyphs.contains_key(&ch) {
                continue;
            }
            let Some(gid) = charmap.map(ch) else {
                tracing::debug!(%ch, "footer font has no glyph");
                continue;
            };
            let Ok(gid16) = u16::try_from(gid.to_u32()) else {
                continue;
            };
            let advance = advances.advance_width(gid).unwrap_or(0.0) * scale;
            glyphs.insert(ch, (gid16, advance));
        }
        if glyphs.is_empty() && !text.trim().is_empty() {
            return Err(StudioError::render("font covers none of the footer text"));
        }

        let bbox = metrics
            .bounds
            .map(|b| [b.x_min * scale, b.y_min * scale, b.x_max * scale, b.y_max * scale])
            .unwrap_or([0.0, metrics.descent * scale, 1000.0, metrics.ascent * scale]);

        Ok(Self {
            data: bytes.to_vec(),
            cff: font.table_data(Tag::new(b"CFF ")).is_some(),
            units_per_em: upem,
            ascent: metrics.ascent * scale,
            descent: metrics.descent * scale,
            cap_height: metrics.cap_height.map_or(metrics.ascent * scale, |c| c * scale),
            bbox,
            glyphs,
        })
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    /// Big-endian glyph ids; characters the font lacks are dropped.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .filter_map(|c| self.glyphs.get(&c))
            .flat_map(|(gid, _)| gid.to_be_bytes())
            .collect()
    }

    fn write(&self, pdf: &mut Pdf, refs: &mut RefAlloc) -> Ref {
        let type0_id = refs.bump();
        let cid_id = refs.bump();
        let descriptor_id = refs.bump();
        let file_id = refs.bump();
        let cmap_id = refs.bump();
        let system_info = SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        };

        pdf.type0_font(type0_id)
            .base_font(Name(BASE_FONT))
            .encoding_predefined(Name(b"Identity-H"))
            .descendant_font(cid_id)
            .to_unicode(cmap_id);

        let mut cid = pdf.cid_font(cid_id);
        cid.subtype(if self.cff {
            CidFontType::Type0
        } else {
            CidFontType::Type2
        });
        cid.base_font(Name(BASE_FONT));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_id);
        cid.default_width(0.0);
        if !self.cff {
            cid.cid_to_gid_map_predefined(Name(b"Identity"));
        }
        let mut widths = cid.widths();
        let mut by_gid: Vec<(u16, f32)> = self.glyphs.values().copied().collect();
        by_gid.sort_by_key(|(gid, _)| *gid);
        by_gid.dedup_by_key(|(gid, _)| *gid);
        for (gid, advance) in by_gid {
            widths.consecutive(gid, [advance]);
        }
        widths.finish();
        cid.finish();

        let [x0, y0, x1, y1] = self.bbox;
        let mut descriptor = pdf.font_descriptor(descriptor_id);
        descriptor
            .name(Name(BASE_FONT))
            .flags(FontFlags::SYMBOLIC)
            .bbox(Rect::new(x0, y0, x1, y1))
            .italic_angle(0.0)
            .ascent(self.ascent)
            .descent(self.descent)
            .cap_height(self.cap_height)
            .stem_v(80.0);
        if self.cff {
            descriptor.font_file3(file_id);
        } else {
            descriptor.font_file2(file_id);
        }
        descriptor.finish();

        let compressed = deflate(&self.data);
        let mut file = pdf.stream(file_id, &compressed);
        file.filter(Filter::FlateDecode);
        if self.cff {
            file.pair(Name(b"Subtype"), Name(b"OpenType"));
        } else {
            file.pair(Name(b"Length1"), self.data.len() as i32);
        }
        file.finish();

        let mut cmap = UnicodeCmap::new(Name(b"Custom"), system_info);
        for (ch, (gid, _)) in &self.glyphs {
            cmap.pair(*gid, *ch);
        }
        pdf.cmap(cmap_id, &cmap.finish());

        type0_id
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/font.rs"]
mod tests;
