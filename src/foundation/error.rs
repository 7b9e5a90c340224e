pub type StudioResult<T> = Result<T, StudioError>;

/// Error taxonomy shared by every pipeline in the crate.
///
/// Low-level failures (I/O, HTTP, ffmpeg, PDF writing) are translated into one of these variants
/// at the pipeline boundary, carrying the offending character or parameters.
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    #[error("no glyph data for '{character}': {reason}")]
    GlyphNotFound { character: String, reason: String },

    #[error("no capture surface for '{character}': {detail}")]
    NoCaptureSurface { character: String, detail: String },

    #[error("encoder unsupported ({requested}): {detail}")]
    EncoderUnsupported { requested: String, detail: String },

    #[error(
        "cell too small: {cell_pt}pt with {columns} columns (minimum {min_pt}pt); reduce columns or margins"
    )]
    CellTooSmall {
        cell_pt: f64,
        min_pt: f64,
        columns: u32,
    },

    #[error(
        "not enough space for grid: {available_pt:.1}pt available, one row needs {cell_pt}pt; reduce columns or margins"
    )]
    NotEnoughSpaceForGrid { available_pt: f64, cell_pt: f64 },

    #[error("no valid characters (rejected: {})", rejected.join(" "))]
    NoValidCharacters { rejected: Vec<String> },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    pub fn glyph_not_found(character: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GlyphNotFound {
            character: character.into(),
            reason: reason.into(),
        }
    }

    pub fn no_capture_surface(character: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NoCaptureSurface {
            character: character.into(),
            detail: detail.into(),
        }
    }

    pub fn encoder_unsupported(requested: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EncoderUnsupported {
            requested: requested.into(),
            detail: detail.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for failures that only concern one character and leave batch work usable.
    pub fn is_per_character(&self) -> bool {
        matches!(
            self,
            Self::GlyphNotFound { .. }
                | Self::NoCaptureSurface { .. }
                | Self::EncoderUnsupported { .. }
                | Self::Encode(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
