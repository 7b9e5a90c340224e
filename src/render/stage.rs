use std::sync::Arc;

use crate::assets::glyph::GlyphData;
use crate::assets::source::{GlyphDataSource, normalize_character};
use crate::foundation::error::{StudioError, StudioResult};
use crate::geometry::grid::GridSpec;
use crate::geometry::transform::glyph_transform;
use crate::render::compositor::FrameCompositor;
use crate::render::cpu::{CpuSurface, FrameRGBA, GlyphPaint, paint_glyph};
use crate::render::strokes::{StrokeFrame, StrokeTimeline, WriterStyle};

/// Everything the stage renders from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageParams {
    pub character: String,
    pub size_px: u32,
    pub grid: GridSpec,
    pub style: WriterStyle,
}

impl Default for StageParams {
    fn default() -> Self {
        Self {
            character: "永".to_string(),
            size_px: 420,
            grid: GridSpec::default(),
            style: WriterStyle::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageState {
    Idle,
    Loading,
    Ready,
    Animating,
    Failed(String),
}

/// What a `configure` call had to redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconfigure {
    /// Character changed; glyph data was fetched again.
    Reload,
    /// Size, grid or colors changed; surfaces were rebuilt.
    Redraw,
    /// Only pacing or visibility changed.
    Retime,
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Playback {
    Once,
    Loop,
}

/// Interactive practice cell: one glyph animated over a grid.
pub struct StageRenderer {
    params: Option<StageParams>,
    state: StageState,
    glyph: Option<Arc<GlyphData>>,
    timeline: Option<StrokeTimeline>,
    playback: Option<Playback>,
    clock_ms: f64,
    finished: bool,
    compositor: Option<FrameCompositor>,
    glyph_surface: Option<CpuSurface>,
}

impl Default for StageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRenderer {
    pub fn new() -> Self {
        Self {
            params: None,
            state: StageState::Idle,
            glyph: None,
            timeline: None,
            playback: None,
            clock_ms: 0.0,
            finished: false,
            compositor: None,
            glyph_surface: None,
        }
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    pub fn params(&self) -> Option<&StageParams> {
        self.params.as_ref()
    }

    pub fn glyph(&self) -> Option<&Arc<GlyphData>> {
        self.glyph.as_ref()
    }

    /// Length of one animation run, when a glyph is loaded.
    pub fn animation_ms(&self) -> Option<f64> {
        self.timeline.as_ref().map(StrokeTimeline::total_ms)
    }

    /// Applies `params`, redoing only what changed.
    ///
    /// Glyph lookup failures leave the stage in [`StageState::Failed`] rather than returning an
    /// error; invalid sizes are errors.
    #[tracing::instrument(skip(self, params, source), fields(character = %params.character))]
    pub fn configure(
        &mut self,
        mut params: StageParams,
        source: &mut GlyphDataSource,
    ) -> StudioResult<Reconfigure> {
        params.style = params.style.sanitized();
        if params.size_px == 0 {
            return Err(StudioError::validation("stage size must be non-zero"));
        }

        let change = match &self.params {
            None => Reconfigure::Reload,
            Some(_) if matches!(self.state, StageState::Failed(_)) => Reconfigure::Reload,
            Some(old) if !same_character(&old.character, &params.character) => {
                Reconfigure::Reload
            }
            Some(old)
                if old.size_px != params.size_px
                    || old.grid != params.grid
                    || !old.style.same_look(&params.style) =>
            {
                Reconfigure::Redraw
            }
            Some(old) if old.style != params.style => Reconfigure::Retime,
            Some(_) => return Ok(Reconfigure::Unchanged),
        };

        self.playback = None;
        self.clock_ms = 0.0;
        self.finished = false;

        let rebuild = match &self.params {
            None => true,
            Some(old) => old.size_px != params.size_px || old.grid != params.grid,
        };
        if rebuild {
            self.compositor = Some(FrameCompositor::new(params.size_px, &params.grid)?);
            self.glyph_surface = Some(CpuSurface::square(params.size_px)?);
        }

        if change == Reconfigure::Reload {
            self.state = StageState::Loading;
            self.glyph = None;
            match source.fetch_glyph(&params.character) {
                Ok(glyph) => {
                    self.glyph = Some(glyph);
                    self.state = StageState::Ready;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stage glyph unavailable");
                    self.state = StageState::Failed(err.to_string());
                }
            }
        } else if self.state == StageState::Animating {
            self.state = StageState::Ready;
        }

        self.timeline = self.glyph.as_deref().map(|g| {
            StrokeTimeline::new(g, params.style.speed, params.style.delay_between_strokes_ms)
        });
        self.params = Some(params);
        tracing::debug!(?change, "stage configured");
        Ok(change)
    }

    /// Plays the stroke animation once from hidden strokes.
    pub fn animate(&mut self) -> StudioResult<()> {
        self.start(Playback::Once)
    }

    /// Plays the animation repeatedly with `delay_between_loops_ms` between runs.
    pub fn loop_animation(&mut self) -> StudioResult<()> {
        self.start(Playback::Loop)
    }

    fn start(&mut self, playback: Playback) -> StudioResult<()> {
        if self.timeline.is_none() {
            return Err(StudioError::validation("stage has no glyph to animate"));
        }
        self.playback = Some(playback);
        self.clock_ms = 0.0;
        self.finished = false;
        self.state = StageState::Animating;
        Ok(())
    }

    /// Stops any running animation and returns to the rest pose.
    pub fn stop(&mut self) {
        if self.playback.take().is_some() {
            self.state = StageState::Ready;
        }
        self.clock_ms = 0.0;
    }

    /// Moves the animation clock forward.
    pub fn advance(&mut self, dt_ms: f64) {
        let (Some(playback), Some(timeline)) = (self.playback, self.timeline.as_ref()) else {
            return;
        };
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.clock_ms += dt_ms;
        }
        if playback == Playback::Once && self.clock_ms >= timeline.total_ms() {
            self.playback = None;
            self.finished = true;
            self.state = StageState::Ready;
        }
    }

    /// Stroke progress shown right now.
    pub fn stroke_frame(&self) -> StrokeFrame {
        let Some(timeline) = self.timeline.as_ref() else {
            return StrokeFrame::hidden(0);
        };
        let strokes = timeline.segments().len();
        match self.playback {
            Some(Playback::Once) => timeline.frame_at(self.clock_ms),
            Some(Playback::Loop) => {
                let loop_delay = self
                    .params
                    .as_ref()
                    .map_or(0.0, |p| p.style.delay_between_loops_ms);
                let cycle = timeline.total_ms() + loop_delay;
                let t = if cycle > 0.0 {
                    self.clock_ms % cycle
                } else {
                    0.0
                };
                timeline.frame_at(t)
            }
            None => {
                let show = self.finished
                    || self.params.as_ref().is_some_and(|p| p.style.show_character);
                if show {
                    StrokeFrame::complete(strokes)
                } else {
                    StrokeFrame::hidden(strokes)
                }
            }
        }
    }

    /// Current frame: grid layer plus glyph layer.
    ///
    /// Without glyph data the frame shows the empty cell.
    pub fn render_frame(&mut self) -> StudioResult<FrameRGBA> {
        let frame = self.stroke_frame();
        let (Some(params), Some(compositor), Some(surface)) = (
            self.params.as_ref(),
            self.compositor.as_mut(),
            self.glyph_surface.as_mut(),
        ) else {
            return Err(StudioError::validation("stage is not configured"));
        };

        let size = f64::from(params.size_px);
        let paint = GlyphPaint {
            stroke_color: params.style.stroke_color,
            radical_color: Some(params.style.radical_color),
            outline_color: params.style.outline_color,
            show_outline: params.style.show_outline,
        };
        let glyph = self.glyph.as_deref();
        let layer = surface.draw(|ctx| {
            if let Some(glyph) = glyph {
                paint_glyph(ctx, glyph, glyph_transform(size), &paint, &frame);
            }
            Ok(())
        })?;
        Ok(compositor.compose(layer)?.clone())
    }
}

fn same_character(a: &str, b: &str) -> bool {
    match (normalize_character(a), normalize_character(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/stage.rs"]
mod tests;
