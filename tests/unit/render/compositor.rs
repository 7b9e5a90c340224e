use super::*;
use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
use crate::foundation::error::StudioError;

/// Solid premultiplied square; stops the token after `stop_after` layers.
struct CountingSource {
    layer: Vec<u8>,
    served: u64,
    stop_after: u64,
    token: CaptureToken,
    times: Vec<f64>,
}

impl CountingSource {
    fn new(size: u32, rgba: [u8; 4], stop_after: u64, token: CaptureToken) -> Self {
        let layer = rgba
            .iter()
            .copied()
            .cycle()
            .take(size as usize * size as usize * 4)
            .collect();
        Self {
            layer,
            served: 0,
            stop_after,
            token,
            times: Vec::new(),
        }
    }
}

impl LayerSource for CountingSource {
    fn layer_at(&mut self, _idx: FrameIndex, t_ms: f64) -> StudioResult<&[u8]> {
        self.times.push(t_ms);
        self.served += 1;
        if self.served >= self.stop_after {
            self.token.stop();
        }
        Ok(&self.layer)
    }
}

fn plain_grid() -> GridSpec {
    GridSpec {
        corner_radius: 0.0,
        ..GridSpec::default()
    }
}

#[test]
fn compose_draws_layer_over_background() {
    let mut comp = FrameCompositor::new(16, &plain_grid()).unwrap();
    let clear = vec![0u8; 16 * 16 * 4];
    let frame = comp.compose(&clear).unwrap();
    assert_eq!(frame.pixel(8, 8), Some([255, 255, 255, 255]));

    let red = [255u8, 0, 0, 255].repeat(16 * 16);
    let frame = comp.compose(&red).unwrap();
    assert_eq!(frame.pixel(8, 8), Some([255, 0, 0, 255]));

    // the grid layer is restored on the next tick
    let frame = comp.compose(&clear).unwrap();
    assert_eq!(frame.pixel(8, 8), Some([255, 255, 255, 255]));
}

#[test]
fn compose_rejects_wrong_layer_length() {
    let mut comp = FrameCompositor::new(8, &plain_grid()).unwrap();
    assert!(comp.compose(&[0u8; 12]).is_err());
}

#[test]
fn run_delivers_the_tick_that_requested_stop() {
    let fps = Fps::whole(30).unwrap();
    let token = CaptureToken::new();
    let mut source = CountingSource::new(8, [0, 0, 0, 0], 5, token.clone());
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig::square(8, fps, 12000)).unwrap();

    let mut comp = FrameCompositor::new(8, &plain_grid()).unwrap();
    let pushed = comp.run(&token, fps, &mut source, &mut sink).unwrap();

    assert_eq!(pushed, 5);
    assert_eq!(sink.frames().len(), 5);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3, 4]);
    assert!((source.times[3] - 100.0).abs() < 1e-9);
}

#[test]
fn stopped_token_produces_no_frames() {
    let fps = Fps::whole(30).unwrap();
    let token = CaptureToken::new();
    token.stop();
    let mut source = CountingSource::new(8, [0, 0, 0, 0], 1, token.clone());
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig::square(8, fps, 12000)).unwrap();

    let mut comp = FrameCompositor::new(8, &plain_grid()).unwrap();
    assert_eq!(comp.run(&token, fps, &mut source, &mut sink).unwrap(), 0);
    assert!(source.times.is_empty());
}

struct FailingSink;

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> StudioResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> StudioResult<()> {
        Err(StudioError::encode("disk full"))
    }

    fn end(&mut self) -> StudioResult<()> {
        Ok(())
    }
}

#[test]
fn sink_errors_abort_the_loop() {
    let fps = Fps::whole(30).unwrap();
    let token = CaptureToken::new();
    let mut source = CountingSource::new(8, [0, 0, 0, 0], 100, token.clone());
    let mut comp = FrameCompositor::new(8, &plain_grid()).unwrap();
    let err = comp
        .run(&token, fps, &mut source, &mut FailingSink)
        .unwrap_err();
    assert!(matches!(err, StudioError::Encode(_)));
    assert_eq!(source.served, 1);
}
