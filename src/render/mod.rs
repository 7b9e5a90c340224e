//! CPU rendering: surfaces, stroke animation, the interactive stage and the capture compositor.

pub mod composite;
/// Grid + glyph-layer compositing for capture.
pub mod compositor;
/// `vello_cpu` surface adapter.
pub mod cpu;
/// Interactive stage state machine.
pub mod stage;
/// Stroke-order animation engine.
pub mod strokes;
/// SVG surface adapter.
pub mod svg;
