//! Rendering adapter: renderer-agnostic submission of world state.
//!
//! # Invariants
//! - Renderers never mutate the world.
//! - Hidden entities are never submitted; the rest go out in insertion order.

mod renderer;

pub use renderer::{
    submit_frame, DebugTextRenderer, RecordedFrame, RecordingRenderer, RenderRecord, Renderer,
};

pub fn crate_info() -> &'static str {
    "arena-render v0.1.0"
}
