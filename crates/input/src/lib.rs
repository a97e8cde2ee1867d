//! Steering input: the four recognized keys and a per-frame snapshot of which
//! are held.
//!
//! # Invariants
//! - Only Forward, Back, Left and Right are recognized; every other key is ignored.
//! - Frame logic reads an immutable snapshot; key events never mutate it mid-frame.

pub mod key;

pub use key::{InputState, Key, SharedInput};

pub fn crate_info() -> &'static str {
    "arena-input v0.1.0"
}
