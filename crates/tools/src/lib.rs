//! Developer tooling: world inspector summaries.
//!
//! # Invariants
//! - Inspection is read-only.

mod inspector;

pub use inspector::{EntityInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "arena-tools v0.1.0"
}
