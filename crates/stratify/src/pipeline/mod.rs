//! Dagre layout pipelines.
//!
//! We keep the crate-level API as `stratify::layout(...)`, so this module is intentionally not
//! named `layout` to avoid a Rust item-name conflict.

mod compound;
mod dagreish;

pub use dagreish::layout_dagreish as layout;
