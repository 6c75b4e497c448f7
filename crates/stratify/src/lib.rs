//! Hierarchical (Sugiyama-style) directed graph layout.
//!
//! `stratify` assigns `(x, y)` coordinates and edge control points to a directed graph so it can
//! be drawn as a layered diagram: nodes sink to discrete ranks, edges that span more than one
//! rank are split into chains of dummy nodes, layers are reordered to reduce crossings, and
//! within-layer positions are tightened with the Brandes & Köpf algorithm. This crate implements
//! the layout math only; it does not render, parse, or serialize diagrams.
//!
//! The entry point is [`layout`], which mutates a [`graphlib::Graph`] in place, populating each
//! node's `x`/`y` and each edge's `points` (plus an optional label position).

pub use stratify_graph as graphlib;

mod model;

pub mod acyclic;
pub mod add_border_segments;
pub mod coordinate_system;
pub mod error;
pub mod greedy_fas;
pub mod nesting_graph;
pub mod normalize;
pub mod order;
pub mod parent_dummy_chains;
mod pipeline;
pub mod position;
pub mod rank;
pub mod self_edges;
pub mod util;

pub use error::{LayoutError, Result};
pub use model::{EdgeLabel, GraphLabel, LabelPos, NodeLabel, Point, RankDir, SelfEdge};
pub use pipeline::layout;

/// The crate's own version, re-exported so embedders can report it without depending on Cargo
/// metadata directly.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
