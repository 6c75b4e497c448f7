//! Graph container APIs used by `stratify`.
//!
//! Baseline: `@dagrejs/graphlib` (see `docs/adr/0012-stratify-parity-and-testing.md`).
//!
//! This module contains the core `Graph` container plus a small set of helper algorithms
//! re-exported as `stratify_graph::alg` for Dagre compatibility.

mod adj_cache;
pub mod alg;
mod core;
mod edge_key;
mod entries;
mod options;

pub use core::Graph;
pub use edge_key::EdgeKey;
pub use options::GraphOptions;
