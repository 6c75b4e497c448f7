//! Graph container APIs used by `stratify`.
//!
//! Baseline: `@dagrejs/graphlib` (see `docs/adr/0012-stratify-parity-and-testing.md`).

mod graph;

pub use graph::alg;
pub use graph::{EdgeKey, Graph, GraphOptions};
