//! Error taxonomy for the layout pipeline.

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("node {id:?} has non-finite or negative size ({width}x{height})")]
    InvalidNodeSize {
        id: String,
        width: f64,
        height: f64,
    },

    #[error("edge {v:?} -> {w:?} has minlen {minlen}, which must be a positive integer")]
    InvalidEdgeMinlen { v: String, w: String, minlen: i64 },

    #[error("node_rank_factor must be a positive integer, got {0}")]
    InvalidNodeRankFactor(usize),

    #[error(
        "cannot compute a rectangle intersection for a point coincident with the rectangle center ({x}, {y})"
    )]
    DegenerateIntersection { x: f64, y: f64 },

    #[error("graph contains a cycle through {v:?} -> {w:?}")]
    CyclicAfterAcyclicization { v: String, w: String },

    #[error("network simplex did not converge within {iterations} iterations")]
    RankingDidNotConverge { iterations: usize },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}
