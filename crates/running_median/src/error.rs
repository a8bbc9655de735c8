use thiserror::Error;

/// A broken structural invariant, reported by [`MedianTree::validate`].
///
/// Every variant indicates a defect in the balancing code rather than a
/// recoverable condition. `node` is the arena slot where the check failed.
///
/// [`MedianTree::validate`]: crate::MedianTree::validate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("element count {count} does not match root size {size}")]
    CountMismatch { count: usize, size: usize },
    #[error("{live} live arena slots but {reachable} nodes reachable from the root")]
    LeakedNodes { live: usize, reachable: usize },
    #[error("node {node}: parent link points to {found:?}, expected {expected:?}")]
    BrokenParentLink {
        node: usize,
        expected: Option<usize>,
        found: Option<usize>,
    },
    #[error("node {node}: cached height {cached}, actual {actual}")]
    StaleHeight { node: usize, cached: i32, actual: i32 },
    #[error("node {node}: cached size {cached}, actual {actual}")]
    StaleSize { node: usize, cached: u32, actual: u32 },
    #[error("node {node}: child heights {left} and {right} differ by more than one")]
    HeightImbalance { node: usize, left: i32, right: i32 },
    #[error("node {node}: child sizes {left} and {right} differ by more than one")]
    WeightImbalance { node: usize, left: u32, right: u32 },
    #[error("node {node}: {side} subtree is out of order")]
    OrderViolation { node: usize, side: &'static str },
}
