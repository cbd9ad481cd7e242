//! Constants shared by the model decoder and the attribution code.

/// Child index marking a leaf in the decoded `left_children` array.
pub const LEAF_CHILD_SENTINEL: i64 = -1;

/// Slack added to a tree's maximum depth when sizing the path buffer.
/// The path ledger needs `(max_depth + 2) * (max_depth + 3) / 2` slots.
pub const PATH_DEPTH_SLACK: usize = 2;

/// Default absolute tolerance for the optional additivity check.
pub const DEFAULT_ADDITIVITY_TOLERANCE: f32 = 1e-4;

/// Number of path elements required for a tree of the given depth.
pub fn path_buffer_len(max_depth: usize) -> usize {
    let depth = max_depth + PATH_DEPTH_SLACK;
    depth * (depth + 1) / 2
}
