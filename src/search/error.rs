// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in [bfs_any_path](crate::search::bfs_any_path)
/// before the search gives up and returns its best partial path.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// An edge exists in the graph, but doesn't carry a label, so its cost is unknown.
    ///
    /// This can only happen if the graph was built incorrectly, and any distances
    /// computed on such a graph would be wrong.
    MissingLabel(i64, i64),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLabel(from, to) => write!(f, "edge {} -> {} has no label", from, to),
        }
    }
}

impl std::error::Error for SearchError {}
