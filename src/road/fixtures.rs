// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Helpers for building test input.

use super::WayRow;
use crate::Tags;

pub(crate) fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Creates rows of a single way over the given nodes, with all segments of equal length.
pub(crate) fn way_rows(
    way_id: i64,
    relation_sequence_id: i64,
    way_tags: Tags,
    nodes: &[i64],
    segment_length: f64,
) -> Vec<WayRow> {
    nodes
        .iter()
        .enumerate()
        .map(|(idx, &node_id)| WayRow {
            relation_sequence_id,
            relation_id: Some(100),
            way_id,
            member_role: String::default(),
            way_tags: way_tags.clone(),
            way_last_update: None,
            node_id,
            node_tags: Tags::default(),
            node_geom: None,
            node_dist_to_next: if idx + 1 < nodes.len() {
                Some(segment_length)
            } else {
                None
            },
        })
        .collect()
}

/// Like [way_rows], but also places node `n` on the equator, at `POINT(n * step 0)`.
pub(crate) fn located_way_rows(
    way_id: i64,
    way_tags: Tags,
    nodes: &[i64],
    segment_length: f64,
    step: f64,
) -> Vec<WayRow> {
    let mut rows = way_rows(way_id, 0, way_tags, nodes, segment_length);
    for row in rows.iter_mut() {
        row.node_geom = Some(format!("POINT({} 0)", row.node_id as f64 * step));
    }
    rows
}
