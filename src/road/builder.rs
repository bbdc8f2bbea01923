// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::Entry;

use log::{debug, warn};

use super::{filter, Relation, Road, Way, WayFilter, WayRow};
use crate::{parse_point, Node, Segment};

/// Helper object used for storing state related to converting [WayRows](WayRow)
/// into the graph of a [Road].
pub(super) struct RoadBuilder<'a> {
    road: &'a mut Road,
    filter: &'a WayFilter<'a>,
    added: usize,
    skipped: usize,
    duplicates: usize,
}

impl<'a> RoadBuilder<'a> {
    pub(super) fn new(road: &'a mut Road, filter: &'a WayFilter<'a>) -> Self {
        Self {
            road,
            filter,
            added: 0,
            skipped: 0,
            duplicates: 0,
        }
    }

    /// Add all rows from the provided iterator. Consecutive rows with the same
    /// way id and relation sequence id make up a single way.
    pub(super) fn add_rows<I, E>(&mut self, rows: I) -> Result<(), E>
    where
        I: IntoIterator<Item = Result<WayRow, E>>,
    {
        let mut run: Vec<WayRow> = Vec::default();

        for row in rows {
            let row = row?;
            if let Some(last) = run.last() {
                if last.way_id != row.way_id
                    || last.relation_sequence_id != row.relation_sequence_id
                {
                    self.add_way(std::mem::take(&mut run));
                }
            }
            run.push(row);
        }

        if !run.is_empty() {
            self.add_way(run);
        }

        debug!(
            "added {} ways ({} skipped by the {} filter, {} duplicated)",
            self.added, self.skipped, self.filter.name, self.duplicates,
        );
        Ok(())
    }

    fn add_way(&mut self, run: Vec<WayRow>) {
        let Some(first) = run.first() else {
            return;
        };

        if let Some(relation_id) = first.relation_id {
            self.add_relation(relation_id);
        }

        if self.road.ways.contains_key(&first.way_id) {
            warn!(
                "way {} is a member more than once (relation sequence {}), skipping",
                first.way_id, first.relation_sequence_id,
            );
            self.duplicates += 1;
            return;
        }

        if let Some(reason) = self.filter.skip_reason(&first.way_tags) {
            debug!("skipping way {}: {}", first.way_id, reason);
            self.skipped += 1;
            return;
        }

        if run.len() < 2 {
            warn!("way {} has a single node", first.way_id);
        }

        run.iter().for_each(|row| self.add_node(row));
        let segments = self.create_segments(&run, filter::is_oneway(&first.way_tags));

        self.road.ways.insert(
            first.way_id,
            Way {
                id: first.way_id,
                role: first.member_role.clone(),
                tags: first.way_tags.clone(),
                last_update: first.way_last_update.clone(),
                segments,
                in_relation: first.relation_id.is_some(),
                relation_id: first.relation_id,
            },
        );
        self.added += 1;
    }

    fn add_relation(&mut self, id: i64) {
        let relation = Relation {
            id,
            ..Default::default()
        };

        if self.road.relation.is_none() {
            self.road.set_relation(relation);
        } else {
            self.road.add_other_relation(relation);
        }
    }

    /// Creates a [Node] on its first occurrence. Tags and geometry of subsequent
    /// occurrences are ignored.
    fn add_node(&mut self, row: &WayRow) {
        if let Entry::Vacant(e) = self.road.nodes.entry(row.node_id) {
            let location = row.node_geom.as_deref().and_then(|geom| {
                let location = parse_point(geom);
                if location.is_none() {
                    warn!("node {} has unsupported geometry {:?}", row.node_id, geom);
                }
                location
            });

            e.insert(Node {
                id: row.node_id,
                tags: row.node_tags.clone(),
                location,
            });
        }

        self.road.graph.add_vertex(row.node_id);
    }

    fn create_segments(&mut self, run: &[WayRow], oneway: bool) -> Vec<Segment> {
        run.windows(2)
            .map(|pair| {
                let segment = Segment {
                    way_id: pair[0].way_id,
                    from: pair[0].node_id,
                    to: pair[1].node_id,
                    length: pair[0].node_dist_to_next,
                };

                if segment.length.is_none() {
                    warn!(
                        "way {}: unknown distance between nodes {} and {}",
                        segment.way_id, segment.from, segment.to,
                    );
                }

                self.road.graph.add_edge(segment.from, segment.to, segment);
                if !oneway {
                    self.road.graph.add_edge(segment.to, segment.from, segment);
                }

                segment
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{tags, way_rows};
    use super::super::{DEFAULT_FILTER, LEGACY_FILTER};
    use super::*;

    #[test]
    fn bidirectional_way() {
        let road = Road::from_rows(
            way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 100.0),
            &DEFAULT_FILTER,
        );

        let g = road.graph();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 4);
        assert!(g.has_edge(1, 2) && g.has_edge(2, 1));
        assert!(g.has_edge(2, 3) && g.has_edge(3, 2));
        assert_eq!(g.label(3, 2).map(|s| s.length), Some(Some(100.0)));

        let way = road.way(1).unwrap();
        assert_eq!(way.segments.len(), 2);
        assert_eq!(way.node_ids(), vec![1, 2, 3]);
        assert!(way.in_relation);
    }

    #[test]
    fn oneway_way() {
        let road = Road::from_rows(
            way_rows(1, 0, tags(&[("highway", "primary"), ("oneway", "yes")]), &[1, 2, 3], 100.0),
            &DEFAULT_FILTER,
        );

        let g = road.graph();
        assert_eq!(g.edge_count(), 2);
        assert!(g.has_edge(1, 2) && !g.has_edge(2, 1));
        assert!(g.has_edge(2, 3) && !g.has_edge(3, 2));
    }

    #[test]
    fn roundabout() {
        let road = Road::from_rows(
            way_rows(
                1,
                0,
                tags(&[("highway", "primary"), ("junction", "roundabout")]),
                &[1, 2, 3, 1],
                10.0,
            ),
            &DEFAULT_FILTER,
        );

        let g = road.graph();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 3);
        assert!(g.has_edge(3, 1) && !g.has_edge(1, 3));
    }

    #[test]
    fn skipped_ways() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "proposed")]), &[1, 2], 10.0);
        rows.extend(way_rows(2, 0, tags(&[("railway", "rail")]), &[3, 4], 10.0));
        rows.extend(way_rows(3, 0, tags(&[("route", "ferry")]), &[5, 6], 10.0));
        rows.extend(way_rows(4, 0, tags(&[("highway", "construction")]), &[7, 8], 10.0));

        let road = Road::from_rows(rows.clone(), &DEFAULT_FILTER);
        assert!(road.way(1).is_none());
        assert!(road.way(2).is_none());
        assert!(road.way(3).is_some());
        assert!(road.way(4).is_some());
        assert!(road.node(1).is_none());
        assert!(!road.graph().contains_vertex(1));
        assert_eq!(road.graph().len(), 4);

        let road = Road::from_rows(rows, &LEGACY_FILTER);
        assert!(road.way(3).is_some());
        assert!(road.way(4).is_none());
        assert_eq!(road.graph().len(), 2);
    }

    #[test]
    fn duplicated_way() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2], 10.0);
        rows.extend(way_rows(1, 1, tags(&[("highway", "primary")]), &[1, 2], 99.0));

        let road = Road::from_rows(rows, &DEFAULT_FILTER);
        assert_eq!(road.ways().count(), 1);
        assert_eq!(road.way(1).unwrap().length(), 10.0);
    }

    #[test]
    fn single_node_way() {
        let road = Road::from_rows(
            way_rows(1, 0, tags(&[("highway", "primary")]), &[1], 10.0),
            &DEFAULT_FILTER,
        );

        let way = road.way(1).unwrap();
        assert!(way.segments.is_empty());
        assert!(road.node(1).is_some());
        assert_eq!(road.graph().len(), 1);
        assert_eq!(road.graph().edge_count(), 0);
    }

    #[test]
    fn node_attributes_from_first_occurrence() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2], 10.0);
        rows.extend(way_rows(2, 0, tags(&[("highway", "primary")]), &[2, 3], 10.0));
        rows[0].node_geom = Some("POINT(21 52)".to_string());
        rows[1].node_tags = tags(&[("highway", "traffic_signals")]);
        rows[2].node_tags = tags(&[("highway", "stop")]);
        rows[3].node_geom = Some("not a point".to_string());

        let road = Road::from_rows(rows, &DEFAULT_FILTER);
        let n1 = road.node(1).unwrap();
        assert_eq!(n1.location.map(|p| (p.x(), p.y())), Some((21.0, 52.0)));

        let n2 = road.node(2).unwrap();
        assert_eq!(n2.tags.get("highway").map(|v| v.as_str()), Some("traffic_signals"));

        assert!(road.node(3).unwrap().location.is_none());
    }

    #[test]
    fn missing_distance() {
        let mut rows = way_rows(1, 0, tags(&[("highway", "primary")]), &[1, 2, 3], 10.0);
        rows[0].node_dist_to_next = None;

        let road = Road::from_rows(rows, &DEFAULT_FILTER);
        let way = road.way(1).unwrap();
        assert_eq!(way.segments[0].length, None);
        assert_eq!(way.length(), 10.0);
    }

    #[test]
    fn row_errors() {
        let mut road = Road::default();
        let rows: Vec<Result<WayRow, &str>> = vec![
            Ok(way_rows(1, 0, tags(&[("highway", "primary")]), &[1], 1.0).remove(0)),
            Err("broken row"),
        ];
        assert_eq!(road.try_add_rows(rows, &DEFAULT_FILTER), Err("broken row"));
    }
}
