// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use geo_types::Point;

use crate::distance::point_distance;

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over located node ids, used to find all nodes within a radius of a point
/// without computing the distance to every node of a component.
///
/// This implementation assumes euclidean geometry, even though the distance function
/// used is [earth_distance](crate::earth_distance). This results in undefined behavior when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude).
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: (i64, Point<f64>),
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds all points no further than `radius` meters from `at`,
    /// ordered by increasing distance (ties by id).
    pub fn within(&self, at: Point<f64>, radius: f64) -> Vec<(i64, f64)> {
        let mut found = Vec::default();
        self.within_impl(at, radius, false, &mut found);
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// Like [KDTree::within], but returns at most `limit` closest points.
    pub fn nearest_within(&self, at: Point<f64>, radius: f64, limit: usize) -> Vec<(i64, f64)> {
        let mut found = self.within(at, radius);
        found.truncate(limit);
        found
    }

    fn within_impl(
        &self,
        at: Point<f64>,
        radius: f64,
        lon_divides: bool,
        found: &mut Vec<(i64, f64)>,
    ) {
        let (id, pivot) = self.pivot;
        let dist = point_distance(at, pivot);
        if dist <= radius {
            found.push((id, dist));
        }

        let first_left = if lon_divides {
            at.x() < pivot.x()
        } else {
            at.y() < pivot.y()
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = first {
            branch.within_impl(at, radius, !lon_divides, found);
        }

        if let Some(ref branch) = second {
            // Points in the second branch can only be in range
            // if the splitting axis itself is in range.
            let axis = if lon_divides {
                Point::new(pivot.x(), at.y())
            } else {
                Point::new(at.x(), pivot.y())
            };

            if point_distance(at, axis) <= radius {
                branch.within_impl(at, radius, !lon_divides, found);
            }
        }
    }

    /// Builds a k-d tree from an iterable of (id, point) pairs.
    pub fn from_iter<I: IntoIterator<Item = (i64, Point<f64>)>>(points: I) -> Option<Self> {
        let mut points = points.into_iter().collect::<Vec<_>>();
        Self::build(points.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of (id, point) pairs. Points will be reordered
    /// in the slice to facility building the tree.
    pub fn build(points: &mut [(i64, Point<f64>)]) -> Option<Self> {
        Self::build_impl(points, false)
    }

    fn build_impl(points: &mut [(i64, Point<f64>)], lon_divides: bool) -> Option<Self> {
        match points.len() {
            0 => None,
            1 => Some(Self {
                pivot: points[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    points.sort_by(|a, b| a.1.x().total_cmp(&b.1.x()));
                } else {
                    points.sort_by(|a, b| a.1.y().total_cmp(&b.1.y()));
                }
                let median = points.len() / 2;
                let pivot = points[median];
                let (left, right_and_pivot) = points.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: box_option(Self::build_impl(left, !lon_divides)),
                    right: box_option(Self::build_impl(right, !lon_divides)),
                })
            }
        }
    }
}

#[inline]
fn box_option<T>(o: Option<T>) -> Option<Box<T>> {
    o.map(|thing| Box::new(thing))
}
