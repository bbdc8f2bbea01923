// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use geo_types::Point;
use postgis::ewkb::{self, EwkbRead};
use wkt::TryFromWkt;

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().asin()
}

/// Great-circle distance between two (lon, lat) points, in meters.
pub fn point_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    earth_distance(a.y(), a.x(), b.y(), b.x())
}

/// Parses a point with lon-lat coordinates, given either as WKT (or PostGIS EWKT,
/// with a `SRID=...;` prefix), or as hex-encoded WKB/EWKB - the default text output
/// of PostGIS geometry columns.
///
/// Returns `None` for anything which isn't a valid point.
pub fn parse_point(text: &str) -> Option<Point<f64>> {
    let text = text.trim();
    parse_wkt_point(text).or_else(|| parse_hex_ewkb_point(text))
}

fn parse_wkt_point(text: &str) -> Option<Point<f64>> {
    let text = match text.split_once(';') {
        Some((srid, rest)) if srid.to_ascii_uppercase().starts_with("SRID=") => rest,
        _ => text,
    };
    Point::<f64>::try_from_wkt_str(text).ok()
}

fn parse_hex_ewkb_point(text: &str) -> Option<Point<f64>> {
    let data = decode_hex(text)?;
    match ewkb::GeometryT::<ewkb::Point>::read_ewkb(&mut data.as_slice()).ok()? {
        ewkb::GeometryT::Point(p) => Some(Point::new(p.x, p.y)),
        _ => None,
    }
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || text.len() % 2 != 0 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
