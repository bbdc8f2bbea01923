// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Tags;

/// Describes which ways of a road relation are added to the road graph.
///
/// Which ways should be skipped has changed over time - ways under construction
/// used to be ignored, but are now kept so that a road closed for repairs still
/// shows up as disconnected. Both policies are available as constants:
/// [DEFAULT_FILTER] and [LEGACY_FILTER].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WayFilter<'a> {
    /// Human readable name of the policy, used only for logging.
    pub name: &'a str,

    /// Values of the `highway` tag which exclude a way from the graph.
    pub skipped_highways: &'a [&'a str],

    /// Skip ways tagged with `access=no`.
    pub skip_no_access: bool,

    /// Keep ways without a `highway` tag if they are ferry routes (`route=ferry`).
    pub allow_ferries: bool,
}

/// Current policy: only proposed roads and non-road ways (other than ferries) are skipped.
pub const DEFAULT_FILTER: WayFilter<'static> = WayFilter {
    name: "default",
    skipped_highways: &["proposed"],
    skip_no_access: false,
    allow_ferries: true,
};

/// Historical policy: additionally skips roads under construction and roads with `access=no`.
pub const LEGACY_FILTER: WayFilter<'static> = WayFilter {
    name: "legacy",
    skipped_highways: &["proposed", "construction"],
    skip_no_access: true,
    allow_ferries: true,
};

/// Reason why a [WayFilter] rejected a way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAHighway,
    SkippedHighway(String),
    NoAccess,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAHighway => write!(f, "not a highway"),
            Self::SkippedHighway(value) => write!(f, "highway={}", value),
            Self::NoAccess => write!(f, "access=no"),
        }
    }
}

impl<'a> WayFilter<'a> {
    /// Returns the reason why a way with given tags should be skipped,
    /// or `None` if the way should be added to the graph.
    pub fn skip_reason(&self, tags: &Tags) -> Option<SkipReason> {
        match tags.get("highway").map(|v| v.as_str()) {
            None => {
                if self.allow_ferries && is_ferry(tags) {
                    None
                } else {
                    Some(SkipReason::NotAHighway)
                }
            }

            Some(highway) if self.skipped_highways.contains(&highway) => {
                Some(SkipReason::SkippedHighway(highway.to_string()))
            }

            Some(_) => {
                if self.skip_no_access && tags.get("access").map(|v| v.as_str()) == Some("no") {
                    Some(SkipReason::NoAccess)
                } else {
                    None
                }
            }
        }
    }

    /// Checks if a way with given tags should be added to the graph.
    pub fn is_allowed(&self, tags: &Tags) -> bool {
        self.skip_reason(tags).is_none()
    }
}

/// Checks if the tags describe a ferry route.
pub fn is_ferry(tags: &Tags) -> bool {
    tags.get("route").map(|v| v.as_str()) == Some("ferry")
}

/// Checks if the tags describe a one-way road: explicit `oneway=yes|true|1` (case-insensitive)
/// or a roundabout.
pub fn is_oneway(tags: &Tags) -> bool {
    let oneway = tags
        .get("oneway")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "yes" | "true" | "1"))
        .unwrap_or(false);
    let roundabout = tags.get("junction").map(|v| v.as_str()) == Some("roundabout");
    oneway || roundabout
}

/// Checks if the tags describe a road under construction.
pub fn is_construction(tags: &Tags) -> bool {
    tags.get("highway").map(|v| v.as_str()) == Some("construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {} => { Tags::default() };
        {$( $k:literal : $v:literal ),+} => {
            Tags::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    #[test]
    fn default_filter() {
        assert!(DEFAULT_FILTER.is_allowed(&tags! {"highway": "primary"}));
        assert!(DEFAULT_FILTER.is_allowed(&tags! {"highway": "construction"}));
        assert!(DEFAULT_FILTER.is_allowed(&tags! {"highway": "primary", "access": "no"}));
        assert!(DEFAULT_FILTER.is_allowed(&tags! {"route": "ferry"}));
        assert_eq!(
            DEFAULT_FILTER.skip_reason(&tags! {"highway": "proposed"}),
            Some(SkipReason::SkippedHighway("proposed".to_string())),
        );
        assert_eq!(
            DEFAULT_FILTER.skip_reason(&tags! {"railway": "rail"}),
            Some(SkipReason::NotAHighway),
        );
        assert_eq!(DEFAULT_FILTER.skip_reason(&tags! {}), Some(SkipReason::NotAHighway));
    }

    #[test]
    fn legacy_filter() {
        assert!(LEGACY_FILTER.is_allowed(&tags! {"highway": "primary"}));
        assert!(!LEGACY_FILTER.is_allowed(&tags! {"highway": "construction"}));
        assert!(!LEGACY_FILTER.is_allowed(&tags! {"highway": "proposed"}));
        assert_eq!(
            LEGACY_FILTER.skip_reason(&tags! {"highway": "primary", "access": "no"}),
            Some(SkipReason::NoAccess),
        );
        assert!(LEGACY_FILTER.is_allowed(&tags! {"highway": "primary", "access": "destination"}));
    }

    #[test]
    fn without_ferries() {
        let filter = WayFilter {
            name: "no ferries",
            allow_ferries: false,
            ..DEFAULT_FILTER
        };
        assert_eq!(
            filter.skip_reason(&tags! {"route": "ferry"}),
            Some(SkipReason::NotAHighway),
        );
    }

    #[test]
    fn oneway() {
        assert!(is_oneway(&tags! {"oneway": "yes"}));
        assert!(is_oneway(&tags! {"oneway": "YES"}));
        assert!(is_oneway(&tags! {"oneway": "True"}));
        assert!(is_oneway(&tags! {"oneway": "1"}));
        assert!(is_oneway(&tags! {"junction": "roundabout"}));
        assert!(!is_oneway(&tags! {"oneway": "no"}));
        assert!(!is_oneway(&tags! {"oneway": "-1"}));
        assert!(!is_oneway(&tags! {"junction": "circular"}));
        assert!(!is_oneway(&tags! {}));
    }

    #[test]
    fn construction_and_ferry() {
        assert!(is_construction(&tags! {"highway": "construction"}));
        assert!(!is_construction(&tags! {"highway": "primary", "construction": "yes"}));
        assert!(is_ferry(&tags! {"route": "ferry"}));
        assert!(!is_ferry(&tags! {"highway": "primary"}));
    }
}
