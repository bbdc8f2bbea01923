// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use roadaudit::{rows, LogicalComponent, Road};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct RoadLoadError(PathBuf, #[source] rows::Error);

#[derive(Parser)]
struct Cli {
    /// The path to the way-node rows dump (.tsv, .tsv.gz or .tsv.bz2)
    rows_file: PathBuf,

    /// Also skip ways under construction and ways with access=no
    #[arg(long)]
    legacy_filter: bool,

    /// Expected number of logical components of the road
    #[arg(long)]
    components: Option<u32>,
}

pub fn main() -> Result<ExitCode, Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let mut road = load_road(&cli.rows_file, cli.legacy_filter)?;
    if let Some(n) = cli.components {
        road.set_correct_num_comps(n);
    }
    road.calculate(&roadaudit::Options::default())?;

    let summary = road.summary();
    println!("{}", summary);

    for (idx, c) in road.components().iter().enumerate() {
        println!("  #{} {}", idx + 1, describe(c));
    }

    for path in road.failed_paths() {
        println!(
            "  no path {} -> {}, stuck at {} after {:.3} km",
            path.from,
            path.to,
            path.nodes.last().copied().unwrap_or(path.from),
            path.length() / 1000.0,
        );
    }

    if summary.is_navigable() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn describe(c: &LogicalComponent) -> String {
    let kind = match c {
        LogicalComponent::Sisters(_) => "dual carriageway",
        LogicalComponent::Single(s) if s.is_oneway() => "oneway",
        LogicalComponent::Single(_) => "two-way",
    };

    let ways: Vec<String> = c.way_ids().iter().map(|id| id.to_string()).collect();

    let state = match (c.found_beginning_and_end(), c.length()) {
        (_, Some(length)) => format!("length {:.3} km", length / 1000.0),
        (true, None) => format!("not navigable, ~{:.3} km", c.approx_length() / 1000.0),
        (false, None) => format!("no beginning or end, ~{:.3} km", c.approx_length() / 1000.0),
    };

    format!("{} (ways {}): {}", kind, ways.join(", "), state)
}

fn load_road<P: AsRef<Path>>(path: P, legacy_filter: bool) -> Result<Road, RoadLoadError> {
    let filter = if legacy_filter {
        &roadaudit::LEGACY_FILTER
    } else {
        &roadaudit::DEFAULT_FILTER
    };

    match rows::read_rows_from_file(path.as_ref(), rows::FileFormat::Unknown) {
        Ok(rows) => Ok(Road::from_rows(rows, filter)),
        Err(e) => Err(RoadLoadError(PathBuf::from(path.as_ref()), e)),
    }
}
