// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Reading of [WayRows](WayRow) from tab-separated dumps.
//!
//! A dump has a header line and (in any order) the columns `relation_sequence_id`,
//! `relation_id`, `way_id`, `member_role`, `way_tags`, `way_last_update`, `node_id`,
//! `node_tags`, `node_geom` and `node_dist_to_next`. Only `way_id` and `node_id` are required.
//!
//! Values use the text format of PostgreSQL's `COPY`: backslash escapes
//! (`\\`, `\t`, `\n`, `\r`) are decoded, and `\N` (as well as an empty cell) means NULL.
//! Tags are written as [hstore](hstore) values.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::str::FromStr;

use crate::road::WayRow;
use crate::Tags;

pub mod hstore;

/// Format of the input dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed tab-separated values
    Tsv,

    /// Force tab-separated values with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    TsvGz,

    /// Force tab-separated values with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    TsvBz2,
}

impl FileFormat {
    /// Guesses the format based on the extension of a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::TsvGz,
            Some("bz2") => Self::TsvBz2,
            Some("tsv") | Some("txt") => Self::Tsv,
            _ => Self::Unknown,
        }
    }

    /// Guesses the format based on the first bytes of the content.
    fn detect<R: BufRead>(r: &mut R) -> io::Result<Self> {
        let head = r.fill_buf()?;
        if head.starts_with(&[0x1f, 0x8b]) {
            Ok(Self::TsvGz)
        } else if head.starts_with(b"BZh") {
            Ok(Self::TsvBz2)
        } else {
            Ok(Self::Tsv)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid {column}: {value:?}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: invalid {column}: {source}")]
    InvalidTags {
        line: u64,
        column: &'static str,
        source: hstore::ParseError,
    },
}

/// Positions of known columns in a record.
#[derive(Debug, Clone, Copy)]
struct Columns {
    relation_sequence_id: Option<usize>,
    relation_id: Option<usize>,
    way_id: usize,
    member_role: Option<usize>,
    way_tags: Option<usize>,
    way_last_update: Option<usize>,
    node_id: usize,
    node_tags: Option<usize>,
    node_geom: Option<usize>,
    node_dist_to_next: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, Error> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &'static str| find(name).ok_or(Error::MissingColumn(name));

        Ok(Self {
            relation_sequence_id: find("relation_sequence_id"),
            relation_id: find("relation_id"),
            way_id: require("way_id")?,
            member_role: find("member_role"),
            way_tags: find("way_tags"),
            way_last_update: find("way_last_update"),
            node_id: require("node_id")?,
            node_tags: find("node_tags"),
            node_geom: find("node_geom"),
            node_dist_to_next: find("node_dist_to_next"),
        })
    }
}

/// Streams [WayRows](WayRow) from a tab-separated dump.
pub struct Reader<R: io::Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Columns,
}

impl<R: io::Read> Reader<R> {
    /// Creates a reader over uncompressed data, reading the header line immediately.
    pub fn from_io(reader: R) -> Result<Self, Error> {
        let mut r = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .has_headers(true)
            .from_reader(reader);
        let columns = Columns::from_headers(r.headers()?)?;

        Ok(Self {
            records: r.into_records(),
            columns,
        })
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<WayRow, Error> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let c = &self.columns;

        Ok(WayRow {
            relation_sequence_id: parse_value::<i64>(
                line,
                "relation_sequence_id",
                field(record, c.relation_sequence_id),
            )?
            .unwrap_or_default(),
            relation_id: parse_value(line, "relation_id", field(record, c.relation_id))?,
            way_id: parse_required(line, "way_id", field(record, Some(c.way_id)))?,
            member_role: field(record, c.member_role)
                .map(Cow::into_owned)
                .unwrap_or_default(),
            way_tags: parse_tags(line, "way_tags", field(record, c.way_tags))?,
            way_last_update: field(record, c.way_last_update).map(Cow::into_owned),
            node_id: parse_required(line, "node_id", field(record, Some(c.node_id)))?,
            node_tags: parse_tags(line, "node_tags", field(record, c.node_tags))?,
            node_geom: field(record, c.node_geom).map(Cow::into_owned),
            node_dist_to_next: parse_value(
                line,
                "node_dist_to_next",
                field(record, c.node_dist_to_next),
            )?,
        })
    }
}

impl<R: io::Read> Iterator for Reader<R> {
    type Item = Result<WayRow, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.parse_record(&record))
    }
}

/// Returns the decoded value of a cell, or `None` if the cell is absent or NULL.
fn field(record: &csv::StringRecord, idx: Option<usize>) -> Option<Cow<'_, str>> {
    let raw = record.get(idx?)?;
    if raw.is_empty() || raw == "\\N" {
        None
    } else {
        Some(unescape(raw))
    }
}

fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut s = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            s.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => s.push('\t'),
            Some('n') => s.push('\n'),
            Some('r') => s.push('\r'),
            Some(other) => s.push(other),
            None => s.push('\\'),
        }
    }
    Cow::Owned(s)
}

fn parse_value<T: FromStr>(
    line: u64,
    column: &'static str,
    value: Option<Cow<'_, str>>,
) -> Result<Option<T>, Error> {
    match value {
        None => Ok(None),
        Some(v) => v.trim().parse().map(Some).map_err(|_| Error::InvalidValue {
            line,
            column,
            value: v.into_owned(),
        }),
    }
}

fn parse_required<T: FromStr>(
    line: u64,
    column: &'static str,
    value: Option<Cow<'_, str>>,
) -> Result<T, Error> {
    parse_value(line, column, value)?.ok_or_else(|| Error::InvalidValue {
        line,
        column,
        value: String::default(),
    })
}

fn parse_tags(
    line: u64,
    column: &'static str,
    value: Option<Cow<'_, str>>,
) -> Result<Tags, Error> {
    match value {
        None => Ok(Tags::default()),
        Some(v) => hstore::parse(&v).map_err(|source| Error::InvalidTags {
            line,
            column,
            source,
        }),
    }
}

/// Reads all [WayRows](WayRow) from a stream in the provided format.
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_rows_from_io<R: io::Read>(
    reader: R,
    format: FileFormat,
) -> Result<Vec<WayRow>, Error> {
    let mut b = io::BufReader::new(reader);
    let format = match format {
        FileFormat::Unknown => FileFormat::detect(&mut b)?,
        f => f,
    };

    match format {
        FileFormat::Unknown | FileFormat::Tsv => Reader::from_io(b)?.collect(),

        FileFormat::TsvGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            Reader::from_io(d)?.collect()
        }

        FileFormat::TsvBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            Reader::from_io(d)?.collect()
        }
    }
}

/// Reads all [WayRows](WayRow) from a file at the provided path. [FileFormat::Unknown]
/// is first resolved with [FileFormat::from_path], and then by looking at the content.
pub fn read_rows_from_file<P: AsRef<Path>>(
    path: P,
    format: FileFormat,
) -> Result<Vec<WayRow>, Error> {
    let format = match format {
        FileFormat::Unknown => FileFormat::from_path(&path),
        f => f,
    };
    let f = File::open(path)?;
    read_rows_from_io(f, format)
}

/// Reads all [WayRows](WayRow) from a static buffer.
pub fn read_rows_from_buffer(data: &[u8], format: FileFormat) -> Result<Vec<WayRow>, Error> {
    if format == FileFormat::Tsv {
        // In-memory data needs no extra buffering
        Reader::from_io(data)?.collect()
    } else {
        read_rows_from_io(io::Cursor::new(data), format)
    }
}
