//! GTFS feed loading.
//!
//! Only the two tables the graph needs are read: `stops.txt` and
//! `stop_times.txt`. Column order is taken from the header row, so extra
//! columns and any ordering are accepted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{Coord, Stop, StopId, StopTimeRecord, TripId};

/// Errors loading feed tables.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{table} is missing required column {column:?}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// The tables of a feed needed to build a graph.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub stops: Vec<Stop>,
    pub stop_times: Vec<StopTimeRecord>,
}

impl Feed {
    /// Load `stops.txt` and `stop_times.txt` from a feed directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let dir = dir.as_ref();
        Ok(Self {
            stops: load_stops(dir.join("stops.txt"))?,
            stop_times: load_stop_times(dir.join("stop_times.txt"))?,
        })
    }
}

/// Load stops from a `stops.txt` file.
pub fn load_stops(path: impl AsRef<Path>) -> Result<Vec<Stop>, FeedError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading stops");
    read_stops(open(path)?)
}

/// Load stop times from a `stop_times.txt` file.
pub fn load_stop_times(path: impl AsRef<Path>) -> Result<Vec<StopTimeRecord>, FeedError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading stop times");
    read_stop_times(open(path)?)
}

/// Read stops from CSV.
///
/// Rows with an empty `stop_id` are skipped. Rows whose coordinates are
/// missing or invalid become stops without a location.
pub fn read_stops<R: Read>(reader: R) -> Result<Vec<Stop>, FeedError> {
    const TABLE: &str = "stops.txt";

    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();

    let idx_id = required(&headers, TABLE, "stop_id")?;
    let idx_lat = required(&headers, TABLE, "stop_lat")?;
    let idx_lon = required(&headers, TABLE, "stop_lon")?;
    let idx_name = headers.iter().position(|h| h == "stop_name");

    let mut stops = Vec::new();
    let mut skipped = 0usize;
    let mut unlocated = 0usize;
    for result in rdr.records() {
        let record = result?;
        let Ok(id) = StopId::parse(record.get(idx_id).unwrap_or("")) else {
            skipped += 1;
            continue;
        };
        let name = idx_name
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let lat = record.get(idx_lat).and_then(|s| s.parse::<f64>().ok());
        let lon = record.get(idx_lon).and_then(|s| s.parse::<f64>().ok());
        match lat.zip(lon).and_then(|(lat, lon)| Coord::checked(lat, lon)) {
            Some(location) => stops.push(Stop::new(id, name, location)),
            None => {
                unlocated += 1;
                stops.push(Stop::unlocated(id, name));
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped stops.txt records with empty stop_id");
    }
    if unlocated > 0 {
        warn!(unlocated, "stops.txt records with missing or invalid coordinates");
    }
    info!(stops = stops.len(), "Parsed stops");
    Ok(stops)
}

/// Read stop times from CSV.
///
/// Rows with an empty `trip_id` or `stop_id`, or a `stop_sequence` that is
/// not an unsigned integer, are skipped. Times are kept as raw strings.
pub fn read_stop_times<R: Read>(reader: R) -> Result<Vec<StopTimeRecord>, FeedError> {
    const TABLE: &str = "stop_times.txt";

    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();

    let idx_trip = required(&headers, TABLE, "trip_id")?;
    let idx_stop = required(&headers, TABLE, "stop_id")?;
    let idx_seq = required(&headers, TABLE, "stop_sequence")?;
    let idx_arr = required(&headers, TABLE, "arrival_time")?;
    let idx_dep = required(&headers, TABLE, "departure_time")?;

    let mut records = Vec::new();
    let mut missing_id = 0usize;
    let mut bad_sequence = 0usize;
    for result in rdr.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let (Ok(trip_id), Ok(stop_id)) =
            (TripId::parse(field(idx_trip)), StopId::parse(field(idx_stop)))
        else {
            missing_id += 1;
            continue;
        };
        let Ok(sequence) = field(idx_seq).parse::<u32>() else {
            bad_sequence += 1;
            continue;
        };

        records.push(StopTimeRecord::new(
            trip_id,
            stop_id,
            sequence,
            field(idx_arr),
            field(idx_dep),
        ));
    }

    if missing_id > 0 {
        warn!(
            skipped = missing_id,
            "Skipped stop_times.txt records with empty trip_id or stop_id"
        );
    }
    if bad_sequence > 0 {
        warn!(
            skipped = bad_sequence,
            "Skipped stop_times.txt records with invalid stop_sequence"
        );
    }
    info!(stop_times = records.len(), "Parsed stop times");
    Ok(records)
}

fn open(path: &Path) -> Result<File, FeedError> {
    File::open(path).map_err(|source| FeedError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn required(
    headers: &csv::StringRecord,
    table: &'static str,
    column: &'static str,
) -> Result<usize, FeedError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
        .ok_or(FeedError::MissingColumn { table, column })
}
