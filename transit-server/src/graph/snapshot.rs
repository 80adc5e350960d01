//! Binary graph snapshots.
//!
//! Layout (little-endian):
//!
//! ```text
//! [0..4]   magic "TDGR"
//! [4..8]   format version (u32)
//! [8..12]  xxHash32 of the payload (u32)
//! [12..]   bitcode-encoded payload
//! ```
//!
//! The stop id lookup is not stored; it is rebuilt from the stop table on load.

use std::path::Path;

use bitcode::{Decode, Encode};
use tracing::{debug, info};
use xxhash_rust::xxh32::xxh32;

use crate::domain::{Stop, TripId};

use super::{Edge, TransitGraph};

/// Magic bytes at the start of every snapshot.
pub const MAGIC: [u8; 4] = *b"TDGR";

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_SIZE: usize = 12;
const XXHASH_SEED: u32 = 0;

/// Errors reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a graph snapshot (bad magic bytes)")]
    BadMagic,

    #[error("snapshot is truncated ({0} bytes)")]
    Truncated(usize),

    #[error("unsupported snapshot version {found} (expected {FORMAT_VERSION})")]
    UnsupportedVersion { found: u32 },

    #[error("snapshot checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("failed to decode snapshot payload: {0}")]
    Decode(String),

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(&'static str),
}

#[derive(Encode, Decode)]
struct Payload {
    stops: Vec<Stop>,
    trips: Vec<TripId>,
    adjacency: Vec<Vec<Edge>>,
}

/// Serialize a graph to bytes.
pub fn to_bytes(graph: &TransitGraph) -> Vec<u8> {
    encode(&Payload {
        stops: graph.stops.clone(),
        trips: graph.trips.clone(),
        adjacency: graph.adjacency.clone(),
    })
}

fn encode(payload: &Payload) -> Vec<u8> {
    let data = bitcode::encode(payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + data.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&xxh32(&data, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&data);
    out
}

/// Deserialize a graph, checking the header and payload checksum.
pub fn from_bytes(bytes: &[u8]) -> Result<TransitGraph, SnapshotError> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SnapshotError::Truncated(bytes.len()));
    }

    let version = read_u32(&bytes[4..8]);
    if version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: version });
    }

    let expected = read_u32(&bytes[8..12]);
    let data = &bytes[HEADER_SIZE..];
    let actual = xxh32(data, XXHASH_SEED);
    if expected != actual {
        return Err(SnapshotError::ChecksumMismatch { expected, actual });
    }

    let payload: Payload =
        bitcode::decode(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    validate(&payload)?;

    Ok(TransitGraph::from_parts(
        payload.stops,
        payload.trips,
        payload.adjacency,
    ))
}

/// Write a snapshot to `path`.
pub fn save(graph: &TransitGraph, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    let bytes = to_bytes(graph);
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Saved graph snapshot"
    );
    Ok(())
}

/// Read a snapshot from `path`.
pub fn load(path: impl AsRef<Path>) -> Result<TransitGraph, SnapshotError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read graph snapshot");
    let graph = from_bytes(&bytes)?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        trips = graph.trip_count(),
        "Loaded graph snapshot"
    );
    Ok(graph)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Reject payloads whose indices point outside their tables or whose
/// timetables are not searchable.
fn validate(payload: &Payload) -> Result<(), SnapshotError> {
    if payload.adjacency.len() != payload.stops.len() {
        return Err(SnapshotError::Inconsistent(
            "adjacency does not match stop count",
        ));
    }
    let nodes = payload.stops.len();
    let trips = payload.trips.len();
    for edge in payload.adjacency.iter().flatten() {
        if edge.to.idx() >= nodes {
            return Err(SnapshotError::Inconsistent("edge target out of range"));
        }
        if let Some(schedule) = edge.kind.schedule() {
            schedule.check().map_err(SnapshotError::Inconsistent)?;
            if schedule.events().iter().any(|e| e.trip.0 as usize >= trips) {
                return Err(SnapshotError::Inconsistent("trip index out of range"));
            }
        }
    }
    Ok(())
}
