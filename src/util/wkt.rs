//! Well-Known Text encoding for site polygons.
//!
//! DESIGN
//! ======
//! The backend takes a single outer ring as `POLYGON((lng lat, ...))` with the
//! first vertex repeated at the end. Two sources feed it:
//!
//! - manual entry: `(lat, lng)` text rows typed by the user. Rows that do not
//!   parse are dropped, at least three must survive, and the ring is closed
//!   here.
//! - drawn geometry: a GeoJSON-style ring of `[lng, lat]` pairs that a drawing
//!   tool already closed. It is closed only if it is not closed yet.
//!
//! Coordinates print with `f64`'s shortest round-trip form, so `10.0` is
//! written as `10`.

#[cfg(test)]
#[path = "wkt_test.rs"]
mod wkt_test;

/// Minimum distinct vertices of a polygon ring.
pub const MIN_VERTICES: usize = 3;

/// One vertex in WKT axis order (x = longitude, y = latitude).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Parse one manual-entry row. `None` when either field is not a finite
    /// number.
    #[must_use]
    pub fn from_row(lat: &str, lng: &str) -> Option<Self> {
        let lat = parse_number(lat)?;
        let lng = parse_number(lng)?;
        Some(Self { lng, lat })
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WktError {
    #[error("a polygon needs at least {MIN_VERTICES} valid coordinates, got {0}")]
    TooFewVertices(usize),
    #[error("coordinate {index} is not a finite number")]
    NonFinite { index: usize },
}

/// A manual coordinate row as typed, latitude first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualRow {
    pub lat: String,
    pub lng: String,
}

impl ManualRow {
    #[must_use]
    pub fn new(lat: impl Into<String>, lng: impl Into<String>) -> Self {
        Self { lat: lat.into(), lng: lng.into() }
    }
}

/// Keep the rows that parse, in order.
#[must_use]
pub fn valid_coordinates(rows: &[ManualRow]) -> Vec<Coordinate> {
    rows.iter()
        .filter_map(|row| Coordinate::from_row(&row.lat, &row.lng))
        .collect()
}

/// Encode manual rows. Unparseable rows are dropped before counting.
///
/// # Errors
///
/// Returns `WktError::TooFewVertices` when fewer than three rows parse.
pub fn encode_manual_rows(rows: &[ManualRow]) -> Result<String, WktError> {
    encode_polygon(&valid_coordinates(rows))
}

/// Encode an open ring, repeating the first vertex at the end.
///
/// # Errors
///
/// Returns an error on fewer than three vertices or a non-finite coordinate.
pub fn encode_polygon(vertices: &[Coordinate]) -> Result<String, WktError> {
    check_vertices(vertices)?;
    let mut ring = vertices.to_vec();
    ring.push(vertices[0]);
    Ok(format_ring(&ring))
}

/// Encode a ring that may already be closed, without doubling the closing
/// vertex.
///
/// # Errors
///
/// Returns an error on fewer than three distinct vertices or a non-finite
/// coordinate.
pub fn encode_ring(ring: &[Coordinate]) -> Result<String, WktError> {
    let open = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    encode_polygon(open)
}

fn check_vertices(vertices: &[Coordinate]) -> Result<(), WktError> {
    if vertices.len() < MIN_VERTICES {
        return Err(WktError::TooFewVertices(vertices.len()));
    }
    if let Some(index) = vertices
        .iter()
        .position(|c| !c.lng.is_finite() || !c.lat.is_finite())
    {
        return Err(WktError::NonFinite { index });
    }
    Ok(())
}

fn format_ring(ring: &[Coordinate]) -> String {
    let points: Vec<String> = ring.iter().map(|c| format!("{} {}", c.lng, c.lat)).collect();
    format!("POLYGON(({}))", points.join(", "))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
