//! Resolve which partner should serve a location.
//!
//! Two policies share one scan:
//!
//! - [`LocateMode::Nearest`]: the partner whose address is closest.
//! - [`LocateMode::Coverage`]: among partners whose coverage area contains the
//!   point, the one whose address is closest.
//!
//! Ties go to the partner that appears first in the input. Partners whose
//! geometry is missing or malformed are skipped and counted, never fatal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distance::haversine_km;
use crate::geometry::{Coordinate, CoordinateError};
use crate::partner::{GeometryField, Partner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocateMode {
    #[default]
    Nearest,
    Coverage,
}

impl fmt::Display for LocateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateMode::Nearest => write!(f, "nearest"),
            LocateMode::Coverage => write!(f, "coverage"),
        }
    }
}

impl FromStr for LocateMode {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(LocateMode::Nearest),
            "coverage" => Ok(LocateMode::Coverage),
            other => Err(LocateError::UnknownMode(other.to_string())),
        }
    }
}

/// Rejections of the query itself. Per-partner geometry problems never
/// surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error("query parameter '{0}' is required")]
    MissingCoordinate(&'static str),

    #[error("query parameter '{name}' is not a number: '{value}'")]
    NotANumber { name: &'static str, value: String },

    #[error(transparent)]
    OutOfRange(#[from] CoordinateError),

    #[error("unknown locate mode '{0}'; expected 'nearest' or 'coverage'")]
    UnknownMode(String),
}

impl LocateError {
    /// Whether the caller omitted a coordinate entirely, as opposed to sending
    /// a bad one.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, LocateError::MissingCoordinate(_))
    }
}

/// Parse the raw `long` / `lat` query values into a validated coordinate.
///
/// # Errors
///
/// Returns [`LocateError`] when either value is absent, blank, not a number,
/// or outside the WGS-84 range.
pub fn parse_query(long: Option<&str>, lat: Option<&str>) -> Result<Coordinate, LocateError> {
    let lng = parse_component("long", long)?;
    let lat = parse_component("lat", lat)?;
    Ok(Coordinate::new(lng, lat)?)
}

fn parse_component(name: &'static str, raw: Option<&str>) -> Result<f64, LocateError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(LocateError::MissingCoordinate(name))?;
    raw.parse::<f64>().map_err(|_| LocateError::NotANumber {
        name,
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartnerMatch<'a> {
    pub partner: &'a Partner,
    pub distance_km: f64,
}

impl PartnerMatch<'_> {
    /// Distance rendered with four decimal places.
    #[must_use]
    pub fn distance_km_fixed(&self) -> String {
        format!("{:.4}", self.distance_km)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    pub mode: LocateMode,
    pub best: Option<PartnerMatch<'a>>,
    /// Partners examined.
    pub scanned: usize,
    /// Partners excluded because geometry the mode needs was missing or malformed.
    pub skipped: usize,
}

impl MatchResult<'_> {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }
}

/// Pick the partner that should serve `query`.
///
/// Pure and read-only: a single pass over `partners`, no I/O.
#[must_use]
pub fn locate(query: Coordinate, partners: &[Partner], mode: LocateMode) -> MatchResult<'_> {
    let mut best: Option<PartnerMatch<'_>> = None;
    let mut skipped = 0usize;

    for partner in partners {
        if mode == LocateMode::Coverage {
            match &partner.coverage_area {
                GeometryField::Valid(area) => {
                    if !area.covers(query) {
                        continue;
                    }
                }
                GeometryField::Missing => {
                    tracing::debug!(partner_id = %partner.id, "partner has no coverage area");
                    skipped += 1;
                    continue;
                }
                GeometryField::Malformed(e) => {
                    tracing::warn!(partner_id = %partner.id, error = %e, "skipping partner with malformed coverage area");
                    skipped += 1;
                    continue;
                }
            }
        }

        let address = match &partner.address {
            GeometryField::Valid(address) => *address,
            GeometryField::Missing => {
                tracing::debug!(partner_id = %partner.id, "partner has no address");
                skipped += 1;
                continue;
            }
            GeometryField::Malformed(e) => {
                tracing::warn!(partner_id = %partner.id, error = %e, "skipping partner with malformed address");
                skipped += 1;
                continue;
            }
        };

        let distance_km = haversine_km(query, address);
        if best.is_none_or(|current| distance_km < current.distance_km) {
            best = Some(PartnerMatch {
                partner,
                distance_km,
            });
        }
    }

    MatchResult {
        mode,
        best,
        scanned: partners.len(),
        skipped,
    }
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod tests;
