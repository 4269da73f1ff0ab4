//! Partner records and the decoding step that types their geometry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{
    decode_address, decode_coverage_area, Coordinate, CoverageArea, GeometryError,
};

/// Outcome of decoding one optional geometry column.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryField<T> {
    Missing,
    Valid(T),
    Malformed(GeometryError),
}

impl<T> GeometryField<T> {
    /// Decode `value` with `decoder`; JSON `null` and absence are both `Missing`.
    pub fn decode<F>(value: Option<&Value>, decoder: F) -> Self
    where
        F: FnOnce(&Value) -> Result<T, GeometryError>,
    {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(v) => match decoder(v) {
                Ok(decoded) => Self::Valid(decoded),
                Err(e) => Self::Malformed(e),
            },
        }
    }

    #[must_use]
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn malformed(&self) -> Option<&GeometryError> {
        match self {
            Self::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// A partner as held by the store, geometry still undecoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub id: String,
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub coverage_area: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid address: {0}")]
    Address(GeometryError),

    #[error("invalid coverage area: {0}")]
    CoverageArea(GeometryError),
}

impl PartnerRecord {
    /// Check the record before it is written: identifying fields present and
    /// any supplied geometry decodable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("id", &self.id),
            ("trading_name", &self.trading_name),
            ("owner_name", &self.owner_name),
            ("document", &self.document),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(name));
            }
        }

        let partner = self.decode();
        if let Some(e) = partner.address.malformed() {
            return Err(ValidationError::Address(e.clone()));
        }
        if let Some(e) = partner.coverage_area.malformed() {
            return Err(ValidationError::CoverageArea(e.clone()));
        }
        Ok(())
    }

    /// Decode geometry into a typed [`Partner`]. Never fails: bad geometry is
    /// kept as [`GeometryField::Malformed`] on the result.
    #[must_use]
    pub fn decode(&self) -> Partner {
        Partner {
            id: self.id.clone(),
            trading_name: self.trading_name.clone(),
            owner_name: self.owner_name.clone(),
            document: self.document.clone(),
            address: GeometryField::decode(self.address.as_ref(), decode_address),
            coverage_area: GeometryField::decode(self.coverage_area.as_ref(), decode_coverage_area),
        }
    }
}

/// A partner with typed geometry, ready for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub id: String,
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    pub address: GeometryField<Coordinate>,
    pub coverage_area: GeometryField<CoverageArea>,
}
