//! Location: a geographic point with a free-text description.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A latitude/longitude pair plus a human-readable description.
///
/// Two locations are equal when their coordinates match; the description
/// does not take part in equality. Deserialization applies the same range
/// checks as [`Location::try_new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct Location {
    latitude: f64,
    longitude: f64,
    description: String,
}

impl Location {
    /// Create a location without range checks.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, description: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            description: description.into(),
        }
    }

    /// Create a location, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinates`] when latitude is outside
    /// `[-90, 90]` or longitude is outside `[-180, 180]`.
    pub fn try_new(
        latitude: f64,
        longitude: f64,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !(lat_ok && lon_ok) {
            return Err(ValidationError::InvalidCoordinates);
        }
        Ok(Self::new(latitude, longitude, description))
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Deserialize)]
struct RawLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawLocation> for Location {
    type Error = ValidationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        Self::try_new(raw.latitude, raw.longitude, raw.description)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Location {}
