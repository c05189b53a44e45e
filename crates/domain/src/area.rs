//! Area: a circular region around a [`Location`].

use serde::{Deserialize, Serialize};

use crate::emergency::EmergencyType;
use crate::location::Location;

/// Radius used when neither an explicit radius nor a mapped type is given.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// A center location plus a radius in meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    center: Location,
    radius_in_meters: f64,
}

impl Area {
    #[must_use]
    pub fn new(center: Location, radius_in_meters: f64) -> Self {
        Self {
            center,
            radius_in_meters,
        }
    }

    /// Derive an area from a location.
    ///
    /// An explicit `radius_in_meters` wins; otherwise the radius follows the
    /// emergency type (see [`default_radius`]).
    #[must_use]
    pub fn from_location(
        location: Location,
        radius_in_meters: Option<f64>,
        emergency_type: Option<EmergencyType>,
    ) -> Self {
        let radius = radius_in_meters.unwrap_or_else(|| default_radius(emergency_type));
        Self::new(location, radius)
    }

    #[must_use]
    pub fn center(&self) -> &Location {
        &self.center
    }

    #[must_use]
    pub fn radius_in_meters(&self) -> f64 {
        self.radius_in_meters
    }
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center
            && self.radius_in_meters.to_bits() == other.radius_in_meters.to_bits()
    }
}

impl Eq for Area {}

/// Default radius in meters for an emergency type.
#[must_use]
pub fn default_radius(emergency_type: Option<EmergencyType>) -> f64 {
    use EmergencyType as T;

    match emergency_type {
        Some(T::NaturalDisaster | T::CivilUnrest) => 1000.0,
        Some(T::WeatherAlert | T::SecurityThreat) => 500.0,
        Some(T::InfrastructureFailure | T::TransportationDisruption) => 300.0,
        Some(T::UtilityOutage) => 200.0,
        Some(T::PersonalEmergency | T::MedicalEmergency) => 10.0,
        Some(_) | None => DEFAULT_RADIUS_METERS,
    }
}
