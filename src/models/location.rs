use serde::{Deserialize, Serialize};

/// City recorded when reverse geocoding fails.
pub const UNKNOWN_CITY: &str = "Unknown City";

/// Country recorded when reverse geocoding fails.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Where a note was placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Human-readable place name.
    pub name: String,
    pub city: String,
    pub country: String,
}

impl Location {
    /// Creates a location at the given coordinates with no geocoded names.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: String::new(),
            city: UNKNOWN_CITY.to_string(),
            country: UNKNOWN_COUNTRY.to_string(),
        }
    }

    /// Sets the place name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the city and country.
    pub fn in_city(mut self, city: impl Into<String>, country: impl Into<String>) -> Self {
        self.city = city.into();
        self.country = country.into();
        self
    }

    /// Returns true if the city carries real geocoded data.
    ///
    /// Blank cities and the [`UNKNOWN_CITY`] sentinel count as missing.
    pub fn has_known_city(&self) -> bool {
        is_known_city(&self.city)
    }

    /// Returns true if the country carries real geocoded data.
    pub fn has_known_country(&self) -> bool {
        let country = self.country.trim();
        !country.is_empty() && country != UNKNOWN_COUNTRY
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// Returns false for blank cities and the [`UNKNOWN_CITY`] sentinel.
pub fn is_known_city(city: &str) -> bool {
    !city.trim().is_empty() && city != UNKNOWN_CITY
}
