//! Recording stations and the catalog used to corroborate events.
//!
//! Stations are loaded from a JSON array:
//!
//! ```json
//! [
//!   {
//!     "name": "NVAR",
//!     "lat": 38.43,
//!     "long": -118.3,
//!     "testing_areas": [
//!       {"type": "square", "name": "Nevada", "country": "USA",
//!        "lat1": 37.3, "lat2": 36.9, "long1": -116.3, "long2": -115.9},
//!       {"type": "dot", "name": "Pahute Mesa", "country": "USA", "lat": 37.2, "long": -116.4}
//!     ]
//!   }
//! ]
//! ```
//!
//! Testing areas with an unrecognized `type` are skipped; the station is
//! still loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading or selecting stations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read station file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed station file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Station {station}: {area_type} testing area is missing field '{field}'")]
    MissingAreaField {
        station: String,
        area_type: &'static str,
        field: &'static str,
    },

    #[error("Unknown station: {0}")]
    UnknownStation(String),
}

/// Shape of a testing area. Used for display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AreaShape {
    #[serde(rename = "dot")]
    Dot {
        #[serde(rename = "lat")]
        latitude: f64,
        #[serde(rename = "long")]
        longitude: f64,
    },

    /// `lat1` is the upper edge, `lat2` the lower, `long1` left and `long2` right.
    #[serde(rename = "square")]
    Rectangle {
        lat1: f64,
        lat2: f64,
        long1: f64,
        long2: f64,
    },
}

/// A named test site associated with a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestingArea {
    pub name: String,
    pub country: String,
    #[serde(flatten)]
    pub shape: AreaShape,
}

/// A seismic recording station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "long")]
    pub longitude: f64,
    pub testing_areas: Vec<TestingArea>,
}

impl Station {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            testing_areas: Vec::new(),
        }
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Station: {}", self.name)
    }
}

/// Station record as it appears on disk. Required fields are enforced by serde.
#[derive(Debug, Deserialize)]
struct RawStation {
    name: String,
    lat: f64,
    long: f64,
    testing_areas: Vec<RawTestingArea>,
}

/// Testing area record as it appears on disk.
///
/// Every field except `type` is optional here so that entries of an unknown
/// type can be skipped without knowing their layout.
#[derive(Debug, Deserialize)]
struct RawTestingArea {
    #[serde(rename = "type")]
    kind: String,
    name: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    long: Option<f64>,
    lat1: Option<f64>,
    lat2: Option<f64>,
    long1: Option<f64>,
    long2: Option<f64>,
}

impl RawTestingArea {
    /// Convert to a testing area. Returns `Ok(None)` for unrecognized types.
    fn into_area(self, station: &str) -> Result<Option<TestingArea>, ConfigError> {
        let area_type: &'static str = match self.kind.as_str() {
            "square" => "square",
            "dot" => "dot",
            other => {
                debug!("Station {}: skipping testing area of type '{}'", station, other);
                return Ok(None);
            }
        };

        let require = |value: Option<f64>, field: &'static str| {
            value.ok_or_else(|| ConfigError::MissingAreaField {
                station: station.to_string(),
                area_type,
                field,
            })
        };

        let shape = if area_type == "square" {
            AreaShape::Rectangle {
                lat1: require(self.lat1, "lat1")?,
                lat2: require(self.lat2, "lat2")?,
                long1: require(self.long1, "long1")?,
                long2: require(self.long2, "long2")?,
            }
        } else {
            AreaShape::Dot {
                latitude: require(self.lat, "lat")?,
                longitude: require(self.long, "long")?,
            }
        };

        let missing = |field: &'static str| ConfigError::MissingAreaField {
            station: station.to_string(),
            area_type,
            field,
        };

        Ok(Some(TestingArea {
            name: self.name.ok_or_else(|| missing("name"))?,
            country: self.country.ok_or_else(|| missing("country"))?,
            shape,
        }))
    }
}

/// Load the station list from a JSON file.
pub fn load_stations(path: impl AsRef<Path>) -> Result<Vec<Station>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Vec<RawStation> =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    build_stations(raw)
}

/// Build the station list from JSON text.
pub fn stations_from_json(content: &str) -> Result<Vec<Station>, ConfigError> {
    let raw: Vec<RawStation> =
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: PathBuf::from("<inline>"),
            source,
        })?;
    build_stations(raw)
}

fn build_stations(raw: Vec<RawStation>) -> Result<Vec<Station>, ConfigError> {
    let mut stations = Vec::with_capacity(raw.len());
    for station in raw {
        let mut testing_areas = Vec::with_capacity(station.testing_areas.len());
        for area in station.testing_areas {
            if let Some(area) = area.into_area(&station.name)? {
                testing_areas.push(area);
            }
        }
        stations.push(Station {
            name: station.name,
            latitude: station.lat,
            longitude: station.long,
            testing_areas,
        });
    }
    debug!("Loaded {} stations", stations.len());
    Ok(stations)
}

/// Immutable set of station names an event may be corroborated by.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    names: HashSet<String>,
}

impl StationCatalog {
    /// Catalog of every given station.
    pub fn from_stations(stations: &[Station]) -> Self {
        Self {
            names: stations.iter().map(|s| s.name.clone()).collect(),
        }
    }

    /// Catalog of the named stations only.
    ///
    /// An empty selection yields a catalog of every station. Naming a station
    /// that is not in `stations` is an error.
    pub fn select<S: AsRef<str>>(stations: &[Station], names: &[S]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(Self::from_stations(stations));
        }

        let mut selected = HashSet::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !stations.iter().any(|s| s.name == name) {
                warn!("Station {} is not in the catalog", name);
                return Err(ConfigError::UnknownStation(name.to_string()));
            }
            selected.insert(name.to_string());
        }
        Ok(Self { names: selected })
    }

    /// Exact, case-sensitive membership test.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Station names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for StationCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS_JSON: &str = r#"[
        {
            "name": "NVAR",
            "lat": 38.43,
            "long": -118.3,
            "testing_areas": [
                {"type": "square", "name": "Nevada", "country": "USA",
                 "lat1": 37.3, "lat2": 36.9, "long1": -116.3, "long2": -115.9},
                {"type": "polygon", "name": "Ignored", "country": "USA", "points": []},
                {"type": "dot", "name": "Pahute Mesa", "country": "USA", "lat": 37.2, "long": -116.4}
            ]
        },
        {
            "name": "ARCES",
            "lat": 69.53,
            "long": 25.51,
            "testing_areas": []
        }
    ]"#;

    #[test]
    fn test_load_stations_from_json() {
        let stations = stations_from_json(STATIONS_JSON).unwrap();
        assert_eq!(stations.len(), 2);

        let nvar = &stations[0];
        assert_eq!(nvar.name, "NVAR");
        assert!((nvar.latitude - 38.43).abs() < 1e-9);
        assert!((nvar.longitude + 118.3).abs() < 1e-9);
        // The polygon entry is skipped, the other two kept in order.
        assert_eq!(nvar.testing_areas.len(), 2);
        assert_eq!(
            nvar.testing_areas[0].shape,
            AreaShape::Rectangle {
                lat1: 37.3,
                lat2: 36.9,
                long1: -116.3,
                long2: -115.9,
            }
        );
        assert_eq!(nvar.testing_areas[1].name, "Pahute Mesa");
        assert_eq!(
            nvar.testing_areas[1].shape,
            AreaShape::Dot {
                latitude: 37.2,
                longitude: -116.4,
            }
        );
        assert!(stations[1].testing_areas.is_empty());
    }

    #[test]
    fn test_missing_station_field_is_fatal() {
        let json = r#"[{"name": "NVAR", "lat": 38.43, "testing_areas": []}]"#;
        let err = stations_from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("long"));
    }

    #[test]
    fn test_missing_testing_areas_is_fatal() {
        let json = r#"[{"name": "NVAR", "lat": 38.43, "long": -118.3}]"#;
        assert!(stations_from_json(json).is_err());
    }

    #[test]
    fn test_square_missing_coordinate_is_fatal() {
        let json = r#"[{"name": "NVAR", "lat": 1, "long": 2, "testing_areas": [
            {"type": "square", "name": "A", "country": "B", "lat1": 1, "lat2": 0, "long1": 0}
        ]}]"#;
        match stations_from_json(json) {
            Err(ConfigError::MissingAreaField { station, field, .. }) => {
                assert_eq!(station, "NVAR");
                assert_eq!(field, "long2");
            }
            other => panic!("Expected MissingAreaField, got {:?}", other),
        }
    }

    #[test]
    fn test_testing_area_equality_is_structural() {
        let a = TestingArea {
            name: "Site".to_string(),
            country: "KZ".to_string(),
            shape: AreaShape::Dot {
                latitude: 50.0,
                longitude: 78.0,
            },
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.shape = AreaShape::Dot {
            latitude: 50.0,
            longitude: 78.1,
        };
        assert_ne!(a, b);

        let c = TestingArea {
            country: "RU".to_string(),
            ..a.clone()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn test_round_trip_through_json() {
        let stations = stations_from_json(STATIONS_JSON).unwrap();
        let written = serde_json::to_string(&stations).unwrap();
        let reloaded = stations_from_json(&written).unwrap();
        assert_eq!(stations, reloaded);
    }

    #[test]
    fn test_load_stations_missing_file() {
        let err = load_stations("/nonexistent/stations.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_catalog_contains_exact_names() {
        let catalog: StationCatalog = ["NVAR", "ARCES"].into_iter().collect();
        assert!(catalog.contains("NVAR"));
        assert!(!catalog.contains("nvar"));
        assert!(!catalog.contains("NVA"));
        assert_eq!(catalog.names(), vec!["ARCES", "NVAR"]);
    }

    #[test]
    fn test_catalog_select() {
        let stations = stations_from_json(STATIONS_JSON).unwrap();

        let all = StationCatalog::select::<&str>(&stations, &[]).unwrap();
        assert_eq!(all.len(), 2);

        let only_nvar = StationCatalog::select(&stations, &["NVAR"]).unwrap();
        assert!(only_nvar.contains("NVAR"));
        assert!(!only_nvar.contains("ARCES"));

        let err = StationCatalog::select(&stations, &["WRA"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStation(ref name) if name == "WRA"));
    }
}
