//! Geographic regions used to select events.
//!
//! A region is either an axis-aligned latitude/longitude box or a rotated
//! ellipse. Both are deserialized from the `[region]` table of the run
//! configuration with a `shape` tag:
//!
//! ```toml
//! [region]
//! shape = "box"
//! lat_max = 36.0
//! lat_min = 25.0
//! long_min = -46.0
//! long_max = -35.0
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The acceptance shape an event's epicentre must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Region {
    /// Latitude/longitude box, edges inclusive.
    Box {
        lat_max: f64,
        lat_min: f64,
        long_min: f64,
        long_max: f64,
    },

    /// Ellipse with semi-axes `a >= b`, rotated by `phi` degrees around its centre.
    Ellipse {
        a: f64,
        b: f64,
        phi: f64,
        lat: f64,
        long: f64,
    },
}

impl Region {
    /// Box with the default bounds of the region editor.
    pub fn default_box() -> Self {
        Region::Box {
            lat_max: 10.0,
            lat_min: -10.0,
            long_min: -10.0,
            long_max: 10.0,
        }
    }

    /// Ellipse with the default parameters of the region editor.
    pub fn default_ellipse() -> Self {
        Region::Ellipse {
            a: 10.0,
            b: 5.0,
            phi: 45.0,
            lat: 0.0,
            long: 0.0,
        }
    }

    /// Check whether a point lies inside the region.
    ///
    /// Boundary points count as inside. Inputs are not validated; an ellipse
    /// with a non-positive semi-axis gives an unspecified answer.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        match *self {
            Region::Box {
                lat_max,
                lat_min,
                long_min,
                long_max,
            } => {
                lat_min <= latitude
                    && latitude <= lat_max
                    && long_min <= longitude
                    && longitude <= long_max
            }
            Region::Ellipse {
                a,
                b,
                phi,
                lat,
                long,
            } => {
                let (sin, cos) = phi.to_radians().sin_cos();
                let d_long = longitude - long;
                let d_lat = latitude - lat;

                let x = cos * d_long + sin * d_lat;
                let y = sin * d_long - cos * d_lat;

                (x / a).powi(2) + (y / b).powi(2) <= 1.0
            }
        }
    }

    /// Validate the region parameters against the ranges accepted as user input.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Region::Box {
                lat_max,
                lat_min,
                long_min,
                long_max,
            } => {
                check_range("lat_max", lat_max, -90.0, 90.0)?;
                check_range("lat_min", lat_min, -90.0, 90.0)?;
                check_range("long_min", long_min, -180.0, 180.0)?;
                check_range("long_max", long_max, -180.0, 180.0)?;
                if lat_max < lat_min {
                    bail!(
                        "lat_max ({}) must not be below lat_min ({})",
                        lat_max,
                        lat_min
                    );
                }
                if long_min > long_max {
                    bail!(
                        "long_min ({}) must not exceed long_max ({})",
                        long_min,
                        long_max
                    );
                }
            }
            Region::Ellipse {
                a,
                b,
                phi,
                lat,
                long,
            } => {
                check_range("a", a, 1.0, 100.0)?;
                check_range("b", b, 1.0, 100.0)?;
                check_range("phi", phi, -90.0, 90.0)?;
                check_range("lat", lat, -90.0, 90.0)?;
                check_range("long", long, -180.0, 180.0)?;
                if a < b {
                    bail!("semi-axis a ({}) must not be smaller than b ({})", a, b);
                }
            }
        }
        Ok(())
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::default_box()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Box {
                lat_max,
                lat_min,
                long_min,
                long_max,
            } => write!(
                f,
                "box lat [{}, {}] long [{}, {}]",
                lat_min, lat_max, long_min, long_max
            ),
            Region::Ellipse {
                a,
                b,
                phi,
                lat,
                long,
            } => write!(
                f,
                "ellipse a={} b={} phi={} centre ({}, {})",
                a, b, phi, lat, long
            ),
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(min..=max).contains(&value) {
        bail!(
            "{} = {} is outside the allowed range [{}, {}]",
            name,
            value,
            min,
            max
        );
    }
    Ok(())
}
