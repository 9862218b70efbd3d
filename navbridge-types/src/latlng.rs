//! Geographic positions and bounds.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::error::NavbridgeTypesError;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl LatLng {
    /// Creates a new position.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl AbsDiffEq for LatLng {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.latitude.abs_diff_eq(&other.latitude, epsilon)
            && self.longitude.abs_diff_eq(&other.longitude, epsilon)
    }
}

/// Creates a new [`LatLng`] from latitude and longitude values (in degrees).
///
/// ```
/// use navbridge_types::latlng;
///
/// let point = latlng!(38.0, 52.0);
/// assert_eq!(point.latitude, 38.0);
/// ```
#[macro_export]
macro_rules! latlng {
    ($lat:expr, $lng:expr) => {
        $crate::latlng::LatLng::new($lat, $lng)
    };
}

/// Rectangular geographic area given by its south-west and north-east corners.
///
/// The east longitude may be smaller than the west one, in which case the bounds cross the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLngBounds {
    southwest: LatLng,
    northeast: LatLng,
}

impl LatLngBounds {
    /// Creates new bounds. Fails if the south-west corner lies north of the north-east corner.
    pub fn new(southwest: LatLng, northeast: LatLng) -> Result<Self, NavbridgeTypesError> {
        if southwest.latitude > northeast.latitude {
            return Err(NavbridgeTypesError::InvertedBounds {
                south: southwest.latitude,
                north: northeast.latitude,
            });
        }

        Ok(Self {
            southwest,
            northeast,
        })
    }

    /// Smallest bounds containing all the given points. Returns `None` for an empty iterator.
    ///
    /// Antimeridian crossing is not considered, the result always spans west to east.
    pub fn from_points<'a>(mut points: impl Iterator<Item = &'a LatLng>) -> Option<Self> {
        let first = points.next()?;
        let mut bounds = Self {
            southwest: *first,
            northeast: *first,
        };

        for point in points {
            bounds.southwest.latitude = bounds.southwest.latitude.min(point.latitude);
            bounds.southwest.longitude = bounds.southwest.longitude.min(point.longitude);
            bounds.northeast.latitude = bounds.northeast.latitude.max(point.latitude);
            bounds.northeast.longitude = bounds.northeast.longitude.max(point.longitude);
        }

        Some(bounds)
    }

    /// South-west corner.
    pub fn southwest(&self) -> LatLng {
        self.southwest
    }

    /// North-east corner.
    pub fn northeast(&self) -> LatLng {
        self.northeast
    }

    /// Returns true if the bounds span the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.southwest.longitude > self.northeast.longitude
    }

    /// Returns true if the point is inside the bounds (edges included).
    pub fn contains(&self, point: &LatLng) -> bool {
        if point.latitude < self.southwest.latitude || point.latitude > self.northeast.latitude {
            return false;
        }

        if self.crosses_antimeridian() {
            point.longitude >= self.southwest.longitude
                || point.longitude <= self.northeast.longitude
        } else {
            point.longitude >= self.southwest.longitude
                && point.longitude <= self.northeast.longitude
        }
    }

    /// Center of the bounds.
    pub fn center(&self) -> LatLng {
        let latitude = (self.southwest.latitude + self.northeast.latitude) / 2.0;
        let mut longitude = if self.crosses_antimeridian() {
            (self.southwest.longitude + self.northeast.longitude + 360.0) / 2.0
        } else {
            (self.southwest.longitude + self.northeast.longitude) / 2.0
        };

        if longitude > 180.0 {
            longitude -= 360.0;
        }

        LatLng::new(latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    #[test]
    fn inverted_bounds_are_rejected() {
        let result = LatLngBounds::new(latlng!(10.0, 0.0), latlng!(5.0, 1.0));
        assert_matches!(result, Err(NavbridgeTypesError::InvertedBounds { .. }));
    }

    #[test]
    fn bounds_from_points() {
        let points = [latlng!(1.0, 5.0), latlng!(-2.0, 3.0), latlng!(4.0, -1.0)];
        let bounds = LatLngBounds::from_points(points.iter()).expect("no points");

        assert_eq!(bounds.southwest(), latlng!(-2.0, -1.0));
        assert_eq!(bounds.northeast(), latlng!(4.0, 5.0));
        assert!(bounds.contains(&latlng!(0.0, 0.0)));
        assert!(!bounds.contains(&latlng!(5.0, 0.0)));
        assert!(LatLngBounds::from_points([].iter()).is_none());
    }

    #[test]
    fn antimeridian_bounds() {
        let bounds = LatLngBounds::new(latlng!(-10.0, 170.0), latlng!(10.0, -170.0))
            .expect("valid bounds");

        assert!(bounds.crosses_antimeridian());
        assert!(bounds.contains(&latlng!(0.0, 179.0)));
        assert!(bounds.contains(&latlng!(0.0, -175.0)));
        assert!(!bounds.contains(&latlng!(0.0, 0.0)));
        assert_abs_diff_eq!(bounds.center(), latlng!(0.0, 180.0));
    }
}
