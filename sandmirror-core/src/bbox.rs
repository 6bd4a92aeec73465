//! Bounding-box handling and quadrant partitioning.

use geo::{Coord, Rect};
use thiserror::Error;

/// Largest area, in square degrees, a single copy run will accept.
///
/// Roughly a 10 by 10 km square at mid latitudes.
pub const MAX_COPY_AREA_SQ_DEG: f64 = 0.01;

/// Errors produced while parsing or validating a bounding box.
#[derive(Debug, Error, PartialEq)]
pub enum BoundingBoxError {
    /// The textual form did not contain four comma-separated values.
    #[error("expected four comma-separated numbers, got {count}")]
    WrongComponentCount { count: usize },
    /// One of the four components was not a number.
    #[error("bounding box component {value:?} is not a number")]
    InvalidComponent { value: String },
    /// The box covers more area than a single run may copy.
    #[error("bounding box covers {area} square degrees, more than the {limit} limit; try 10\u{d7}10 km")]
    TooLarge { area: f64, limit: f64 },
}

/// A geographic rectangle in WGS84 lon/lat.
///
/// Corner ordering is normalised on construction, so `min()` is always the
/// south-west corner and `max()` the north-east one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    /// Build a box from two opposite corners, in any order.
    #[must_use]
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self {
            rect: Rect::new(a, b),
        }
    }

    #[must_use]
    pub fn min(&self) -> Coord<f64> {
        self.rect.min()
    }

    #[must_use]
    pub fn max(&self) -> Coord<f64> {
        self.rect.max()
    }

    /// Area in square degrees.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rect.width() * self.rect.height()
    }

    /// Whether the closed rectangle contains the coordinate.
    #[must_use]
    pub fn contains(&self, coords: Coord<f64>) -> bool {
        coords.x >= self.min().x
            && coords.x <= self.max().x
            && coords.y >= self.min().y
            && coords.y <= self.max().y
    }

    /// Reject boxes larger than [`MAX_COPY_AREA_SQ_DEG`].
    pub fn ensure_copyable(&self) -> Result<(), BoundingBoxError> {
        let area = self.area();
        if area > MAX_COPY_AREA_SQ_DEG {
            return Err(BoundingBoxError::TooLarge {
                area,
                limit: MAX_COPY_AREA_SQ_DEG,
            });
        }
        Ok(())
    }

    /// Split the box at its midpoints into four quadrants.
    ///
    /// The quadrants tile the box exactly: no overlap beyond the shared
    /// edges, no gap, and each has a quarter of the area.
    #[must_use]
    pub fn quarter(&self) -> [Self; 4] {
        let mid = Coord {
            x: (self.min().x + self.max().x) / 2.0,
            y: (self.min().y + self.max().y) / 2.0,
        };
        [
            Self::new(self.min(), mid),
            Self::new(Coord { x: self.min().x, y: mid.y }, Coord { x: mid.x, y: self.max().y }),
            Self::new(Coord { x: mid.x, y: self.min().y }, Coord { x: self.max().x, y: mid.y }),
            Self::new(mid, self.max()),
        ]
    }

    /// Render as `minlon,minlat,maxlon,maxlat` for the editing API.
    #[must_use]
    pub fn api_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min().x,
            self.min().y,
            self.max().x,
            self.max().y
        )
    }

    /// Render as `minlat,minlon,maxlat,maxlon` for Overpass queries.
    #[must_use]
    pub fn overpass_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min().y,
            self.min().x,
            self.max().y,
            self.max().x
        )
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = BoundingBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundingBoxError::WrongComponentCount { count: parts.len() });
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BoundingBoxError::InvalidComponent {
                    value: (*part).to_owned(),
                })?;
        }
        Ok(Self::new(
            Coord { x: values[0], y: values[1] },
            Coord { x: values[2], y: values[3] },
        ))
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.api_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parse_normalises_corner_order() {
        let bbox: BoundingBox = "10.05,50.05,10.0,50.0".parse().expect("valid bbox");
        assert_eq!(bbox.min(), Coord { x: 10.0, y: 50.0 });
        assert_eq!(bbox.max(), Coord { x: 10.05, y: 50.05 });
    }

    #[rstest]
    #[case("10.0,50.0")]
    #[case("1,2,3,4,5")]
    fn parse_rejects_wrong_component_count(#[case] input: &str) {
        assert!(matches!(
            input.parse::<BoundingBox>(),
            Err(BoundingBoxError::WrongComponentCount { .. })
        ));
    }

    #[rstest]
    fn parse_rejects_non_numeric_components() {
        assert!(matches!(
            "a,b,c,d".parse::<BoundingBox>(),
            Err(BoundingBoxError::InvalidComponent { .. })
        ));
    }

    #[rstest]
    fn small_box_is_copyable() {
        let bbox: BoundingBox = "10.0,50.0,10.05,50.05".parse().expect("valid bbox");
        assert!((bbox.area() - 0.0025).abs() < 1e-12);
        assert!(bbox.ensure_copyable().is_ok());
    }

    #[rstest]
    fn oversized_box_is_rejected() {
        let bbox: BoundingBox = "0,0,1,1".parse().expect("valid bbox");
        assert!(matches!(
            bbox.ensure_copyable(),
            Err(BoundingBoxError::TooLarge { .. })
        ));
    }

    #[rstest]
    fn quadrants_tile_the_box_exactly() {
        let bbox: BoundingBox = "0,0,1,2".parse().expect("valid bbox");
        let quadrants = bbox.quarter();

        for quadrant in &quadrants {
            assert!((quadrant.area() - bbox.area() / 4.0).abs() < 1e-12);
        }

        let min_x = quadrants.iter().map(|q| q.min().x).fold(f64::MAX, f64::min);
        let min_y = quadrants.iter().map(|q| q.min().y).fold(f64::MAX, f64::min);
        let max_x = quadrants.iter().map(|q| q.max().x).fold(f64::MIN, f64::max);
        let max_y = quadrants.iter().map(|q| q.max().y).fold(f64::MIN, f64::max);
        assert_eq!(Coord { x: min_x, y: min_y }, bbox.min());
        assert_eq!(Coord { x: max_x, y: max_y }, bbox.max());

        // Quadrants meet at the midpoint without overlap beyond shared edges.
        assert_eq!(quadrants[0].max(), Coord { x: 0.5, y: 1.0 });
        assert_eq!(quadrants[3].min(), Coord { x: 0.5, y: 1.0 });
        assert_eq!(quadrants[1].min(), Coord { x: 0.0, y: 1.0 });
        assert_eq!(quadrants[2].min(), Coord { x: 0.5, y: 0.0 });
    }

    #[rstest]
    fn parameter_renderings_swap_axis_order() {
        let bbox: BoundingBox = "10.0,50.0,10.05,50.05".parse().expect("valid bbox");
        assert_eq!(bbox.api_param(), "10,50,10.05,50.05");
        assert_eq!(bbox.overpass_param(), "50,10,50.05,10.05");
    }
}
