/*!
 * Geographic types.
 *
 * Fire detections are only ever compared over small distances (about a kilometer), so matching is
 * done directly in decimal degrees. No projection is involved.
 */
use crate::{error::InvalidRequest, FireChangeResult};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

pub use grid_index::CellSearch;
pub(crate) use grid_index::GridIndex;

mod grid_index;

/// Anything with a location on the Earth.
pub trait Geo {
    fn coord(&self) -> Coord;
}

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Euclidean distance in degrees.
    ///
    /// This is only meaningful for points that are close together, which is all it is used for.
    pub fn degree_distance(&self, other: &Coord) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        dlat.hypot(dlon)
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// The area a request for fire data covers.
///
/// The edges are stored the way the FIRMS area API expects them, west, south, east, north.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// The whole globe.
    pub const WORLD: BoundingBox = BoundingBox {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    /// Check that every edge is a valid latitude or longitude.
    pub fn validate(&self) -> FireChangeResult<()> {
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);

        if lon_ok(self.west) && lon_ok(self.east) && lat_ok(self.south) && lat_ok(self.north) {
            Ok(())
        } else {
            Err(
                InvalidRequest::new("Invalid coordinates. Must be within valid lat/lng bounds.")
                    .into(),
            )
        }
    }

    /// Check if a coordinate is inside (or on the edge of) the box.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.south
            && coord.lat <= self.north
            && coord.lon >= self.west
            && coord.lon <= self.east
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl FromStr for BoundingBox {
    type Err = Box<dyn std::error::Error>;

    /// Parse `west,south,east,north`.
    fn from_str(bbox_str: &str) -> Result<Self, Self::Err> {
        let edges: Vec<_> = bbox_str.split(',').map(str::trim).collect();

        if edges.len() != 4 {
            return Err(InvalidRequest::new(format!(
                "Invalid number of edges in bounding box, expected west,south,east,north: {}",
                bbox_str
            ))
            .into());
        }

        let bbox = BoundingBox {
            west: edges[0].parse()?,
            south: edges[1].parse()?,
            east: edges[2].parse()?,
            north: edges[3].parse()?,
        };

        bbox.validate()?;

        Ok(bbox)
    }
}
