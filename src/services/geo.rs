//! Great-circle queries over tour start locations.

use serde_json::{json, Value};

use crate::error::ApiError;
use crate::types::{lookup_path, Document};

const EARTH_RADIUS_MI: f64 = 3963.2;
const EARTH_RADIUS_KM: f64 = 6378.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Miles,
    Kilometres,
}

impl Unit {
    /// `mi` means miles; anything else is kilometres
    pub fn parse(value: &str) -> Self {
        if value == "mi" {
            Unit::Miles
        } else {
            Unit::Kilometres
        }
    }

    fn earth_radius(self) -> f64 {
        match self {
            Unit::Miles => EARTH_RADIUS_MI,
            Unit::Kilometres => EARTH_RADIUS_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    /// `"lat,lng"` as it appears in the URL
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        let invalid = || ApiError::bad_request("Please provide coordinates");
        let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| invalid())?;
        Ok(Self { lat, lng })
    }

    /// GeoJSON `coordinates` are `[lng, lat]`
    fn from_location(doc: &Document) -> Option<Self> {
        let coordinates = lookup_path(doc, "startLocation.coordinates")?.as_array()?;
        Some(Self {
            lng: coordinates.first()?.as_f64()?,
            lat: coordinates.get(1)?.as_f64()?,
        })
    }

    /// Central angle in radians (haversine)
    fn angle_to(&self, other: &Point) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Tours starting within `distance` of `center`
pub fn within(tours: Vec<Document>, center: Point, distance: f64, unit: Unit) -> Vec<Document> {
    let radius = distance / unit.earth_radius();
    tours
        .into_iter()
        .filter(|tour| {
            Point::from_location(tour)
                .map(|start| center.angle_to(&start) <= radius)
                .unwrap_or(false)
        })
        .collect()
}

/// `{id, name, distance}` for each tour with a start location, nearest first
pub fn distances(tours: &[Document], from: Point, unit: Unit) -> Vec<Value> {
    let mut found: Vec<(f64, &Document)> = tours
        .iter()
        .filter_map(|tour| Point::from_location(tour).map(|start| (from.angle_to(&start) * unit.earth_radius(), tour)))
        .collect();
    found.sort_by(|a, b| a.0.total_cmp(&b.0));

    found
        .into_iter()
        .map(|(distance, tour)| {
            json!({
                "id": tour.get("id"),
                "name": tour.get("name"),
                "distance": distance,
            })
        })
        .collect()
}
