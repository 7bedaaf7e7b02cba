//! Image-space point payload: measured picture points with residuals,
//! attached to a picture with its pose matrix.
use serde::Deserialize;

use super::Matrix;
use crate::error::LinkError;

/// One measured image point with its residual vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagePoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl ImagePoint {
    pub fn distance_squared_to(&self, other: &ImagePoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &ImagePoint) -> f64 {
        self.distance_squared_to(other).sqrt()
    }
}

/// A picture with its pose matrix and measured points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Picture {
    pub label: String,
    #[serde(rename = "H")]
    pub pose: Matrix,
    pub points: Vec<ImagePoint>,
}

impl Picture {
    /// Decode a `{"GPicture": {...}}` payload.
    pub fn from_payload(json: &str) -> Result<Self, LinkError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "GPicture")]
            picture: Picture,
        }
        let envelope: Envelope = serde_json::from_str(json)?;
        Ok(envelope.picture)
    }
}
