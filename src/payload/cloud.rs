//! Labeled 3D point-cloud payload.
use serde::Deserialize;

use super::Matrix;
use crate::error::LinkError;

/// One measured object point with its direction cosines and covariance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectPoint {
    pub label: String,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
    pub i: f64,
    pub j: f64,
    pub k: f64,
    #[serde(rename = "nRays")]
    pub rays: i64,
    /// Total ray count; absent on hosts that predate the field.
    #[serde(rename = "nTotalRays", default = "unknown_rays")]
    pub total_rays: i64,
    pub offset: f64,
    pub covariance: Matrix,
}

fn unknown_rays() -> i64 {
    -1
}

impl ObjectPoint {
    pub fn distance_squared_to(&self, other: &ObjectPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance_to(&self, other: &ObjectPoint) -> f64 {
        self.distance_squared_to(other).sqrt()
    }
}

/// A named collection of object points.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Cloud {
    pub points: Vec<ObjectPoint>,
}

impl Cloud {
    /// Decode a `{"GCloud": {...}}` payload.
    pub fn from_payload(json: &str) -> Result<Self, LinkError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "GCloud")]
            cloud: Cloud,
        }
        let envelope: Envelope = serde_json::from_str(json)?;
        Ok(envelope.cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "GCloud": {
            "points": [
                {
                    "label": "TARGET1",
                    "X": 1.0, "Y": 2.0, "Z": 2.0,
                    "i": 0.0, "j": 0.0, "k": 1.0,
                    "nRays": 6,
                    "nTotalRays": 8,
                    "offset": 0.125,
                    "covariance": {"rows": 3, "cols": 3,
                                   "data": [1, 0, 0, 0, 1, 0, 0, 0, 1]}
                },
                {
                    "label": "TARGET2",
                    "X": 0.0, "Y": 0.0, "Z": 0.0,
                    "i": 0.0, "j": 0.0, "k": 1.0,
                    "nRays": 4,
                    "offset": 0.0,
                    "covariance": {"rows": 0, "cols": 0, "data": []}
                }
            ]
        }
    }"#;

    #[test]
    fn decodes_points_in_order() {
        let cloud = Cloud::from_payload(SAMPLE).unwrap();
        assert_eq!(cloud.points.len(), 2);
        assert_eq!(cloud.points[0].label, "TARGET1");
        assert_eq!(cloud.points[0].covariance.at(1, 1), 1.0);
    }

    #[test]
    fn missing_total_rays_defaults_to_minus_one() {
        let cloud = Cloud::from_payload(SAMPLE).unwrap();
        assert_eq!(cloud.points[0].total_rays, 8);
        assert_eq!(cloud.points[1].total_rays, -1);
    }

    #[test]
    fn point_distances() {
        let cloud = Cloud::from_payload(SAMPLE).unwrap();
        let (a, b) = (&cloud.points[0], &cloud.points[1]);
        assert_eq!(a.distance_squared_to(b), 9.0);
        assert_eq!(a.distance_to(b), 3.0);
    }
}
