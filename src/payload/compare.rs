//! Project-comparison statistics payload.
//!
//! A flat set of maximum/average discrepancy fields plus three matrices that
//! arrive in the host's nested tuple serialization. A handful of wire names
//! are lower-cased on the host side (`maxxp`, `maximageWidth`, ...); the
//! renames pin those exactly.
use serde::Deserialize;
use serde_json::Value as Json;

use super::Matrix;
use crate::error::LinkError;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCompareStats {
    pub different_point_count: bool,
    pub different_point_cloud_count: bool,
    pub different_camera_count: bool,
    pub different_station_count: bool,
    pub different_image_point_count: bool,
    pub different_dream_matrix_count: bool,
    pub mismatch_label: bool,

    pub max_object_x: f64,
    pub max_object_y: f64,
    pub max_object_z: f64,
    pub ave_object_x: f64,
    pub ave_object_y: f64,
    pub ave_object_z: f64,
    pub max_object_covariance: Matrix,
    pub max_dream_diff: Matrix,

    pub max_image_x: f64,
    pub max_image_y: f64,
    pub ave_image_x: f64,
    pub ave_image_y: f64,
    pub max_image_vx: f64,
    pub max_image_vy: f64,

    pub max_c: f64,
    pub max_xp: f64,
    pub max_yp: f64,
    pub max_k1: f64,
    pub max_k2: f64,
    pub max_k3: f64,
    pub max_p1: f64,
    pub max_p2: f64,
    pub max_b1: f64,
    pub max_b2: f64,

    pub max_image_width: f64,
    pub max_image_height: f64,
    pub max_pixel_size: f64,

    pub max_station_h: Matrix,
}

#[derive(Deserialize)]
struct RawStats {
    #[serde(rename = "differentPointCount")]
    different_point_count: bool,
    #[serde(rename = "differentPointCloudCount")]
    different_point_cloud_count: bool,
    #[serde(rename = "differentCameraCount")]
    different_camera_count: bool,
    #[serde(rename = "differentStationCount")]
    different_station_count: bool,
    #[serde(rename = "differentImagePointCount")]
    different_image_point_count: bool,
    #[serde(rename = "differentDreamMatrixCount")]
    different_dream_matrix_count: bool,
    #[serde(rename = "mismatchLabel")]
    mismatch_label: bool,

    #[serde(rename = "maxObjectX")]
    max_object_x: f64,
    #[serde(rename = "maxObjectY")]
    max_object_y: f64,
    #[serde(rename = "maxObjectZ")]
    max_object_z: f64,
    #[serde(rename = "aveObjectX")]
    ave_object_x: f64,
    #[serde(rename = "aveObjectY")]
    ave_object_y: f64,
    #[serde(rename = "aveObjectZ")]
    ave_object_z: f64,
    #[serde(rename = "maxObjectCovariance")]
    max_object_covariance: Json,
    #[serde(rename = "maxDreamDiff")]
    max_dream_diff: Json,

    #[serde(rename = "maxImageX")]
    max_image_x: f64,
    #[serde(rename = "maxImageY")]
    max_image_y: f64,
    #[serde(rename = "aveImageX")]
    ave_image_x: f64,
    #[serde(rename = "aveImageY")]
    ave_image_y: f64,
    #[serde(rename = "maxImageVX")]
    max_image_vx: f64,
    #[serde(rename = "maxImageVY")]
    max_image_vy: f64,

    #[serde(rename = "maxC")]
    max_c: f64,
    #[serde(rename = "maxxp")]
    max_xp: f64,
    #[serde(rename = "maxyp")]
    max_yp: f64,
    #[serde(rename = "maxK1")]
    max_k1: f64,
    #[serde(rename = "maxK2")]
    max_k2: f64,
    #[serde(rename = "maxK3")]
    max_k3: f64,
    #[serde(rename = "maxP1")]
    max_p1: f64,
    #[serde(rename = "maxP2")]
    max_p2: f64,
    #[serde(rename = "maxB1")]
    max_b1: f64,
    #[serde(rename = "maxB2")]
    max_b2: f64,

    #[serde(rename = "maximageWidth")]
    max_image_width: f64,
    #[serde(rename = "maximageHeight")]
    max_image_height: f64,
    #[serde(rename = "maxpixelSize")]
    max_pixel_size: f64,

    #[serde(rename = "maxStationH")]
    max_station_h: Json,
}

impl ProjectCompareStats {
    /// Decode a `{"GPhotogrammetryProjectCompareStats": {...}}` payload.
    pub fn from_payload(json: &str) -> Result<Self, LinkError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "GPhotogrammetryProjectCompareStats")]
            stats: RawStats,
        }
        let Envelope { stats } = serde_json::from_str(json)?;

        Ok(Self {
            different_point_count: stats.different_point_count,
            different_point_cloud_count: stats.different_point_cloud_count,
            different_camera_count: stats.different_camera_count,
            different_station_count: stats.different_station_count,
            different_image_point_count: stats.different_image_point_count,
            different_dream_matrix_count: stats.different_dream_matrix_count,
            mismatch_label: stats.mismatch_label,
            max_object_x: stats.max_object_x,
            max_object_y: stats.max_object_y,
            max_object_z: stats.max_object_z,
            ave_object_x: stats.ave_object_x,
            ave_object_y: stats.ave_object_y,
            ave_object_z: stats.ave_object_z,
            max_object_covariance: Matrix::from_nested(&stats.max_object_covariance)?,
            max_dream_diff: Matrix::from_nested(&stats.max_dream_diff)?,
            max_image_x: stats.max_image_x,
            max_image_y: stats.max_image_y,
            ave_image_x: stats.ave_image_x,
            ave_image_y: stats.ave_image_y,
            max_image_vx: stats.max_image_vx,
            max_image_vy: stats.max_image_vy,
            max_c: stats.max_c,
            max_xp: stats.max_xp,
            max_yp: stats.max_yp,
            max_k1: stats.max_k1,
            max_k2: stats.max_k2,
            max_k3: stats.max_k3,
            max_p1: stats.max_p1,
            max_p2: stats.max_p2,
            max_b1: stats.max_b1,
            max_b2: stats.max_b2,
            max_image_width: stats.max_image_width,
            max_image_height: stats.max_image_height,
            max_pixel_size: stats.max_pixel_size,
            max_station_h: Matrix::from_nested(&stats.max_station_h)?,
        })
    }
}
