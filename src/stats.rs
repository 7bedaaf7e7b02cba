//! Typed snapshots of statistic values the host leaves in the return-value
//! store after bundle, alignment and auto-relabel commands.
use crate::error::LinkError;
use crate::values::ReturnValueStore;

/// Statistics from the most recent bundle adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleStats {
    pub bad_picture_count: i64,
    pub total_picture_count: i64,
    pub total_scalebar_count: i64,
    pub bad_point_count: i64,
    pub bad_scalebar_count: i64,
    pub weak_picture_count: i64,
    pub weak_point_count: i64,
    pub weak_scalebar_count: i64,
    pub total_point_count: i64,
    pub two_ray_point_count: i64,
    pub total_internal_triangulation_rms: f64,
    pub total_rms_x: f64,
    pub total_rms_y: f64,
    pub total_rms_z: f64,
    pub limiting_rms_x: f64,
    pub limiting_rms_y: f64,
    pub limiting_rms_z: f64,
    pub residual_rms_x: f64,
    pub residual_rms_y: f64,
    pub residual_rms_xy: f64,
    pub accepted_scalebar_count: i64,
    pub rejected_image_point_count: i64,
    pub plan_quality_factor: f64,
    pub scalebar_rms: f64,
}

impl BundleStats {
    pub fn from_store(store: &ReturnValueStore) -> Result<Self, LinkError> {
        Ok(Self {
            bad_picture_count: store.get_int("v.bundleBadPictureCount")?,
            total_picture_count: store.get_int("v.bundleTotalPictureCount")?,
            total_scalebar_count: store.get_int("v.bundleTotalScalebarCount")?,
            bad_point_count: store.get_int("v.bundleBadPointCount")?,
            bad_scalebar_count: store.get_int("v.bundleBadScalebarCount")?,
            weak_picture_count: store.get_int("v.bundleWeakPictureCount")?,
            weak_point_count: store.get_int("v.bundleWeakPointCount")?,
            weak_scalebar_count: store.get_int("v.bundleWeakScalebarCount")?,
            total_point_count: store.get_int("v.bundleTotalPointCount")?,
            two_ray_point_count: store.get_int("v.bundleTwoRayPointCount")?,
            total_internal_triangulation_rms: store
                .get_float("v.bundleTotalInternalTriangulationRMS")?,
            total_rms_x: store.get_float("v.bundleTotalRMSX")?,
            total_rms_y: store.get_float("v.bundleTotalRMSY")?,
            total_rms_z: store.get_float("v.bundleTotalRMSZ")?,
            limiting_rms_x: store.get_float("v.bundleLimitingRMSX")?,
            limiting_rms_y: store.get_float("v.bundleLimitingRMSY")?,
            limiting_rms_z: store.get_float("v.bundleLimitingRMSZ")?,
            residual_rms_x: store.get_float("v.bundleResidualRMSx")?,
            residual_rms_y: store.get_float("v.bundleResidualRMSy")?,
            residual_rms_xy: store.get_float("v.bundleResidualRMSxy")?,
            accepted_scalebar_count: store.get_int("v.bundleAcceptedScaleBarCount")?,
            rejected_image_point_count: store.get_int("v.bundleRejectedImagePointCount")?,
            plan_quality_factor: store.get_float("v.bundlePlanQualityFactor")?,
            scalebar_rms: store.get_float("v.bundleScaleBarRMS")?,
        })
    }
}

/// Statistics from the most recent alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentStats {
    pub primary_point_count: i64,
    pub secondary_point_count: i64,
    pub common_point_count: i64,
    pub accepted_point_count: i64,
    pub rejected_point_count: i64,
    pub iteration_count: i64,
    pub rejection_limit: f64,
    pub rms_x: f64,
    pub rms_y: f64,
    pub rms_z: f64,
    pub rms_total: f64,
}

impl AlignmentStats {
    pub fn from_store(store: &ReturnValueStore) -> Result<Self, LinkError> {
        Ok(Self {
            primary_point_count: store.get_int("v.alignmentPrimaryPointCount")?,
            secondary_point_count: store.get_int("v.alignmentSecondaryPointCount")?,
            common_point_count: store.get_int("v.alignmentCommonPointCount")?,
            accepted_point_count: store.get_int("v.alignmentAcceptedPointCount")?,
            rejected_point_count: store.get_int("v.alignmentRejectedPointCount")?,
            iteration_count: store.get_int("v.alignmentIterationCount")?,
            rejection_limit: store.get_float("v.alignmentRejectionLimit")?,
            rms_x: store.get_float("v.alignmentRMSX")?,
            rms_y: store.get_float("v.alignmentRMSY")?,
            rms_z: store.get_float("v.alignmentRMSZ")?,
            rms_total: store.get_float("v.alignmentRMSTotal")?,
        })
    }
}

/// Results of the most recent auto-relabel run.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRelabelResults {
    /// Points that were relabeled.
    pub relabeled_count: i64,
    /// Points that were not relabeled.
    pub not_relabeled_count: i64,
    /// RMS of the temporary alignment.
    pub rms: f64,
    /// Whether only automatched points were considered.
    pub automatched_only: bool,
    /// Nearness threshold used for the relabel.
    pub threshold: f64,
}

impl AutoRelabelResults {
    pub fn from_store(store: &ReturnValueStore) -> Result<Self, LinkError> {
        Ok(Self {
            relabeled_count: store.get_int("v.autoRelabelRelabeledCount")?,
            not_relabeled_count: store.get_int("v.autoRelabelNotRelabeledCount")?,
            rms: store.get_float("v.autoRelabelRMS")?,
            automatched_only: store.get_bool("v.autoRelabelAutomatchedOnly")?,
            threshold: store.get_float("v.autoRelabelThreshold")?,
        })
    }
}
