use serde::{Deserialize, Serialize};

use crate::error::{Result, SubmitError};

/// One AI defect inspection, as submitted to the `AddDefectInspection`
/// chaincode function.
///
/// The fields are plain public data so records can be read back from the
/// ledger or a `--record-out` file. `RecordBuilder::build` is the one
/// constructor that guarantees the cross-field rules, and
/// [`InspectionRecord::check_consistency`] re-checks them for records from
/// anywhere else.
///
/// The JSON field names are the chaincode's contract and must not change.
/// Every field is always present in the serialized form. `organization`,
/// `txID`, `blockchainTimestamp` and `submittedAt` are left empty here and
/// stamped by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    // Identity
    pub part_number: String,
    pub serial_number: String,
    pub material_type: String,

    // Inspection metadata
    pub inspection_date: String,
    pub inspection_type: String,
    pub inspector: String,
    pub organization: String,

    // Artifact references
    pub raw_video_hash: String,
    #[serde(rename = "rawVideoIPFS")]
    pub raw_video_ipfs: String,
    pub raw_video_size: u64,
    pub processed_image_hash: String,
    #[serde(rename = "processedImageIPFS")]
    pub processed_image_ipfs: String,

    // Region of interest
    #[serde(rename = "roi_y1")]
    pub roi_y1: i64,
    #[serde(rename = "roi_y2")]
    pub roi_y2: i64,
    #[serde(rename = "roi_x1")]
    pub roi_x1: i64,
    #[serde(rename = "roi_x2")]
    pub roi_x2: i64,

    // Acquisition / processing
    pub pulse_time: u32,
    pub pca_components: u32,
    pub sequence_length: u32,

    // Model identification
    pub model_name: String,
    pub model_version: String,
    pub model_hash: String,

    // Detection outcome
    pub defect_detected: bool,
    pub defect_type: String,
    pub confidence_score: f64,

    #[serde(rename = "bbox_x1")]
    pub bbox_x1: f64,
    #[serde(rename = "bbox_y1")]
    pub bbox_y1: f64,
    #[serde(rename = "bbox_x2")]
    pub bbox_x2: f64,
    #[serde(rename = "bbox_y2")]
    pub bbox_y2: f64,

    // Metrics
    pub iou: f64,
    pub center_distance: f64,
    pub norm_center_distance: f64,

    // Ground truth
    pub has_ground_truth: bool,
    #[serde(rename = "gt_bbox_x1")]
    pub gt_bbox_x1: f64,
    #[serde(rename = "gt_bbox_y1")]
    pub gt_bbox_y1: f64,
    #[serde(rename = "gt_bbox_x2")]
    pub gt_bbox_x2: f64,
    #[serde(rename = "gt_bbox_y2")]
    pub gt_bbox_y2: f64,

    // Ledger-assigned
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub blockchain_timestamp: String,
    pub submitted_at: String,
}

impl InspectionRecord {
    /// Compact JSON form embedded in the chaincode invocation.
    pub fn to_compact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rejects records whose fields contradict each other or cannot be
    /// encoded as JSON numbers.
    ///
    /// - without a detection, the box is all zeros and `defectType` is empty
    /// - without ground truth, the gt box and both distances are zero
    /// - every float is finite
    pub fn check_consistency(&self) -> Result<()> {
        let bbox = [self.bbox_x1, self.bbox_y1, self.bbox_x2, self.bbox_y2];
        let gt = [
            self.gt_bbox_x1,
            self.gt_bbox_y1,
            self.gt_bbox_x2,
            self.gt_bbox_y2,
        ];
        let scores = [
            self.confidence_score,
            self.iou,
            self.center_distance,
            self.norm_center_distance,
        ];

        if let Some(v) = bbox.iter().chain(&gt).chain(&scores).find(|v| !v.is_finite()) {
            return Err(SubmitError::InconsistentRecord(format!("non-finite value {v}")));
        }
        if !self.defect_detected && (bbox.iter().any(|&v| v != 0.0) || !self.defect_type.is_empty())
        {
            return Err(SubmitError::InconsistentRecord(
                "bounding box or defect type set without a detected defect".into(),
            ));
        }
        if !self.has_ground_truth
            && (gt.iter().any(|&v| v != 0.0)
                || self.center_distance != 0.0
                || self.norm_center_distance != 0.0)
        {
            return Err(SubmitError::InconsistentRecord(
                "ground-truth metrics set without a ground-truth box".into(),
            ));
        }
        Ok(())
    }
}
