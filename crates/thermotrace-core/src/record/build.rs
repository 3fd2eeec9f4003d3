use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::artifact::{FileDigest, UploadResult};
use crate::record::geometry::{BoundingBox, Roi};
use crate::record::model::InspectionRecord;

pub const DEFAULT_MATERIAL_TYPE: &str = "Carbon Fiber Composite";
pub const DEFAULT_INSPECTION_TYPE: &str = "Active Thermography";
pub const DEFAULT_DEFECT_TYPE: &str = "thermal defect";
pub const DEFAULT_MODEL_NAME: &str = "cnn_attention_grdino";
pub const DEFAULT_MODEL_VERSION: &str = "v1.0";

/// Identifying metadata supplied by the operator.
#[derive(Debug, Clone)]
pub struct InspectionMetadata {
    pub part_number: String,
    pub serial_number: String,
    pub material_type: String,
    pub inspection_type: String,
    pub inspector: String,
}

/// Acquisition and post-processing parameters of the thermal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingParams {
    pub pulse_time: u32,
    pub pca_components: u32,
    pub sequence_length: u32,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            pulse_time: 13,
            pca_components: 10,
            sequence_length: 2000,
        }
    }
}

/// Identification of the detection model that produced the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    /// `sha256:<hex>` of the model weights, when they were supplied.
    pub hash: Option<String>,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            version: DEFAULT_MODEL_VERSION.to_string(),
            hash: None,
        }
    }
}

/// Detection output of the model, already computed upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Option<BoundingBox>,
    pub defect_type: String,
    pub confidence: f64,
    pub iou: f64,
    pub ground_truth: Option<BoundingBox>,
}

impl Default for Detection {
    fn default() -> Self {
        Self {
            bbox: None,
            defect_type: DEFAULT_DEFECT_TYPE.to_string(),
            confidence: 0.0,
            iou: 0.0,
            ground_truth: None,
        }
    }
}

/// A hashed and uploaded artifact.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub digest: FileDigest,
    pub upload: UploadResult,
}

/// Everything collected by the pipeline before the record is assembled.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    pub metadata: InspectionMetadata,
    pub inspected_at: DateTime<FixedOffset>,
    pub video: StoredArtifact,
    /// Taken from filesystem metadata, never from the caller.
    pub video_size: u64,
    pub image: StoredArtifact,
    pub roi: Roi,
    pub detection: Detection,
    pub processing: ProcessingParams,
    pub model: ModelInfo,
}

impl RecordBuilder {
    /// Assemble the immutable inspection record.
    ///
    /// `defectDetected` is derived from the presence of a bounding box.
    /// Without one, the box is zeroed and the defect type is empty.
    /// Centre-distance metrics are only computed when both a detection
    /// and a ground-truth box are present.
    pub fn build(self) -> InspectionRecord {
        let Detection {
            bbox,
            defect_type,
            confidence,
            iou,
            ground_truth,
        } = self.detection;

        let defect_detected = bbox.is_some();
        let b = bbox.unwrap_or_default();
        let gt = ground_truth.unwrap_or_default();

        let (center_distance, norm_center_distance) = match (bbox, ground_truth) {
            (Some(pred), Some(truth)) => {
                let distance = pred.center_distance(&truth);
                let diagonal = truth.diagonal();
                if !distance.is_finite() || !diagonal.is_finite() {
                    warn!("centre distance is not representable; distance metrics left at 0");
                    (0.0, 0.0)
                } else if diagonal > 0.0 {
                    (distance, distance / diagonal)
                } else {
                    warn!("ground-truth box is degenerate; normalized centre distance left at 0");
                    (distance, 0.0)
                }
            }
            _ => (0.0, 0.0),
        };

        InspectionRecord {
            part_number: self.metadata.part_number,
            serial_number: self.metadata.serial_number,
            material_type: self.metadata.material_type,
            inspection_date: self.inspected_at.to_rfc3339(),
            inspection_type: self.metadata.inspection_type,
            inspector: self.metadata.inspector,
            organization: String::new(),
            raw_video_hash: self.video.digest.prefixed(),
            raw_video_ipfs: self.video.upload.cid,
            raw_video_size: self.video_size,
            processed_image_hash: self.image.digest.prefixed(),
            processed_image_ipfs: self.image.upload.cid,
            roi_y1: self.roi.y1,
            roi_y2: self.roi.y2,
            roi_x1: self.roi.x1,
            roi_x2: self.roi.x2,
            pulse_time: self.processing.pulse_time,
            pca_components: self.processing.pca_components,
            sequence_length: self.processing.sequence_length,
            model_name: self.model.name,
            model_version: self.model.version,
            model_hash: self.model.hash.unwrap_or_default(),
            defect_detected,
            defect_type: if defect_detected {
                defect_type
            } else {
                String::new()
            },
            confidence_score: confidence,
            bbox_x1: b.x1,
            bbox_y1: b.y1,
            bbox_x2: b.x2,
            bbox_y2: b.y2,
            iou,
            center_distance,
            norm_center_distance,
            has_ground_truth: ground_truth.is_some(),
            gt_bbox_x1: gt.x1,
            gt_bbox_y1: gt.y1,
            gt_bbox_x2: gt.x2,
            gt_bbox_y2: gt.y2,
            tx_id: String::new(),
            blockchain_timestamp: String::new(),
            submitted_at: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn artifact(name: &str, hex: &str, size: u64) -> StoredArtifact {
        StoredArtifact {
            digest: FileDigest {
                hex: hex.into(),
                size_bytes: size,
            },
            upload: UploadResult {
                cid: format!("Qm{name}"),
                file_name: name.into(),
            },
        }
    }

    fn builder(detection: Detection) -> RecordBuilder {
        RecordBuilder {
            metadata: InspectionMetadata {
                part_number: "COMP-1".into(),
                serial_number: "SN-1".into(),
                material_type: DEFAULT_MATERIAL_TYPE.into(),
                inspection_type: DEFAULT_INSPECTION_TYPE.into(),
                inspector: "A. Tester".into(),
            },
            inspected_at: DateTime::parse_from_rfc3339("2025-06-01T12:30:00+02:00").unwrap(),
            video: artifact("a.bin", "aa11", 32),
            video_size: 32,
            image: artifact("b.jpg", "bb22", 10),
            roi: Roi::parse("10,20,30,40").unwrap(),
            detection,
            processing: ProcessingParams::default(),
            model: ModelInfo::default(),
        }
    }

    #[test]
    fn bbox_marks_defect_detected() {
        let record = builder(Detection {
            bbox: Some("1,2,3,4".parse().unwrap()),
            confidence: 0.8,
            ..Default::default()
        })
        .build();

        assert!(record.defect_detected);
        assert_eq!(record.defect_type, "thermal defect");
        assert_eq!(record.confidence_score, 0.8);
        assert_eq!(
            (record.bbox_x1, record.bbox_y1, record.bbox_x2, record.bbox_y2),
            (1.0, 2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn no_bbox_zeroes_box_and_clears_defect_type() {
        let record = builder(Detection {
            defect_type: "delamination".into(),
            ..Default::default()
        })
        .build();

        assert!(!record.defect_detected);
        assert_eq!(record.defect_type, "");
        assert_eq!(
            (record.bbox_x1, record.bbox_y1, record.bbox_x2, record.bbox_y2),
            (0.0, 0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn artifact_fields_are_prefixed_and_linked() {
        let record = builder(Detection::default()).build();

        assert_eq!(record.raw_video_hash, "sha256:aa11");
        assert_eq!(record.raw_video_ipfs, "Qma.bin");
        assert_eq!(record.raw_video_size, 32);
        assert_eq!(record.processed_image_hash, "sha256:bb22");
        assert_eq!(record.processed_image_ipfs, "Qmb.jpg");
    }

    #[test]
    fn roi_and_processing_defaults_are_recorded() {
        let record = builder(Detection::default()).build();

        assert_eq!(
            (record.roi_y1, record.roi_y2, record.roi_x1, record.roi_x2),
            (10, 20, 30, 40)
        );
        assert_eq!(record.pulse_time, 13);
        assert_eq!(record.pca_components, 10);
        assert_eq!(record.sequence_length, 2000);
        assert_eq!(record.model_name, "cnn_attention_grdino");
        assert_eq!(record.model_version, "v1.0");
        assert_eq!(record.model_hash, "");
    }

    #[test]
    fn inspection_date_keeps_offset() {
        let record = builder(Detection::default()).build();
        assert_eq!(record.inspection_date, "2025-06-01T12:30:00+02:00");
    }

    #[test]
    fn ledger_assigned_fields_stay_empty() {
        let record = builder(Detection::default()).build();

        assert_eq!(record.organization, "");
        assert_eq!(record.tx_id, "");
        assert_eq!(record.blockchain_timestamp, "");
        assert_eq!(record.submitted_at, "");
    }

    #[test]
    fn ground_truth_populates_distance_metrics() {
        let record = builder(Detection {
            bbox: Some("0,0,2,2".parse().unwrap()),
            ground_truth: Some("3,4,5,6".parse().unwrap()),
            ..Default::default()
        })
        .build();

        assert!(record.has_ground_truth);
        assert_eq!(record.gt_bbox_x1, 3.0);
        assert_eq!(record.gt_bbox_y2, 6.0);
        assert_eq!(record.center_distance, 5.0);
        // gt diagonal = sqrt(8)
        assert!((record.norm_center_distance - 5.0 / 8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn ground_truth_without_detection_has_zero_distance() {
        let record = builder(Detection {
            ground_truth: Some("3,4,5,6".parse().unwrap()),
            ..Default::default()
        })
        .build();

        assert!(record.has_ground_truth);
        assert!(!record.defect_detected);
        assert_eq!(record.center_distance, 0.0);
        assert_eq!(record.norm_center_distance, 0.0);
    }

    #[test]
    fn degenerate_ground_truth_leaves_normalized_distance_zero() {
        let record = builder(Detection {
            bbox: Some("0,0,2,2".parse().unwrap()),
            ground_truth: Some("4,1,4,1".parse().unwrap()),
            ..Default::default()
        })
        .build();

        assert_eq!(record.center_distance, 3.0);
        assert_eq!(record.norm_center_distance, 0.0);
    }

    #[test]
    fn huge_boxes_keep_distance_metrics_finite() {
        let record = builder(Detection {
            bbox: Some("1e308,0,1e308,0".parse().unwrap()),
            ground_truth: Some("0,0,0,2".parse().unwrap()),
            ..Default::default()
        })
        .build();
        assert_eq!(record.center_distance, 1e308);
        assert_eq!(record.norm_center_distance, 5e307);

        let json = record.to_compact_json().unwrap();
        let back: InspectionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unrepresentable_distance_is_zeroed() {
        let record = builder(Detection {
            bbox: Some("1.7e308,0,1.7e308,0".parse().unwrap()),
            ground_truth: Some("-1.7e308,0,-1.7e308,0".parse().unwrap()),
            ..Default::default()
        })
        .build();

        assert!(record.defect_detected);
        assert_eq!(record.center_distance, 0.0);
        assert_eq!(record.norm_center_distance, 0.0);
    }

    #[test]
    fn model_hash_is_carried_when_supplied() {
        let mut b = builder(Detection::default());
        b.model.hash = Some("sha256:feed".into());

        assert_eq!(b.build().model_hash, "sha256:feed");
    }

    fn bbox_strategy() -> impl Strategy<Value = Option<BoundingBox>> {
        prop::option::of((-1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4).prop_map(
            |(x1, y1, x2, y2)| BoundingBox { x1, y1, x2, y2 },
        ))
    }

    proptest! {
        #[test]
        fn defect_flag_tracks_bbox_presence(
            bbox in bbox_strategy(),
            confidence in 0.0f64..=1.0,
            label in "[a-z ]{0,16}",
        ) {
            let record = builder(Detection {
                bbox,
                defect_type: label.clone(),
                confidence,
                ..Default::default()
            })
            .build();

            prop_assert_eq!(record.defect_detected, bbox.is_some());
            match bbox {
                Some(b) => {
                    prop_assert_eq!(record.bbox_x1, b.x1);
                    prop_assert_eq!(record.bbox_y2, b.y2);
                    prop_assert_eq!(record.defect_type, label);
                }
                None => {
                    prop_assert_eq!(
                        [record.bbox_x1, record.bbox_y1, record.bbox_x2, record.bbox_y2],
                        [0.0; 4]
                    );
                    prop_assert_eq!(record.defect_type, "");
                }
            }
        }

        #[test]
        fn built_records_survive_json_round_trip(
            bbox in bbox_strategy(),
            ground_truth in bbox_strategy(),
            iou in 0.0f64..=1.0,
            part in "[A-Z0-9-]{1,12}",
            inspector in "\\PC{0,20}",
        ) {
            let mut b = builder(Detection { bbox, ground_truth, iou, ..Default::default() });
            b.metadata.part_number = part;
            b.metadata.inspector = inspector;
            let record = b.build();

            let json = serde_json::to_string(&record).unwrap();
            let parsed: InspectionRecord = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, record);
        }
    }
}
