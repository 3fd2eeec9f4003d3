//! End-to-end preparation of one ledger submission.
//!
//! Stages run in a fixed order:
//!
//! 1. organization and endorsement set are resolved
//! 2. input files are checked, geometry strings parsed and scores checked
//!    for finite values
//! 3. artifacts (and the optional model file) are hashed
//! 4. video and image are uploaded concurrently
//! 5. the record is built, the command composed and the script written
//!
//! Every input error surfaces before any upload starts. Once uploads
//! begin, both are attempted even if one fails, and no script is written
//! unless both succeed.

use chrono::{DateTime, FixedOffset, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::artifact::{ArtifactUploads, ContentStore, hash_file, upload_artifacts};
use crate::error::{Result, SubmitError};
use crate::network::{InvokeCommand, NetworkConfig, compose_invoke, emit_script};
use crate::record::{
    BoundingBox, Detection, InspectionMetadata, InspectionRecord, ModelInfo, ProcessingParams,
    RecordBuilder, Roi, StoredArtifact,
};

/// Typed inputs for one submission, already validated by the caller's
/// argument parser.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub video: PathBuf,
    pub image: PathBuf,
    pub metadata: InspectionMetadata,
    pub organization: String,
    pub roi: String,
    pub bbox: Option<String>,
    pub ground_truth: Option<String>,
    pub defect_type: String,
    pub confidence: f64,
    pub iou: f64,
    pub processing: ProcessingParams,
    pub model_name: String,
    pub model_version: String,
    pub model_file: Option<PathBuf>,
    pub inspected_at: DateTime<FixedOffset>,
    pub script_path: PathBuf,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Submission {
    pub organization: String,
    pub record: InspectionRecord,
    pub uploads: ArtifactUploads,
    pub command: InvokeCommand,
    pub script_path: PathBuf,
}

/// Hash, upload, assemble and emit the submission script for `request`.
pub async fn prepare_submission<S: ContentStore>(
    request: SubmissionRequest,
    network: &NetworkConfig,
    store: &S,
) -> Result<Submission> {
    network.resolve(&request.organization)?;
    network.endorsing_profiles()?;

    require_file(&request.video)?;
    require_file(&request.image)?;
    if let Some(model) = &request.model_file {
        require_file(model)?;
    }

    let roi = Roi::parse(&request.roi)?;
    let bbox = parse_box("bbox", request.bbox.as_deref())?;
    let ground_truth = parse_box("gt_bbox", request.ground_truth.as_deref())?;
    if let (Some(pred), Some(truth)) = (&bbox, &ground_truth) {
        if !pred.center_distance(truth).is_finite() || !truth.diagonal().is_finite() {
            return Err(SubmitError::geometry(
                "gt_bbox",
                request.ground_truth.as_deref().unwrap_or_default(),
                "distance to the detected box is not representable",
            ));
        }
    }
    require_finite("confidence", request.confidence)?;
    require_finite("iou", request.iou)?;

    info!("calculating file hashes");
    let video_digest = hash_file(&request.video)?;
    let image_digest = hash_file(&request.image)?;
    let video_size = std::fs::metadata(&request.video)
        .map_err(|source| SubmitError::Io {
            path: request.video.clone(),
            source,
        })?
        .len();
    debug!(video = %video_digest.hex, image = %image_digest.hex, video_size, "artifacts hashed");

    let model_hash = match &request.model_file {
        Some(path) => Some(hash_file(path)?.prefixed()),
        None => None,
    };

    info!("uploading artifacts to IPFS");
    let uploads = upload_artifacts(store, &request.video, &request.image).await?;

    let record = RecordBuilder {
        metadata: request.metadata,
        inspected_at: request.inspected_at,
        video: StoredArtifact {
            digest: video_digest,
            upload: uploads.video.clone(),
        },
        video_size,
        image: StoredArtifact {
            digest: image_digest,
            upload: uploads.image.clone(),
        },
        roi,
        detection: Detection {
            bbox,
            defect_type: request.defect_type,
            confidence: request.confidence,
            iou: request.iou,
            ground_truth,
        },
        processing: request.processing,
        model: ModelInfo {
            name: request.model_name,
            version: request.model_version,
            hash: model_hash,
        },
    }
    .build();

    info!(organization = %request.organization, "composing chaincode invocation");
    let command = compose_invoke(&record, network, &request.organization)?;
    emit_script(&request.script_path, &command, Local::now().fixed_offset())?;

    Ok(Submission {
        organization: request.organization,
        record,
        uploads,
        command,
        script_path: request.script_path,
    })
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SubmitError::InputFileMissing {
            path: path.to_path_buf(),
        })
    }
}

/// JSON has no encoding for NaN or infinity.
fn require_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SubmitError::InvalidScore { field, value })
    }
}

/// An empty string counts as "no box supplied".
fn parse_box(field: &'static str, input: Option<&str>) -> Result<Option<BoundingBox>> {
    input
        .filter(|s| !s.trim().is_empty())
        .map(|s| BoundingBox::parse_field(field, s))
        .transpose()
}
