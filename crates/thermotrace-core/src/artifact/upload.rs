use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::error::{Result, SubmitError};

/// Default bound on a single `ipfs add` invocation.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of a single content-addressed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Content identifier returned by the store.
    pub cid: String,

    /// Short name of the uploaded file, for operator output.
    pub file_name: String,
}

/// A content-addressable store that accepts local files.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// Upload the file at `path` and return its content identifier.
    async fn add(&self, path: &Path) -> Result<UploadResult>;
}

/// Uploads files by shelling out to an IPFS client binary.
///
/// Runs `<binary> add -q <path>` and treats trimmed stdout as the CID.
/// Each invocation is bounded by `timeout`; on expiry the child is killed.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    binary: PathBuf,
    timeout: Duration,
}

impl IpfsClient {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for IpfsClient {
    fn default() -> Self {
        Self::new("ipfs", DEFAULT_UPLOAD_TIMEOUT)
    }
}

impl ContentStore for IpfsClient {
    async fn add(&self, path: &Path) -> Result<UploadResult> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("add")
            .arg("-q")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            binary = %self.binary.display(),
            path = %path.display(),
            timeout = ?self.timeout,
            "running ipfs add"
        );

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| SubmitError::UploadFailure {
                path: path.to_path_buf(),
                stderr: format!("failed to run {}: {e}", self.binary.display()),
            })?,
            Err(_) => {
                error!(path = %path.display(), timeout = ?self.timeout, "ipfs add timed out");
                return Err(SubmitError::UploadTimeout {
                    path: path.to_path_buf(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!(
                path = %path.display(),
                status = %output.status,
                "ipfs add failed: {}",
                stderr.trim()
            );
            return Err(SubmitError::UploadFailure {
                path: path.to_path_buf(),
                stderr,
            });
        }

        let cid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if cid.is_empty() {
            return Err(SubmitError::UploadFailure {
                path: path.to_path_buf(),
                stderr: "ipfs add returned no content identifier".to_string(),
            });
        }

        let file_name = short_name(path);
        info!("✓ Uploaded {file_name} to IPFS: {cid}");

        Ok(UploadResult { cid, file_name })
    }
}

/// Upload results for both artifacts of one inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUploads {
    pub video: UploadResult,
    pub image: UploadResult,
}

/// Upload the raw video and processed image concurrently.
///
/// Both uploads always run to completion before results are inspected,
/// so a failing video upload does not prevent the image upload from being
/// attempted. Results are paired by role, never by completion order. When
/// both fail, the video error is reported.
pub async fn upload_artifacts<S: ContentStore>(
    store: &S,
    video: &Path,
    image: &Path,
) -> Result<ArtifactUploads> {
    let (video, image) = tokio::join!(store.add(video), store.add(image));

    Ok(ArtifactUploads {
        video: video?,
        image: image?,
    })
}

pub(crate) fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
