//! Local artifact handling: content hashing and content-addressed upload.

pub mod hash;
pub mod upload;

pub use hash::{FileDigest, hash_file};
pub use upload::{ArtifactUploads, ContentStore, IpfsClient, UploadResult, upload_artifacts};
