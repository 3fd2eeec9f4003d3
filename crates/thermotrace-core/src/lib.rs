pub mod artifact;
pub mod error;
pub mod network;
pub mod pipeline;
pub mod record;
pub mod report;

pub use error::{Result, SubmitError};
pub use pipeline::{Submission, SubmissionRequest, prepare_submission};

pub const TOOL_NAME: &str = "thermotrace";
