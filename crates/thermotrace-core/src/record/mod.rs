pub mod build;
pub mod geometry;
pub mod model;

pub use build::{Detection, InspectionMetadata, ModelInfo, ProcessingParams, RecordBuilder, StoredArtifact};
pub use geometry::{BoundingBox, Roi};
pub use model::InspectionRecord;
