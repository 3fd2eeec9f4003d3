use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use thermotrace_core::record::build::{
    DEFAULT_DEFECT_TYPE, DEFAULT_INSPECTION_TYPE, DEFAULT_MATERIAL_TYPE, DEFAULT_MODEL_NAME,
    DEFAULT_MODEL_VERSION,
};
use thermotrace_core::record::geometry::DEFAULT_ROI;

#[derive(Debug, Parser)]
#[command(
    name = "thermotrace",
    version,
    about = "Hash, upload and prepare a thermal inspection for ledger submission"
)]
pub struct Args {
    /// Path to the raw thermal video (.npy)
    #[arg(long)]
    pub video: PathBuf,

    /// Path to the processed image (.jpg)
    #[arg(long)]
    pub image: PathBuf,

    /// Part number, e.g. COMP-PANEL-1234
    #[arg(long)]
    pub part_number: String,

    /// Serial number, e.g. SN-2025-001
    #[arg(long)]
    pub serial_number: String,

    #[arg(long, default_value = DEFAULT_MATERIAL_TYPE)]
    pub material_type: String,

    #[arg(long, default_value = DEFAULT_INSPECTION_TYPE)]
    pub inspection_type: String,

    /// Inspector name
    #[arg(long)]
    pub inspector: String,

    /// Submitting organization, as named in the network configuration
    #[arg(long, default_value = "manufacturer")]
    pub organization: String,

    /// Region of interest: y1,y2,x1,x2
    #[arg(long, default_value = DEFAULT_ROI)]
    pub roi: String,

    /// Detected defect bounding box: x1,y1,x2,y2
    #[arg(long)]
    pub bbox: Option<String>,

    /// Detection confidence (0.0-1.0)
    #[arg(long, default_value_t = 0.0)]
    pub confidence: f64,

    /// Intersection over union against the reference box
    #[arg(long, default_value_t = 0.0)]
    pub iou: f64,

    #[arg(long, default_value = DEFAULT_DEFECT_TYPE)]
    pub defect_type: String,

    /// Ground-truth bounding box: x1,y1,x2,y2
    #[arg(long)]
    pub gt_bbox: Option<String>,

    /// Model weights file; its SHA-256 is recorded as the model hash
    #[arg(long)]
    pub model_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    #[arg(long, default_value = DEFAULT_MODEL_VERSION)]
    pub model_version: String,

    #[arg(long, default_value_t = 13)]
    pub pulse_time: u32,

    #[arg(long, default_value_t = 10)]
    pub pca_components: u32,

    #[arg(long, default_value_t = 2000)]
    pub sequence_length: u32,

    /// Where to write the generated submission script
    #[arg(long)]
    pub script_out: PathBuf,

    /// Also write the inspection record as JSON to this file
    #[arg(long)]
    pub record_out: Option<PathBuf>,

    /// Network topology (TOML); defaults to the built-in channel layout
    #[arg(long)]
    pub network_config: Option<PathBuf>,

    /// IPFS client binary
    #[arg(long, env = "THERMOTRACE_IPFS_BIN", default_value = "ipfs")]
    pub ipfs_bin: PathBuf,

    /// Upper bound on each IPFS upload, in seconds
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub upload_timeout_secs: u64,

    /// Summary format printed on success
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
