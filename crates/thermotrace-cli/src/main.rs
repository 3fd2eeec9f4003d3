use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use thermotrace_core::artifact::IpfsClient;
use thermotrace_core::network::NetworkConfig;
use thermotrace_core::record::{InspectionMetadata, ProcessingParams};
use thermotrace_core::report::render;
use thermotrace_core::{SubmissionRequest, prepare_submission};

mod args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = args::Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "thermotrace_core={log_level},thermotrace_cli={log_level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("✗ {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: args::Args) -> Result<()> {
    let network = match &args.network_config {
        Some(path) => NetworkConfig::load(path)?,
        None => NetworkConfig::default(),
    };
    debug!(
        channel = %network.channel,
        chaincode = %network.chaincode,
        organizations = ?network.organization_names(),
        "network topology loaded"
    );

    let store = IpfsClient::new(
        args.ipfs_bin.clone(),
        Duration::from_secs(args.upload_timeout_secs),
    );

    let request = SubmissionRequest {
        video: args.video,
        image: args.image,
        metadata: InspectionMetadata {
            part_number: args.part_number,
            serial_number: args.serial_number,
            material_type: args.material_type,
            inspection_type: args.inspection_type,
            inspector: args.inspector,
        },
        organization: args.organization,
        roi: args.roi,
        bbox: args.bbox,
        ground_truth: args.gt_bbox,
        defect_type: args.defect_type,
        confidence: args.confidence,
        iou: args.iou,
        processing: ProcessingParams {
            pulse_time: args.pulse_time,
            pca_components: args.pca_components,
            sequence_length: args.sequence_length,
        },
        model_name: args.model_name,
        model_version: args.model_version,
        model_file: args.model_file,
        inspected_at: chrono::Local::now().fixed_offset(),
        script_path: args.script_out,
    };

    let submission = prepare_submission(request, &network, &store).await?;

    if let Some(path) = &args.record_out {
        let json = serde_json::to_string_pretty(&submission.record)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write record to {}", path.display()))?;
    }

    let output = match args.format {
        args::OutputFormat::Json => serde_json::to_string_pretty(&submission.record)? + "\n",
        args::OutputFormat::Text => render::render_text(&submission),
    };
    print!("{output}");

    Ok(())
}
