use crate::TOOL_NAME;
use crate::pipeline::Submission;

const RULE: &str = "============================================================";
const PUBLIC_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Operator-facing summary of a prepared submission.
pub fn render_text(submission: &Submission) -> String {
    let record = &submission.record;
    let size = record.raw_video_size;
    let mut out = String::new();

    out.push_str(&format!("{RULE}\n{TOOL_NAME} - ledger submission prepared\n{RULE}\n"));
    out.push_str(&format!("Part Number:   {}\n", record.part_number));
    out.push_str(&format!("Serial Number: {}\n", record.serial_number));
    out.push_str(&format!("Material:      {}\n", record.material_type));
    out.push_str(&format!(
        "Organization:  {}\n",
        submission.organization.to_uppercase()
    ));
    out.push_str(&format!("Video hash:    {}\n", record.raw_video_hash));
    out.push_str(&format!(
        "Video size:    {size} bytes ({:.2} MB)\n",
        size as f64 / 1024.0 / 1024.0
    ));
    out.push_str(&format!("Image hash:    {}\n", record.processed_image_hash));
    out.push_str(&format!("Video CID:     ipfs://{}\n", record.raw_video_ipfs));
    out.push_str(&format!("Image CID:     ipfs://{}\n", record.processed_image_ipfs));
    out.push_str(&format!(
        "Gateway:       {PUBLIC_GATEWAY}/{}\n",
        record.processed_image_ipfs
    ));
    if record.defect_detected {
        out.push_str(&format!(
            "Detection:     {} (confidence {:.2})\n",
            record.defect_type, record.confidence_score
        ));
    } else {
        out.push_str("Detection:     none\n");
    }
    out.push_str(&format!("{RULE}\n"));
    out.push_str(&format!(
        "Script saved to {}\nRun it from the network directory to submit.\n",
        submission.script_path.display()
    ));
    out
}
