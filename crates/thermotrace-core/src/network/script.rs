use chrono::{DateTime, FixedOffset};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, SubmitError};
use crate::network::command::InvokeCommand;

/// Render the full script text for `command`.
pub fn render_script(command: &InvokeCommand, generated_at: DateTime<FixedOffset>) -> String {
    format!(
        "#!/bin/bash\n\
         # Auto-generated ledger submission script\n\
         # Generated: {}\n\n{}",
        generated_at.to_rfc3339(),
        command.to_shell()
    )
}

/// Persist `command` as an executable script at `path`.
///
/// The script is only written, never run.
pub fn emit_script(
    path: &Path,
    command: &InvokeCommand,
    generated_at: DateTime<FixedOffset>,
) -> Result<()> {
    let write_err = |source| SubmitError::ScriptWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    fs::write(path, render_script(command, generated_at)).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(write_err)?;
    }

    info!(path = %path.display(), "submission script written");
    Ok(())
}
