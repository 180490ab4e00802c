use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clock_core::{export_record, ClockState, EXPORT_FILE_NAME};

/// Write the game summary to `<dir>/clock.pgn`, replacing any previous one.
pub fn write_export(dir: &Path, state: &ClockState) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, export_record(state))
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("exported clock record to {}", path.display());
    Ok(path)
}
