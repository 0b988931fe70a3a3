// File-backed artifacts: the live policy config and the last sweep record.
//
// Both are small JSON documents next to the model artifact in the store
// directory (RISKGATE_STORE_DIR).

pub mod policy;
pub mod sweep;

use anyhow::{Context, Result};
use std::path::Path;

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }
    Ok(())
}
