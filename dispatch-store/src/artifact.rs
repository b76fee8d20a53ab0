//! Model artifact blob. The bytes are opaque here; the scorer owns the
//! encoding. Missing file on load means "no model yet", not an error.

use anyhow::{Context, Result};
use std::path::Path;

use crate::atomic::write_atomic;

pub fn read_model(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(bytes))
}

pub fn write_model(path: &Path, blob: &[u8]) -> Result<()> {
    write_atomic(path, blob)
}
