//! Command handler modules for stk.
//!
//! Shared output helpers live here; command logic lives in the submodules.

pub mod merge;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `bytes` to `path`, or to stdout when no path is given.
pub async fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(p) => tokio::fs::write(p, bytes)
            .await
            .with_context(|| format!("write output failed: {}", p.display())),
        None => {
            let mut out = tokio::io::stdout();
            out.write_all(bytes).await.context("write stdout failed")?;
            out.flush().await.context("flush stdout failed")
        }
    }
}
