//! Transient on-disk staging for extracted attachments, used only as a
//! handoff step before upload.
//!
//! Staged names carry a generated per-file prefix, decoupled from the
//! attachment's logical filename, so two concurrent sessions that both
//! carry an "invoice.pdf" cannot clobber each other. The logical filename
//! survives only in the upload's displayed name.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{error::DeliveryError, internal};

pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write one attachment under a unique staged name, returning its
    /// path.
    pub async fn stage(&self, filename: &str, payload: &[u8]) -> Result<PathBuf, DeliveryError> {
        let path = self
            .dir
            .join(format!("{}-{}", Uuid::new_v4(), sanitize(filename)));
        tokio::fs::write(&path, payload).await?;
        Ok(path)
    }

    /// Best-effort removal of a staged file.
    pub async fn remove(&self, path: &Path) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            internal!(
                level = WARN,
                "Failed to remove staged file {}: {err}",
                path.display()
            );
        }
    }
}

/// Attachment filenames are attacker-controlled and must not escape the
/// staging directory.
fn sanitize(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect::<String>()
        .replace("..", "_")
}
