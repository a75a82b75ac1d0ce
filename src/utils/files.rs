// src/utils/files.rs

use std::path::Path;

/// Best-effort cleanup of uploaded images whose elements were just deleted.
///
/// Fire-and-forget: runs after the owning transaction has committed, is not
/// ordered relative to later mutations of the same survey, and must never
/// fail the originating request. Failures are logged and swallowed.
pub fn schedule_orphan_cleanup(upload_dir: String, image_urls: Vec<String>) {
    if image_urls.is_empty() {
        return;
    }

    tokio::spawn(async move {
        for url in image_urls {
            // Only files we manage ourselves; foreign URLs are left alone.
            let Some(file_name) = url.rsplit('/').next() else {
                continue;
            };
            if file_name.is_empty() || file_name.contains("..") {
                continue;
            }

            let path = Path::new(&upload_dir).join(file_name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Removed orphaned upload {:?}", path),
                Err(e) => {
                    tracing::warn!("Failed to remove orphaned upload {:?}: {}", path, e)
                }
            }
        }
    });
}
