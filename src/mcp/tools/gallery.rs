// src/mcp/tools/gallery.rs
// Gallery and summary tools

use crate::mcp::AulaServer;
use crate::utils::ResultExt;

/// Default number of gallery items returned
const DEFAULT_GALLERY_LIMIT: usize = 3;

pub async fn get_gallery_items(server: &AulaServer, limit: Option<i64>) -> Result<String, String> {
    let limit = match limit {
        Some(n) if n > 0 => n as usize,
        Some(n) => return Err(format!("limit must be positive, got {n}")),
        None => DEFAULT_GALLERY_LIMIT,
    };
    let items = server
        .data
        .get_gallery_items(limit)
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&items).str_err()
}

pub async fn get_summary(server: &AulaServer, force_update: bool) -> Result<String, String> {
    let summary = server
        .data
        .get_summary(force_update)
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&summary).str_err()
}
