// src/mcp/tools/auth.rs
// Authentication tools: login, refresh_data

use crate::mcp::AulaServer;
use crate::utils::ResultExt;
use serde_json::json;

/// Force a fresh login, discarding the current session
pub async fn login(server: &AulaServer) -> Result<String, String> {
    server
        .session()
        .force_login()
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string(&json!({"success": true, "forced": true})).str_err()
}

/// Rebuild the combined snapshot now
pub async fn refresh_data(server: &AulaServer) -> Result<String, String> {
    server
        .data
        .refresh_data()
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string(&json!({"success": true})).str_err()
}
