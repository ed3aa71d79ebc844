// src/mcp/tools/presence.rs
// Presence tools

use crate::mcp::AulaServer;
use crate::utils::ResultExt;

pub async fn get_presence_data(server: &AulaServer, child_id: String) -> Result<String, String> {
    let records = server
        .data
        .get_presence_data(&child_id)
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&records).str_err()
}
