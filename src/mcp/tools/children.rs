// src/mcp/tools/children.rs
// Child data tools

use crate::mcp::AulaServer;
use crate::utils::ResultExt;

pub async fn get_children(server: &AulaServer) -> Result<String, String> {
    let children = server
        .data
        .get_children()
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&children).str_err()
}

pub async fn get_child_by_id(server: &AulaServer, child_id: String) -> Result<String, String> {
    let child = server
        .data
        .get_child_by_id(&child_id)
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&child).str_err()
}
