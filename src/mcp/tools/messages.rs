// src/mcp/tools/messages.rs
// Message tools

use crate::mcp::AulaServer;
use crate::utils::ResultExt;

pub async fn get_unread_messages(server: &AulaServer) -> Result<String, String> {
    let unread = server
        .data
        .get_unread_messages()
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&unread).str_err()
}
