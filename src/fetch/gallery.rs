// src/fetch/gallery.rs
// Gallery fetchers

use super::data_of;
use crate::error::Result;
use crate::session::SessionManager;
use serde_json::Value;

/// Album listing for a set of institution profile ids
pub async fn fetch_albums(session: &SessionManager, profile_ids: &[String]) -> Result<Value> {
    let joined = profile_ids.join(",");
    let envelope = session
        .api_get(
            "gallery.getAlbums",
            &[("institutionProfileIds", joined.as_str()), ("page", "0")],
        )
        .await?;
    Ok(data_of(envelope))
}

/// One album with its pictures
pub async fn fetch_album(session: &SessionManager, album_id: &str) -> Result<Value> {
    let envelope = session
        .api_get("gallery.getAlbum", &[("id", album_id)])
        .await?;
    Ok(data_of(envelope))
}
