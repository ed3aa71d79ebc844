// src/parse/gallery.rs
// Gallery album/picture normalizers

use super::{Parsed, parse_timestamp, str_field};
use crate::error::{AulaError, Result};
use crate::model::GalleryItem;
use serde_json::Value;

/// One album reference from the album listing
#[derive(Debug, Clone)]
pub struct AlbumRef {
    pub id: String,
    pub title: String,
}

/// Parse the `data` array of `gallery.getAlbums`
pub fn parse_albums(data: &Value) -> Result<Parsed<AlbumRef>> {
    let raw_albums = data
        .as_array()
        .ok_or_else(|| AulaError::Parse("album response is not an array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in raw_albums {
        let Some(id) = str_field(raw, "id") else {
            parsed.warn("gallery album", "missing id");
            continue;
        };
        parsed.push(AlbumRef {
            id,
            title: str_field(raw, "title").unwrap_or_default(),
        });
    }
    Ok(parsed)
}

/// Parse the `data` object of `gallery.getAlbum` into gallery items
pub fn parse_album_pictures(data: &Value, album: &AlbumRef) -> Result<Parsed<GalleryItem>> {
    let pictures = data
        .get("pictures")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("album detail has no pictures array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in pictures {
        let Some(id) = str_field(raw, "id") else {
            parsed.warn("gallery picture", format!("missing id in album {}", album.id));
            continue;
        };
        parsed.push(GalleryItem {
            id,
            title: str_field(raw, "title").unwrap_or_default(),
            album: album.title.clone(),
            thumbnail_url: str_field(raw, "thumbnailUrl").unwrap_or_default(),
            created: str_field(raw, "created").and_then(|c| parse_timestamp(&c)),
        });
    }
    Ok(parsed)
}
