use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::storage::StorageClient;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Each user has one avatar object; a new upload replaces the previous one.
pub fn avatar_key(user_id: Uuid, ext: &str) -> String {
    format!("avatars/{}.{}", user_id, ext)
}

/// Stores the avatar and returns its public URL, or `None` for unsupported
/// or empty uploads.
pub async fn upload_avatar(
    storage: &dyn StorageClient,
    user_id: Uuid,
    item: UploadItem,
) -> anyhow::Result<Option<String>> {
    let Some(ext) = ext_from_mime(&item.content_type) else {
        return Ok(None);
    };
    if item.body.is_empty() {
        return Ok(None);
    }
    let key = avatar_key(user_id, ext);
    let url = storage
        .upload(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("upload avatar {}", key))?;
    Ok(Some(url))
}
