//! Recipe images on disk. The rest of the crate only sees the relative
//! reference returned by [`AssetStore::save_data_uri`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const IMAGE_DIR: &str = "recipes/images";

pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes a `data:image/<type>;base64,<payload>` URI and stores it.
    pub async fn save_data_uri(&self, data_uri: &str) -> AppResult<String> {
        let (extension, bytes) = decode_data_uri(data_uri)?;

        let reference = format!("{IMAGE_DIR}/{}.{extension}", Uuid::new_v4());
        let path = self.root.join(&reference);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(asset = %reference, "image stored");
        Ok(reference)
    }

    /// Best effort removal of an asset nothing points at anymore.
    pub async fn discard(&self, reference: &str) {
        if let Err(e) = fs::remove_file(self.root.join(reference)).await {
            warn!(asset = %reference, "failed to discard image: {e}");
        }
    }
}

fn decode_data_uri(data_uri: &str) -> AppResult<(&'static str, Vec<u8>)> {
    let data_uri = data_uri.trim();
    if data_uri.is_empty() {
        return Err(AppError::invalid("image", "Add an image"));
    }

    let (header, payload) = data_uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(|| AppError::invalid("image", "Image must be a base64 data URI"))?;

    let extension = match header {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => {
            return Err(AppError::invalid(
                "image",
                format!("Unsupported image type {other}"),
            ))
        }
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| AppError::invalid("image", "Image payload is not valid base64"))?;
    if bytes.is_empty() {
        return Err(AppError::invalid("image", "Image is empty"));
    }

    Ok((extension, bytes))
}
