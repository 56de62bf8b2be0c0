//! Asynchronous loading of page data.
//!
//! Reads are not cancellable; a page module that was torn down while a load
//! was in flight ignores the result when it arrives.

use std::path::Path;

use lightframe_common::{Error, Result};
use serde::de::DeserializeOwned;

use crate::models::{validate_photos, CatProfile, Photo, Project};

/// Read and decode one JSON document.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "page data loaded");
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn load_projects(path: &Path) -> Result<Vec<Project>> {
    load_json(path).await
}

/// Gallery photos, keeping only displayable records.
pub async fn load_gallery(path: &Path) -> Result<Vec<Photo>> {
    let photos: Vec<Photo> = load_json(path).await?;
    validate_photos(photos)
}

pub async fn load_cat(path: &Path) -> Result<CatProfile> {
    load_json::<CatProfile>(path).await?.validate()
}
