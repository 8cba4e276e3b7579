//! Profile picture uploads.

use std::path::Path;

use uuid::Uuid;

use crate::error::Result;

/// Largest accepted picture.
pub const MAX_PICTURE_BYTES: usize = 16 * 1024 * 1024;

/// Body limit for the profile form: the picture plus room for text fields.
pub const MAX_REQUEST_BYTES: usize = MAX_PICTURE_BYTES + 64 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// The lower-cased extension of `filename`, if it is an accepted image type.
pub fn allowed_extension(filename: &str) -> Option<String> {
  let (_, ext) = filename.rsplit_once('.')?;
  let ext = ext.to_ascii_lowercase();
  ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Write `bytes` under `dir` with a fresh random name and return the public
/// URL path it is served from.
pub async fn save_picture(dir: &Path, ext: &str, bytes: &[u8]) -> Result<String> {
  tokio::fs::create_dir_all(dir).await?;
  let filename = format!("{}.{ext}", Uuid::new_v4().simple());
  tokio::fs::write(dir.join(&filename), bytes).await?;
  Ok(format!("/uploads/{filename}"))
}

/// Delete a picture written by [`save_picture`]. Failures are only logged.
pub async fn remove_picture(dir: &Path, url: &str) {
  let Some(name) = url.strip_prefix("/uploads/") else {
    return;
  };
  if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
    tracing::warn!(error = %e, url, "failed to remove picture");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_only_image_extensions() {
    assert_eq!(allowed_extension("me.PNG").as_deref(), Some("png"));
    assert_eq!(allowed_extension("holiday.photo.jpeg").as_deref(), Some("jpeg"));
    assert_eq!(allowed_extension("script.sh"), None);
    assert_eq!(allowed_extension("noext"), None);
  }

  #[tokio::test]
  async fn saved_picture_is_served_from_uploads() {
    let dir = std::env::temp_dir().join(format!("branchout-upload-{}", Uuid::new_v4()));
    let url = save_picture(&dir, "gif", b"GIF89a").await.unwrap();

    let name = url.strip_prefix("/uploads/").unwrap();
    assert!(name.ends_with(".gif"));
    assert_eq!(tokio::fs::read(dir.join(name)).await.unwrap(), b"GIF89a");

    remove_picture(&dir, &url).await;
    assert!(!dir.join(name).exists());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
  }
}
