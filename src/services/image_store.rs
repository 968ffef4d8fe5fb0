use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::models::breweries::DEFAULT_IMAGE;

/// Upload cap from the listing form: 2048 KB.
pub const MAX_IMAGE_BYTES: usize = 2048 * 1024;

const UPLOAD_DIR: &str = "breweries/uploads";

/// An image file received with a create/edit submission.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Root of the publicly served file area. Overridable so tests and
/// deployments can point elsewhere.
pub fn public_root() -> PathBuf {
    std::env::var("BROUWGIDS_PUBLIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"))
}

/// Writes the upload under the public uploads area with a fresh uuid name
/// and returns the stored path relative to the public root, which is what
/// the database keeps.
pub async fn store_image(root: &Path, upload: &UploadedImage) -> io::Result<String> {
    let ext = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("jpg")
        .to_lowercase();
    let relative = format!("{UPLOAD_DIR}/{}.{ext}", Uuid::new_v4());

    let target = root.join(&relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&target, &upload.bytes).await?;

    Ok(relative)
}

/// Removes a stored image file. The default sentinel is never a real stored
/// file and is left alone; a path that is already gone is not an error.
pub async fn remove_image(root: &Path, image: &str) -> io::Result<()> {
    if image == DEFAULT_IMAGE {
        return Ok(());
    }
    match fs::remove_file(root.join(image)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
