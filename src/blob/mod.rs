use crate::store::DeleteOutcome;
use anyhow::Result;
use std::path::Path;

pub mod mock;
pub mod s3;

/// Container holding the rendered receipt PDFs.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads the file at `path` as `name`. Failures are reported as status `500`,
    /// never as `Err`, so fixture setup can assert on the code alone.
    async fn upload_from_path(&self, name: &str, path: &Path) -> u16;

    async fn delete_if_exists(&self, name: &str) -> Result<DeleteOutcome>;

    async fn exists(&self, name: &str) -> Result<bool>;
}
