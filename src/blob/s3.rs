use crate::blob::BlobStore;
use crate::config::BlobConfig;
use crate::store::DeleteOutcome;
use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct S3BlobStore {
    pub client: Client,
    pub bucket: String,
}

impl S3BlobStore {
    pub async fn from_config(config: &BlobConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = config.endpoint.clone() {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.endpoint.is_some() {
            s3_builder = s3_builder.force_path_style(true);
        }
        Self {
            client: Client::from_conf(s3_builder.build()),
            bucket: config.container.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn upload_from_path(&self, name: &str, path: &Path) -> u16 {
        let body = match ByteStream::from_path(path).await {
            Ok(body) => body,
            Err(e) => {
                warn!(blob = name, path = %path.display(), error = %e, "cannot read blob source file");
                return 500;
            }
        };
        match self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type("application/pdf")
            .body(body)
            .send()
            .await
        {
            Ok(_) => 201,
            Err(e) => {
                warn!(blob = name, error = %e, "blob upload failed");
                500
            }
        }
    }

    async fn delete_if_exists(&self, name: &str) -> Result<DeleteOutcome> {
        if !self.exists(name).await? {
            return Ok(DeleteOutcome::Absent);
        }
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await?;
        debug!(blob = name, "blob deleted");
        Ok(DeleteOutcome::Deleted)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
