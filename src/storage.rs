use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::config::StorageConfig;

/// Object storage for user uploads. Returns the public URL of the stored object.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn StorageClient>> {
    let storage: Arc<dyn StorageClient> = match cfg {
        StorageConfig::Local {
            upload_dir,
            base_url,
        } => Arc::new(LocalStorage::new(upload_dir, base_url).await?),
        StorageConfig::S3 {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
            public_base_url,
        } => Arc::new(
            S3Storage::new(endpoint, bucket, access_key, secret_key, region, public_base_url)
                .await?,
        ),
    };
    Ok(storage)
}

fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

/// S3-compatible bucket (AWS, MinIO, Backblaze B2).
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        public_base_url: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        let size = body.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        debug!(%key, size, "uploaded object to s3");
        Ok(public_url(&self.public_base_url, key))
    }
}

/// Files under a local directory, served back by the app under `/uploads`.
#[derive(Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub async fn new(base_dir: impl AsRef<Path>, base_url: &str) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_dir)
            .await
            .with_context(|| format!("create upload directory {}", base_dir.display()))?;
        Ok(Self {
            base_dir,
            base_url: base_url.to_string(),
        })
    }

    #[cfg(test)]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolves `key` inside the base directory; only plain relative segments are allowed.
    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let plain = !key.is_empty()
            && !key.contains('\\')
            && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        anyhow::ensure!(plain, "invalid storage key {key:?}");
        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn upload(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("mkdir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write file {}", path.display()))?;
        debug!(%key, size = body.len(), "stored upload locally");
        Ok(public_url(&self.base_url, key))
    }
}
