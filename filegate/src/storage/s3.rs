//! S3 backend built on `aws-sdk-s3`.
//!
//! Credentials are resolved through the default AWS provider chain (environment, profile,
//! container or instance metadata). `endpoint_url` and `force_path_style` allow pointing the
//! gateway at S3-compatible services such as MinIO or LocalStack.

use super::{ObjectStore, Result, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, config::Region, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Load AWS configuration for the configured region and build a client for the bucket.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url.as_str());
        }

        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }
}

fn backend_error<E: std::error::Error>(err: E) -> StorageError {
    StorageError::Backend(anyhow::anyhow!("{}", DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut pages = self.client.list_objects_v2().bucket(&self.bucket).into_paginator().send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(backend_error)?;
            keys.extend(page.contents().iter().filter_map(|object| object.key().map(str::to_string)));
        }

        debug!(count = keys.len(), "Listed objects");
        Ok(keys)
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn put_object(&self, key: &str, data: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<Bytes> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    return Err(StorageError::NotFound { key: key.to_string() });
                }
                return Err(backend_error(err));
            }
        };

        let data = output.body.collect().await.map_err(backend_error)?.into_bytes();
        debug!(size = data.len(), "Fetched object");
        Ok(data)
    }
}
