//! S3-compatible object storage backend.
//!
//! Uses rust-s3 against MinIO or any S3-compatible service. Stored locations
//! are public URLs (`{public_endpoint}/{bucket}/{key}`); downloads resolve to
//! a redirect rather than proxying bytes through the service.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::ObjectStorageConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::{BlobStorage, ResolvedBlob};

pub struct ObjectStorage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
}

impl ObjectStorage {
    /// Create the client and make sure the bucket exists.
    pub async fn new(config: ObjectStorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to open bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket, not http://bucket.endpoint)
        bucket.set_path_style();

        let storage = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
        };

        storage.ensure_bucket_exists().await?;

        info!(
            "Object storage initialized: endpoint={}, bucket={}",
            storage.endpoint,
            storage.bucket.name()
        );

        Ok(storage)
    }

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket_exists(&self) -> Result<()> {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => {
                info!("Bucket '{}' created", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                    Ok(())
                }
            }
        }
    }

    /// Extract the object key from a location this backend produced, trying
    /// the public endpoint first.
    fn key_from_location(&self, location: &str) -> Option<String> {
        for base in [&self.public_endpoint, &self.endpoint] {
            let prefix = format!("{}/{}/", base, self.bucket.name());
            if let Some(key) = location.strip_prefix(&prefix) {
                return Some(key.to_string());
            }
        }
        None
    }
}

#[async_trait]
impl BlobStorage for ObjectStorage {
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.bucket
            .put_object_with_content_type(name, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", name, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", name, self.bucket.name());
        Ok(format!(
            "{}/{}/{}",
            self.public_endpoint,
            self.bucket.name(),
            name
        ))
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let key = self.key_from_location(location).ok_or_else(|| {
            AppError::Storage(format!("Unrecognized storage location: {}", location))
        })?;

        self.bucket
            .delete_object(&key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn resolve(&self, location: &str) -> Result<ResolvedBlob> {
        // Objects are publicly addressable; send the client straight there.
        Ok(ResolvedBlob::Redirect(location.to_string()))
    }
}
