use std::time::Duration;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::AppConfig;

/// How long presigned avatar URLs stay valid.
pub const AVATAR_URL_TTL_SECS: u64 = 30 * 60;

/// MinIO ignores the region; S3 deployments pin the real one via the endpoint.
const BUCKET_REGION: &str = "us-east-1";

/// Object storage as the handlers see it. Avatars are the only payload this
/// service keeps in the bucket.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

/// Bucket key for an avatar object. Keys are unique per upload so a
/// replacement never collides with the object it is about to delete.
pub fn avatar_key(user_id: Uuid, object_id: Uuid, ext: &str) -> String {
    format!("avatars/{}/{}.{}", user_id, object_id, ext)
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// S3/MinIO-backed implementation.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Connects to the bucket named in the config. Path-style addressing is
    /// required by MinIO and harmless against real S3.
    pub async fn connect(cfg: &AppConfig) -> anyhow::Result<Self> {
        let endpoint = cfg.minio_endpoint.as_str();
        let creds = Credentials::new(
            cfg.minio_access_key.clone(),
            cfg.minio_secret_key.clone(),
            None,
            None,
            "static",
        );

        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(BUCKET_REGION))
            .credentials_provider(creds)
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.minio_bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("put {key}"))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("delete {key}"))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let expiry = PresigningConfig::expires_in(Duration::from_secs(seconds))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(expiry)
            .await
            .with_context(|| format!("presign {key}"))?;
        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn avatar_keys_are_scoped_per_user_and_unique_per_upload() {
        let user = Uuid::new_v4();
        let a = avatar_key(user, Uuid::new_v4(), "png");
        let b = avatar_key(user, Uuid::new_v4(), "png");
        assert!(a.starts_with(&format!("avatars/{}/", user)));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn mime_extensions() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }
}
